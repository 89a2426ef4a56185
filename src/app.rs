use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, Request, State},
    http::header,
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::classify::AnalysisMode;
use crate::config::AppConfig;
use crate::downloader;
use crate::error::{AppError, StatusResponse};
use crate::graph::{GraphOptions, label_bar_chart};
use crate::loader;
use crate::login::UserCredentials;
use crate::report::{self, Report};
use crate::sentiment::LexiconScorer;
use crate::session::{SESSION_COOKIE, Session, SessionRegistry};
use crate::table::{ColumnDescription, DataTable, TableInfo};

pub struct AppState {
    sessions: Mutex<SessionRegistry>,
    scorer: LexiconScorer,
    config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            sessions: Mutex::new(SessionRegistry::new(config.session_idle_timeout())),
            scorer: LexiconScorer::new(),
            config,
        }
    }

    fn lock_sessions(&self) -> MutexGuard<'_, SessionRegistry> {
        // A panic in another request must not lock every user out
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the caller's session, starting one if needed
    ///
    /// The returned jar carries the session cookie whenever a new session
    /// was created.
    fn with_session<T>(&self, jar: CookieJar, f: impl FnOnce(&mut Session) -> T) -> (CookieJar, T) {
        let requested = session_id(&jar);
        let mut sessions = self.lock_sessions();
        let session = sessions.open(requested, Utc::now());

        let jar = if requested == Some(session.id) {
            jar
        } else {
            jar.add(session_cookie(session.id))
        };
        let out = f(session);
        (jar, out)
    }

    /// Run `f` on an existing, logged-in session
    fn with_active_session<T>(
        &self,
        jar: &CookieJar,
        f: impl FnOnce(&mut Session) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let id = session_id(jar).ok_or(AppError::NotAuthenticated)?;
        let mut sessions = self.lock_sessions();
        let session = sessions
            .get_mut(&id, Utc::now())
            .filter(|session| session.identity.is_logged_in())
            .ok_or(AppError::NotAuthenticated)?;
        f(session)
    }

    /// Run `f` on the session's analysed table
    fn with_dataset<T>(
        &self,
        jar: &CookieJar,
        f: impl FnOnce(&mut DataTable, AnalysisMode) -> T,
    ) -> Result<T, AppError> {
        self.with_active_session(jar, |session| {
            let mode = session.mode;
            let dataset = session.dataset.as_mut().ok_or(AppError::NoDataset)?;
            Ok(f(dataset, mode))
        })
    }
}

fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
}

fn session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

#[derive(Deserialize)]
struct TextAnalysisForm {
    #[serde(default)]
    text: String,
    mode: Option<String>,
}

/// Mode named in a request; missing or blank means sentiment
fn parse_mode(name: Option<&str>) -> Result<AnalysisMode, AppError> {
    match name.map(str::trim).filter(|name| !name.is_empty()) {
        None => Ok(AnalysisMode::default()),
        Some(name) => {
            AnalysisMode::from_name(name).ok_or_else(|| AppError::UnknownMode(name.to_string()))
        }
    }
}

#[derive(Deserialize)]
struct PreviewQuery {
    n: Option<usize>,
}

#[derive(Deserialize)]
struct FillForm {
    #[serde(default)]
    value: String,
}

#[derive(Serialize)]
struct SessionStatus {
    logged_in: bool,
    username: Option<String>,
}

#[derive(Serialize)]
struct ShapeResponse {
    rows: usize,
    columns: usize,
}

#[derive(Serialize)]
struct ColumnType {
    column: String,
    dtype: String,
}

#[derive(Serialize)]
struct ColumnNulls {
    column: String,
    nulls: usize,
}

#[derive(Serialize)]
struct NullReport {
    has_nulls: bool,
    message: String,
    columns: Vec<ColumnNulls>,
}

#[derive(Serialize)]
struct RemediationResponse {
    status: String,
    message: String,
    changed: usize,
    rows: usize,
    columns: usize,
}

/// Build the application router around shared state
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    let protected = Router::new()
        .route("/api/analyze/text", post(analyze_text))
        .route("/api/analyze/csv", post(analyze_csv))
        .route("/api/results.csv", get(download_csv))
        .route("/api/results.xlsx", get(download_xlsx))
        .route("/api/chart.png", get(label_chart))
        .route("/api/dataset/head", get(dataset_head))
        .route("/api/dataset/tail", get(dataset_tail))
        .route("/api/dataset/info", get(dataset_info))
        .route("/api/dataset/shape", get(dataset_shape))
        .route("/api/dataset/describe", get(dataset_describe))
        .route("/api/dataset/dtypes", get(dataset_dtypes))
        .route("/api/dataset/nulls", get(dataset_nulls))
        .route("/api/dataset/dropna", post(dataset_dropna))
        .route("/api/dataset/fillna", post(dataset_fillna))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(serve_landing))
        .route("/app", get(serve_dashboard))
        .route("/api/signup", post(handle_signup))
        .route("/api/login", post(handle_login))
        .route("/api/logout", post(handle_logout))
        .route("/api/session", get(session_status))
        .merge(protected)
        .nest_service("/static", ServeDir::new("static"))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.bind_addr();
    log::info!(
        "starting with idle timeout {} min, upload limit {} bytes",
        config.session_idle_minutes,
        config.max_upload_bytes
    );

    let app = router(Arc::new(AppState::new(config)));

    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", addr);
    if addr.ip().is_unspecified() {
        match local_ip_address::local_ip() {
            Ok(ip) => log::info!("Reachable on your network at http://{}:{}", ip, addr.port()),
            Err(e) => log::warn!("could not determine LAN address: {}", e),
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}

/// Reject API calls from sessions that have not logged in
async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let logged_in = session_id(&jar).is_some_and(|id| {
        state
            .lock_sessions()
            .get_mut(&id, Utc::now())
            .is_some_and(|session| session.identity.is_logged_in())
    });

    if logged_in {
        next.run(request).await
    } else {
        AppError::NotAuthenticated.into_response()
    }
}

async fn serve_landing(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let (jar, logged_in) = state.with_session(jar, |session| session.identity.is_logged_in());

    let page = if logged_in {
        Redirect::to("/app").into_response()
    } else {
        Html(include_str!("./static/login.html")).into_response()
    };
    (jar, page)
}

async fn serve_dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let (jar, logged_in) = state.with_session(jar, |session| session.identity.is_logged_in());

    let page = if logged_in {
        Html(include_str!("./static/dashboard.html")).into_response()
    } else {
        Redirect::to("/").into_response()
    };
    (jar, page)
}

async fn handle_signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(credentials): Form<UserCredentials>,
) -> impl IntoResponse {
    let (jar, result) = state.with_session(jar, |session| {
        session
            .identity
            .register(&credentials.username, &credentials.password)
    });

    let response = match result {
        Ok(()) => {
            log::info!("registered user {:?}", credentials.username);
            Json(StatusResponse::ok("User Registered Successfully")).into_response()
        }
        Err(e) => e.into_response(),
    };
    (jar, response)
}

async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(credentials): Form<UserCredentials>,
) -> impl IntoResponse {
    let (jar, result) = state.with_session(jar, |session| {
        session
            .identity
            .authenticate(&credentials.username, &credentials.password)
    });

    let response = match result {
        Ok(()) => {
            log::info!("user {:?} logged in", credentials.username);
            Json(StatusResponse::ok("Logged In Successfully")).into_response()
        }
        Err(e) => e.into_response(),
    };
    (jar, response)
}

async fn handle_logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let (jar, user) = state.with_session(jar, |session| {
        let user = session.identity.current_user().map(str::to_string);
        session.logout();
        user
    });

    if let Some(user) = user {
        log::info!("user {:?} logged out", user);
    }
    (jar, Json(StatusResponse::ok("Logged Out")))
}

async fn session_status(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let (jar, status) = state.with_session(jar, |session| SessionStatus {
        logged_in: session.identity.is_logged_in(),
        username: session.identity.current_user().map(str::to_string),
    });
    (jar, Json(status))
}

async fn analyze_text(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<TextAnalysisForm>,
) -> Result<Json<Report>, AppError> {
    let mode = parse_mode(form.mode.as_deref())?;
    let table = report::analyze_text(&state.scorer, &form.text, mode)?;
    let report = Report::build(&table, mode);

    state.with_active_session(&jar, |session| {
        session.dataset = Some(table);
        session.mode = mode;
        Ok(())
    })?;

    log::info!("analysed manual text ({})", mode);
    Ok(Json(report))
}

async fn analyze_csv(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<Json<Report>, AppError> {
    let mut mode_name = None;
    let mut file_data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadUpload(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("mode") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadUpload(e.to_string()))?;
                mode_name = Some(value);
            }
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadUpload(e.to_string()))?;
                file_data = Some(bytes);
            }
            _ => {}
        }
    }

    let mode = parse_mode(mode_name.as_deref())?;
    let file_data = file_data.ok_or(AppError::MissingUpload)?;
    let mut table = loader::from_bytes(&file_data)?;
    report::analyze_table(&state.scorer, &mut table, mode)?;
    let report = Report::build(&table, mode);

    let rows = table.len();
    state.with_active_session(&jar, |session| {
        session.dataset = Some(table);
        session.mode = mode;
        Ok(())
    })?;

    log::info!("analysed uploaded table with {} rows ({})", rows, mode);
    Ok(Json(report))
}

async fn download_csv(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let bytes = state.with_dataset(&jar, |table, _| downloader::to_csv(table))?;

    Ok((
        [
            (header::CONTENT_TYPE, downloader::CSV_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", downloader::CSV_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn download_xlsx(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let table = state.with_dataset(&jar, |table, _| table.clone())?;
    let bytes = downloader::to_xlsx(&table)?;

    Ok((
        [
            (header::CONTENT_TYPE, downloader::XLSX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", downloader::XLSX_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn label_chart(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (counts, mode) = state.with_dataset(&jar, |table, mode| (report::label_counts(table), mode))?;

    let options = GraphOptions {
        title: format!("{} Results", mode),
        ..GraphOptions::default()
    }
    .with_size(state.config.chart_width, state.config.chart_height);

    let png = label_bar_chart(&counts, &options).map_err(|e| AppError::Render(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn dataset_head(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<DataTable>, AppError> {
    let n = query.n.unwrap_or(state.config.preview_rows);
    state.with_dataset(&jar, |table, _| Json(table.head(n)))
}

async fn dataset_tail(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<DataTable>, AppError> {
    let n = query.n.unwrap_or(state.config.preview_rows);
    state.with_dataset(&jar, |table, _| Json(table.tail(n)))
}

async fn dataset_info(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<TableInfo>, AppError> {
    state.with_dataset(&jar, |table, _| Json(table.info()))
}

async fn dataset_shape(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<ShapeResponse>, AppError> {
    state.with_dataset(&jar, |table, _| {
        let (rows, columns) = table.shape();
        Json(ShapeResponse { rows, columns })
    })
}

async fn dataset_describe(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Vec<ColumnDescription>>, AppError> {
    state.with_dataset(&jar, |table, _| Json(table.describe()))
}

async fn dataset_dtypes(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Vec<ColumnType>>, AppError> {
    state.with_dataset(&jar, |table, _| {
        Json(
            table
                .dtypes()
                .into_iter()
                .map(|(column, dtype)| ColumnType {
                    column,
                    dtype: dtype.as_str().to_string(),
                })
                .collect(),
        )
    })
}

async fn dataset_nulls(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<NullReport>, AppError> {
    state.with_dataset(&jar, |table, _| {
        let has_nulls = table.has_nulls();
        let message = if has_nulls {
            "This Dataset Contains Some Null Values"
        } else {
            "No Missing Values"
        };

        Json(NullReport {
            has_nulls,
            message: message.to_string(),
            columns: table
                .null_counts()
                .into_iter()
                .map(|(column, nulls)| ColumnNulls { column, nulls })
                .collect(),
        })
    })
}

async fn dataset_dropna(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<RemediationResponse>, AppError> {
    state.with_dataset(&jar, |table, _| {
        let changed = table.drop_nulls();
        let (rows, columns) = table.shape();
        log::info!("dropped {} row(s) with null values", changed);

        Json(RemediationResponse {
            status: "ok".to_string(),
            message: "Null Values are Removed".to_string(),
            changed,
            rows,
            columns,
        })
    })
}

async fn dataset_fillna(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<FillForm>,
) -> Result<Json<RemediationResponse>, AppError> {
    state.with_dataset(&jar, |table, _| {
        let changed = table.fill_nulls(&form.value);
        let (rows, columns) = table.shape();
        log::info!("filled {} null cell(s)", changed);

        Json(RemediationResponse {
            status: "ok".to_string(),
            message: "Null Values are Filled".to_string(),
            changed,
            rows,
            columns,
        })
    })
}
