#![cfg(feature = "web")]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use sentiscope::app::{AppState, router};
use sentiscope::config::AppConfig;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "sentiscope-test-boundary";

struct Client {
    app: Router,
    cookie: Option<String>,
}

struct Reply {
    status: StatusCode,
    headers: header::HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

impl Client {
    fn new() -> Self {
        Self {
            app: router(Arc::new(AppState::new(AppConfig::default()))),
            cookie: None,
        }
    }

    async fn send(&mut self, request: axum::http::request::Builder, body: Body) -> Reply {
        let request = match &self.cookie {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        };
        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        Reply {
            status,
            headers,
            body: body.to_vec(),
        }
    }

    async fn get(&mut self, uri: &str) -> Reply {
        self.send(Request::builder().uri(uri), Body::empty()).await
    }

    async fn post_form(&mut self, uri: &str, form: &str) -> Reply {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(request, Body::from(form.to_string())).await
    }

    async fn upload(&mut self, mode: &str, csv: &str) -> Reply {
        let body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"mode\"\r\n\r\n\
             {mode}\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"data.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{b}--\r\n",
            b = BOUNDARY
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/analyze/csv")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        self.send(request, Body::from(body)).await
    }

    async fn logged_in() -> Self {
        let mut client = Self::new();
        let reply = client.post_form("/api/signup", "username=ana&password=secret").await;
        assert_eq!(reply.status, StatusCode::OK);
        let reply = client.post_form("/api/login", "username=ana&password=secret").await;
        assert_eq!(reply.status, StatusCode::OK);
        client
    }
}

#[tokio::test]
async fn signup_and_login_flow() {
    let mut client = Client::new();

    let reply = client.post_form("/api/signup", "username=ana&password=secret").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["message"], "User Registered Successfully");
    assert!(client.cookie.is_some());

    let reply = client.post_form("/api/signup", "username=ana&password=other").await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    let reply = client.post_form("/api/login", "username=ana&password=wrong").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["message"], "Invalid Username or Password");
    assert_eq!(client.get("/api/session").await.json()["logged_in"], false);

    let reply = client.post_form("/api/login", "username=ana&password=secret").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["message"], "Logged In Successfully");

    let status = client.get("/api/session").await.json();
    assert_eq!(status["logged_in"], true);
    assert_eq!(status["username"], "ana");
}

#[tokio::test]
async fn pages_redirect_by_login_state() {
    let mut client = Client::new();
    assert_eq!(client.get("/").await.status, StatusCode::OK);
    assert_eq!(client.get("/app").await.status, StatusCode::SEE_OTHER);

    let mut client = Client::logged_in().await;
    assert_eq!(client.get("/").await.status, StatusCode::SEE_OTHER);
    assert_eq!(client.get("/app").await.status, StatusCode::OK);
}

#[tokio::test]
async fn analysis_requires_login() {
    let mut client = Client::new();
    let reply = client.post_form("/api/analyze/text", "text=I+love+this").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["status"], "error");

    // Registered but not logged in
    client.post_form("/api/signup", "username=ana&password=secret").await;
    let reply = client.get("/api/results.csv").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn manual_text_is_labelled() {
    let mut client = Client::logged_in().await;

    let reply = client
        .post_form("/api/analyze/text", "text=I+love+this&mode=sentiment")
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    let report = reply.json();
    assert_eq!(report["table"]["columns"], serde_json::json!(["text", "analysis"]));
    assert_eq!(report["table"]["rows"][0][1], "Positive");
    assert_eq!(report["label_counts"][0]["count"], 1);

    let reply = client
        .post_form("/api/analyze/text", "text=I+love+this&mode=emotion")
        .await;
    assert_eq!(reply.json()["table"]["rows"][0][1], "Very Good");

    let reply = client.post_form("/api/analyze/text", "text=&mode=emotion").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["message"], "Please enter text to analyze");
}

#[tokio::test]
async fn both_inputs_parse_the_mode_alike() {
    let mut client = Client::logged_in().await;

    let reply = client.post_form("/api/analyze/text", "text=great&mode=bogus").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["message"], "Unknown analysis mode: bogus");

    let reply = client.upload("bogus", "text\ngreat\n").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["message"], "Unknown analysis mode: bogus");

    let reply = client
        .post_form("/api/analyze/text", "text=I+love+this&mode=Emotion+Analysis")
        .await;
    assert_eq!(reply.json()["mode"], "emotion");
    let reply = client.upload("Emotion Analysis", "text\nI love this\n").await;
    assert_eq!(reply.json()["table"]["rows"][0][1], "Very Good");

    let reply = client.post_form("/api/analyze/text", "text=I+love+this").await;
    assert_eq!(reply.json()["mode"], "sentiment");
}

#[tokio::test]
async fn upload_without_text_column_keeps_previous_results() {
    let mut client = Client::logged_in().await;
    client.upload("sentiment", "text\nI love this\n").await;

    let reply = client.upload("sentiment", "review\nI love this\n").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["message"], "CSV file must contain a \"text\" column");

    let shape = client.get("/api/dataset/shape").await.json();
    assert_eq!(shape["rows"], 1);
    assert_eq!(shape["columns"], 2);
}

#[tokio::test]
async fn results_download_as_csv() {
    let mut client = Client::logged_in().await;

    let reply = client.get("/api/results.csv").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = client.upload("sentiment", "text\nI love this\nI hate this").await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = client.get("/api/results.csv").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[header::CONTENT_TYPE], "text/csv");
    assert!(
        reply.headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("results.csv")
    );
    assert_eq!(
        String::from_utf8(reply.body).unwrap(),
        "text,analysis\nI love this,Positive\nI hate this,Negative\n"
    );

    let reply = client.get("/api/results.xlsx").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(&reply.body[..2], b"PK");
}

#[tokio::test]
async fn label_chart_is_served_as_png() {
    let mut client = Client::logged_in().await;
    assert_eq!(client.get("/api/chart.png").await.status, StatusCode::NOT_FOUND);

    client.upload("emotion", "text\nI love this\nI hate this\ngreat\n").await;
    let reply = client.get("/api/chart.png").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(&reply.body[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn dataset_exploration_and_null_handling() {
    let mut client = Client::logged_in().await;
    let csv = "id,text,score\n1,I love this,\n2,I hate this,3\n3,the sky,4\n";
    assert_eq!(client.upload("emotion", csv).await.status, StatusCode::OK);

    let head = client.get("/api/dataset/head?n=2").await.json();
    assert_eq!(head["rows"].as_array().unwrap().len(), 2);
    let tail = client.get("/api/dataset/tail?n=1").await.json();
    assert_eq!(tail["rows"][0][0], "3");

    let dtypes = client.get("/api/dataset/dtypes").await.json();
    assert_eq!(dtypes[0]["dtype"], "int64");
    assert_eq!(dtypes[2]["dtype"], "float64");

    let nulls = client.get("/api/dataset/nulls").await.json();
    assert_eq!(nulls["has_nulls"], true);
    assert_eq!(nulls["message"], "This Dataset Contains Some Null Values");

    let info = client.get("/api/dataset/info").await.json();
    assert_eq!(info["entries"], 3);
    let describe = client.get("/api/dataset/describe").await.json();
    assert_eq!(describe.as_array().unwrap().len(), 4);

    let reply = client.post_form("/api/dataset/fillna", "value=0").await;
    let filled = reply.json();
    assert_eq!(filled["message"], "Null Values are Filled");
    assert_eq!(filled["changed"], 1);

    let nulls = client.get("/api/dataset/nulls").await.json();
    assert_eq!(nulls["message"], "No Missing Values");

    client.upload("emotion", csv).await;
    let dropped = client.post_form("/api/dataset/dropna", "").await.json();
    assert_eq!(dropped["message"], "Null Values are Removed");
    assert_eq!(dropped["rows"], 2);
}

#[tokio::test]
async fn logout_ends_access() {
    let mut client = Client::logged_in().await;
    client.post_form("/api/analyze/text", "text=great").await;

    let reply = client.post_form("/api/logout", "").await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = client.get("/api/dataset/shape").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    // The account survives logout within the session
    let reply = client.post_form("/api/login", "username=ana&password=secret").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(client.get("/api/dataset/shape").await.status, StatusCode::NOT_FOUND);
}
