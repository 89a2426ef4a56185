//! Error taxonomy shared by the library and the web layer.
//!
//! Every variant is recoverable: handlers turn it into an inline message and
//! the session keeps going.

#[cfg(feature = "web")]
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
#[cfg(feature = "web")]
use serde::Serialize;

/// All errors surfaced to the user.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Unknown username or wrong password.
    #[error("Invalid Username or Password")]
    InvalidCredentials,

    /// Sign-up with a username that is already registered.
    #[error("Username already exists")]
    DuplicateUser,

    /// Manual text input was empty.
    #[error("Please enter text to analyze")]
    EmptyInput,

    /// Uploaded table has no `text` column.
    #[error("CSV file must contain a \"text\" column")]
    MissingTextColumn,

    /// The upload could not be parsed as CSV.
    #[error("Malformed CSV: {0}")]
    MalformedCsv(String),

    /// Multipart request without a file part.
    #[error("No file was uploaded")]
    MissingUpload,

    /// The multipart body itself could not be read.
    #[error("Upload could not be read: {0}")]
    BadUpload(String),

    /// Analysis mode name that is neither sentiment nor emotion.
    #[error("Unknown analysis mode: {0}")]
    UnknownMode(String),

    /// Protected action attempted without logging in.
    #[error("Please log in first")]
    NotAuthenticated,

    /// Exploration or export requested before any analysis ran.
    #[error("No analysed data yet, run an analysis first")]
    NoDataset,

    /// Argon2 failure while hashing or parsing a stored hash.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// Chart rendering failed.
    #[error("chart rendering failed: {0}")]
    Render(String),

    /// Workbook export failed.
    #[error("export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Errors caused by the user's input rather than by the server.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            AppError::PasswordHash(_) | AppError::Render(_) | AppError::Export(_) | AppError::Io(_)
        )
    }
}

/// JSON body used for every status-only reply
#[cfg(feature = "web")]
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: Option<String>,
}

#[cfg(feature = "web")]
impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }
}

#[cfg(feature = "web")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidCredentials | AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::DuplicateUser => StatusCode::CONFLICT,
            AppError::EmptyInput
            | AppError::MissingTextColumn
            | AppError::MalformedCsv(_)
            | AppError::MissingUpload
            | AppError::BadUpload(_)
            | AppError::UnknownMode(_) => StatusCode::BAD_REQUEST,
            AppError::NoDataset => StatusCode::NOT_FOUND,
            AppError::PasswordHash(_) | AppError::Render(_) | AppError::Export(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if self.is_user_facing() {
            log::info!("rejected request: {}", self);
        } else {
            log::error!("request failed: {}", self);
        }

        (status, Json(StatusResponse::error(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_the_inline_wording() {
        assert_eq!(
            AppError::InvalidCredentials.to_string(),
            "Invalid Username or Password"
        );
        assert_eq!(AppError::DuplicateUser.to_string(), "Username already exists");
        assert_eq!(AppError::EmptyInput.to_string(), "Please enter text to analyze");
        assert_eq!(
            AppError::MissingTextColumn.to_string(),
            "CSV file must contain a \"text\" column"
        );
    }

    #[test]
    fn server_side_failures_are_not_user_facing() {
        assert!(AppError::EmptyInput.is_user_facing());
        assert!(!AppError::Render("no font".into()).is_user_facing());
    }
}
