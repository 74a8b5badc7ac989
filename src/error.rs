use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::restaurants::{RepositoryError, ViewModelError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    #[error("View model error: {0}")]
    ViewModel(#[from] ViewModelError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => {
                tracing::debug!("Not found: {}", what);
                AppError::NotFound
            }
            other => AppError::Repository(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            // Causes stay in the log, the client only sees a generic 500
            other => {
                tracing::error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn response_status(err: AppError) -> StatusCode {
        let response = err.into_response();
        response.status()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(response_status(AppError::NotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthorized_returns_401() {
        assert_eq!(
            response_status(AppError::Unauthorized),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn bad_request_returns_400() {
        assert_eq!(
            response_status(AppError::BadRequest("oops".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_returns_500() {
        assert_eq!(
            response_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn repository_not_found_becomes_404() {
        let err = AppError::from(RepositoryError::NotFound("restaurant 9".into()));
        assert_eq!(response_status(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn repository_failure_becomes_500() {
        let err = AppError::from(RepositoryError::Sql(rusqlite::Error::QueryReturnedNoRows));
        assert_eq!(response_status(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn view_model_error_returns_500() {
        let err = AppError::from(ViewModelError::MissingField {
            restaurant_id: 1,
            field: "description",
        });
        assert_eq!(response_status(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
