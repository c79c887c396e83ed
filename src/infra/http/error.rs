use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::{DirectoryError, ErrorReport};

const SOURCE: &str = "infra::http::error";

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const ALREADY_EXISTS: &str = "already_exists";
    pub const STORE_UNAVAILABLE: &str = "store_unavailable";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            report: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn not_found(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, hint)
    }

    /// Opaque 500; the error chain goes to the logs only.
    pub fn internal(error: &DirectoryError) -> Self {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        Self {
            report: Some(ErrorReport::from_error(SOURCE, status, error)),
            ..Self::new(status, codes::STORE_UNAVAILABLE, "Internal Server Error", None)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DirectoryError> for ApiError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::Validation(err) => {
                Self::bad_request("invalid request", Some(err.to_string()))
            }
            DirectoryError::NotFound { name } => {
                Self::not_found("item not found", Some(format!("no item named `{name}`")))
            }
            DirectoryError::AlreadyExists { name } => Self::new(
                StatusCode::CONFLICT,
                codes::ALREADY_EXISTS,
                "item already exists",
                Some(format!("an item named `{name}` already exists")),
            ),
            other @ (DirectoryError::Repo(_) | DirectoryError::Cache(_)) => Self::internal(&other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("invalid request body", Some(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request("invalid query string", Some(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = match self.report {
            Some(report) => report,
            None => ErrorReport::from_message(
                SOURCE,
                self.status,
                format!(
                    "{}: {}",
                    self.code,
                    self.hint.as_deref().unwrap_or(self.message)
                ),
            ),
        };
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Consumed by `log_responses`.
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use crate::application::repos::RepoError;
    use crate::cache::CacheError;
    use crate::domain::error::DomainError;

    use super::*;

    #[test]
    fn directory_errors_map_to_statuses() {
        let cases = [
            (
                DirectoryError::from(DomainError::validation("bad")),
                StatusCode::BAD_REQUEST,
            ),
            (DirectoryError::not_found("a"), StatusCode::NOT_FOUND),
            (DirectoryError::already_exists("a"), StatusCode::CONFLICT),
            (
                DirectoryError::from(RepoError::Timeout),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DirectoryError::from(CacheError::Sweep {
                    failed: 1,
                    attempted: 4823,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn internal_errors_keep_details_out_of_the_body() {
        let error = DirectoryError::from(RepoError::from_persistence("connection refused"));
        let response = ApiError::from(error).into_response();

        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert!(
            report
                .messages
                .iter()
                .any(|message| message.contains("connection refused"))
        );
    }
}
