use std::error::Error as StdError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::jobs::PublishError;
use crate::application::repos::RepoError;
use crate::application::service::EntityError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const STORE: &str = "store_error";
    pub const TRANSPORT: &str = "transport_error";
    pub const UNAVAILABLE: &str = "unavailable";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// JSON error response. The public body carries a stable code; the full
/// cause chain travels in an [`ErrorReport`] for the logging middleware.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    chain: Vec<String>,
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
            chain: Vec::new(),
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn not_found(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, hint)
    }

    /// The database did not answer a health probe.
    pub fn unavailable(err: RepoError) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::UNAVAILABLE,
            "Database unavailable",
            None,
        )
        .caused_by(&err)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    fn caused_by(mut self, error: &dyn StdError) -> Self {
        let report = ErrorReport::from_error("infra::http::error", self.status, error);
        self.chain = report.messages;
        self
    }
}

impl From<EntityError> for ApiError {
    fn from(err: EntityError) -> Self {
        let api = match &err {
            EntityError::NotFound { kind, key } => {
                Self::not_found("Entity not found", Some(format!("no {kind} with key `{key}`")))
            }
            EntityError::InvalidInput(domain) => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "Invalid input",
                Some(domain.to_string()),
            ),
            EntityError::Store {
                source: RepoError::Timeout,
                ..
            } => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::DB_TIMEOUT,
                "Database timeout",
                None,
            ),
            EntityError::Store { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::STORE,
                "Store error",
                None,
            ),
        };
        api.caused_by(&err)
    }
}

impl From<PublishError> for ApiError {
    fn from(err: PublishError) -> Self {
        let api = match &err {
            PublishError::InvalidPayload(reason) => {
                Self::bad_request("Order message must be a JSON object", Some(reason.clone()))
            }
            PublishError::Transport(_) => Self::new(
                StatusCode::BAD_GATEWAY,
                codes::TRANSPORT,
                "Order message could not be queued",
                None,
            ),
        };
        api.caused_by(&err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let chain = if self.chain.is_empty() {
            vec![format!(
                "{}: {}",
                self.code,
                self.hint.as_deref().unwrap_or(self.message)
            )]
        } else {
            self.chain
        };
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport {
            source: "infra::http::api",
            status: self.status,
            messages: chain,
        }
        .attach(&mut response);
        response
    }
}
