//! Request tagging and failure logging.

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{Level, event};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    fn generate() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Tag each request with a fresh id and echo it in `x-request-id`.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext::generate();
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Log 4xx at `warn` and 5xx at `error`, with the attached cause chain.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let (source, chain) = response
        .extensions_mut()
        .remove::<ErrorReport>()
        .map(|report| (report.source, report.messages))
        .unwrap_or(("unknown", Vec::new()));
    let elapsed_ms = started.elapsed().as_millis() as u64;

    macro_rules! failure {
        ($level:expr, $message:literal) => {
            event!(
                $level,
                target = "orderflow::http::response",
                status = status.as_u16(),
                method = %method,
                path = %path,
                request_id = %request_id,
                elapsed_ms,
                source,
                chain = ?chain,
                $message
            )
        };
    }

    if status.is_server_error() {
        failure!(Level::ERROR, "request failed");
    } else {
        failure!(Level::WARN, "request rejected");
    }

    response
}
