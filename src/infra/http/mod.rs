//! HTTP surface: point lookups, order submission and a health probe.

pub mod error;
mod handlers;
mod middleware;

pub use handlers::LOOKUP_SOURCE_HEADER;
pub use middleware::{REQUEST_ID_HEADER, RequestContext};

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::{
    lookup::LookupService,
    repos::{HealthProbe, OrderQueue},
};
use crate::domain::entities::{DeliveryRecord, ItemRecord, OrderRecord, PaymentRecord};

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub deliveries: Arc<LookupService<DeliveryRecord>>,
    pub payments: Arc<LookupService<PaymentRecord>>,
    pub items: Arc<LookupService<ItemRecord>>,
    pub orders: Arc<LookupService<OrderRecord>>,
    pub queue: Arc<dyn OrderQueue>,
    pub health: Arc<dyn HealthProbe>,
}

pub fn build_router(state: HttpState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/delivery/{id}", get(handlers::get_delivery))
        .route("/payment/{id}", get(handlers::get_payment))
        .route("/item/{id}", get(handlers::get_item))
        .route("/order/{uid}", get(handlers::get_order))
        .route(
            "/order",
            post(handlers::create_order).layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
