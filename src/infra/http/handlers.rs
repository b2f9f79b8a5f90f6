use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::application::{
    entity::Entity,
    jobs::publish_order_message,
    lookup::{Lookup, LookupService},
};
use crate::domain::entities::{DeliveryRecord, ItemRecord, OrderRecord, PaymentRecord};

use super::{HttpState, error::ApiError};

/// Reports whether a lookup was answered by the cache or the store.
pub const LOOKUP_SOURCE_HEADER: HeaderName = HeaderName::from_static("x-orderflow-source");

#[derive(Debug, Serialize)]
struct AcceptedBody {
    status: &'static str,
    job_id: String,
}

pub async fn get_delivery(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    lookup_numeric::<DeliveryRecord>(&state.deliveries, &id).await
}

pub async fn get_payment(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    lookup_numeric::<PaymentRecord>(&state.payments, &id).await
}

pub async fn get_item(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    lookup_numeric::<ItemRecord>(&state.items, &id).await
}

pub async fn get_order(
    State(state): State<HttpState>,
    Path(uid): Path<String>,
) -> Result<Response, ApiError> {
    let lookup = state.orders.get(&uid).await?;
    Ok(lookup_response(lookup))
}

/// Queue the request body for asynchronous ingestion and acknowledge at once.
pub async fn create_order(
    State(state): State<HttpState>,
    body: String,
) -> Result<Response, ApiError> {
    let job_id = publish_order_message(state.queue.as_ref(), body).await?;
    let body = AcceptedBody {
        status: "accepted",
        job_id,
    };
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}

pub async fn health(State(state): State<HttpState>) -> Result<StatusCode, ApiError> {
    state.health.ping().await.map_err(ApiError::unavailable)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn lookup_numeric<E>(lookups: &LookupService<E>, raw: &str) -> Result<Response, ApiError>
where
    E: Entity<Key = i64> + Serialize,
{
    let id = raw.parse::<i64>().map_err(|_| {
        ApiError::bad_request(
            "Identifier must be an integer",
            Some(format!("`{raw}` is not a valid {} id", E::KIND)),
        )
    })?;
    let lookup = lookups.get(&id).await?;
    Ok(lookup_response(lookup))
}

fn lookup_response<E: Serialize>(lookup: Lookup<E>) -> Response {
    let mut response = Json(lookup.record).into_response();
    response.headers_mut().insert(
        LOOKUP_SOURCE_HEADER,
        HeaderValue::from_static(lookup.source.as_str()),
    );
    response
}
