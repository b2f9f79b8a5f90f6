//! Live end-to-end ingestion against a running orderflow instance.
//!
//! - Targets `ORDERFLOW_BASE_URL` (default `http://127.0.0.1:8080`).
//! - Submits an order over HTTP, then polls the lookup routes until the
//!   worker has ingested it.
//! - Marked `#[ignore]` so it only runs manually with the server and its
//!   database up.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::{Client, StatusCode};
use serde_json::Value;
use serial_test::serial;

mod support;

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const POLL_ATTEMPTS: usize = 50;

fn base_url() -> String {
    std::env::var("ORDERFLOW_BASE_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
        .trim_end_matches('/')
        .to_string()
}

fn unique_uid() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    format!("live-{nanos}")
}

#[tokio::test]
#[ignore]
#[serial]
async fn live_order_round_trip() -> TestResult<()> {
    let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
    let base = base_url();
    let uid = unique_uid();

    let health = client.get(format!("{base}/health")).send().await?;
    assert_eq!(health.status(), StatusCode::NO_CONTENT, "server unhealthy");

    let accepted = client
        .post(format!("{base}/order"))
        .header("content-type", "application/json")
        .body(support::sample_message(&uid).to_string())
        .send()
        .await?;
    assert_eq!(accepted.status(), StatusCode::ACCEPTED);
    let body: Value = accepted.json().await?;
    assert_eq!(body["status"], "accepted");
    assert!(body["job_id"].as_str().is_some());

    let order = poll_order(&client, &base, &uid).await?;
    assert_eq!(order["order_uid"], uid.as_str());

    let delivery_id = order["delivery"].as_i64().ok_or("order without delivery")?;
    let delivery = client
        .get(format!("{base}/delivery/{delivery_id}"))
        .send()
        .await?;
    assert_eq!(delivery.status(), StatusCode::OK);
    assert_eq!(
        delivery
            .headers()
            .get("x-orderflow-source")
            .and_then(|value| value.to_str().ok()),
        Some("cache")
    );
    let delivery: Value = delivery.json().await?;
    assert_eq!(delivery["name"], "Jane");

    let items = order["items"].as_array().ok_or("order without items")?;
    assert_eq!(items.len(), 1);

    Ok(())
}

#[tokio::test]
#[ignore]
#[serial]
async fn live_rejects_malformed_requests() -> TestResult<()> {
    let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
    let base = base_url();

    let bad_id = client.get(format!("{base}/item/not-a-number")).send().await?;
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);

    let missing = client
        .get(format!("{base}/order/{}", unique_uid()))
        .send()
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: Value = missing.json().await?;
    assert_eq!(body["error"]["code"], "not_found");

    let not_object = client
        .post(format!("{base}/order"))
        .body("[]")
        .send()
        .await?;
    assert_eq!(not_object.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

async fn poll_order(client: &Client, base: &str, uid: &str) -> TestResult<Value> {
    for _ in 0..POLL_ATTEMPTS {
        let response = client.get(format!("{base}/order/{uid}")).send().await?;
        match response.status() {
            StatusCode::OK => return Ok(response.json().await?),
            StatusCode::NOT_FOUND => tokio::time::sleep(POLL_INTERVAL).await,
            other => return Err(format!("unexpected status {other} for order {uid}").into()),
        }
    }
    Err(format!("order {uid} was not ingested in time").into())
}
