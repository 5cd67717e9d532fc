//! Exercises `MetricsContext::create_context`/`get_metrics` end to end:
//! the context's `metric-group-infos` from the create response feed the
//! parser that decodes the plain-text `GET <metrics-context-uri>` body.

mod common;

use axum::Json;
use axum::routing::{get, post};
use axum::Router;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use zhmc::client::Client;
use zhmc::session::{PasswordSource, Session};

async fn logon() -> Json<Value> {
    Json(json!({ "api-session": "sess-1" }))
}

async fn create_context() -> Json<Value> {
    Json(json!({
        "metrics-context-uri": "/api/services/metrics/context/ctx1",
        "metric-group-infos": [
            {
                "group-name": "partition-usage",
                "metric-infos": [
                    {"metric-name": "processor-usage", "metric-type": "integer-metric"},
                    {"metric-name": "partition-name", "metric-type": "string-metric"},
                ],
            }
        ],
    }))
}

async fn get_metrics() -> Response {
    let body = "\"partition-usage\"\n\"/api/partitions/1\"\n37,\"part1\"\n\"/api/partitions/2\"\n91,\"part2\"";
    ([(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

async fn test_client() -> Client {
    let router = Router::new()
        .route("/api/sessions", post(logon))
        .route("/api/services/metrics/context", post(create_context))
        .route("/api/services/metrics/context/ctx1", get(get_metrics));
    let base_url = common::spawn(router).await;
    let session = Session::for_testing(base_url, "apiuser", PasswordSource::Password("secret".to_string()))
        .expect("build test session");
    Client::new(session)
}

#[tokio::test]
async fn create_then_get_metrics_round_trips_typed_values() {
    let client = test_client().await;

    let ctx = client
        .metrics_contexts()
        .create_context(15, vec!["partition-usage".to_string()])
        .await
        .expect("create context");

    let response = ctx.get_metrics().await.expect("get_metrics parses");
    let group = response.group("partition-usage").expect("partition-usage group present");
    assert_eq!(group.object_values.len(), 2);

    let part1 = &group.object_values[0];
    assert_eq!(part1.resource_uri, "/api/partitions/1");
    assert_eq!(
        part1.get("processor-usage"),
        Some(&zhmc::metrics_response::MetricValue::Integer(37))
    );
    assert_eq!(
        part1.get("partition-name"),
        Some(&zhmc::metrics_response::MetricValue::String("part1".to_string()))
    );
}

#[tokio::test]
async fn frequency_below_minimum_is_rejected_client_side() {
    let client = test_client().await;
    let result = client
        .metrics_contexts()
        .create_context(5, vec!["partition-usage".to_string()])
        .await;
    assert!(result.is_err());
}
