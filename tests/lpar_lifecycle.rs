//! Exercises `Lpar::activate`/`deactivate`/`load` end to end against an
//! in-process fake HMC: async-job polling feeding into a
//! `wait_for_status` status wait, and the post-load bookkeeping
//! (`last-used-load-*`) merged into the local resource.

mod common;

use std::sync::Mutex;

use axum::Json;
use axum::extract::{Path, State};
use axum::Router;
use axum::routing::{get, post};
use serde_json::{Value, json};

use zhmc::client::Client;
use zhmc::session::{PasswordSource, Session};

#[derive(Default)]
struct LparState {
    status: Mutex<String>,
}

type SharedState = std::sync::Arc<LparState>;

async fn logon() -> Json<Value> {
    Json(json!({ "api-session": "sess-1" }))
}

async fn get_lpar(State(state): State<SharedState>, Path((_cpc, _lpar)): Path<(String, String)>) -> Json<Value> {
    let status = state.status.lock().unwrap().clone();
    Json(json!({
        "object-uri": "/api/cpcs/1/logical-partitions/1",
        "name": "lpar1",
        "status": status,
    }))
}

async fn activate(
    State(state): State<SharedState>,
    Path((_cpc, _lpar)): Path<(String, String)>,
) -> (http::StatusCode, Json<Value>) {
    *state.status.lock().unwrap() = "operating".to_string();
    (http::StatusCode::ACCEPTED, Json(json!({ "job-uri": "/api/jobs/activate-1" })))
}

async fn deactivate(
    State(state): State<SharedState>,
    Path((_cpc, _lpar)): Path<(String, String)>,
) -> (http::StatusCode, Json<Value>) {
    *state.status.lock().unwrap() = "not-activated".to_string();
    (http::StatusCode::ACCEPTED, Json(json!({ "job-uri": "/api/jobs/deactivate-1" })))
}

async fn load(
    State(state): State<SharedState>,
    Path((_cpc, _lpar)): Path<(String, String)>,
) -> (http::StatusCode, Json<Value>) {
    *state.status.lock().unwrap() = "operating".to_string();
    (http::StatusCode::ACCEPTED, Json(json!({ "job-uri": "/api/jobs/load-1" })))
}

async fn job_status(Path(_job_id): Path<String>) -> Json<Value> {
    Json(json!({
        "status": "complete",
        "job-status-code": 200,
        "job-reason-code": Value::Null,
        "job-results": Value::Null,
    }))
}

async fn job_delete(Path(_job_id): Path<String>) -> http::StatusCode {
    http::StatusCode::NO_CONTENT
}

async fn test_client() -> Client {
    let state: SharedState = std::sync::Arc::new(LparState {
        status: Mutex::new("not-activated".to_string()),
    });
    let router = Router::new()
        .route("/api/sessions", post(logon))
        .route("/api/cpcs/{cpc}/logical-partitions/{lpar}", get(get_lpar))
        .route("/api/cpcs/{cpc}/logical-partitions/{lpar}/operations/activate", post(activate))
        .route("/api/cpcs/{cpc}/logical-partitions/{lpar}/operations/deactivate", post(deactivate))
        .route("/api/cpcs/{cpc}/logical-partitions/{lpar}/operations/load", post(load))
        .route("/api/jobs/{job}", get(job_status).delete(job_delete))
        .with_state(state);
    let base_url = common::spawn(router).await;
    let session = Session::for_testing(base_url, "apiuser", PasswordSource::Password("secret".to_string()))
        .expect("build test session");
    Client::new(session)
}

#[tokio::test]
async fn activate_waits_for_operating_status() {
    let client = test_client().await;
    let cpc = client.cpcs().resource_object("/api/cpcs/1", None);
    let lpar = cpc.lpars().resource_object("1", None);

    lpar.activate(None, false, false, None, None)
        .await
        .expect("activate completes and reaches operating");
}

#[tokio::test]
async fn deactivate_waits_for_not_activated_status() {
    let client = test_client().await;
    let cpc = client.cpcs().resource_object("/api/cpcs/1", None);
    let lpar = cpc.lpars().resource_object("1", None);

    lpar.activate(None, false, false, None, None).await.expect("activate first");
    lpar.deactivate(false, false, None, None)
        .await
        .expect("deactivate completes and reaches not-activated");
}

#[tokio::test]
async fn load_applies_last_used_load_address_locally() {
    let client = test_client().await;
    let cpc = client.cpcs().resource_object("/api/cpcs/1", None);
    let lpar = cpc.lpars().resource_object("1", None);

    let result = lpar
        .load("00C0", Some("0"), false, false, false, false, None, None)
        .await
        .expect("load completes");
    assert!(result.job_results.is_none());

    let last_address = lpar.prop("last-used-load-address").await.expect("prop lookup");
    assert_eq!(last_address, Some(json!("00C0")));
}
