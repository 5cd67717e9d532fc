//! Exercises `Session`'s transparent renew-on-403 behavior against an
//! in-process fake HMC: the first `GET /api/cpcs` after logon is answered
//! with a session-expired error, and the session is expected to log back
//! on exactly once and retry the request transparently.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use zhmc::session::{PasswordSource, Session};

#[derive(Clone, Default)]
struct Counters {
    logons: Arc<AtomicUsize>,
    cpc_list_calls: Arc<AtomicUsize>,
}

async fn logon(State(counters): State<Counters>) -> Json<Value> {
    let n = counters.logons.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({ "api-session": format!("session-{n}") }))
}

async fn list_cpcs(State(counters): State<Counters>) -> (http::StatusCode, Json<Value>) {
    let call = counters.cpc_list_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if call == 1 {
        (
            http::StatusCode::FORBIDDEN,
            Json(json!({ "reason": 5, "message": "session expired" })),
        )
    } else {
        (
            http::StatusCode::OK,
            Json(json!({ "cpcs": [{"object-uri": "/api/cpcs/1", "name": "cpc1"}] })),
        )
    }
}

#[tokio::test]
async fn expired_session_is_renewed_and_request_retried() {
    let counters = Counters::default();
    let router = Router::new()
        .route("/api/sessions", post(logon))
        .route("/api/cpcs", get(list_cpcs))
        .with_state(counters.clone());
    let base_url = common::spawn(router).await;

    let session = Session::for_testing(base_url, "apiuser", PasswordSource::Password("secret".to_string()))
        .expect("build test session");

    let body = session.get("/api/cpcs", true, true).await.expect("renewed GET succeeds");
    let cpcs = body.get("cpcs").and_then(Value::as_array).expect("cpcs array");
    assert_eq!(cpcs.len(), 1);

    assert_eq!(counters.logons.load(Ordering::SeqCst), 2, "initial logon plus one renewal");
    assert_eq!(counters.cpc_list_calls.load(Ordering::SeqCst), 2, "one failed call, one retry");
}

#[tokio::test]
async fn logoff_is_a_noop_when_never_logged_on() {
    let router = Router::new().route("/api/sessions", post(logon));
    let base_url = common::spawn(router).await;
    let session = Session::for_testing(base_url, "apiuser", PasswordSource::Password("secret".to_string()))
        .expect("build test session");

    session.logoff().await.expect("logoff without a session is a no-op");
}
