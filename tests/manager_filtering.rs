//! Exercises `Manager::list`/`find_by_name` against an in-process fake
//! HMC: server-side query-prop filtering reaches the query string,
//! non-query-prop filters are applied client-side as regex matches, and
//! `find_by_name` is backed by the name/URI cache.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::Router;
use axum::extract::{RawQuery, State};
use axum::routing::{get, post};
use serde_json::{Value, json};

use zhmc::client::Client;
use zhmc::manager::FilterArgs;
use zhmc::session::{PasswordSource, Session};

#[derive(Clone, Default)]
struct Captured {
    last_query: Arc<std::sync::Mutex<Option<String>>>,
    list_calls: Arc<AtomicUsize>,
}

fn cpcs_body() -> Value {
    json!({
        "cpcs": [
            {"object-uri": "/api/cpcs/1", "name": "cpc1", "status": "active", "description": "widget-host"},
            {"object-uri": "/api/cpcs/2", "name": "cpc2", "status": "active", "description": "other-host"},
            {"object-uri": "/api/cpcs/3", "name": "cpc3", "status": "service", "description": "widget-spare"},
        ]
    })
}

async fn logon() -> axum::Json<Value> {
    axum::Json(json!({ "api-session": "sess-1" }))
}

async fn list_cpcs(State(captured): State<Captured>, RawQuery(query): RawQuery) -> axum::Json<Value> {
    *captured.last_query.lock().unwrap() = query;
    captured.list_calls.fetch_add(1, Ordering::SeqCst);
    axum::Json(cpcs_body())
}

async fn test_client() -> (Client, Captured) {
    let captured = Captured::default();
    let router = Router::new()
        .route("/api/sessions", post(logon))
        .route("/api/cpcs", get(list_cpcs))
        .with_state(captured.clone());
    let base_url = common::spawn(router).await;
    let session = Session::for_testing(base_url, "apiuser", PasswordSource::Password("secret".to_string()))
        .expect("build test session");
    (Client::new(session), captured)
}

#[tokio::test]
async fn list_returns_all_members() {
    let (client, _captured) = test_client().await;
    let cpcs = client.cpcs().list(false, None).await.expect("list succeeds");
    assert_eq!(cpcs.len(), 3);
}

#[tokio::test]
async fn query_prop_filter_is_sent_as_query_string() {
    let (client, captured) = test_client().await;
    let mut filter = FilterArgs::new();
    filter.insert("status".to_string(), json!("active"));
    let cpcs = client.cpcs().list(false, Some(filter)).await.expect("list succeeds");
    assert_eq!(cpcs.len(), 3, "fake server doesn't actually filter; asserting the request shape");

    let query = captured.last_query.lock().unwrap().clone().expect("query string present");
    assert!(query.contains("status=active"));
}

#[tokio::test]
async fn non_query_prop_filter_is_applied_client_side() {
    let (client, captured) = test_client().await;
    let mut filter = FilterArgs::new();
    filter.insert("description".to_string(), json!("^widget.*"));
    let cpcs = client.cpcs().list(false, Some(filter)).await.expect("list succeeds");

    assert_eq!(cpcs.len(), 2, "only the two widget-prefixed cpcs match client-side");

    let query = captured.last_query.lock().unwrap().clone();
    assert!(
        query.is_none_or(|q| !q.contains("description")),
        "client-side filter keys must not reach the query string"
    );
}

#[tokio::test]
async fn find_by_name_uses_cache_after_first_list() {
    let (client, captured) = test_client().await;

    let found = client.cpcs().find_by_name("cpc2").await.expect("cpc2 exists");
    assert_eq!(found.uri(), "/api/cpcs/2");
    assert_eq!(captured.list_calls.load(Ordering::SeqCst), 1, "cache miss triggers exactly one list");

    let found_again = client.cpcs().find_by_name("cpc3").await.expect("cpc3 exists");
    assert_eq!(found_again.uri(), "/api/cpcs/3");
    assert_eq!(
        captured.list_calls.load(Ordering::SeqCst),
        1,
        "second lookup is served from cache, no extra list call"
    );
}
