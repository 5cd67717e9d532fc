//! Shared in-process fake-HMC scaffolding for the integration suite.
//!
//! Each test builds its own `axum::Router` with just the routes it needs
//! and hands it to [`spawn`], which binds a loopback listener on an
//! ephemeral port and returns the base URL to point a [`zhmc::session::Session`]
//! at via `Session::for_testing`.

use axum::Router;
use tokio::net::TcpListener;

/// Bind `router` to `127.0.0.1:0` and serve it in the background for the
/// lifetime of the test process. Returns `http://127.0.0.1:<port>`.
pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fake HMC server crashed");
    });
    format!("http://{addr}")
}
