//! HTTPS transport, logon/logoff, session renewal, and JSON decoding.
//!
//! [`Session`] is the sole point of contact with the HMC. It is cheap to
//! clone (an `Arc` handle) so that `Manager`s, `Job`s, and the
//! `NotificationReceiver` can each hold their own reference without
//! lifetime gymnastics.

mod transport;

pub use transport::VerifyCert;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest_middleware::ClientWithMiddleware;
use serde_json::{Value, json};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::RetryTimeoutConfig;
use crate::error::HmcError;
use crate::job::Job;
use crate::timestats::TimeStatsKeeper;

/// Where the session obtains the logon password from.
#[derive(Clone)]
pub enum PasswordSource {
    /// A password known up front.
    Password(String),
    /// A callback invoked synchronously with `(host, userid)` at logon time.
    Callback(Arc<dyn Fn(&str, &str) -> Result<String, HmcError> + Send + Sync>),
}

impl std::fmt::Debug for PasswordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password(_) => write!(f, "Password(<redacted>)"),
            Self::Callback(_) => write!(f, "Callback(..)"),
        }
    }
}

/// Outcome of a completed async POST, returned verbatim when
/// `wait_for_completion = false`.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub job_uri: String,
    pub raw: Value,
}

/// What a non-waiting POST, or a completed synchronous POST, produced.
#[derive(Debug, Clone)]
pub enum PostOutcome {
    /// Operation completed synchronously, or the caller waited for the job.
    Result(Option<Value>),
    /// Operation is async and the caller asked not to wait.
    Pending(JobHandle),
}

#[derive(Debug, Default)]
struct SessionState {
    session_id: Option<String>,
    default_headers: HashMap<String, String>,
}

struct SessionInner {
    host: String,
    port: u16,
    userid: String,
    password: PasswordSource,
    retry_timeout: RetryTimeoutConfig,
    client: ClientWithMiddleware,
    state: RwLock<SessionState>,
    logon_lock: Mutex<()>,
    timestats: TimeStatsKeeper,
    /// Set only by [`Session::for_testing`]: replaces the usual
    /// `https://host:port` base URL so tests can point at a loopback fake
    /// HMC without TLS.
    base_url_override: Option<String>,
}

/// An authenticated HTTPS connection to one HMC.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.inner.host)
            .field("port", &self.inner.port)
            .field("userid", &self.inner.userid)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Construct a new, lazily logged-off session. Default port is 6794.
    pub fn new(
        host: impl Into<String>,
        userid: impl Into<String>,
        password: PasswordSource,
        verify_cert: VerifyCert,
        retry_timeout: RetryTimeoutConfig,
    ) -> Result<Self, HmcError> {
        Self::with_port(host, 6794, userid, password, verify_cert, retry_timeout)
    }

    /// Construct a session against a non-default port.
    pub fn with_port(
        host: impl Into<String>,
        port: u16,
        userid: impl Into<String>,
        password: PasswordSource,
        verify_cert: VerifyCert,
        retry_timeout: RetryTimeoutConfig,
    ) -> Result<Self, HmcError> {
        let client = transport::build_client(
            &verify_cert,
            retry_timeout.connect_timeout,
            retry_timeout.read_timeout,
        )?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                host: host.into(),
                port,
                userid: userid.into(),
                password,
                retry_timeout,
                client,
                state: RwLock::new(SessionState::default()),
                logon_lock: Mutex::new(()),
                timestats: TimeStatsKeeper::new(),
                base_url_override: None,
            }),
        })
    }

    /// Construct a session against a plaintext `base_url` (e.g.
    /// `http://127.0.0.1:PORT`), bypassing the HMC's usual TLS requirement.
    /// Only compiled with the `test-util` feature; intended for driving an
    /// in-process fake HMC from integration tests.
    #[cfg(feature = "test-util")]
    pub fn for_testing(
        base_url: impl Into<String>,
        userid: impl Into<String>,
        password: PasswordSource,
    ) -> Result<Self, HmcError> {
        let retry_timeout = RetryTimeoutConfig::default();
        let client = transport::build_client(
            &VerifyCert::No,
            retry_timeout.connect_timeout,
            retry_timeout.read_timeout,
        )?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                host: String::new(),
                port: 0,
                userid: userid.into(),
                password,
                retry_timeout,
                client,
                state: RwLock::new(SessionState::default()),
                logon_lock: Mutex::new(()),
                timestats: TimeStatsKeeper::new(),
                base_url_override: Some(base_url.into()),
            }),
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    #[must_use]
    pub fn timestats(&self) -> &TimeStatsKeeper {
        &self.inner.timestats
    }

    #[must_use]
    pub fn retry_timeout_config(&self) -> &RetryTimeoutConfig {
        &self.inner.retry_timeout
    }

    pub async fn is_logon(&self) -> bool {
        self.inner.state.read().await.session_id.is_some()
    }

    fn base_url(&self) -> String {
        match &self.inner.base_url_override {
            Some(url) => url.clone(),
            None => format!("https://{}:{}", self.inner.host, self.inner.port),
        }
    }

    fn resolve_password(&self) -> Result<String, HmcError> {
        match &self.inner.password {
            PasswordSource::Password(p) => Ok(p.clone()),
            PasswordSource::Callback(cb) => cb(&self.inner.host, &self.inner.userid),
        }
    }

    /// `POST /api/sessions`; stores the returned `api-session` as the session-id.
    pub async fn logon(&self) -> Result<(), HmcError> {
        let _guard = self.inner.logon_lock.lock().await;
        self.logon_locked().await
    }

    /// Performs the logon assuming `logon_lock` is already held by the caller.
    async fn logon_locked(&self) -> Result<(), HmcError> {
        let password = self.resolve_password()?;
        let url = format!("{}/api/sessions", self.base_url());
        let body = json!({"userid": self.inner.userid, "password": password});

        let started = Instant::now();
        let response = self
            .inner
            .client
            .post(&url)
            .header("Content-type", "application/json")
            .header("Accept", "*/*")
            .json(&body)
            .send()
            .await?;
        self.inner
            .timestats
            .record("POST /api/sessions", started.elapsed());

        let status = response.status();
        let json_body: Value = response.json().await.map_err(HmcError::from)?;
        if !status.is_success() {
            return Err(self.hmc_error_from_body(status.as_u16(), &json_body, &url, "POST"));
        }

        let session_id = json_body
            .get("api-session")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                HmcError::ServerAuthError("logon response missing api-session".to_string())
            })?
            .to_string();

        let mut state = self.inner.state.write().await;
        state.session_id = Some(session_id.clone());
        state
            .default_headers
            .insert("X-API-Session".to_string(), session_id);
        info!("HMC session established for {}", self.inner.host);
        Ok(())
    }

    /// `DELETE /api/sessions/this-session`.
    pub async fn logoff(&self) -> Result<(), HmcError> {
        let session_id = { self.inner.state.read().await.session_id.clone() };
        if session_id.is_none() {
            return Ok(());
        }
        self.delete("/api/sessions/this-session", true).await?;
        let mut state = self.inner.state.write().await;
        state.session_id = None;
        state.default_headers.remove("X-API-Session");
        Ok(())
    }

    async fn headers_snapshot(&self) -> HashMap<String, String> {
        self.inner.state.read().await.default_headers.clone()
    }

    fn uri_template(uri: &str) -> String {
        uri.split('/')
            .map(|segment| {
                let looks_like_id = segment.len() >= 8
                    && segment
                        .chars()
                        .all(|c| c.is_ascii_hexdigit() || c == '-');
                if looks_like_id { "{id}" } else { segment }
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    fn hmc_error_from_body(&self, http_status: u16, body: &Value, uri: &str, method: &str) -> HmcError {
        let reason = body.get("reason").and_then(Value::as_i64);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        HmcError::http_error(http_status, reason, message, uri, method)
    }

    /// Shared request path for GET/DELETE and the non-retry part of POST.
    async fn send_once(
        &self,
        method: http::Method,
        uri: &str,
        body: Option<&Value>,
        logon_required: bool,
    ) -> Result<(http::StatusCode, Value), HmcError> {
        let url = format!("{}{}", self.base_url(), uri);
        let headers = self.headers_snapshot().await;

        let mut builder = self
            .inner
            .client
            .request(method.clone(), &url)
            .header("Content-type", "application/json")
            .header("Accept", "*/*");
        for (k, v) in &headers {
            builder = builder.header(k, v);
        }
        if logon_required && !headers.contains_key("X-API-Session") {
            return Err(HmcError::ClientAuthError(
                "request requires a logged-on session".to_string(),
            ));
        }
        if let Some(b) = body {
            builder = builder.json(b);
        }

        let started = Instant::now();
        let response = builder.send().await?;
        self.inner
            .timestats
            .record(&format!("{} {}", method, Self::uri_template(uri)), started.elapsed());

        let status = response.status();
        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if status == http::StatusCode::NO_CONTENT {
            return Ok((status, Value::Null));
        }

        let text = response.text().await.map_err(HmcError::from)?;
        if text.is_empty() {
            return Ok((status, Value::Null));
        }

        if content_type.contains("json") || text.trim_start().starts_with(['{', '[']) {
            match serde_json::from_str::<Value>(&text) {
                Ok(v) => Ok((status, v)),
                Err(e) if status.as_u16() == 500 && text.contains("<html") => {
                    let _ = e;
                    debug!("HMC returned HTML 500; Web Services API is likely disabled");
                    Ok((
                        status,
                        json!({"reason": 900, "message": "Web Services API is not enabled"}),
                    ))
                }
                Err(e) => Err(HmcError::from(e)),
            }
        } else if status.as_u16() == 500 && text.contains("<html") {
            Ok((
                status,
                json!({"reason": 900, "message": "Web Services API is not enabled"}),
            ))
        } else {
            Ok((status, json!({"text": text})))
        }
    }

    /// Runs `op`, transparently handling session renewal on 403/5 when
    /// `renew_session` is true. Retries the request exactly once.
    async fn with_renewal<T, F, Fut>(&self, renew_session: bool, op: F) -> Result<T, HmcError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, HmcError>>,
    {
        match op().await {
            Err(e) if renew_session && e.is_session_expired() => {
                warn!("HMC session expired; renewing");
                let old_session_id = self.inner.state.read().await.session_id.clone();
                {
                    let _guard = self.inner.logon_lock.lock().await;
                    let current = self.inner.state.read().await.session_id.clone();
                    if current == old_session_id {
                        // Nobody else renewed it while we waited for the lock.
                        self.inner
                            .state
                            .write()
                            .await
                            .session_id
                            .take();
                        self.logon_locked().await?;
                    }
                }
                op().await
            }
            other => other,
        }
    }

    /// `GET <uri>`.
    pub async fn get(
        &self,
        uri: &str,
        logon_required: bool,
        renew_session: bool,
    ) -> Result<Value, HmcError> {
        if logon_required && !self.is_logon().await {
            self.logon().await?;
        }
        let uri_owned = uri.to_string();
        let result = self
            .with_renewal(renew_session, || async {
                let (status, body) = self
                    .send_once(http::Method::GET, &uri_owned, None, logon_required)
                    .await?;
                if status.is_success() {
                    Ok(body)
                } else {
                    Err(self.hmc_error_from_body(status.as_u16(), &body, &uri_owned, "GET"))
                }
            })
            .await?;
        Ok(result)
    }

    /// `DELETE <uri>`.
    pub async fn delete(&self, uri: &str, logon_required: bool) -> Result<(), HmcError> {
        if logon_required && !self.is_logon().await {
            self.logon().await?;
        }
        let uri_owned = uri.to_string();
        self.with_renewal(true, || async {
            let (status, body) = self
                .send_once(http::Method::DELETE, &uri_owned, None, logon_required)
                .await?;
            if status.is_success() {
                Ok(())
            } else {
                Err(self.hmc_error_from_body(status.as_u16(), &body, &uri_owned, "DELETE"))
            }
        })
        .await
    }

    /// `POST <uri>` with an optional JSON body.
    ///
    /// If the HMC answers `202` with a `job-uri` and `wait_for_completion`
    /// is true, polls the resulting [`Job`] to completion and returns its
    /// result. If `wait_for_completion` is false, returns the raw
    /// `{job-uri, ...}` mapping as [`PostOutcome::Pending`].
    pub async fn post(
        &self,
        uri: &str,
        body: Option<Value>,
        logon_required: bool,
        wait_for_completion: bool,
        operation_timeout: Option<Duration>,
        renew_session: bool,
    ) -> Result<PostOutcome, HmcError> {
        if logon_required && !self.is_logon().await {
            self.logon().await?;
        }
        let uri_owned = uri.to_string();
        let body_ref = body.clone();
        let (status, response_body) = self
            .with_renewal(renew_session, || {
                let body_ref = body_ref.clone();
                async move {
                    let (status, resp) = self
                        .send_once(http::Method::POST, &uri_owned, body_ref.as_ref(), logon_required)
                        .await?;
                    if status.is_success() || status == http::StatusCode::ACCEPTED {
                        Ok((status, resp))
                    } else {
                        Err(self.hmc_error_from_body(status.as_u16(), &resp, &uri_owned, "POST"))
                    }
                }
            })
            .await?;

        if status == http::StatusCode::ACCEPTED {
            let job_uri = response_body
                .get("job-uri")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    HmcError::ConsistencyError("202 response missing job-uri".to_string())
                })?
                .to_string();
            if wait_for_completion {
                let job = Job::new(self.clone(), job_uri, "POST", uri);
                let result = job
                    .wait_for_completion(operation_timeout.or(self.inner.retry_timeout.operation_timeout))
                    .await?;
                Ok(PostOutcome::Result(result))
            } else {
                Ok(PostOutcome::Pending(JobHandle {
                    job_uri,
                    raw: response_body,
                }))
            }
        } else {
            let result = if matches!(response_body, Value::Null) {
                None
            } else {
                Some(response_body)
            };
            Ok(PostOutcome::Result(result))
        }
    }

    /// Convenience wrapper over [`Self::post`] for synchronous operations and
    /// operations the caller always wants to wait for.
    pub async fn post_and_wait(
        &self,
        uri: &str,
        body: Option<Value>,
        operation_timeout: Option<Duration>,
    ) -> Result<Option<Value>, HmcError> {
        match self.post(uri, body, true, true, operation_timeout, true).await? {
            PostOutcome::Result(v) => Ok(v),
            PostOutcome::Pending(_) => unreachable!("wait_for_completion=true never returns Pending"),
        }
    }

    /// `GET /api/sessions/operations/get-notification-topics`.
    pub async fn get_notification_topics(&self) -> Result<Value, HmcError> {
        self.get("/api/sessions/operations/get-notification-topics", true, true)
            .await
    }

    /// The current session-id, if logged on.
    pub async fn session_id(&self) -> Option<String> {
        self.inner.state.read().await.session_id.clone()
    }

    /// `(userid, password)` for the STOMP `CONNECT` frame: the JMS broker
    /// authenticates separately from the Web Services session and expects
    /// the same credentials used for `logon`, not the session-id.
    pub(crate) fn notification_credentials(&self) -> Result<(String, String), HmcError> {
        Ok((self.inner.userid.clone(), self.resolve_password()?))
    }

    #[must_use]
    pub fn userid(&self) -> &str {
        &self.inner.userid
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_template_collapses_ids() {
        assert_eq!(
            Session::uri_template("/api/partitions/abcdef0123456789"),
            "/api/partitions/{id}"
        );
        assert_eq!(Session::uri_template("/api/cpcs"), "/api/cpcs");
    }
}
