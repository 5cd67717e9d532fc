//! Error taxonomy for the HMC client.
//!
//! This module contains the structured error type used throughout the
//! crate. It mirrors the behavioral taxonomy from the HMC client's
//! design: transport failures, HMC-reported errors, client-side
//! cardinality errors, and deadline errors are all distinct variants
//! so callers can match on them instead of parsing strings.

use thiserror::Error;

/// The canonical error type returned by every fallible operation in this crate.
#[derive(Error, Debug)]
pub enum HmcError {
    /// Local credentials are missing or otherwise known-bad before any request was sent.
    #[error("client authentication error: {0}")]
    ClientAuthError(String),

    /// The HMC rejected the credentials or session-id.
    #[error("server authentication error: {0}")]
    ServerAuthError(String),

    /// Could not establish a connection to the HMC.
    #[error("connection error: {0}")]
    ConnectionError(#[source] reqwest::Error),

    /// The connection attempt exceeded the configured connect timeout.
    #[error("connect timeout after {0:?}")]
    ConnectTimeout(std::time::Duration),

    /// A request exceeded the configured read timeout.
    #[error("read timeout after {0:?}")]
    ReadTimeout(std::time::Duration),

    /// The HTTP middleware's retry policy gave up.
    #[error("retry error: {0}")]
    RetryError(String),

    /// TLS/certificate validation failed.
    #[error("TLS error: {0}")]
    SslError(String),

    /// The response body was not valid JSON where JSON was expected.
    #[error("parse error at line {line}, column {column}: {summary}")]
    ParseError {
        line: u64,
        column: u64,
        summary: String,
    },

    /// The HMC returned an `http-status >= 400` error body, or a job
    /// completed with a non-success `job-status-code`.
    #[error("HTTP {http_status} (reason {reason:?}): {message:?} [{request_method} {request_uri}]")]
    HttpError {
        http_status: u16,
        reason: Option<i64>,
        message: Option<String>,
        request_uri: String,
        request_method: String,
    },

    /// `find()` matched zero resources.
    #[error("not found: {0}")]
    NotFound(String),

    /// `find()` matched more than one resource.
    #[error("no unique match: {0}")]
    NoUniqueMatch(String),

    /// A status-wait exceeded its deadline without reaching an expected status.
    #[error(
        "timed out waiting for status of {resource_uri} to reach one of {expected:?} \
         (actual: {actual}) after {timeout:?}"
    )]
    StatusTimeout {
        resource_uri: String,
        actual: String,
        expected: Vec<String>,
        timeout: std::time::Duration,
    },

    /// An async job did not complete within the configured operation timeout.
    #[error("Waiting for completion of job {job_uri} timed out after {timeout:?}")]
    OperationTimeout {
        job_uri: String,
        timeout: std::time::Duration,
    },

    /// An operation was attempted on a resource that is known to have been deleted.
    #[error("operation attempted on a resource that has ceased to exist: {0}")]
    CeasedExistence(String),

    /// A local invariant (URI/OID/class consistency) was violated.
    #[error("consistency error: {0}")]
    ConsistencyError(String),

    /// A metrics response referenced a resource URI with no local object.
    #[error("metrics resource not found: {0}")]
    MetricsResourceNotFound(String),

    /// The STOMP notification connection failed or was rejected by the broker.
    #[error("notification error: {0}")]
    NotificationError(String),
}

impl From<reqwest::Error> for HmcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                return Self::ConnectTimeout(std::time::Duration::from_secs(0));
            }
            return Self::ReadTimeout(std::time::Duration::from_secs(0));
        }
        if err.is_connect() {
            return Self::ConnectionError(err);
        }
        Self::ConnectionError(err)
    }
}

impl From<reqwest_middleware::Error> for HmcError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => Self::from(e),
            reqwest_middleware::Error::Middleware(e) => Self::RetryError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for HmcError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            line: err.line() as u64,
            column: err.column() as u64,
            summary: err.to_string(),
        }
    }
}

impl HmcError {
    /// Construct an [`HmcError::HttpError`] from a parsed HMC error body.
    pub fn http_error(
        http_status: u16,
        reason: Option<i64>,
        message: Option<String>,
        request_uri: impl Into<String>,
        request_method: impl Into<String>,
    ) -> Self {
        Self::HttpError {
            http_status,
            reason,
            message,
            request_uri: request_uri.into(),
            request_method: request_method.into(),
        }
    }

    /// True if this is a `403` with `reason == 5` ("session expired").
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Self::HttpError {
                http_status: 403,
                reason: Some(5),
                ..
            }
        )
    }

    /// Canonical one-line form for logging: `classname: <Name>, message: <...>`.
    pub fn summary(&self) -> String {
        match self {
            Self::HttpError {
                http_status,
                reason,
                message,
                ..
            } => format!(
                "HttpError: http_status: {http_status}, reason: {reason:?}, message: {message:?}"
            ),
            other => format!("{}: {other}", variant_name(other)),
        }
    }
}

fn variant_name(err: &HmcError) -> &'static str {
    match err {
        HmcError::ClientAuthError(_) => "ClientAuthError",
        HmcError::ServerAuthError(_) => "ServerAuthError",
        HmcError::ConnectionError(_) => "ConnectionError",
        HmcError::ConnectTimeout(_) => "ConnectTimeout",
        HmcError::ReadTimeout(_) => "ReadTimeout",
        HmcError::RetryError(_) => "RetryError",
        HmcError::SslError(_) => "SslError",
        HmcError::ParseError { .. } => "ParseError",
        HmcError::HttpError { .. } => "HttpError",
        HmcError::NotFound(_) => "NotFound",
        HmcError::NoUniqueMatch(_) => "NoUniqueMatch",
        HmcError::StatusTimeout { .. } => "StatusTimeout",
        HmcError::OperationTimeout { .. } => "OperationTimeout",
        HmcError::CeasedExistence(_) => "CeasedExistence",
        HmcError::ConsistencyError(_) => "ConsistencyError",
        HmcError::MetricsResourceNotFound(_) => "MetricsResourceNotFound",
        HmcError::NotificationError(_) => "NotificationError",
    }
}

pub type Result<T> = std::result::Result<T, HmcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expired_detection() {
        let err = HmcError::http_error(403, Some(5), None, "/api/cpcs", "GET");
        assert!(err.is_session_expired());

        let err = HmcError::http_error(403, Some(1), None, "/api/cpcs", "GET");
        assert!(!err.is_session_expired());
    }

    #[test]
    fn summary_is_one_line() {
        let err = HmcError::http_error(404, Some(1), Some("not found".into()), "/api/cpcs/x", "GET");
        let summary = err.summary();
        assert!(!summary.contains('\n'));
        assert!(summary.starts_with("HttpError:"));
    }
}
