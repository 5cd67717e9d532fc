//! Transport construction: the `reqwest`/`reqwest-middleware` client and
//! cert-trust policy.

use std::time::Duration;

use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Result as MiddlewareResult};
use reqwest_tracing::{ReqwestOtelSpanBackend, TracingMiddleware, default_on_request_end, reqwest_otel_span};
use tracing::Span;

use crate::error::HmcError;

/// How the session validates the HMC's TLS certificate.
#[derive(Debug, Clone)]
pub enum VerifyCert {
    /// Validate against the platform trust store.
    Yes,
    /// Skip validation entirely (self-signed HMC certs, lab use only).
    No,
    /// Validate against a specific CA bundle file.
    CaBundle(std::path::PathBuf),
}

impl Default for VerifyCert {
    fn default() -> Self {
        Self::Yes
    }
}

/// A minimal `reqwest-tracing` span backend for HMC requests.
struct HmcRequestTracing;

impl ReqwestOtelSpanBackend for HmcRequestTracing {
    fn on_request_start(req: &Request, _extensions: &mut Extensions) -> Span {
        reqwest_otel_span!(name = "hmc-api-request", req)
    }

    fn on_request_end(span: &Span, outcome: &MiddlewareResult<Response>, _extensions: &mut Extensions) {
        default_on_request_end(span, outcome);
    }
}

/// Build the per-[`crate::session::Session`] HTTP client.
pub(crate) fn build_client(
    verify_cert: &VerifyCert,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<ClientWithMiddleware, HmcError> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(read_timeout);

    builder = match verify_cert {
        VerifyCert::Yes => builder,
        VerifyCert::No => builder.danger_accept_invalid_certs(true),
        VerifyCert::CaBundle(path) => {
            let pem = std::fs::read(path)
                .map_err(|e| HmcError::SslError(format!("failed to read CA bundle {path:?}: {e}")))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| HmcError::SslError(format!("invalid CA bundle {path:?}: {e}")))?;
            builder.add_root_certificate(cert)
        }
    };

    let client = builder
        .build()
        .map_err(|e| HmcError::SslError(format!("failed to build HTTP client: {e}")))?;

    Ok(ClientBuilder::new(client)
        .with(TracingMiddleware::<HmcRequestTracing>::new())
        .build())
}
