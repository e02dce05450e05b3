use std::sync::Arc;
use std::time::Duration;

use hyper::body::{Bytes, to_bytes};
use hyper::client::HttpConnector;
use hyper::{Body, Client, Request, StatusCode, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use thiserror::Error;
use tokio::time::timeout;
use webpki_roots::TLS_SERVER_ROOTS;

pub(crate) type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Default per-request timeout for service clients.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn build_https_client() -> HyperClient {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let connector = HttpsConnector::from((http, Arc::new(config)));

    Client::builder().build::<_, Body>(connector)
}

/// Failure to complete an HTTP exchange.
#[derive(Debug, Error)]
pub(crate) enum HttpFailure {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Request(#[source] hyper::Error),
    #[error("failed to read response body: {0}")]
    Body(#[source] hyper::Error),
}

/// A fully buffered response.
pub(crate) struct HttpReply {
    pub(crate) status: StatusCode,
    pub(crate) retry_after: Option<Duration>,
    pub(crate) body: Bytes,
}

impl HttpReply {
    pub(crate) fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends `request` and buffers the body, bounded by `limit`.
pub(crate) async fn send(
    client: &HyperClient,
    request: Request<Body>,
    limit: Duration,
) -> Result<HttpReply, HttpFailure> {
    let response = timeout(limit, client.request(request))
        .await
        .map_err(|_| HttpFailure::Timeout(limit))?
        .map_err(HttpFailure::Request)?;

    let status = response.status();
    let retry_after = response
        .headers()
        .get(hyper::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = timeout(limit, to_bytes(response.into_body()))
        .await
        .map_err(|_| HttpFailure::Timeout(limit))?
        .map_err(HttpFailure::Body)?;

    Ok(HttpReply {
        status,
        retry_after,
        body,
    })
}

/// Validates a base URL and normalises it to end with a slash.
pub(crate) fn sanitize_base_url(input: &str) -> Result<String, String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err("base URL must start with http:// or https://".to_owned());
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>()
        .map_err(|err| format!("invalid base URL: {err}"))?;
    Ok(base)
}
