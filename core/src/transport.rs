//! Blocking HTTP transport.
//!
//! `Transport` is the single I/O seam: it turns an `HttpRequest` into an
//! `HttpResponse`. Non-2xx statuses are returned as data; only failures that
//! produce no status at all become `OneFuseError::Transport`.

use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::error::{OneFuseError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP exchange. Implementations must be safe to share
/// between threads issuing concurrent calls.
pub trait Transport: Send + Sync {
    fn send(&self, config: &Config, request: &HttpRequest) -> Result<HttpResponse>;
}

/// `ureq`-backed transport. An agent is configured per call so the TLS
/// verification flag always reflects the `Config` passed in.
#[derive(Debug, Clone, Default)]
pub struct UreqTransport {
    timeout: Option<Duration>,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the whole exchange, connect through body read.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn agent(&self, config: &Config) -> ureq::Agent {
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(!config.verify_ssl)
            .build();
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .tls_config(tls)
            .timeout_global(self.timeout)
            .build()
            .new_agent()
    }
}

impl Transport for UreqTransport {
    fn send(&self, config: &Config, request: &HttpRequest) -> Result<HttpResponse> {
        let agent = self.agent(config);
        let url = request.url.as_str();
        let headers = request.headers.as_slice();

        debug!(method = request.method.as_str(), url, "sending request");
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(agent.get(url), headers).call(),
            (HttpMethod::Delete, _) => with_headers(agent.delete(url), headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(agent.post(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(agent.post(url), headers).send_empty(),
        };
        let mut response = result.map_err(|e| transport_error(url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        // Bodies that are not valid UTF-8 still carry a status; keep them as data.
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| transport_error(url, e))?;
        let body = String::from_utf8_lossy(&bytes).into_owned();
        debug!(status, url, "received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn transport_error(url: &str, source: ureq::Error) -> OneFuseError {
    OneFuseError::Transport {
        url: url.to_string(),
        source: Box::new(source),
    }
}
