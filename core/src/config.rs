//! Connection settings for a OneFuse instance.
//!
//! # Design
//! `Config` is an immutable value handed to `OneFuseClient` and threaded into
//! every HTTP round-trip. Loading it (files, env, CLI flags) is the host's
//! job; the serde derives let any serde format produce one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// URL scheme used to reach the OneFuse API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address, credentials and TLS mode of a OneFuse instance.
///
/// `port` is kept as a string because it is only ever concatenated into URLs
/// and the `Host` header.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub scheme: Scheme,
    pub address: String,
    pub port: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

fn default_verify_ssl() -> bool {
    true
}

impl Config {
    /// Creates a config with certificate verification enabled.
    pub fn new(
        scheme: Scheme,
        address: impl Into<String>,
        port: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            scheme,
            address: address.into(),
            port: port.into(),
            user: user.into(),
            password: password.into(),
            verify_ssl: true,
        }
    }

    /// Passing `false` accepts any server certificate.
    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    /// `{scheme}://{address}:{port}`
    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.address, self.port)
    }

    /// Value of the `Host` header: `{address}:{port}`.
    pub fn host_header(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("scheme", &self.scheme)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}
