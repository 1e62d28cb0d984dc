//! URL and header construction for the `/api/v3/onefuse/` namespace.
//!
//! URLs are plain concatenations; no normalization or escaping is applied.
//! Callers pass identifiers exactly as the server issued them.

use std::fmt;

use base64::prelude::*;

use crate::config::Config;

pub const API_VERSION: &str = "/api/v3/";
pub const API_NAMESPACE: &str = "onefuse";

/// Client-identifying header sent with every request.
pub const SOURCE_HEADER: (&str, &str) = ("SOURCE", "Terraform");

/// A remote collection addressable by a fixed path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    CustomNames,
    Workspaces,
    MicrosoftActiveDirectoryPolicies,
    Endpoints,
    NamingPolicies,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::CustomNames => "customNames",
            ResourceType::Workspaces => "workspaces",
            ResourceType::MicrosoftActiveDirectoryPolicies => "microsoftActiveDirectoryPolicies",
            ResourceType::Endpoints => "endpoints",
            ResourceType::NamingPolicies => "namingPolicies",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{scheme}://{address}:{port}/api/v3/onefuse/{resourceType}/`
pub fn collection_url(config: &Config, resource_type: ResourceType) -> String {
    format!(
        "{}{API_VERSION}{API_NAMESPACE}/{resource_type}/",
        config.origin()
    )
}

/// `{scheme}://{address}:{port}/api/v3/onefuse/{resourceType}/{id}/`
pub fn item_url(config: &Config, resource_type: ResourceType, id: impl fmt::Display) -> String {
    format!("{}{id}/", collection_url(config, resource_type))
}

/// Server-relative reference used inside request bodies:
/// `/api/v3/onefuse/{resourceType}/{id}/`
pub fn relative_ref(resource_type: ResourceType, id: impl fmt::Display) -> String {
    format!("{API_VERSION}{API_NAMESPACE}/{resource_type}/{id}/")
}

/// Server-side collection filter, rendered as `filter=k:v;k:v`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    terms: Vec<(String, String)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn to_query(&self) -> String {
        let joined = self
            .terms
            .iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .collect::<Vec<_>>()
            .join(";");
        format!("filter={joined}")
    }
}

/// Collection URL with `?filter=...` appended when `filter` has terms.
pub fn filtered_collection_url(
    config: &Config,
    resource_type: ResourceType,
    filter: &Filter,
) -> String {
    let url = collection_url(config, resource_type);
    if filter.is_empty() {
        url
    } else {
        format!("{url}?{}", filter.to_query())
    }
}

/// Full header set for a request: content negotiation, `Host`, the source
/// marker and Basic credentials. Every header is always present.
pub fn headers(config: &Config) -> Vec<(String, String)> {
    let credentials = BASE64_STANDARD.encode(format!("{}:{}", config.user, config.password));
    [
        ("Content-Type", "application/json".to_string()),
        ("Accept", "*/*".to_string()),
        ("Cache-Control", "no-cache".to_string()),
        ("Accept-Encoding", "gzip, deflate".to_string()),
        ("Connection", "keep-alive".to_string()),
        ("Host", config.host_header()),
        (SOURCE_HEADER.0, SOURCE_HEADER.1.to_string()),
        ("Authorization", format!("Basic {credentials}")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}
