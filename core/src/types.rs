//! Resource records and request payloads exchanged with the OneFuse API.
//!
//! # Design
//! Records are flat values. HAL `_links` metadata lives in separate
//! `*Links` structs joined to the record by href/id strings, never by
//! embedded resource objects. Every record field defaults when absent so a
//! read of a partial (or error) body still yields a value the caller can
//! inspect; create paths reject such empty values in `ApiClient`.
//!
//! Record fields decode one at a time: a field of the wrong type falls back
//! to its default without discarding its siblings.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// A scoping container for policies and names. Read-only from this client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Workspace {
    #[serde(deserialize_with = "lenient")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

/// Envelope returned by a (filtered) workspace collection query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkspacesListResponse {
    #[serde(rename = "_embedded")]
    embedded: EmbeddedWorkspaces,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EmbeddedWorkspaces {
    workspaces: Vec<Workspace>,
}

impl WorkspacesListResponse {
    /// Entries in the order the server returned them.
    pub fn workspaces(&self) -> &[Workspace] {
        &self.embedded.workspaces
    }

    pub fn into_workspaces(self) -> Vec<Workspace> {
        self.embedded.workspaces
    }
}

/// A reserved name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomName {
    #[serde(deserialize_with = "lenient")]
    pub id: u64,
    #[serde(deserialize_with = "lenient")]
    pub version: u64,
    #[serde(deserialize_with = "lenient")]
    pub name: String,
    #[serde(deserialize_with = "lenient")]
    pub dns_suffix: String,
}

impl CustomName {
    /// True when nothing identifying was decoded (zero id and empty name).
    pub fn is_empty(&self) -> bool {
        self.id == 0 && self.name.is_empty()
    }
}

/// Body of a custom name reservation. References are server-relative hrefs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomNameRequest {
    pub naming_policy: String,
    pub template_properties: Map<String, Value>,
    pub workspace: String,
}

/// Name and href of a linked resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LinkMeta {
    #[serde(alias = "title", deserialize_with = "lenient")]
    pub name: String,
    #[serde(alias = "href", deserialize_with = "lenient")]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EndpointLinks {
    #[serde(deserialize_with = "lenient")]
    pub workspace: Workspace,
}

/// A directory-service connection target.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct MicrosoftEndpoint {
    #[serde(rename = "_links", deserialize_with = "lenient")]
    pub links: EndpointLinks,
    #[serde(deserialize_with = "lenient")]
    pub id: u64,
    #[serde(deserialize_with = "lenient")]
    pub name: String,
    #[serde(deserialize_with = "lenient")]
    pub description: String,
    #[serde(deserialize_with = "lenient")]
    pub host: String,
    #[serde(deserialize_with = "lenient")]
    pub port: u16,
    #[serde(rename = "ssl", deserialize_with = "lenient")]
    pub use_tls: bool,
    #[serde(rename = "microsoftVersion", deserialize_with = "lenient")]
    pub directory_version: i64,
}

impl MicrosoftEndpoint {
    pub fn workspace_ref(&self) -> &Workspace {
        &self.links.workspace
    }
}

/// Envelope returned by a filtered endpoint collection query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EndpointsListResponse {
    #[serde(rename = "_embedded")]
    embedded: EmbeddedEndpoints,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EmbeddedEndpoints {
    endpoints: Vec<MicrosoftEndpoint>,
}

impl EndpointsListResponse {
    pub fn endpoints(&self) -> &[MicrosoftEndpoint] {
        &self.embedded.endpoints
    }

    pub fn into_endpoints(self) -> Vec<MicrosoftEndpoint> {
        self.embedded.endpoints
    }
}

/// How the computer name is cased when the AD object is created.
///
/// Values the client does not know are kept verbatim in `Other` and sent
/// back unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum LetterCase {
    #[default]
    AsIs,
    Upper,
    Lower,
    Other(String),
}

impl LetterCase {
    pub fn as_str(&self) -> &str {
        match self {
            LetterCase::AsIs => "asIs",
            LetterCase::Upper => "upper",
            LetterCase::Lower => "lower",
            LetterCase::Other(raw) => raw,
        }
    }
}

impl From<String> for LetterCase {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "asIs" | "AsIs" => LetterCase::AsIs,
            "upper" | "Uppercase" => LetterCase::Upper,
            "lower" | "Lowercase" => LetterCase::Lower,
            _ => LetterCase::Other(raw),
        }
    }
}

impl From<LetterCase> for String {
    fn from(case: LetterCase) -> Self {
        match case {
            LetterCase::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AdPolicyLinks {
    #[serde(deserialize_with = "lenient")]
    pub workspace: Workspace,
    #[serde(deserialize_with = "lenient")]
    pub microsoft_endpoint: LinkMeta,
}

/// Naming and placement rules for AD computer objects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct MicrosoftAdPolicy {
    #[serde(rename = "_links", deserialize_with = "lenient")]
    pub links: AdPolicyLinks,
    #[serde(deserialize_with = "lenient")]
    pub id: u64,
    #[serde(deserialize_with = "lenient")]
    pub name: String,
    #[serde(deserialize_with = "lenient")]
    pub description: String,
    /// Href of the endpoint the policy binds to.
    #[serde(deserialize_with = "lenient")]
    pub microsoft_endpoint: String,
    #[serde(deserialize_with = "lenient")]
    pub computer_name_letter_case: LetterCase,
    #[serde(rename = "ou", deserialize_with = "lenient")]
    pub organizational_unit: String,
}

impl MicrosoftAdPolicy {
    pub fn is_empty(&self) -> bool {
        self.id == 0 && self.name.is_empty()
    }

    pub fn workspace_ref(&self) -> &Workspace {
        &self.links.workspace
    }
}

/// Request payload for creating a Microsoft AD policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewMicrosoftAdPolicy {
    pub name: String,
    pub description: String,
    pub microsoft_endpoint: String,
    pub computer_name_letter_case: LetterCase,
    #[serde(rename = "ou")]
    pub organizational_unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
}

/// Decode one field, falling back to its default when the wire value has
/// the wrong type or range.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_else(|e| {
        warn!(error = %e, "field did not decode, using default");
        T::default()
    }))
}

/// The server reports ids as numbers; older payloads use strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => {
            if !other.is_null() {
                warn!(value = %other, "id is neither string nor number, using empty id");
            }
            Ok(String::new())
        }
    }
}
