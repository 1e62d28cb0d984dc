//! Stateless request builder and response parser for the OneFuse API.
//!
//! # Design
//! `ApiClient` holds only the immutable `Config` and a `StatusPolicy`. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`. `OneFuseClient`
//! runs the round-trip in between; tests can skip it entirely.
//!
//! Create parsers are strict: a body that does not decode to a populated
//! record is a `DecodeContract` error even under a 2xx status. Read parsers
//! are lenient and fall back to an empty record so the caller can inspect
//! what arrived.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::config::Config;
use crate::error::{OneFuseError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::{self, Filter, ResourceType};
use crate::types::{
    CustomName, CustomNameRequest, EndpointsListResponse, MicrosoftAdPolicy, MicrosoftEndpoint,
    NewMicrosoftAdPolicy, Workspace, WorkspacesListResponse,
};

/// Name of the workspace used when a caller does not pick one.
pub const DEFAULT_WORKSPACE_NAME: &str = "Default";

/// Which response statuses are turned into errors before decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Only statuses >= 500 are errors; 4xx bodies reach the decoders.
    #[default]
    ServerErrorsOnly,
    /// Statuses >= 400 are errors.
    Strict,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Config,
    status_policy: StatusPolicy,
}

impl ApiClient {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            status_policy: StatusPolicy::default(),
        }
    }

    pub fn with_status_policy(mut self, status_policy: StatusPolicy) -> Self {
        self.status_policy = status_policy;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: request::headers(&self.config),
            body,
        }
    }

    // -----------------------------------------------------------------------
    // Workspaces
    // -----------------------------------------------------------------------

    pub fn build_find_default_workspace(&self) -> HttpRequest {
        let filter = Filter::new().with("name.exact", DEFAULT_WORKSPACE_NAME);
        let url = request::filtered_collection_url(&self.config, ResourceType::Workspaces, &filter);
        self.request(HttpMethod::Get, url, None)
    }

    /// First workspace in server order, or `DefaultWorkspaceNotFound`.
    pub fn parse_find_default_workspace(&self, response: HttpResponse) -> Result<Workspace> {
        self.check_for_errors(&response)?;
        let list: WorkspacesListResponse = decode(&response)?;
        list.into_workspaces()
            .into_iter()
            .next()
            .ok_or(OneFuseError::DefaultWorkspaceNotFound)
    }

    // -----------------------------------------------------------------------
    // Custom names
    // -----------------------------------------------------------------------

    /// `workspace_id` must already be resolved; see `OneFuseClient` for the
    /// default-workspace fallback.
    pub fn build_generate_custom_name(
        &self,
        naming_policy_id: &str,
        workspace_id: &str,
        template_properties: Option<Map<String, Value>>,
    ) -> Result<HttpRequest> {
        let payload = CustomNameRequest {
            naming_policy: request::relative_ref(ResourceType::NamingPolicies, naming_policy_id),
            template_properties: template_properties.unwrap_or_default(),
            workspace: request::relative_ref(ResourceType::Workspaces, workspace_id),
        };
        let body = encode(&payload)?;
        let url = request::collection_url(&self.config, ResourceType::CustomNames);
        Ok(self.request(HttpMethod::Post, url, Some(body)))
    }

    pub fn parse_generate_custom_name(&self, response: HttpResponse) -> Result<CustomName> {
        self.check_for_errors(&response)?;
        let name: Option<CustomName> = serde_json::from_str(&response.body).ok();
        match name {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(contract_violation("generating a custom name", response)),
        }
    }

    pub fn build_get_custom_name(&self, id: u64) -> HttpRequest {
        let url = request::item_url(&self.config, ResourceType::CustomNames, id);
        self.request(HttpMethod::Get, url, None)
    }

    pub fn parse_get_custom_name(&self, response: HttpResponse) -> Result<CustomName> {
        self.check_for_errors(&response)?;
        Ok(decode_lenient(&response))
    }

    pub fn build_delete_custom_name(&self, id: u64) -> HttpRequest {
        let url = request::item_url(&self.config, ResourceType::CustomNames, id);
        self.request(HttpMethod::Delete, url, None)
    }

    // -----------------------------------------------------------------------
    // Microsoft endpoints
    // -----------------------------------------------------------------------

    pub fn build_get_microsoft_endpoint_by_name(&self, name: &str) -> HttpRequest {
        let filter = Filter::new().with("name", name).with("type", "microsoft");
        let url = request::filtered_collection_url(&self.config, ResourceType::Endpoints, &filter);
        self.request(HttpMethod::Get, url, None)
    }

    /// First endpoint of the filtered collection, `None` when it is empty.
    pub fn parse_get_microsoft_endpoint_by_name(
        &self,
        response: HttpResponse,
    ) -> Result<Option<MicrosoftEndpoint>> {
        self.check_for_errors(&response)?;
        let list: EndpointsListResponse = decode_lenient(&response);
        Ok(list.into_endpoints().into_iter().next())
    }

    // -----------------------------------------------------------------------
    // Microsoft AD policies
    // -----------------------------------------------------------------------

    pub fn build_create_microsoft_ad_policy(
        &self,
        policy: &NewMicrosoftAdPolicy,
    ) -> Result<HttpRequest> {
        let body = encode(policy)?;
        let url =
            request::collection_url(&self.config, ResourceType::MicrosoftActiveDirectoryPolicies);
        Ok(self.request(HttpMethod::Post, url, Some(body)))
    }

    pub fn parse_create_microsoft_ad_policy(
        &self,
        response: HttpResponse,
    ) -> Result<MicrosoftAdPolicy> {
        self.check_for_errors(&response)?;
        let policy: Option<MicrosoftAdPolicy> = serde_json::from_str(&response.body).ok();
        match policy {
            Some(policy) if !policy.is_empty() => Ok(policy),
            _ => Err(contract_violation("creating a Microsoft AD policy", response)),
        }
    }

    pub fn build_get_microsoft_ad_policy(&self, id: u64) -> HttpRequest {
        let url =
            request::item_url(&self.config, ResourceType::MicrosoftActiveDirectoryPolicies, id);
        self.request(HttpMethod::Get, url, None)
    }

    pub fn parse_get_microsoft_ad_policy(
        &self,
        response: HttpResponse,
    ) -> Result<MicrosoftAdPolicy> {
        self.check_for_errors(&response)?;
        Ok(decode_lenient(&response))
    }

    pub fn build_delete_microsoft_ad_policy(&self, id: u64) -> HttpRequest {
        let url =
            request::item_url(&self.config, ResourceType::MicrosoftActiveDirectoryPolicies, id);
        self.request(HttpMethod::Delete, url, None)
    }

    /// Shared by every delete: success is decided by status alone.
    pub fn parse_delete(&self, response: HttpResponse) -> Result<()> {
        self.check_for_errors(&response)
    }

    /// Map response statuses to errors according to the status policy.
    pub fn check_for_errors(&self, response: &HttpResponse) -> Result<()> {
        // TODO: confirm with the OneFuse API owners whether 4xx should be fatal by default.
        if response.status >= 500 {
            return Err(OneFuseError::Server {
                status: response.status,
                body: response.body.clone(),
            });
        }
        if self.status_policy == StatusPolicy::Strict && response.status >= 400 {
            return Err(OneFuseError::ClientStatus {
                status: response.status,
                body: response.body.clone(),
            });
        }
        Ok(())
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| OneFuseError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_str(&response.body).map_err(|e| OneFuseError::Deserialization(e.to_string()))
}

fn decode_lenient<T: DeserializeOwned + Default>(response: &HttpResponse) -> T {
    match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                status = response.status,
                error = %e,
                "response body did not decode, using empty record"
            );
            trace!(body = %response.body, "undecodable body");
            T::default()
        }
    }
}

fn contract_violation(operation: &'static str, response: HttpResponse) -> OneFuseError {
    OneFuseError::DecodeContract {
        operation,
        status: response.status,
        body: response.body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scheme;
    use crate::types::LetterCase;

    fn client() -> ApiClient {
        ApiClient::new(Config::new(Scheme::Http, "localhost", "8000", "admin", "pw"))
    }

    #[test]
    fn build_find_default_workspace_filters_by_exact_name() {
        let req = client().build_find_default_workspace();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "http://localhost:8000/api/v3/onefuse/workspaces/?filter=name.exact:Default"
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn parse_find_default_workspace_takes_first_entry() {
        let body = r#"{"_embedded":{"workspaces":[
            {"name":"Default","id":"5"},
            {"name":"Default","id":"1"}
        ]}}"#;
        for _ in 0..3 {
            let ws = client()
                .parse_find_default_workspace(HttpResponse::new(200, body))
                .unwrap();
            assert_eq!(ws.id, "5");
        }
    }

    #[test]
    fn parse_find_default_workspace_empty_is_fatal() {
        let body = r#"{"_embedded":{"workspaces":[]}}"#;
        let err = client()
            .parse_find_default_workspace(HttpResponse::new(200, body))
            .unwrap_err();
        assert!(matches!(err, OneFuseError::DefaultWorkspaceNotFound));
    }

    #[test]
    fn build_generate_custom_name_uses_relative_refs() {
        let mut props = Map::new();
        props.insert("env".to_string(), Value::from("prod"));
        let req = client()
            .build_generate_custom_name("3", "2", Some(props))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/v3/onefuse/customNames/");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["namingPolicy"], "/api/v3/onefuse/namingPolicies/3/");
        assert_eq!(body["workspace"], "/api/v3/onefuse/workspaces/2/");
        assert_eq!(body["templateProperties"]["env"], "prod");
    }

    #[test]
    fn build_generate_custom_name_defaults_template_properties() {
        let req = client().build_generate_custom_name("3", "2", None).unwrap();
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["templateProperties"], serde_json::json!({}));
    }

    #[test]
    fn parse_generate_custom_name_success() {
        let body = r#"{"id":11,"version":1,"name":"web011","dnsSuffix":"example.com"}"#;
        let name = client()
            .parse_generate_custom_name(HttpResponse::new(201, body))
            .unwrap();
        assert_eq!(name.id, 11);
        assert_eq!(name.name, "web011");
    }

    #[test]
    fn parse_generate_custom_name_empty_record_violates_contract() {
        let err = client()
            .parse_generate_custom_name(HttpResponse::new(200, "{}"))
            .unwrap_err();
        match err {
            OneFuseError::DecodeContract { status, body, .. } => {
                assert_eq!(status, 200);
                assert_eq!(body, "{}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_generate_custom_name_4xx_surfaces_as_contract_violation() {
        let body = r#"{"detail":"naming policy not found"}"#;
        let err = client()
            .parse_generate_custom_name(HttpResponse::new(400, body))
            .unwrap_err();
        assert!(matches!(err, OneFuseError::DecodeContract { status: 400, .. }));
    }

    #[test]
    fn server_errors_carry_body_for_every_parser() {
        let c = client();
        let resp = || HttpResponse::new(502, "upstream exploded");
        let check = |err: OneFuseError| match err {
            OneFuseError::Server { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        };
        check(c.parse_find_default_workspace(resp()).unwrap_err());
        check(c.parse_generate_custom_name(resp()).unwrap_err());
        check(c.parse_get_custom_name(resp()).unwrap_err());
        check(c.parse_get_microsoft_endpoint_by_name(resp()).unwrap_err());
        check(c.parse_create_microsoft_ad_policy(resp()).unwrap_err());
        check(c.parse_get_microsoft_ad_policy(resp()).unwrap_err());
        check(c.parse_delete(resp()).unwrap_err());
    }

    #[test]
    fn not_found_reads_pass_through_as_empty_records() {
        let resp = HttpResponse::new(404, r#"{"detail":"Not found."}"#);
        let name = client().parse_get_custom_name(resp).unwrap();
        assert!(name.is_empty());
    }

    #[test]
    fn strict_policy_rejects_client_errors() {
        let strict = client().with_status_policy(StatusPolicy::Strict);
        let err = strict
            .parse_get_custom_name(HttpResponse::new(404, "missing"))
            .unwrap_err();
        assert!(matches!(err, OneFuseError::ClientStatus { status: 404, .. }));
        assert!(strict.parse_delete(HttpResponse::new(204, "")).is_ok());
    }

    #[test]
    fn lenient_read_tolerates_non_json_body() {
        let policy = client()
            .parse_get_microsoft_ad_policy(HttpResponse::new(200, "<html>"))
            .unwrap();
        assert!(policy.is_empty());
    }

    #[test]
    fn build_get_microsoft_endpoint_by_name_appends_filter() {
        let req = client().build_get_microsoft_endpoint_by_name("ad01");
        assert_eq!(
            req.url,
            "http://localhost:8000/api/v3/onefuse/endpoints/?filter=name:ad01;type:microsoft"
        );
    }

    #[test]
    fn parse_get_microsoft_endpoint_by_name_empty_is_none() {
        let body = r#"{"_embedded":{"endpoints":[]}}"#;
        let found = client()
            .parse_get_microsoft_endpoint_by_name(HttpResponse::new(200, body))
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn create_ad_policy_end_to_end_decoding() {
        let input = NewMicrosoftAdPolicy {
            name: "pol1".to_string(),
            organizational_unit: "OU=Test,DC=example,DC=com".to_string(),
            ..Default::default()
        };
        let req = client().build_create_microsoft_ad_policy(&input).unwrap();
        assert_eq!(
            req.url,
            "http://localhost:8000/api/v3/onefuse/microsoftActiveDirectoryPolicies/"
        );
        let body = r#"{"id":42,"name":"pol1","ou":"OU=Test,DC=example,DC=com",
            "description":"","computerNameLetterCase":"lower"}"#;
        let policy = client()
            .parse_create_microsoft_ad_policy(HttpResponse::new(201, body))
            .unwrap();
        assert_eq!(policy.id, 42);
        assert_eq!(policy.name, "pol1");
        assert_eq!(policy.organizational_unit, "OU=Test,DC=example,DC=com");
        assert_eq!(policy.computer_name_letter_case, LetterCase::Lower);
    }

    #[test]
    fn unknown_letter_case_keeps_created_policy() {
        let body = r#"{"id":42,"name":"pol1","ou":"OU=Test","computerNameLetterCase":"Title"}"#;
        let created = client()
            .parse_create_microsoft_ad_policy(HttpResponse::new(201, body))
            .unwrap();
        let fetched = client()
            .parse_get_microsoft_ad_policy(HttpResponse::new(200, body))
            .unwrap();
        for policy in [created, fetched] {
            assert_eq!(policy.id, 42);
            assert_eq!(policy.name, "pol1");
            assert_eq!(policy.organizational_unit, "OU=Test");
            assert_eq!(
                policy.computer_name_letter_case,
                LetterCase::Other("Title".to_string())
            );
        }
    }

    #[test]
    fn mistyped_field_does_not_wipe_its_siblings() {
        let policy_body = r#"{"id":"42","name":"pol1","ou":"OU=Test"}"#;
        let policy = client()
            .parse_get_microsoft_ad_policy(HttpResponse::new(200, policy_body))
            .unwrap();
        assert_eq!(policy.id, 0);
        assert_eq!(policy.name, "pol1");
        assert_eq!(policy.organizational_unit, "OU=Test");

        let endpoint_body = r#"{"_embedded":{"endpoints":[
            {"id":4,"name":"ad01","host":"dc.example.com","port":70000,"ssl":true}
        ]}}"#;
        let endpoint = client()
            .parse_get_microsoft_endpoint_by_name(HttpResponse::new(200, endpoint_body))
            .unwrap()
            .unwrap();
        assert_eq!(endpoint.id, 4);
        assert_eq!(endpoint.host, "dc.example.com");
        assert_eq!(endpoint.port, 0);
        assert!(endpoint.use_tls);
    }

    #[test]
    fn created_name_with_mistyped_suffix_is_still_accepted() {
        let body = r#"{"id":7,"version":1,"name":"web01","dnsSuffix":12}"#;
        let name = client()
            .parse_generate_custom_name(HttpResponse::new(201, body))
            .unwrap();
        assert_eq!(name.id, 7);
        assert_eq!(name.name, "web01");
        assert_eq!(name.dns_suffix, "");
    }

    #[test]
    fn delete_requests_have_no_body() {
        let c = client();
        for req in [c.build_delete_custom_name(4), c.build_delete_microsoft_ad_policy(4)] {
            assert_eq!(req.method, HttpMethod::Delete);
            assert!(req.body.is_none());
            assert!(req.url.ends_with("/4/"));
        }
    }
}
