//! Public operations: one method per (resource, verb) pair.
//!
//! # Design
//! `OneFuseClient` pairs an `ApiClient` with a `Transport` and runs
//! build -> send -> parse for each call. It keeps no state between calls, so
//! a single instance can be shared across threads. Nothing is retried here.
//!
//! Operations the remote API surface declares but this client does not
//! implement return `NotImplemented` before any request is built; see
//! [`ResourceKind::supports`].

use serde_json::{Map, Value};
use tracing::{debug, info, info_span, trace};

use crate::capability::{ResourceKind, Verb};
use crate::client::{ApiClient, StatusPolicy};
use crate::config::Config;
use crate::error::{OneFuseError, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    CustomName, MicrosoftAdPolicy, MicrosoftEndpoint, NewMicrosoftAdPolicy, Workspace,
};

pub struct OneFuseClient<T = UreqTransport> {
    api: ApiClient,
    transport: T,
}

impl OneFuseClient<UreqTransport> {
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> OneFuseClient<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self {
            api: ApiClient::new(config),
            transport,
        }
    }

    pub fn with_status_policy(mut self, status_policy: StatusPolicy) -> Self {
        self.api = self.api.with_status_policy(status_policy);
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.transport.send(self.api.config(), &request)?;
        debug!(status = response.status, "response status");
        trace!(body = %response.body, "response body");
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Workspaces
    // -----------------------------------------------------------------------

    /// Look up the workspace named `Default`. Zero matches is fatal; with
    /// several, the first in server order wins.
    pub fn find_default_workspace(&self) -> Result<Workspace> {
        let _span = info_span!("find_default_workspace").entered();
        let response = self.execute(self.api.build_find_default_workspace())?;
        let workspace = self.api.parse_find_default_workspace(response)?;
        debug!(workspace_id = %workspace.id, "resolved default workspace");
        Ok(workspace)
    }

    // -----------------------------------------------------------------------
    // Custom names
    // -----------------------------------------------------------------------

    /// Reserve a custom name. An empty `workspace_id` falls back to the
    /// `Default` workspace; if none exists nothing is sent to the naming
    /// collection.
    pub fn generate_custom_name(
        &self,
        dns_suffix: &str,
        naming_policy_id: &str,
        workspace_id: &str,
        template_properties: Option<Map<String, Value>>,
    ) -> Result<CustomName> {
        let _span = info_span!("generate_custom_name", dns_suffix, naming_policy_id).entered();

        let workspace_id = if workspace_id.is_empty() {
            self.find_default_workspace()?.id
        } else {
            workspace_id.to_string()
        };

        let request =
            self.api
                .build_generate_custom_name(naming_policy_id, &workspace_id, template_properties)?;
        let response = self.execute(request)?;
        let name = self.api.parse_generate_custom_name(response)?;
        info!(
            custom_name_id = name.id,
            name = %name.name,
            dns_suffix = %name.dns_suffix,
            "custom name reserved"
        );
        Ok(name)
    }

    pub fn get_custom_name(&self, id: u64) -> Result<CustomName> {
        let _span = info_span!("get_custom_name", id).entered();
        let response = self.execute(self.api.build_get_custom_name(id))?;
        self.api.parse_get_custom_name(response)
    }

    pub fn delete_custom_name(&self, id: u64) -> Result<()> {
        let _span = info_span!("delete_custom_name", id).entered();
        let response = self.execute(self.api.build_delete_custom_name(id))?;
        self.api.parse_delete(response)
    }

    // -----------------------------------------------------------------------
    // Microsoft endpoints
    // -----------------------------------------------------------------------

    pub fn create_microsoft_endpoint(
        &self,
        _endpoint: &MicrosoftEndpoint,
    ) -> Result<MicrosoftEndpoint> {
        Err(unsupported(ResourceKind::MicrosoftEndpoint, Verb::Create))
    }

    pub fn get_microsoft_endpoint(&self, _id: u64) -> Result<MicrosoftEndpoint> {
        Err(unsupported(ResourceKind::MicrosoftEndpoint, Verb::Read))
    }

    /// Server-side filtered lookup; the client does no filtering of its own.
    pub fn get_microsoft_endpoint_by_name(&self, name: &str) -> Result<Option<MicrosoftEndpoint>> {
        let _span = info_span!("get_microsoft_endpoint_by_name", name).entered();
        let response = self.execute(self.api.build_get_microsoft_endpoint_by_name(name))?;
        self.api.parse_get_microsoft_endpoint_by_name(response)
    }

    pub fn update_microsoft_endpoint(
        &self,
        _id: u64,
        _endpoint: &MicrosoftEndpoint,
    ) -> Result<MicrosoftEndpoint> {
        Err(unsupported(ResourceKind::MicrosoftEndpoint, Verb::Update))
    }

    pub fn delete_microsoft_endpoint(&self, _id: u64) -> Result<()> {
        Err(unsupported(ResourceKind::MicrosoftEndpoint, Verb::Delete))
    }

    // -----------------------------------------------------------------------
    // Microsoft AD policies
    // -----------------------------------------------------------------------

    pub fn create_microsoft_ad_policy(
        &self,
        policy: &NewMicrosoftAdPolicy,
    ) -> Result<MicrosoftAdPolicy> {
        let _span = info_span!("create_microsoft_ad_policy", name = %policy.name).entered();
        let response = self.execute(self.api.build_create_microsoft_ad_policy(policy)?)?;
        let created = self.api.parse_create_microsoft_ad_policy(response)?;
        info!(policy_id = created.id, "Microsoft AD policy created");
        Ok(created)
    }

    pub fn get_microsoft_ad_policy(&self, id: u64) -> Result<MicrosoftAdPolicy> {
        let _span = info_span!("get_microsoft_ad_policy", id).entered();
        let response = self.execute(self.api.build_get_microsoft_ad_policy(id))?;
        self.api.parse_get_microsoft_ad_policy(response)
    }

    pub fn update_microsoft_ad_policy(
        &self,
        _id: u64,
        _policy: &NewMicrosoftAdPolicy,
    ) -> Result<MicrosoftAdPolicy> {
        Err(unsupported(ResourceKind::MicrosoftAdPolicy, Verb::Update))
    }

    pub fn delete_microsoft_ad_policy(&self, id: u64) -> Result<()> {
        let _span = info_span!("delete_microsoft_ad_policy", id).entered();
        let response = self.execute(self.api.build_delete_microsoft_ad_policy(id))?;
        self.api.parse_delete(response)
    }
}

fn unsupported(resource: ResourceKind, verb: Verb) -> OneFuseError {
    debug_assert!(!resource.supports(verb));
    OneFuseError::not_implemented(resource, verb)
}
