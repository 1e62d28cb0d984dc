//! In-memory emulation of the slice of the OneFuse REST API used by
//! `onefuse-core`: workspaces, custom names, Microsoft endpoints and
//! Microsoft AD policies under `/api/v3/onefuse/`.
//!
//! Every request is recorded as `"METHOD /path?query"` so tests can assert
//! which calls were (or were not) made. Requests without Basic credentials
//! get 401. A forced failure can be armed to answer every call with a fixed
//! status and body.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

const API_ROOT: &str = "/api/v3/onefuse";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Workspace {
    pub name: String,
    pub id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomName {
    pub id: u64,
    pub version: u64,
    pub name: String,
    pub dns_suffix: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomName {
    pub naming_policy: String,
    #[serde(default)]
    pub template_properties: Map<String, Value>,
    pub workspace: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub host: String,
    pub port: u16,
    pub ssl: bool,
    pub microsoft_version: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub workspace: Workspace,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdPolicy {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub microsoft_endpoint: String,
    #[serde(default = "default_letter_case")]
    pub computer_name_letter_case: String,
    pub ou: String,
    #[serde(default)]
    pub workspace: Option<String>,
}

fn default_letter_case() -> String {
    "asIs".to_string()
}

#[derive(Default)]
struct Store {
    workspaces: Vec<Workspace>,
    endpoints: Vec<Endpoint>,
    custom_names: HashMap<u64, CustomName>,
    policies: HashMap<u64, AdPolicy>,
    next_id: u64,
}

impl Store {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared server state. Clones observe the same store and request log.
#[derive(Clone, Default)]
pub struct MockState {
    store: Arc<RwLock<Store>>,
    requests: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<(u16, String)>>>,
}

impl MockState {
    /// A `Default` workspace (id "1") and one Microsoft endpoint `ad01`.
    pub fn seeded() -> Self {
        Self::from_store(seeded_store())
    }

    /// The seeded store plus `extra` workspaces, listed after `Default`.
    pub fn seeded_with_workspaces(extra: &[(&str, &str)]) -> Self {
        let mut store = seeded_store();
        store
            .workspaces
            .extend(extra.iter().map(|(name, id)| Workspace {
                name: name.to_string(),
                id: id.to_string(),
            }));
        Self::from_store(store)
    }

    /// No workspaces and no endpoints.
    pub fn empty() -> Self {
        Self::default()
    }

    fn from_store(store: Store) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            ..Default::default()
        }
    }

    /// Answer every subsequent request with `status` and `body`.
    pub fn fail_with(&self, status: u16, body: &str) {
        *lock(&self.failure) = Some((status, body.to_string()));
    }

    pub fn clear_failure(&self) {
        *lock(&self.failure) = None;
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }
}

fn seeded_store() -> Store {
    let default = Workspace {
        name: "Default".to_string(),
        id: "1".to_string(),
    };
    Store {
        endpoints: vec![Endpoint {
            id: 1,
            name: "ad01".to_string(),
            description: "primary domain controller".to_string(),
            host: "dc01.example.com".to_string(),
            port: 636,
            ssl: true,
            microsoft_version: 2016,
            kind: "microsoft".to_string(),
            workspace: default.clone(),
        }],
        workspaces: vec![default],
        ..Default::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn app() -> Router {
    app_with_state(MockState::seeded())
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route(&format!("{API_ROOT}/workspaces/"), get(list_workspaces))
        .route(&format!("{API_ROOT}/endpoints/"), get(list_endpoints))
        .route(
            &format!("{API_ROOT}/customNames/"),
            post(create_custom_name),
        )
        .route(
            &format!("{API_ROOT}/customNames/{{id}}/"),
            get(get_custom_name).delete(delete_custom_name),
        )
        .route(
            &format!("{API_ROOT}/microsoftActiveDirectoryPolicies/"),
            post(create_policy),
        )
        .route(
            &format!("{API_ROOT}/microsoftActiveDirectoryPolicies/{{id}}/"),
            get(get_policy).delete(delete_policy),
        )
        .layer(middleware::from_fn(require_basic_auth))
        .layer(middleware::from_fn_with_state(state.clone(), record_and_fail))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, MockState::seeded()).await
}

pub async fn run_with_state(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "mock OneFuse API listening");
    axum::serve(listener, app_with_state(state)).await
}

async fn record_and_fail(State(state): State<MockState>, req: Request, next: Next) -> Response {
    let line = format!("{} {}", req.method(), req.uri());
    debug!(request = %line, "recorded");
    lock(&state.requests).push(line);

    let failure = lock(&state.failure).clone();
    if let Some((status, body)) = failure {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, body).into_response();
    }
    next.run(req).await
}

async fn require_basic_auth(req: Request, next: Next) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !authorized {
        let body = json!({"detail": "Authentication credentials were not provided."});
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    }
    next.run(req).await
}

/// Parse `name.exact:Default;type:microsoft` into key/value pairs.
fn parse_filter(query: &HashMap<String, String>) -> Vec<(String, String)> {
    query
        .get("filter")
        .map(|raw| {
            raw.split(';')
                .filter_map(|term| term.split_once(':'))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."})))
}

fn bad_request(detail: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"detail": detail})))
}

/// Last non-empty path segment of an href like `/api/v3/onefuse/workspaces/2/`.
fn ref_id(href: &str) -> &str {
    href.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

async fn list_workspaces(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let store = state.store.read().await;
    let filter = parse_filter(&query);
    let matches: Vec<&Workspace> = store
        .workspaces
        .iter()
        .filter(|w| {
            filter.iter().all(|(k, v)| match k.as_str() {
                "name.exact" => w.name == *v,
                "name" => w.name.contains(v.as_str()),
                _ => true,
            })
        })
        .collect();
    Json(json!({"count": matches.len(), "_embedded": {"workspaces": matches}}))
}

async fn list_endpoints(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let store = state.store.read().await;
    let filter = parse_filter(&query);
    let matches: Vec<Value> = store
        .endpoints
        .iter()
        .filter(|e| {
            filter.iter().all(|(k, v)| match k.as_str() {
                "name" => e.name == *v,
                "type" => e.kind == *v,
                _ => true,
            })
        })
        .map(endpoint_json)
        .collect();
    Json(json!({"count": matches.len(), "_embedded": {"endpoints": matches}}))
}

fn endpoint_json(endpoint: &Endpoint) -> Value {
    json!({
        "_links": {"workspace": endpoint.workspace},
        "id": endpoint.id,
        "name": endpoint.name,
        "description": endpoint.description,
        "host": endpoint.host,
        "port": endpoint.port,
        "ssl": endpoint.ssl,
        "microsoftVersion": endpoint.microsoft_version,
        "type": endpoint.kind,
    })
}

async fn create_custom_name(
    State(state): State<MockState>,
    Json(input): Json<CreateCustomName>,
) -> Result<(StatusCode, Json<CustomName>), (StatusCode, Json<Value>)> {
    let mut store = state.store.write().await;
    let workspace_id = ref_id(&input.workspace);
    if !store.workspaces.iter().any(|w| w.id == workspace_id) {
        return Err(bad_request("workspace does not exist"));
    }
    if ref_id(&input.naming_policy).is_empty() {
        return Err(bad_request("namingPolicy is required"));
    }
    let id = store.next_id();
    let prefix = input
        .template_properties
        .get("prefix")
        .and_then(Value::as_str)
        .unwrap_or("host");
    let name = CustomName {
        id,
        version: 1,
        name: format!("{prefix}{id:03}"),
        dns_suffix: input
            .template_properties
            .get("dnsSuffix")
            .and_then(Value::as_str)
            .unwrap_or("example.com")
            .to_string(),
    };
    store.custom_names.insert(id, name.clone());
    Ok((StatusCode::CREATED, Json(name)))
}

async fn get_custom_name(
    State(state): State<MockState>,
    Path(id): Path<u64>,
) -> Result<Json<CustomName>, (StatusCode, Json<Value>)> {
    let store = state.store.read().await;
    store.custom_names.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn delete_custom_name(
    State(state): State<MockState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let mut store = state.store.write().await;
    store
        .custom_names
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(not_found)
}

async fn create_policy(
    State(state): State<MockState>,
    Json(mut input): Json<AdPolicy>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    if input.name.is_empty() {
        return Err(bad_request("name is required"));
    }
    let mut store = state.store.write().await;
    input.id = store.next_id();
    store.policies.insert(input.id, input.clone());
    Ok((StatusCode::CREATED, Json(policy_json(&input, &store))))
}

async fn get_policy(
    State(state): State<MockState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let store = state.store.read().await;
    let policy = store.policies.get(&id).ok_or_else(not_found)?;
    Ok(Json(policy_json(policy, &store)))
}

async fn delete_policy(
    State(state): State<MockState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let mut store = state.store.write().await;
    store
        .policies
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(not_found)
}

fn policy_json(policy: &AdPolicy, store: &Store) -> Value {
    let workspace = policy
        .workspace
        .as_deref()
        .and_then(|href| store.workspaces.iter().find(|w| w.id == ref_id(href)))
        .or_else(|| store.workspaces.first());
    let endpoint = store
        .endpoints
        .iter()
        .find(|e| e.id.to_string() == ref_id(&policy.microsoft_endpoint));
    json!({
        "_links": {
            "workspace": workspace,
            "microsoftEndpoint": {
                "title": endpoint.map(|e| e.name.as_str()).unwrap_or_default(),
                "href": policy.microsoft_endpoint,
            },
        },
        "id": policy.id,
        "name": policy.name,
        "description": policy.description,
        "microsoftEndpoint": policy.microsoft_endpoint,
        "computerNameLetterCase": policy.computer_name_letter_case,
        "ou": policy.ou,
    })
}
