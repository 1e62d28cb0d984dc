//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port in a background thread
//! and drives `OneFuseClient` over real HTTP through `UreqTransport`. The
//! mock records every request, which lets tests assert calls that must not
//! happen.

use std::time::Duration;

use mock_server::MockState;
use onefuse_core::{
    Config, LetterCase, NewMicrosoftAdPolicy, OneFuseClient, OneFuseError, RetryPolicy, Scheme,
    StatusPolicy, UreqTransport,
};
use serde_json::{Map, Value};

/// Start the mock server with `state` and return a client pointed at it.
fn start(state: MockState) -> OneFuseClient {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_state(listener, state).await
        })
        .unwrap();
    });

    let config = Config::new(
        Scheme::Http,
        addr.ip().to_string(),
        addr.port().to_string(),
        "admin",
        "admin",
    );
    let transport = UreqTransport::new().with_timeout(Duration::from_secs(10));
    OneFuseClient::with_transport(config, transport)
}

#[test]
fn custom_name_lifecycle_with_default_workspace() {
    let state = MockState::seeded();
    let client = start(state.clone());

    let mut props = Map::new();
    props.insert("prefix".to_string(), Value::from("app"));
    props.insert("dnsSuffix".to_string(), Value::from("corp.local"));

    // Step 1: reserve without a workspace - resolves `Default` first.
    let created = client
        .generate_custom_name("corp.local", "1", "", Some(props))
        .unwrap();
    assert!(created.name.starts_with("app"));
    assert_eq!(created.dns_suffix, "corp.local");

    let requests = state.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].starts_with("GET /api/v3/onefuse/workspaces/?filter=name.exact:Default"));
    assert_eq!(requests[1], "POST /api/v3/onefuse/customNames/");

    // Step 2: read it back.
    let fetched = client.get_custom_name(created.id).unwrap();
    assert_eq!(fetched, created);

    // Step 3: delete.
    client.delete_custom_name(created.id).unwrap();

    // Step 4: read after delete passes the 404 through as an empty record.
    let gone = client.get_custom_name(created.id).unwrap();
    assert!(gone.is_empty());

    // Step 5: delete again - 404 is not classified by default.
    client.delete_custom_name(created.id).unwrap();
}

#[test]
fn missing_default_workspace_sends_no_create() {
    let state = MockState::empty();
    let client = start(state.clone());

    let err = client
        .generate_custom_name("corp.local", "1", "", None)
        .unwrap_err();
    assert!(matches!(err, OneFuseError::DefaultWorkspaceNotFound));
    assert_eq!(err.retry_policy(), RetryPolicy::NonRetryable);

    let requests = state.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests.iter().all(|r| !r.contains("/customNames/")));
}

#[test]
fn rejected_create_is_a_contract_violation() {
    let client = start(MockState::seeded());

    // Workspace 99 does not exist; the mock answers 400 with a detail body.
    let err = client
        .generate_custom_name("corp.local", "1", "99", None)
        .unwrap_err();
    match err {
        OneFuseError::DecodeContract { status, body, .. } => {
            assert_eq!(status, 400);
            assert!(body.contains("workspace does not exist"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn ad_policy_lifecycle() {
    let client = start(MockState::seeded());

    let endpoint = client.get_microsoft_endpoint_by_name("ad01").unwrap().unwrap();
    assert_eq!(endpoint.host, "dc01.example.com");
    assert!(endpoint.use_tls);
    assert_eq!(endpoint.workspace_ref().name, "Default");

    let input = NewMicrosoftAdPolicy {
        name: "pol1".to_string(),
        description: "test policy".to_string(),
        microsoft_endpoint: format!("/api/v3/onefuse/endpoints/{}/", endpoint.id),
        computer_name_letter_case: LetterCase::Upper,
        organizational_unit: "OU=Test,DC=example,DC=com".to_string(),
        workspace: Some("/api/v3/onefuse/workspaces/1/".to_string()),
    };
    let created = client.create_microsoft_ad_policy(&input).unwrap();
    assert_ne!(created.id, 0);
    assert_eq!(created.name, "pol1");
    assert_eq!(created.organizational_unit, "OU=Test,DC=example,DC=com");
    assert_eq!(created.links.microsoft_endpoint.name, "ad01");

    let fetched = client.get_microsoft_ad_policy(created.id).unwrap();
    assert_eq!(fetched, created);

    client.delete_microsoft_ad_policy(created.id).unwrap();
}

#[test]
fn unknown_endpoint_name_is_none() {
    let client = start(MockState::seeded());
    assert!(client.get_microsoft_endpoint_by_name("missing").unwrap().is_none());
}

#[test]
fn server_errors_carry_the_raw_body() {
    let state = MockState::seeded();
    let client = start(state.clone());
    state.fail_with(503, "maintenance window");

    let err = client.get_microsoft_ad_policy(1).unwrap_err();
    match &err {
        OneFuseError::Server { status, body } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "maintenance window");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.retry_policy(), RetryPolicy::Retryable);

    state.clear_failure();
    assert!(client.get_microsoft_endpoint_by_name("ad01").unwrap().is_some());
}

#[test]
fn strict_policy_surfaces_not_found() {
    let client = start(MockState::seeded()).with_status_policy(StatusPolicy::Strict);
    let err = client.delete_custom_name(12345).unwrap_err();
    assert!(matches!(err, OneFuseError::ClientStatus { status: 404, .. }));
}

#[test]
fn connection_refused_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = Config::new(Scheme::Http, "127.0.0.1", port.to_string(), "admin", "admin");
    let client = OneFuseClient::new(config);

    let err = client.get_custom_name(1).unwrap_err();
    assert!(matches!(err, OneFuseError::Transport { .. }));
    assert_eq!(err.retry_policy(), RetryPolicy::Retryable);
}

#[test]
fn non_utf8_body_is_decoded_not_a_transport_error() {
    use std::io::{BufRead, BufReader, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        // Drain the request head.
        while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
            line.clear();
        }
        let mut stream = stream;
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\n")
            .unwrap();
        stream.write_all(&[0xff, 0xfe, b'{', b'}']).unwrap();
        stream.flush().unwrap();
    });

    let config = Config::new(Scheme::Http, "127.0.0.1", port.to_string(), "admin", "admin");
    let transport = UreqTransport::new().with_timeout(Duration::from_secs(10));
    let client = OneFuseClient::with_transport(config, transport);

    let name = client.get_custom_name(1).unwrap();
    assert!(name.is_empty());
}
