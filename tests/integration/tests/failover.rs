//! Host failover, retry-on-disconnect, and registry integration tests.

use dirmap_ldap::{
    BoundAs, Connection, ConnectionRegistry, DetailedError, DirectoryError, ErrorCondition,
    LdapResponse, SearchRequest,
};

use crate::common::{test_config, ScriptedTransport};

fn bind_rejection() -> LdapResponse {
    LdapResponse::new(
        49,
        "Invalid credentials",
        "80090308: LdapErr: DSID-0C090447, data 52e",
    )
}

#[tokio::test]
async fn failover_skips_hosts_that_reject_the_service_bind() {
    crate::common::init_tracing();
    let mut transport = ScriptedTransport::new();
    transport
        .host_bind_failures
        .insert("one".to_string(), bind_rejection());
    transport
        .host_bind_failures
        .insert("two".to_string(), bind_rejection());

    let mut conn = Connection::new(transport, test_config(&["one", "two", "three"])).unwrap();
    conn.connect().await.unwrap();

    assert_eq!(conn.bound_as(), &BoundAs::ServiceAccount);
    assert_eq!(conn.transport().connected_host(), Some("three"));

    // Only the failed-and-retried hosts appear in the attempt log.
    assert!(conn.attempted().contains_key("one"));
    assert!(conn.attempted().contains_key("two"));
    assert!(!conn.attempted().contains_key("three"));
}

#[tokio::test]
async fn failover_skips_hosts_that_refuse_the_connect() {
    let mut transport = ScriptedTransport::new();
    transport.refuse_connect.insert("one".to_string());

    let mut conn = Connection::new(transport, test_config(&["one", "two"])).unwrap();
    conn.connect().await.unwrap();

    assert!(conn.is_connected());
    assert_eq!(conn.transport().connected_host(), Some("two"));
    assert!(conn.attempted().contains_key("one"));
}

#[tokio::test]
async fn exhausting_every_host_carries_the_attempt_history() {
    let mut transport = ScriptedTransport::new();
    transport.refuse_connect.insert("one".to_string());
    transport
        .host_bind_failures
        .insert("two".to_string(), bind_rejection());

    let mut conn = Connection::new(transport, test_config(&["one", "two"])).unwrap();
    let err = conn.connect().await.unwrap_err();

    let DirectoryError::HostsExhausted { attempts } = err else {
        panic!("expected HostsExhausted, got {err}");
    };
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].host, "one");
    assert!(attempts[0].error.contains("connection refused"));
    assert_eq!(attempts[1].host, "two");
    assert!(attempts[1].error.contains("bind failed"));
}

#[tokio::test]
async fn unreachable_operations_reconnect_and_re_execute() {
    let mut transport = ScriptedTransport::new();
    transport.push_search(Err(DirectoryError::connection("broken pipe")));

    let mut conn = Connection::new(transport, test_config(&["one", "two"])).unwrap();
    conn.connect().await.unwrap();

    let request = SearchRequest::new("dc=example,dc=com", "(cn=Steve)");
    conn.search(&request).await.unwrap();

    // The transport was closed for the reconnect and the search re-ran.
    assert!(conn.transport().close_count >= 1);
    assert_eq!(conn.transport().search_count, 1);
    assert!(conn.is_connected());
}

#[tokio::test]
async fn unreachable_retries_stop_after_one_round_per_host() {
    let mut transport = ScriptedTransport::new();
    for _ in 0..4 {
        transport.push_search(Err(DirectoryError::connection("broken pipe")));
    }

    let mut conn = Connection::new(transport, test_config(&["one", "two"])).unwrap();
    conn.connect().await.unwrap();

    let request = SearchRequest::new("dc=example,dc=com", "(cn=Steve)");
    let err = conn.search(&request).await.unwrap_err();
    assert!(err.is_unreachable());

    // Two hosts: the initial execution plus two retries, then give up.
    assert_eq!(conn.transport().filter_log.len(), 3);
}

#[tokio::test]
async fn application_errors_propagate_without_retry() {
    let mut transport = ScriptedTransport::new();
    transport.push_search(Err(DirectoryError::Operation {
        condition: ErrorCondition::InsufficientAccess,
        detail: DetailedError::new(50, "Insufficient access", ""),
    }));

    let mut conn = Connection::new(transport, test_config(&["one", "two"])).unwrap();
    conn.connect().await.unwrap();

    let request = SearchRequest::new("dc=example,dc=com", "(cn=Steve)");
    let err = conn.search(&request).await.unwrap_err();
    assert_eq!(err.condition(), Some(ErrorCondition::InsufficientAccess));

    // Exactly one execution: no reconnect, no re-run.
    assert_eq!(conn.transport().filter_log.len(), 1);
    assert_eq!(conn.transport().close_count, 0);
}

#[tokio::test]
async fn operations_on_a_closed_connection_lazily_reconnect() {
    let transport = ScriptedTransport::new();
    let mut conn = Connection::new(transport, test_config(&["one"])).unwrap();
    conn.connect().await.unwrap();
    conn.close().await;
    assert!(!conn.is_connected());

    let request = SearchRequest::new("dc=example,dc=com", "(cn=Steve)");
    conn.search(&request).await.unwrap();
    assert!(conn.is_connected());
    assert_eq!(conn.bound_as(), &BoundAs::ServiceAccount);
}

#[tokio::test]
async fn registry_resolves_named_connections() {
    let registry = ConnectionRegistry::new();
    let alpha = Connection::new(ScriptedTransport::new(), test_config(&["alpha"])).unwrap();
    let beta = Connection::new(ScriptedTransport::new(), test_config(&["beta"])).unwrap();

    registry.add("alpha", alpha);
    registry.add("beta", beta);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.default_name(), Some("alpha".to_string()));

    {
        let handle = registry.get("beta").unwrap();
        let mut conn = handle.lock().await;
        conn.connect().await.unwrap();
        assert_eq!(conn.transport().connected_host(), Some("beta"));
    }

    registry.remove("alpha");
    assert!(registry.default_name().is_none());
    registry.set_default("beta");
    assert!(registry.default_connection().is_some());

    registry.flush();
    assert!(registry.is_empty());
}

#[tokio::test]
async fn independent_connections_share_no_state() {
    let mut transport_one = ScriptedTransport::new();
    transport_one
        .host_bind_failures
        .insert("solo".to_string(), bind_rejection());

    let mut one = Connection::new(transport_one, test_config(&["solo"])).unwrap();
    let mut two = Connection::new(ScriptedTransport::new(), test_config(&["solo"])).unwrap();

    assert!(one.connect().await.is_err());
    two.connect().await.unwrap();

    assert!(one.attempted().contains_key("solo"));
    assert!(two.attempted().is_empty());
}
