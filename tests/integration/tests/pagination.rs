//! Paged search integration tests.

use dirmap_ldap::{
    Connection, DetailedError, DirectoryError, ErrorCondition, LdapResponse, SearchOutcome,
    SearchRequest,
};

use crate::common::{page_outcome, test_config, ScriptedTransport};

fn connection(transport: ScriptedTransport) -> Connection<ScriptedTransport> {
    Connection::new(transport, test_config(&["one"])).unwrap()
}

#[tokio::test]
async fn pagination_loops_until_the_cookie_is_exhausted() {
    crate::common::init_tracing();
    let mut transport = ScriptedTransport::new();
    transport.push_search(Ok(page_outcome(
        &["cn=a,dc=example,dc=com", "cn=b,dc=example,dc=com"],
        b"cookie-1",
    )));
    transport.push_search(Ok(page_outcome(
        &["cn=c,dc=example,dc=com", "cn=d,dc=example,dc=com"],
        b"cookie-2",
    )));
    transport.push_search(Ok(page_outcome(&["cn=e,dc=example,dc=com"], b"")));

    let mut conn = connection(transport);
    conn.connect().await.unwrap();

    let request = SearchRequest::new("dc=example,dc=com", "(objectClass=person)");
    let pages = conn.paged_search(&request, 2, false).await.unwrap();

    // Exactly three searches, three pages, in order and unmerged.
    assert_eq!(conn.transport().search_count, 3);
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0].entries.len(), 2);
    assert_eq!(pages[1].entries.len(), 2);
    assert_eq!(pages[2].entries.len(), 1);
    assert_eq!(pages[0].entries[0].dn, "cn=a,dc=example,dc=com");
    assert_eq!(pages[2].entries[0].dn, "cn=e,dc=example,dc=com");

    // The final page carries the empty cookie that ended the loop.
    assert_eq!(pages[0].cookie, b"cookie-1");
    assert_eq!(pages[1].cookie, b"cookie-2");
    assert!(pages[2].cookie.is_empty());
}

#[tokio::test]
async fn pagination_threads_the_cookie_through_requests() {
    let mut transport = ScriptedTransport::new();
    transport.push_search(Ok(page_outcome(&["cn=a,dc=example,dc=com"], b"next")));
    transport.push_search(Ok(page_outcome(&["cn=b,dc=example,dc=com"], b"")));

    let mut conn = connection(transport);
    conn.connect().await.unwrap();

    let request = SearchRequest::new("dc=example,dc=com", "(objectClass=person)");
    conn.paged_search(&request, 500, true).await.unwrap();

    let controls: Vec<_> = conn
        .transport()
        .page_log
        .iter()
        .map(|page| page.as_ref().expect("every request was paged"))
        .collect();
    assert_eq!(controls.len(), 2);

    // First request starts with an empty cookie; the second carries the
    // server's cookie back. Size and criticality ride along unchanged.
    assert!(controls[0].cookie.is_empty());
    assert_eq!(controls[1].cookie, b"next");
    assert!(controls.iter().all(|c| c.size == 500 && c.critical));
}

#[tokio::test]
async fn missing_response_control_ends_pagination() {
    let mut transport = ScriptedTransport::new();
    transport.push_search(Ok(SearchOutcome {
        entries: vec![],
        cookie: None,
        response: LdapResponse::success(),
    }));

    let mut conn = connection(transport);
    conn.connect().await.unwrap();

    let request = SearchRequest::new("dc=example,dc=com", "(objectClass=person)");
    let pages = conn.paged_search(&request, 100, false).await.unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(conn.transport().search_count, 1);
}

#[tokio::test]
async fn critical_paging_failure_fails_the_search() {
    let mut transport = ScriptedTransport::new();
    transport.push_search(Ok(SearchOutcome {
        entries: vec![],
        cookie: None,
        response: LdapResponse::new(12, "Critical extension is unavailable", ""),
    }));

    let mut conn = connection(transport);
    conn.connect().await.unwrap();

    let request = SearchRequest::new("dc=example,dc=com", "(objectClass=person)");
    let err = conn.paged_search(&request, 100, true).await.unwrap_err();
    assert_eq!(err.condition(), Some(ErrorCondition::Other));
    assert_eq!(err.detailed_error().map(|d| d.result_code), Some(12));
}

#[tokio::test]
async fn mid_pagination_failures_are_hard_failures() {
    let mut transport = ScriptedTransport::new();
    transport.push_search(Ok(page_outcome(&["cn=a,dc=example,dc=com"], b"cookie-1")));
    transport.push_search(Err(DirectoryError::Operation {
        condition: ErrorCondition::InsufficientAccess,
        detail: DetailedError::new(50, "Insufficient access", ""),
    }));

    let mut conn = connection(transport);
    conn.connect().await.unwrap();

    let request = SearchRequest::new("dc=example,dc=com", "(objectClass=person)");
    let err = conn.paged_search(&request, 2, false).await.unwrap_err();

    // No partial result surfaces; the page already fetched is discarded.
    assert_eq!(err.condition(), Some(ErrorCondition::InsufficientAccess));
    assert_eq!(conn.transport().search_count, 1);
}
