//! Common test utilities and fixtures.
//!
//! [`ScriptedTransport`] is an in-memory stand-in for the abstract LDAP
//! transport. Bind outcomes can be scripted per host, per DN, or as an
//! ordered sequence; search outcomes are served from a queue. Every call
//! is recorded so tests can assert on the exact traffic the connection
//! layer produced.

use std::collections::{HashMap, HashSet, VecDeque};

use dirmap_ldap::{
    AttributeChange, ConnectionConfig, DirectoryError, Entry, LdapResponse, LdapTransport,
    PageControl, SearchOutcome, SearchRequest,
};

type Result<T> = std::result::Result<T, DirectoryError>;

/// Scripted in-memory LDAP transport.
#[derive(Default)]
pub struct ScriptedTransport {
    /// Hosts that refuse the transport-level connect.
    pub refuse_connect: HashSet<String>,
    /// Bind responses per host, consulted after the ordered script.
    pub host_bind_failures: HashMap<String, LdapResponse>,
    /// Bind responses per DN, consulted after the host map.
    pub dn_bind_failures: HashMap<String, LdapResponse>,
    /// Ordered bind responses taking precedence over the maps.
    pub bind_script: VecDeque<LdapResponse>,
    /// Search outcomes served in order; an empty queue yields empty
    /// successful results.
    pub search_script: VecDeque<Result<SearchOutcome>>,

    /// Every DN bound, in order.
    pub bind_log: Vec<String>,
    /// Every filter string searched, in order.
    pub filter_log: Vec<String>,
    /// Every paging control sent, in order (`None` for unpaged searches).
    pub page_log: Vec<Option<PageControl>>,
    /// Number of searches executed.
    pub search_count: usize,
    /// Number of times the transport was closed.
    pub close_count: usize,

    connected_host: Option<String>,
    last: Option<LdapResponse>,
}

impl ScriptedTransport {
    /// Creates a transport where everything succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a search outcome.
    pub fn push_search(&mut self, outcome: Result<SearchOutcome>) {
        self.search_script.push_back(outcome);
    }

    /// The host the transport is currently connected to.
    pub fn connected_host(&self) -> Option<&str> {
        self.connected_host.as_deref()
    }
}

impl LdapTransport for ScriptedTransport {
    async fn connect(&mut self, host: &str, _config: &ConnectionConfig) -> Result<()> {
        if self.refuse_connect.contains(host) {
            return Err(DirectoryError::connection(format!(
                "connection refused: {host}"
            )));
        }
        self.connected_host = Some(host.to_string());
        Ok(())
    }

    async fn bind(&mut self, dn: Option<&str>, _password: Option<&str>) -> Result<LdapResponse> {
        let dn = dn.unwrap_or_default().to_string();
        self.bind_log.push(dn.clone());

        let response = if let Some(scripted) = self.bind_script.pop_front() {
            scripted
        } else if let Some(by_host) = self
            .connected_host
            .as_ref()
            .and_then(|host| self.host_bind_failures.get(host))
        {
            by_host.clone()
        } else if let Some(by_dn) = self.dn_bind_failures.get(&dn) {
            by_dn.clone()
        } else {
            LdapResponse::success()
        };

        self.last = Some(response.clone());
        Ok(response)
    }

    async fn search(
        &mut self,
        request: &SearchRequest,
        page: Option<&PageControl>,
    ) -> Result<SearchOutcome> {
        self.filter_log.push(request.filter.clone());
        self.page_log.push(page.cloned());
        match self.search_script.pop_front() {
            Some(Ok(outcome)) => {
                self.search_count += 1;
                self.last = Some(outcome.response.clone());
                Ok(outcome)
            }
            Some(Err(err)) => Err(err),
            None => {
                self.search_count += 1;
                Ok(SearchOutcome {
                    entries: vec![],
                    cookie: None,
                    response: LdapResponse::success(),
                })
            }
        }
    }

    async fn add(
        &mut self,
        _dn: &str,
        _attributes: Vec<(String, Vec<String>)>,
    ) -> Result<LdapResponse> {
        Ok(LdapResponse::success())
    }

    async fn modify(&mut self, _dn: &str, _changes: Vec<AttributeChange>) -> Result<LdapResponse> {
        Ok(LdapResponse::success())
    }

    async fn delete(&mut self, _dn: &str) -> Result<LdapResponse> {
        Ok(LdapResponse::success())
    }

    async fn rename(
        &mut self,
        _dn: &str,
        _new_rdn: &str,
        _delete_old_rdn: bool,
    ) -> Result<LdapResponse> {
        Ok(LdapResponse::success())
    }

    fn last_error(&self) -> String {
        self.last
            .as_ref()
            .map(|r| r.message.clone())
            .unwrap_or_default()
    }

    fn err_no(&self) -> u32 {
        self.last.as_ref().map_or(0, |r| r.result_code)
    }

    async fn close(&mut self) {
        self.connected_host = None;
        self.close_count += 1;
    }
}

/// The service-account DN used by [`test_config`].
pub const SERVICE_DN: &str = "cn=service,dc=example,dc=com";

/// A validated configuration over the given hosts.
pub fn test_config(hosts: &[&str]) -> ConnectionConfig {
    ConnectionConfig::builder()
        .hosts(hosts.iter().copied())
        .base_dn("dc=example,dc=com")
        .bind_dn(SERVICE_DN)
        .bind_password("service-secret")
        .build()
        .expect("test configuration is valid")
}

/// A successful search outcome carrying the given entries and cookie.
pub fn page_outcome(dns: &[&str], cookie: &[u8]) -> SearchOutcome {
    SearchOutcome {
        entries: dns.iter().map(|dn| Entry::new(*dn)).collect(),
        cookie: Some(cookie.to_vec()),
        response: LdapResponse::success(),
    }
}

/// Initializes test tracing output once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dirmap_ldap=debug")
        .try_init();
}
