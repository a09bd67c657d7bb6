//! Abstract LDAP transport and its ldap3 implementation.
//!
//! [`LdapTransport`] is the capability the connection layer consumes: a
//! standard LDAP v3 client binding (bind, search, add, modify, delete,
//! rename) plus the simple paged-results control. Failed operations are
//! reported through [`LdapResponse`] values rather than errors; transport
//! errors (`Err`) are reserved for failures reaching the server.
//!
//! [`Ldap3Transport`] is the shipped implementation over
//! [`ldap3::LdapConnAsync`]. Tests drive the connection layer through
//! scripted stand-ins instead.

use std::collections::HashSet;

use ldap3::controls::{Control, ControlType, MakeCritical, PagedResults};
use ldap3::{LdapConnAsync, LdapConnSettings, Mod, SearchEntry};

use crate::config::{ConnectionConfig, TlsMode};
use crate::entry::Entry;
use crate::error::{DetailedError, DirectoryError, Result};

// ============================================================================
// Responses
// ============================================================================

/// The server's response to one LDAP operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapResponse {
    /// Numeric LDAP result code; zero means success.
    pub result_code: u32,
    /// Standard text for the result code.
    pub message: String,
    /// Server-supplied diagnostic message, possibly empty.
    pub diagnostic: String,
}

impl LdapResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(result_code: u32, message: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            result_code,
            message: message.into(),
            diagnostic: diagnostic.into(),
        }
    }

    /// A successful response.
    #[must_use]
    pub fn success() -> Self {
        Self::new(0, "Success", "")
    }

    /// Checks whether the operation succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result_code == 0
    }
}

impl From<LdapResponse> for DetailedError {
    fn from(response: LdapResponse) -> Self {
        Self::new(response.result_code, response.message, response.diagnostic)
    }
}

/// Standard text for the common LDAP result codes.
fn result_text(code: u32) -> &'static str {
    match code {
        0 => "Success",
        1 => "Operations error",
        3 => "Time limit exceeded",
        12 => "Critical extension is unavailable",
        19 => "Constraint violation",
        32 => "No such object",
        49 => "Invalid credentials",
        50 => "Insufficient access",
        51 => "Server is busy",
        52 => "Server is unavailable",
        68 => "Already exists",
        81 => "Can't contact LDAP server",
        _ => "Unknown error",
    }
}

// ============================================================================
// Requests
// ============================================================================

/// LDAP search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Search only the base DN.
    Base,
    /// Search one level below the base DN.
    OneLevel,
    /// Search the entire subtree.
    #[default]
    Subtree,
}

impl SearchScope {
    /// Converts to the ldap3 scope.
    #[must_use]
    pub const fn to_ldap3(self) -> ldap3::Scope {
        match self {
            Self::Base => ldap3::Scope::Base,
            Self::OneLevel => ldap3::Scope::OneLevel,
            Self::Subtree => ldap3::Scope::Subtree,
        }
    }
}

/// One search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Base DN under which to search.
    pub base_dn: String,
    /// Search scope.
    pub scope: SearchScope,
    /// Compiled filter string.
    pub filter: String,
    /// Attributes to return; empty means all.
    pub attributes: Vec<String>,
}

impl SearchRequest {
    /// Creates a subtree search with the given filter.
    #[must_use]
    pub fn new(base_dn: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            base_dn: base_dn.into(),
            scope: SearchScope::Subtree,
            filter: filter.into(),
            attributes: Vec::new(),
        }
    }

    /// Creates a search from a compiled query builder.
    ///
    /// A builder with no fragments compiles to an empty string, which
    /// means "match all entries under the base DN"; that is sent to the
    /// server as the presence filter `(objectClass=*)`.
    #[must_use]
    pub fn from_query(base_dn: impl Into<String>, query: &dirmap_filter::QueryBuilder) -> Self {
        let compiled = query.compile();
        let filter = if compiled.is_empty() {
            "(objectClass=*)".to_string()
        } else {
            compiled
        };
        Self::new(base_dn, filter)
    }

    /// Sets the search scope.
    #[must_use]
    pub const fn scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the attributes to return.
    #[must_use]
    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

/// The simple paged-results request control (RFC 2696).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControl {
    /// Requested page size.
    pub size: u32,
    /// Server-issued cookie; empty on the first request.
    pub cookie: Vec<u8>,
    /// Whether the server must support paging or fail the search.
    pub critical: bool,
}

/// The outcome of one search request.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Entries in this response.
    pub entries: Vec<Entry>,
    /// Updated paging cookie, when a paged-results control was returned.
    pub cookie: Option<Vec<u8>>,
    /// The server's response.
    pub response: LdapResponse,
}

/// One attribute modification for a modify request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeChange {
    /// Add values to an attribute.
    Add(String, Vec<String>),
    /// Replace all values of an attribute.
    Replace(String, Vec<String>),
    /// Delete values (or the whole attribute when empty).
    Delete(String, Vec<String>),
}

// ============================================================================
// Transport trait
// ============================================================================

/// The abstract LDAP client capability consumed by the connection layer.
///
/// One transport value is one handle: `connect` establishes or replaces
/// the underlying session, and every operation runs on that session.
/// Implementations are driven through a generic parameter, never trait
/// objects.
#[allow(async_fn_in_trait)]
pub trait LdapTransport: Send {
    /// Establishes a session with the given host, using the connection
    /// settings from `config`.
    async fn connect(&mut self, host: &str, config: &ConnectionConfig) -> Result<()>;

    /// Performs a simple bind. `None` operands request an anonymous bind.
    async fn bind(&mut self, dn: Option<&str>, password: Option<&str>) -> Result<LdapResponse>;

    /// Executes a search, optionally with a paged-results control.
    async fn search(
        &mut self,
        request: &SearchRequest,
        page: Option<&PageControl>,
    ) -> Result<SearchOutcome>;

    /// Adds an entry.
    async fn add(
        &mut self,
        dn: &str,
        attributes: Vec<(String, Vec<String>)>,
    ) -> Result<LdapResponse>;

    /// Applies attribute modifications to an entry.
    async fn modify(&mut self, dn: &str, changes: Vec<AttributeChange>) -> Result<LdapResponse>;

    /// Deletes an entry.
    async fn delete(&mut self, dn: &str) -> Result<LdapResponse>;

    /// Renames an entry.
    async fn rename(
        &mut self,
        dn: &str,
        new_rdn: &str,
        delete_old_rdn: bool,
    ) -> Result<LdapResponse>;

    /// The message of the most recent response.
    fn last_error(&self) -> String;

    /// The result code of the most recent response.
    fn err_no(&self) -> u32;

    /// Releases the session. Safe to call when not connected.
    async fn close(&mut self);
}

// ============================================================================
// ldap3 implementation
// ============================================================================

/// [`LdapTransport`] over the ldap3 async client.
#[derive(Default)]
pub struct Ldap3Transport {
    ldap: Option<ldap3::Ldap>,
    last: Option<LdapResponse>,
}

impl Ldap3Transport {
    /// Creates an unconnected transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut ldap3::Ldap> {
        self.ldap
            .as_mut()
            .ok_or_else(|| DirectoryError::connection("transport is not connected"))
    }

    fn record(&mut self, result: ldap3::LdapResult) -> LdapResponse {
        let response = LdapResponse::new(result.rc, result_text(result.rc), result.text);
        self.last = Some(response.clone());
        response
    }
}

/// Maps ldap3 client errors, folding connection-loss cases into the
/// retryable connection class.
fn map_ldap_err(err: ldap3::LdapError) -> DirectoryError {
    match err {
        ldap3::LdapError::Io { source } => DirectoryError::connection(source.to_string()),
        ldap3::LdapError::EndOfStream => {
            DirectoryError::connection("connection closed by server")
        }
        other => DirectoryError::Ldap3(other),
    }
}

impl LdapTransport for Ldap3Transport {
    async fn connect(&mut self, host: &str, config: &ConnectionConfig) -> Result<()> {
        let url = config.url_for(host);
        let settings = LdapConnSettings::new()
            .set_conn_timeout(config.connect_timeout)
            .set_starttls(matches!(config.tls_mode, TlsMode::StartTls));

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| DirectoryError::connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!("LDAP connection driver error: {}", e);
            }
        });

        self.ldap = Some(ldap);
        self.last = None;
        Ok(())
    }

    async fn bind(&mut self, dn: Option<&str>, password: Option<&str>) -> Result<LdapResponse> {
        let result = self
            .handle()?
            .simple_bind(dn.unwrap_or_default(), password.unwrap_or_default())
            .await
            .map_err(map_ldap_err)?;
        Ok(self.record(result))
    }

    async fn search(
        &mut self,
        request: &SearchRequest,
        page: Option<&PageControl>,
    ) -> Result<SearchOutcome> {
        let scope = request.scope.to_ldap3();
        let attrs = request.attributes.clone();

        let result = {
            let ldap = self.handle()?;
            if let Some(control) = page {
                let paged = PagedResults {
                    size: i32::try_from(control.size).unwrap_or(i32::MAX),
                    cookie: control.cookie.clone(),
                };
                if control.critical {
                    ldap.with_controls(paged.critical())
                        .search(&request.base_dn, scope, &request.filter, attrs)
                        .await
                } else {
                    ldap.with_controls(paged)
                        .search(&request.base_dn, scope, &request.filter, attrs)
                        .await
                }
            } else {
                ldap.search(&request.base_dn, scope, &request.filter, attrs)
                    .await
            }
        }
        .map_err(map_ldap_err)?;

        let ldap3::SearchResult(raw_entries, ldap_result) = result;

        let mut cookie = None;
        for ctrl in &ldap_result.ctrls {
            if let Control(Some(ControlType::PagedResults), raw) = ctrl {
                cookie = Some(raw.parse::<PagedResults>().cookie);
            }
        }

        let response = self.record(ldap_result);
        let entries = raw_entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(Entry::from_search_entry)
            .collect();

        Ok(SearchOutcome {
            entries,
            cookie,
            response,
        })
    }

    async fn add(
        &mut self,
        dn: &str,
        attributes: Vec<(String, Vec<String>)>,
    ) -> Result<LdapResponse> {
        let attrs: Vec<(String, HashSet<String>)> = attributes
            .into_iter()
            .map(|(name, values)| (name, values.into_iter().collect()))
            .collect();
        let result = self.handle()?.add(dn, attrs).await.map_err(map_ldap_err)?;
        Ok(self.record(result))
    }

    async fn modify(&mut self, dn: &str, changes: Vec<AttributeChange>) -> Result<LdapResponse> {
        let mods: Vec<Mod<String>> = changes
            .into_iter()
            .map(|change| match change {
                AttributeChange::Add(name, values) => {
                    Mod::Add(name, values.into_iter().collect())
                }
                AttributeChange::Replace(name, values) => {
                    Mod::Replace(name, values.into_iter().collect())
                }
                AttributeChange::Delete(name, values) => {
                    Mod::Delete(name, values.into_iter().collect())
                }
            })
            .collect();
        let result = self
            .handle()?
            .modify(dn, mods)
            .await
            .map_err(map_ldap_err)?;
        Ok(self.record(result))
    }

    async fn delete(&mut self, dn: &str) -> Result<LdapResponse> {
        let result = self.handle()?.delete(dn).await.map_err(map_ldap_err)?;
        Ok(self.record(result))
    }

    async fn rename(
        &mut self,
        dn: &str,
        new_rdn: &str,
        delete_old_rdn: bool,
    ) -> Result<LdapResponse> {
        let result = self
            .handle()?
            .modifydn(dn, new_rdn, delete_old_rdn, None)
            .await
            .map_err(map_ldap_err)?;
        Ok(self.record(result))
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
        if let Some(mut ldap) = self.ldap.take() {
            let _ = ldap.unbind().await;
        }
        self.last = None;
    }
}
