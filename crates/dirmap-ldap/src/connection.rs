//! Connection state machine with multi-host failover.
//!
//! A [`Connection`] owns exactly one transport handle and moves through
//! `Disconnected → Connecting → Bound(service account)` on
//! [`connect`](Connection::connect), trying each configured host in
//! order. Operations submitted through [`run`](Connection::run) are
//! lazily reconnected when the connection is down and retried through
//! the full failover sequence when the server becomes unreachable
//! mid-operation, bounded by the number of configured hosts. All other
//! errors propagate immediately.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::auth::Guard;
use crate::config::ConnectionConfig;
use crate::entry::Entry;
use crate::error::{
    DetailedError, DirectoryError, ErrorClassifier, ErrorCondition, HostAttempt, Result,
};
use crate::transport::{AttributeChange, LdapResponse, LdapTransport, SearchRequest};

/// The identity a connection is currently bound as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundAs {
    /// Connected but not bound, or not connected.
    None,
    /// Bound as the configured service account.
    ServiceAccount,
    /// Bound as an end user.
    User(String),
}

// ============================================================================
// Operations
// ============================================================================

/// Borrowed connection internals handed to an [`Operation`].
pub struct OpContext<'a, L: LdapTransport> {
    /// The live transport handle.
    pub transport: &'a mut L,
    /// The connection's error classifier.
    pub classifier: &'a ErrorClassifier,
    /// The connection's configuration.
    pub config: &'a ConnectionConfig,
}

impl<L: LdapTransport> OpContext<'_, L> {
    /// Turns a non-success response into a classified operation error.
    ///
    /// ## Errors
    ///
    /// Returns [`DirectoryError::Operation`] carrying the server's
    /// [`DetailedError`] when the response code is non-zero.
    pub fn check(&self, response: LdapResponse) -> Result<LdapResponse> {
        if response.is_success() {
            Ok(response)
        } else {
            let detail = DetailedError::from(response);
            Err(DirectoryError::Operation {
                condition: self.classifier.classify(&detail),
                detail,
            })
        }
    }
}

/// A unit of work executed against the transport under the connection's
/// retry-on-disconnect policy.
#[allow(async_fn_in_trait)]
pub trait Operation<L: LdapTransport> {
    /// The operation's result type.
    type Output;

    /// Executes the operation against the live transport.
    async fn execute(&mut self, cx: OpContext<'_, L>) -> Result<Self::Output>;
}

// ============================================================================
// Connection
// ============================================================================

/// One directory connection owning one transport handle.
pub struct Connection<L: LdapTransport> {
    transport: L,
    config: ConnectionConfig,
    classifier: ErrorClassifier,
    connected: bool,
    bound_as: BoundAs,
    attempted: HashMap<String, DateTime<Utc>>,
}

impl<L: LdapTransport> Connection<L> {
    /// Creates an unconnected, unbound connection.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error when `config` fails validation.
    pub fn new(transport: L, config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            config,
            classifier: ErrorClassifier::default(),
            connected: false,
            bound_as: BoundAs::None,
            attempted: HashMap::new(),
        })
    }

    /// Replaces the default error classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Returns the connection configuration.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Returns the identity the connection is currently bound as.
    #[must_use]
    pub fn bound_as(&self) -> &BoundAs {
        &self.bound_as
    }

    /// Checks whether a transport session is currently established.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// The per-host log of failed connection attempts.
    #[must_use]
    pub fn attempted(&self) -> &HashMap<String, DateTime<Utc>> {
        &self.attempted
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &L {
        &self.transport
    }

    /// Returns the underlying transport mutably.
    ///
    /// Operations issued directly on the transport bypass the
    /// retry-on-disconnect policy; prefer [`run`](Self::run).
    pub fn transport_mut(&mut self) -> &mut L {
        &mut self.transport
    }

    /// Returns the error classifier.
    #[must_use]
    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// Returns the error classifier for registering additional rules.
    pub fn classifier_mut(&mut self) -> &mut ErrorClassifier {
        &mut self.classifier
    }

    /// Begins an authentication exchange on this connection.
    pub fn auth(&mut self) -> Guard<'_, L> {
        Guard::new(self)
    }

    // === Lifecycle ===

    /// Connects and binds as the service account, trying each configured
    /// host in order.
    ///
    /// Failed hosts are recorded in the attempt log with a timestamp and
    /// skipped over; the first host that accepts both the transport
    /// connection and the service-account bind wins.
    ///
    /// ## Errors
    ///
    /// Returns [`DirectoryError::HostsExhausted`] carrying the per-host
    /// failure history when every candidate host fails.
    pub async fn connect(&mut self) -> Result<()> {
        let hosts = self.config.hosts.clone();
        let mut attempts = Vec::with_capacity(hosts.len());

        for host in &hosts {
            match self.try_host(host).await {
                Ok(()) => {
                    tracing::debug!(host = %host, "directory connection established");
                    return Ok(());
                }
                Err(err) => {
                    let at = Utc::now();
                    self.attempted.insert(host.clone(), at);
                    tracing::warn!(host = %host, error = %err, "connection attempt failed");
                    attempts.push(HostAttempt {
                        host: host.clone(),
                        at,
                        error: err.to_string(),
                    });
                }
            }
        }

        Err(DirectoryError::HostsExhausted { attempts })
    }

    async fn try_host(&mut self, host: &str) -> Result<()> {
        self.transport.connect(host, &self.config).await?;

        let response = self
            .transport
            .bind(Some(&self.config.bind_dn), Some(&self.config.bind_password))
            .await?;
        if !response.is_success() {
            let err = self.bind_error(response);
            self.transport.close().await;
            return Err(err);
        }

        self.connected = true;
        self.bound_as = BoundAs::ServiceAccount;
        Ok(())
    }

    /// Releases the transport handle. Safe to call repeatedly.
    pub async fn close(&mut self) {
        self.transport.close().await;
        self.connected = false;
        self.bound_as = BoundAs::None;
    }

    // === Operation execution ===

    /// Runs an operation under the retry-on-disconnect policy.
    ///
    /// A disconnected connection is lazily reconnected first. When the
    /// operation fails with a server-unreachable class of error, the
    /// connection is closed, the full host-failover sequence is retried,
    /// and the operation re-executed, at most once per configured host;
    /// the last error then propagates. Any other error propagates
    /// immediately without a retry.
    pub async fn run<Op: Operation<L>>(&mut self, mut op: Op) -> Result<Op::Output> {
        let max_retries = self.config.hosts.len();
        let mut retries = 0usize;

        loop {
            if !self.connected {
                self.connect().await?;
            }

            let cx = OpContext {
                transport: &mut self.transport,
                classifier: &self.classifier,
                config: &self.config,
            };
            match op.execute(cx).await {
                Ok(output) => return Ok(output),
                Err(err) if err.is_unreachable() && retries < max_retries => {
                    retries += 1;
                    tracing::warn!(
                        error = %err,
                        retries,
                        "server became unreachable, reconnecting"
                    );
                    self.close().await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Executes a search and returns the matching entries.
    pub async fn search(&mut self, request: &SearchRequest) -> Result<Vec<Entry>> {
        self.run(SearchOp {
            request: request.clone(),
        })
        .await
    }

    /// Adds an entry.
    pub async fn add(
        &mut self,
        dn: impl Into<String>,
        attributes: Vec<(String, Vec<String>)>,
    ) -> Result<()> {
        self.run(AddOp {
            dn: dn.into(),
            attributes,
        })
        .await
    }

    /// Applies attribute modifications to an entry.
    pub async fn modify(
        &mut self,
        dn: impl Into<String>,
        changes: Vec<AttributeChange>,
    ) -> Result<()> {
        self.run(ModifyOp {
            dn: dn.into(),
            changes,
        })
        .await
    }

    /// Deletes an entry.
    pub async fn delete(&mut self, dn: impl Into<String>) -> Result<()> {
        self.run(DeleteOp { dn: dn.into() }).await
    }

    /// Renames an entry.
    pub async fn rename(
        &mut self,
        dn: impl Into<String>,
        new_rdn: impl Into<String>,
        delete_old_rdn: bool,
    ) -> Result<()> {
        self.run(RenameOp {
            dn: dn.into(),
            new_rdn: new_rdn.into(),
            delete_old_rdn,
        })
        .await
    }

    // === Internals shared with the auth guard ===

    pub(crate) async fn ensure_connected(&mut self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            self.connect().await
        }
    }

    pub(crate) async fn raw_bind(&mut self, dn: &str, password: &str) -> Result<LdapResponse> {
        self.ensure_connected().await?;
        self.transport.bind(Some(dn), Some(password)).await
    }

    pub(crate) fn set_bound(&mut self, bound: BoundAs) {
        self.bound_as = bound;
    }

    pub(crate) fn classify(&self, detail: &DetailedError) -> ErrorCondition {
        self.classifier.classify(detail)
    }

    pub(crate) fn bind_error(&self, response: LdapResponse) -> DirectoryError {
        let detail = DetailedError::from(response);
        DirectoryError::Bind {
            condition: self.classifier.classify(&detail),
            detail,
        }
    }
}

// ============================================================================
// Built-in operations
// ============================================================================

struct SearchOp {
    request: SearchRequest,
}

impl<L: LdapTransport> Operation<L> for SearchOp {
    type Output = Vec<Entry>;

    async fn execute(&mut self, cx: OpContext<'_, L>) -> Result<Vec<Entry>> {
        let outcome = cx.transport.search(&self.request, None).await?;
        cx.check(outcome.response)?;
        Ok(outcome.entries)
    }
}

struct AddOp {
    dn: String,
    attributes: Vec<(String, Vec<String>)>,
}

impl<L: LdapTransport> Operation<L> for AddOp {
    type Output = ();

    async fn execute(&mut self, cx: OpContext<'_, L>) -> Result<()> {
        let response = cx.transport.add(&self.dn, self.attributes.clone()).await?;
        cx.check(response)?;
        Ok(())
    }
}

struct ModifyOp {
    dn: String,
    changes: Vec<AttributeChange>,
}

impl<L: LdapTransport> Operation<L> for ModifyOp {
    type Output = ();

    async fn execute(&mut self, cx: OpContext<'_, L>) -> Result<()> {
        let response = cx.transport.modify(&self.dn, self.changes.clone()).await?;
        cx.check(response)?;
        Ok(())
    }
}

struct DeleteOp {
    dn: String,
}

impl<L: LdapTransport> Operation<L> for DeleteOp {
    type Output = ();

    async fn execute(&mut self, cx: OpContext<'_, L>) -> Result<()> {
        let response = cx.transport.delete(&self.dn).await?;
        cx.check(response)?;
        Ok(())
    }
}

struct RenameOp {
    dn: String,
    new_rdn: String,
    delete_old_rdn: bool,
}

impl<L: LdapTransport> Operation<L> for RenameOp {
    type Output = ();

    async fn execute(&mut self, cx: OpContext<'_, L>) -> Result<()> {
        let response = cx
            .transport
            .rename(&self.dn, &self.new_rdn, self.delete_old_rdn)
            .await?;
        cx.check(response)?;
        Ok(())
    }
}
