//! Connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, Result};

/// How the transport secures the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TlsMode {
    /// Plain LDAP without encryption.
    Plain,
    /// TLS from connection start (LDAPS).
    #[default]
    Ldaps,
    /// Plain connection upgraded with STARTTLS.
    StartTls,
}

impl TlsMode {
    /// The conventional port for this mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Ldaps => 636,
            Self::Plain | Self::StartTls => 389,
        }
    }
}

/// Configuration for one directory connection.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Candidate hosts, tried in order during failover.
    pub hosts: Vec<String>,

    /// Server port.
    pub port: u16,

    /// Transport security mode.
    #[serde(default)]
    pub tls_mode: TlsMode,

    /// Base DN for all operations.
    pub base_dn: String,

    /// Service-account bind DN.
    pub bind_dn: String,

    /// Service-account bind password.
    #[serde(skip_serializing, default)]
    pub bind_password: String,

    /// Transport-level connect timeout.
    pub connect_timeout: Duration,

    /// Default page size for paged searches.
    pub page_size: u32,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("hosts", &self.hosts)
            .field("port", &self.port)
            .field("tls_mode", &self.tls_mode)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"***REDACTED***")
            .field("connect_timeout", &self.connect_timeout)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl ConnectionConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error naming the first missing or invalid
    /// field. Raised before any network I/O.
    pub fn validate(&self) -> Result<()> {
        if self.hosts.is_empty() {
            return Err(DirectoryError::config("at least one host is required"));
        }
        if self.hosts.iter().any(String::is_empty) {
            return Err(DirectoryError::config("hosts cannot be empty strings"));
        }
        if self.base_dn.is_empty() {
            return Err(DirectoryError::config("base_dn is required"));
        }
        if self.bind_dn.is_empty() {
            return Err(DirectoryError::config("bind_dn is required"));
        }
        if self.bind_password.is_empty() {
            return Err(DirectoryError::config("bind_password is required"));
        }
        if self.page_size == 0 {
            return Err(DirectoryError::config("page_size must be greater than zero"));
        }
        Ok(())
    }

    /// The connection URL for a specific host.
    #[must_use]
    pub fn url_for(&self, host: &str) -> String {
        let scheme = match self.tls_mode {
            TlsMode::Ldaps => "ldaps",
            TlsMode::Plain | TlsMode::StartTls => "ldap",
        };
        format!("{scheme}://{host}:{}", self.port)
    }
}

/// Builder for [`ConnectionConfig`].
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    hosts: Vec<String>,
    port: Option<u16>,
    tls_mode: TlsMode,
    base_dn: Option<String>,
    bind_dn: Option<String>,
    bind_password: Option<String>,
    connect_timeout: Duration,
    page_size: u32,
}

impl ConnectionConfigBuilder {
    /// Creates a builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            page_size: 1000,
            ..Self::default()
        }
    }

    /// Adds a candidate host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.hosts.push(host.into());
        self
    }

    /// Replaces the candidate host list.
    #[must_use]
    pub fn hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the server port. Defaults to the conventional port for the
    /// TLS mode.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the transport security mode.
    #[must_use]
    pub const fn tls_mode(mut self, mode: TlsMode) -> Self {
        self.tls_mode = mode;
        self
    }

    /// Sets the base DN.
    #[must_use]
    pub fn base_dn(mut self, dn: impl Into<String>) -> Self {
        self.base_dn = Some(dn.into());
        self
    }

    /// Sets the service-account bind DN.
    #[must_use]
    pub fn bind_dn(mut self, dn: impl Into<String>) -> Self {
        self.bind_dn = Some(dn.into());
        self
    }

    /// Sets the service-account bind password.
    #[must_use]
    pub fn bind_password(mut self, password: impl Into<String>) -> Self {
        self.bind_password = Some(password.into());
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the default page size for paged searches.
    #[must_use]
    pub const fn page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error if a required field is missing or
    /// invalid.
    pub fn build(self) -> Result<ConnectionConfig> {
        let tls_mode = self.tls_mode;
        let config = ConnectionConfig {
            hosts: self.hosts,
            port: self.port.unwrap_or_else(|| tls_mode.default_port()),
            tls_mode,
            base_dn: self
                .base_dn
                .ok_or_else(|| DirectoryError::config("base_dn is required"))?,
            bind_dn: self
                .bind_dn
                .ok_or_else(|| DirectoryError::config("bind_dn is required"))?,
            bind_password: self
                .bind_password
                .ok_or_else(|| DirectoryError::config("bind_password is required"))?,
            connect_timeout: self.connect_timeout,
            page_size: self.page_size,
        };
        config.validate()?;
        Ok(config)
    }
}
