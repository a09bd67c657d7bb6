//! Named connection registry.
//!
//! An explicit registry of named directory connections (one per
//! tenant/domain), passed by reference to whatever needs to resolve a
//! connection by name. There is no ambient global state: tests construct
//! an isolated registry per case.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::connection::Connection;
use crate::transport::LdapTransport;

/// A registry of named connections sharing one transport type.
///
/// Each connection is held behind its own async mutex, so independent
/// connections can be driven from separate tasks without shared state.
pub struct ConnectionRegistry<L: LdapTransport> {
    connections: DashMap<String, Arc<Mutex<Connection<L>>>>,
    default_name: RwLock<Option<String>>,
}

impl<L: LdapTransport> ConnectionRegistry<L> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            default_name: RwLock::new(None),
        }
    }

    /// Adds a connection under a name, returning its shared handle.
    ///
    /// The first connection added becomes the default. Adding a second
    /// connection under an existing name replaces it.
    pub fn add(&self, name: impl Into<String>, connection: Connection<L>) -> Arc<Mutex<Connection<L>>> {
        let name = name.into();
        let handle = Arc::new(Mutex::new(connection));
        {
            let mut default_name = self.default_name.write();
            if default_name.is_none() {
                *default_name = Some(name.clone());
            }
        }
        self.connections.insert(name, Arc::clone(&handle));
        handle
    }

    /// Resolves a connection by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Mutex<Connection<L>>>> {
        self.connections.get(name).map(|entry| Arc::clone(&entry))
    }

    /// Resolves the default connection.
    #[must_use]
    pub fn default_connection(&self) -> Option<Arc<Mutex<Connection<L>>>> {
        let name = self.default_name.read().clone()?;
        self.get(&name)
    }

    /// Returns the default connection name.
    #[must_use]
    pub fn default_name(&self) -> Option<String> {
        self.default_name.read().clone()
    }

    /// Marks a registered connection as the default.
    ///
    /// Has no effect when no connection is registered under the name.
    pub fn set_default(&self, name: &str) {
        if self.connections.contains_key(name) {
            *self.default_name.write() = Some(name.to_string());
        }
    }

    /// Removes a connection, returning its handle if it was registered.
    ///
    /// Removing the default connection clears the default.
    pub fn remove(&self, name: &str) -> Option<Arc<Mutex<Connection<L>>>> {
        let removed = self.connections.remove(name).map(|(_, handle)| handle);
        if removed.is_some() {
            let mut default_name = self.default_name.write();
            if default_name.as_deref() == Some(name) {
                *default_name = None;
            }
        }
        removed
    }

    /// Removes every connection and clears the default.
    pub fn flush(&self) {
        self.connections.clear();
        *self.default_name.write() = None;
    }

    /// Lists the registered connection names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Checks whether a name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    /// Returns the number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Checks whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl<L: LdapTransport> Default for ConnectionRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}
