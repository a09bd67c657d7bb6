//! Authentication guard.
//!
//! [`Guard`] performs bind exchanges on a borrowed [`Connection`]. The
//! two entry points are type-distinguished: [`Guard::attempt`] reports
//! rejected credentials as `Ok(false)` and reserves `Err` for propagated
//! failures, while [`Guard::bind`] errors on any bind failure.
//!
//! Unless asked to stay bound as the user, a successful or failed
//! attempt rebinds the connection as the configured service account so
//! subsequent operations run with its rights. That rebind is itself
//! fallible and raises its own bind error, distinct from the user's
//! credential outcome.
//!
//! Passwords are never logged.

use crate::connection::{BoundAs, Connection};
use crate::error::{DetailedError, DirectoryError, Result};
use crate::transport::LdapTransport;

/// Authentication operations on a borrowed connection.
pub struct Guard<'a, L: LdapTransport> {
    conn: &'a mut Connection<L>,
}

impl<'a, L: LdapTransport> Guard<'a, L> {
    pub(crate) fn new(conn: &'a mut Connection<L>) -> Self {
        Self { conn }
    }

    /// Validates end-user credentials.
    ///
    /// Binds as `(username, password)`. On success, the connection is
    /// rebound as the service account unless `stay_bound` is set, and
    /// `Ok(true)` is returned. Rejected credentials yield `Ok(false)` —
    /// after the same mandatory service-account rebind.
    ///
    /// ## Errors
    ///
    /// - [`DirectoryError::UsernameRequired`] /
    ///   [`DirectoryError::PasswordRequired`] on empty input, before any
    ///   transport I/O.
    /// - Any transport failure reaching the server.
    /// - A failed service-account rebind, regardless of whether the
    ///   user's own bind succeeded.
    pub async fn attempt(
        &mut self,
        username: &str,
        password: &str,
        stay_bound: bool,
    ) -> Result<bool> {
        if username.is_empty() {
            return Err(DirectoryError::UsernameRequired);
        }
        if password.is_empty() {
            return Err(DirectoryError::PasswordRequired);
        }

        let response = self.conn.raw_bind(username, password).await?;
        let authenticated = response.is_success();

        if authenticated {
            self.conn.set_bound(BoundAs::User(username.to_string()));
            tracing::debug!(username, "user bind succeeded");
        } else {
            self.conn.set_bound(BoundAs::None);
            let detail = DetailedError::from(response);
            let condition = self.conn.classify(&detail);
            tracing::debug!(username, ?condition, %detail, "user bind rejected");
        }

        if !stay_bound {
            self.bind_as_configured_user().await?;
        }

        Ok(authenticated)
    }

    /// Binds as the given identity, erroring on any failure.
    ///
    /// ## Errors
    ///
    /// Returns the classified bind error carrying the server's
    /// [`DetailedError`] when the bind is rejected, and validation
    /// errors for empty operands.
    pub async fn bind(&mut self, dn: &str, password: &str) -> Result<()> {
        if dn.is_empty() {
            return Err(DirectoryError::UsernameRequired);
        }
        if password.is_empty() {
            return Err(DirectoryError::PasswordRequired);
        }

        let response = self.conn.raw_bind(dn, password).await?;
        if response.is_success() {
            self.conn.set_bound(BoundAs::User(dn.to_string()));
            Ok(())
        } else {
            self.conn.set_bound(BoundAs::None);
            Err(self.conn.bind_error(response))
        }
    }

    /// Rebinds as the configured service account.
    ///
    /// ## Errors
    ///
    /// Returns the classified bind error when the service account is
    /// rejected.
    pub async fn bind_as_configured_user(&mut self) -> Result<()> {
        let dn = self.conn.config().bind_dn.clone();
        let password = self.conn.config().bind_password.clone();

        let response = self.conn.raw_bind(&dn, &password).await?;
        if response.is_success() {
            self.conn.set_bound(BoundAs::ServiceAccount);
            Ok(())
        } else {
            self.conn.set_bound(BoundAs::None);
            Err(self.conn.bind_error(response))
        }
    }
}
