//! Credential store: fixed user table and node-local session tokens.
//!
//! Passwords are compared as salted SHA-256 digests against a table
//! preloaded at startup. Tokens are opaque UUIDv4 strings, unique within
//! the process lifetime; sessions are node-local, so no cross-process
//! collision avoidance is needed. Cluster-wide login exclusivity is
//! enforced by the session manager, not here.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::AuthError;

#[derive(Debug, Clone)]
struct PasswordRecord {
    salt: String,
    digest: String,
}

impl PasswordRecord {
    fn derive(password: &str) -> Self {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = hash_password(&salt, password);
        Self { salt, digest }
    }

    fn matches(&self, password: &str) -> bool {
        self.digest == hash_password(&self.salt, password)
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

// ----------------------------------------------------------------------------
// Credential Store
// ----------------------------------------------------------------------------

/// Verifies credentials and issues, validates, and revokes session tokens.
#[derive(Debug, Default)]
pub struct CredentialStore {
    users: HashMap<String, PasswordRecord>,
    /// Live sessions, token -> username. At most one entry per username.
    sessions: HashMap<String, String>,
}

impl CredentialStore {
    /// An empty store with no users.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The fixed demo user table every node ships with.
    pub fn with_seed_users() -> Self {
        let mut store = Self::empty();
        for (username, password) in [
            ("admin", "admin123"),
            ("user1", "password1"),
            ("user2", "password2"),
            ("test", "test"),
        ] {
            store.insert_user(username, password);
        }
        store
    }

    /// Add a user to the table. Returns `false` if the username is taken.
    pub fn insert_user(&mut self, username: &str, password: &str) -> bool {
        if self.users.contains_key(username) {
            return false;
        }
        self.users
            .insert(username.to_string(), PasswordRecord::derive(password));
        true
    }

    /// Verify credentials and issue a session token.
    ///
    /// Any previous token for the same username is revoked first, keeping
    /// the one-live-token-per-username invariant on this node.
    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<String, AuthError> {
        let record = self
            .users
            .get(username)
            .ok_or(AuthError::InvalidCredentials)?;
        if !record.matches(password) {
            return Err(AuthError::InvalidCredentials);
        }

        self.sessions.retain(|_, user| user != username);

        let token = Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), username.to_string());
        Ok(token)
    }

    /// Resolve a token to its username, if the session is live.
    pub fn validate(&self, token: &str) -> Option<&str> {
        self.sessions.get(token).map(String::as_str)
    }

    /// Destroy a session. Returns `false` if the token was not live.
    pub fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticate_issues_token_for_valid_credentials() {
        let mut store = CredentialStore::with_seed_users();
        let token = store.authenticate("admin", "admin123").unwrap();
        assert_eq!(store.validate(&token), Some("admin"));
    }

    #[test]
    fn authenticate_rejects_wrong_password_and_unknown_user() {
        let mut store = CredentialStore::with_seed_users();
        assert!(matches!(
            store.authenticate("admin", "nope"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            store.authenticate("ghost", "admin123"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn tokens_are_unique_per_call() {
        let mut store = CredentialStore::with_seed_users();
        let first = store.authenticate("test", "test").unwrap();
        let second = store.authenticate("test", "test").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn reauthentication_revokes_the_previous_token() {
        let mut store = CredentialStore::with_seed_users();
        let first = store.authenticate("user1", "password1").unwrap();
        let second = store.authenticate("user1", "password1").unwrap();
        assert_eq!(store.validate(&first), None);
        assert_eq!(store.validate(&second), Some("user1"));
    }

    #[test]
    fn revoke_destroys_the_session() {
        let mut store = CredentialStore::with_seed_users();
        let token = store.authenticate("user2", "password2").unwrap();
        assert!(store.revoke(&token));
        assert_eq!(store.validate(&token), None);
        assert!(!store.revoke(&token));
    }

    #[test]
    fn insert_user_refuses_duplicates() {
        let mut store = CredentialStore::empty();
        assert!(store.insert_user("alice", "secret"));
        assert!(!store.insert_user("alice", "other"));
        assert!(store.authenticate("alice", "secret").is_ok());
    }
}
