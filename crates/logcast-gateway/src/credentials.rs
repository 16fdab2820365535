//! Static login/password authenticator.

use std::collections::HashMap;

use async_trait::async_trait;
use subtle::ConstantTimeEq;

use logcast_protocols::{AuthError, Authenticator, Credentials};

/// Checks credentials against a fixed user table.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    pub fn with_user(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(login.into(), password.into());
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn check(&self, credentials: &Credentials) -> bool {
        match (self.users.get(&credentials.login), &credentials.password) {
            (Some(expected), Some(given)) => bool::from(given.as_bytes().ct_eq(expected.as_bytes())),
            _ => false,
        }
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut logins: Vec<_> = self.users.keys().collect();
        logins.sort();
        f.debug_struct("StaticCredentials")
            .field("users", &logins)
            .finish()
    }
}

#[async_trait]
impl Authenticator for StaticCredentials {
    async fn authenticate(&self, credentials: &Credentials) -> Result<bool, AuthError> {
        Ok(self.check(credentials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StaticCredentials {
        StaticCredentials::default().with_user("admin", "hunter2")
    }

    #[tokio::test]
    async fn test_known_user() {
        let auth = table();
        assert!(auth.authenticate(&Credentials::new("admin", "hunter2")).await.unwrap());
        assert!(!auth.authenticate(&Credentials::new("admin", "hunter3")).await.unwrap());
        assert!(!auth.authenticate(&Credentials::new("admin", "hunter")).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_user_and_missing_password() {
        let auth = table();
        assert!(!auth.authenticate(&Credentials::new("guest", "hunter2")).await.unwrap());

        let no_password = Credentials {
            login: "admin".to_string(),
            ..Credentials::default()
        };
        assert!(!auth.authenticate(&no_password).await.unwrap());
    }

    #[test]
    fn test_debug_hides_passwords() {
        let debug = format!("{:?}", table());
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_password_length_mismatch() {
        let auth = table();
        assert!(!auth.authenticate(&Credentials::new("admin", "hunter22")).await.unwrap());
        assert!(!auth.authenticate(&Credentials::new("admin", "")).await.unwrap());
    }
}
