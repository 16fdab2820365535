//! Authentication predicate.
//!
//! Callers may supply either a synchronous or an asynchronous predicate.
//! Both are normalized here into [`Authenticator`], so the connection gate
//! only ever awaits a single `Result<bool, AuthError>`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AuthError;

/// Credentials carried by a `LOGIN_REQUEST`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Any additional fields the client sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: Some(password.into()),
            extra: Map::new(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("extra", &self.extra)
            .finish()
    }
}

/// Credential predicate.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// `Ok(true)` grants access, `Ok(false)` rejects, `Err` reports a failure
    /// of the predicate itself.
    async fn authenticate(&self, credentials: &Credentials) -> Result<bool, AuthError>;
}

struct FnAuthenticator<F>(F);

#[async_trait]
impl<F> Authenticator for FnAuthenticator<F>
where
    F: Fn(&Credentials) -> bool + Send + Sync,
{
    async fn authenticate(&self, credentials: &Credentials) -> Result<bool, AuthError> {
        Ok((self.0)(credentials))
    }
}

struct AsyncFnAuthenticator<F>(F);

#[async_trait]
impl<F, Fut> Authenticator for AsyncFnAuthenticator<F>
where
    F: Fn(Credentials) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, AuthError>> + Send,
{
    async fn authenticate(&self, credentials: &Credentials) -> Result<bool, AuthError> {
        (self.0)(credentials.clone()).await
    }
}

/// Wrap a synchronous predicate.
pub fn authenticator_fn<F>(f: F) -> Arc<dyn Authenticator>
where
    F: Fn(&Credentials) -> bool + Send + Sync + 'static,
{
    Arc::new(FnAuthenticator(f))
}

/// Wrap an asynchronous predicate.
pub fn async_authenticator_fn<F, Fut>(f: F) -> Arc<dyn Authenticator>
where
    F: Fn(Credentials) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, AuthError>> + Send + 'static,
{
    Arc::new(AsyncFnAuthenticator(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sync_predicate_is_awaitable() {
        let auth = authenticator_fn(|c| c.login == "admin");
        assert!(auth.authenticate(&Credentials::new("admin", "x")).await.unwrap());
        assert!(!auth.authenticate(&Credentials::new("guest", "x")).await.unwrap());
    }

    #[tokio::test]
    async fn test_async_predicate() {
        let auth = async_authenticator_fn(|c: Credentials| async move {
            tokio::task::yield_now().await;
            Ok(c.password.as_deref() == Some("secret"))
        });
        assert!(auth.authenticate(&Credentials::new("a", "secret")).await.unwrap());
        assert!(!auth.authenticate(&Credentials::new("a", "nope")).await.unwrap());
    }

    #[tokio::test]
    async fn test_async_predicate_failure() {
        let auth = async_authenticator_fn(|_c: Credentials| async move {
            Err(AuthError::Failed("backend down".to_string()))
        });
        let err = auth
            .authenticate(&Credentials::default())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Failed("backend down".to_string()));
    }

    #[test]
    fn test_credentials_deserialize_with_extra_fields() {
        let json = r#"{"login":"ops","password":"pw","otp":"123456"}"#;
        let creds: Credentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.login, "ops");
        assert_eq!(creds.password.as_deref(), Some("pw"));
        assert_eq!(creds.extra["otp"], "123456");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("ops", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("ops"));
        assert!(!debug.contains("hunter2"));
    }
}
