use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct AuthInner {
    api_key: RwLock<Option<String>>,
    revoked: Notify,
}

/// Credentials shared by every request, plus the global 401 signal.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    inner: Arc<AuthInner>,
}

impl AuthState {
    pub fn new(api_key: Option<String>) -> Self {
        let state = Self::default();
        state.set(api_key);
        state
    }

    pub fn set(&self, api_key: Option<String>) {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        *self
            .inner
            .api_key
            .write()
            .unwrap_or_else(PoisonError::into_inner) = api_key;
    }

    pub fn api_key(&self) -> Option<String> {
        self.inner
            .api_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_key().is_some()
    }

    /// Clears the key after a 401. Returns true only for the call that
    /// actually removed it, so concurrent 401s raise a single signal.
    pub fn revoke(&self) -> bool {
        let removed = self
            .inner
            .api_key
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if removed {
            self.inner.revoked.notify_one();
        }
        removed
    }

    /// Resolves once per revocation.
    pub async fn revoked(&self) {
        self.inner.revoked.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_counts_as_logged_out() {
        let auth = AuthState::new(Some("  ".to_string()));
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn revoke_signals_once() {
        let auth = AuthState::new(Some("key".to_string()));
        assert!(auth.revoke());
        assert!(!auth.revoke());
        assert_eq!(auth.api_key(), None);

        // The stored permit makes the wait resolve immediately.
        tokio::time::timeout(std::time::Duration::from_secs(1), auth.revoked())
            .await
            .unwrap();
    }
}
