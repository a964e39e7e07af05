// Secret Store Port
// Holds the administrator credential used to authorize the network blocker

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

/// Secret store errors
///
/// Messages never include the secret itself.
#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("secret must not be empty")]
    EmptySecret,

    #[error("backend failure: {0}")]
    Backend(String),

    #[error("secret store lock poisoned")]
    LockPoisoned,
}

/// Secret Store trait
///
/// One scoped entry holding exactly one string.
///
/// Implementations:
/// - KeyringSecretStore: OS keyring (macOS Keychain, Linux keyutils)
/// - MemorySecretStore: in-process, for tests
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Save (or replace) the credential
    ///
    /// # Errors
    /// - SecretStoreError::EmptySecret if `secret` is empty
    /// - SecretStoreError::Backend if the backend rejects the write
    async fn save(&self, secret: &SecretString) -> Result<(), SecretStoreError>;

    /// Load the credential. A missing or empty entry is `Ok(None)`.
    async fn load(&self) -> Result<Option<SecretString>, SecretStoreError>;

    /// Delete the credential. Deleting a missing entry succeeds.
    async fn delete(&self) -> Result<(), SecretStoreError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use secrecy::ExposeSecret;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory secret store
    #[derive(Default)]
    pub struct MemorySecretStore {
        secret: Mutex<Option<String>>,
        backend_failure: Option<String>,
        load_count: AtomicUsize,
    }

    impl MemorySecretStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_secret(secret: impl Into<String>) -> Self {
            Self {
                secret: Mutex::new(Some(secret.into())),
                ..Self::default()
            }
        }

        /// Every operation fails with a backend error
        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                backend_failure: Some(message.into()),
                ..Self::default()
            }
        }

        pub fn load_count(&self) -> usize {
            self.load_count.load(Ordering::SeqCst)
        }

        fn check_backend(&self) -> Result<(), SecretStoreError> {
            match &self.backend_failure {
                Some(msg) => Err(SecretStoreError::Backend(msg.clone())),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl SecretStore for MemorySecretStore {
        async fn save(&self, secret: &SecretString) -> Result<(), SecretStoreError> {
            self.check_backend()?;
            let value = secret.expose_secret();
            if value.is_empty() {
                return Err(SecretStoreError::EmptySecret);
            }
            let mut guard = self
                .secret
                .lock()
                .map_err(|_| SecretStoreError::LockPoisoned)?;
            *guard = Some(value.to_string());
            Ok(())
        }

        async fn load(&self) -> Result<Option<SecretString>, SecretStoreError> {
            self.load_count.fetch_add(1, Ordering::SeqCst);
            self.check_backend()?;
            let guard = self
                .secret
                .lock()
                .map_err(|_| SecretStoreError::LockPoisoned)?;
            Ok(guard
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| SecretString::from(s.to_string())))
        }

        async fn delete(&self) -> Result<(), SecretStoreError> {
            self.check_backend()?;
            let mut guard = self
                .secret
                .lock()
                .map_err(|_| SecretStoreError::LockPoisoned)?;
            *guard = None;
            Ok(())
        }
    }
}
