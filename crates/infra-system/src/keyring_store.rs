// OS keyring secret store
// reason: keyring for macOS Keychain / Linux keyutils access; calls are
// blocking, so they run on the blocking pool
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use unplug_core::port::{SecretStore, SecretStoreError};

/// Default keyring service identifier
pub const DEFAULT_SERVICE: &str = "hearthstone-unplug";

/// Default keyring account name
pub const DEFAULT_ACCOUNT: &str = "admin-password";

/// Secret store backed by a single OS keyring entry
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
    account: String,
}

impl KeyringSecretStore {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn entry(service: &str, account: &str) -> Result<keyring::Entry, SecretStoreError> {
        keyring::Entry::new(service, account).map_err(|e| SecretStoreError::Backend(e.to_string()))
    }

    /// Run a keyring call on the blocking pool
    async fn run_blocking<T, F>(&self, f: F) -> Result<T, SecretStoreError>
    where
        T: Send + 'static,
        F: FnOnce(String, String) -> Result<T, SecretStoreError> + Send + 'static,
    {
        let service = self.service.clone();
        let account = self.account.clone();
        tokio::task::spawn_blocking(move || f(service, account))
            .await
            .map_err(|e| SecretStoreError::Backend(format!("keyring task failed: {}", e)))?
    }
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE, DEFAULT_ACCOUNT)
    }
}

/// Missing and empty entries both mean "no credential"
fn map_load_result(
    result: keyring::Result<String>,
) -> Result<Option<SecretString>, SecretStoreError> {
    match result {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(SecretString::from(value))),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(SecretStoreError::Backend(e.to_string())),
    }
}

/// Deleting a missing entry is not an error
fn map_delete_result(result: keyring::Result<()>) -> Result<(), SecretStoreError> {
    match result {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(SecretStoreError::Backend(e.to_string())),
    }
}

#[async_trait]
impl SecretStore for KeyringSecretStore {
    async fn save(&self, secret: &SecretString) -> Result<(), SecretStoreError> {
        if secret.expose_secret().is_empty() {
            return Err(SecretStoreError::EmptySecret);
        }
        let secret = SecretString::from(secret.expose_secret().to_string());

        self.run_blocking(move |service, account| {
            Self::entry(&service, &account)?
                .set_password(secret.expose_secret())
                .map_err(|e| SecretStoreError::Backend(e.to_string()))
        })
        .await?;

        info!(service = %self.service, account = %self.account, "Administrator credential saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<SecretString>, SecretStoreError> {
        let loaded = self
            .run_blocking(|service, account| {
                map_load_result(Self::entry(&service, &account)?.get_password())
            })
            .await?;

        debug!(
            service = %self.service,
            present = loaded.is_some(),
            "Administrator credential lookup"
        );
        Ok(loaded)
    }

    async fn delete(&self) -> Result<(), SecretStoreError> {
        self.run_blocking(|service, account| {
            map_delete_result(Self::entry(&service, &account)?.delete_credential())
        })
        .await?;

        info!(service = %self.service, account = %self.account, "Administrator credential deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[test]
    fn test_default_namespace() {
        let store = KeyringSecretStore::default();
        assert_eq!(store.service(), "hearthstone-unplug");
        assert_eq!(store.account(), "admin-password");
    }

    #[test]
    fn test_load_mapping() {
        let present = map_load_result(Ok("pw".to_string())).unwrap();
        assert_eq!(present.unwrap().expose_secret(), "pw");

        assert!(map_load_result(Ok(String::new())).unwrap().is_none());
        assert!(map_load_result(Err(keyring::Error::NoEntry)).unwrap().is_none());

        let err = map_load_result(Err(keyring::Error::TooLong("user".to_string(), 255)));
        assert!(matches!(err, Err(SecretStoreError::Backend(_))));
    }

    #[test]
    fn test_delete_missing_entry_is_ok() {
        assert_ok!(map_delete_result(Err(keyring::Error::NoEntry)));
        assert_ok!(map_delete_result(Ok(())));
    }

    #[tokio::test]
    async fn test_empty_secret_rejected_before_backend() {
        let store = KeyringSecretStore::new("hs-unplug-test", "nobody");
        let result = store.save(&SecretString::from(String::new())).await;
        assert!(matches!(result, Err(SecretStoreError::EmptySecret)));
    }
}
