//! Credential Store
//!
//! Persists the session credential in a [`SecureStore`] and enforces expiry
//! when it is read back.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{InstagramError, StorageError};
use crate::token::SecureStore;
use crate::types::token::CredentialRecord;
use crate::types::{Credential, InstagramConfig};

/// Credential persistence bound to one service namespace and key.
pub struct CredentialStore<S: SecureStore> {
    store: Arc<S>,
    service: String,
    key: String,
}

impl<S: SecureStore> Clone for CredentialStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            service: self.service.clone(),
            key: self.key.clone(),
        }
    }
}

impl<S: SecureStore> CredentialStore<S> {
    /// Create new credential store.
    pub fn new(store: Arc<S>, service: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            store,
            service: service.into(),
            key: key.into(),
        }
    }

    /// Bind to the namespace and key named by a configuration.
    pub fn for_config(store: Arc<S>, config: &InstagramConfig) -> Self {
        Self::new(
            store,
            config.keychain_service_name.clone(),
            config.keychain_credentials_key.clone(),
        )
    }

    /// Persist the credential. Failures are logged, never returned.
    pub async fn save(&self, credential: &Credential) {
        let bytes = match serde_json::to_vec(&credential.to_record()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(service = %self.service, error = %e, "Failed to encode credential");
                return;
            }
        };

        match self.store.save(&self.service, &self.key, bytes).await {
            Ok(()) => debug!(service = %self.service, "Credential saved"),
            Err(e) => warn!(service = %self.service, error = %e, "Failed to save credential"),
        }
    }

    /// Load the credential.
    ///
    /// Missing, unreadable and undecodable entries load as `None`. An expired
    /// credential is deleted and loads as `None`.
    pub async fn load(&self) -> Option<Credential> {
        let record = match self.read().await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!(service = %self.service, error = %e, "Failed to load credential");
                return None;
            }
        };

        let credential = Credential::from(record);
        if credential.is_expired_at(Utc::now()) {
            debug!(service = %self.service, expired_at = %credential.expires_at, "Purging expired credential");
            self.delete().await;
            return None;
        }

        Some(credential)
    }

    async fn read(&self) -> Result<Option<CredentialRecord>, InstagramError> {
        let bytes = match self.store.load(&self.service, &self.key).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            InstagramError::Storage(StorageError::CorruptedData {
                message: e.to_string(),
            })
        })
    }

    /// Remove the persisted credential. Failures are logged, never returned.
    pub async fn delete(&self) {
        if let Err(e) = self.store.delete(&self.service, &self.key).await {
            warn!(service = %self.service, error = %e, "Failed to delete credential");
        }
    }
}
