//! Secure Storage
//!
//! Opaque keyed byte store used to persist credentials. Entries live in a
//! service namespace, the way platform keychains scope their items.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{InstagramError, StorageError};

/// Secure byte store interface.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Write `bytes` under `key` in `service`, replacing any previous value.
    async fn save(&self, service: &str, key: &str, bytes: Vec<u8>) -> Result<(), InstagramError>;

    /// Read the bytes stored under `key` in `service`.
    async fn load(&self, service: &str, key: &str) -> Result<Option<Vec<u8>>, InstagramError>;

    /// Remove `key` from `service`. Removing a missing key succeeds.
    async fn delete(&self, service: &str, key: &str) -> Result<(), InstagramError>;
}

/// In-memory secure store implementation.
#[derive(Default)]
pub struct InMemorySecureStore {
    entries: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl InMemorySecureStore {
    /// Create new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_key(service: &str, key: &str) -> (String, String) {
        (service.to_string(), key.to_string())
    }
}

#[async_trait]
impl SecureStore for InMemorySecureStore {
    async fn save(&self, service: &str, key: &str, bytes: Vec<u8>) -> Result<(), InstagramError> {
        self.entries
            .lock()
            .unwrap()
            .insert(Self::entry_key(service, key), bytes);
        Ok(())
    }

    async fn load(&self, service: &str, key: &str) -> Result<Option<Vec<u8>>, InstagramError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(&Self::entry_key(service, key)).cloned())
    }

    async fn delete(&self, service: &str, key: &str) -> Result<(), InstagramError> {
        self.entries
            .lock()
            .unwrap()
            .remove(&Self::entry_key(service, key));
        Ok(())
    }
}

/// Mock secure store for testing.
#[derive(Default)]
pub struct MockSecureStore {
    entries: Mutex<HashMap<(String, String), Vec<u8>>>,
    save_history: Mutex<Vec<(String, String)>>,
    delete_history: Mutex<Vec<(String, String)>>,
    should_fail: Mutex<bool>,
}

impl MockSecureStore {
    /// Create new mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set store to fail all operations.
    pub fn set_should_fail(&self, should_fail: bool) -> &Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    /// Pre-populate raw bytes.
    pub fn insert(&self, service: &str, key: &str, bytes: Vec<u8>) -> &Self {
        self.entries
            .lock()
            .unwrap()
            .insert((service.to_string(), key.to_string()), bytes);
        self
    }

    /// Check if an entry exists, bypassing failure injection.
    pub fn contains(&self, service: &str, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .contains_key(&(service.to_string(), key.to_string()))
    }

    /// Raw bytes of an entry, bypassing failure injection.
    pub fn raw(&self, service: &str, key: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .unwrap()
            .get(&(service.to_string(), key.to_string()))
            .cloned()
    }

    /// Get save history.
    pub fn get_save_history(&self) -> Vec<(String, String)> {
        self.save_history.lock().unwrap().clone()
    }

    /// Get delete history.
    pub fn get_delete_history(&self) -> Vec<(String, String)> {
        self.delete_history.lock().unwrap().clone()
    }

    fn check_error(&self, error: impl FnOnce(String) -> StorageError) -> Result<(), InstagramError> {
        if *self.should_fail.lock().unwrap() {
            return Err(InstagramError::Storage(error(
                "Mock storage failure".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SecureStore for MockSecureStore {
    async fn save(&self, service: &str, key: &str, bytes: Vec<u8>) -> Result<(), InstagramError> {
        self.check_error(|message| StorageError::WriteFailed { message })?;

        self.save_history
            .lock()
            .unwrap()
            .push((service.to_string(), key.to_string()));
        self.insert(service, key, bytes);
        Ok(())
    }

    async fn load(&self, service: &str, key: &str) -> Result<Option<Vec<u8>>, InstagramError> {
        self.check_error(|message| StorageError::ReadFailed { message })?;
        Ok(self.raw(service, key))
    }

    async fn delete(&self, service: &str, key: &str) -> Result<(), InstagramError> {
        self.check_error(|message| StorageError::DeleteFailed { message })?;

        self.delete_history
            .lock()
            .unwrap()
            .push((service.to_string(), key.to_string()));
        self.entries
            .lock()
            .unwrap()
            .remove(&(service.to_string(), key.to_string()));
        Ok(())
    }
}
