//! Credential Persistence
//!
//! Secure byte storage and the credential store built on it.

pub mod credential_store;
pub mod storage;

pub use credential_store::CredentialStore;
pub use storage::{InMemorySecureStore, MockSecureStore, SecureStore};
