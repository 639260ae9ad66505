//! State Management
//!
//! OAuth2 state nonce generation and validation.

use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{AuthorizationError, InstagramError};
use crate::types::StateMetadata;

/// State manager interface (for dependency injection).
pub trait StateManager: Send + Sync {
    /// Generate a new state nonce with metadata.
    fn generate(&self, metadata: StateMetadata) -> String;

    /// Validate and consume a state nonce.
    fn consume(&self, state: &str) -> Option<StateMetadata>;

    /// Check if state exists.
    fn exists(&self, state: &str) -> bool;

    /// Forget every outstanding state.
    fn clear(&self);
}

/// In-memory state manager implementation.
pub struct InMemoryStateManager {
    states: Mutex<HashMap<String, StateMetadata>>,
    max_age_ms: u64,
}

impl InMemoryStateManager {
    /// Create new state manager with default TTL (10 minutes).
    pub fn new() -> Self {
        Self::with_max_age(Duration::from_secs(600))
    }

    /// Create state manager with custom TTL.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            max_age_ms: max_age.as_millis() as u64,
        }
    }

    fn generate_random_state() -> String {
        let mut rng = rand::thread_rng();
        let bytes: [u8; 32] = rng.gen();
        base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
    }
}

impl Default for InMemoryStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager for InMemoryStateManager {
    fn generate(&self, metadata: StateMetadata) -> String {
        let state = Self::generate_random_state();
        let mut states = self.states.lock().unwrap();
        states.retain(|_, m| !m.is_expired(self.max_age_ms));
        states.insert(state.clone(), metadata);
        state
    }

    fn consume(&self, state: &str) -> Option<StateMetadata> {
        let mut states = self.states.lock().unwrap();
        let metadata = states.remove(state)?;

        if metadata.is_expired(self.max_age_ms) {
            return None;
        }

        Some(metadata)
    }

    fn exists(&self, state: &str) -> bool {
        let states = self.states.lock().unwrap();
        states
            .get(state)
            .map(|metadata| !metadata.is_expired(self.max_age_ms))
            .unwrap_or(false)
    }

    fn clear(&self) {
        self.states.lock().unwrap().clear();
    }
}

/// Validate state parameter.
pub fn validate_state(
    received: Option<&str>,
    state_manager: &dyn StateManager,
) -> Result<StateMetadata, InstagramError> {
    let received = received.ok_or_else(|| {
        InstagramError::Authorization(AuthorizationError::StateMismatch {
            expected: "state parameter".to_string(),
            received: "missing".to_string(),
        })
    })?;

    state_manager.consume(received).ok_or_else(|| {
        InstagramError::Authorization(AuthorizationError::StateMismatch {
            expected: "valid state".to_string(),
            received: received.to_string(),
        })
    })
}
