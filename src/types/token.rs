//! Token Types
//!
//! Short-lived access token and persisted credential definitions.

use chrono::{DateTime, Duration, Utc};

use crate::error::{InstagramError, ProtocolError};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Token-exchange endpoint response.
#[derive(Clone, Debug, Deserialize)]
pub struct TemporaryCredential {
    /// Short-lived access token.
    pub access_token: String,
    /// Token type (usually "bearer").
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// Active session credential.
#[derive(Clone)]
pub struct Credential {
    access_token: SecretString,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Create new credential.
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            expires_at,
        }
    }

    /// Convert an exchanged token, anchoring its lifetime at `now`.
    ///
    /// A negative lifetime, or one that overflows the calendar, is rejected.
    pub fn from_temporary(
        temporary: TemporaryCredential,
        now: DateTime<Utc>,
    ) -> Result<Self, InstagramError> {
        let expires_at = Some(temporary.expires_in)
            .filter(|secs| *secs >= 0)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                InstagramError::Protocol(ProtocolError::InvalidResponse {
                    message: format!("invalid expires_in: {}", temporary.expires_in),
                })
            })?;

        Ok(Self::new(temporary.access_token, expires_at))
    }

    /// Expose the token value for an outbound request.
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Check if the credential is expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check if the credential is expired at the given instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub(crate) fn to_record(&self) -> CredentialRecord {
        CredentialRecord {
            access_token: self.access_token.expose_secret().clone(),
            expires: self.expires_at,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Serialized form of a credential in the secure store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CredentialRecord {
    pub access_token: String,
    pub expires: DateTime<Utc>,
}

impl From<CredentialRecord> for Credential {
    fn from(record: CredentialRecord) -> Self {
        Credential::new(record.access_token, record.expires)
    }
}
