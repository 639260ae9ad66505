//! Instagram Error Types
//!
//! Error hierarchy for authorization, credential handling and media fetching.

use std::time::Duration;
use thiserror::Error;

use crate::types::GraphApiError;

/// Root error type for the Instagram integration.
#[derive(Error, Debug)]
pub enum InstagramError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Graph API error: {0}")]
    Api(#[from] GraphApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl InstagramError {
    /// Stable error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "INSTAGRAM_CONFIG",
            Self::Authorization(_) => "INSTAGRAM_AUTH",
            Self::Token(_) => "INSTAGRAM_TOKEN",
            Self::Network(_) => "INSTAGRAM_NETWORK",
            Self::Protocol(_) => "INSTAGRAM_PROTOCOL",
            Self::Api(_) => "INSTAGRAM_API",
            Self::Storage(_) => "INSTAGRAM_STORAGE",
        }
    }

    /// Check if the error can only be resolved by signing in again.
    pub fn needs_reauth(&self) -> bool {
        match self {
            Self::Token(_) => true,
            Self::Authorization(AuthorizationError::AccessDenied { .. }) => true,
            Self::Authorization(AuthorizationError::StateMismatch { .. }) => true,
            // OAuthException is what the Graph API returns for expired or revoked tokens.
            Self::Api(e) => e.error_type == "OAuthException",
            _ => false,
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing configuration")]
    MissingConfig,

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Authorization flow error.
#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("Unable to compose authorization URL")]
    InvalidAuthorizationUrl,

    #[error("Missing authorization code in callback")]
    MissingCode,

    #[error("Unable to process callback URL: {url}")]
    UnableToProcessUrl { url: String },

    #[error("Context died before completion")]
    ContextDied,

    #[error("Authorization cancelled by user")]
    Cancelled,

    #[error("Access denied by user")]
    AccessDenied {
        error: String,
        error_description: Option<String>,
    },

    #[error("State parameter mismatch (possible CSRF attack)")]
    StateMismatch { expected: String, received: String },

    #[error("Authentication surface failed: {message}")]
    PresentationFailed { message: String },
}

/// Credential error.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Missing or expired credentials")]
    MissingCredentials,
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Bad server response: HTTP {status}")]
    BadServerResponse { status: u16 },
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },
}

/// Secure store error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Read failed: {message}")]
    ReadFailed { message: String },

    #[error("Write failed: {message}")]
    WriteFailed { message: String },

    #[error("Delete failed: {message}")]
    DeleteFailed { message: String },

    #[error("Corrupted data: {message}")]
    CorruptedData { message: String },
}

/// Result type for Instagram operations.
pub type InstagramResult<T> = Result<T, InstagramError>;

/// Parse a Graph API error body, flat or wrapped in an `error` envelope.
pub fn parse_error_response(body: &str) -> Option<GraphApiError> {
    #[derive(serde::Deserialize)]
    struct Envelope {
        error: GraphApiError,
    }

    serde_json::from_str::<GraphApiError>(body)
        .ok()
        .or_else(|| serde_json::from_str::<Envelope>(body).ok().map(|e| e.error))
}

/// Create error from a non-2xx Graph API response.
pub fn create_error_from_response(status: u16, body: &str) -> InstagramError {
    match parse_error_response(body) {
        Some(error) => InstagramError::Api(error),
        None => InstagramError::Network(NetworkError::BadServerResponse { status }),
    }
}

/// Get user-friendly error message.
pub fn get_user_message(error: &InstagramError) -> String {
    match error {
        InstagramError::Configuration(_) => {
            "Instagram is not configured correctly for this app.".to_string()
        }
        InstagramError::Token(_) => {
            "Your Instagram session has expired. Please sign in again.".to_string()
        }
        InstagramError::Authorization(AuthorizationError::Cancelled) => {
            "Sign-in was cancelled.".to_string()
        }
        InstagramError::Authorization(AuthorizationError::AccessDenied { .. }) => {
            "Access was denied. Please sign in again and grant the requested permissions."
                .to_string()
        }
        InstagramError::Authorization(AuthorizationError::StateMismatch { .. }) => {
            "Security validation failed. Please restart the sign-in process.".to_string()
        }
        InstagramError::Network(NetworkError::Timeout { .. }) => {
            "The request timed out. Please check your connection and try again.".to_string()
        }
        _ => "Could not reach Instagram. Please try again later.".to_string(),
    }
}
