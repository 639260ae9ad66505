//! Callback Types
//!
//! Types for handling the authorization redirect.

use url::Url;

/// Callback parameters from the authorization redirect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code (if success).
    pub code: Option<String>,
    /// State parameter.
    pub state: Option<String>,
    /// Error code (if authorization failed).
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse callback parameters from URL.
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();

        // Instagram appends "#_" to the redirect; it lands in the fragment, not the code.
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                "error_description" => params.error_description = Some(value.into_owned()),
                _ => {}
            }
        }

        params
    }

    /// Parse callback parameters from URL string.
    pub fn from_url_str(url_str: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(url_str)?;
        Ok(Self::from_url(&url))
    }

    /// Check if callback contains an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// State metadata stored during the authorization flow.
#[derive(Clone, Debug)]
pub struct StateMetadata {
    /// Redirect URI used in the authorization request.
    pub redirect_uri: String,
    /// Creation timestamp (Unix milliseconds).
    pub created_at: u64,
}

impl StateMetadata {
    /// Create new state metadata.
    pub fn new(redirect_uri: String) -> Self {
        Self {
            redirect_uri,
            created_at: now_ms(),
        }
    }

    /// Check if state has expired.
    pub fn is_expired(&self, max_age_ms: u64) -> bool {
        now_ms().saturating_sub(self.created_at) > max_age_ms
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
