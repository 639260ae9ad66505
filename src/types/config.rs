//! Configuration Types
//!
//! Instagram client configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Instagram authorization endpoint.
pub const DEFAULT_AUTHORIZATION_ENDPOINT: &str = "https://api.instagram.com/oauth/authorize";

/// Instagram Graph API base URL.
pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.instagram.com";

/// Default HTTP timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default interval between automatic fetches.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60 * 60;

/// Instagram client configuration.
///
/// Changing the configuration of a running client invalidates its session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstagramConfig {
    /// Backend that performs the token exchange and hosts the redirect target.
    pub server_url: String,
    /// Custom URL scheme the authentication surface intercepts.
    pub callback_scheme: String,
    /// Instagram app client identifier.
    pub client_id: String,
    /// Secure store namespace.
    pub keychain_service_name: String,
    /// Key of the persisted credential within the namespace.
    pub keychain_credentials_key: String,
    /// API endpoints.
    #[serde(default)]
    pub endpoints: ApiEndpoints,
}

impl InstagramConfig {
    /// Create configuration with the default Instagram endpoints.
    pub fn new(
        server_url: impl Into<String>,
        callback_scheme: impl Into<String>,
        client_id: impl Into<String>,
        keychain_service_name: impl Into<String>,
        keychain_credentials_key: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            callback_scheme: callback_scheme.into(),
            client_id: client_id.into(),
            keychain_service_name: keychain_service_name.into(),
            keychain_credentials_key: keychain_credentials_key.into(),
            endpoints: ApiEndpoints::default(),
        }
    }

    /// Configuration of preview instances. Nothing in it is ever dialled.
    pub fn preview() -> Self {
        Self::new("", "", "", "myapp", "mycredentials")
    }

    /// Redirect target registered with Instagram.
    pub fn redirect_uri(&self) -> String {
        format!("{}/authenticated", self.server_url.trim_end_matches('/'))
    }
}

/// Instagram endpoint configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
    /// Authorization endpoint URL.
    pub authorization_endpoint: String,
    /// Graph API base URL.
    pub graph_api_url: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            authorization_endpoint: DEFAULT_AUTHORIZATION_ENDPOINT.to_string(),
            graph_api_url: DEFAULT_GRAPH_API_URL.to_string(),
        }
    }
}

/// Client behaviour options.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Fetch on authentication and on the periodic trigger.
    pub fetch_automatically: bool,
    /// Serve the canned preview dataset instead of calling Instagram.
    pub preview: bool,
    /// Minimum time between automatic fetch attempts.
    pub refresh_interval: Duration,
    /// How often the trigger task asks the interval policy.
    pub check_interval: Duration,
    /// HTTP timeout.
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            fetch_automatically: true,
            preview: false,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            check_interval: Duration::from_secs(60),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
