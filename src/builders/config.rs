//! Configuration Builder
//!
//! Fluent builder for Instagram configuration.

use url::Url;

use crate::error::{ConfigurationError, InstagramError};
use crate::types::{ApiEndpoints, InstagramConfig};

/// Instagram configuration builder.
#[derive(Default)]
pub struct InstagramConfigBuilder {
    server_url: Option<String>,
    callback_scheme: Option<String>,
    client_id: Option<String>,
    keychain_service_name: Option<String>,
    keychain_credentials_key: Option<String>,
    endpoints: ApiEndpoints,
}

impl InstagramConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token exchange backend base URL.
    pub fn server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    /// Set the URL scheme the authentication surface intercepts.
    pub fn callback_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.callback_scheme = Some(scheme.into());
        self
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the secure storage namespace.
    pub fn keychain_service_name(mut self, name: impl Into<String>) -> Self {
        self.keychain_service_name = Some(name.into());
        self
    }

    /// Set the key the credential is stored under.
    pub fn keychain_credentials_key(mut self, key: impl Into<String>) -> Self {
        self.keychain_credentials_key = Some(key.into());
        self
    }

    /// Override the authorization endpoint.
    pub fn authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoints.authorization_endpoint = endpoint.into();
        self
    }

    /// Override the Graph API base URL.
    pub fn graph_api_url(mut self, url: impl Into<String>) -> Self {
        self.endpoints.graph_api_url = url.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<InstagramConfig, InstagramError> {
        let server_url = required("server_url", self.server_url)?;
        let callback_scheme = required("callback_scheme", self.callback_scheme)?;
        let client_id = required("client_id", self.client_id)?;
        let keychain_service_name = required("keychain_service_name", self.keychain_service_name)?;
        let keychain_credentials_key =
            required("keychain_credentials_key", self.keychain_credentials_key)?;

        for url in [
            &server_url,
            &self.endpoints.authorization_endpoint,
            &self.endpoints.graph_api_url,
        ] {
            Url::parse(url).map_err(|_| {
                InstagramError::Configuration(ConfigurationError::InvalidUrl { url: url.clone() })
            })?;
        }

        Ok(InstagramConfig {
            server_url,
            callback_scheme,
            client_id,
            keychain_service_name,
            keychain_credentials_key,
            endpoints: self.endpoints,
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, InstagramError> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| {
        InstagramError::Configuration(ConfigurationError::MissingRequired {
            field: field.to_string(),
        })
    })
}

/// Create a new Instagram configuration builder.
pub fn instagram_config() -> InstagramConfigBuilder {
    InstagramConfigBuilder::new()
}
