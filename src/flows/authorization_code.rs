//! Authorization Code Flow
//!
//! Instagram Basic Display authorization: the user approves the app on the
//! authorization page, Instagram redirects to `{server_url}/authenticated`,
//! and the backend at `{server_url}/auth/{code}` trades the code for a
//! short-lived access token.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::core::{validate_state, AuthenticationSurface, HttpRequest, HttpTransport, StateManager};
use crate::error::{
    AuthorizationError, ConfigurationError, InstagramError, ProtocolError,
};
use crate::types::{CallbackParams, Credential, InstagramConfig, StateMetadata, TemporaryCredential};

/// Scopes requested from Instagram.
pub const AUTHORIZATION_SCOPES: &str = "user_profile,user_media";

/// Where an authorization attempt currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorizationPhase {
    Idle,
    AwaitingCallback,
    Exchanging,
    Authenticated,
    Failed,
}

/// Authorization URL with its state nonce.
#[derive(Clone, Debug)]
pub struct AuthorizationUrl {
    pub url: Url,
    pub state: String,
}

/// Authorization Code Flow interface.
#[async_trait]
pub trait AuthorizationCodeFlow: Send + Sync {
    /// Build the authorization URL with a fresh state nonce.
    fn build_authorization_url(&self) -> Result<AuthorizationUrl, InstagramError>;

    /// Validate the intercepted callback URL and extract the code.
    fn validate_callback(&self, callback_url: &str) -> Result<String, InstagramError>;

    /// Exchange an authorization code for a credential.
    async fn exchange_code(&self, code: &str) -> Result<Credential, InstagramError>;

    /// Run the complete flow through the authentication surface.
    async fn authorize(&self) -> Result<Credential, InstagramError>;
}

/// Authorization Code Flow implementation.
pub struct AuthorizationCodeFlowImpl<T: HttpTransport, S: StateManager, A: AuthenticationSurface> {
    config: InstagramConfig,
    transport: Arc<T>,
    state_manager: Arc<S>,
    surface: Arc<A>,
    phase: Mutex<AuthorizationPhase>,
}

impl<T: HttpTransport, S: StateManager, A: AuthenticationSurface> AuthorizationCodeFlowImpl<T, S, A> {
    /// Create new Authorization Code Flow.
    pub fn new(
        config: InstagramConfig,
        transport: Arc<T>,
        state_manager: Arc<S>,
        surface: Arc<A>,
    ) -> Self {
        Self {
            config,
            transport,
            state_manager,
            surface,
            phase: Mutex::new(AuthorizationPhase::Idle),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> AuthorizationPhase {
        *self.phase.lock().unwrap()
    }

    fn set_phase(&self, phase: AuthorizationPhase) {
        *self.phase.lock().unwrap() = phase;
    }

    fn token_exchange_url(&self, code: &str) -> Result<Url, InstagramError> {
        let invalid = || {
            InstagramError::Configuration(ConfigurationError::InvalidUrl {
                url: self.config.server_url.clone(),
            })
        };

        let mut url = Url::parse(&self.config.server_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("auth")
            .push(code);
        Ok(url)
    }

    async fn run(&self) -> Result<Credential, InstagramError> {
        let authorization = self.build_authorization_url()?;

        self.set_phase(AuthorizationPhase::AwaitingCallback);
        debug!(callback_scheme = %self.config.callback_scheme, "Presenting authorization page");

        let callback = self
            .surface
            .present(&authorization.url, &self.config.callback_scheme)
            .await
            .map_err(|e| InstagramError::Authorization(e.into()))?;

        let code = self.validate_callback(&callback)?;

        self.set_phase(AuthorizationPhase::Exchanging);
        self.exchange_code(&code).await
    }
}

#[async_trait]
impl<T, S, A> AuthorizationCodeFlow for AuthorizationCodeFlowImpl<T, S, A>
where
    T: HttpTransport,
    S: StateManager,
    A: AuthenticationSurface,
{
    fn build_authorization_url(&self) -> Result<AuthorizationUrl, InstagramError> {
        let redirect_uri = self.config.redirect_uri();
        Url::parse(&redirect_uri)
            .map_err(|_| InstagramError::Authorization(AuthorizationError::InvalidAuthorizationUrl))?;

        let mut url = Url::parse(&self.config.endpoints.authorization_endpoint)
            .map_err(|_| InstagramError::Authorization(AuthorizationError::InvalidAuthorizationUrl))?;

        let state = self.state_manager.generate(StateMetadata::new(redirect_uri.clone()));

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &redirect_uri)
            .append_pair("scope", AUTHORIZATION_SCOPES)
            .append_pair("response_type", "code")
            .append_pair("state", &state);

        Ok(AuthorizationUrl { url, state })
    }

    fn validate_callback(&self, callback_url: &str) -> Result<String, InstagramError> {
        let callback = CallbackParams::from_url_str(callback_url).map_err(|_| {
            InstagramError::Authorization(AuthorizationError::UnableToProcessUrl {
                url: callback_url.to_string(),
            })
        })?;

        if let Some(error) = callback.error {
            return Err(InstagramError::Authorization(AuthorizationError::AccessDenied {
                error,
                error_description: callback.error_description,
            }));
        }

        let code = callback
            .code
            .filter(|c| !c.is_empty())
            .ok_or(InstagramError::Authorization(AuthorizationError::MissingCode))?;

        validate_state(callback.state.as_deref(), self.state_manager.as_ref())?;

        Ok(code)
    }

    #[instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str) -> Result<Credential, InstagramError> {
        let url = self.token_exchange_url(code)?;
        let response = self.transport.send(HttpRequest::get_json(url.as_str())).await?;

        if !response.is_success() {
            return Err(InstagramError::Protocol(ProtocolError::UnexpectedStatus {
                status: response.status,
                body: response.body,
            }));
        }

        let temporary: TemporaryCredential = serde_json::from_str(&response.body).map_err(|e| {
            InstagramError::Protocol(ProtocolError::InvalidJson {
                message: e.to_string(),
            })
        })?;

        debug!(token_type = %temporary.token_type, expires_in = temporary.expires_in, "Token exchanged");
        Credential::from_temporary(temporary, Utc::now())
    }

    #[instrument(skip(self), fields(client_id = %self.config.client_id))]
    async fn authorize(&self) -> Result<Credential, InstagramError> {
        match self.run().await {
            Ok(credential) => {
                self.set_phase(AuthorizationPhase::Authenticated);
                info!("Authorization succeeded");
                Ok(credential)
            }
            Err(e) => {
                self.set_phase(AuthorizationPhase::Failed);
                warn!(error = %e, code = e.error_code(), "Authorization failed");
                Err(e)
            }
        }
    }
}
