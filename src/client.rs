//! Instagram Client
//!
//! Session orchestrator: owns the configuration and credential, drives
//! authorization and fetching, and publishes authentication and media state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

use crate::core::{
    AuthenticationSurface, ChannelAuthenticationSurface, HttpTransport, InMemoryStateManager,
    PendingAuthorization, ReqwestHttpTransport, StateManager, DEFAULT_MAX_RESPONSE_SIZE,
};
use crate::error::{AuthorizationError, ConfigurationError, InstagramError};
use crate::flows::{AuthorizationCodeFlow, AuthorizationCodeFlowImpl, AuthorizationPhase};
use crate::media::{preview_media, MediaFetchPipeline};
use crate::scheduler::FetchScheduler;
use crate::token::{CredentialStore, InMemorySecureStore, SecureStore};
use crate::types::{ClientOptions, Credential, InstagramConfig, Media};

/// Result of a [`InstagramClient::fetch`] call.
#[derive(Debug)]
pub enum FetchOutcome {
    /// No configuration is set.
    MissingConfig,
    /// No credential is active.
    NotAuthenticated,
    /// The scheduler judged the fetch unnecessary.
    NotDue,
    /// Canned preview media were published.
    Preview { count: usize },
    /// Fetched media were published.
    Published { count: usize },
    /// The session changed while fetching; the result was dropped.
    Stale,
    /// The fetch failed; published media are unchanged.
    Failed(InstagramError),
}

impl FetchOutcome {
    /// Whether media were published.
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Preview { .. } | Self::Published { .. })
    }
}

struct Session<S: SecureStore> {
    config: Option<InstagramConfig>,
    credential: Option<Credential>,
    store: Option<CredentialStore<S>>,
    // Bumped whenever the session is replaced; in-flight work compares it
    // before publishing.
    generation: u64,
}

type Flow<T, A> = AuthorizationCodeFlowImpl<T, InMemoryStateManager, A>;

/// Instagram client.
pub struct InstagramClient<
    T: HttpTransport = ReqwestHttpTransport,
    S: SecureStore = InMemorySecureStore,
    A: AuthenticationSurface = ChannelAuthenticationSurface,
> {
    this: Weak<Self>,
    transport: Arc<T>,
    secure_store: Arc<S>,
    surface: Arc<A>,
    state_manager: Arc<InMemoryStateManager>,
    options: ClientOptions,
    fetch_automatically: AtomicBool,
    session: Mutex<Session<S>>,
    flow: Mutex<Option<Arc<Flow<T, A>>>>,
    scheduler: FetchScheduler,
    media_tx: watch::Sender<Vec<Media>>,
    authenticated_tx: watch::Sender<bool>,
}

impl InstagramClient<ReqwestHttpTransport, InMemorySecureStore, ChannelAuthenticationSurface> {
    /// Create a client with default implementations.
    ///
    /// Authorization requests arrive on the returned receiver; the host shows
    /// each one and answers it with the intercepted callback URL.
    pub fn new(
        options: ClientOptions,
    ) -> Result<(Arc<Self>, mpsc::Receiver<PendingAuthorization>), InstagramError> {
        let transport = ReqwestHttpTransport::with_options(options.timeout, DEFAULT_MAX_RESPONSE_SIZE)?;
        let (surface, requests) = ChannelAuthenticationSurface::new();

        let client = Self::with_components(
            Arc::new(transport),
            Arc::new(InMemorySecureStore::new()),
            Arc::new(surface),
            options,
        );
        Ok((client, requests))
    }

    /// Create a configured preview client serving canned media.
    pub async fn preview() -> Result<Arc<Self>, InstagramError> {
        let (client, _requests) = Self::new(ClientOptions {
            preview: true,
            fetch_automatically: true,
            ..ClientOptions::default()
        })?;
        client.configure(Some(InstagramConfig::preview())).await;
        Ok(client)
    }
}

impl<T, S, A> InstagramClient<T, S, A>
where
    T: HttpTransport + 'static,
    S: SecureStore + 'static,
    A: AuthenticationSurface + 'static,
{
    /// Create a client with custom implementations.
    pub fn with_components(
        transport: Arc<T>,
        secure_store: Arc<S>,
        surface: Arc<A>,
        options: ClientOptions,
    ) -> Arc<Self> {
        let (media_tx, _) = watch::channel(Vec::new());
        let (authenticated_tx, _) = watch::channel(options.preview);

        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            transport,
            secure_store,
            surface,
            state_manager: Arc::new(InMemoryStateManager::new()),
            fetch_automatically: AtomicBool::new(options.fetch_automatically),
            scheduler: FetchScheduler::with_intervals(options.refresh_interval, options.check_interval),
            options,
            session: Mutex::new(Session {
                config: None,
                credential: None,
                store: None,
                generation: 0,
            }),
            flow: Mutex::new(None),
            media_tx,
            authenticated_tx,
        })
    }

    /// Current configuration.
    pub fn config(&self) -> Option<InstagramConfig> {
        self.session.lock().unwrap().config.clone()
    }

    /// Client options.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Expiry of the active credential.
    pub fn credential_expires_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.session
            .lock()
            .unwrap()
            .credential
            .as_ref()
            .map(|c| c.expires_at)
    }

    /// Phase of the latest authorization attempt under the current configuration.
    pub fn phase(&self) -> AuthorizationPhase {
        self.flow
            .lock()
            .unwrap()
            .as_ref()
            .map_or(AuthorizationPhase::Idle, |flow| flow.phase())
    }

    /// Currently published media.
    pub fn media(&self) -> Vec<Media> {
        self.media_tx.borrow().clone()
    }

    /// Observe published media.
    pub fn subscribe_media(&self) -> watch::Receiver<Vec<Media>> {
        self.media_tx.subscribe()
    }

    /// Whether a credential is active (always true for preview clients).
    pub fn is_authenticated(&self) -> bool {
        *self.authenticated_tx.borrow()
    }

    /// Observe the authentication state.
    pub fn subscribe_authenticated(&self) -> watch::Receiver<bool> {
        self.authenticated_tx.subscribe()
    }

    /// Whether media are fetched automatically while authenticated.
    pub fn fetch_automatically(&self) -> bool {
        self.fetch_automatically.load(Ordering::SeqCst)
    }

    /// Enable or disable automatic fetching.
    pub fn set_fetch_automatically(&self, enabled: bool) {
        self.fetch_automatically.store(enabled, Ordering::SeqCst);
        self.sync_session_state();
    }

    /// Whether the automatic fetch trigger is armed.
    pub fn is_fetch_scheduled(&self) -> bool {
        self.scheduler.is_on()
    }

    /// Set or replace the configuration.
    ///
    /// An unchanged configuration is ignored. Otherwise the credential store is
    /// rebound and its credential loaded. Replacing a configuration clears the
    /// published media; the first configuration triggers an initial fetch.
    #[instrument(skip(self, config), fields(configured = config.is_some()))]
    pub async fn configure(&self, config: Option<InstagramConfig>) {
        let (store, had_config, generation) = {
            let mut session = self.session.lock().unwrap();
            if session.config == config {
                debug!("Configuration unchanged");
                return;
            }

            let had_config = session.config.is_some();
            session.store = config
                .as_ref()
                .map(|c| CredentialStore::for_config(self.secure_store.clone(), c));
            session.config = config;
            session.credential = None;
            session.generation += 1;
            (session.store.clone(), had_config, session.generation)
        };

        self.state_manager.clear();
        *self.flow.lock().unwrap() = None;
        self.sync_session_state();

        let loaded = match &store {
            Some(store) => store.load().await,
            None => None,
        };

        {
            let mut session = self.session.lock().unwrap();
            if session.generation != generation {
                debug!("Configuration replaced while loading credential");
                return;
            }
            session.credential = loaded;
        }
        self.sync_session_state();
        info!(authenticated = self.is_authenticated(), "Configured");

        if had_config {
            self.media_tx.send_replace(Vec::new());
            if self.is_authenticated() && self.fetch_automatically() {
                self.fetch(true).await;
            }
        } else {
            self.fetch(true).await;
        }
    }

    /// Sign in through the authentication surface.
    ///
    /// On success the credential is persisted and activated, and media are
    /// fetched before returning when automatic fetching is enabled.
    #[instrument(skip(self))]
    pub async fn authorize(&self) -> Result<(), InstagramError> {
        let (config, generation) = {
            let session = self.session.lock().unwrap();
            let config = session
                .config
                .clone()
                .ok_or(InstagramError::Configuration(ConfigurationError::MissingConfig))?;
            (config, session.generation)
        };

        let flow = Arc::new(AuthorizationCodeFlowImpl::new(
            config,
            self.transport.clone(),
            self.state_manager.clone(),
            self.surface.clone(),
        ));
        *self.flow.lock().unwrap() = Some(flow.clone());

        let credential = flow.authorize().await?;

        let store = {
            let mut session = self.session.lock().unwrap();
            if session.generation != generation {
                warn!("Configuration changed during authorization; discarding credential");
                return Err(InstagramError::Authorization(AuthorizationError::ContextDied));
            }
            session.credential = Some(credential.clone());
            session.generation += 1;
            session.store.clone()
        };

        if let Some(store) = store {
            store.save(&credential).await;
        }
        self.sync_session_state();

        if self.fetch_automatically() {
            self.fetch(true).await;
        }
        Ok(())
    }

    /// Fetch and publish media.
    ///
    /// Failures are logged and returned in the outcome; published media are
    /// left untouched.
    #[instrument(skip(self))]
    pub async fn fetch(&self, force: bool) -> FetchOutcome {
        let (config, credential, generation) = {
            let session = self.session.lock().unwrap();
            (
                session.config.clone(),
                session.credential.clone(),
                session.generation,
            )
        };

        if self.options.preview {
            let media = preview_media();
            let count = media.len();
            self.media_tx.send_replace(media);
            return FetchOutcome::Preview { count };
        }

        let config = match config {
            Some(config) => config,
            None => return FetchOutcome::MissingConfig,
        };

        let credential = match credential {
            Some(credential) => credential,
            None => return FetchOutcome::NotAuthenticated,
        };

        let cache_empty = self.media_tx.borrow().is_empty();
        if !self.scheduler.should_fetch(force, cache_empty) {
            debug!("Fetch not due");
            return FetchOutcome::NotDue;
        }

        let attempt = self.scheduler.begin();
        let pipeline = MediaFetchPipeline::new(self.transport.clone(), config.endpoints.graph_api_url);

        match pipeline.fetch_media(&credential).await {
            Ok(media) => {
                attempt.completed();

                let session = self.session.lock().unwrap();
                if session.generation != generation {
                    debug!("Session changed during fetch; dropping result");
                    return FetchOutcome::Stale;
                }
                let count = media.len();
                self.media_tx.send_replace(media);
                info!(count, "Published media");
                FetchOutcome::Published { count }
            }
            Err(e) => {
                attempt.failed();
                warn!(error = %e, code = e.error_code(), needs_reauth = e.needs_reauth(), "Media fetch failed");
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Sign out locally.
    ///
    /// Stops automatic fetching, clears published media and purges the
    /// persisted credential. Nothing is revoked server-side.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let store = {
            let mut session = self.session.lock().unwrap();
            session.credential = None;
            session.generation += 1;
            session.store.clone()
        };

        self.sync_session_state();
        self.media_tx.send_replace(Vec::new());

        if let Some(store) = store {
            store.delete().await;
        }
        info!("Logged out");
    }

    fn sync_session_state(&self) {
        let has_credential = self.session.lock().unwrap().credential.is_some();
        let authenticated = self.options.preview || has_credential;

        self.authenticated_tx.send_if_modified(|current| {
            let changed = *current != authenticated;
            *current = authenticated;
            changed
        });

        let armed = authenticated && self.fetch_automatically();
        let this = self.this.clone();
        self.scheduler.set_on(armed, move || {
            if let Some(client) = this.upgrade() {
                tokio::spawn(async move {
                    client.fetch(false).await;
                });
            }
        });
    }
}
