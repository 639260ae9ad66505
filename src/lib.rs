//! Instagram Integration Module
//!
//! Instagram Basic Display sign-in and media feed client.
//!
//! # Features
//!
//! - Authorization Code Flow with state nonce validation
//! - Backend token exchange (`{server_url}/auth/{code}`)
//! - Credential persistence with expiry enforcement on load
//! - Media fetching with concurrent album expansion
//! - Automatic refetching on a refresh interval
//! - Preview instances serving canned media
//!
//! # Example
//!
//! ```rust,ignore
//! use instagram_integration::{instagram_config, ClientOptions, InstagramClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = instagram_config()
//!         .server_url("https://backend.example.com")
//!         .callback_scheme("myapp")
//!         .client_id("my-client-id")
//!         .keychain_service_name("com.example.myapp")
//!         .keychain_credentials_key("instagram")
//!         .build()?;
//!
//!     let (client, mut requests) = InstagramClient::new(ClientOptions::default())?;
//!     client.configure(Some(config)).await;
//!
//!     // The host shows each authorization page and reports the callback.
//!     tokio::spawn(async move {
//!         while let Some(pending) = requests.recv().await {
//!             println!("Open: {}", pending.url);
//!             pending.complete(read_callback_url());
//!         }
//!     });
//!
//!     client.authorize().await?;
//!
//!     let mut media = client.subscribe_media();
//!     while media.changed().await.is_ok() {
//!         println!("{} items", media.borrow().len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration, credential, callback and media types
//! - `error`: error hierarchy and Graph API error mapping
//! - `core`: HTTP transport, state nonces, authentication surface
//! - `flows`: authorization code flow
//! - `token`: secure storage and the credential store
//! - `media`: media fetch pipeline and preview data
//! - `scheduler`: fetch gating and the automatic trigger
//! - `builders`: fluent configuration builder
//! - `client`: the session orchestrator

pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod flows;
pub mod media;
pub mod scheduler;
pub mod token;
pub mod types;

// Re-export main client
pub use client::{FetchOutcome, InstagramClient};

// Re-export builders
pub use builders::{instagram_config, InstagramConfigBuilder};

// Re-export errors
pub use error::{
    create_error_from_response, get_user_message, parse_error_response, AuthorizationError,
    ConfigurationError, InstagramError, InstagramResult, NetworkError, ProtocolError,
    StorageError, TokenError,
};

// Re-export types
pub use types::{
    // Config
    ApiEndpoints, ClientOptions, InstagramConfig,
    // Token
    Credential, TemporaryCredential,
    // Callback
    CallbackParams, StateMetadata,
    // Media
    Cursors, GraphApiError, Media, MediaListResult, MediaType, Paging,
};

// Re-export core components
pub use core::{
    // Transport
    HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
    // State
    InMemoryStateManager, StateManager,
    // Surface
    AuthenticationSurface, ChannelAuthenticationSurface, MockAuthenticationSurface,
    PendingAuthorization, PresentationError,
};

// Re-export flows
pub use flows::{AuthorizationCodeFlow, AuthorizationCodeFlowImpl, AuthorizationPhase};

// Re-export storage
pub use token::{CredentialStore, InMemorySecureStore, MockSecureStore, SecureStore};

// Re-export media and scheduling
pub use media::{preview_media, MediaFetchPipeline};
pub use scheduler::{FetchAttempt, FetchScheduler, FixedIntervalPolicy, IntervalPolicy};
