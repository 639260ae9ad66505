//! Authentication Surface
//!
//! The interactive step of the authorization flow. The surface shows the
//! authorization page (browser, webview, system sheet) and returns the
//! callback URL it intercepted on the configured scheme.

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::error::AuthorizationError;

/// Why the surface did not produce a callback URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresentationError {
    /// The user dismissed the surface.
    Cancelled,
    /// The owner of the surface went away before completion.
    ContextDied,
    /// The surface failed for another reason.
    Failed(String),
}

impl From<PresentationError> for AuthorizationError {
    fn from(error: PresentationError) -> Self {
        match error {
            PresentationError::Cancelled => AuthorizationError::Cancelled,
            PresentationError::ContextDied => AuthorizationError::ContextDied,
            PresentationError::Failed(message) => AuthorizationError::PresentationFailed { message },
        }
    }
}

/// Interactive authentication capability.
#[async_trait]
pub trait AuthenticationSurface: Send + Sync {
    /// Present `url` and wait for a redirect on `callback_scheme`.
    async fn present(&self, url: &Url, callback_scheme: &str) -> Result<String, PresentationError>;
}

/// A pending authorization handed to the host application.
#[derive(Debug)]
pub struct PendingAuthorization {
    /// Authorization page to show.
    pub url: Url,
    /// Scheme to intercept.
    pub callback_scheme: String,
    responder: oneshot::Sender<Result<String, PresentationError>>,
}

impl PendingAuthorization {
    /// Complete with the intercepted callback URL.
    pub fn complete(self, callback_url: impl Into<String>) {
        let _ = self.responder.send(Ok(callback_url.into()));
    }

    /// Report that the user dismissed the surface.
    pub fn cancel(self) {
        let _ = self.responder.send(Err(PresentationError::Cancelled));
    }

    /// Report a surface failure.
    pub fn fail(self, message: impl Into<String>) {
        let _ = self.responder.send(Err(PresentationError::Failed(message.into())));
    }
}

/// Surface that forwards requests to the host over a channel.
///
/// Dropping a [`PendingAuthorization`] without answering it, or dropping the
/// receiver, resolves the presentation with [`PresentationError::ContextDied`].
pub struct ChannelAuthenticationSurface {
    sender: mpsc::Sender<PendingAuthorization>,
}

impl ChannelAuthenticationSurface {
    /// Create a surface and the receiver the host listens on.
    pub fn new() -> (Self, mpsc::Receiver<PendingAuthorization>) {
        let (sender, receiver) = mpsc::channel(1);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl AuthenticationSurface for ChannelAuthenticationSurface {
    async fn present(&self, url: &Url, callback_scheme: &str) -> Result<String, PresentationError> {
        let (responder, reply) = oneshot::channel();
        let pending = PendingAuthorization {
            url: url.clone(),
            callback_scheme: callback_scheme.to_string(),
            responder,
        };

        self.sender
            .send(pending)
            .await
            .map_err(|_| PresentationError::ContextDied)?;

        reply.await.map_err(|_| PresentationError::ContextDied)?
    }
}

/// Mock surface for testing.
///
/// Each presentation pops the next scripted reply. With `echo_state` set, the
/// `state` of the presented URL is appended to a successful callback.
#[derive(Default)]
pub struct MockAuthenticationSurface {
    replies: Mutex<Vec<Result<String, PresentationError>>>,
    presented: Mutex<Vec<(Url, String)>>,
    echo_state: bool,
}

impl MockAuthenticationSurface {
    /// Create new mock surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that echoes the presented state back in the callback.
    pub fn echoing_state() -> Self {
        Self {
            echo_state: true,
            ..Self::default()
        }
    }

    /// Script the next reply.
    pub fn push_reply(&self, reply: Result<String, PresentationError>) -> &Self {
        self.replies.lock().unwrap().push(reply);
        self
    }

    /// Get presentation history.
    pub fn get_presented(&self) -> Vec<(Url, String)> {
        self.presented.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthenticationSurface for MockAuthenticationSurface {
    async fn present(&self, url: &Url, callback_scheme: &str) -> Result<String, PresentationError> {
        self.presented
            .lock()
            .unwrap()
            .push((url.clone(), callback_scheme.to_string()));

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Err(PresentationError::ContextDied)
            } else {
                replies.remove(0)
            }
        };

        match reply {
            Ok(callback) if self.echo_state => {
                let state = url
                    .query_pairs()
                    .find(|(k, _)| k == "state")
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default();
                let separator = if callback.contains('?') { '&' } else { '?' };
                Ok(format!("{}{}state={}", callback, separator, state))
            }
            other => other,
        }
    }
}
