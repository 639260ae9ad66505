//! Media Fetch Pipeline
//!
//! Fetches the user's media list, expands every album into its children and
//! merges the results back in root order.

use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

use crate::core::{HttpRequest, HttpTransport};
use crate::error::{
    create_error_from_response, ConfigurationError, InstagramError, ProtocolError, TokenError,
};
use crate::types::{Credential, Media, MediaListResult};

/// Fields requested for root media.
pub const MEDIA_FIELDS: &str = "media_url,thumbnail_url,timestamp,media_type,caption";

/// Fields requested for album children. Captions live on the album only.
pub const CHILDREN_FIELDS: &str = "media_url,thumbnail_url,timestamp,media_type";

/// Graph API media fetcher.
pub struct MediaFetchPipeline<T: HttpTransport> {
    transport: Arc<T>,
    graph_api_url: String,
}

impl<T: HttpTransport> MediaFetchPipeline<T> {
    /// Create new pipeline against a Graph API base URL.
    pub fn new(transport: Arc<T>, graph_api_url: impl Into<String>) -> Self {
        Self {
            transport,
            graph_api_url: graph_api_url.into(),
        }
    }

    /// Fetch the media list with album children resolved.
    ///
    /// Any failed request fails the whole fetch; no partial list is returned.
    #[instrument(skip(self, credential))]
    pub async fn fetch_media(&self, credential: &Credential) -> Result<Vec<Media>, InstagramError> {
        if credential.is_expired() {
            return Err(InstagramError::Token(TokenError::MissingCredentials));
        }

        let root: MediaListResult = self
            .get(&["me", "media"], MEDIA_FIELDS, credential)
            .await?;
        if root.next_page().is_some() {
            debug!("Ignoring further media pages");
        }

        let albums = root.data.iter().filter(|m| m.is_album()).count();
        debug!(items = root.data.len(), albums, "Fetched media list");

        try_join_all(
            root.data
                .into_iter()
                .map(|item| self.resolve(item, credential)),
        )
        .await
    }

    async fn resolve(&self, mut item: Media, credential: &Credential) -> Result<Media, InstagramError> {
        if !item.is_album() {
            return Ok(item);
        }

        let children: MediaListResult = self
            .get(&[item.id.as_str(), "children"], CHILDREN_FIELDS, credential)
            .await?;

        item.children = children
            .data
            .into_iter()
            .map(|mut child| {
                child.caption = item.caption.clone();
                child
            })
            .collect();
        Ok(item)
    }

    fn endpoint(&self, segments: &[&str], fields: &str, credential: &Credential) -> Result<Url, InstagramError> {
        let invalid = || {
            InstagramError::Configuration(ConfigurationError::InvalidUrl {
                url: self.graph_api_url.clone(),
            })
        };

        let mut url = Url::parse(&self.graph_api_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("fields", fields)
            .append_pair("access_token", credential.access_token());
        Ok(url)
    }

    async fn get<R: DeserializeOwned>(
        &self,
        segments: &[&str],
        fields: &str,
        credential: &Credential,
    ) -> Result<R, InstagramError> {
        let url = self.endpoint(segments, fields, credential)?;
        let response = self.transport.send(HttpRequest::get_json(url.as_str())).await?;

        if !response.is_success() {
            return Err(create_error_from_response(response.status, &response.body));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            InstagramError::Protocol(ProtocolError::InvalidJson {
                message: e.to_string(),
            })
        })
    }
}
