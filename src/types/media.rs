//! Media Types
//!
//! Graph API media objects, list envelopes and error bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Kind of a media item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "IMAGE")]
    Image,
    #[serde(rename = "VIDEO")]
    Video,
    #[serde(rename = "CAROUSEL_ALBUM")]
    Album,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Album => "CAROUSEL_ALBUM",
        }
    }
}

/// A single media item.
///
/// Only [`MediaType::Album`] items carry `children`. After expansion every
/// child carries its album's caption.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Media {
    /// Server-assigned id, or a local UUID for preview media.
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub caption: Option<String>,
    pub media_url: Url,
    #[serde(default, deserialize_with = "lenient")]
    pub thumbnail_url: Option<Url>,
    #[serde(with = "graph_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub media_type: MediaType,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub children: Vec<Media>,
}

impl Media {
    /// Check if the item is an album.
    pub fn is_album(&self) -> bool {
        self.media_type == MediaType::Album
    }
}

/// Media list envelope returned by `/me/media` and `/{id}/children`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaListResult {
    pub data: Vec<Media>,
    #[serde(default, deserialize_with = "lenient")]
    pub paging: Option<Paging>,
}

impl MediaListResult {
    /// URL of the next page, if the server reported one.
    pub fn next_page(&self) -> Option<&Url> {
        self.paging.as_ref().and_then(|p| p.next.as_ref())
    }
}

/// Paging block of a media list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub cursors: Cursors,
    #[serde(default, deserialize_with = "lenient")]
    pub previous: Option<Url>,
    #[serde(default, deserialize_with = "lenient")]
    pub next: Option<Url>,
}

/// Paging cursors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursors {
    pub after: String,
    pub before: String,
}

/// Structured Graph API error body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (type: {error_type}, code: {code})")]
pub struct GraphApiError {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: i64,
    #[serde(default)]
    pub fbtrace_id: String,
}

/// Decode an optional field, treating malformed values as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Accepts both a bare array and the `{"data": [...]}` form the API uses for nested edges.
fn lenient_vec<'de, D>(deserializer: D) -> Result<Vec<Media>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Children {
        List(Vec<Media>),
        Edge { data: Vec<Media> },
    }

    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match serde_json::from_value::<Children>(value) {
        Ok(Children::List(children)) | Ok(Children::Edge { data: children }) => children,
        Err(_) => Vec::new(),
    })
}

/// Graph API timestamps: `2021-08-10T12:00:00+0000`.
pub mod graph_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_str(raw, FORMAT).map(|t| t.with_timezone(&Utc))
    }
}
