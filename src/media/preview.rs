//! Canned media for preview instances.

use chrono::Utc;
use url::Url;
use uuid::Uuid;

use crate::types::{Media, MediaType};

/// Caption carried by every preview item.
pub const PREVIEW_CAPTION: &str = "Preview image comment";

const PREVIEW_IMAGE_URLS: [&str; 2] = [
    "https://images.unsplash.com/photo-1624374984719-0d146ea066e1?ixid=MnwxMjA3fDB8MHxwaG90by1wYWdlfHx8fGVufDB8fHx8&ixlib=rb-1.2.1&auto=format&fit=crop&w=750&q=80",
    "https://images.unsplash.com/photo-1628547274104-fca69938d030?ixid=MnwxMjA3fDB8MHxwaG90by1wYWdlfHx8fGVufDB8fHx8&ixlib=rb-1.2.1&auto=format&fit=crop&w=400&q=80",
];

/// Two image items with fresh ids, stamped now.
pub fn preview_media() -> Vec<Media> {
    let now = Utc::now();
    PREVIEW_IMAGE_URLS
        .iter()
        .filter_map(|raw| Url::parse(raw).ok())
        .map(|media_url| Media {
            id: Uuid::new_v4().to_string(),
            caption: Some(PREVIEW_CAPTION.to_string()),
            media_url,
            thumbnail_url: None,
            timestamp: now,
            media_type: MediaType::Image,
            children: Vec::new(),
        })
        .collect()
}
