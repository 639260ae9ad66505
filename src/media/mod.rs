//! Media
//!
//! Graph API media fetching and preview data.

pub mod pipeline;
pub mod preview;

pub use pipeline::{MediaFetchPipeline, CHILDREN_FIELDS, MEDIA_FIELDS};
pub use preview::{preview_media, PREVIEW_CAPTION};
