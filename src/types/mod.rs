//! Instagram Types
//!
//! Core type definitions for configuration, credentials, callbacks and media.

pub mod callback;
pub mod config;
pub mod media;
pub mod token;

pub use callback::*;
pub use config::*;
pub use media::*;
pub use token::*;
