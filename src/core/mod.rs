//! Core Components
//!
//! Core infrastructure: HTTP transport, state nonces and the authentication surface.

pub mod state;
pub mod surface;
pub mod transport;

pub use state::*;
pub use surface::*;
pub use transport::*;
