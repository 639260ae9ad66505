//! Authorization Flows
//!
//! Instagram Basic Display sign-in.

pub mod authorization_code;

pub use authorization_code::{
    AuthorizationCodeFlow, AuthorizationCodeFlowImpl, AuthorizationPhase, AuthorizationUrl,
    AUTHORIZATION_SCOPES,
};
