//! Web middleware.

pub mod auth;
pub mod cors;

pub use auth::{
    extract_token, removal_cookie, session_auth, session_cookie, AuthSession, OptionalSession,
};
pub use cors::create_cors_layer;
