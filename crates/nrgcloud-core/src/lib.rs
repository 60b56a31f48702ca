//! Core library for the NRG Cloud customer API.
//!
//! This crate obtains, caches, validates, and refreshes the bearer token
//! used to authorize calls to the NRG Cloud REST endpoints, and provides
//! the small helpers endpoint callers need (authorization classification,
//! file payload encoding, endpoint URLs).
//!
//! The crate never writes to stdout; everything it has to say is emitted
//! as `tracing` events for the caller's subscriber to present.

pub mod api;
pub mod auth;
pub mod config;
pub mod utils;

pub use api::{
    check_authorization, classify_authorization, is_authorized, ApiError, Authorization, Endpoints,
};
pub use auth::{
    CacheError, CredentialStore, Credentials, SessionToken, SessionTokenManager, TokenCache,
    TokenRefresh, TokenState,
};
pub use config::{CloudConfig, Config};
pub use utils::encode_file_as_base64;
