//! Authentication module for NRG Cloud sessions and credentials.
//!
//! This module provides:
//! - `SessionTokenManager`: token acquisition, validation, and renewal
//! - `SessionToken` / `TokenState`: the held token and its validity window
//! - `TokenCache`: the JSON file a token is persisted to between runs
//! - `Credentials` / `CredentialStore`: client id and secret, optionally kept in the OS keychain
//!
//! Tokens are treated as expired 22 hours after issue by default.

pub mod credentials;
pub mod manager;
pub mod session;

pub use credentials::{CredentialStore, Credentials};
pub use manager::{SessionTokenManager, TokenRefresh};
pub use session::{CacheError, SessionToken, TokenCache, TokenState};
