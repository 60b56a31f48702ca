//! NRG Cloud REST API surface shared by endpoint callers.
//!
//! This module provides the endpoint URLs, the `ApiError` type, and the
//! classifier for responses refused with 400/401.
//!
//! All data endpoints require a bearer token obtained from `/token`; see
//! `crate::auth::SessionTokenManager`.

pub mod authorization;
pub mod endpoints;
pub mod error;

pub use authorization::{check_authorization, classify_authorization, is_authorized, Authorization};
pub use endpoints::Endpoints;
pub use error::ApiError;
