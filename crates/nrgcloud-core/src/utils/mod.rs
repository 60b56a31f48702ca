//! Utility functions shared by endpoint callers.

pub mod encoding;

pub use encoding::encode_file_as_base64;
