use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;

/// Read a whole file and return its contents as standard base64 with padding.
/// Used for upload payloads such as NEC files.
pub fn encode_file_as_base64(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read file for encoding: {}", path.display()))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}
