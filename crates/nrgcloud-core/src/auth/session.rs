use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A bearer token together with the moment it was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn new(token: String, issued_at: DateTime<Utc>) -> Self {
        Self { token, issued_at }
    }

    /// `None` when `issued_at + lifetime` is outside the representable range
    pub fn expires_at(&self, lifetime: Duration) -> Option<DateTime<Utc>> {
        self.issued_at.checked_add_signed(lifetime)
    }

    /// Valid strictly before `issued_at + lifetime`. An expiry that cannot be
    /// computed counts as expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>, lifetime: Duration) -> bool {
        self.expires_at(lifetime)
            .map(|expiry| now < expiry)
            .unwrap_or(false)
    }

    pub fn is_valid(&self, lifetime: Duration) -> bool {
        self.is_valid_at(Utc::now(), lifetime)
    }

    pub fn time_until_expiry(&self, lifetime: Duration) -> Option<Duration> {
        self.expires_at(lifetime).map(|expiry| expiry - Utc::now())
    }
}

/// In-memory token held by the session manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TokenState {
    /// No token was obtained, or the last request failed.
    #[default]
    NoToken,
    Issued(SessionToken),
}

impl TokenState {
    pub fn token(&self) -> Option<&SessionToken> {
        match self {
            TokenState::NoToken => None,
            TokenState::Issued(token) => Some(token),
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>, lifetime: Duration) -> bool {
        self.token()
            .map(|t| t.is_valid_at(now, lifetime))
            .unwrap_or(false)
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read token cache {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse token cache {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write token cache {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize token: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// JSON file holding the last issued token.
///
/// The file is shared by convention between runs. There is no locking, so
/// two processes refreshing at once may overwrite each other.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no cache file exists yet.
    pub fn load(&self) -> Result<Option<SessionToken>, CacheError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let token = serde_json::from_str(&contents).map_err(|source| CacheError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(token))
    }

    pub fn save(&self, token: &SessionToken) -> Result<(), CacheError> {
        let write_err = |source| CacheError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let contents = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, contents).map_err(write_err)?;
        Ok(())
    }

    /// Remove the cache file; a missing file is not an error
    pub fn clear(&self) -> Result<(), CacheError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
