use std::fmt;

use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "nrgcloud";

/// Client id and secret issued in the NRG Cloud API setup page.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Both id and secret are non-empty
    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Client secrets kept in the OS keychain, keyed by client id.
pub struct CredentialStore;

impl CredentialStore {
    /// Store a client secret in the OS keychain
    pub fn store(client_id: &str, client_secret: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, client_id)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(client_secret)
            .context("Failed to store client secret in keychain")?;
        Ok(())
    }

    /// Retrieve the secret for a client id from the OS keychain
    pub fn get_secret(client_id: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, client_id)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve client secret from keychain")
    }

    pub fn delete(client_id: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, client_id)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete client secret from keychain")?;
        Ok(())
    }

    /// Check if a secret exists for a client id
    pub fn has_credentials(client_id: &str) -> bool {
        if let Ok(entry) = Entry::new(SERVICE_NAME, client_id) {
            entry.get_password().is_ok()
        } else {
            false
        }
    }
}
