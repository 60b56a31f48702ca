//! URLs of the NRG Cloud customer API endpoints.

/// Resolved endpoint URLs for one API base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    /// Bearer token issuance. Client id and secret required.
    pub fn token(&self) -> String {
        self.url("token")
    }

    /// List sites visible to the client
    pub fn sites(&self) -> String {
        self.url("sites")
    }

    /// Convert RLD files to text
    pub fn convert(&self) -> String {
        self.url("data/convert")
    }

    /// Export text or RLD data for a date range
    pub fn export(&self) -> String {
        self.url("data/export")
    }

    pub fn create_export_job(&self) -> String {
        self.url("data/createexportjob")
    }

    pub fn export_job(&self) -> String {
        self.url("data/exportjob")
    }

    pub fn import(&self) -> String {
        self.url("data/import")
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_BASE_URL)
    }
}
