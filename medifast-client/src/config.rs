//! Client configuration

use std::path::PathBuf;

/// Configuration for connecting to the Medifast backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:5000")
    pub base_url: String,

    /// Bearer token for authenticated requests and the realtime channel
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Realtime channel TCP address (host:port)
    pub realtime_addr: Option<String>,

    /// Directory backing the device key-value store
    pub storage_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a new client configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: 30,
            realtime_addr: None,
            storage_dir: None,
        }
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the realtime channel address
    pub fn with_realtime_addr(mut self, addr: impl Into<String>) -> Self {
        self.realtime_addr = Some(addr.into());
        self
    }

    /// Set the local storage directory
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> super::HttpClient {
        super::HttpClient::new(self)
    }

    /// Create the device key-value store from this configuration
    pub fn build_storage(&self) -> Option<super::FileStore> {
        self.storage_dir.as_ref().map(super::FileStore::new)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:5000")
    }
}
