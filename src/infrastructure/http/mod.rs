pub mod reqwest_transport;
pub mod session;

#[cfg(test)]
pub mod mock;

use crate::domain::error::Result;
use crate::domain::http_message::{HttpRequest, HttpResponse};
use crate::domain::portal_config::DEFAULT_TIMEOUT_SECS;
use async_trait::async_trait;

pub use reqwest_transport::ReqwestTransport;
pub use session::ScopedSession;

/// The wire seam every portal client talks through.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Releases cookies and pooled connections. Later sends fail.
    fn close(&self);
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub default_headers: Vec<(String, String)>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: concat!("portal-uploader/", env!("CARGO_PKG_VERSION")).to_string(),
            default_headers: Vec::new(),
        }
    }
}
