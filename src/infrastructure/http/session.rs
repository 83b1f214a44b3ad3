use super::Transport;
use crate::domain::error::Result;
use crate::domain::http_message::{HttpRequest, HttpResponse};
use tracing::debug;

/// Owns a transport for the length of a lexical scope and closes it exactly once,
/// whether the scope ends normally, through `?`, or by an explicit `close`.
pub struct ScopedSession {
    transport: Box<dyn Transport>,
    label: &'static str,
    closed: bool,
}

impl ScopedSession {
    pub fn new(transport: Box<dyn Transport>, label: &'static str) -> Self {
        debug!(portal = label, "Session opened");
        Self {
            transport,
            label,
            closed: false,
        }
    }

    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(
            portal = self.label,
            method = ?request.method,
            url = %request.url,
            "Sending request"
        );
        self.transport.send(request).await
    }

    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.transport.close();
            debug!(portal = self.label, "Session closed");
        }
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        self.release();
    }
}
