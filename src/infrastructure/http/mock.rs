use super::Transport;
use crate::domain::error::{AppError, Result};
use crate::domain::http_message::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    responses: VecDeque<HttpResponse>,
    requests: Vec<HttpRequest>,
    closes: usize,
}

/// Scripted transport. Clones share state so a test can keep a handle after
/// boxing one into a client.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: u16, url: &str, body: &str) {
        self.state().responses.push_back(HttpResponse {
            status,
            url: url.to_string(),
            body: body.to_string(),
        });
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state().requests.clone()
    }

    pub fn close_count(&self) -> usize {
        self.state().closes
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut state = self.state();
        let url = request.url.clone();
        state.requests.push(request);
        state
            .responses
            .pop_front()
            .ok_or_else(|| AppError::TransportError(format!("No scripted response for {}", url)))
    }

    fn close(&self) {
        self.state().closes += 1;
    }
}
