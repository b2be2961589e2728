//! In-crate transports for fetcher and registry tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::FetchError;

pub(crate) fn json_response(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        status_text: String::new(),
        body: serde_json::to_vec(&body).unwrap(),
    }
}

pub(crate) fn status_response(status: u16, status_text: &str, body: &[u8]) -> HttpResponse {
    HttpResponse {
        status,
        status_text: status_text.to_string(),
        body: body.to_vec(),
    }
}

/// Answers requests from a fixed queue, recording what was sent.
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let url = request.url.to_string();
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(FetchError::Transport {
                url,
                message: "no scripted response left".into(),
            })
    }
}

/// Each request waits on its own gate; the test decides when and in which
/// order the gates open.
pub(crate) struct GatedTransport {
    gates: Mutex<VecDeque<oneshot::Receiver<HttpResponse>>>,
    in_flight: AtomicUsize,
}

impl GatedTransport {
    /// Transport with `n` gates, plus the senders that open them in call order.
    pub(crate) fn new(n: usize) -> (Self, Vec<oneshot::Sender<HttpResponse>>) {
        let (senders, receivers): (Vec<_>, VecDeque<_>) =
            (0..n).map(|_| oneshot::channel()).unzip();
        let transport = Self {
            gates: Mutex::new(receivers),
            in_flight: AtomicUsize::new(0),
        };
        (transport, senders)
    }

    /// Requests that have reached the transport so far
    pub(crate) fn calls(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Yield until `n` requests are parked on their gates.
    pub(crate) async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl HttpTransport for GatedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let gate = self.gates.lock().unwrap().pop_front();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let transport_error = |message: &str| FetchError::Transport {
            url: request.url.to_string(),
            message: message.to_string(),
        };
        match gate {
            Some(gate) => gate.await.map_err(|_| transport_error("gate dropped")),
            None => Err(transport_error("no gate left")),
        }
    }
}
