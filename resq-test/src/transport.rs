use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use resq_client::{ClientError, Transport, TransportFuture, WireRequest};
use serde_json::{json, Value};
use tokio::sync::Semaphore;

/// Scripted [`Transport`] for client tests.
///
/// Responses are returned in the order they were pushed; every request is
/// recorded before it waits on the gate, so a held request is observable.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Value, ClientError>>>,
    requests: Mutex<Vec<WireRequest>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a JSON payload.
    pub fn push_json(&self, payload: Value) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(payload));
        self
    }

    /// Queue a failure.
    pub fn push_error(&self, error: ClientError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Make subsequent requests wait until [`release`](Self::release) is called.
    pub fn hold(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` held requests proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            gate.add_permits(n);
        }
    }

    /// Stop holding requests; waiting ones proceed.
    pub fn open(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.close();
        }
    }

    pub fn requests(&self) -> Vec<WireRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<WireRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl Transport for MockTransport {
    fn send<'a>(&'a self, request: &'a WireRequest) -> TransportFuture<'a> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                // A closed gate means `open()` was called.
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Transport("no scripted response".into())))
        })
    }
}

/// Build a `{ data, meta }` payload.
pub fn page_payload(data: Value, current_page: u64, last_page: u64, per_page: u64, total: u64) -> Value {
    json!({
        "data": data,
        "meta": {
            "current_page": current_page,
            "last_page": last_page,
            "per_page": per_page,
            "total": total,
        }
    })
}
