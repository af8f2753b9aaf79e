//! In-memory [`Transport`] for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{Transport, TransportError, TransportRequest, TransportResponse};

type Reply = Result<TransportResponse, TransportError>;

/// Replays scripted replies in order (repeating the last one) and records
/// every request it receives.
pub struct RecordingTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl RecordingTransport {
    pub fn sequence(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(response: TransportResponse) -> Arc<Self> {
        Self::sequence(vec![Ok(response)])
    }

    pub fn failing(error: TransportError) -> Arc<Self> {
        Self::sequence(vec![Err(error)])
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().expect("reply queue is non-empty")
        } else {
            replies.front().cloned().expect("no reply scripted")
        }
    }
}

pub fn json_response(status: u16, body: &str) -> TransportResponse {
    TransportResponse {
        status,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: body.as_bytes().to_vec(),
    }
}

/// Holds the first request inside [`Transport::perform`] until released, so
/// tests can change client state while that request is in flight. Later
/// requests complete immediately.
pub struct GatedTransport {
    response: TransportResponse,
    requests: Mutex<Vec<TransportRequest>>,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedTransport {
    pub fn new(response: TransportResponse) -> Arc<Self> {
        Arc::new(Self {
            response,
            requests: Mutex::new(Vec::new()),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let first = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len() == 1
        };
        if first {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(self.response.clone())
    }
}
