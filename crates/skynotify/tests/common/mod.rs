#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use http::StatusCode;
use skynotify::Session;
use skynotify::http_client::HttpClient;
use tokio::sync::{Mutex, Notify};
use url::Url;

/// Replays queued responses and logs every request it sees.
#[derive(Clone, Default)]
pub struct MockClient {
    queue: Arc<Mutex<VecDeque<http::Response<Vec<u8>>>>>,
    log: Arc<Mutex<Vec<http::Request<Vec<u8>>>>>,
    gate: Option<Arc<Notify>>,
}

impl MockClient {
    /// A client that holds every request until `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub async fn push(&self, resp: http::Response<Vec<u8>>) {
        self.queue.lock().await.push_back(resp);
    }

    pub async fn push_json(&self, status: StatusCode, body: serde_json::Value) {
        self.push(json_response(status, body)).await;
    }

    pub async fn requests(&self) -> Vec<http::Request<Vec<u8>>> {
        std::mem::take(&mut *self.log.lock().await)
    }
}

impl HttpClient for MockClient {
    type Error = std::convert::Infallible;
    fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl core::future::Future<
        Output = core::result::Result<http::Response<Vec<u8>>, Self::Error>,
    > + Send {
        let log = self.log.clone();
        let queue = self.queue.clone();
        let gate = self.gate.clone();
        async move {
            log.lock().await.push(request);
            if let Some(gate) = gate {
                gate.notified().await;
            }
            Ok(queue.lock().await.pop_front().expect("no queued response"))
        }
    }
}

pub fn json_response(status: StatusCode, body: serde_json::Value) -> http::Response<Vec<u8>> {
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(serde_json::to_vec(&body).unwrap())
        .unwrap()
}

pub fn session() -> Session {
    Session {
        did: "did:plc:alice".into(),
        handle: Some("alice.bsky.social".into()),
        access_jwt: "acc1".into(),
        pds: Url::parse("https://pds.example").unwrap(),
    }
}
