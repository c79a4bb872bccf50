// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::{any, MethodRouter};
use reqwest::Url;

use crate::cache::credential::{Credential, AUTH_CACHE_NAME};
use crate::cache::credential_cache::CredentialCache;
use crate::cache::memory_cache::MemoryCache;
use crate::client::DingTalkClient;
use crate::config::client::ClientConfig;

pub const CORP_ID: &str = "corp-1";
pub const CORP_SECRET: &str = "secret-1";
pub const AGENT_ID: &str = "agent-1";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Both dialects pointed at the local mock
pub fn test_config(addr: SocketAddr) -> ClientConfig {
    ClientConfig::new(CORP_ID, CORP_SECRET)
        .with_endpoints(format!("http://{}/", addr), format!("http://{}/router/rest", addr))
        .with_agent_id(AGENT_ID)
}

pub fn memory_client(addr: SocketAddr) -> DingTalkClient<MemoryCache> {
    DingTalkClient::with_cache(test_config(addr), MemoryCache::new()).expect("client")
}

/// Client whose cache already holds a valid access token
pub async fn authorized_client(addr: SocketAddr, token: &str) -> DingTalkClient<MemoryCache> {
    let client = memory_client(addr);
    client
        .cache()
        .set(AUTH_CACHE_NAME, &Credential::issued_now(token.to_owned(), 7200))
        .await
        .expect("seed access token");
    client
}

/// One request as seen by the mock server
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn content_type(&self) -> &str {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default()
    }

    pub fn query(&self) -> Vec<(String, String)> {
        decode_pairs(self.uri.query().unwrap_or_default())
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        self.query().into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Body decoded as `application/x-www-form-urlencoded`
    pub fn form(&self) -> Vec<(String, String)> {
        decode_pairs(&String::from_utf8_lossy(&self.body))
    }

    pub fn form_value(&self, key: &str) -> Option<String> {
        self.form().into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

fn decode_pairs(encoded: &str) -> Vec<(String, String)> {
    let url = Url::parse(&format!("http://mock/?{}", encoded)).expect("valid query");
    url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
}

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Recorded>>>,
}

impl Recorder {
    pub fn record(&self, call: Recorded) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Route that records every request and answers with a fixed reply
pub fn replying(recorder: Recorder, status: StatusCode, content_type: &'static str, reply: impl Into<Bytes>) -> MethodRouter {
    let reply: Bytes = reply.into();
    any(move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
        let recorder = recorder.clone();
        let reply = reply.clone();
        async move {
            recorder.record(Recorded { method, uri, headers, body });
            (status, [(CONTENT_TYPE, content_type)], reply)
        }
    })
}

pub fn replying_json(recorder: Recorder, reply: serde_json::Value) -> MethodRouter {
    replying(recorder, StatusCode::OK, "application/json", reply.to_string())
}
