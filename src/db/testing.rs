//! Local HTTP gateway that answers Cosmos REST calls from a script and records them.

use std::collections::VecDeque;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::core::config::CosmosConfig;


pub struct Reply {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: String,
}

impl Reply {
    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    /// A query feed page.
    pub fn documents(rows: Value) -> Self {
        Self::status(200, &json!({ "Documents": rows }).to_string())
    }

    pub fn no_content() -> Self {
        Self::status(204, "")
    }

    pub fn throttled() -> Self {
        Self::status(429, r#"{"code":"TooManyRequests"}"#).with_header("x-ms-retry-after-ms", "1")
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }
}


#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query_text(&self) -> String {
        let body: Value = serde_json::from_str(&self.body).unwrap();
        body["query"].as_str().unwrap().to_string()
    }
}

#[derive(Clone, Default)]
struct Shared {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

pub struct StubGateway {
    shared: Shared,
    endpoint: String,
    server: JoinHandle<()>,
}

impl StubGateway {
    pub async fn start(replies: impl IntoIterator<Item = Reply>) -> Self {
        let shared = Shared::default();
        shared.replies.lock().extend(replies);

        let app = Router::new().fallback(answer).with_state(shared.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            shared,
            endpoint,
            server,
        }
    }

    /// Client settings pointing at this gateway, collection `dbs/shop/colls/orders`.
    pub fn config(&self, cross_partition: bool) -> CosmosConfig {
        let mut config = CosmosConfig::new("shop", "orders");
        config.endpoint = self.endpoint.clone();
        config.cross_partition = cross_partition;
        config
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.requests.lock().clone()
    }
}

impl Drop for StubGateway {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn answer(
    State(shared): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    shared.requests.lock().push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers,
        body,
    });

    let reply = shared
        .replies
        .lock()
        .pop_front()
        .unwrap_or_else(|| Reply::status(500, "no reply scripted"));

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Body::from(reply.body)).into_response();
    for (name, value) in reply.headers {
        response
            .headers_mut()
            .insert(name, HeaderValue::from_str(&value).unwrap());
    }
    response
}
