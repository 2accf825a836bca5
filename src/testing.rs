//! A stand-in for the provider's contents API, served on an ephemeral port.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use url::Url;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub secret: Option<String>,
    pub body: Option<Value>,
}

struct Inner {
    existing_sha: Option<String>,
    lookup_status: Option<StatusCode>,
    write_status: StatusCode,
    tags: Vec<String>,
    requests: Vec<Recorded>,
}

pub struct FakeProvider {
    addr: SocketAddr,
    inner: Arc<Mutex<Inner>>,
}

impl FakeProvider {
    pub async fn start() -> FakeProvider {
        let inner = Arc::new(Mutex::new(Inner {
            existing_sha: None,
            lookup_status: None,
            write_status: StatusCode::CREATED,
            tags: Vec::new(),
            requests: Vec::new(),
        }));

        let app = Router::new().fallback(respond).with_state(inner.clone());
        let addr = spawn(app).await;
        FakeProvider { addr, inner }
    }

    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).unwrap()
    }

    pub fn tags_url(&self) -> Url {
        self.base_url().join("tags.json").unwrap()
    }

    pub fn set_existing_sha(&self, sha: &str) {
        self.inner.lock().unwrap().existing_sha = Some(sha.to_string());
    }

    pub fn set_lookup_status(&self, status: StatusCode) {
        self.inner.lock().unwrap().lookup_status = Some(status);
    }

    pub fn set_write_status(&self, status: StatusCode) {
        self.inner.lock().unwrap().write_status = status;
    }

    pub fn set_tags(&self, tags: &[&str]) {
        self.inner.lock().unwrap().tags = tags.iter().map(|t| t.to_string()).collect();
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn writes(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "PUT")
            .collect()
    }
}

pub async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn respond(
    State(inner): State<Arc<Mutex<Inner>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    let mut inner = inner.lock().unwrap();
    inner.requests.push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        authorization: header_value(header::AUTHORIZATION.as_str()),
        secret: header_value("x-api-secret"),
        body: serde_json::from_slice(&body).ok(),
    });

    if uri.path() == "/tags.json" {
        return Json(json!({ "tags": inner.tags })).into_response();
    }

    match method {
        Method::GET => {
            if let Some(status) = inner.lookup_status {
                return (status, "{}").into_response();
            }
            match &inner.existing_sha {
                Some(sha) => Json(json!({ "sha": sha, "type": "file" })).into_response(),
                None => (StatusCode::NOT_FOUND, r#"{"message":"Not Found"}"#).into_response(),
            }
        }

        Method::PUT => {
            if !inner.write_status.is_success() {
                return (inner.write_status, r#"{"message":"sha mismatch"}"#).into_response();
            }

            // /repos/{owner}/{repo}/contents/{path}
            let segments: Vec<&str> = uri.path().split('/').collect();
            let (owner, repo) = (segments[2], segments[3]);
            let path = uri.path().split_once("/contents/").map_or("", |(_, p)| p);
            let html_url = format!("https://example.com/{}/{}/blob/main/{}", owner, repo, path);

            (
                inner.write_status,
                Json(json!({ "content": { "html_url": html_url } })),
            )
                .into_response()
        }

        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}
