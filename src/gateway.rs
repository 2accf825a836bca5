use crate::config::GatewayConfig;
use crate::model::{
    network::{SubmitRequest, SubmitResponse},
    ApiError,
};
use crate::provider::{Contents, ProviderError};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const SUBMIT_PATH: &str = "/api/submit";
pub const SECRET_HEADER: &str = "x-api-secret";

pub struct AppState {
    api_secret: Option<String>,
    /// `None` when the token or repository path wasn't configured.
    contents: Option<Contents>,
}

impl AppState {
    pub fn new(config: &GatewayConfig, client: reqwest::Client) -> AppState {
        let provider = &config.provider;
        let contents = match (&provider.token, &provider.repo_path) {
            (Some(token), Some(repo)) if !token.is_empty() => Some(Contents::new(
                client,
                provider.api_base.clone(),
                token.clone(),
                repo.clone(),
            )),
            _ => None,
        };

        AppState {
            api_secret: config.api_secret.clone().filter(|s| !s.is_empty()),
            contents,
        }
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.api_secret.as_deref() else {
            return false;
        };
        headers
            .get(SECRET_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|given| given == expected)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(SUBMIT_PATH, post(submit).fallback(method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SubmitResponse>, ApiError> {
    if !state.authorized(&headers) {
        tracing::warn!("rejected submit with missing or wrong secret");
        return Err(ApiError::Unauthorized);
    }

    let Some(contents) = state.contents.as_ref() else {
        tracing::error!("provider token or repository path not configured");
        return Err(ApiError::Configuration);
    };

    let request: SubmitRequest = serde_json::from_slice(&body)?;
    let (filename, content) = request.parts().ok_or(ApiError::MissingField)?;

    match contents.upsert(filename, content).await {
        Ok(url) => {
            tracing::info!(%filename, url = url.as_deref().unwrap_or(""), "published");
            Ok(Json(SubmitResponse {
                success: true,
                filename: filename.to_string(),
                url,
            }))
        }

        Err(ProviderError::Status {
            status,
            status_text,
            body,
        }) => {
            tracing::warn!(%filename, %status, "provider rejected write");
            Err(ApiError::Provider {
                status,
                status_text,
                body,
            })
        }

        Err(err) => {
            tracing::error!(%filename, error = %err, "failed to submit");
            Err(ApiError::Network(err.to_string()))
        }
    }
}

pub async fn serve(config: &GatewayConfig) -> std::io::Result<()> {
    let client = reqwest::Client::builder()
        .user_agent(crate::provider::USER_AGENT)
        .build()
        .map_err(std::io::Error::other)?;

    let state = Arc::new(AppState::new(config, client));
    if state.contents.is_none() {
        tracing::warn!("GITHUB_PAT or REPO_PATH missing, submits will fail");
    }
    if state.api_secret.is_none() {
        tracing::warn!("API_SECRET missing, every submit will be unauthorized");
    }

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::testing::FakeProvider;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn gateway(provider: &FakeProvider) -> Router {
        let config = GatewayConfig {
            api_secret: Some("s3cret".into()),
            provider: ProviderConfig {
                api_base: provider.base_url(),
                token: Some("pat".into()),
                repo_path: Some("someone/blog/posts".parse().unwrap()),
            },
            ..GatewayConfig::default()
        };
        router(Arc::new(AppState::new(&config, reqwest::Client::new())))
    }

    fn submit_request(secret: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::post(SUBMIT_PATH).header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header(SECRET_HEADER, secret);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn note() -> Value {
        json!({
            "filename": "2024-01-15-hello-world.md",
            "content": "---\ndate: 2024-01-15T10:00:00+00:00\ntags: [go]\n---\n\nHi",
        })
    }

    #[tokio::test]
    async fn new_file_is_created_without_sha() {
        let provider = FakeProvider::start().await;
        let (status, body) = call(gateway(&provider), submit_request(Some("s3cret"), note())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["filename"], "2024-01-15-hello-world.md");
        assert_eq!(
            body["url"],
            "https://example.com/someone/blog/blob/main/posts/2024-01-15-hello-world.md"
        );

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(
            requests[0].path,
            "/repos/someone/blog/contents/posts/2024-01-15-hello-world.md"
        );
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer pat"));

        let write = &requests[1];
        assert_eq!(write.method, "PUT");
        let body = write.body.as_ref().unwrap();
        assert_eq!(body["message"], "Add 2024-01-15-hello-world.md");
        assert!(body.get("sha").is_none());

        let decoded = STANDARD.decode(body["content"].as_str().unwrap()).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            note()["content"].as_str().unwrap()
        );
    }

    #[tokio::test]
    async fn existing_file_is_updated_with_its_sha() {
        let provider = FakeProvider::start().await;
        provider.set_existing_sha("abc123");

        let (status, _) = call(gateway(&provider), submit_request(Some("s3cret"), note())).await;
        assert_eq!(status, StatusCode::OK);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].body.as_ref().unwrap()["sha"], "abc123");
    }

    #[tokio::test]
    async fn failed_lookup_is_treated_as_new_file() {
        let provider = FakeProvider::start().await;
        provider.set_lookup_status(StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = call(gateway(&provider), submit_request(Some("s3cret"), note())).await;
        assert_eq!(status, StatusCode::OK);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].body.as_ref().unwrap().get("sha").is_none());
    }

    #[tokio::test]
    async fn provider_write_errors_pass_through() {
        let provider = FakeProvider::start().await;
        provider.set_existing_sha("stale");
        provider.set_write_status(StatusCode::CONFLICT);

        let (status, body) = call(gateway(&provider), submit_request(Some("s3cret"), note())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "GitHub API error: Conflict");
        assert_eq!(body["details"], r#"{"message":"sha mismatch"}"#);
    }

    #[tokio::test]
    async fn missing_secret_is_unauthorized_before_any_provider_call() {
        let provider = FakeProvider::start().await;

        let (status, body) = call(gateway(&provider), submit_request(None, note())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Unauthorized"}));

        let (status, _) = call(gateway(&provider), submit_request(Some("guess"), note())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn unset_server_secret_rejects_everyone() {
        let provider = FakeProvider::start().await;
        let config = GatewayConfig {
            api_secret: None,
            provider: ProviderConfig {
                api_base: provider.base_url(),
                token: Some("pat".into()),
                repo_path: Some("someone/blog".parse().unwrap()),
            },
            ..GatewayConfig::default()
        };
        let app = router(Arc::new(AppState::new(&config, reqwest::Client::new())));

        let (status, _) = call(app, submit_request(Some(""), note())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn only_post_is_allowed() {
        let provider = FakeProvider::start().await;
        let request = Request::get(SUBMIT_PATH).body(Body::empty()).unwrap();

        let (status, body) = call(gateway(&provider), request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn missing_fields_are_bad_requests() {
        let provider = FakeProvider::start().await;

        let (status, body) = call(
            gateway(&provider),
            submit_request(Some("s3cret"), json!({"filename": "a.md"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing filename or content");

        let request = Request::post(SUBMIT_PATH)
            .header(SECRET_HEADER, "s3cret")
            .body(Body::from("not json"))
            .unwrap();
        let (status, _) = call(gateway(&provider), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_provider_config_is_a_server_error() {
        let config = GatewayConfig {
            api_secret: Some("s3cret".into()),
            ..GatewayConfig::default()
        };
        let app = router(Arc::new(AppState::new(&config, reqwest::Client::new())));

        let (status, body) = call(app, submit_request(Some("s3cret"), note())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "GitHub configuration not found");
    }
}
