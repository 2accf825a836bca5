use super::ClientError;
use crate::gateway::SECRET_HEADER;
use crate::model::network::{ErrorBody, SubmitRequest, SubmitResponse};
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub filename: String,
    pub url: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait Publisher {
    async fn publish(&self, filename: &str, content: &str) -> Result<Published, ClientError>;
}

/// Sends notes to the gateway, which holds the provider credential.
pub struct GatewayPublisher {
    client: reqwest::Client,
    url: Url,
    secret: String,
}

impl GatewayPublisher {
    pub fn new(client: reqwest::Client, url: Url, secret: String) -> Self {
        GatewayPublisher {
            client,
            url,
            secret,
        }
    }
}

fn network(err: reqwest::Error) -> ClientError {
    ClientError::Network(err.to_string())
}

impl Publisher for GatewayPublisher {
    async fn publish(&self, filename: &str, content: &str) -> Result<Published, ClientError> {
        let response = self
            .client
            .post(self.url.clone())
            .header(SECRET_HEADER, &self.secret)
            .json(&SubmitRequest::new(filename, content))
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if status.is_success() {
            let body: SubmitResponse = response.json().await.map_err(network)?;
            return Ok(Published {
                filename: body.filename,
                url: body.url,
            });
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(ErrorBody {
                error,
                details: Some(details),
            }) => format!("{}: {}", error, details),
            Ok(ErrorBody { error, .. }) => error,
            Err(_) => format!("gateway answered {}: {}", status, text),
        };

        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
