//! Client for the hosted provider's repository contents API.
//!
//! A write is always a read of the current file followed by a PUT. The read
//! only exists to learn the file's blob sha, so any failure there is treated
//! as "file does not exist" and the PUT goes ahead as a create.

use crate::config::RepoPath;
use crate::model::network::{FileInfo, PutFileRequest, PutFileResponse};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header, StatusCode};
use url::Url;

pub const USER_AGENT: &str = concat!("notepost/", env!("CARGO_PKG_VERSION"));

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("provider answered {status}: {body}")]
    Status {
        status: StatusCode,
        status_text: String,
        body: String,
    },

    #[error("request to provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider base url {0} cannot hold a path")]
    InvalidBase(Url),
}

#[derive(Clone, Debug)]
pub struct Contents {
    client: reqwest::Client,
    api_base: Url,
    token: String,
    repo: RepoPath,
}

impl Contents {
    pub fn new(client: reqwest::Client, api_base: Url, token: String, repo: RepoPath) -> Self {
        Contents {
            client,
            api_base,
            token,
            repo,
        }
    }

    /// `{base}/repos/{owner}/{repo}/contents/{dir...}/{filename}`
    pub fn file_url(&self, filename: &str) -> Result<Url, ProviderError> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ProviderError::InvalidBase(self.api_base.clone()))?;
            segments
                .pop_if_empty()
                .extend(["repos", self.repo.owner.as_str(), self.repo.repo.as_str(), "contents"])
                .extend(&self.repo.dir)
                .push(filename);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(header::USER_AGENT, USER_AGENT)
    }

    /// The sha of the file currently at `filename`, if it could be read.
    pub async fn lookup_sha(&self, filename: &str) -> Option<String> {
        let url = self.file_url(filename).ok()?;

        let response = match self.request(reqwest::Method::GET, url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(%filename, error = %err, "lookup failed, treating file as new");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(%filename, status = %response.status(), "file doesn't exist yet");
            return None;
        }

        match response.json::<FileInfo>().await {
            Ok(info) => info.sha,
            Err(err) => {
                tracing::warn!(%filename, error = %err, "unreadable lookup response");
                None
            }
        }
    }

    /// Writes `content` to `filename`. With a sha this is an update of that
    /// exact version, without one it is a create. Returns the file's public URL.
    pub async fn put_file(
        &self,
        filename: &str,
        content: &str,
        sha: Option<&str>,
    ) -> Result<Option<String>, ProviderError> {
        let url = self.file_url(filename)?;
        let body = PutFileRequest {
            message: format!("Add {}", filename),
            content: STANDARD.encode(content.as_bytes()),
            sha,
        };

        let response = self
            .request(reqwest::Method::PUT, url)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status,
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let written: PutFileResponse = response.json().await?;
        Ok(written.content.and_then(|file| file.html_url))
    }

    pub async fn upsert(&self, filename: &str, content: &str) -> Result<Option<String>, ProviderError> {
        let sha = self.lookup_sha(filename).await;
        tracing::debug!(%filename, existing = sha.is_some(), "writing file");
        self.put_file(filename, content, sha.as_deref()).await
    }
}
