use serde::{Deserialize, Serialize};

/// Body of `POST /api/submit`. Both fields are optional here so that a
/// missing one is reported as such rather than as malformed JSON.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct SubmitRequest {
    pub filename: Option<String>,
    pub content: Option<String>,
}

impl SubmitRequest {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        SubmitRequest {
            filename: Some(filename.into()),
            content: Some(content.into()),
        }
    }

    /// Filename and content, if both are present and non-empty.
    pub fn parts(&self) -> Option<(&str, &str)> {
        let filename = self.filename.as_deref().filter(|s| !s.is_empty())?;
        let content = self.content.as_deref().filter(|s| !s.is_empty())?;
        Some((filename, content))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubmitResponse {
    pub success: bool,
    pub filename: String,
    pub url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// The parts of a contents API file we read: only its blob sha.
#[derive(Deserialize, Debug)]
pub struct FileInfo {
    pub sha: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct PutFileRequest<'a> {
    pub message: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
pub struct PutFileResponse {
    pub content: Option<WrittenFile>,
}

#[derive(Deserialize, Debug)]
pub struct WrittenFile {
    pub html_url: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct TagList {
    #[serde(default)]
    pub tags: Vec<String>,
}
