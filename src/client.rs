//! The note form: a draft that is saved locally on every edit, validated
//! on submit, and cleared only after the gateway accepted it.

pub mod auth;
pub mod publish;
pub mod store;
pub mod tags;

use crate::model::{Draft, FieldErrors};
use crate::page::{self, Html};
use publish::{Published, Publisher};
use store::{load_json, save_json, KeyValueStore, StoreError};
use time::OffsetDateTime;

pub const DRAFT_KEY: &str = "notepost-draft";

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Validation(FieldErrors),

    #[error("not logged in, run `notepost login` first")]
    NotLoggedIn,

    #[error("secret must not be blank")]
    BlankSecret,

    #[error("login lifetime is too long")]
    TtlTooLong,

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success(String),
    Error(String),
}

pub struct FormController<S> {
    store: S,
    draft: Draft,
    notice: Option<Notice>,
}

impl<S: KeyValueStore> FormController<S> {
    /// Picks up the saved draft, if any. A time the user set explicitly is
    /// kept; a defaulted one starts at now unless `restore_timestamp` is set.
    pub fn load(store: S, restore_timestamp: bool) -> Result<Self, ClientError> {
        let now = OffsetDateTime::now_utc();
        let mut draft = load_json::<Draft>(&store, DRAFT_KEY)?.unwrap_or_else(|| Draft::empty_at(now));
        if !restore_timestamp && !draft.timestamp_set {
            draft.timestamp = now;
        }

        Ok(FormController {
            store,
            draft,
            notice: None,
        })
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self) -> Result<(), ClientError> {
        save_json(&mut self.store, DRAFT_KEY, &self.draft)?;
        Ok(())
    }

    pub fn set_timestamp(&mut self, timestamp: OffsetDateTime) -> Result<(), ClientError> {
        self.draft.timestamp = timestamp;
        self.draft.timestamp_set = true;
        self.persist()
    }

    pub fn set_slug(&mut self, slug: &str) -> Result<(), ClientError> {
        self.draft.slug = slug.to_string();
        self.persist()
    }

    pub fn set_content(&mut self, content: &str) -> Result<(), ClientError> {
        self.draft.content = content.to_string();
        self.persist()
    }

    pub fn set_tags(&mut self, tags: Vec<String>) -> Result<(), ClientError> {
        self.draft.tags = tags;
        self.persist()
    }

    /// Appends a tag, known or not. Blank input is ignored.
    pub fn add_tag(&mut self, tag: &str) -> Result<(), ClientError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(());
        }
        self.draft.tags.push(tag.to_string());
        self.persist()
    }

    /// Removes the first occurrence of `tag`, reporting whether it was there.
    pub fn remove_tag(&mut self, tag: &str) -> Result<bool, ClientError> {
        let Some(index) = self.draft.tags.iter().position(|t| t == tag) else {
            return Ok(false);
        };
        self.draft.tags.remove(index);
        self.persist()?;
        Ok(true)
    }

    pub fn errors(&self) -> Option<FieldErrors> {
        self.draft.validate().err()
    }

    pub fn preview(&self) -> Html {
        page::preview(&self.draft.content)
    }

    /// Validates, publishes, and on success clears the draft. A draft that
    /// fails validation never reaches the publisher, and a failed publish
    /// leaves it untouched.
    pub async fn submit<P: Publisher>(&mut self, publisher: &P) -> Result<Published, ClientError> {
        self.notice = None;
        let note = self.draft.validate().map_err(ClientError::Validation)?;
        let filename = note.filename();

        match publisher.publish(&filename, &note.document()).await {
            Ok(published) => {
                tracing::info!(%filename, "published");
                self.notice = Some(Notice::Success(format!(
                    "Successfully saved {} to GitHub",
                    filename
                )));
                if let Err(err) = self.clear() {
                    tracing::warn!(error = %err, "published but couldn't clear the draft");
                }
                Ok(published)
            }

            Err(err) => {
                tracing::error!(%filename, error = %err, "failed to submit");
                self.notice = Some(Notice::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Resets to an empty draft whatever its state.
    pub fn clear(&mut self) -> Result<(), ClientError> {
        self.draft = Draft::empty();
        self.persist()
    }
}
