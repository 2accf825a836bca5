use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::{format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime};

const FILE_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const FRONT_MATTER_DATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
);

pub const MIN_SLUG_LEN: usize = 3;

/// The note being written, saved on every edit whether or not it is valid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Draft {
    pub tags: Vec<String>,
    pub slug: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// The authoring time was picked by the user rather than defaulted.
    #[serde(default)]
    pub timestamp_set: bool,
}

impl Draft {
    pub fn empty_at(timestamp: OffsetDateTime) -> Draft {
        Draft {
            tags: Vec::new(),
            slug: String::new(),
            content: String::new(),
            timestamp,
            timestamp_set: false,
        }
    }

    pub fn empty() -> Draft {
        Draft::empty_at(OffsetDateTime::now_utc())
    }

    pub fn is_blank(&self) -> bool {
        self.tags.is_empty() && self.slug.is_empty() && self.content.is_empty()
    }

    /// Checks every field, collecting one message per failing field.
    pub fn validate(&self) -> Result<Note, FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.tags.is_empty() {
            errors.insert(Field::Tags, "At least one tag is required");
        }

        let slug = self.slug.trim();
        if slug.chars().count() < MIN_SLUG_LEN {
            errors.insert(Field::Slug, "Slug must be at least 3 characters");
        }

        let content = self.content.trim();
        if content.is_empty() {
            errors.insert(Field::Content, "Content is required");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Note {
            tags: self.tags.clone(),
            slug: slug.to_string(),
            content: content.to_string(),
            timestamp: self.timestamp,
        })
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Slug,
    Tags,
    Content,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Slug => "slug",
            Field::Tags => "tags",
            Field::Content => "content",
        })
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct FieldErrors(IndexMap<Field, String>);

impl FieldErrors {
    fn insert(&mut self, field: Field, message: &str) {
        self.0.insert(field, message.to_string());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// A draft that passed validation, with slug and content trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub tags: Vec<String>,
    pub slug: String,
    pub content: String,
    pub timestamp: OffsetDateTime,
}

impl Note {
    /// `<yyyy-mm-dd>-<slug>.md`, using the date in the timestamp's own offset.
    pub fn filename(&self) -> String {
        let date = self
            .timestamp
            .format(FILE_DATE)
            .unwrap_or_else(|_| self.timestamp.date().to_string());
        format!("{}-{}.md", date, self.slug)
    }

    /// Front matter with the date and tags, a blank line, then the body.
    pub fn document(&self) -> String {
        let date = self
            .timestamp
            .format(FRONT_MATTER_DATE)
            .unwrap_or_else(|_| self.timestamp.to_string());
        format!(
            "---\ndate: {}\ntags: [{}]\n---\n\n{}",
            date,
            self.tags.join(", "),
            self.content
        )
    }
}
