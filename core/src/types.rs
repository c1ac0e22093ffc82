//! Domain types for the quoter API.
//!
//! # Design
//! `Quote` mirrors the service's JSON schema field-for-field; the wire names
//! (`dtype`, `edited_by`, `edited_at`, `is_old`) are fixed by the server and
//! pinned with `#[serde(rename)]`. Quote identity is its `id` alone, so two
//! fetches of the same quote compare equal even after an edit.
//!
//! The input types (`NewQuote`, `SearchQuery`) use `Option` for every
//! optional parameter; `None` means "omit from the request".

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize};

/// How a quote should be rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    #[default]
    Text,
    Dialog,
}

impl DisplayType {
    /// The wire string for this variant.
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayType::Text => "text",
            DisplayType::Dialog => "dialog",
        }
    }
}

/// A stored quote as returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub adder: String,
    pub authors: Vec<String>,
    #[serde(rename = "dtype", default)]
    pub display_type: DisplayType,
    pub content: String,
    pub date: i64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub edited_by: Option<String>,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub edited_at: Option<i64>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub is_old: bool,
}

impl Quote {
    pub fn is_edited(&self) -> bool {
        self.edited_by.is_some()
    }
}

impl PartialEq for Quote {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Quote {}

impl Hash for Quote {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// The service sends `""` for quotes that were never edited.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Likewise `0` stands in for a missing edit timestamp.
fn zero_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<i64>::deserialize(deserializer)?;
    Ok(value.filter(|t| *t != 0))
}

/// A binary attachment fetched from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// One or more author names.
///
/// Lets `add` accept either a single author or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authors(Vec<String>);

impl Authors {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// The `;`-joined wire form.
    pub fn joined(&self) -> String {
        self.0.join(";")
    }
}

impl From<&str> for Authors {
    fn from(author: &str) -> Self {
        Authors(vec![author.to_string()])
    }
}

impl From<String> for Authors {
    fn from(author: String) -> Self {
        Authors(vec![author])
    }
}

impl From<Vec<String>> for Authors {
    fn from(authors: Vec<String>) -> Self {
        Authors(authors)
    }
}

impl From<Vec<&str>> for Authors {
    fn from(authors: Vec<&str>) -> Self {
        Authors(authors.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Authors {
    fn from(authors: [&str; N]) -> Self {
        Authors(authors.iter().map(|a| a.to_string()).collect())
    }
}

/// Input for adding a quote.
#[derive(Debug, Clone)]
pub struct NewQuote {
    pub adder: String,
    pub authors: Authors,
    pub content: String,
    pub display_type: Option<DisplayType>,
    pub attachments: Option<Vec<String>>,
}

impl NewQuote {
    pub fn new(adder: impl Into<String>, authors: impl Into<Authors>, content: impl Into<String>) -> Self {
        Self {
            adder: adder.into(),
            authors: authors.into(),
            content: content.into(),
            display_type: None,
            attachments: None,
        }
    }

    pub fn display_type(mut self, display_type: DisplayType) -> Self {
        self.display_type = Some(display_type);
        self
    }

    pub fn attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = Some(attachments);
        self
    }
}

/// Filters for `search`. Unset filters are not sent.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub adder: Option<String>,
    pub authors: Option<Vec<String>>,
    pub content: Option<String>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adder(mut self, adder: impl Into<String>) -> Self {
        self.adder = Some(adder.into());
        self
    }

    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.authors = Some(authors);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}
