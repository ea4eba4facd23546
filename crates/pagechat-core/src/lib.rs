//! Pagechat Core Library
//!
//! Core functionality for pagechat including:
//! - HTTP fetching with a browser-like header set
//! - Structured content extraction (headings, blocks, lists, tables, links)
//! - Condensing a page into a prompt-sized text blob
//! - Summary and chat calls against a Groq-hosted model

pub mod condense;
pub mod dom;
pub mod extract;
pub mod fetch;
pub mod history;
pub mod llm;
pub mod markdown;
pub mod session;

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

// Re-export key types
pub use fetch::{FetchError, Fetcher};
pub use history::{ChatHistory, ChatTurn};
pub use llm::{Assistant, ChatModel, GroqClient, LlmConfig, LlmError, Model};
pub use session::{Scrape, Session};

#[derive(Error, Debug)]
pub enum PagechatError {
    #[error(transparent)]
    FetchError(#[from] FetchError),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error(transparent)]
    LlmError(#[from] LlmError),
}

pub type Result<T> = std::result::Result<T, PagechatError>;

/// Title used when the document has no usable `<title>`
pub const NO_TITLE: &str = "No title found";

/// Description used when no `description` meta tag exists
pub const NO_DESCRIPTION: &str = "No description found";

/// Structured result of extracting one page.
///
/// Built fresh for every scrape and never mutated afterwards; the next
/// scrape replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecord {
    /// The URL the page was fetched from (base for relative links)
    pub url: url::Url,
    /// Text of the `<title>` element
    pub title: String,
    /// Value of the `description` meta entry
    pub description: String,
    /// Every `name`/`property` meta entry, last one wins
    pub meta: BTreeMap<String, String>,
    /// Whitespace-collapsed text of the whole page
    pub full_text: String,
    /// Headings grouped by level
    pub headings: Headings,
    /// Substantial container elements selected by class keywords
    pub content_blocks: Vec<ContentBlock>,
    pub paragraphs: Vec<String>,
    pub lists: Vec<ListBlock>,
    pub tables: Vec<Table>,
    pub images: Vec<Image>,
    pub links: Vec<Link>,
    /// Condensed text fed to the model
    pub condensed: String,
}

impl PageRecord {
    /// The condensed text cut to at most `limit` characters
    pub fn excerpt(&self, limit: usize) -> &str {
        condense::truncate_chars(&self.condensed, limit)
    }

    /// Convert the record to a markdown report
    pub fn to_markdown(&self) -> String {
        markdown::record_to_markdown(self)
    }

    /// Convert the record to a plain text report
    pub fn to_plain_text(&self) -> String {
        markdown::markdown_to_plain(&self.to_markdown())
    }
}

/// Headings of a page, one ordered sequence per level 1-6
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Headings {
    levels: [Vec<String>; 6],
}

impl Headings {
    /// Append a heading; levels outside 1-6 are ignored
    pub fn push(&mut self, level: u8, text: String) {
        if let Some(slot) = Self::index(level).and_then(|i| self.levels.get_mut(i)) {
            slot.push(text);
        }
    }

    /// Headings at one level, in document order
    pub fn level(&self, level: u8) -> &[String] {
        Self::index(level)
            .and_then(|i| self.levels.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All headings, level-major then document order
    pub fn iter(&self) -> impl Iterator<Item = Heading> + '_ {
        (1..=6u8).flat_map(move |level| {
            self.level(level).iter().map(move |text| Heading {
                level,
                text: text.clone(),
            })
        })
    }

    pub fn len(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn index(level: u8) -> Option<usize> {
        (1..=6).contains(&level).then(|| usize::from(level) - 1)
    }
}

/// A single heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// Tag a content block was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Article,
    Section,
    Div,
    Main,
}

impl BlockKind {
    /// Candidate tags, in the order they are searched
    pub const ALL: [BlockKind; 4] = [
        BlockKind::Article,
        BlockKind::Section,
        BlockKind::Div,
        BlockKind::Main,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            BlockKind::Article => "article",
            BlockKind::Section => "section",
            BlockKind::Div => "div",
            BlockKind::Main => "main",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A text-bearing container element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    pub kind: BlockKind,
    pub text: String,
}

/// An `<ul>` or `<ol>` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListBlock {
    pub ordered: bool,
    pub items: Vec<String>,
}

/// A table with optional header row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Text of every `<th>` in the table, may be empty
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// An image found in the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    /// Absolute source URL
    pub src: String,
    pub alt: String,
}

/// A link found in the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Absolute URL, or the raw `mailto:`/`tel:` target
    pub url: String,
    /// The display text
    pub text: String,
}

/// Configuration for fetching pages
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: fetch::BROWSER_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}
