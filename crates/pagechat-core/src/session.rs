//! Application state for one user: the current page, its summary and the chat
//! about it

use crate::fetch::Fetcher;
use crate::history::ChatHistory;
use crate::llm::{Assistant, LlmError};
use crate::PageRecord;
use tracing::{info, warn};

/// Result of the latest scrape
#[derive(Debug, Clone, PartialEq)]
pub enum Scrape {
    /// The page was fetched and extracted
    Ready(PageRecord),
    /// Fetching failed; only the error message is kept
    Failed(String),
}

impl Scrape {
    pub fn page(&self) -> Option<&PageRecord> {
        match self {
            Scrape::Ready(page) => Some(page),
            Scrape::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Scrape::Ready(_) => None,
            Scrape::Failed(error) => Some(error),
        }
    }
}

const NO_PAGE: &str = "Scrape a website first to chat with its content.";

/// Owns the current page and everything derived from it.
///
/// Each scrape replaces the page wholesale and resets the summary and chat
/// history, so no state from a previous page survives.
pub struct Session {
    fetcher: Fetcher,
    assistant: Assistant,
    current: Option<Scrape>,
    summary: Option<String>,
    history: ChatHistory,
}

impl Session {
    pub fn new(fetcher: Fetcher, assistant: Assistant) -> Self {
        Self {
            fetcher,
            assistant,
            current: None,
            summary: None,
            history: ChatHistory::new(),
        }
    }

    /// Fetch and extract `url`, then summarize it
    pub async fn scrape(&mut self, url: &str) -> &Scrape {
        let outcome = match self.fetcher.fetch(url).await {
            Ok(page) => Scrape::Ready(page),
            Err(e) => {
                warn!("Scrape of {} failed: {}", url, e);
                Scrape::Failed(e.to_string())
            }
        };
        self.replace(outcome).await
    }

    /// Like [`Session::scrape`] for HTML that was already fetched
    pub async fn render(&mut self, html: &str, base_url: Option<&str>) -> &Scrape {
        let outcome = match self.fetcher.render_html(html, base_url) {
            Ok(page) => Scrape::Ready(page),
            Err(e) => Scrape::Failed(e.to_string()),
        };
        self.replace(outcome).await
    }

    async fn replace(&mut self, outcome: Scrape) -> &Scrape {
        self.history.clear();
        self.summary = None;
        self.current = Some(outcome);

        if let Some(page) = self.page() {
            info!("Loaded {} ({} chars condensed)", page.url, page.condensed.len());
            let summary = self.summarize().await;
            self.summary = Some(summary);
        }

        self.current.get_or_insert(Scrape::Failed(NO_PAGE.to_string()))
    }

    /// Summarize the current page. Failures come back as the reply text.
    pub async fn summarize(&self) -> String {
        let page = match self.current.as_ref() {
            Some(Scrape::Ready(page)) => page,
            Some(Scrape::Failed(error)) => return format!("Error: {}", error),
            None => return NO_PAGE.to_string(),
        };
        match self.assistant.summarize(page).await {
            Ok(summary) => summary,
            Err(e) => error_reply(&e, "Error summarizing content"),
        }
    }

    /// Ask a question about the current page and record the exchange.
    /// Failures come back as the reply text.
    pub async fn ask(&mut self, question: &str) -> String {
        let page = match self.current.as_ref() {
            Some(Scrape::Ready(page)) => page,
            Some(Scrape::Failed(error)) => return format!("Error: {}", error),
            None => return NO_PAGE.to_string(),
        };
        let answer = match self.assistant.chat(page, question).await {
            Ok(answer) => answer,
            Err(e) => error_reply(&e, "Error processing chat"),
        };
        self.history.push(question, &answer);
        answer
    }

    pub fn page(&self) -> Option<&PageRecord> {
        self.current.as_ref().and_then(Scrape::page)
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub fn assistant_mut(&mut self) -> &mut Assistant {
        &mut self.assistant
    }
}

fn error_reply(error: &LlmError, context: &str) -> String {
    warn!("{}: {}", context, error);
    match error {
        LlmError::MissingApiKey => format!("Error: {}", error),
        _ => format!("{}: {}", context, error),
    }
}
