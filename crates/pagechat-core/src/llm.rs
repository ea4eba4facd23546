//! Summaries and chat through an OpenAI-compatible chat-completions API

use crate::PageRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Groq's OpenAI-compatible API root
pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

/// Characters of condensed text sent with each request
pub const CONTEXT_CHARS: usize = 7500;

const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that summarizes web content concisely.";

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("No GROQ_API_KEY found in environment variables. Please add it to your .env file.")]
    MissingApiKey,

    #[error("request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("response contained no choices")]
    EmptyResponse,
}

/// Models the assistant can be pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Model {
    #[default]
    #[serde(rename = "llama3-8b-8192")]
    Llama3,
    #[serde(rename = "mixtral-8x7b-32768")]
    Mixtral,
    #[serde(rename = "gemma-7b-it")]
    Gemma,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::Llama3, Model::Mixtral, Model::Gemma];

    /// Identifier sent to the API
    pub fn id(self) -> &'static str {
        match self {
            Model::Llama3 => "llama3-8b-8192",
            Model::Mixtral => "mixtral-8x7b-32768",
            Model::Gemma => "gemma-7b-it",
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "llama3-8b-8192" | "llama3" | "llama" => Ok(Model::Llama3),
            "mixtral-8x7b-32768" | "mixtral" => Ok(Model::Mixtral),
            "gemma-7b-it" | "gemma" => Ok(Model::Gemma),
            _ => Err(format!(
                "Unknown model: {} (expected one of {})",
                s,
                Model::ALL.map(Model::id).join(", ")
            )),
        }
    }
}

/// A chat-completion backend
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one system and one user message, return the reply text
    async fn complete(&self, system: &str, user: &str, model: Model) -> Result<String, LlmError>;

    /// Whether the backend has what it needs to make calls
    fn is_configured(&self) -> bool {
        true
    }
}

// --- OpenAI-compatible serde structs ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'static str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, LlmError> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or(LlmError::EmptyResponse)
    }
}

/// Settings for the Groq backend
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: Model,
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: Model::default(),
            endpoint: GROQ_ENDPOINT.to_string(),
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Defaults, with the API key taken from `GROQ_API_KEY` if set
    pub fn from_env() -> Self {
        Self {
            api_key: api_key_from_env(),
            ..Default::default()
        }
    }
}

/// `GROQ_API_KEY`, ignoring empty values
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Client for Groq's chat-completions endpoint
pub struct GroqClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GroqClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        info!(
            "LLM client configured: endpoint={}, model={}, key={}",
            endpoint,
            config.model,
            if config.api_key.is_some() { "set" } else { "missing" }
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for GroqClient {
    async fn complete(&self, system: &str, user: &str, model: Model) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let request = ChatRequest {
            model: model.id(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        info!("Requesting completion from {} ({} prompt chars)", model, user.len());
        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        let text = chat_response.into_text()?;
        debug!("Completion returned {} chars", text.len());
        Ok(text)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// System and user prompts for a summary of `page`
pub fn summary_prompts(page: &PageRecord) -> (String, String) {
    let user = format!(
        "Summarize this web content in 3-5 paragraphs:\n\nTitle: {}\n\n{}",
        page.title,
        page.excerpt(CONTEXT_CHARS)
    );
    (SUMMARY_SYSTEM_PROMPT.to_string(), user)
}

/// System and user prompts for a question about `page`
pub fn chat_prompts(page: &PageRecord, question: &str) -> (String, String) {
    let system = format!(
        "You are a helpful assistant that answers questions based on the web content provided.\n\
         The content is from the page titled: {}\n\
         When answering, only use information from the content provided. \
         If the answer is not in the content, say that you don't have that information.",
        page.title
    );
    let user = format!(
        "Content:\n{}\n\nQuestion: {}",
        page.excerpt(CONTEXT_CHARS),
        question
    );
    (system, user)
}

/// Summarizes pages and answers questions about them
pub struct Assistant {
    backend: Box<dyn ChatModel>,
    model: Model,
}

impl Assistant {
    pub fn new(backend: impl ChatModel + 'static, model: Model) -> Self {
        Self {
            backend: Box::new(backend),
            model,
        }
    }

    /// An assistant backed by Groq
    pub fn groq(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self::new(GroqClient::new(config)?, config.model))
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn set_model(&mut self, model: Model) {
        self.model = model;
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_configured()
    }

    /// One-shot summary of a page
    pub async fn summarize(&self, page: &PageRecord) -> Result<String, LlmError> {
        let (system, user) = summary_prompts(page);
        self.backend.complete(&system, &user, self.model).await
    }

    /// Answer a question using only the page's content
    pub async fn chat(&self, page: &PageRecord, question: &str) -> Result<String, LlmError> {
        let (system, user) = chat_prompts(page, question);
        self.backend.complete(&system, &user, self.model).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_page;
    use url::Url;

    fn page(body: &str) -> PageRecord {
        let html = format!("<html><head><title>Guide</title></head><body>{body}</body></html>");
        extract_page(&html, &Url::parse("https://x.com/guide").unwrap())
    }

    #[test]
    fn test_model_ids_and_parsing() {
        assert_eq!(Model::default(), Model::Llama3);
        assert_eq!(Model::Mixtral.to_string(), "mixtral-8x7b-32768");
        assert_eq!("gemma-7b-it".parse::<Model>(), Ok(Model::Gemma));
        assert_eq!("Mixtral".parse::<Model>(), Ok(Model::Mixtral));
        assert!("gpt-4".parse::<Model>().unwrap_err().contains("llama3-8b-8192"));
    }

    #[test]
    fn test_model_serde_uses_ids() {
        assert_eq!(serde_json::to_string(&Model::Gemma).unwrap(), "\"gemma-7b-it\"");
        let model: Model = serde_json::from_str("\"mixtral-8x7b-32768\"").unwrap();
        assert_eq!(model, Model::Mixtral);
    }

    #[test]
    fn test_summary_prompt_is_truncated() {
        let page = page(&format!("<p>{}</p>", "é".repeat(9000)));
        let (system, user) = summary_prompts(&page);
        assert_eq!(system, SUMMARY_SYSTEM_PROMPT);
        assert!(page.condensed.chars().count() > CONTEXT_CHARS);
        assert_eq!(
            user,
            format!(
                "Summarize this web content in 3-5 paragraphs:\n\nTitle: Guide\n\n{}",
                crate::condense::truncate_chars(&page.condensed, CONTEXT_CHARS)
            )
        );
        assert_eq!(user.matches('é').count(), CONTEXT_CHARS - 1);
    }

    #[test]
    fn test_chat_prompt_names_title_and_question() {
        let page = page("<p>Install with cargo install pagechat.</p>");
        let (system, user) = chat_prompts(&page, "How do I install it?");
        assert!(system.contains("The content is from the page titled: Guide"));
        assert!(system.contains("only use information from the content provided"));
        assert!(user.starts_with("Content:\n"));
        assert!(user.ends_with("\n\nQuestion: How do I install it?"));
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: Model::Llama3.id(),
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "llama3-8b-8192",
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hello"}}],"usage":{"total_tokens":3}}"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_text().unwrap(), "Hello");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(empty.into_text(), Err(LlmError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let config = LlmConfig::default();
        let assistant = Assistant::groq(&config).unwrap();
        assert!(!assistant.is_configured());

        let page = page("<p>Some content that is long enough.</p>");
        let err = assistant.summarize(&page).await.unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
        assert!(err.to_string().contains("No GROQ_API_KEY"));

        let err = assistant.chat(&page, "what?").await.unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
    }
}
