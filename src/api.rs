use crate::config::Config;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const WEB_SEARCH_TOOL_TYPE: &str = "web_search_20250305";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WebSearchTool>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct WebSearchTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    name: &'static str,
    max_uses: u32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

pub struct AnthropicClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    web_search_max_uses: Option<u32>,
    client: reqwest::blocking::Client,
}

impl AnthropicClient {
    pub fn new(config: &Config, api_key: String) -> Self {
        Self {
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            web_search_max_uses: config
                .enable_web_search
                .then_some(config.web_search_max_uses),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Send one user message and return the concatenated text blocks of
    /// the reply. Failures surface as [`Error::Api`]; nothing is retried.
    pub fn complete(&self, system: &str, user_input: &str) -> Result<String> {
        let tools = match self.web_search_max_uses {
            Some(max_uses) => vec![WebSearchTool {
                tool_type: WEB_SEARCH_TOOL_TYPE,
                name: "web_search",
                max_uses,
            }],
            None => Vec::new(),
        };

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: vec![Message {
                role: "user",
                content: user_input,
            }],
            tools,
        };

        tracing::debug!(model = %self.model, "sending messages request");

        let response = self
            .client
            .post(API_BASE_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .unwrap_or_default()
                .chars()
                .take(200)
                .collect::<String>();
            return Err(Error::Api(format!("{} {}", status, detail)));
        }

        let parsed: MessagesResponse = response.json()?;
        let text: String = parsed
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text.as_str())
            .collect();

        Ok(text)
    }
}
