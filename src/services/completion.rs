use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Serialize;

use crate::config::UpstreamConfig;

/// Build the instruction prompt for one question about one document.
///
/// Both inputs are embedded verbatim. Callers are responsible for keeping the
/// document within the provider's input limit.
pub fn build_prompt(document: &str, question: &str) -> String {
    format!(
        "You are an AI assistant trained to help users understand US healthcare documents.\n\
         \n\
         Document:\n\
         {document}\n\
         \n\
         User Question:\n\
         {question}\n\
         \n\
         Answer in simple, clear language. If the answer is not in the document, say so."
    )
    .trim()
    .to_string()
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub stream: bool,
}

/// Client for the upstream chat-completion API.
#[derive(Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl CompletionClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        // No overall timeout: it would cut long answers off mid-stream.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Open one streaming completion for `prompt`.
    ///
    /// Only the response head has been received when this returns; the body
    /// is left untouched so the caller can forward it as it arrives. A
    /// non-success status is turned into an error after logging the body.
    pub async fn open_stream(&self, prompt: &str) -> Result<reqwest::Response> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .context("No upstream API key configured")?;

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            stream: true,
        };

        let mut request = self
            .client
            .post(self.endpoint())
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(ACCEPT, "text/event-stream")
            .json(&body);

        if let Some(referer) = &self.config.referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.config.title {
            request = request.header("X-Title", title);
        }

        tracing::info!(
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "Opening upstream completion stream"
        );

        let response = request
            .send()
            .await
            .context("Failed to reach completion API")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!("Completion API responded with {status}: {detail}");
            anyhow::bail!("Completion API responded with {status}");
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_inputs_verbatim() {
        let prompt = build_prompt("Deductible: $500\n", "What is the deductible?");
        assert!(prompt.starts_with("You are an AI assistant"));
        assert!(prompt.contains("Document:\nDeductible: $500\n\n\nUser Question:"));
        assert!(prompt.contains("User Question:\nWhat is the deductible?\n\n"));
        assert!(prompt.ends_with("If the answer is not in the document, say so."));
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatCompletionRequest {
            model: "mistralai/mistral-7b-instruct",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.3,
            stream: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "mistralai/mistral-7b-instruct");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = UpstreamConfig {
            base_url: "https://openrouter.ai/api/v1/".to_string(),
            model: "m".to_string(),
            temperature: 0.3,
            api_key: None,
            referer: None,
            title: None,
            connect_timeout_secs: 1,
        };
        let client = CompletionClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }
}
