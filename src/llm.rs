use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Debug;

/// Seam to the hosted text-generation service. An empty `system` string
/// means the request carries no system message.
#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    async fn chat(&self, system: &str, user: &str) -> Result<String>;
}

pub fn create_llm(config: &Config) -> anyhow::Result<Box<dyn LlmClient>> {
    match config.llm.provider.as_str() {
        "openai" => {
            let cfg = config
                .llm
                .openai
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("OpenAI config missing"))?;
            let api_key = env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set in environment"))?;
            Ok(Box::new(OpenAIClient::new(
                &api_key,
                &cfg.model,
                cfg.base_url.as_deref(),
                config.llm.max_tokens,
                config.llm.temperature,
            )))
        }
        "ollama" => {
            let cfg = config
                .llm
                .ollama
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("Ollama config missing"))?;
            Ok(Box::new(OllamaClient::new(
                &cfg.base_url,
                &cfg.model,
                config.llm.temperature,
            )))
        }
        other => Err(anyhow::anyhow!("Unknown LLM provider: {}", other)),
    }
}

// --- OpenAI ---

#[derive(Debug)]
pub struct OpenAIClient {
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(
        api_key: &str,
        model: &str,
        base_url: Option<&str>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            max_tokens,
            temperature,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessageResponse,
}

#[derive(Deserialize)]
struct OpenAIMessageResponse {
    content: Option<String>,
}

fn build_messages(system: &str, user: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if !system.is_empty() {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system.to_string(),
        });
    }
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: user.to_string(),
    });
    messages
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = OpenAIRequest {
            model: self.model.clone(),
            messages: build_messages(system, user),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        log::debug!("OpenAI request: model={}", self.model);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(Error::upstream(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let result: OpenAIResponse = resp
            .json()
            .await
            .map_err(|e| Error::upstream(format!("Failed to parse OpenAI response: {}", e)))?;

        if let Some(choice) = result.choices.first() {
            if let Some(content) = &choice.message.content {
                return Ok(content.clone());
            }
        }

        Err(Error::upstream("OpenAI response empty or missing content"))
    }
}

// --- Ollama ---

#[derive(Debug)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, temperature: f32) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaMessageResponse,
}

#[derive(Deserialize)]
struct OllamaMessageResponse {
    content: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let request_body = OllamaRequest {
            model: self.model.clone(),
            messages: build_messages(system, user),
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };

        let resp = self.client.post(&url).json(&request_body).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(Error::upstream(format!("Ollama API error: {}", error_text)));
        }

        let result: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| Error::upstream(format!("Failed to parse Ollama response: {}", e)))?;
        Ok(result.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_response_parsing_success() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-3.5-turbo",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Once upon a time."
                },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 9, "completion_tokens": 12, "total_tokens": 21 }
        }"#;

        let result: OpenAIResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            result.choices[0].message.content.as_deref(),
            Some("Once upon a time.")
        );
    }

    #[test]
    fn openai_response_parsing_null_content() {
        let json = r#"{
            "choices": [{
                "message": { "role": "assistant", "content": null },
                "finish_reason": "content_filter"
            }]
        }"#;

        let result: OpenAIResponse = serde_json::from_str(json).unwrap();
        assert!(result.choices[0].message.content.is_none());
    }

    #[test]
    fn system_message_is_omitted_when_empty() {
        let messages = build_messages("", "hello");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");

        let messages = build_messages("be brief", "hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
    }

    #[tokio::test]
    async fn openai_chat_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"idea text"}}]}"#,
            )
            .create_async()
            .await;

        let client = OpenAIClient::new("test-key", "gpt-3.5-turbo", Some(&server.url()), 500, 0.8);
        let result = client.chat("", "give me an idea").await.unwrap();
        assert_eq!(result, "idea text");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn openai_chat_rate_limit_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"rate limited"}}"#)
            .create_async()
            .await;

        let client = OpenAIClient::new("test-key", "gpt-3.5-turbo", Some(&server.url()), 500, 0.8);
        let err = client.chat("", "hi").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn openai_chat_malformed_body_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = OpenAIClient::new("test-key", "gpt-3.5-turbo", Some(&server.url()), 500, 0.8);
        let err = client.chat("", "hi").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn ollama_chat_success() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":{"role":"assistant","content":"plot text"}}"#)
            .create_async()
            .await;

        let client = OllamaClient::new(&server.url(), "llama3", 0.8);
        let result = client.chat("sys", "write a plot").await.unwrap();
        assert_eq!(result, "plot text");
    }
}
