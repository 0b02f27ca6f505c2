//! OpenRouter-backed oracle.
//!
//! OpenAI-compatible chat completions, non-streaming and SSE streaming. The
//! client is stateless apart from its configuration and is safe to share
//! across concurrent turns. API key resolution: `COMPASS_LLM_API_KEY` first,
//! then `OPENROUTER_API_KEY`.

use std::time::Duration;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::warn;

use compass_core::{CoreError, FragmentStream, Oracle};

const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Oracle implementation over OpenRouter's chat completions API.
pub struct OpenRouterClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenRouterClient {
    /// Create a client from environment variables. Returns `None` when no key
    /// is configured.
    pub fn from_env() -> Option<Self> {
        let key = std::env::var("COMPASS_LLM_API_KEY")
            .or_else(|_| std::env::var("OPENROUTER_API_KEY"))
            .ok()?
            .trim()
            .to_string();
        if key.is_empty() {
            return None;
        }
        let model = std::env::var("COMPASS_LLM_MODEL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Some(Self::new(key).with_model(&model))
    }

    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.trim().to_string(),
            model: DEFAULT_MODEL.to_string(),
            client,
        }
    }

    /// Set the model (e.g. `meta-llama/llama-3.3-70b-instruct`).
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn request(&self, instructions: &str, input: &str, stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: instructions.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: input.to_string(),
                },
            ],
            temperature: Some(0.2),
            max_tokens: Some(1024),
            stream: stream.then_some(true),
        }
    }

    async fn post(&self, body: &ChatRequest) -> Result<reqwest::Response, CoreError> {
        let url = format!("{}/chat/completions", OPENROUTER_API_BASE);
        let res = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", "https://compass.local")
            .header("X-Title", "Compass-Career-Assistant")
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| CoreError::Oracle(format!("request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(CoreError::Oracle(format!("API error {}: {}", status, body)));
        }
        Ok(res)
    }
}

/// Extracts the delta fragment from one SSE line, or signals `[DONE]`.
fn delta_from_sse_line(line: &str) -> SseEvent {
    let Some(data) = line.trim().strip_prefix("data: ") else {
        return SseEvent::Skip;
    };
    if data == "[DONE]" {
        return SseEvent::Done;
    }
    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(json) => match json["choices"][0]["delta"]["content"].as_str() {
            Some(delta) if !delta.is_empty() => SseEvent::Fragment(delta.to_string()),
            _ => SseEvent::Skip,
        },
        Err(_) => SseEvent::Skip,
    }
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Fragment(String),
    Done,
    Skip,
}

/// Finds a JSON object in a possibly chatty oracle reply: direct parse first,
/// then the outermost brace window.
fn parse_json_object(raw: &str) -> Option<serde_json::Value> {
    let trimmed = raw.trim();
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if v.is_object() {
            return Some(v);
        }
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<serde_json::Value>(&raw[start..=end])
        .ok()
        .filter(|v| v.is_object())
}

#[async_trait::async_trait]
impl Oracle for OpenRouterClient {
    async fn generate(&self, instructions: &str, input: &str) -> Result<String, CoreError> {
        let body = self.request(instructions, input, false);
        let res = self.post(&body).await?;
        let parsed: ChatResponse = res
            .json()
            .await
            .map_err(|e| CoreError::Oracle(format!("response parse failed: {}", e)))?;
        parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| CoreError::Oracle("empty choices in response".into()))
    }

    async fn generate_stream(
        &self,
        instructions: &str,
        input: &str,
    ) -> Result<FragmentStream, CoreError> {
        let body = self.request(instructions, input, true);
        let res = self.post(&body).await?;
        let mut bytes = res.bytes_stream();

        let fragments = async_stream::stream! {
            // SSE lines can split across chunks; carry the unterminated tail.
            let mut carry = String::new();
            let mut done = false;
            while !done {
                let Some(chunk) = bytes.next().await else { break };
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        // Transport died mid-stream: end cleanly with what was
                        // already emitted.
                        warn!(error = %e, "stream transport error");
                        break;
                    }
                };
                carry.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = carry.find('\n') {
                    let line: String = carry.drain(..=pos).collect();
                    match delta_from_sse_line(&line) {
                        SseEvent::Fragment(f) => yield f,
                        SseEvent::Done => {
                            done = true;
                            break;
                        }
                        SseEvent::Skip => {}
                    }
                }
            }
        };
        Ok(Box::pin(fragments))
    }

    async fn extract_structured(
        &self,
        schema: &str,
        input: &str,
    ) -> Result<serde_json::Value, CoreError> {
        let instructions = format!(
            "You convert text to JSON. Reply with a single JSON object matching this schema \
             and nothing else. No conversational text, no Markdown fences.\n\nSchema:\n{}",
            schema
        );
        let raw = self.generate(&instructions, input).await?;
        parse_json_object(&raw).ok_or_else(|| {
            let head: String = raw.chars().take(120).collect();
            CoreError::Extraction(format!("oracle returned non-JSON output: {:?}", head))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_line_parsing() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(delta_from_sse_line(line), SseEvent::Fragment("Hel".into()));
        assert_eq!(delta_from_sse_line("data: [DONE]"), SseEvent::Done);
        assert_eq!(delta_from_sse_line(": keep-alive"), SseEvent::Skip);
        assert_eq!(
            delta_from_sse_line(r#"data: {"choices":[{"delta":{}}]}"#),
            SseEvent::Skip
        );
    }

    #[test]
    fn parse_json_object_direct_and_embedded() {
        assert!(parse_json_object(r#"{"topic": "rust"}"#).is_some());
        let chatty = "Sure! Here is the JSON:\n{\"topic\": \"rust\", \"location\": \"Berlin\"}\nHope that helps.";
        let v = parse_json_object(chatty).unwrap();
        assert_eq!(v["location"], "Berlin");
        assert!(parse_json_object("no braces here").is_none());
        assert!(parse_json_object("[1, 2, 3]").is_none());
    }
}
