use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API error: {0}")]
    Api(String),
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Stream the completion token-by-token through `tx`, in generation
    /// order. A dropped receiver ends the stream early without error.
    async fn generate_stream(
        &self,
        prompt: &str,
        tx: mpsc::Sender<String>,
    ) -> Result<(), LlmError>;
}

/// Client for any OpenAI-compatible chat-completions endpoint.
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn request_body(&self, prompt: &str, stream: bool) -> Value {
        serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": stream
        })
    }
}

/// Extract the content delta from one line of a chat-completions SSE body.
/// Returns `None` for non-data lines, `[DONE]` markers and malformed JSON.
pub fn parse_stream_line(line: &str) -> Option<String> {
    // The SSE format allows "data:" with or without the following space.
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data.trim() == "[DONE]" {
        return None;
    }
    let value: Value = serde_json::from_str(data).ok()?;
    value["choices"][0]["delta"]["content"]
        .as_str()
        .map(|s| s.to_string())
}

#[async_trait]
impl LlmProvider for OpenAIClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(prompt, false))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::Api(format!(
                "model returned status {}",
                response.status()
            )));
        }

        let result: Value = response.json().await?;
        let content = result["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::Api("response is missing message content".to_string()))?
            .to_string();

        Ok(content)
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        tx: mpsc::Sender<String>,
    ) -> Result<(), LlmError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(prompt, true))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::Api(format!(
                "model returned status {}",
                response.status()
            )));
        }

        let mut stream = response.bytes_stream();
        // A data: line can straddle a chunk boundary, so parse only complete
        // lines and carry the remainder over to the next chunk.
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = buffer.find('\n') {
                let line: String = buffer.drain(..=pos).collect();
                if let Some(content) = parse_stream_line(line.trim_end()) {
                    if tx.send(content).await.is_err() {
                        // Consumer stopped listening.
                        return Ok(());
                    }
                }
            }
        }

        // A final line without a trailing newline still carries a delta.
        if let Some(content) = parse_stream_line(buffer.trim_end()) {
            let _ = tx.send(content).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(url: &str) -> LlmConfig {
        LlmConfig {
            url: url.to_string(),
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    #[test]
    fn test_parse_stream_line_extracts_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(parse_stream_line(line), Some("Hello".to_string()));
    }

    #[test]
    fn test_parse_stream_line_skips_done_marker() {
        assert_eq!(parse_stream_line("data: [DONE]"), None);
        assert_eq!(parse_stream_line("data:[DONE]"), None);
    }

    #[test]
    fn test_parse_stream_line_accepts_data_without_space() {
        let line = r#"data:{"choices":[{"delta":{"content":"Hi"}}]}"#;
        assert_eq!(parse_stream_line(line), Some("Hi".to_string()));
    }

    #[test]
    fn test_parse_stream_line_skips_non_data_and_malformed() {
        assert_eq!(parse_stream_line(": keep-alive"), None);
        assert_eq!(parse_stream_line("data: {not json"), None);
        assert_eq!(parse_stream_line(r#"data: {"choices":[]}"#), None);
    }

    #[tokio::test]
    async fn test_generate_returns_message_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"Restart the print spooler."}}]}"#)
            .create_async()
            .await;

        let client = OpenAIClient::new(&test_config(&server.url()));
        let content = client.generate("printer not detected").await.unwrap();
        assert_eq!(content, "Restart the print spooler.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_rejects_content_free_success_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"object":"chat.completion"}"#)
            .create_async()
            .await;

        let client = OpenAIClient::new(&test_config(&server.url()));
        let err = client.generate("anything").await.unwrap_err();
        assert!(matches!(err, LlmError::Api(_)));
    }

    #[tokio::test]
    async fn test_generate_surfaces_api_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("upstream broke")
            .create_async()
            .await;

        let client = OpenAIClient::new(&test_config(&server.url()));
        let err = client.generate("anything").await.unwrap_err();
        assert!(matches!(err, LlmError::Api(_)));
    }

    #[tokio::test]
    async fn test_generate_stream_forwards_deltas_in_order() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Check \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"the \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"cable.\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let client = OpenAIClient::new(&test_config(&server.url()));
        let (tx, mut rx) = mpsc::channel(16);
        client.generate_stream("no display", tx).await.unwrap();

        let mut tokens = Vec::new();
        while let Some(token) = rx.recv().await {
            tokens.push(token);
        }
        assert_eq!(tokens, vec!["Check ", "the ", "cable."]);
    }

    #[tokio::test]
    async fn test_generate_stream_reassembles_lines_split_across_chunks() {
        use std::io::Write;

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_chunked_body(|w| {
                // Second data: line is split mid-JSON across two chunks.
                w.write_all(
                    b"data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n\
                      data: {\"choices\":[{\"delta\":{\"con",
                )?;
                w.write_all(b"tent\":\" world\"}}]}\n\ndata: [DONE]\n\n")
            })
            .create_async()
            .await;

        let client = OpenAIClient::new(&test_config(&server.url()));
        let (tx, mut rx) = mpsc::channel(16);
        client.generate_stream("no display", tx).await.unwrap();

        let mut tokens = Vec::new();
        while let Some(token) = rx.recv().await {
            tokens.push(token);
        }
        assert_eq!(tokens, vec!["Hello", " world"]);
    }

    #[tokio::test]
    async fn test_generate_stream_rejects_error_status_before_streaming() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .create_async()
            .await;

        let client = OpenAIClient::new(&test_config(&server.url()));
        let (tx, mut rx) = mpsc::channel(16);
        let err = client.generate_stream("anything", tx).await.unwrap_err();
        assert!(matches!(err, LlmError::Api(_)));
        assert!(rx.recv().await.is_none());
    }
}
