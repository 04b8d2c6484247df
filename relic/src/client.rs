//! Chat-completions API client.
//!
//! A thin wrapper over [`reqwest::Client`] for OpenAI-style
//! `/chat/completions` endpoints. The pipeline needs exactly one call
//! shape: a list of messages in, the text of the single reply out.
//! Streaming, tool calling, and token accounting are out of scope.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// Client for a hosted chat-completions endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Create a client from the pipeline config.
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            http_client: config.http_client(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        }
    }

    /// The underlying HTTP client, shared with the image loader.
    #[must_use]
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(2);
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// A plain text message with the given role.
    #[must_use]
    pub fn text_message(role: &str, content: &str) -> Value {
        json!({ "role": role, "content": content })
    }

    /// A user message carrying an instruction plus one inline image.
    #[must_use]
    pub fn image_message(text: &str, data_url: &str) -> Value {
        json!({
            "role": "user",
            "content": [
                { "type": "text", "text": text },
                { "type": "image_url", "image_url": { "url": data_url } }
            ]
        })
    }

    /// Send one chat-completion request and return the reply text.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Upstream`] when the endpoint returns non-2xx or
    /// a reply without content; transport variants for network
    /// failures.
    #[instrument(skip(self, messages), fields(model = %model))]
    pub async fn complete(&self, model: &str, messages: Vec<Value>) -> Result<String> {
        let body = json!({ "model": model, "messages": messages });
        let url = format!("{}/chat/completions", self.base_url);

        debug!("sending chat completion request");

        let response = self
            .http_client
            .post(&url)
            .headers(self.auth_headers())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(format!(
                "chat API error ({status}): {error_text}"
            )));
        }

        let reply: Value = response.json().await?;
        debug!(reply = %reply, "chat API response");

        reply["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| PipelineError::upstream("reply contained no completion content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> ChatClient {
        let config = PipelineConfig::new("test-key").unwrap();
        ChatClient::new(&config)
    }

    #[test]
    fn test_auth_headers() {
        let headers = test_client().auth_headers();
        assert_eq!(
            headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer test-key")
        );
        assert_eq!(
            headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", test_client());
        assert!(!rendered.contains("test-key"));
    }

    #[test]
    fn test_image_message_shape() {
        let msg = ChatClient::image_message("describe this", "data:image/jpeg;base64,AAAA");
        assert_eq!(msg["role"], "user");
        assert_eq!(msg["content"][0]["type"], "text");
        assert_eq!(msg["content"][0]["text"], "describe this");
        assert_eq!(msg["content"][1]["type"], "image_url");
        assert_eq!(
            msg["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,AAAA"
        );
    }

    #[test]
    fn test_text_message_shape() {
        let msg = ChatClient::text_message("system", "be precise");
        assert_eq!(msg["role"], "system");
        assert_eq!(msg["content"], "be precise");
    }
}
