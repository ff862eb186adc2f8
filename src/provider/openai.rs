use super::{
    GenerateOptions, GenerateResponse, LlmProvider, Message, ProviderClient,
    ProviderClientBuilder, ProviderError, Result, StreamResponse, TimeoutConfig, Usage,
};
use futures_util::StreamExt;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat completions provider
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: ProviderClient,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a new provider with default configuration
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).model(model).build()
    }

    pub fn builder() -> OpenAiProviderBuilder {
        OpenAiProviderBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request_body(
        &self,
        messages: Vec<Message>,
        options: Option<GenerateOptions>,
        stream: bool,
    ) -> serde_json::Value {
        let opts = options.unwrap_or_default();

        let messages_json: Vec<serde_json::Value> = messages
            .into_iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": &self.model,
            "messages": messages_json,
            "stream": stream,
        });

        if let Some(temp) = opts.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max) = opts.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }
        if let Some(top_p) = opts.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }
        if let Some(stop) = opts.stop {
            body["stop"] = serde_json::json!(stop);
        }

        body
    }

    async fn send_request(&self, body: serde_json::Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .http_client()
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key".to_string(),
            ));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            return Err(ProviderError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::NOT_FOUND && text.contains("model") {
                return Err(ProviderError::ModelNotAvailable(self.model.clone()));
            }
            return Err(ProviderError::RequestFailed(format!("{}: {}", status, text)));
        }

        Ok(response)
    }

    fn parse_completion(&self, json: &serde_json::Value) -> Result<GenerateResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| ProviderError::ParseError("response has no choices".to_string()))?;

        let content = choice["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        let usage = json.get("usage").map(|u| Usage {
            prompt_tokens: u["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: u["completion_tokens"].as_u64().unwrap_or(0) as u32,
            total_tokens: u["total_tokens"].as_u64().unwrap_or(0) as u32,
        });

        Ok(GenerateResponse {
            content,
            usage,
            model: json["model"]
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| self.model.clone()),
            finish_reason: choice["finish_reason"].as_str().map(String::from),
        })
    }
}

/// Builder for creating an OpenAiProvider with custom configuration
pub struct OpenAiProviderBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    client_builder: ProviderClientBuilder,
}

impl Default for OpenAiProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            base_url: None,
            client_builder: ProviderClient::builder(),
        }
    }
}

impl OpenAiProviderBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout_config(mut self, config: TimeoutConfig) -> Self {
        self.client_builder = self.client_builder.timeout_config(config);
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.client_builder = self.client_builder.proxy(proxy);
        self
    }

    pub fn build(self) -> Result<OpenAiProvider> {
        let api_key = self
            .api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::AuthenticationFailed("API key is required".to_string()))?;

        let model = self
            .model
            .ok_or_else(|| ProviderError::RequestFailed("Model is required".to_string()))?;

        let client = self.client_builder.build()?;

        Ok(OpenAiProvider {
            api_key,
            model,
            client,
            base_url: self
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn generate(
        &self,
        messages: Vec<Message>,
        options: Option<GenerateOptions>,
    ) -> Pin<Box<dyn Future<Output = Result<GenerateResponse>> + Send + '_>> {
        Box::pin(async move {
            tracing::debug!(model = %self.model, messages = messages.len(), "chat completion request");

            let body = self.build_request_body(messages, options, false);
            let response = self.send_request(body).await?;

            let json: serde_json::Value = response
                .json()
                .await
                .map_err(|e| ProviderError::ParseError(e.to_string()))?;

            let parsed = self.parse_completion(&json)?;
            if let Some(usage) = &parsed.usage {
                tracing::debug!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "chat completion usage"
                );
            }
            Ok(parsed)
        })
    }

    fn generate_stream(
        &self,
        messages: Vec<Message>,
        options: Option<GenerateOptions>,
    ) -> Pin<Box<dyn Future<Output = Result<StreamResponse>> + Send + '_>> {
        Box::pin(async move {
            let body = self.build_request_body(messages, options, true);
            let response = self.send_request(body).await?;

            let (tx, rx) = mpsc::channel(100);

            tokio::spawn(async move {
                let mut stream = response.bytes_stream();
                let mut buffer = String::new();

                'outer: while let Some(chunk) = stream.next().await {
                    match chunk {
                        Ok(bytes) => {
                            buffer.push_str(&String::from_utf8_lossy(&bytes));

                            while let Some(line_end) = buffer.find('\n') {
                                let line = buffer[..line_end].trim().to_string();
                                buffer.drain(..=line_end);

                                if let Some(data) = line.strip_prefix("data: ") {
                                    if data == "[DONE]" {
                                        break 'outer;
                                    }

                                    if let Ok(json) =
                                        serde_json::from_str::<serde_json::Value>(data)
                                    {
                                        if let Some(content) =
                                            json["choices"][0]["delta"]["content"].as_str()
                                        {
                                            if tx.send(Ok(content.to_string())).await.is_err() {
                                                break 'outer;
                                            }
                                        }
                                    }
                                }
                            }
                        }
                        Err(e) => {
                            let _ = tx
                                .send(Err(ProviderError::RequestFailed(e.to_string())))
                                .await;
                            break;
                        }
                    }
                }
            });

            Ok(StreamResponse { receiver: rx })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::builder()
            .api_key("sk-test")
            .model("gpt-4o-mini")
            .base_url("http://localhost:1/v1/")
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_requires_api_key() {
        let result = OpenAiProvider::builder().model("gpt-4o").build();
        assert!(matches!(result, Err(ProviderError::AuthenticationFailed(_))));

        let result = OpenAiProvider::builder().api_key("").model("gpt-4o").build();
        assert!(matches!(result, Err(ProviderError::AuthenticationFailed(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(provider().base_url(), "http://localhost:1/v1");
    }

    #[test]
    fn test_request_body_includes_options() {
        let body = provider().build_request_body(
            vec![Message::system("sys"), Message::user("hi")],
            Some(GenerateOptions {
                temperature: Some(0.5),
                max_tokens: Some(64),
                ..Default::default()
            }),
            false,
        );

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["max_tokens"], 64);
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn test_parse_completion_without_choices_fails() {
        let err = provider()
            .parse_completion(&serde_json::json!({ "choices": [] }))
            .unwrap_err();
        assert!(matches!(err, ProviderError::ParseError(_)));
    }
}
