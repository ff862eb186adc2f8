mod client;
mod openai;
pub mod scripted;
mod timeout;

pub use client::{ProviderClient, ProviderClientBuilder};
pub use openai::{OpenAiProvider, OpenAiProviderBuilder};
pub use scripted::ScriptedProvider;
pub use timeout::TimeoutConfig;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// 聊天消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// 生成参数配置
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

impl GenerateOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Default::default()
        }
    }
}

/// Token 使用统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// 生成响应
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub content: String,
    pub usage: Option<Usage>,
    pub model: String,
    pub finish_reason: Option<String>,
}

/// Provider 错误类型
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// API 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(String),
    /// 认证失败
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    /// 速率限制
    #[error("Rate limited{}", .retry_after.map(|s| format!(", retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },
    /// 模型不可用
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),
    /// 响应解析失败
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// 大模型 Provider trait
///
/// 定义了与大语言模型交互的统一接口
pub trait LlmProvider: Send + Sync {
    /// 返回 provider 名称
    fn name(&self) -> &str;

    /// 返回当前使用的模型
    fn model(&self) -> &str;

    /// 生成文本响应
    fn generate(
        &self,
        messages: Vec<Message>,
        options: Option<GenerateOptions>,
    ) -> Pin<Box<dyn Future<Output = Result<GenerateResponse>> + Send + '_>>;

    /// 流式生成（可选实现）
    fn generate_stream(
        &self,
        _messages: Vec<Message>,
        _options: Option<GenerateOptions>,
    ) -> Pin<Box<dyn Future<Output = Result<StreamResponse>> + Send + '_>> {
        Box::pin(async { Err(ProviderError::Other("Streaming not supported".into())) })
    }
}

/// 流式响应
pub struct StreamResponse {
    pub receiver: tokio::sync::mpsc::Receiver<Result<String>>,
}
