use super::timeout::TimeoutConfig;
use crate::provider::{ProviderError, Result};
use reqwest::Client;

/// HTTP client shared by the model provider and the backend callbacks
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http_client: Client,
    timeout_config: TimeoutConfig,
}

impl ProviderClient {
    /// Get a reference to the underlying HTTP client
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn timeout_config(&self) -> &TimeoutConfig {
        &self.timeout_config
    }

    /// Create a builder for configuring a provider client
    pub fn builder() -> ProviderClientBuilder {
        ProviderClientBuilder::default()
    }
}

/// Builder for creating a ProviderClient with custom configuration
#[derive(Debug)]
pub struct ProviderClientBuilder {
    timeout_config: TimeoutConfig,
    proxy: Option<String>,
    user_agent: Option<String>,
}

impl Default for ProviderClientBuilder {
    fn default() -> Self {
        Self {
            timeout_config: TimeoutConfig::default(),
            proxy: None,
            user_agent: Some(format!("agent-orchestra/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl ProviderClientBuilder {
    /// Set the timeout configuration
    pub fn timeout_config(mut self, config: TimeoutConfig) -> Self {
        self.timeout_config = config;
        self
    }

    /// Set a proxy URL
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set a custom user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the provider client
    pub fn build(self) -> Result<ProviderClient> {
        let mut client_builder = Client::builder()
            .connect_timeout(self.timeout_config.connect_timeout)
            .timeout(self.timeout_config.request_timeout);

        // Avoid reading system proxy settings in environments where it may panic
        // (e.g. headless CI/macOS sandbox without a dynamic store).
        if self.proxy.is_none() {
            client_builder = client_builder.no_proxy();
        }

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        }

        if let Some(proxy_url) = self.proxy {
            let proxy = reqwest::Proxy::all(&proxy_url)
                .map_err(|e| ProviderError::RequestFailed(format!("Invalid proxy: {}", e)))?;
            client_builder = client_builder.proxy(proxy);
        }

        let http_client = client_builder.build().map_err(|e| {
            ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(ProviderClient {
            http_client,
            timeout_config: self.timeout_config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let client = ProviderClient::builder().build();
        assert!(client.is_ok());
    }

    #[test]
    fn test_builder_custom_timeout() {
        let client = ProviderClient::builder()
            .timeout_config(TimeoutConfig::from_secs(30))
            .build()
            .unwrap();
        assert_eq!(client.timeout_config().request_timeout.as_secs(), 30);
    }

    #[test]
    fn test_builder_with_proxy() {
        let client = ProviderClient::builder()
            .proxy("http://localhost:8080")
            .build();
        assert!(client.is_ok());
    }
}
