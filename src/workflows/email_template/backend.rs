use super::payload::UserPayload;
use crate::config::BackendSettings;
use crate::error::{AgentError, Result};
use crate::provider::{ProviderClient, TimeoutConfig};
use reqwest::RequestBuilder;
use serde_json::{json, Value};

const SALES_BRAIN_PATH: &str = "/api/customer/sales_brain/getConfirmedSalesBrainEntityListForUser";
const PREVIEW_PATH: &str = "/api/v2/flow/previewEmailTemplate";
const CALLER: &str = "activepieces";

/// Calls to the sales-brain and template-preview services.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: ProviderClient,
    settings: BackendSettings,
}

impl BackendClient {
    pub fn new(settings: BackendSettings) -> Result<Self> {
        let client = ProviderClient::builder()
            .timeout_config(TimeoutConfig::from_secs(settings.timeout.as_secs()))
            .build()?;
        Ok(Self { client, settings })
    }

    /// Confirmed sales-brain entities for the requesting user.
    pub async fn sales_brain(&self, user_id: Option<&str>) -> Result<Value> {
        let url = endpoint(&self.settings.sales_brain_base_url, SALES_BRAIN_PATH);
        let mut request = self
            .client
            .http_client()
            .get(url)
            .header("X-Caller", CALLER)
            .header("Authorization", &self.settings.callback_auth);
        if let Some(user_id) = user_id {
            request = request.query(&[("userId", user_id)]);
        }
        send(request).await
    }

    /// Render the generated sections through the preview service.
    pub async fn preview(&self, user: &UserPayload, sections: Value) -> Result<Value> {
        let url = endpoint(&self.settings.preview_base_url, PREVIEW_PATH);
        let body = preview_body(user, sections);
        let request = self
            .client
            .http_client()
            .post(url)
            .header("X-Caller", CALLER)
            .json(&body);
        send(request).await
    }
}

pub fn preview_body(user: &UserPayload, sections: Value) -> Value {
    json!({
        "step": 1,
        "userId": user.user_id.as_ref().map(|id| id.to_json()).unwrap_or_else(|| json!("")),
        "content": "",
        "subject": "",
        "modelAnalysis": "",
        "conversationId": user.conversation_id,
        "sessionId": user.session_id,
        "status": 0,
        "emailTemplateList": sections,
    })
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Non-2xx statuses and bodies that are not JSON are both errors.
async fn send(request: RequestBuilder) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(AgentError::Backend {
            status: status.as_u16(),
            body: text,
        });
    }

    Ok(serde_json::from_str(&text)?)
}
