//! Typed view of the webhook body that triggers the workflow.
//!
//! Every field is optional on the wire: missing or `null` values fall back
//! to their defaults so a sparse trigger still reaches the steps that can
//! report what is missing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier that may arrive as a JSON number or a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarId {
    Int(i64),
    Text(String),
}

impl ScalarId {
    pub fn to_json(&self) -> Value {
        match self {
            ScalarId::Int(i) => Value::from(*i),
            ScalarId::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for ScalarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarId::Int(i) => write!(f, "{}", i),
            ScalarId::Text(s) => f.write_str(s),
        }
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookRequest {
    #[serde(deserialize_with = "nullable")]
    pub body: WebhookBody,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebhookBody {
    #[serde(deserialize_with = "nullable")]
    pub options: TriggerOptions,
    #[serde(deserialize_with = "nullable")]
    pub payload: TemplatePayload,
    #[serde(rename = "messageGenerateReqDTO", deserialize_with = "nullable")]
    pub message_generate_req: MessageGenerateReq,
    #[serde(deserialize_with = "nullable")]
    pub chat_content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriggerOptions {
    #[serde(deserialize_with = "nullable")]
    pub test_message: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplatePayload {
    pub email_template_id: Option<ScalarId>,
    pub seq: Option<ScalarId>,
    pub email_template_round_version_id: Option<ScalarId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageGenerateReq {
    #[serde(deserialize_with = "nullable")]
    pub payload: UserPayload,
    #[serde(deserialize_with = "nullable")]
    pub seller_info: SellerInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPayload {
    pub user_id: Option<ScalarId>,
    #[serde(deserialize_with = "nullable")]
    pub conversation_id: String,
    #[serde(deserialize_with = "nullable")]
    pub session_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SellerInfo {
    #[serde(deserialize_with = "nullable")]
    pub base_info: SellerBaseInfo,
    #[serde(deserialize_with = "nullable")]
    pub contact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SellerBaseInfo {
    #[serde(deserialize_with = "nullable")]
    pub company_name: String,
    #[serde(deserialize_with = "nullable")]
    pub company_intro: String,
    #[serde(deserialize_with = "nullable")]
    pub main_product: String,
    #[serde(deserialize_with = "nullable")]
    pub website: String,
}

/// Flat seller record fed into the prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerRecord {
    pub seller_company_name: String,
    pub seller_company_intro: String,
    pub seller_main_product: String,
    pub seller_website: String,
    pub seller_contact: String,
}

impl From<&SellerInfo> for SellerRecord {
    fn from(info: &SellerInfo) -> Self {
        Self {
            seller_company_name: info.base_info.company_name.clone(),
            seller_company_intro: info.base_info.company_intro.clone(),
            seller_main_product: info.base_info.main_product.clone(),
            seller_website: info.base_info.website.clone(),
            seller_contact: info.contact.clone(),
        }
    }
}

/// Sample trigger used by the command-line demo.
pub fn demo_webhook() -> Value {
    serde_json::json!({
        "body": {
            "options": {
                "testMessage": false
            },
            "payload": {
                "seq": 1
            },
            "messageGenerateReqDTO": {
                "payload": {
                    "userId": "113",
                    "conversationId": "ZusBkKukTK4a",
                    "sessionId": "bec29db0-a970-4fe2-4ac0-55a88eda3d2a"
                },
                "sellerInfo": {
                    "baseInfo": {
                        "companyName": "示例公司",
                        "companyIntro": "一家专业的 B2B 服务提供商",
                        "mainProduct": "定制化解决方案",
                        "website": "https://example.com"
                    },
                    "contact": "contact@example.com"
                }
            },
            "chatContent": "请帮我生成一封营销邮件，用于向潜在客户介绍我们的产品和服务。"
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_demo_webhook_parses() {
        let request: WebhookRequest = serde_json::from_value(demo_webhook()).unwrap();
        let body = &request.body;
        assert!(!body.options.test_message);
        assert_eq!(body.payload.seq, Some(ScalarId::Int(1)));
        assert_eq!(body.payload.email_template_id, None);
        assert_eq!(
            body.message_generate_req.payload.user_id,
            Some(ScalarId::Text("113".into()))
        );
        assert_eq!(body.message_generate_req.seller_info.contact, "contact@example.com");
    }

    #[test]
    fn test_sparse_and_null_fields_default() {
        let request: WebhookRequest = serde_json::from_value(json!({
            "body": {
                "options": null,
                "chatContent": null,
                "messageGenerateReqDTO": {"sellerInfo": {"baseInfo": {"companyName": null}}}
            }
        }))
        .unwrap();
        assert!(!request.body.options.test_message);
        assert_eq!(request.body.chat_content, "");
        assert_eq!(
            request.body.message_generate_req.seller_info.base_info.company_name,
            ""
        );

        let empty: WebhookRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty, WebhookRequest::default());
    }

    #[test]
    fn test_seller_record_keys() {
        let info = SellerInfo {
            base_info: SellerBaseInfo {
                company_name: "ACME".into(),
                ..Default::default()
            },
            contact: "a@b.c".into(),
        };
        let value = serde_json::to_value(SellerRecord::from(&info)).unwrap();
        assert_eq!(value["sellerCompanyName"], "ACME");
        assert_eq!(value["sellerContact"], "a@b.c");
        assert_eq!(value["sellerWebsite"], "");
    }

    #[test]
    fn test_scalar_id_display_and_json() {
        assert_eq!(ScalarId::Int(7).to_string(), "7");
        assert_eq!(ScalarId::Text("456".into()).to_json(), json!("456"));
    }
}
