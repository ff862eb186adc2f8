use super::payload::SellerRecord;
use serde_json::Value;

/// Template-designer system prompt.
///
/// `market_info` is the `data` member of the sales-brain response; both it
/// and the seller record are embedded as pretty-printed JSON.
pub fn template_designer_prompt(
    seller: &SellerRecord,
    chat_content: &str,
    market_info: &Value,
) -> String {
    let market_json = pretty(market_info);
    let seller_json = serde_json::to_value(seller)
        .map(|v| pretty(&v))
        .unwrap_or_default();

    format!(
        r#"
# Role
你是一位 B2B 商务邮件结构设计专家，
擅长在严格事实与合规约束下，
为不同业务场景设计【自然、有情商、可规模化复用的邮件模版结构】。

你不预设邮件类型。
邮件可能是（但不限于）：
- 营销 / 冷启动 / 客户触达
- 老客户跟进
- 节日或问候类沟通
- 关系维护
- 信息同步或业务通知
- 其他由用户明确说明的商务沟通场景

邮件的具体场景、目的与使用语境，
**完全以 User Input 为准。**

你的任务不是直接写一封完整邮件，
而是输出一个【可被程序安全拼装的邮件模版结构】，
用于后续根据不同客户与场景进行个性化生成。

---

# 全局语言强制规则（最高优先级）

- 本 Prompt 的所有输出内容 **必须使用中文**
- 包括但不限于：
  - Type 1 的邮件正文
  - Type 2 的策略指令
  - 标题策略、钩子策略、执行说明
- 所有内容必须符合自然商务沟通习惯

---

# Knowledge Base（我方事实唯一来源）

## marketinfo_json_data
用于存储市场或行业层面的通用信息，
如公司优势、解决方案方向等（仅限其中明确写明的内容）。

## sellerscompanybaseinfo_json_data
卖方企业基础信息：
- sellerCompanyName: {company_name}
- sellerCompanyIntro: {company_intro}
- sellerMainProduct: {main_product}
- sellerWebsite: {website}

---

# User Input

{chat_content}

---

# Output Format（严格）

仅输出 JSON，不得包含任何解释性文字。
**所有 content 字段必须使用中文表达。**

```json
{{
  "template_structure": [
    {{
      "sectionId": 1,
      "type": 2,
      "content": "策略：基于邮件场景与目标客户角色，从对方视角出发，生成一个信息量较低、语气试探、带有不确定性的标题，用于引导对方产生打开邮件的兴趣。",
      "fact_sources": ["buyer_context"]
    }}
  ]
}}
```

# Knowledge Base 内容
[MARKET_INFO_START]
{market_json}
[MARKET_INFO_END]

[COMPANY_BASE_INFO_START]
{seller_json}
[COMPANY_BASE_INFO_END]
"#,
        company_name = seller.seller_company_name,
        company_intro = seller.seller_company_intro,
        main_product = seller.seller_main_product,
        website = seller.seller_website,
    )
}

/// Market info section of a sales-brain response, `{}` when absent.
pub fn market_info(sales_brain: Option<&Value>) -> Value {
    sales_brain
        .and_then(|body| body.get("data"))
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seller() -> SellerRecord {
        SellerRecord {
            seller_company_name: "示例公司".into(),
            seller_website: "https://example.com".into(),
            seller_contact: "contact@example.com".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_prompt_embeds_inputs() {
        let prompt = template_designer_prompt(
            &seller(),
            "写一封跟进邮件",
            &json!({"advantage": "交付快"}),
        );
        assert!(prompt.contains("- sellerCompanyName: 示例公司"));
        assert!(prompt.contains("# User Input\n\n写一封跟进邮件\n"));
        assert!(prompt.contains("\"advantage\": \"交付快\""));
        assert!(prompt.contains("\"sellerContact\": \"contact@example.com\""));
        assert!(prompt.contains("\"template_structure\": ["));
    }

    #[test]
    fn test_market_info_defaults_to_empty_object() {
        assert_eq!(market_info(None), json!({}));
        assert_eq!(market_info(Some(&json!({"code": 0}))), json!({}));
        assert_eq!(market_info(Some(&json!({"data": [1, 2]}))), json!([1, 2]));
    }
}
