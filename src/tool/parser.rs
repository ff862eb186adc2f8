use super::ToolCall;
use crate::extract::json_candidate;
use serde_json::Value;

pub struct ToolCallParser;

impl ToolCallParser {
    pub fn extract_from_content(content: &str) -> Vec<ToolCall> {
        let calls = Self::parse_json_format(content);
        if !calls.is_empty() {
            return calls;
        }

        Self::parse_xml_format(content)
    }

    /// `{"tool_calls": [{"id", "name", "parameters"}]}`, fenced or inline
    pub fn parse_json_format(content: &str) -> Vec<ToolCall> {
        let Ok(json) = serde_json::from_str::<Value>(json_candidate(content)) else {
            return Vec::new();
        };
        let Some(tool_calls) = json.get("tool_calls").and_then(|v| v.as_array()) else {
            return Vec::new();
        };

        tool_calls
            .iter()
            .enumerate()
            .filter_map(|(i, call)| {
                let name = call.get("name").and_then(|v| v.as_str())?;
                let parameters = call.get("parameters")?;
                Some(ToolCall {
                    id: call
                        .get("id")
                        .and_then(|v| v.as_str())
                        .map(String::from)
                        .unwrap_or_else(|| format!("call_{}", i)),
                    name: name.to_string(),
                    parameters: parameters.clone(),
                })
            })
            .collect()
    }

    pub fn parse_xml_format(content: &str) -> Vec<ToolCall> {
        let mut calls = Vec::new();
        let mut current_pos = 0;

        while let Some(start) = content[current_pos..].find("<tool_call") {
            let start_pos = current_pos + start;
            let Some(end) = content[start_pos..].find("</tool_call>") else {
                break;
            };
            let end_pos = start_pos + end + "</tool_call>".len();

            if let Some(call) = Self::parse_single_xml_call(&content[start_pos..end_pos], calls.len()) {
                calls.push(call);
            }
            current_pos = end_pos;
        }

        calls
    }

    fn parse_single_xml_call(xml: &str, index: usize) -> Option<ToolCall> {
        let id = Self::extract_xml_attribute(xml, "id").unwrap_or_else(|| format!("call_{}", index));
        let name = Self::extract_xml_attribute(xml, "name")?;

        let mut parameters = serde_json::Map::new();
        if let (Some(params_start), Some(params_end)) =
            (xml.find("<parameters>"), xml.find("</parameters>"))
        {
            let params_content = &xml[params_start + "<parameters>".len()..params_end];
            parameters = Self::parse_xml_parameters(params_content);
        }

        Some(ToolCall {
            id,
            name,
            parameters: Value::Object(parameters),
        })
    }

    fn extract_xml_attribute(xml: &str, attr: &str) -> Option<String> {
        let pattern = format!("{}=\"", attr);
        let value_start = xml.find(&pattern)? + pattern.len();
        let end = xml[value_start..].find('"')?;
        Some(xml[value_start..value_start + end].to_string())
    }

    fn parse_xml_parameters(content: &str) -> serde_json::Map<String, Value> {
        let mut params = serde_json::Map::new();
        let mut current_pos = 0;

        while let Some(start) = content[current_pos..].find('<') {
            let tag_start = current_pos + start;
            let Some(tag_end) = content[tag_start..].find('>') else {
                break;
            };
            let tag_end_pos = tag_start + tag_end;
            let tag_name = &content[tag_start + 1..tag_end_pos];

            if tag_name.starts_with('/') {
                current_pos = tag_end_pos + 1;
                continue;
            }

            let close_tag = format!("</{}>", tag_name);
            let Some(close_pos) = content[tag_end_pos..].find(&close_tag) else {
                break;
            };
            let value = content[tag_end_pos + 1..tag_end_pos + close_pos].trim();

            let parsed = value
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(value.to_string()));
            params.insert(tag_name.to_string(), parsed);

            current_pos = tag_end_pos + close_pos + close_tag.len();
        }

        params
    }
}
