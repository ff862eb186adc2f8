//! Best-effort recovery of a JSON document from free-form model output.

use crate::error::{AgentError, Result};
use serde_json::Value;

/// Characters of the raw reply kept in parse error messages.
const PREVIEW_CHARS: usize = 500;

/// Pick the substring of `content` most likely to hold a JSON document.
///
/// Order: a ```` ```json ```` fence, then any ```` ``` ```` fence, then the
/// span from the first `{` to the last `}`, then the whole trimmed text. A
/// fence without a closing marker yields nothing and falls through to the
/// brace span.
pub fn json_candidate(content: &str) -> &str {
    let fenced = if let Some(pos) = content.find("```json") {
        fenced_block(content, pos + "```json".len())
    } else if let Some(pos) = content.find("```") {
        fenced_block(content, pos + "```".len())
    } else {
        None
    };

    if let Some(block) = fenced.filter(|b| !b.is_empty()) {
        return block;
    }

    if let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) {
        if end > start {
            return content[start..=end].trim();
        }
    }

    content.trim()
}

fn fenced_block(content: &str, body_start: usize) -> Option<&str> {
    let rest = &content[body_start..];
    rest.find("```").map(|end| rest[..end].trim())
}

/// Extract and parse the JSON document embedded in `content`.
pub fn extract_json(content: &str) -> Result<Value> {
    let candidate = json_candidate(content);
    serde_json::from_str(candidate).map_err(|e| {
        let preview: String = content.chars().take(PREVIEW_CHARS).collect();
        AgentError::parse(format!("{} (raw content: {}...)", e, preview))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_fence_preferred() {
        let content = "Here you go:\n```json\n{\"a\": 1}\n```\nand {\"b\": 2}";
        assert_eq!(extract_json(content).unwrap(), json!({ "a": 1 }));
    }

    #[test]
    fn test_plain_fence() {
        let content = "```\n{\"template_structure\": []}\n```";
        assert_eq!(
            extract_json(content).unwrap(),
            json!({ "template_structure": [] })
        );
    }

    #[test]
    fn test_brace_span_when_no_fence() {
        let content = "Sure! {\"x\": {\"y\": true}} Hope this helps.";
        assert_eq!(extract_json(content).unwrap(), json!({ "x": { "y": true } }));
    }

    #[test]
    fn test_unclosed_fence_falls_back_to_braces() {
        let content = "```json\n{\"a\": [1, 2]}";
        assert_eq!(extract_json(content).unwrap(), json!({ "a": [1, 2] }));
    }

    #[test]
    fn test_bare_array_uses_whole_text() {
        assert_eq!(extract_json("  [1, 2, 3]  ").unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_parse_failure_reports_preview() {
        let err = extract_json("no json here at all").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Parse error:"));
        assert!(msg.contains("no json here at all"));
    }

    #[test]
    fn test_preview_truncated_to_500_chars() {
        let content = "x".repeat(800);
        let msg = extract_json(&content).unwrap_err().to_string();
        assert!(msg.contains(&"x".repeat(500)));
        assert!(!msg.contains(&"x".repeat(501)));
    }
}
