//! Message parts: the typed content blocks inside an item.
//!
//! The JSON shape is the AI SDK one: a `type` tag in kebab-case and
//! camelCase fields. Chat front-ends read the `parts` column directly, so
//! this shape is a contract and must not drift.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Image payload: a URL / base64 string, or raw bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageData {
    Url(String),
    Bytes(Vec<u8>),
}

/// One content block of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum MessagePart {
    Text {
        text: String,
    },
    Image {
        image: ImageData,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    File {
        /// URL or identifier.
        data: String,
        mime_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        args: Value,
    },
    ToolResult {
        tool_call_id: String,
        result: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    McpCall {
        server: String,
        method: String,
        params: Value,
        correlation_id: String,
    },
    McpResult {
        correlation_id: String,
        result: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    Source {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
}

impl MessagePart {
    /// Plain text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The `type` tag as it appears on the wire.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::File { .. } => "file",
            Self::ToolCall { .. } => "tool-call",
            Self::ToolResult { .. } => "tool-result",
            Self::McpCall { .. } => "mcp-call",
            Self::McpResult { .. } => "mcp-result",
            Self::Source { .. } => "source",
            Self::Error { .. } => "error",
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Check required identifiers are present.
    ///
    /// Returns a description of the first problem found.
    pub(crate) fn problem(&self) -> Option<String> {
        let missing = |field: &str| Some(format!("{} part requires {field}", self.kind()));
        match self {
            Self::File { mime_type, .. } if mime_type.trim().is_empty() => missing("mimeType"),
            Self::ToolCall { tool_call_id, .. } | Self::ToolResult { tool_call_id, .. }
                if tool_call_id.trim().is_empty() =>
            {
                missing("toolCallId")
            }
            Self::ToolCall { tool_name, .. } if tool_name.trim().is_empty() => missing("toolName"),
            Self::McpCall { correlation_id, .. } | Self::McpResult { correlation_id, .. }
                if correlation_id.trim().is_empty() =>
            {
                missing("correlationId")
            }
            Self::McpCall { server, .. } if server.trim().is_empty() => missing("server"),
            _ => None,
        }
    }
}

/// Concatenate the text parts of a slice, newline separated.
#[must_use]
pub fn joined_text(parts: &[MessagePart]) -> String {
    parts
        .iter()
        .filter_map(MessagePart::as_text)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_wire_shape() {
        let part = MessagePart::ToolCall {
            tool_call_id: "call_1".to_string(),
            tool_name: "search".to_string(),
            args: json!({"q": "rust"}),
        };
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "tool-call",
                "toolCallId": "call_1",
                "toolName": "search",
                "args": {"q": "rust"}
            })
        );
    }

    #[test]
    fn test_parse_mixed_parts() {
        let parts: Vec<MessagePart> = serde_json::from_value(json!([
            {"type": "text", "text": "hi"},
            {"type": "image", "image": "https://example.com/a.png", "mimeType": "image/png"},
            {"type": "mcp-result", "correlationId": "c1", "result": null, "isError": true},
            {"type": "source", "url": "https://docs.rs"},
            {"type": "error", "message": "boom"}
        ]))
        .unwrap();

        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0].as_text(), Some("hi"));
        assert!(matches!(
            &parts[1],
            MessagePart::Image { image: ImageData::Url(_), mime_type: Some(m) } if m == "image/png"
        ));
        assert!(matches!(
            parts[2],
            MessagePart::McpResult { is_error: Some(true), .. }
        ));
        assert_eq!(parts[4].kind(), "error");
    }

    #[test]
    fn test_image_bytes() {
        let part: MessagePart =
            serde_json::from_value(json!({"type": "image", "image": [137, 80, 78, 71]})).unwrap();
        assert!(matches!(
            part,
            MessagePart::Image { image: ImageData::Bytes(ref b), .. } if b.len() == 4
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<MessagePart, _> =
            serde_json::from_value(json!({"type": "video", "url": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_problem_detection() {
        let part = MessagePart::ToolResult {
            tool_call_id: " ".to_string(),
            result: json!(1),
            is_error: None,
        };
        assert_eq!(
            part.problem().as_deref(),
            Some("tool-result part requires toolCallId")
        );
        assert!(MessagePart::text("").problem().is_none());
    }

    #[test]
    fn test_joined_text_skips_non_text() {
        let parts = vec![
            MessagePart::text("a"),
            MessagePart::Error {
                message: "x".to_string(),
                code: None,
            },
            MessagePart::text("b"),
        ];
        assert_eq!(joined_text(&parts), "a\nb");
    }
}
