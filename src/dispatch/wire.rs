//! Wire types for the OpenAI-compatible chat completions protocol.
//!
//! Private to the dispatch module; nothing here is part of the public
//! surface.

use serde::{Deserialize, Serialize};

use crate::models::TokenUsage;

/// Chat completions request body.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// One message in the conversation.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// A user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completions response body.
///
/// Services differ in which optional blocks they send; everything beyond
/// the first choice's content is tolerated as absent.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice; empty when the response carries none.
    pub fn first_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_expected_fields() {
        let request = ChatRequest {
            model: "glm-4-flash".to_string(),
            messages: vec![ChatMessage::user("hello")],
            temperature: 0.7,
            max_tokens: 4096,
        };

        // Round-trip through text, the same shape the wire sees.
        let text = serde_json::to_string(&request).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["model"], "glm-4-flash");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["max_tokens"], 4096);
    }

    #[test]
    fn test_response_parses_content_and_usage() {
        let json = r#"
        {
            "choices": [{"message": {"role": "assistant", "content": "hi there"}}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
        }
        "#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let usage = response.usage.unwrap();
        assert_eq!(usage.total_tokens, 7);
        assert_eq!(response.first_content(), "hi there");
    }

    #[test]
    fn test_response_tolerates_missing_blocks() {
        let response: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(response.usage.is_none());
        assert_eq!(response.first_content(), "");

        let json = r#"{"choices": [{"message": {"content": null}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_content(), "");
    }
}
