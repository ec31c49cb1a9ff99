//! OpenAI-compatible HTTP backend.
//!
//! Instruction calls go to `POST {base_url}/responses`, chat calls to
//! `POST {base_url}/chat/completions`. Other OpenAI-compatible services
//! usually implement only the chat endpoint, so the capability probe reports
//! the instruction interface only for the hosted OpenAI base URL.

use std::env;

use log::{debug, trace};
use reqwest::{
    StatusCode,
    blocking::{Client, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{
    Capabilities, ChatRequest, InferenceBackend, InferenceError, InputPart, InstructionRequest,
};
use crate::{
    config::{InferenceConfig, OPENAI_BASE_URL},
    error::FlowsketchError,
};

/// Blocking client for the OpenAI Responses and Chat Completions APIs.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiBackend {
    /// Builds a backend from `config`, reading the API key from the
    /// environment variable it names.
    ///
    /// # Errors
    ///
    /// Returns [`FlowsketchError::Configuration`] if the variable is unset or
    /// empty, or if the HTTP client cannot be built.
    pub fn from_config(config: &InferenceConfig) -> Result<Self, FlowsketchError> {
        let api_key = env::var(config.api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                FlowsketchError::Configuration(format!(
                    "environment variable `{}` is not set",
                    config.api_key_env()
                ))
            })?;

        // The blocking client defaults to a 30 second timeout; `None` lifts it.
        let client = Client::builder().timeout(config.timeout()).build().map_err(|err| {
            FlowsketchError::Configuration(format!("cannot build HTTP client: {err}"))
        })?;

        debug!(model = config.model(), base_url = config.base_url(); "Created OpenAI backend");

        Ok(Self {
            client,
            api_key,
            model: config.model().to_string(),
            base_url: config.base_url().to_string(),
        })
    }

    fn post(&self, endpoint: &str, body: &Value) -> Result<Response, InferenceError> {
        let url = format!("{}/{endpoint}", self.base_url);
        trace!(url, body:% = body; "Sending model request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()?;

        let status = response.status();
        if is_unsupported(status) {
            return Err(InferenceError::Unsupported(format!("{url} returned {status}")));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

fn is_unsupported(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
    )
}

fn responses_content(parts: &[InputPart]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| match part {
            InputPart::Text(text) => json!({"type": "input_text", "text": text}),
            InputPart::Image(url) => json!({"type": "input_image", "image_url": url}),
        })
        .collect()
}

fn chat_content(parts: &[InputPart]) -> Value {
    match parts {
        [InputPart::Text(text)] => json!(text),
        _ => parts
            .iter()
            .map(|part| match part {
                InputPart::Text(text) => json!({"type": "text", "text": text}),
                InputPart::Image(url) => json!({"type": "image_url", "image_url": {"url": url}}),
            })
            .collect(),
    }
}

#[derive(Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesReply {
    fn into_text(self) -> Option<String> {
        if let Some(text) = self.output_text {
            return Some(text);
        }
        let text: String = self
            .output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|content| content.kind == "output_text")
            .filter_map(|content| content.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Deserialize)]
struct ChatReply {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl InferenceBackend for OpenAiBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new(supports_instructions(&self.base_url))
    }

    fn instruct(&self, request: &InstructionRequest) -> Result<String, InferenceError> {
        let body = json!({
            "model": &self.model,
            "instructions": request.instructions(),
            "input": [{
                "role": "user",
                "content": responses_content(request.input()),
            }],
        });

        let reply: ResponsesReply = self.post("responses", &body)?.json()?;
        reply.into_text().ok_or_else(|| {
            InferenceError::MalformedResponse("response contains no output text".to_string())
        })
    }

    fn chat(&self, request: &ChatRequest) -> Result<String, InferenceError> {
        let messages: Vec<Value> = request
            .messages()
            .iter()
            .map(|message| {
                json!({
                    "role": message.role().as_str(),
                    "content": chat_content(message.parts()),
                })
            })
            .collect();

        let mut body = json!({
            "model": &self.model,
            "messages": messages,
            "max_tokens": request.max_tokens(),
            "temperature": request.temperature(),
        });
        if request.json_object() {
            body["response_format"] = json!({"type": "json_object"});
        }

        let reply: ChatReply = self.post("chat/completions", &body)?.json()?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                InferenceError::MalformedResponse("completion contains no message".to_string())
            })
    }
}

/// Only the hosted OpenAI API is assumed to serve `/responses`.
fn supports_instructions(base_url: &str) -> bool {
    base_url == OPENAI_BASE_URL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_default_base_url_supports_instructions() {
        assert!(supports_instructions(OPENAI_BASE_URL));
        assert!(!supports_instructions("https://example.openai.azure.com/openai/v1"));
        assert!(!supports_instructions("http://localhost:11434/v1"));
    }

    #[test]
    fn test_single_text_chat_content_is_a_string() {
        let content = chat_content(&[InputPart::Text("hello".to_string())]);
        assert_eq!(content, json!("hello"));
    }

    #[test]
    fn test_multipart_chat_content() {
        let content = chat_content(&[
            InputPart::Text("prompt".to_string()),
            InputPart::Image("data:image/png;base64,AAAA".to_string()),
        ]);
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_responses_content_parts() {
        let content = responses_content(&[InputPart::Image("data:x".to_string())]);
        assert_eq!(content[0], json!({"type": "input_image", "image_url": "data:x"}));
    }

    #[test]
    fn test_responses_reply_prefers_output_text() {
        let reply: ResponsesReply =
            serde_json::from_value(json!({"output_text": "a", "output": []})).unwrap();
        assert_eq!(reply.into_text().as_deref(), Some("a"));
    }

    #[test]
    fn test_responses_reply_concatenates_output_items() {
        let reply: ResponsesReply = serde_json::from_value(json!({
            "output": [
                {"content": [{"type": "output_text", "text": "{\"a\":"}]},
                {"content": [{"type": "refusal"}, {"type": "output_text", "text": "1}"}]}
            ]
        }))
        .unwrap();
        assert_eq!(reply.into_text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_unsupported_statuses() {
        assert!(is_unsupported(StatusCode::NOT_FOUND));
        assert!(is_unsupported(StatusCode::NOT_IMPLEMENTED));
        assert!(!is_unsupported(StatusCode::UNAUTHORIZED));
        assert!(!is_unsupported(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
