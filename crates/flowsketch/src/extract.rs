//! Image to [`DiagramModel`] extraction.
//!
//! The primary (instruction) reply is parsed as JSON; when that fails, the
//! text between its first `{` and last `}` is parsed instead, since models
//! often wrap the object in prose. The secondary (chat) call requests
//! JSON-object output and its reply is parsed without repair.

use log::{debug, info, trace, warn};

use flowsketch_core::{model::DiagramModel, validate::structure_issues};

use crate::{
    error::FlowsketchError,
    image::ImageInput,
    inference::{
        ChatMessage, ChatRequest, InputPart, InstructionRequest, InvocationPath, Invoker, Role,
    },
    prompts,
};

/// Maximum number of characters of a reply kept in an extraction error.
pub const EXCERPT_CHARS: usize = 200;

const CHAT_MAX_TOKENS: u32 = 2000;
const CHAT_TEMPERATURE: f32 = 0.2;

/// Extracts diagram structure from images through an [`Invoker`].
pub struct StructureExtractor<'a> {
    invoker: &'a Invoker,
}

impl<'a> StructureExtractor<'a> {
    pub fn new(invoker: &'a Invoker) -> Self {
        Self { invoker }
    }

    /// Asks the model for the structure of the diagram in `image`.
    ///
    /// Structural validity is logged, not enforced.
    ///
    /// # Errors
    ///
    /// Returns [`FlowsketchError::Extraction`] if the model call fails or the
    /// reply is not a diagram model.
    pub fn extract(&self, image: &ImageInput) -> Result<DiagramModel, FlowsketchError> {
        info!(format:? = image.format(); "Extracting diagram structure");

        let data_url = image.to_data_url();
        let instruction = InstructionRequest::new(
            prompts::EXTRACTION_INSTRUCTIONS,
            vec![
                InputPart::Text(prompts::EXTRACTION_REQUEST.to_string()),
                InputPart::Image(data_url.clone()),
            ],
        );
        let chat = || {
            ChatRequest::new(
                vec![ChatMessage::new(
                    Role::User,
                    vec![
                        InputPart::Text(prompts::EXTRACTION_CHAT_PROMPT.to_string()),
                        InputPart::Image(data_url.clone()),
                    ],
                )],
                CHAT_MAX_TOKENS,
                CHAT_TEMPERATURE,
            )
            .with_json_object()
        };

        let reply = self
            .invoker
            .invoke(&instruction, chat)
            .map_err(FlowsketchError::extraction)?;
        trace!(reply = reply.text(); "Extraction reply");

        let model = match reply.path() {
            InvocationPath::Instruction => parse_with_repair(reply.text())?,
            InvocationPath::Chat => parse_strict(reply.text())?,
        };

        let issues = structure_issues(&model);
        if issues.is_empty() {
            info!(
                processes = model.processes().len(),
                data_flows = model.data_flows().len();
                "Diagram structure extracted"
            );
        } else {
            for issue in &issues {
                warn!(issue:% = issue; "Extracted structure is incomplete");
            }
        }

        Ok(model)
    }
}

/// Parses `text` as a model, falling back to the outermost brace span.
pub fn parse_with_repair(text: &str) -> Result<DiagramModel, FlowsketchError> {
    let first_error = match serde_json::from_str(text) {
        Ok(model) => return Ok(model),
        Err(err) => err,
    };

    if let Some(span) = brace_span(text) {
        debug!(span_len = span.len(), reply_len = text.len(); "Retrying extraction reply as embedded object");
        match serde_json::from_str(span) {
            Ok(model) => return Ok(model),
            Err(err) => return Err(invalid_reply(&err, text)),
        }
    }

    Err(invalid_reply(&first_error, text))
}

/// Parses `text` as a model without repair.
pub fn parse_strict(text: &str) -> Result<DiagramModel, FlowsketchError> {
    serde_json::from_str(text).map_err(|err| invalid_reply(&err, text))
}

/// Returns the text from the first `{` through the last `}`.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// The first [`EXCERPT_CHARS`] characters of `text`.
pub fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}

fn invalid_reply(err: &serde_json::Error, text: &str) -> FlowsketchError {
    FlowsketchError::Extraction {
        message: format!("model reply is not a diagram model: {err}"),
        excerpt: Some(excerpt(text)),
    }
}

#[cfg(test)]
mod tests {
    use flowsketch_core::validate::validate_structure;

    use super::*;

    #[test]
    fn test_plain_json_parses() {
        let model = parse_with_repair(r#"{"processes": [{"id": "P1"}]}"#).unwrap();
        assert_eq!(model.processes()[0].id(), Some("P1"));
    }

    #[test]
    fn test_embedded_object_is_recovered() {
        let text = "here is the result: {\"processes\":[],\"data_stores\":[],\"external_entities\":[],\"data_flows\":[],\"system_overview\":\"x\"}\nthanks";

        let model = parse_with_repair(text).unwrap();

        assert_eq!(model.overview(), Some("x"));
        assert!(!validate_structure(&model));
    }

    #[test]
    fn test_overview_and_summary_keys_together() {
        let text = r#"{"processes":[],"data_stores":[],"external_entities":[],"data_flows":[],"system_overview":"a","summary":"b"}"#;

        let model = parse_strict(text).unwrap();

        assert_eq!(model.overview(), Some("a"));
    }

    #[test]
    fn test_fenced_code_block_is_recovered() {
        let text = "```json\n{\"processes\": [{\"id\": \"P1\", \"name\": \"受付\"}]}\n```";
        let model = parse_with_repair(text).unwrap();
        assert_eq!(model.processes()[0].name(), Some("受付"));
    }

    #[test]
    fn test_reply_without_object_fails_with_excerpt() {
        let text = "申し訳ありませんが、画像を解析できません。";

        let err = parse_with_repair(text).unwrap_err();

        match err {
            FlowsketchError::Extraction { excerpt, .. } => {
                assert_eq!(excerpt.as_deref(), Some(text));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_broken_embedded_object_fails() {
        let err = parse_with_repair("result: {\"processes\": [} done").unwrap_err();
        assert!(matches!(err, FlowsketchError::Extraction { .. }));
    }

    #[test]
    fn test_wrong_shape_fails() {
        assert!(parse_with_repair(r#"{"processes": "none"}"#).is_err());
        assert!(parse_strict("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_strict_parse_does_not_repair() {
        let err = parse_strict("result: {\"processes\": []}").unwrap_err();
        assert!(matches!(err, FlowsketchError::Extraction { .. }));
    }

    #[test]
    fn test_excerpt_counts_characters() {
        let text = "図".repeat(250);
        let excerpt = excerpt(&text);
        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS);
        assert_eq!(excerpt.len(), EXCERPT_CHARS * "図".len());
    }

    #[test]
    fn test_brace_span_requires_ordered_braces() {
        assert_eq!(brace_span("} nothing {"), None);
        assert_eq!(brace_span("a {b} c"), Some("{b}"));
    }
}
