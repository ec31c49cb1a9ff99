//! Natural-language summaries of diagrams.
//!
//! [`SummaryComposer`] sends a model (as compact JSON) or free text to the
//! language model and passes every reply through [`normalize_template`], so
//! the output layout never depends on how closely the model followed the
//! instructions.

mod template;

pub use template::{HEADERS, INTRODUCTION, TITLE, normalize_template};

use log::{debug, info};

use flowsketch_core::model::DiagramModel;

use crate::{
    error::FlowsketchError,
    inference::{ChatMessage, ChatRequest, InputPart, InstructionRequest, Invoker, Role},
    prompts,
};

const CHAT_MAX_TOKENS: u32 = 800;
const CHAT_TEMPERATURE: f32 = 0.2;

/// What a summary is written from.
#[derive(Debug, Clone, Copy)]
pub enum SummarySource<'s> {
    Model(&'s DiagramModel),
    /// Free text such as rendered MDL.
    Text(&'s str),
}

impl SummarySource<'_> {
    /// Describes the payload to the model.
    fn descriptor(self) -> &'static str {
        match self {
            SummarySource::Model(_) => "解析JSON",
            SummarySource::Text(_) => "テキスト",
        }
    }

    fn payload(self) -> Result<String, FlowsketchError> {
        match self {
            SummarySource::Model(model) => Ok(serde_json::to_string(model)?),
            SummarySource::Text(text) => Ok(text.to_string()),
        }
    }
}

/// Writes three-section summaries through an [`Invoker`].
pub struct SummaryComposer<'a> {
    invoker: &'a Invoker,
}

impl<'a> SummaryComposer<'a> {
    pub fn new(invoker: &'a Invoker) -> Self {
        Self { invoker }
    }

    /// Summarizes `source`.
    ///
    /// # Errors
    ///
    /// Returns [`FlowsketchError::Summary`] if the model call fails.
    pub fn summarize(&self, source: SummarySource<'_>) -> Result<String, FlowsketchError> {
        let descriptor = source.descriptor();
        let payload = source.payload()?;
        info!(descriptor, payload_len = payload.len(); "Composing summary");

        let input = prompts::summary_input(descriptor, &payload);
        let instruction = InstructionRequest::new(
            prompts::SUMMARY_INSTRUCTIONS,
            vec![InputPart::Text(input.clone())],
        );
        let chat = || {
            ChatRequest::new(
                vec![
                    ChatMessage::text(Role::System, prompts::SUMMARY_INSTRUCTIONS),
                    ChatMessage::text(Role::User, input.clone()),
                ],
                CHAT_MAX_TOKENS,
                CHAT_TEMPERATURE,
            )
        };

        let reply = self
            .invoker
            .invoke(&instruction, chat)
            .map_err(FlowsketchError::summary)?;
        debug!(path:? = reply.path(), reply_len = reply.text().len(); "Summary reply received");

        Ok(normalize_template(reply.text()))
    }
}
