//! Error types for Flowsketch operations.
//!
//! [`FlowsketchError`] covers every failure of the pipeline. A structural
//! validation failure is not an error; see
//! [`validate_structure`](flowsketch_core::validate::validate_structure).

use std::io;

use thiserror::Error;

use flowsketch_mdl::ReadError;

use crate::inference::InferenceError;

/// The main error type for Flowsketch operations.
#[derive(Debug, Error)]
pub enum FlowsketchError {
    /// A credential or setting needed to build a collaborator is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The model call for extraction failed or its reply is not a diagram model.
    #[error("Extraction failed: {message}")]
    Extraction {
        message: String,
        /// The first characters of the model reply, when one was received.
        excerpt: Option<String>,
    },

    /// The model call for the summary failed.
    #[error("Summary failed: {0}")]
    Summary(String),

    /// The image input is unreadable, too large or of an unsupported type.
    #[error("Image error: {0}")]
    Image(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Diagram text that failed the structural smoke test.
    #[error("Invalid diagram text: {0}")]
    InvalidDiagramText(String),

    /// MDL text that the reader cannot parse, with the text itself.
    #[error("{err}")]
    MdlRead { err: ReadError, src: String },
}

impl FlowsketchError {
    /// Create a new `MdlRead` error with the text that failed to read.
    pub fn new_read_error(err: ReadError, src: impl Into<String>) -> Self {
        Self::MdlRead {
            err,
            src: src.into(),
        }
    }

    /// Wraps an inference failure during extraction.
    pub(crate) fn extraction(err: InferenceError) -> Self {
        Self::Extraction {
            message: err.to_string(),
            excerpt: None,
        }
    }

    /// Wraps an inference failure during summarization.
    pub(crate) fn summary(err: InferenceError) -> Self {
        Self::Summary(err.to_string())
    }
}
