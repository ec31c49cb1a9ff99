//! Flowsketch - turn data-flow diagram images into models, MDL text and summaries.
//!
//! A language model reads the diagram image into a [`DiagramModel`]; the model
//! is rendered into Simulink MDL-shaped text and summarized in Japanese.
//! Everything except the two model calls is deterministic.

pub mod config;
pub mod extract;
pub mod image;
pub mod inference;
pub mod summary;

mod error;
mod prompts;

pub use flowsketch_core::{model, validate};
pub use flowsketch_mdl as mdl;

pub use error::FlowsketchError;

use log::{debug, info, warn};

use flowsketch_core::{model::DiagramModel, validate::structure_issues};
use flowsketch_mdl::{MdlWriter, validate_rendered_text};

use config::AppConfig;
use extract::StructureExtractor;
use image::ImageInput;
use inference::{InferenceBackend, Invoker, OpenAiBackend};
use summary::{SummaryComposer, SummarySource};

/// The artifacts produced from one diagram image.
#[derive(Debug, Clone)]
pub struct Analysis {
    model: DiagramModel,
    diagram_text: String,
    summary: Option<String>,
}

impl Analysis {
    pub fn model(&self) -> &DiagramModel {
        &self.model
    }

    /// Rendered MDL text.
    pub fn diagram_text(&self) -> &str {
        &self.diagram_text
    }

    /// The summary, unless it was skipped.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

/// Runs the extraction, rendering and summary stages.
///
/// # Examples
///
/// ```rust,no_run
/// use flowsketch::{Analyzer, config::AppConfig, image::ImageInput};
///
/// let config = AppConfig::default();
/// let analyzer = Analyzer::new(config).expect("OPENAI_API_KEY is set");
///
/// let image = ImageInput::from_path("diagram.png", 10 * 1024 * 1024)
///     .expect("Failed to read image");
/// let analysis = analyzer.analyze(&image, true).expect("Failed to analyze");
///
/// println!("{}", analysis.diagram_text());
/// ```
pub struct Analyzer {
    config: AppConfig,
    invoker: Invoker,
    writer: MdlWriter,
}

impl Analyzer {
    /// Creates an analyzer that calls the OpenAI-compatible service in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FlowsketchError::Configuration`] if the API key variable is
    /// not set.
    pub fn new(config: AppConfig) -> Result<Self, FlowsketchError> {
        let backend = OpenAiBackend::from_config(config.inference())?;
        Ok(Self::with_backend(config, Box::new(backend)))
    }

    /// Creates an analyzer around an existing backend.
    pub fn with_backend(config: AppConfig, backend: Box<dyn InferenceBackend>) -> Self {
        let invoker = Invoker::new(backend, config.inference().interface());
        Self {
            config,
            invoker,
            writer: MdlWriter::new(),
        }
    }

    /// Replaces the MDL writer (builder style), e.g. to fix the save time.
    pub fn with_writer(mut self, writer: MdlWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    /// Extracts the diagram structure from an image.
    ///
    /// # Errors
    ///
    /// See [`StructureExtractor::extract`].
    pub fn extract(&self, image: &ImageInput) -> Result<DiagramModel, FlowsketchError> {
        StructureExtractor::new(&self.invoker).extract(image)
    }

    /// Summarizes a model or free text.
    ///
    /// # Errors
    ///
    /// See [`SummaryComposer::summarize`].
    pub fn summarize(&self, source: SummarySource<'_>) -> Result<String, FlowsketchError> {
        SummaryComposer::new(&self.invoker).summarize(source)
    }

    /// Renders a model into MDL text. No model call is made.
    pub fn render(&self, model: &DiagramModel) -> String {
        let text = self.writer.render(model);
        if !validate_rendered_text(&text) {
            warn!("Rendered MDL text failed the structural smoke test");
        }
        text
    }

    /// Runs the whole pipeline on `image`.
    ///
    /// The structural check is advisory: incomplete models are logged and
    /// still rendered.
    ///
    /// # Errors
    ///
    /// Returns the first extraction or summary failure.
    pub fn analyze(
        &self,
        image: &ImageInput,
        with_summary: bool,
    ) -> Result<Analysis, FlowsketchError> {
        info!(with_summary; "Analyzing diagram image");

        let model = self.extract(image)?;
        let issues = structure_issues(&model);
        if !issues.is_empty() {
            warn!(issue_count = issues.len(); "Continuing with an incomplete model");
        }

        let diagram_text = self.render(&model);
        debug!(bytes = diagram_text.len(); "Diagram text rendered");

        let summary = if with_summary {
            Some(self.summarize(SummarySource::Model(&model))?)
        } else {
            None
        };

        info!("Analysis complete");
        Ok(Analysis {
            model,
            diagram_text,
            summary,
        })
    }
}
