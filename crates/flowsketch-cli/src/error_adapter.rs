//! Error adapter for converting FlowsketchError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. MDL read errors
//! carry the text that failed, so they are rendered with a source snippet.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use flowsketch::{FlowsketchError, mdl::ReadError};

/// Adapter for an MDL read error together with the text it occurred in.
pub struct ReadErrorAdapter<'a> {
    err: &'a ReadError,
    src: &'a str,
}

impl<'a> ReadErrorAdapter<'a> {
    pub fn new(err: &'a ReadError, src: &'a str) -> Self {
        Self { err, src }
    }
}

impl fmt::Debug for ReadErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadErrorAdapter")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for ReadErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.err.message())
    }
}

impl std::error::Error for ReadErrorAdapter<'_> {}

impl MietteDiagnostic for ReadErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("flowsketch::mdl_read"))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let offset = self.err.offset().min(self.src.len());
        let len = usize::from(offset < self.src.len());
        let span = SourceSpan::new(offset.into(), len);
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some("here".to_string()),
            span,
        ))))
    }
}

/// Adapter for [`FlowsketchError`] variants without source text.
pub struct ErrorAdapter<'a>(pub &'a FlowsketchError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            FlowsketchError::Configuration(_) => "flowsketch::configuration",
            FlowsketchError::Extraction { .. } => "flowsketch::extraction",
            FlowsketchError::Summary(_) => "flowsketch::summary",
            FlowsketchError::Image(_) => "flowsketch::image",
            FlowsketchError::Json(_) => "flowsketch::json",
            FlowsketchError::Io(_) => "flowsketch::io",
            FlowsketchError::InvalidDiagramText(_) => "flowsketch::invalid_diagram_text",
            FlowsketchError::MdlRead { .. } => "flowsketch::mdl_read",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            FlowsketchError::Extraction {
                excerpt: Some(excerpt),
                ..
            } => Some(Box::new(format!("model reply began with: {excerpt}"))),
            FlowsketchError::Configuration(_) => Some(Box::new(
                "set the API key variable named by `inference.api_key_env`, or check the configuration file",
            )),
            _ => None,
        }
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A read error with a source snippet.
    Read(ReadErrorAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Read(r) => fmt::Display::fmt(r, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Read(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Read(r) => r.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Read(r) => r.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Read(r) => r.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Read(r) => r.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`FlowsketchError`] into a reportable error.
pub fn to_reportable(err: &FlowsketchError) -> Reportable<'_> {
    match err {
        FlowsketchError::MdlRead { err: read_err, src } => {
            Reportable::Read(ReadErrorAdapter::new(read_err, src))
        }
        _ => Reportable::Error(ErrorAdapter(err)),
    }
}

#[cfg(test)]
mod tests {
    use flowsketch::mdl::read;

    use super::*;

    fn read_error(src: &str) -> FlowsketchError {
        let err = read(src).unwrap_err();
        FlowsketchError::new_read_error(err, src)
    }

    #[test]
    fn test_read_error_has_source_and_label() {
        let err = read_error("Model {\n  Name\n}");

        let reportable = to_reportable(&err);

        match &reportable {
            Reportable::Read(r) => assert_eq!(r.to_string(), "expected parameter value"),
            Reportable::Error(_) => panic!("Expected Read"),
        }
        assert!(reportable.source_code().is_some());
        let labels: Vec<_> = reportable.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].primary());
    }

    #[test]
    fn test_label_at_end_of_input_is_empty() {
        let src = "Model {\n";
        let err = read_error(src);

        let labels: Vec<_> = to_reportable(&err).labels().unwrap().collect();

        assert_eq!(labels[0].offset(), src.len());
        assert_eq!(labels[0].len(), 0);
    }

    #[test]
    fn test_error_codes() {
        let err = FlowsketchError::Summary("boom".to_string());
        let reportable = to_reportable(&err);

        assert_eq!(reportable.to_string(), "Summary failed: boom");
        assert_eq!(
            reportable.code().map(|c| c.to_string()).as_deref(),
            Some("flowsketch::summary")
        );
        assert!(reportable.labels().is_none());
    }

    #[test]
    fn test_extraction_help_shows_excerpt() {
        let err = FlowsketchError::Extraction {
            message: "model reply is not a diagram model".to_string(),
            excerpt: Some("Sorry".to_string()),
        };

        let help = to_reportable(&err).help().map(|h| h.to_string());

        assert_eq!(help.as_deref(), Some("model reply began with: Sorry"));
    }
}
