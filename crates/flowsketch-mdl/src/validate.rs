//! Coarse smoke test for rendered MDL text.
//!
//! This is not a parser: it only checks for the two section markers and the
//! closing brace. Use [`read`](crate::read) for a structural check.

/// Marker of the top-level model section.
pub const MODEL_MARKER: &str = "Model {";

/// Marker of the block diagram section.
pub const SYSTEM_MARKER: &str = "System {";

/// Returns `true` iff `text` contains both section markers and ends with `}`
/// once trailing whitespace is ignored.
pub fn validate_rendered_text(text: &str) -> bool {
    text.contains(MODEL_MARKER) && text.contains(SYSTEM_MARKER) && text.trim_end().ends_with('}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_text_passes() {
        assert!(validate_rendered_text("Model { System { } }"));
        assert!(validate_rendered_text("Model {\n  System {\n  }\n}\n\n  "));
    }

    #[test]
    fn test_missing_model_marker_fails() {
        assert!(!validate_rendered_text("System { }"));
        assert!(!validate_rendered_text("Model{ System { } }"));
    }

    #[test]
    fn test_missing_system_marker_fails() {
        assert!(!validate_rendered_text("Model { }"));
    }

    #[test]
    fn test_missing_trailing_brace_fails() {
        assert!(!validate_rendered_text("Model { System { } } extra"));
        assert!(!validate_rendered_text(""));
    }
}
