use thiserror::Error;

/// Failure to read MDL text into a [`Section`](crate::Section) tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct ReadError {
    message: String,
    offset: usize,
}

impl ReadError {
    pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset into the input at which reading stopped.
    pub fn offset(&self) -> usize {
        self.offset
    }
}
