#![forbid(unsafe_code)]

//! Element validation errors.

use std::fmt;

/// A malformed element descriptor.
///
/// Raised when the fiber for the element is processed; the pass that
/// encountered it is aborted without committing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementError {
    /// A host element with an empty tag.
    EmptyTag,
    /// A host tag containing whitespace or control characters.
    InvalidTag(String),
}

impl fmt::Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTag => write!(f, "host element has an empty tag"),
            Self::InvalidTag(tag) => write!(f, "invalid host tag {tag:?}"),
        }
    }
}

impl std::error::Error for ElementError {}
