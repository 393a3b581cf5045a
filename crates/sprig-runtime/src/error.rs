#![forbid(unsafe_code)]

//! Render pass errors.

use std::fmt;

use sprig_core::{ElementError, HookError};

/// Why a render pass was aborted.
///
/// `E` is the host's error type. After any of these the renderer has
/// discarded the in-progress tree; the committed tree is unchanged.
#[derive(Debug)]
pub enum RenderError<E> {
    /// A malformed element reached the processor.
    Element(ElementError),
    /// A component misused its hooks.
    Hook {
        /// Name of the offending component.
        component: String,
        /// What went wrong.
        source: HookError,
    },
    /// A host operation failed.
    Host(E),
    /// State updates kept restarting the pass without it ever committing,
    /// typically a setter called unconditionally while rendering.
    RestartLimit {
        /// Configured maximum.
        limit: usize,
    },
}

impl<E> RenderError<E> {
    /// Whether the failure came from the host.
    #[must_use]
    pub const fn is_host(&self) -> bool {
        matches!(self, Self::Host(_))
    }
}

impl<E: fmt::Display> fmt::Display for RenderError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(err) => write!(f, "invalid element: {err}"),
            Self::Hook { component, source } => {
                write!(f, "hook error in component {component}: {source}")
            }
            Self::Host(err) => write!(f, "host error: {err}"),
            Self::RestartLimit { limit } => {
                write!(f, "render pass restarted {limit} times without committing")
            }
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RenderError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Element(err) => Some(err),
            Self::Hook { source, .. } => Some(source),
            Self::Host(err) => Some(err),
            Self::RestartLimit { .. } => None,
        }
    }
}

impl<E> From<ElementError> for RenderError<E> {
    fn from(err: ElementError) -> Self {
        Self::Element(err)
    }
}
