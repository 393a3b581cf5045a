#![forbid(unsafe_code)]

//! Sprig public facade crate.
//!
//! Re-exports the element model, the renderer and (with the default
//! `headless` feature) the in-memory host, and offers a prelude for
//! writing components.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use sprig_core::{
    Component, ComponentId, DeadlineSource, Element, ElementBuilder, ElementError, ElementType,
    Event, EventHandler, FrameBudget, HookError, Hooks, Host, IdleDeadline, InstantDeadline,
    PropKind, PropValue, Props, Setter, UpdateSignal, create_element, memo,
};

// --- Runtime re-exports ----------------------------------------------------

pub use sprig_runtime::{
    CommitSummary, DriveReport, RenderError, Renderer, RendererConfig, WorkStatus,
    drive_until_idle,
};

// --- Headless re-exports ---------------------------------------------------

#[cfg(feature = "headless")]
pub use sprig_headless::{
    HostOp, MemoryHost, MemoryHostConfig, NodeId, UnitBudget, UnitBudgets,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Sprig apps.
#[derive(Debug)]
pub enum Error {
    /// A malformed element.
    Element(ElementError),
    /// A component used its hooks inconsistently.
    Hook {
        component: String,
        source: HookError,
    },
    /// The host rejected a mutation.
    Host(Box<dyn std::error::Error + 'static>),
    /// State updates kept restarting the pass.
    RestartLimit { limit: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(err) => write!(f, "{err}"),
            Self::Hook { component, source } => write!(f, "in component {component}: {source}"),
            Self::Host(err) => write!(f, "host error: {err}"),
            Self::RestartLimit { limit } => {
                write!(f, "render pass restarted more than {limit} times")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Element(err) => Some(err),
            Self::Hook { source, .. } => Some(source),
            Self::Host(err) => Some(err.as_ref()),
            Self::RestartLimit { .. } => None,
        }
    }
}

impl<E: std::error::Error + 'static> From<RenderError<E>> for Error {
    fn from(err: RenderError<E>) -> Self {
        match err {
            RenderError::Element(err) => Self::Element(err),
            RenderError::Hook { component, source } => Self::Hook { component, source },
            RenderError::Host(err) => Self::Host(Box::new(err)),
            RenderError::RestartLimit { limit } => Self::RestartLimit { limit },
        }
    }
}

impl From<ElementError> for Error {
    fn from(err: ElementError) -> Self {
        Self::Element(err)
    }
}

/// Standard result type for Sprig APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Component, Element, Error, Event, EventHandler, Hooks, Props, Renderer, Result,
        WorkStatus, create_element, memo,
    };

    #[cfg(feature = "headless")]
    pub use crate::MemoryHost;

    pub use crate::{core, runtime};
}

pub use sprig_core as core;
pub use sprig_runtime as runtime;

#[cfg(feature = "headless")]
pub use sprig_headless as headless;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("refused")
        }
    }

    impl std::error::Error for Refused {}

    #[test]
    fn render_errors_convert() {
        let err: Error = RenderError::<Refused>::Host(Refused).into();
        assert!(matches!(err, Error::Host(_)));
        assert_eq!(err.to_string(), "host error: refused");
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("refused"));

        let err: Error = RenderError::<Refused>::RestartLimit { limit: 3 }.into();
        assert!(err.source().is_none());
    }

    #[test]
    fn hook_errors_keep_component_name() {
        let err: Error = RenderError::<Refused>::Hook {
            component: "Counter".to_owned(),
            source: HookError::CountMismatch {
                expected: 2,
                actual: 1,
            },
        }
        .into();
        assert!(err.to_string().starts_with("in component Counter: "));
        assert!(err.source().is_some());
    }

    #[test]
    fn element_error_converts_with_question_mark() {
        fn check(tag: &str) -> Result<()> {
            sprig_core::element::validate_tag(tag)?;
            Ok(())
        }
        assert!(check("div").is_ok());
        assert!(matches!(check(""), Err(Error::Element(ElementError::EmptyTag))));
    }
}
