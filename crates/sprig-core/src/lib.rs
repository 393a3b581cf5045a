#![forbid(unsafe_code)]

//! Core: element descriptors, props, components, hooks, and host capabilities.
//!
//! Everything in this crate is independent of the fiber engine. The
//! runtime crate consumes these types to build and diff fiber trees; hosts
//! implement [`Host`] to receive the resulting mutations.

pub mod component;
pub mod deadline;
pub mod element;
pub mod error;
pub mod event;
pub mod hooks;
pub mod host;
pub mod props;

pub use component::{Component, ComponentId, memo};
pub use deadline::{DeadlineSource, FrameBudget, IdleDeadline, InstantDeadline};
pub use element::{
    Element, ElementBuilder, ElementType, TEXT_VALUE_PROP, create_element, validate_tag,
};
pub use error::ElementError;
pub use event::{Event, EventHandler};
pub use hooks::{HookCell, HookError, Hooks, Setter, UpdateSignal};
pub use host::Host;
pub use props::{PropKind, PropValue, Props};
