#![forbid(unsafe_code)]

//! Host capability trait.
//!
//! The reconciler never touches a concrete node tree. Everything it needs
//! from the environment (creating nodes, writing attributes, wiring
//! listeners, attaching and detaching children) goes through [`Host`].
//! Every operation is fallible; a failure aborts the current pass.

use std::fmt::Debug;

use crate::event::EventHandler;
use crate::props::PropValue;

/// Retained node tree the reconciler mutates.
pub trait Host {
    /// Handle to one host node. Cloning must not copy the node.
    type Node: Clone + PartialEq + Debug;
    /// Failure raised by any host operation.
    type Error: std::error::Error + 'static;

    /// Create an element node for `tag`.
    fn create_node(&mut self, tag: &str) -> Result<Self::Node, Self::Error>;

    /// Create a text node holding `value`.
    fn create_text_node(&mut self, value: &PropValue) -> Result<Self::Node, Self::Error>;

    /// Set or overwrite an attribute.
    fn set_attribute(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: &PropValue,
    ) -> Result<(), Self::Error>;

    /// Clear an attribute.
    fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), Self::Error>;

    /// Attach a listener for `event_type` (`"click"`, not `"onClick"`).
    fn add_listener(
        &mut self,
        node: &Self::Node,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), Self::Error>;

    /// Detach a listener previously attached with the same handler.
    fn remove_listener(
        &mut self,
        node: &Self::Node,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), Self::Error>;

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node)
    -> Result<(), Self::Error>;

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node)
    -> Result<(), Self::Error>;
}
