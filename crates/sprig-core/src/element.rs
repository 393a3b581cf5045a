#![forbid(unsafe_code)]

//! Element descriptors.
//!
//! An [`Element`] is an immutable description of one node the application
//! wants to exist: a type, a prop map, and ordered children. Elements are
//! rebuilt by the application on every render and shared cheaply between
//! the caller and the fibers that mirror them.
//!
//! # Example
//!
//! ```
//! use sprig_core::element::Element;
//!
//! let tree = Element::host("div")
//!     .prop("id", "foo")
//!     .child(Element::host("a").child("bar"))
//!     .child(Element::host("b"))
//!     .build();
//!
//! assert_eq!(tree.children().len(), 2);
//! assert_eq!(tree.children()[0].children()[0].text_value().map(ToString::to_string).as_deref(), Some("bar"));
//! ```

use std::fmt;
use std::rc::Rc;

use crate::component::Component;
use crate::error::ElementError;
use crate::event::EventHandler;
use crate::props::{PropValue, Props};

/// Prop holding the content of a text element.
pub const TEXT_VALUE_PROP: &str = "nodeValue";

/// What kind of node an element describes.
#[derive(Clone)]
pub enum ElementType {
    /// A host node created with `create_node(tag)`.
    Host(Rc<str>),
    /// A host text node; its content is the `nodeValue` prop.
    Text,
    /// A component invoked during rendering to produce one child element.
    Component(Component),
}

impl ElementType {
    /// Short human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Host(tag) => tag,
            Self::Text => "#text",
            Self::Component(c) => c.name(),
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(tag) => write!(f, "Host({tag:?})"),
            Self::Text => f.write_str("Text"),
            Self::Component(c) => write!(f, "Component({:?})", c.name()),
        }
    }
}

/// Validate a host tag.
pub fn validate_tag(tag: &str) -> Result<(), ElementError> {
    if tag.is_empty() {
        return Err(ElementError::EmptyTag);
    }
    if tag.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ElementError::InvalidTag(tag.to_owned()));
    }
    Ok(())
}

struct ElementData {
    ty: ElementType,
    props: Props,
    children: Rc<[Element]>,
}

/// Immutable, cheaply clonable element descriptor.
#[derive(Clone)]
pub struct Element(Rc<ElementData>);

impl Element {
    /// Assemble an element from its parts.
    #[must_use]
    pub fn new(ty: ElementType, props: Props, children: Vec<Element>) -> Self {
        Self(Rc::new(ElementData {
            ty,
            props,
            children: children.into(),
        }))
    }

    /// Start building a host element.
    #[must_use]
    pub fn host(tag: impl Into<Rc<str>>) -> ElementBuilder {
        ElementBuilder::new(ElementType::Host(tag.into()))
    }

    /// A text element.
    #[must_use]
    pub fn text(value: impl Into<PropValue>) -> Self {
        Self::new(
            ElementType::Text,
            Props::new().with(TEXT_VALUE_PROP, value),
            Vec::new(),
        )
    }

    /// A component element.
    #[must_use]
    pub fn component(component: &Component, props: Props) -> Self {
        Self::new(ElementType::Component(component.clone()), props, Vec::new())
    }

    /// Element type.
    #[must_use]
    pub fn ty(&self) -> &ElementType {
        &self.0.ty
    }

    /// Element props.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.0.props
    }

    /// Child descriptors in order.
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.0.children
    }

    /// Shared handle to the children, for fibers that keep them.
    #[must_use]
    pub fn shared_children(&self) -> Rc<[Element]> {
        Rc::clone(&self.0.children)
    }

    /// Text content, for text elements.
    #[must_use]
    pub fn text_value(&self) -> Option<&PropValue> {
        match self.0.ty {
            ElementType::Text => self.0.props.get(TEXT_VALUE_PROP),
            _ => None,
        }
    }

    /// Whether both handles refer to the same descriptor.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("ty", &self.0.ty)
            .field("props", &self.0.props)
            .field("children", &self.0.children)
            .finish()
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<i64> for Element {
    fn from(value: i64) -> Self {
        Self::text(value)
    }
}

impl From<i32> for Element {
    fn from(value: i32) -> Self {
        Self::text(value)
    }
}

impl From<f64> for Element {
    fn from(value: f64) -> Self {
        Self::text(value)
    }
}

/// Build an element from a type, props, and children.
///
/// Primitive children (`&str`, `String`, numbers) become text elements.
pub fn create_element<C: Into<Element>>(
    ty: ElementType,
    props: Props,
    children: impl IntoIterator<Item = C>,
) -> Element {
    Element::new(ty, props, children.into_iter().map(Into::into).collect())
}

/// Fluent construction of elements.
#[derive(Debug)]
#[must_use]
pub struct ElementBuilder {
    ty: ElementType,
    props: Props,
    children: Vec<Element>,
}

impl ElementBuilder {
    /// Start from a type with no props or children.
    pub fn new(ty: ElementType) -> Self {
        Self {
            ty,
            props: Props::new(),
            children: Vec::new(),
        }
    }

    /// Set a prop.
    pub fn prop(mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name, value);
        self
    }

    /// Set a listener prop, e.g. `on("onClick", handler)`.
    pub fn on(mut self, name: impl Into<Rc<str>>, handler: EventHandler) -> Self {
        self.props.insert(name, PropValue::Listener(handler));
        self
    }

    /// Append a child.
    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    pub fn children<C: Into<Element>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Finish the element.
    #[must_use]
    pub fn build(self) -> Element {
        Element::new(self.ty, self.props, self.children)
    }
}

impl From<ElementBuilder> for Element {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn primitive_children_become_text() {
        let el = create_element(
            ElementType::Host("h1".into()),
            Props::new(),
            [Element::from("Count: "), Element::from(3)],
        );
        let texts: Vec<String> = el
            .children()
            .iter()
            .filter_map(|c| c.text_value().map(ToString::to_string))
            .collect();
        assert_eq!(texts, vec!["Count: ".to_string(), "3".to_string()]);
        assert!(el.children().iter().all(|c| c.children().is_empty()));
    }

    #[test]
    fn tag_validation() {
        assert_eq!(validate_tag("div"), Ok(()));
        assert_eq!(validate_tag(""), Err(ElementError::EmptyTag));
        assert_eq!(
            validate_tag("my div"),
            Err(ElementError::InvalidTag("my div".into()))
        );
    }

    #[test]
    fn builder_collects_props_and_children() {
        let handler = EventHandler::new(|_| {});
        let el = Element::host("input")
            .prop("value", 3)
            .on("onChange", handler)
            .children(["a", "b"])
            .build();
        assert_eq!(el.ty().label(), "input");
        assert_eq!(el.props().len(), 2);
        assert_eq!(el.children().len(), 2);
    }

    #[test]
    fn clones_share_descriptor() {
        let el = Element::host("div").build();
        let copy = el.clone();
        assert!(el.ptr_eq(&copy));
        assert!(!el.ptr_eq(&Element::host("div").build()));
    }

    #[test]
    fn text_value_only_for_text() {
        assert!(Element::host("p").build().text_value().is_none());
        assert_eq!(
            Element::text("hi").text_value(),
            Some(&PropValue::from("hi"))
        );
    }
}
