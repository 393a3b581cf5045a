#![forbid(unsafe_code)]

//! Function components and `memo`.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::element::Element;
use crate::hooks::Hooks;
use crate::props::Props;

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a component definition.
///
/// The reconciler treats two component elements as the same type only when
/// their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    fn next() -> Self {
        Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

type RenderFn = dyn Fn(&Props, &mut Hooks<'_>) -> Element;
type PropsComparator = dyn Fn(&Props, &Props) -> bool;

/// A function mapping props to one child element.
///
/// Clones share identity. The render function receives the [`Hooks`] scope
/// of the fiber being processed.
#[derive(Clone)]
pub struct Component {
    id: ComponentId,
    name: Rc<str>,
    render: Rc<RenderFn>,
    compare: Option<Rc<PropsComparator>>,
}

impl Component {
    /// Define a component with a fresh identity.
    pub fn new(
        name: impl Into<Rc<str>>,
        render: impl Fn(&Props, &mut Hooks<'_>) -> Element + 'static,
    ) -> Self {
        Self {
            id: ComponentId::next(),
            name: name.into(),
            render: Rc::new(render),
            compare: None,
        }
    }

    /// Component identity.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this component carries a props comparator.
    #[must_use]
    pub const fn is_memo(&self) -> bool {
        self.compare.is_some()
    }

    /// Invoke the render function.
    pub fn render(&self, props: &Props, hooks: &mut Hooks<'_>) -> Element {
        (self.render)(props, hooks)
    }

    /// Whether re-invocation may be skipped for these props.
    ///
    /// Always `false` for components created without [`memo`].
    #[must_use]
    pub fn props_equal(&self, prev: &Props, next: &Props) -> bool {
        self.compare.as_ref().is_some_and(|cmp| cmp(prev, next))
    }

    /// Element for this component.
    #[must_use]
    pub fn element(&self, props: Props) -> Element {
        Element::component(self, props)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("memo", &self.is_memo())
            .finish()
    }
}

/// Wrap a component so that it is skipped while `compare(prev, next)` holds.
///
/// The result is a new component type: it does not reconcile against the
/// unwrapped component.
pub fn memo(
    component: Component,
    compare: impl Fn(&Props, &Props) -> bool + 'static,
) -> Component {
    Component {
        id: ComponentId::next(),
        name: component.name,
        render: component.render,
        compare: Some(Rc::new(compare)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::UpdateSignal;

    fn greeting() -> Component {
        Component::new("Greeting", |props, _| {
            Element::text(props.get("name").map(ToString::to_string).unwrap_or_default())
        })
    }

    #[test]
    fn ids_are_unique_and_shared_by_clones() {
        let a = greeting();
        let b = greeting();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn memo_creates_new_identity() {
        let base = greeting();
        let wrapped = memo(base.clone(), |a, b| a.get("name") == b.get("name"));
        assert_ne!(base.id(), wrapped.id());
        assert!(wrapped.is_memo());
        assert!(!base.is_memo());
        assert_eq!(wrapped.name(), "Greeting");
    }

    #[test]
    fn props_equal_delegates_to_comparator() {
        let wrapped = memo(greeting(), |a, b| a.get("name") == b.get("name"));
        let a = Props::new().with("name", "x").with("n", 1);
        let b = Props::new().with("name", "x").with("n", 2);
        let c = Props::new().with("name", "y");
        assert!(wrapped.props_equal(&a, &b));
        assert!(!wrapped.props_equal(&a, &c));
        assert!(!greeting().props_equal(&a, &a));
    }

    #[test]
    fn render_invokes_function() {
        let c = greeting();
        let signal = UpdateSignal::new();
        let mut hooks = Hooks::new(None, &signal);
        let el = c.render(&Props::new().with("name", "Ann"), &mut hooks);
        assert_eq!(el.text_value().map(ToString::to_string).as_deref(), Some("Ann"));
    }
}
