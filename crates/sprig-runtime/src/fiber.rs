#![forbid(unsafe_code)]

//! Fiber arena.
//!
//! A fiber is the mutable twin of an element for one render pass. Fibers
//! are linked as a first-child / next-sibling tree with parent back-links,
//! and each work-in-progress fiber points at the committed fiber it was
//! diffed against through `alternate`.
//!
//! All fibers live in one [`FiberArena`]; links are [`FiberId`] handles, so
//! the committed and in-progress trees can reference each other freely.
//! After every commit the arena keeps only fibers reachable from the new
//! committed root.

use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use sprig_core::{Component, Element, ElementType, HookCell, Props};

new_key_type! {
    /// Handle to a fiber in a [`FiberArena`].
    pub struct FiberId;
}

/// Pending commit effect of a fiber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectTag {
    /// Nothing to apply.
    #[default]
    None,
    /// Attach a newly created host node.
    Placement,
    /// Diff props onto the existing host node.
    Update,
    /// Remove the host node(s) of this committed fiber.
    Deletion,
}

/// What a fiber stands for.
#[derive(Debug, Clone)]
pub enum FiberKind {
    /// The container supplied to `render`.
    Root,
    /// A host element node.
    Host(Rc<str>),
    /// A host text node.
    Text,
    /// A component invocation.
    Component(Component),
}

impl FiberKind {
    /// Kind for a fiber mirroring `ty`.
    #[must_use]
    pub fn from_element_type(ty: &ElementType) -> Self {
        match ty {
            ElementType::Host(tag) => Self::Host(Rc::clone(tag)),
            ElementType::Text => Self::Text,
            ElementType::Component(c) => Self::Component(c.clone()),
        }
    }

    /// Whether a fiber of this kind can be updated in place to `ty`.
    #[must_use]
    pub fn matches(&self, ty: &ElementType) -> bool {
        match (self, ty) {
            (Self::Host(a), ElementType::Host(b)) => a == b,
            (Self::Text, ElementType::Text) => true,
            (Self::Component(a), ElementType::Component(b)) => a.id() == b.id(),
            _ => false,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Root => "#root",
            Self::Host(tag) => tag,
            Self::Text => "#text",
            Self::Component(c) => c.name(),
        }
    }
}

/// One fiber.
#[derive(Debug)]
pub struct Fiber<N> {
    pub(crate) kind: FiberKind,
    pub(crate) props: Props,
    pub(crate) children: Rc<[Element]>,
    pub(crate) host_node: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect_tag: EffectTag,
    pub(crate) hooks: Vec<Rc<HookCell>>,
    /// Set when a memoized component skipped rendering.
    pub(crate) skipped: bool,
    /// Committed child chain taken over at commit by a skipped fiber.
    pub(crate) adopt_child: Option<FiberId>,
}

impl<N> Fiber<N> {
    /// Fiber for an element, not yet linked.
    pub(crate) fn from_element(element: &Element) -> Self {
        Self {
            kind: FiberKind::from_element_type(element.ty()),
            props: element.props().clone(),
            children: element.shared_children(),
            host_node: None,
            parent: None,
            child: None,
            sibling: None,
            alternate: None,
            effect_tag: EffectTag::None,
            hooks: Vec::new(),
            skipped: false,
            adopt_child: None,
        }
    }

    /// Root fiber owning `container`.
    pub(crate) fn root(container: N, children: Rc<[Element]>) -> Self {
        Self {
            kind: FiberKind::Root,
            props: Props::new(),
            children,
            host_node: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate: None,
            effect_tag: EffectTag::None,
            hooks: Vec::new(),
            skipped: false,
            adopt_child: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &FiberKind {
        &self.kind
    }

    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Element children, for root and host fibers.
    #[must_use]
    pub fn element_children(&self) -> &[Element] {
        &self.children
    }

    #[must_use]
    pub fn host_node(&self) -> Option<&N> {
        self.host_node.as_ref()
    }

    #[must_use]
    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    #[must_use]
    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    #[must_use]
    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    #[must_use]
    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    #[must_use]
    pub fn effect_tag(&self) -> EffectTag {
        self.effect_tag
    }

    /// Hook cells produced by the last render of a component fiber.
    #[must_use]
    pub fn hooks(&self) -> &[Rc<HookCell>] {
        &self.hooks
    }

    /// Whether this fiber reused its committed subtree instead of rendering.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }
}

/// Slot-map storage for fibers of every tree.
#[derive(Debug)]
pub struct FiberArena<N> {
    fibers: SlotMap<FiberId, Fiber<N>>,
}

impl<N> Default for FiberArena<N> {
    fn default() -> Self {
        Self {
            fibers: SlotMap::with_key(),
        }
    }
}

impl<N> FiberArena<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.fibers.insert(fiber)
    }

    #[must_use]
    pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
        self.fibers.get_mut(id)
    }

    /// Live fibers across all trees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Direct children of `id` in order.
    #[must_use]
    pub fn children_of(&self, id: FiberId) -> SmallVec<[FiberId; 4]> {
        let mut out = SmallVec::new();
        let mut cursor = self.get(id).and_then(|f| f.child);
        while let Some(child) = cursor {
            out.push(child);
            cursor = self.get(child).and_then(|f| f.sibling);
        }
        out
    }

    /// Next fiber in pre-order: first child, else the nearest sibling of
    /// `id` or of one of its ancestors.
    #[must_use]
    pub fn next_in_preorder(&self, id: FiberId) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }
        self.next_skipping_children(id)
    }

    /// Like [`next_in_preorder`](Self::next_in_preorder), without entering
    /// the subtree of `id`.
    #[must_use]
    pub fn next_skipping_children(&self, id: FiberId) -> Option<FiberId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Fibers of the subtree rooted at `id` in pre-order, `id` first.
    #[must_use]
    pub fn subtree(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.get(current).is_none() {
                continue;
            }
            out.push(current);
            let children = self.children_of(current);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Nearest ancestor of `id` that owns a host node.
    #[must_use]
    pub fn host_parent(&self, id: FiberId) -> Option<&N> {
        self.host_parent_fiber(id)
            .and_then(|parent| self.get(parent)?.host_node.as_ref())
    }

    /// The fiber owning [`host_parent`](Self::host_parent).
    #[must_use]
    pub fn host_parent_fiber(&self, id: FiberId) -> Option<FiberId> {
        let mut cursor = self.get(id)?.parent;
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if fiber.host_node.is_some() {
                return Some(current);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Host nodes directly under the node of `id`, in document order:
    /// the topmost node on every branch below `id`.
    #[must_use]
    pub fn host_children(&self, id: FiberId) -> Vec<&N> {
        let mut out = Vec::new();
        let mut stack: Vec<FiberId> = self.children_of(id).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            let Some(fiber) = self.get(current) else {
                continue;
            };
            match fiber.host_node.as_ref() {
                Some(node) => out.push(node),
                None => stack.extend(self.children_of(current).into_iter().rev()),
            }
        }
        out
    }

    /// Whether any hook cell in the subtree of `id` has queued updates.
    #[must_use]
    pub fn subtree_has_pending_updates(&self, id: FiberId) -> bool {
        self.subtree(id).into_iter().any(|f| {
            self.get(f)
                .is_some_and(|fiber| fiber.hooks.iter().any(|cell| cell.has_pending()))
        })
    }

    /// Drop the subtree rooted at `id`. Alternates are not followed.
    pub(crate) fn remove_subtree(&mut self, id: FiberId) -> usize {
        let doomed = self.subtree(id);
        for fiber in &doomed {
            self.fibers.remove(*fiber);
        }
        doomed.len()
    }

    /// Keep only the fibers reachable from `root` through child and sibling
    /// links. Returns how many were released.
    pub(crate) fn retain_reachable(&mut self, root: FiberId) -> usize {
        let live: std::collections::HashSet<FiberId> = self.subtree(root).into_iter().collect();
        let before = self.fibers.len();
        self.fibers.retain(|id, _| live.contains(&id));
        before - self.fibers.len()
    }
}

impl<N> std::ops::Index<FiberId> for FiberArena<N> {
    type Output = Fiber<N>;

    fn index(&self, id: FiberId) -> &Fiber<N> {
        &self.fibers[id]
    }
}

impl<N> std::ops::IndexMut<FiberId> for FiberArena<N> {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber<N> {
        &mut self.fibers[id]
    }
}
