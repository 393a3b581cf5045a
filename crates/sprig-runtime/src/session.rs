#![forbid(unsafe_code)]

//! Render session state.
//!
//! Everything the work loop needs between callbacks lives here: the
//! committed root, the in-progress root, the next unit of work, the
//! committed fibers scheduled for deletion, and any host reverts still owed
//! by a failed commit.

use std::rc::Rc;

use sprig_core::Element;
use tracing::debug;

use crate::commit::Undo;
use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId};

/// Last `render` request, replayed when a state update restarts the pass.
#[derive(Debug, Clone)]
pub(crate) struct RootRequest<N> {
    pub(crate) container: N,
    pub(crate) children: Rc<[Element]>,
}

/// State of the two-tree render protocol.
#[derive(Debug)]
pub struct RenderSession<N> {
    pub(crate) current_root: Option<FiberId>,
    pub(crate) wip_root: Option<FiberId>,
    pub(crate) next_unit: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
    pub(crate) last_request: Option<RootRequest<N>>,
    pub(crate) restarts: usize,
    pub(crate) repairs: Vec<Undo<N>>,
}

impl<N> Default for RenderSession<N> {
    fn default() -> Self {
        Self {
            current_root: None,
            wip_root: None,
            next_unit: None,
            deletions: Vec::new(),
            last_request: None,
            restarts: 0,
            repairs: Vec::new(),
        }
    }
}

impl<N: Clone> RenderSession<N> {
    /// Root of the last committed tree.
    #[must_use]
    pub fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    /// Root of the tree being built.
    #[must_use]
    pub fn wip_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    /// Fiber the next `work_loop` slice starts from.
    #[must_use]
    pub fn next_unit(&self) -> Option<FiberId> {
        self.next_unit
    }

    /// Committed fibers the next commit will remove.
    #[must_use]
    pub fn deletions(&self) -> &[FiberId] {
        &self.deletions
    }

    /// Host reverts the next commit applies before its own effects.
    #[must_use]
    pub fn pending_repairs(&self) -> usize {
        self.repairs.len()
    }

    /// Start a pass from the last request, diffed against the committed
    /// root. Does nothing before the first `render`.
    pub(crate) fn seed(&mut self, arena: &mut FiberArena<N>) -> Option<FiberId> {
        let request = self.last_request.as_ref()?;
        let mut root = Fiber::root(request.container.clone(), Rc::clone(&request.children));
        root.alternate = self.current_root;
        let id = arena.insert(root);
        self.wip_root = Some(id);
        self.next_unit = Some(id);
        Some(id)
    }

    /// Throw away the in-progress tree.
    ///
    /// Committed fibers tagged for deletion get their tag back; the
    /// in-progress fibers are released. The committed tree is untouched.
    pub(crate) fn discard(&mut self, arena: &mut FiberArena<N>) {
        for id in self.deletions.drain(..) {
            if let Some(fiber) = arena.get_mut(id) {
                fiber.effect_tag = EffectTag::None;
            }
        }
        if let Some(wip) = self.wip_root.take() {
            let released = arena.remove_subtree(wip);
            debug!(released, "discarded in-progress tree");
        }
        self.next_unit = None;
    }
}
