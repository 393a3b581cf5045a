#![forbid(unsafe_code)]

//! Positional child reconciliation.
//!
//! New child elements are matched against the committed children of the
//! fiber's alternate strictly by position. Keys are not supported: an
//! insertion at the front shifts every later position and is reported as
//! a chain of updates plus one trailing placement.

use sprig_core::Element;

use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId};

/// Effects produced by one [`reconcile_children`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReconcileStats {
    pub(crate) updates: usize,
    pub(crate) placements: usize,
    pub(crate) deletions: usize,
}

/// Build the child fibers of `wip` for `elements`.
///
/// Same-typed pairs become UPDATE fibers that inherit the old host node;
/// unmatched elements become PLACEMENT fibers; unmatched old fibers are
/// tagged DELETION and pushed onto `deletions` without being linked.
pub(crate) fn reconcile_children<N: Clone>(
    arena: &mut FiberArena<N>,
    deletions: &mut Vec<FiberId>,
    wip: FiberId,
    elements: &[Element],
) -> ReconcileStats {
    let mut stats = ReconcileStats::default();
    let mut old = arena
        .get(wip)
        .and_then(|f| f.alternate)
        .and_then(|alt| arena.get(alt))
        .and_then(|f| f.child);
    let mut previous: Option<FiberId> = None;
    let mut index = 0;

    arena[wip].child = None;

    while index < elements.len() || old.is_some() {
        let element = elements.get(index);
        let matched = match (element, old) {
            (Some(el), Some(old_id)) => arena
                .get(old_id)
                .filter(|f| f.kind.matches(el.ty()))
                .map(|f| (old_id, f.host_node.clone())),
            _ => None,
        };

        let mut created = None;
        if let (Some(el), Some((old_id, host_node))) = (element, matched) {
            let mut next = Fiber::from_element(el);
            next.host_node = host_node;
            next.alternate = Some(old_id);
            next.effect_tag = EffectTag::Update;
            created = Some(next);
            stats.updates += 1;
        } else {
            if let Some(el) = element {
                let mut next = Fiber::from_element(el);
                next.effect_tag = EffectTag::Placement;
                created = Some(next);
                stats.placements += 1;
            }
            if let Some(old_id) = old {
                arena[old_id].effect_tag = EffectTag::Deletion;
                deletions.push(old_id);
                stats.deletions += 1;
            }
        }

        old = old.and_then(|id| arena.get(id)).and_then(|f| f.sibling);

        if let Some(mut fiber) = created {
            fiber.parent = Some(wip);
            let id = arena.insert(fiber);
            match previous {
                None => arena[wip].child = Some(id),
                Some(prev) => arena[prev].sibling = Some(id),
            }
            previous = Some(id);
        }
        index += 1;
    }
    stats
}
