#![forbid(unsafe_code)]

//! Commit phase.
//!
//! Runs once per pass, after every unit of work has been processed, and is
//! never interrupted. Deletions are applied first, then a pre-order walk of
//! the in-progress tree places new nodes and diffs props onto reused ones.
//! Finally memoized fibers take over their committed subtrees and all
//! per-pass bookkeeping on the new tree is cleared.
//!
//! Every host mutation is journaled as an [`Undo`] before or right after it
//! is issued. Replaying the journal newest first returns the host to the
//! committed tree when the host rejects a call part-way through.

use sprig_core::props::event_type_of;
use sprig_core::{EventHandler, Host, PropValue, Props};

use crate::fiber::{EffectTag, FiberArena, FiberId};

/// What one commit did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Fibers tagged PLACEMENT, including component fibers.
    pub placements: usize,
    /// Fibers tagged UPDATE that rendered.
    pub updates: usize,
    /// Committed fibers removed.
    pub deletions: usize,
    /// Memoized fibers that reused their committed subtree.
    pub skipped: usize,
    /// Host calls issued during commit.
    pub host_calls: usize,
    /// Fibers released from the arena afterwards.
    pub released: usize,
}

/// Inverse of one host mutation issued by a commit.
#[derive(Debug, Clone)]
pub(crate) enum Undo<N> {
    /// Detach a node the commit appended to a committed parent.
    Detach { parent: N, child: N },
    /// Re-append the committed children of `parent`, restoring their order.
    Reorder { parent: N, children: Vec<N> },
    /// Bring a reused node from `applied` props back to `committed` ones.
    Props {
        node: N,
        applied: Props,
        committed: Props,
    },
}

impl<N> Undo<N> {
    fn apply<H: Host<Node = N>>(&self, host: &mut H) -> Result<usize, H::Error> {
        match self {
            Self::Detach { parent, child } => {
                host.remove_child(parent, child)?;
                Ok(1)
            }
            Self::Reorder { parent, children } => {
                for child in children {
                    host.append_child(parent, child)?;
                }
                Ok(children.len())
            }
            Self::Props {
                node,
                applied,
                committed,
            } => {
                // The forward diff may have stopped before detaching these.
                let mut calls = 0;
                for (name, handler) in committed.listeners() {
                    if !holds_listener(applied, name, handler) {
                        host.remove_listener(node, &event_type_of(name), handler)?;
                        calls += 1;
                    }
                }
                Ok(calls + update_props(host, node, applied, committed)?)
            }
        }
    }
}

/// Replay `journal` newest first. Entries the host rejects stay queued,
/// the rejected one on top.
pub(crate) fn undo<H: Host>(
    host: &mut H,
    journal: &mut Vec<Undo<H::Node>>,
) -> Result<usize, H::Error> {
    let mut calls = 0;
    while let Some(entry) = journal.last() {
        calls += entry.apply(host)?;
        journal.pop();
    }
    Ok(calls)
}

/// Apply every effect of the tree rooted at `wip_root`.
///
/// On error the host may have been partially mutated; `journal` holds the
/// reverts for what was applied. The caller discards the in-progress tree
/// and keeps the previous committed root.
pub(crate) fn commit_root<H: Host>(
    arena: &mut FiberArena<H::Node>,
    host: &mut H,
    wip_root: FiberId,
    deletions: &[FiberId],
    journal: &mut Vec<Undo<H::Node>>,
) -> Result<CommitSummary, H::Error> {
    let mut summary = CommitSummary::default();

    for &fiber in deletions {
        summary.host_calls += commit_deletion(arena, host, fiber, journal)?;
        summary.deletions += 1;
    }

    let order = arena.subtree(wip_root);
    let mut adopters = Vec::new();
    for &id in order.iter().skip(1) {
        let fiber = &arena[id];
        if fiber.skipped {
            summary.skipped += 1;
            adopters.push(id);
            continue;
        }
        match fiber.effect_tag {
            EffectTag::Placement => {
                summary.placements += 1;
                if let Some(node) = fiber.host_node.as_ref() {
                    for (name, handler) in fiber.props.listeners() {
                        host.add_listener(node, &event_type_of(name), handler)?;
                        summary.host_calls += 1;
                    }
                    if let Some(parent_id) = arena.host_parent_fiber(id)
                        && let Some(parent) = arena[parent_id].host_node.as_ref()
                    {
                        host.append_child(parent, node)?;
                        summary.host_calls += 1;
                        // Nodes under a new parent leave with it.
                        if arena[parent_id].effect_tag != EffectTag::Placement {
                            journal.push(Undo::Detach {
                                parent: parent.clone(),
                                child: node.clone(),
                            });
                        }
                    }
                }
            }
            EffectTag::Update => {
                summary.updates += 1;
                if let (Some(node), Some(alt)) = (fiber.host_node.as_ref(), fiber.alternate) {
                    let committed = &arena[alt].props;
                    if !committed.shallow_eq(&fiber.props) {
                        journal.push(Undo::Props {
                            node: node.clone(),
                            applied: fiber.props.clone(),
                            committed: committed.clone(),
                        });
                    }
                    summary.host_calls += update_props(host, node, committed, &fiber.props)?;
                }
            }
            EffectTag::Deletion | EffectTag::None => {}
        }
    }

    for id in adopters {
        let adopted = arena[id].adopt_child.take();
        arena[id].child = adopted;
        let mut cursor = adopted;
        while let Some(child) = cursor {
            arena[child].parent = Some(id);
            cursor = arena[child].sibling;
        }
    }

    for id in order {
        let fiber = &mut arena[id];
        fiber.alternate = None;
        fiber.effect_tag = EffectTag::None;
        fiber.skipped = false;
    }

    Ok(summary)
}

/// Detach the host nodes of a deleted fiber: its own node, or the topmost
/// node on every branch below a node-less fiber.
fn commit_deletion<H: Host>(
    arena: &FiberArena<H::Node>,
    host: &mut H,
    fiber: FiberId,
    journal: &mut Vec<Undo<H::Node>>,
) -> Result<usize, H::Error> {
    let Some(parent_id) = arena.host_parent_fiber(fiber) else {
        return Ok(0);
    };
    let Some(parent) = arena[parent_id].host_node.as_ref() else {
        return Ok(0);
    };
    let journaled = journal
        .iter()
        .any(|entry| matches!(entry, Undo::Reorder { parent: p, .. } if p == parent));
    if !journaled {
        journal.push(Undo::Reorder {
            parent: parent.clone(),
            children: arena.host_children(parent_id).into_iter().cloned().collect(),
        });
    }
    let mut calls = 0;
    let mut stack = vec![fiber];
    while let Some(id) = stack.pop() {
        let Some(current) = arena.get(id) else {
            continue;
        };
        match current.host_node.as_ref() {
            Some(node) => {
                host.remove_child(parent, node)?;
                calls += 1;
            }
            None => stack.extend(arena.children_of(id).into_iter().rev()),
        }
    }
    Ok(calls)
}

/// Bring `node` from `prev` props to `next` props.
///
/// Order: drop stale listeners, drop vanished attributes, write new or
/// changed attributes, attach new or changed listeners.
pub(crate) fn update_props<H: Host>(
    host: &mut H,
    node: &H::Node,
    prev: &Props,
    next: &Props,
) -> Result<usize, H::Error> {
    let mut calls = 0;

    for (name, handler) in prev.listeners() {
        if !holds_listener(next, name, handler) {
            host.remove_listener(node, &event_type_of(name), handler)?;
            calls += 1;
        }
    }

    for (name, _) in prev.attributes() {
        let still_attribute = next
            .get(name)
            .is_some_and(|value| !matches!(value, PropValue::Listener(_)));
        if !still_attribute {
            host.remove_attribute(node, name)?;
            calls += 1;
        }
    }

    for (name, value) in next.attributes() {
        if prev.get(name) != Some(value) {
            host.set_attribute(node, name, value)?;
            calls += 1;
        }
    }

    for (name, handler) in next.listeners() {
        if !holds_listener(prev, name, handler) {
            host.add_listener(node, &event_type_of(name), handler)?;
            calls += 1;
        }
    }

    Ok(calls)
}

fn holds_listener(props: &Props, name: &str, handler: &EventHandler) -> bool {
    matches!(props.get(name), Some(PropValue::Listener(h)) if h.ptr_eq(handler))
}
