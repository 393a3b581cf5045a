#![forbid(unsafe_code)]

//! Unit-of-work processor.
//!
//! One unit is one fiber: materialize its host node or invoke its
//! component, reconcile its children, and name the fiber to process next.
//! Units never touch the attached host tree; nodes created here stay
//! detached until commit.

use std::rc::Rc;

use sprig_core::{
    Component, Element, Host, Hooks, PropValue, TEXT_VALUE_PROP, UpdateSignal, validate_tag,
};
use tracing::trace;

use crate::config::RendererConfig;
use crate::error::RenderError;
use crate::fiber::{FiberArena, FiberId, FiberKind};
use crate::reconcile::{ReconcileStats, reconcile_children};

/// Borrowed renderer state a unit of work may touch.
pub(crate) struct UnitContext<'a, H: Host> {
    pub(crate) arena: &'a mut FiberArena<H::Node>,
    pub(crate) host: &'a mut H,
    pub(crate) deletions: &'a mut Vec<FiberId>,
    pub(crate) signal: &'a UpdateSignal,
    pub(crate) config: &'a RendererConfig,
}

/// Process `id` and return the next fiber in pre-order.
pub(crate) fn perform_unit_of_work<H: Host>(
    cx: &mut UnitContext<'_, H>,
    id: FiberId,
) -> Result<Option<FiberId>, RenderError<H::Error>> {
    let kind = cx.arena[id].kind.clone();
    trace!(fiber = kind.label(), "unit of work");
    match kind {
        FiberKind::Root => {
            let children = Rc::clone(&cx.arena[id].children);
            reconcile(cx, id, &children);
        }
        FiberKind::Host(tag) => {
            validate_tag(&tag)?;
            if cx.arena[id].host_node.is_none() {
                let node = create_host_node(cx.host, &tag, cx.arena, id)
                    .map_err(RenderError::Host)?;
                cx.arena[id].host_node = Some(node);
            }
            let children = Rc::clone(&cx.arena[id].children);
            reconcile(cx, id, &children);
        }
        FiberKind::Text => {
            if cx.arena[id].host_node.is_none() {
                let node = create_text_node(cx.host, cx.arena, id).map_err(RenderError::Host)?;
                cx.arena[id].host_node = Some(node);
            }
        }
        FiberKind::Component(component) => {
            if try_skip_memo(cx.arena, id, &component) {
                trace!(component = component.name(), "memo bailout");
                return Ok(cx.arena.next_skipping_children(id));
            }
            render_component(cx, id, &component)?;
        }
    }
    Ok(cx.arena.next_in_preorder(id))
}

fn reconcile<H: Host>(cx: &mut UnitContext<'_, H>, id: FiberId, elements: &[Element]) {
    let stats = reconcile_children(cx.arena, cx.deletions, id, elements);
    if stats != ReconcileStats::default() {
        trace!(
            updates = stats.updates,
            placements = stats.placements,
            deletions = stats.deletions,
            "reconciled children"
        );
    }
}

/// Create an element node and copy the attribute props onto it.
///
/// Listener props are attached at commit, once the node is placed.
fn create_host_node<H: Host>(
    host: &mut H,
    tag: &str,
    arena: &FiberArena<H::Node>,
    id: FiberId,
) -> Result<H::Node, H::Error> {
    let node = host.create_node(tag)?;
    for (name, value) in arena[id].props.attributes() {
        host.set_attribute(&node, name, value)?;
    }
    Ok(node)
}

fn create_text_node<H: Host>(
    host: &mut H,
    arena: &FiberArena<H::Node>,
    id: FiberId,
) -> Result<H::Node, H::Error> {
    let props = &arena[id].props;
    let empty = PropValue::from("");
    let value = props.get(TEXT_VALUE_PROP).unwrap_or(&empty);
    let node = host.create_text_node(value)?;
    for (name, value) in props.attributes().filter(|(n, _)| *n != TEXT_VALUE_PROP) {
        host.set_attribute(&node, name, value)?;
    }
    Ok(node)
}

/// Memoized components bail out when the committed fiber has the same
/// identity, the comparator accepts the props, and nothing below it has a
/// queued state update.
fn try_skip_memo<N>(arena: &mut FiberArena<N>, id: FiberId, component: &Component) -> bool {
    if !component.is_memo() {
        return false;
    }
    let Some(alt) = arena[id].alternate else {
        return false;
    };
    let same_identity =
        matches!(&arena[alt].kind, FiberKind::Component(old) if old.id() == component.id());
    if !same_identity
        || !component.props_equal(&arena[alt].props, &arena[id].props)
        || arena.subtree_has_pending_updates(alt)
    {
        return false;
    }
    let hooks = arena[alt].hooks.clone();
    let adopt = arena[alt].child;
    let fiber = &mut arena[id];
    fiber.hooks = hooks;
    fiber.skipped = true;
    fiber.adopt_child = adopt;
    true
}

fn render_component<H: Host>(
    cx: &mut UnitContext<'_, H>,
    id: FiberId,
    component: &Component,
) -> Result<(), RenderError<H::Error>> {
    let previous = cx.arena[id]
        .alternate
        .map(|alt| cx.arena[alt].hooks.clone());
    let props = cx.arena[id].props.clone();

    let mut hooks = Hooks::new(previous.as_deref(), cx.signal);
    let child = component.render(&props, &mut hooks);
    let cells = hooks
        .finish(cx.config.check_hook_order)
        .map_err(|source| RenderError::Hook {
            component: component.name().to_owned(),
            source,
        })?;

    cx.arena[id].hooks = cells;
    reconcile(cx, id, std::slice::from_ref(&child));
    Ok(())
}
