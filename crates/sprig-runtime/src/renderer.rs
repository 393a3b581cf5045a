#![forbid(unsafe_code)]

//! Interruptible renderer.
//!
//! [`Renderer`] owns the host, the fiber arena, and the render session.
//! The host schedules [`Renderer::work_loop`] from its idle callback; each
//! call processes units of work until the deadline runs low, and commits
//! once the in-progress tree is complete.
//!
//! # Lifecycle
//!
//! 1. [`Renderer::render`] seeds a pass for a root element and container.
//! 2. The host calls [`Renderer::work_loop`] while
//!    [`Renderer::needs_idle_callback`] is true.
//! 3. A state setter invoked anywhere (typically from a listener) raises
//!    the shared update signal; the next slice restarts the pass from the
//!    committed tree with the last root element. Only setters called while
//!    a component renders count toward [`RendererConfig::max_restarts`].
//!
//! A commit that the host rejects part-way is undone: every host mutation
//! it applied is reverted so the host again matches the committed tree.
//! Reverts the host also rejects are retried before the next commit.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use sprig_core::Element;
//! use sprig_headless::MemoryHost;
//! use sprig_runtime::{Renderer, WorkStatus};
//!
//! let mut renderer = Renderer::new(MemoryHost::new());
//! let root = renderer.host().root();
//! renderer.render(Element::host("div").child("hello").build(), root);
//!
//! let status = renderer.work_loop(&Duration::from_secs(1)).unwrap();
//! assert!(matches!(status, WorkStatus::Committed { .. }));
//! assert_eq!(renderer.host().inner_markup(root), "<div>hello</div>");
//! ```

use std::rc::Rc;
use std::time::Duration;

use sprig_core::{Element, Host, IdleDeadline, UpdateSignal};
use tracing::{debug, debug_span, warn};

use crate::commit::{CommitSummary, commit_root, undo};
use crate::config::RendererConfig;
use crate::error::RenderError;
use crate::fiber::{Fiber, FiberArena, FiberId};
use crate::session::{RenderSession, RootRequest};
use crate::work::{UnitContext, perform_unit_of_work};

/// Outcome of one [`Renderer::work_loop`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum WorkStatus {
    /// No pass in progress and no update pending.
    Idle,
    /// The deadline ran low; call again from the next idle callback.
    Yielded {
        /// Units processed in this slice.
        units: usize,
    },
    /// The pass finished and was committed.
    Committed {
        /// Units processed in this slice.
        units: usize,
        /// Effects applied.
        summary: CommitSummary,
    },
}

impl WorkStatus {
    /// Units processed in this slice.
    #[must_use]
    pub const fn units(&self) -> usize {
        match self {
            Self::Idle => 0,
            Self::Yielded { units } | Self::Committed { units, .. } => *units,
        }
    }

    /// Commit summary, when the slice committed.
    #[must_use]
    pub const fn summary(&self) -> Option<&CommitSummary> {
        match self {
            Self::Committed { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// Whether the slice committed.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Fiber renderer driving a [`Host`].
pub struct Renderer<H: Host> {
    host: H,
    arena: FiberArena<H::Node>,
    session: RenderSession<H::Node>,
    signal: UpdateSignal,
    config: RendererConfig,
    commits: u64,
}

impl<H: Host> Renderer<H> {
    /// Renderer with the default configuration.
    #[must_use]
    pub fn new(host: H) -> Self {
        Self::with_config(host, RendererConfig::default())
    }

    /// Renderer with an explicit configuration.
    #[must_use]
    pub fn with_config(host: H, config: RendererConfig) -> Self {
        Self {
            host,
            arena: FiberArena::new(),
            session: RenderSession::default(),
            signal: UpdateSignal::new(),
            config,
            commits: 0,
        }
    }

    /// Start a pass rendering `element` into `container`.
    ///
    /// Any pass in progress is discarded, not queued. Nothing reaches the
    /// host until the pass commits.
    pub fn render(&mut self, element: Element, container: H::Node) {
        let _span = debug_span!("sprig.render_pass").entered();
        if self.session.wip_root.is_some() {
            debug!("superseding in-progress pass");
        }
        self.session.discard(&mut self.arena);
        // The new pass reads every queued update anyway.
        self.signal.take();
        self.session.restarts = 0;
        self.session.last_request = Some(RootRequest {
            container,
            children: Rc::from(vec![element]),
        });
        self.session.seed(&mut self.arena);
    }

    /// Process units of work until the deadline runs low, committing when
    /// the pass completes.
    ///
    /// At least one unit is processed per call when work exists. Errors
    /// abort the pass and leave the committed tree as it was.
    pub fn work_loop<D: IdleDeadline + ?Sized>(
        &mut self,
        deadline: &D,
    ) -> Result<WorkStatus, RenderError<H::Error>> {
        let span = debug_span!(
            "sprig.work_loop",
            units = tracing::field::Empty,
            committed = tracing::field::Empty
        );
        let _guard = span.enter();

        // Updates raised between slices, e.g. by listeners.
        if self.signal.take() > 0 {
            self.restart(false)?;
        }
        if self.session.next_unit.is_none() {
            return Ok(WorkStatus::Idle);
        }

        let mut units = 0;
        while let Some(unit) = self.session.next_unit {
            let next = match self.perform(unit) {
                Ok(next) => next,
                Err(err) => {
                    warn!(error = %err, units, "render pass aborted");
                    self.abort();
                    return Err(err);
                }
            };
            self.session.next_unit = next;
            units += 1;

            // Updates raised by the component that just rendered.
            if self.signal.take() > 0 {
                self.restart(true)?;
            }
            if self.session.next_unit.is_none() {
                break;
            }
            if self.should_yield(units, deadline) {
                span.record("units", units);
                span.record("committed", false);
                return Ok(WorkStatus::Yielded { units });
            }
        }

        span.record("units", units);
        if self.session.wip_root.is_none() {
            return Ok(WorkStatus::Idle);
        }
        let summary = self.commit()?;
        span.record("committed", true);
        Ok(WorkStatus::Committed { units, summary })
    }

    /// Run the current pass, and any passes triggered by pending updates,
    /// to completion without yielding. Returns the last commit summary.
    pub fn flush(&mut self) -> Result<Option<CommitSummary>, RenderError<H::Error>> {
        let mut last = None;
        loop {
            match self.work_loop(&Duration::MAX)? {
                WorkStatus::Idle => return Ok(last),
                WorkStatus::Yielded { .. } => {}
                WorkStatus::Committed { summary, .. } => last = Some(summary),
            }
        }
    }

    /// Whether the host should schedule another idle callback.
    #[must_use]
    pub fn needs_idle_callback(&self) -> bool {
        self.session.next_unit.is_some() || self.signal.is_pending()
    }

    // ---- Accessors ----

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access, e.g. to dispatch events or inject failures.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consume the renderer, returning the host.
    pub fn into_host(self) -> H {
        self.host
    }

    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Signal shared by every setter this renderer hands out.
    #[must_use]
    pub fn update_signal(&self) -> &UpdateSignal {
        &self.signal
    }

    #[must_use]
    pub fn session(&self) -> &RenderSession<H::Node> {
        &self.session
    }

    /// Root of the last committed tree.
    #[must_use]
    pub fn current_root(&self) -> Option<FiberId> {
        self.session.current_root
    }

    /// Whether a pass is in progress.
    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.session.wip_root.is_some()
    }

    #[must_use]
    pub fn fiber(&self, id: FiberId) -> Option<&Fiber<H::Node>> {
        self.arena.get(id)
    }

    #[must_use]
    pub fn arena(&self) -> &FiberArena<H::Node> {
        &self.arena
    }

    /// Passes committed so far.
    #[must_use]
    pub const fn commit_count(&self) -> u64 {
        self.commits
    }

    // ---- Internals ----

    fn perform(&mut self, unit: FiberId) -> Result<Option<FiberId>, RenderError<H::Error>> {
        let mut cx = UnitContext {
            arena: &mut self.arena,
            host: &mut self.host,
            deletions: &mut self.session.deletions,
            signal: &self.signal,
            config: &self.config,
        };
        perform_unit_of_work(&mut cx, unit)
    }

    fn should_yield<D: IdleDeadline + ?Sized>(&self, units: usize, deadline: &D) -> bool {
        if self
            .config
            .max_units_per_slice
            .is_some_and(|max| units >= max)
        {
            return true;
        }
        deadline.time_remaining() < self.config.yield_threshold
    }

    /// Replace the pass in progress with a fresh one from the committed
    /// root, so queued state updates are read.
    ///
    /// `while_rendering` marks updates raised by a component during its own
    /// render; only those count toward the restart limit.
    fn restart(&mut self, while_rendering: bool) -> Result<(), RenderError<H::Error>> {
        if while_rendering {
            self.session.restarts += 1;
            if self.session.restarts > self.config.max_restarts {
                let limit = self.config.max_restarts;
                warn!(limit, "state updates keep restarting the pass");
                self.abort();
                return Err(RenderError::RestartLimit { limit });
            }
        }
        debug!(
            restarts = self.session.restarts,
            while_rendering, "state update, restarting pass"
        );
        self.session.discard(&mut self.arena);
        self.session.seed(&mut self.arena);
        Ok(())
    }

    fn abort(&mut self) {
        self.session.discard(&mut self.arena);
        self.session.restarts = 0;
        // Updates queued on committed cells still need a pass.
        if self
            .session
            .current_root
            .is_some_and(|root| self.arena.subtree_has_pending_updates(root))
        {
            self.signal.request();
        }
    }

    /// Revert host mutations left behind by a failed commit. Reverts the
    /// host rejects stay queued.
    fn repair_host(&mut self) -> Result<(), H::Error> {
        match undo(&mut self.host, &mut self.session.repairs) {
            Ok(calls) => {
                debug!(calls, "host restored to committed tree");
                Ok(())
            }
            Err(err) => {
                warn!(
                    error = %err,
                    pending = self.session.repairs.len(),
                    "host repair deferred"
                );
                Err(err)
            }
        }
    }

    fn commit(&mut self) -> Result<CommitSummary, RenderError<H::Error>> {
        let Some(wip) = self.session.wip_root else {
            return Ok(CommitSummary::default());
        };
        let span = debug_span!(
            "sprig.commit",
            placements = tracing::field::Empty,
            updates = tracing::field::Empty,
            deletions = tracing::field::Empty,
            skipped = tracing::field::Empty
        );
        let _guard = span.enter();

        if !self.session.repairs.is_empty()
            && let Err(err) = self.repair_host()
        {
            self.abort();
            return Err(RenderError::Host(err));
        }

        let deletions = std::mem::take(&mut self.session.deletions);
        let mut journal = Vec::new();
        match commit_root(&mut self.arena, &mut self.host, wip, &deletions, &mut journal) {
            Ok(mut summary) => {
                self.session.current_root = Some(wip);
                self.session.wip_root = None;
                self.session.next_unit = None;
                self.session.restarts = 0;
                summary.released = self.arena.retain_reachable(wip);
                self.commits += 1;

                span.record("placements", summary.placements);
                span.record("updates", summary.updates);
                span.record("deletions", summary.deletions);
                span.record("skipped", summary.skipped);
                debug!(
                    host_calls = summary.host_calls,
                    released = summary.released,
                    live = self.arena.len(),
                    "committed"
                );
                Ok(summary)
            }
            Err(err) => {
                warn!(error = %err, reverts = journal.len(), "commit failed");
                self.session.deletions = deletions;
                self.abort();
                self.session.repairs = journal;
                // A rejected revert is retried before the next commit.
                let _ = self.repair_host();
                Err(RenderError::Host(err))
            }
        }
    }
}

impl<H: Host + std::fmt::Debug> std::fmt::Debug for Renderer<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("host", &self.host)
            .field("fibers", &self.arena.len())
            .field("current_root", &self.session.current_root)
            .field("wip_root", &self.session.wip_root)
            .field("commits", &self.commits)
            .finish()
    }
}
