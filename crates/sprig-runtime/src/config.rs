#![forbid(unsafe_code)]

//! Renderer configuration.

use std::time::Duration;

/// Tuning knobs for [`Renderer`](crate::Renderer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Yield once the deadline reports less than this.
    pub yield_threshold: Duration,
    /// Yield after this many units in one slice, regardless of the deadline.
    pub max_units_per_slice: Option<usize>,
    /// Fail a pass when a component calls a different number of hooks than
    /// in its previous render.
    pub check_hook_order: bool,
    /// Abort after this many state-update restarts without a commit.
    pub max_restarts: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            max_units_per_slice: None,
            check_hook_order: true,
            max_restarts: 100,
        }
    }
}

impl RendererConfig {
    /// Process everything in one slice: never yield on time.
    #[must_use]
    pub fn blocking() -> Self {
        Self {
            yield_threshold: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Set the deadline threshold.
    #[must_use]
    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }

    /// Cap units per slice.
    #[must_use]
    pub fn with_max_units_per_slice(mut self, units: usize) -> Self {
        self.max_units_per_slice = Some(units.max(1));
        self
    }

    /// Enable or disable hook count validation.
    #[must_use]
    pub fn with_hook_order_check(mut self, enabled: bool) -> Self {
        self.check_hook_order = enabled;
        self
    }

    /// Set the restart limit.
    #[must_use]
    pub fn with_max_restarts(mut self, limit: usize) -> Self {
        self.max_restarts = limit;
        self
    }
}
