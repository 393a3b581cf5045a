#![forbid(unsafe_code)]

//! Idle-callback deadlines.
//!
//! A host that schedules work during idle periods hands the renderer an
//! [`IdleDeadline`] for each callback. The renderer polls it between units
//! of work and yields once the remaining time drops below its threshold.

use std::time::{Duration, Instant};

/// Time budget of one idle callback.
pub trait IdleDeadline {
    /// Time left before the host wants control back.
    fn time_remaining(&self) -> Duration;

    /// Whether the callback fired because its timeout elapsed.
    fn did_timeout(&self) -> bool {
        false
    }
}

/// A fixed remaining time that never shrinks.
impl IdleDeadline for Duration {
    fn time_remaining(&self) -> Duration {
        *self
    }
}

impl<D: IdleDeadline + ?Sized> IdleDeadline for &D {
    fn time_remaining(&self) -> Duration {
        (**self).time_remaining()
    }

    fn did_timeout(&self) -> bool {
        (**self).did_timeout()
    }
}

/// Deadline measured against the monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstantDeadline {
    end: Instant,
}

impl InstantDeadline {
    /// Deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            end: Instant::now() + budget,
        }
    }

    /// Deadline at a fixed instant.
    #[must_use]
    pub const fn at(end: Instant) -> Self {
        Self { end }
    }
}

impl IdleDeadline for InstantDeadline {
    fn time_remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }
}

/// Produces one deadline per idle callback.
pub trait DeadlineSource {
    /// Deadline type handed to the work loop.
    type Deadline: IdleDeadline;

    /// Deadline for the next callback, or `None` when the host is done
    /// granting time.
    fn next_deadline(&mut self) -> Option<Self::Deadline>;
}

/// Grants a fixed wall-clock budget per callback, for at most `frames`
/// callbacks when a limit is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBudget {
    budget: Duration,
    remaining_frames: Option<usize>,
}

impl FrameBudget {
    /// Unlimited callbacks of `budget` each.
    #[must_use]
    pub const fn new(budget: Duration) -> Self {
        Self {
            budget,
            remaining_frames: None,
        }
    }

    /// Stop after `frames` callbacks.
    #[must_use]
    pub const fn with_frame_limit(mut self, frames: usize) -> Self {
        self.remaining_frames = Some(frames);
        self
    }

    /// Per-callback budget.
    #[must_use]
    pub const fn budget(&self) -> Duration {
        self.budget
    }
}

impl Default for FrameBudget {
    /// One 60 Hz frame.
    fn default() -> Self {
        Self::new(Duration::from_micros(16_667))
    }
}

impl DeadlineSource for FrameBudget {
    type Deadline = InstantDeadline;

    fn next_deadline(&mut self) -> Option<InstantDeadline> {
        if let Some(frames) = self.remaining_frames.as_mut() {
            if *frames == 0 {
                return None;
            }
            *frames -= 1;
        }
        Some(InstantDeadline::after(self.budget))
    }
}
