#![forbid(unsafe_code)]

//! Deterministic deadlines.
//!
//! The renderer polls its deadline once after every unit of work.
//! [`UnitBudget`] turns that poll count into a budget measured in units, so
//! a test can say "yield after three fibers" without touching a clock.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use sprig_core::{DeadlineSource, IdleDeadline};

/// Time reported while a [`UnitBudget`] still has units left.
const PLENTY: Duration = Duration::from_secs(3600);

/// A deadline that runs out after a fixed number of polls.
#[derive(Debug, Clone)]
pub struct UnitBudget {
    units: usize,
    polled: Cell<usize>,
}

impl UnitBudget {
    /// Budget of `units` units of work.
    #[must_use]
    pub const fn new(units: usize) -> Self {
        Self {
            units,
            polled: Cell::new(0),
        }
    }

    /// Polls observed so far.
    #[must_use]
    pub fn polled(&self) -> usize {
        self.polled.get()
    }
}

impl IdleDeadline for UnitBudget {
    fn time_remaining(&self) -> Duration {
        let polled = self.polled.get() + 1;
        self.polled.set(polled);
        if polled < self.units {
            PLENTY
        } else {
            Duration::ZERO
        }
    }
}

/// A deadline whose remaining time is set by the caller.
///
/// Clones share the same value, so a test can hold one handle and adjust
/// the budget while the renderer holds another.
#[derive(Debug, Clone, Default)]
pub struct ManualDeadline {
    remaining: Rc<Cell<Duration>>,
}

impl ManualDeadline {
    /// Deadline reporting `remaining`.
    #[must_use]
    pub fn new(remaining: Duration) -> Self {
        Self {
            remaining: Rc::new(Cell::new(remaining)),
        }
    }

    /// Change the reported time.
    pub fn set(&self, remaining: Duration) {
        self.remaining.set(remaining);
    }

    /// Report no time left.
    pub fn exhaust(&self) {
        self.set(Duration::ZERO);
    }
}

impl IdleDeadline for ManualDeadline {
    fn time_remaining(&self) -> Duration {
        self.remaining.get()
    }
}

/// A [`DeadlineSource`] handing out [`UnitBudget`]s.
#[derive(Debug, Clone, Default)]
pub struct UnitBudgets {
    queued: VecDeque<usize>,
    repeat: Option<usize>,
}

impl UnitBudgets {
    /// One callback per listed budget, then none.
    #[must_use]
    pub fn new(budgets: impl IntoIterator<Item = usize>) -> Self {
        Self {
            queued: budgets.into_iter().collect(),
            repeat: None,
        }
    }

    /// Unlimited callbacks of `units` each.
    #[must_use]
    pub fn repeat(units: usize) -> Self {
        Self {
            queued: VecDeque::new(),
            repeat: Some(units),
        }
    }

    /// After the listed budgets run out, keep granting `units`.
    #[must_use]
    pub const fn then_repeat(mut self, units: usize) -> Self {
        self.repeat = Some(units);
        self
    }
}

impl DeadlineSource for UnitBudgets {
    type Deadline = UnitBudget;

    fn next_deadline(&mut self) -> Option<UnitBudget> {
        self.queued
            .pop_front()
            .or(self.repeat)
            .map(UnitBudget::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_budget_runs_out_on_nth_poll() {
        let budget = UnitBudget::new(3);
        assert!(budget.time_remaining() > Duration::ZERO);
        assert!(budget.time_remaining() > Duration::ZERO);
        assert_eq!(budget.time_remaining(), Duration::ZERO);
        assert_eq!(budget.time_remaining(), Duration::ZERO);
        assert_eq!(budget.polled(), 4);
    }

    #[test]
    fn zero_and_one_unit_budgets_are_exhausted_immediately() {
        assert_eq!(UnitBudget::new(0).time_remaining(), Duration::ZERO);
        assert_eq!(UnitBudget::new(1).time_remaining(), Duration::ZERO);
    }

    #[test]
    fn manual_deadline_is_shared() {
        let deadline = ManualDeadline::new(Duration::from_millis(5));
        let handle = deadline.clone();
        handle.exhaust();
        assert_eq!(deadline.time_remaining(), Duration::ZERO);
        handle.set(Duration::from_millis(2));
        assert_eq!(deadline.time_remaining(), Duration::from_millis(2));
    }

    #[test]
    fn unit_budgets_drain_then_repeat() {
        let mut source = UnitBudgets::new([1, 2]).then_repeat(5);
        let units: Vec<usize> = (0..4)
            .filter_map(|_| source.next_deadline())
            .map(|d| d.units)
            .collect();
        assert_eq!(units, vec![1, 2, 5, 5]);

        let mut finite = UnitBudgets::new([4]);
        assert!(finite.next_deadline().is_some());
        assert!(finite.next_deadline().is_none());
    }
}
