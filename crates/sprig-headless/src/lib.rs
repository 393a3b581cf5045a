#![forbid(unsafe_code)]

//! `sprig-headless` provides a host implementation with no real display.
//!
//! Design goals:
//! - **Observable**: every mutation the reconciler issues is recorded as a
//!   [`HostOp`], and any node subtree can be rendered as markup.
//! - **Deterministic time**: deadlines count units of work or are set by
//!   the caller, never read from the wall clock.
//! - **Host-driven events**: the caller dispatches [`Event`](sprig_core::Event)s
//!   to nodes and the attached listeners run synchronously.
//!
//! Tests use it to assert on exact mutation sequences; embedders without a
//! display can use it to run component trees.

pub mod budget;
pub mod memory;

pub use budget::{ManualDeadline, UnitBudget, UnitBudgets};
pub use memory::{HostOp, HostOpKind, MemoryHost, MemoryHostConfig, MemoryHostError, NodeId};
