#![forbid(unsafe_code)]

//! Fiber reconciler for Sprig.
//!
//! Turns element trees into host mutations in two phases. The render phase
//! is split into units of work (one per fiber) that can be interrupted at
//! any unit boundary; the commit phase applies all effects at once. A new
//! `render` or a state update replaces the pass in progress.
//!
//! # Role in Sprig
//! `sprig-runtime` sits between the element model in `sprig-core` and a
//! concrete [`Host`](sprig_core::Host). It owns no I/O and no clock: the
//! host supplies deadlines and decides when to call back.

pub mod commit;
pub mod config;
pub mod drive;
pub mod error;
pub mod fiber;
mod reconcile;
pub mod renderer;
pub mod session;
mod work;

pub use commit::CommitSummary;
pub use config::RendererConfig;
pub use drive::{DriveReport, drive_until_idle};
pub use error::RenderError;
pub use fiber::{EffectTag, Fiber, FiberArena, FiberId, FiberKind};
pub use renderer::{Renderer, WorkStatus};
pub use session::RenderSession;
