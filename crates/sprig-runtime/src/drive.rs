#![forbid(unsafe_code)]

//! Host-side idle loop.
//!
//! Stands in for a host scheduler that fires one idle callback after
//! another: each callback gets a fresh deadline from a [`DeadlineSource`]
//! and runs one [`Renderer::work_loop`] slice.

use sprig_core::{DeadlineSource, Host};
use tracing::debug;

use crate::commit::CommitSummary;
use crate::error::RenderError;
use crate::renderer::{Renderer, WorkStatus};

/// Statistics of one [`drive_until_idle`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveReport {
    /// Idle callbacks consumed.
    pub slices: usize,
    /// Units of work processed across all slices.
    pub units: usize,
    /// Passes committed.
    pub commits: usize,
    /// Summary of the last commit.
    pub last_commit: Option<CommitSummary>,
    /// The source stopped granting deadlines before the renderer was idle.
    pub starved: bool,
}

/// Run slices until the renderer needs no further callback or `source`
/// runs dry.
pub fn drive_until_idle<H: Host, S: DeadlineSource>(
    renderer: &mut Renderer<H>,
    source: &mut S,
) -> Result<DriveReport, RenderError<H::Error>> {
    let mut report = DriveReport::default();
    while renderer.needs_idle_callback() {
        let Some(deadline) = source.next_deadline() else {
            report.starved = true;
            break;
        };
        let status = renderer.work_loop(&deadline)?;
        report.slices += 1;
        report.units += status.units();
        if let WorkStatus::Committed { summary, .. } = status {
            report.commits += 1;
            report.last_commit = Some(summary);
        }
    }
    debug!(
        slices = report.slices,
        units = report.units,
        commits = report.commits,
        starved = report.starved,
        "drive finished"
    );
    Ok(report)
}
