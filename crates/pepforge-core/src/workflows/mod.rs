//! # Workflows Module
//!
//! Top-level entry points that drive complete runs. Each workflow validates nothing itself:
//! it takes an already validated [`RunConfig`](crate::engine::config::RunConfig), lays out
//! the output directory, and threads typed stage records from one stage to the next while
//! reporting progress.
//!
//! - **Pipeline** ([`pipeline`]) - the full design run, from target preparation to the
//!   report, with the optimize-existing and prediction branches.
//! - **Rescore** ([`rescore`]) - re-scores and re-ranks a designs table produced elsewhere
//!   (for example by a notebook run of the design tools).

pub mod pipeline;
pub mod rescore;

use crate::engine::progress::{Progress, ProgressReporter};

/// Numbers stages as they start so front ends can show `[3/8]`-style progress.
pub(crate) struct StageTracker<'r, 'a> {
    reporter: &'r ProgressReporter<'a>,
    index: usize,
    total: usize,
}

impl<'r, 'a> StageTracker<'r, 'a> {
    pub(crate) fn new(reporter: &'r ProgressReporter<'a>, total: usize) -> Self {
        Self {
            reporter,
            index: 0,
            total,
        }
    }

    pub(crate) fn start(&mut self, name: &'static str) {
        self.index += 1;
        self.reporter.report(Progress::StageStart {
            name,
            index: self.index,
            total: self.total,
        });
    }

    pub(crate) fn finish(&self) {
        self.reporter.report(Progress::StageFinish);
    }

    pub(crate) fn skip(&self, name: &'static str, reason: &'static str) {
        self.reporter.report(Progress::StageSkipped { name, reason });
    }
}
