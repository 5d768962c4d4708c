//! The build pipeline: scan → inspect → resolve → build → render.
//!
//! One [`run`] call performs a full incremental build:
//!
//! 1. [`scan`](crate::scan) the input tree into collections and media files;
//! 2. [`inspect`](crate::inspect) the existing output tree for records and
//!    orphans;
//! 3. [`resolve`](crate::resolve) the two into work items and deletions;
//! 4. [`emit`](crate::plan::emit) and [`execute`](crate::plan::execute) the
//!    build plan through the injected [`ToolRunner`];
//! 5. [`build`](crate::gallery::build) the gallery model and
//!    [`render`](crate::render) all pages.
//!
//! Steps 1–3 are sequential, synchronous, and cheap; the heavy lifting
//! happens inside the external processes step 4 spawns. Rendering is gated
//! on the whole plan succeeding: a failed tool aborts the run before any
//! page is (re)written, so a published page never references an asset that
//! failed to materialize.

use crate::config::Config;
use crate::inspect::InspectError;
use crate::plan::PlanError;
use crate::render::RenderError;
use crate::resolve::{Reason, ResolveError};
use crate::scan::ScanError;
use crate::tools::ToolRunner;
use crate::{gallery, inspect, plan, render, resolve, scan};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Inspect(#[from] InspectError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What one pipeline run did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub collections: usize,
    pub media: usize,
    pub missing: usize,
    pub changed: usize,
    pub deletions: usize,
    pub pages: usize,
}

impl RunSummary {
    pub fn regenerated(&self) -> usize {
        self.missing + self.changed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.regenerated() == 0 && self.deletions == 0 {
            write!(f, "everything up to date, {} pages rendered", self.pages)
        } else {
            write!(
                f,
                "{} regenerated ({} missing, {} changed), {} deleted, {} pages rendered",
                self.regenerated(),
                self.missing,
                self.changed,
                self.deletions,
                self.pages
            )
        }
    }
}

/// Run the full pipeline with the given tool runner.
pub fn run(config: &Config, runner: &dyn ToolRunner) -> Result<RunSummary, Error> {
    let output_root = &config.gallery.output_directory;

    let scanned = scan::scan(config)?;
    log::info!(
        "scanned {} collections, {} media files from {}",
        scanned.collections.len(),
        scanned.media_count(),
        config.gallery.input_directory.display()
    );

    let state = inspect::inspect(output_root, &scanned)?;
    let work = resolve::resolve(&scanned, &state, output_root, config)?;

    let missing = work
        .work_items
        .iter()
        .filter(|w| w.reason == Reason::Missing)
        .count();
    let changed = work.work_items.len() - missing;
    log::info!(
        "{} missing, {} changed, {} paths to delete",
        missing,
        changed,
        work.deletions.len()
    );

    let build_plan = plan::emit(&scanned, &work, config)?;
    let deletions = build_plan.deletions.len();
    plan::execute(&build_plan, runner)?;

    let model = gallery::build(&scanned, config);
    let pages = render::render_site(&model, output_root)?;

    Ok(RunSummary {
        collections: scanned.collections.len(),
        media: scanned.media_count(),
        missing,
        changed,
        deletions,
        pages,
    })
}
