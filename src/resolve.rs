//! Staleness resolution: what to rebuild, what to delete.
//!
//! Joins the scanned input ([`Gallery`]) with the inspected output state
//! ([`OutputState`]) and decides, per media file:
//!
//! 1. No output record for its key → [`Reason::Missing`], regenerate.
//! 2. Record exists → fingerprint the *input* file (same algorithm the
//!    inspector used on the stored copy) and compare:
//!    - equal → up to date, nothing to do;
//!    - different, or the record has no stored fingerprint → delete the
//!      existing subtree **and** regenerate ([`Reason::Changed`]). The
//!      deletion is ordered ahead of regeneration so a stale variant can
//!      never survive alongside fresh ones under the same directory.
//! 3. Obsolete paths found by the inspector always join the deletion set.
//!
//! For a fixed filesystem state the resulting work and deletion lists are
//! identical on every run: items follow the gallery's natural-sort order and
//! deletions are sorted before being returned. Beyond the fingerprint reads
//! delegated through its inputs this module performs no I/O.

use crate::config::Config;
use crate::fingerprint;
use crate::inspect::{self, OutputState};
use crate::naming::natural_cmp;
use crate::scan::{Gallery, MediaKind};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("failed to fingerprint {path}: {source}")]
    Fingerprint {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a media file needs regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// No derived outputs exist yet.
    Missing,
    /// The source bytes changed since the outputs were produced.
    Changed,
}

/// One derived output still to produce for a media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Copy of the source file, the fingerprint baseline for later runs.
    StoreOriginal,
    /// `<size>px.jpg` thumbnail.
    Thumbnail(u32),
    /// `video.<codec>` transcode.
    Transcode(String),
}

/// One media file requiring regeneration.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub relative_key: String,
    pub source_path: PathBuf,
    /// Collection slug, i.e. the output directory under `collections/`.
    pub slug: String,
    pub stem: String,
    pub kind: MediaKind,
    pub reason: Reason,
    /// The per-media output subtree all targets are written into.
    pub subtree: PathBuf,
    /// Derived outputs to produce, in emission order.
    pub targets: Vec<Target>,
}

/// The resolved plan: regeneration work plus obsolete-path deletions.
///
/// Deletions must be executed before any work item regenerates into the
/// same subtree.
#[derive(Debug, Default)]
pub struct WorkPlan {
    pub work_items: Vec<WorkItem>,
    pub deletions: Vec<PathBuf>,
}

impl WorkPlan {
    pub fn is_empty(&self) -> bool {
        self.work_items.is_empty() && self.deletions.is_empty()
    }
}

/// Resolve the gallery against the inspected output state.
pub fn resolve(
    gallery: &Gallery,
    state: &OutputState,
    output_root: &Path,
    config: &Config,
) -> Result<WorkPlan, ResolveError> {
    let mut plan = WorkPlan {
        work_items: Vec::new(),
        deletions: state.obsolete.clone(),
    };

    for collection in &gallery.collections {
        for media in &collection.media {
            let subtree = inspect::media_subtree(output_root, &collection.slug, &media.stem);
            let reason = match state.records.get(&media.relative_key) {
                None => Reason::Missing,
                Some(record) => {
                    let current = fingerprint::hash_file(&media.source_path).map_err(|source| {
                        ResolveError::Fingerprint {
                            path: media.source_path.clone(),
                            source,
                        }
                    })?;
                    match &record.fingerprint {
                        Some(stored) if *stored == current => continue,
                        // Changed bytes, or no stored baseline to trust:
                        // drop the subtree and rebuild it.
                        _ => {
                            plan.deletions.push(record.subtree.clone());
                            Reason::Changed
                        }
                    }
                }
            };

            plan.work_items.push(WorkItem {
                relative_key: media.relative_key.clone(),
                source_path: media.source_path.clone(),
                slug: collection.slug.clone(),
                stem: media.stem.clone(),
                kind: media.kind,
                reason,
                subtree,
                targets: targets_for(media.kind, config),
            });
        }
    }

    plan.deletions
        .sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
    Ok(plan)
}

/// The derived outputs a media file of the given kind must produce.
fn targets_for(kind: MediaKind, config: &Config) -> Vec<Target> {
    let mut targets = vec![Target::StoreOriginal];
    match kind {
        MediaKind::Photo => {
            targets.extend(config.media.thumbnail_sizes.iter().map(|&s| Target::Thumbnail(s)));
        }
        MediaKind::Video => {
            targets.extend(
                config
                    .media
                    .video_codecs
                    .iter()
                    .map(|c| Target::Transcode(c.clone())),
            );
        }
    }
    targets
}
