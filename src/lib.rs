//! # Gallerize
//!
//! An incremental static site generator for photo and video galleries.
//! Your filesystem is the data source: top-level directories of the input
//! tree become collections, their photos and videos become slides, and each
//! collection renders as one gallery page.
//!
//! # Architecture: An Incremental Pipeline
//!
//! Every build runs the same five stages:
//!
//! ```text
//! 1. Scan      input/      →  collections + media files
//! 2. Inspect   _site/      →  output records + orphans
//! 3. Resolve   both        →  work items + deletions
//! 4. Build     work items  →  external tools produce derived assets
//! 5. Render    model       →  index.html + one page per collection
//! ```
//!
//! The point of the split is stage 3: for a tree of media files that changes
//! over time, only the necessary outputs are regenerated and outputs whose
//! sources vanished are deleted. Change detection is content-based — each
//! per-media output subtree stores a copy of its source (`original`), and a
//! source is stale exactly when its fingerprint differs from the stored
//! copy's. Renames of collections, reordering, and timestamp churn never
//! cause spurious rebuilds; a single flipped byte always causes exactly one.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | walks the input tree into collections and classified media files |
//! | [`inspect`] | walks the output tree, fingerprints stored originals, finds orphans |
//! | [`resolve`] | decides per media file: up to date, missing, or changed |
//! | [`plan`] | assembles and executes deletions, copies, and tool invocations |
//! | [`tools`] | the external tool contracts and the injected `ToolRunner` capability |
//! | [`gallery`] | folds the scan into the template-facing site model |
//! | [`render`] | maud page generation |
//! | [`fingerprint`] | streamed SHA-256 content hashing |
//! | [`naming`] | natural-sort comparator and slugification |
//! | [`config`] | `config.toml` loading, validation, `--init` scaffolding |
//! | [`pipeline`] | ties the stages together |
//!
//! # Design Decisions
//!
//! ## Content Fingerprints Over Modification Times
//!
//! Staleness is decided by hashing bytes, never by comparing timestamps.
//! Timestamps lie after `git checkout`, `rsync`, and backup restores; bytes
//! don't. The stored `original` copy inside each output subtree is the
//! comparison baseline, so inspection never needs to trust anything outside
//! the output tree itself.
//!
//! ## External Tools Over In-Process Codecs
//!
//! Thumbnailing and transcoding go through `vipsthumbnail` and `ffmpeg` as
//! opaque subprocesses with fixed argument contracts. Those tools parallelize
//! internally and improve independently of this binary; the pipeline itself
//! stays single-threaded and easy to reason about. The process boundary is
//! the [`tools::ToolRunner`] trait, so tests swap in an in-process fake and
//! never need the tools installed.
//!
//! ## All-or-Nothing Builds
//!
//! A nonzero exit from any tool aborts the run before a single page is
//! written. Pages reference derived assets by path; publishing a page whose
//! assets failed to materialize would be a broken gallery, which is worse
//! than a build error.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system: malformed markup is a build error, interpolation is
//! auto-escaped, and there is no template directory to ship or get out of
//! sync.

pub mod config;
pub mod fingerprint;
pub mod gallery;
pub mod inspect;
pub mod naming;
pub mod pipeline;
pub mod plan;
pub mod render;
pub mod resolve;
pub mod scan;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_helpers;
