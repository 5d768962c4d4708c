//! Output-tree inspection: existing records and orphans.
//!
//! The output tree mirrors the input, keyed by collection slug and media
//! stem:
//!
//! ```text
//! _site/
//! ├── index.html
//! ├── assets/                       # synced from resources, not inspected
//! └── collections/
//!     ├── alps-2019/
//!     │   ├── index.html
//!     │   ├── alps-2019.zip         # optional downloadable archive
//!     │   ├── IMG-1/
//!     │   │   ├── original          # fingerprint baseline
//!     │   │   ├── 320px.jpg … 1920px.jpg
//!     │   │   └── (or video.webm, video.mp4)
//!     │   └── IMG-2/
//!     └── street/
//! ```
//!
//! Inspection walks `collections/` one level for collection directories and
//! one level deeper for per-media subtrees, and produces two things:
//!
//! - an [`OutputRecord`] per subtree that still has a matching input file,
//!   carrying the fingerprint of the stored `original` copy. The stored copy
//!   is the baseline the resolver compares against — the input file's
//!   current bytes are never read here.
//! - the set of obsolete paths: collection directories with no scanned
//!   collection of that slug, per-media subtrees whose stem matches no input
//!   file, and stray files that don't belong to the layout. These are
//!   deletion candidates regardless of any other work.
//!
//! A missing output root simply means nothing has been built yet; any other
//! I/O failure is [`InspectError::Unreadable`].

use crate::fingerprint;
use crate::naming::natural_cmp;
use crate::scan::Gallery;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the stored source copy inside each per-media subtree.
pub const ORIGINAL_FILENAME: &str = "original";

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("output tree unreadable at {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One existing derived-output subtree, keyed by `relative_key`.
#[derive(Debug, Clone)]
pub struct OutputRecord {
    /// `<collection>/<stem>` of the matching input file.
    pub relative_key: String,
    /// The per-media output directory.
    pub subtree: PathBuf,
    /// Fingerprint of the stored `original`, or `None` if none was stored.
    pub fingerprint: Option<String>,
}

/// Everything inspection learned about the existing output tree.
#[derive(Debug, Default)]
pub struct OutputState {
    /// `relative_key` → record, for subtrees with a matching input file.
    pub records: HashMap<String, OutputRecord>,
    /// Paths with no matching input, in natural-sort order.
    pub obsolete: Vec<PathBuf>,
}

/// The `collections/` directory under an output root.
pub fn collections_dir(output_root: &Path) -> PathBuf {
    output_root.join("collections")
}

/// The per-media output subtree for a collection slug and media stem.
pub fn media_subtree(output_root: &Path, slug: &str, stem: &str) -> PathBuf {
    collections_dir(output_root).join(slug).join(stem)
}

/// The downloadable-archive path for a collection.
pub fn archive_path(output_root: &Path, slug: &str) -> PathBuf {
    collections_dir(output_root)
        .join(slug)
        .join(format!("{slug}.zip"))
}

/// Inspect the existing output tree against the scanned gallery.
pub fn inspect(output_root: &Path, gallery: &Gallery) -> Result<OutputState, InspectError> {
    let mut state = OutputState::default();

    let collections = collections_dir(output_root);
    let entries = match fs::read_dir(&collections) {
        Ok(entries) => entries,
        // Nothing built yet — not an error.
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(state),
        Err(e) => {
            return Err(InspectError::Unreadable {
                path: collections,
                source: e,
            });
        }
    };

    for entry in entries {
        let path = unreadable(&collections, entry)?.path();
        if !path.is_dir() {
            // Only collection directories belong directly under collections/.
            state.obsolete.push(path);
            continue;
        }
        let slug = name_of(&path);
        match gallery.by_slug(&slug) {
            Some(collection) => {
                inspect_collection(&path, &slug, collection, &mut state)?;
            }
            None => {
                // Whole collection vanished from the input; don't descend.
                state.obsolete.push(path);
            }
        }
    }

    state
        .obsolete
        .sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
    Ok(state)
}

fn inspect_collection(
    dir: &Path,
    slug: &str,
    collection: &crate::scan::Collection,
    state: &mut OutputState,
) -> Result<(), InspectError> {
    let entries = fs::read_dir(dir).map_err(|e| InspectError::Unreadable {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let archive_name = format!("{slug}.zip");
    for entry in entries {
        let path = unreadable(dir, entry)?.path();
        let entry_name = name_of(&path);

        if !path.is_dir() {
            // The rendered page and the archive live alongside the media
            // subtrees; anything else is a stray.
            if entry_name != "index.html" && entry_name != archive_name {
                state.obsolete.push(path);
            }
            continue;
        }

        if !collection.has_stem(&entry_name) {
            state.obsolete.push(path);
            continue;
        }

        let relative_key = format!("{}/{}", collection.name, entry_name);
        let fingerprint = original_fingerprint(&path)?;
        state.records.insert(
            relative_key.clone(),
            OutputRecord {
                relative_key,
                subtree: path,
                fingerprint,
            },
        );
    }
    Ok(())
}

/// Fingerprint the stored `original` inside a subtree, if one exists.
fn original_fingerprint(subtree: &Path) -> Result<Option<String>, InspectError> {
    let original = subtree.join(ORIGINAL_FILENAME);
    match fingerprint::hash_file(&original) {
        Ok(digest) => Ok(Some(digest)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(InspectError::Unreadable {
            path: original,
            source: e,
        }),
    }
}

fn unreadable(dir: &Path, entry: io::Result<fs::DirEntry>) -> Result<fs::DirEntry, InspectError> {
    entry.map_err(|e| InspectError::Unreadable {
        path: dir.to_path_buf(),
        source: e,
    })
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
