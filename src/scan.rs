//! Input scanning: collections and media files.
//!
//! Walks the input directory and classifies what it finds. The layout is one
//! level of collections, one level of media:
//!
//! ```text
//! gallery/                        # input root
//! ├── Alps 2019/                  # collection (one gallery page)
//! │   ├── metadata.toml           # optional title / uri_title overrides
//! │   ├── IMG-1.jpg
//! │   ├── IMG-2.jpg
//! │   └── summit.mov
//! └── Street/
//!     └── crossing.png
//! ```
//!
//! Collections are visited in natural-sort order of their directory name, and
//! media within a collection in natural-sort order of filename, so `IMG-9`
//! comes before `IMG-10`. Files whose extension matches neither configured
//! set are ignored silently; reserved filenames and dotfiles are never media.
//!
//! Each media file gets a `relative_key` — its path relative to the input
//! root with the extension stripped — which is the identity used to correlate
//! the input tree with the derived-output tree across runs. Two files in one
//! collection sharing a stem would write the same output subtree, so that is
//! a fatal [`ScanError::DuplicateMediaKey`] rather than a silent overwrite.
//!
//! Scanning is a pure read: no file content is touched, only directory
//! listings and the optional per-collection metadata file.

use crate::config::Config;
use crate::naming::{natural_cmp, slugify};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Per-collection metadata filename, looked up inside each collection dir.
pub const METADATA_FILENAME: &str = "metadata.toml";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("input directory not found: {0} (run with --init to scaffold a site)")]
    InputNotFound(PathBuf),
    #[error("media files '{first}' and '{second}' in collection '{collection}' differ only by extension; their outputs would collide")]
    DuplicateMediaKey {
        collection: String,
        first: String,
        second: String,
    },
}

/// Classification of an input file by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

/// One input asset. Constructed once per scan, immutable afterwards.
#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Full path to the source file.
    pub source_path: PathBuf,
    /// Filename including extension.
    pub file_name: String,
    /// Filename with extension stripped; unique within a collection.
    pub stem: String,
    /// `<collection>/<stem>` — correlates input and output trees.
    pub relative_key: String,
    pub kind: MediaKind,
}

/// A named group of media files: one top-level input subdirectory,
/// rendered as one gallery page.
#[derive(Debug, Clone)]
pub struct Collection {
    /// Directory name; the natural-sort key for cross-run ordering.
    pub name: String,
    /// Display title: metadata override or the directory name.
    pub title: String,
    /// Output directory name under `collections/`.
    pub slug: String,
    /// Full path to the input directory.
    pub dir: PathBuf,
    /// Media in natural-sort order of filename.
    pub media: Vec<MediaFile>,
}

impl Collection {
    pub fn has_stem(&self, stem: &str) -> bool {
        self.media.iter().any(|m| m.stem == stem)
    }
}

/// The scanned input tree, collections in natural-sort order.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    pub collections: Vec<Collection>,
}

impl Gallery {
    pub fn by_slug(&self, slug: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.slug == slug)
    }

    pub fn media_count(&self) -> usize {
        self.collections.iter().map(|c| c.media.len()).sum()
    }
}

/// Optional `metadata.toml` inside a collection directory.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct MetadataFile {
    collection: MetadataSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct MetadataSection {
    title: Option<String>,
    uri_title: Option<String>,
}

/// Scan the input directory into an ordered [`Gallery`].
pub fn scan(config: &Config) -> Result<Gallery, ScanError> {
    let root = &config.gallery.input_directory;
    if !root.exists() {
        return Err(ScanError::InputNotFound(root.clone()));
    }

    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort_by(|a, b| natural_cmp(&name_of(a), &name_of(b)));

    let mut collections = Vec::with_capacity(dirs.len());
    for dir in dirs {
        collections.push(scan_collection(&dir, config)?);
    }

    Ok(Gallery { collections })
}

fn scan_collection(dir: &Path, config: &Config) -> Result<Collection, ScanError> {
    let name = name_of(dir);
    let (title, uri_title) = read_metadata(dir, &name);
    let slug = uri_title.unwrap_or_else(|| slugify(&title));

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            let file_name = name_of(p);
            p.is_file() && !file_name.starts_with('.') && !config.is_reserved(&file_name)
        })
        .collect();
    files.sort_by(|a, b| natural_cmp(&name_of(a), &name_of(b)));

    let mut media = Vec::new();
    let mut seen_stems: HashMap<String, String> = HashMap::new();
    for path in files {
        let file_name = name_of(&path);
        let Some(kind) = classify(&path, config) else {
            log::debug!("ignoring {}: unrecognized extension", path.display());
            continue;
        };
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.clone());

        if let Some(first) = seen_stems.insert(stem.clone(), file_name.clone()) {
            return Err(ScanError::DuplicateMediaKey {
                collection: name.clone(),
                first,
                second: file_name,
            });
        }

        media.push(MediaFile {
            source_path: path,
            relative_key: format!("{name}/{stem}"),
            file_name,
            stem,
            kind,
        });
    }

    Ok(Collection {
        name,
        title,
        slug,
        dir: dir.to_path_buf(),
        media,
    })
}

/// Read `metadata.toml` from a collection directory.
///
/// Returns `(title, uri_title override)`. A malformed file is recovered at
/// this scope: a warning is logged and the directory name stands in as the
/// title, so one broken collection never aborts the run.
fn read_metadata(dir: &Path, dir_name: &str) -> (String, Option<String>) {
    let path = dir.join(METADATA_FILENAME);
    if !path.exists() {
        return (dir_name.to_string(), None);
    }

    let parsed = fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|content| toml::from_str::<MetadataFile>(&content).map_err(|e| e.to_string()));

    match parsed {
        Ok(metadata) => {
            let title = metadata
                .collection
                .title
                .unwrap_or_else(|| dir_name.to_string());
            (title, metadata.collection.uri_title)
        }
        Err(err) => {
            log::warn!(
                "invalid collection metadata at {}: {err}; falling back to directory name",
                path.display()
            );
            (dir_name.to_string(), None)
        }
    }
}

fn classify(path: &Path, config: &Config) -> Option<MediaKind> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())?;
    if config.is_photo_extension(&ext) {
        Some(MediaKind::Photo)
    } else if config.is_video_extension(&ext) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
