//! Shared test utilities for the gallerize test suite.
//!
//! Every test works against an isolated temp directory; [`test_config`]
//! points all configured paths inside it so tests can freely create inputs,
//! pre-seed output trees, and assert on results without touching the
//! working directory.

use std::fs;
use std::path::Path;

use crate::config::Config;

/// A config whose input/output/resources directories all live under `root`.
///
/// The resources `assets/` directory is created (the pipeline requires it);
/// the input directory is not, so tests for `InputNotFound` stay possible.
/// The ICC profile is disabled to keep tool argument lists deterministic.
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.gallery.input_directory = root.join("gallery");
    config.gallery.output_directory = root.join("_site");
    config.gallery.resources_directory = root.join("resources");
    config.gallery.icc_profile_path = None;
    fs::create_dir_all(config.gallery.resources_directory.join("assets")).unwrap();
    config
}

/// Create a media file with the given bytes under `<input>/<collection>/`.
pub fn write_media(config: &Config, collection: &str, name: &str, bytes: &[u8]) {
    let dir = config.gallery.input_directory.join(collection);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), bytes).unwrap();
}
