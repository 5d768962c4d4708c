//! Gallery configuration.
//!
//! Handles loading and validating `config.toml`, plus the `--init` scaffold
//! that writes a documented stock config and a default resources bundle.
//!
//! ## Config File
//!
//! `gallerize` reads a single `config.toml` from the working directory
//! (override with `--config`):
//!
//! ```toml
//! [gallery]
//! input_directory = "gallery"       # one subdirectory per collection
//! output_directory = "_site"
//! resources_directory = "resources" # assets/ inside is synced to output
//! base_url = ""                     # e.g. "photos" when served under /photos/
//! downloadable_archives = true      # one zip of originals per collection
//! log_level = "info"
//! # icc_profile_path = "/usr/share/color/icc/colord/sRGB.icc"
//!
//! [media]
//! photo_extensions = ["jpg", "jpeg", "png"]
//! video_extensions = ["mov", "avi", "mts", "vid", "mp4"]
//! thumbnail_sizes = [320, 640, 1024, 1280, 1920]
//! video_codecs = ["webm", "mp4"]
//! reserved_filenames = ["metadata.toml"]
//!
//! [template_vars]
//! gallery_title = "A world of wonders"
//! ```
//!
//! All keys are optional; values shown are the defaults. Unknown keys are
//! rejected to catch typos early. `[template_vars]` is a free-form string
//! map passed through to the page templates.
//!
//! The configuration is parsed and validated once at startup and then passed
//! around by reference; nothing mutates it after validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stylesheet written into `resources/assets/` by `--init`.
const DEFAULT_STYLESHEET: &str = include_str!("../static/gallery.css");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("config file not found at {0} (run with --init to create one)")]
    Missing(PathBuf),
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration record, immutable after [`load`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub gallery: GalleryConfig,
    pub media: MediaConfig,
    /// Free-form variables handed to the page templates.
    pub template_vars: BTreeMap<String, String>,
}

/// Directory layout and site-wide switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    pub resources_directory: PathBuf,
    /// Site prefix when the gallery is not served from the domain root.
    pub base_url: String,
    /// Color profile applied to thumbnails, skipped when absent on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icc_profile_path: Option<PathBuf>,
    /// Offer a zip of each collection's originals for download.
    pub downloadable_archives: bool,
    pub log_level: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            input_directory: PathBuf::from("gallery"),
            output_directory: PathBuf::from("_site"),
            resources_directory: PathBuf::from("resources"),
            base_url: String::new(),
            icc_profile_path: Some(PathBuf::from("/usr/share/color/icc/colord/sRGB.icc")),
            downloadable_archives: true,
            log_level: "info".to_string(),
        }
    }
}

/// Media classification and derived-output parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Extensions (lowercase, no dot) treated as photos.
    pub photo_extensions: Vec<String>,
    /// Extensions (lowercase, no dot) treated as videos.
    pub video_extensions: Vec<String>,
    /// Pixel heights to generate for each photo.
    pub thumbnail_sizes: Vec<u32>,
    /// Target codecs to generate for each video.
    pub video_codecs: Vec<String>,
    /// Filenames never treated as media (e.g. per-collection metadata).
    pub reserved_filenames: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            photo_extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
            video_extensions: vec![
                "mov".into(),
                "avi".into(),
                "mts".into(),
                "vid".into(),
                "mp4".into(),
            ],
            thumbnail_sizes: vec![320, 640, 1024, 1280, 1920],
            video_codecs: vec!["webm".into(), "mp4".into()],
            reserved_filenames: vec!["metadata.toml".into()],
        }
    }
}

impl Config {
    /// Validate config values after parsing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.media.photo_extensions.is_empty() && self.media.video_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "media.photo_extensions and media.video_extensions cannot both be empty".into(),
            ));
        }
        if self.media.thumbnail_sizes.is_empty() {
            return Err(ConfigError::Validation(
                "media.thumbnail_sizes cannot be empty".into(),
            ));
        }
        if self.media.video_codecs.is_empty() {
            return Err(ConfigError::Validation(
                "media.video_codecs cannot be empty".into(),
            ));
        }
        for codec in &self.media.video_codecs {
            if codec != "webm" && codec != "mp4" {
                return Err(ConfigError::Validation(format!(
                    "media.video_codecs: unsupported codec '{codec}' (expected webm or mp4)"
                )));
            }
        }
        for ext in self
            .media
            .photo_extensions
            .iter()
            .chain(&self.media.video_extensions)
        {
            if ext.starts_with('.') || ext.chars().any(|c| c.is_ascii_uppercase()) {
                return Err(ConfigError::Validation(format!(
                    "media extensions must be lowercase without a leading dot, got '{ext}'"
                )));
            }
        }
        Ok(())
    }

    /// The site prefix, normalized to always begin and end with `/`.
    ///
    /// `""` → `/`, `"photos"` → `/photos/`, `"/photos/"` → `/photos/`.
    pub fn base_url(&self) -> String {
        let trimmed = self.gallery.base_url.trim_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        }
    }

    /// The color profile path, if configured and present on disk.
    pub fn icc_profile(&self) -> Option<&Path> {
        self.gallery
            .icc_profile_path
            .as_deref()
            .filter(|p| p.exists())
    }

    pub fn is_photo_extension(&self, ext: &str) -> bool {
        self.media.photo_extensions.iter().any(|e| e == ext)
    }

    pub fn is_video_extension(&self, ext: &str) -> bool {
        self.media.video_extensions.iter().any(|e| e == ext)
    }

    pub fn is_reserved(&self, file_name: &str) -> bool {
        self.media.reserved_filenames.iter().any(|r| r == file_name)
    }
}

// =============================================================================
// Loading and scaffolding
// =============================================================================

/// Load and validate the config file at `path`.
///
/// A missing file is [`ConfigError::Missing`], which the CLI reports with a
/// pointer at `--init`. Parse errors and unknown keys are fatal.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Missing(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Scaffold a default `config.toml` and resources bundle.
///
/// Never overwrites: an existing config file or resources directory is left
/// untouched and reported with a warning. Safe to run repeatedly.
pub fn init(config_path: &Path) -> Result<(), ConfigError> {
    if config_path.exists() {
        log::warn!(
            "config file already exists at {}, it will not be modified",
            config_path.display()
        );
    } else {
        fs::write(config_path, stock_config_toml())?;
        log::info!("wrote default config to {}", config_path.display());
    }

    let config = load(config_path)?;
    let assets = config.gallery.resources_directory.join("assets");
    if assets.exists() {
        log::warn!(
            "resources directory already exists at {}, leaving it alone",
            config.gallery.resources_directory.display()
        );
    } else {
        fs::create_dir_all(&assets)?;
        fs::write(assets.join("gallery.css"), DEFAULT_STYLESHEET)?;
        log::info!(
            "scaffolded default resources at {}",
            config.gallery.resources_directory.display()
        );
    }
    Ok(())
}

/// Returns a fully-commented stock `config.toml`.
pub fn stock_config_toml() -> &'static str {
    r##"# gallerize configuration
# =======================
# All settings are optional; values shown are the defaults.
# Unknown keys will cause an error.

[gallery]
# One subdirectory per collection; each becomes a gallery page.
input_directory = "gallery"

# Where the generated site is written.
output_directory = "_site"

# Holds an assets/ directory that is mirrored into the output.
resources_directory = "resources"

# Site prefix when not served from the domain root, e.g. "photos"
# when the site lives under https://example.org/photos/.
base_url = ""

# Color profile applied to thumbnails. Skipped when the file is absent.
icc_profile_path = "/usr/share/color/icc/colord/sRGB.icc"

# Offer a zip of each collection's original files for download.
downloadable_archives = true

# error, warn, info, debug or trace.
log_level = "info"

[media]
# Extensions are matched case-insensitively; list them in lowercase.
photo_extensions = ["jpg", "jpeg", "png"]
video_extensions = ["mov", "avi", "mts", "vid", "mp4"]

# Pixel heights generated for each photo.
thumbnail_sizes = [320, 640, 1024, 1280, 1920]

# Target formats generated for each video (webm and/or mp4).
video_codecs = ["webm", "mp4"]

# Filenames that are never treated as media.
reserved_filenames = ["metadata.toml"]

# Free-form variables available to the page templates.
[template_vars]
gallery_title = "A world of wonders"
gallery_description = "We are such stuff as dreams are made on, and our little life is rounded with a sleep."
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stock_config_parses_to_defaults() {
        let parsed: Config = toml::from_str(stock_config_toml()).unwrap();
        parsed.validate().unwrap();

        let defaults = Config::default();
        assert_eq!(
            parsed.gallery.input_directory,
            defaults.gallery.input_directory
        );
        assert_eq!(parsed.media.thumbnail_sizes, defaults.media.thumbnail_sizes);
        assert_eq!(parsed.media.video_codecs, defaults.media.video_codecs);
        assert_eq!(
            parsed.gallery.downloadable_archives,
            defaults.gallery.downloadable_archives
        );
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.gallery.output_directory, PathBuf::from("_site"));
        assert_eq!(config.media.thumbnail_sizes, vec![320, 640, 1024, 1280, 1920]);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str("[gallery]\nbase_url = \"photos\"\n").unwrap();
        assert_eq!(config.gallery.base_url, "photos");
        assert_eq!(config.gallery.output_directory, PathBuf::from("_site"));
        assert!(!config.media.photo_extensions.is_empty());
    }

    #[test]
    fn unknown_keys_rejected() {
        let result = toml::from_str::<Config>("[gallery]\ninput_dir = \"oops\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_config_missing() {
        let tmp = TempDir::new().unwrap();
        let result = load(&tmp.path().join("config.toml"));
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn load_valid_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[gallery]\nbase_url = \"g\"\n").unwrap();
        let config = load(&path).unwrap();
        assert_eq!(config.base_url(), "/g/");
    }

    #[test]
    fn base_url_always_wrapped_in_slashes() {
        let mut config = Config::default();
        assert_eq!(config.base_url(), "/");

        config.gallery.base_url = "photos".into();
        assert_eq!(config.base_url(), "/photos/");

        config.gallery.base_url = "/photos/".into();
        assert_eq!(config.base_url(), "/photos/");

        config.gallery.base_url = "a/b".into();
        assert_eq!(config.base_url(), "/a/b/");
    }

    #[test]
    fn unsupported_codec_rejected() {
        let mut config = Config::default();
        config.media.video_codecs = vec!["ogv".into()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn empty_sizes_rejected() {
        let mut config = Config::default();
        config.media.thumbnail_sizes.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn uppercase_extension_rejected() {
        let mut config = Config::default();
        config.media.photo_extensions = vec!["JPG".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn icc_profile_skipped_when_absent() {
        let mut config = Config::default();
        config.gallery.icc_profile_path = Some(PathBuf::from("/does/not/exist.icc"));
        assert!(config.icc_profile().is_none());
    }

    #[test]
    fn icc_profile_used_when_present() {
        let tmp = TempDir::new().unwrap();
        let icc = tmp.path().join("srgb.icc");
        fs::write(&icc, b"fake profile").unwrap();

        let mut config = Config::default();
        config.gallery.icc_profile_path = Some(icc.clone());
        assert_eq!(config.icc_profile(), Some(icc.as_path()));
    }

    #[test]
    fn init_scaffolds_config_and_resources() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        // Resources paths in the stock config are relative to the cwd of the
        // process; point the scaffold somewhere isolated instead.
        let resources = tmp.path().join("resources");
        fs::write(
            &config_path,
            format!(
                "[gallery]\nresources_directory = {:?}\n",
                resources.to_string_lossy()
            ),
        )
        .unwrap();

        init(&config_path).unwrap();
        assert!(resources.join("assets").join("gallery.css").exists());
    }

    #[test]
    fn init_never_overwrites_existing_config() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        let resources = tmp.path().join("resources");
        let original = format!(
            "[gallery]\nbase_url = \"keepme\"\nresources_directory = {:?}\n",
            resources.to_string_lossy()
        );
        fs::write(&config_path, &original).unwrap();

        init(&config_path).unwrap();
        assert_eq!(fs::read_to_string(&config_path).unwrap(), original);
    }

    #[test]
    fn template_vars_pass_through() {
        let config: Config =
            toml::from_str("[template_vars]\ngallery_title = \"Hi\"\ncustom = \"x\"\n").unwrap();
        assert_eq!(config.template_vars.get("gallery_title").unwrap(), "Hi");
        assert_eq!(config.template_vars.get("custom").unwrap(), "x");
    }
}
