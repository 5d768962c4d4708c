//! Build plan emission and execution.
//!
//! Turns a resolved [`WorkPlan`] into a concrete [`BuildPlan`] — the ordered
//! deletions, original-copy writes, and [`ToolInvocation`]s a run will
//! perform — and executes it through an injected [`ToolRunner`].
//!
//! Emission is pure assembly plus two filesystem probes (the resources
//! check and per-collection archive existence); all writes happen in
//! [`execute`]. That split keeps the emitter testable against a fake runner
//! and makes the execution order explicit:
//!
//! 1. deletions (obsolete and stale subtrees),
//! 2. original copies into the fresh subtrees,
//! 3. tool invocations (thumbnails, transcodes, assets sync, archives).
//!
//! Deletions run strictly before regeneration, so a subtree being rebuilt
//! can never end up holding a mix of stale and fresh variants. Every output
//! path in a plan is written by exactly one step; a duplicate is a bug in
//! plan assembly (for example two collections slugifying to the same name)
//! and fails emission with [`PlanError::DuplicateOutput`] before anything
//! touches the disk.
//!
//! Any tool failure aborts execution immediately; page rendering only
//! happens after the whole plan has succeeded.

use crate::config::Config;
use crate::inspect::{self, ORIGINAL_FILENAME};
use crate::resolve::{Target, WorkPlan};
use crate::scan::Gallery;
use crate::tools::{self, ToolError, ToolInvocation, ToolRunner};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("two build steps write the same output path: {0}")]
    DuplicateOutput(PathBuf),
    #[error("unsupported video codec '{0}'")]
    UnknownCodec(String),
    #[error("resources directory not found: {0} (run with --init to scaffold it)")]
    ResourcesNotFound(PathBuf),
    #[error("tool invocation failed: {0}")]
    Tool(#[from] ToolError),
}

/// Everything one run will do to the output tree, in execution order.
#[derive(Debug, Default)]
pub struct BuildPlan {
    pub deletions: Vec<PathBuf>,
    /// `(source, stored copy)` pairs written before the tool invocations.
    pub originals: Vec<(PathBuf, PathBuf)>,
    pub invocations: Vec<ToolInvocation>,
}

/// Assemble the build plan for a resolved work plan.
pub fn emit(
    gallery: &Gallery,
    work_plan: &WorkPlan,
    config: &Config,
) -> Result<BuildPlan, PlanError> {
    let output_root = &config.gallery.output_directory;
    let assets_src = config.gallery.resources_directory.join("assets");
    if !assets_src.is_dir() {
        return Err(PlanError::ResourcesNotFound(assets_src));
    }

    let mut plan = BuildPlan {
        deletions: work_plan.deletions.clone(),
        ..BuildPlan::default()
    };

    for item in &work_plan.work_items {
        for target in &item.targets {
            match target {
                Target::StoreOriginal => {
                    plan.originals
                        .push((item.source_path.clone(), item.subtree.join(ORIGINAL_FILENAME)));
                }
                Target::Thumbnail(size) => {
                    let output = item.subtree.join(format!("{size}px.jpg"));
                    plan.invocations.push(tools::thumbnail(
                        &item.source_path,
                        &output,
                        *size,
                        config.icc_profile(),
                    ));
                }
                Target::Transcode(codec) => {
                    let output = item.subtree.join(format!("video.{codec}"));
                    let invocation = match codec.as_str() {
                        "webm" => tools::transcode_webm(&item.source_path, &output),
                        "mp4" => tools::transcode_mp4(&item.source_path, &output),
                        other => return Err(PlanError::UnknownCodec(other.to_string())),
                    };
                    plan.invocations.push(invocation);
                }
            }
        }
    }

    plan.invocations
        .push(tools::sync_assets(&assets_src, &output_root.join("assets")));

    if config.gallery.downloadable_archives {
        emit_archives(gallery, work_plan, config, &mut plan)?;
    }

    check_output_uniqueness(&plan)?;
    Ok(plan)
}

/// Schedule per-collection archives that are missing or whose collection
/// saw any regeneration or deletion this run.
fn emit_archives(
    gallery: &Gallery,
    work_plan: &WorkPlan,
    config: &Config,
    plan: &mut BuildPlan,
) -> Result<(), PlanError> {
    let output_root = &config.gallery.output_directory;
    let touched = touched_slugs(work_plan, output_root);

    for collection in &gallery.collections {
        let archive_path = inspect::archive_path(output_root, &collection.slug);
        if archive_path.exists() && !touched.contains(collection.slug.as_str()) {
            continue;
        }

        // Archive the collection's original files, not the derived outputs.
        let mut files: Vec<PathBuf> = fs::read_dir(&collection.dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                let name = p
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                p.is_file() && !name.starts_with('.') && !config.is_reserved(&name)
            })
            .collect();
        if files.is_empty() {
            continue;
        }
        files.sort();
        plan.invocations.push(tools::archive(&archive_path, &files));
    }
    Ok(())
}

/// Slugs of collections affected by this run's work items or deletions.
fn touched_slugs(work_plan: &WorkPlan, output_root: &Path) -> HashSet<String> {
    let mut touched: HashSet<String> = work_plan
        .work_items
        .iter()
        .map(|w| w.slug.clone())
        .collect();

    let collections = inspect::collections_dir(output_root);
    for deletion in &work_plan.deletions {
        if let Ok(rest) = deletion.strip_prefix(&collections)
            && let Some(slug) = rest.components().next()
        {
            touched.insert(slug.as_os_str().to_string_lossy().to_string());
        }
    }
    touched
}

fn check_output_uniqueness(plan: &BuildPlan) -> Result<(), PlanError> {
    let mut seen = HashSet::new();
    let outputs = plan
        .originals
        .iter()
        .map(|(_, dst)| dst)
        .chain(plan.invocations.iter().map(|i| &i.output));
    for output in outputs {
        if !seen.insert(output) {
            return Err(PlanError::DuplicateOutput(output.clone()));
        }
    }
    Ok(())
}

/// Execute a build plan: deletions, then original copies, then tools.
pub fn execute(plan: &BuildPlan, runner: &dyn ToolRunner) -> Result<(), PlanError> {
    for path in &plan.deletions {
        log::info!("deleting {}", path.display());
        remove_path(path)?;
    }

    for (source, stored) in &plan.originals {
        if let Some(parent) = stored.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, stored)?;
    }

    for invocation in &plan.invocations {
        log::info!("{}: {}", invocation.rule, invocation.output.display());
        if let Some(parent) = invocation.output.parent() {
            fs::create_dir_all(parent)?;
        }
        runner.run(invocation)?;
    }
    Ok(())
}

/// Remove a file or directory subtree; an already-absent path is fine.
fn remove_path(path: &Path) -> io::Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::{inspect, media_subtree};
    use crate::resolve::resolve;
    use crate::scan::scan;
    use crate::test_helpers::{test_config, write_media};
    use crate::tools::tests::RecordingRunner;
    use crate::tools::{RULE_ARCHIVE, RULE_SYNC_ASSETS, RULE_THUMBNAIL, RULE_TRANSCODE_WEBM};
    use tempfile::TempDir;

    fn emit_fixture(config: &Config) -> (Gallery, BuildPlan) {
        let gallery = scan(config).unwrap();
        let state = inspect(&config.gallery.output_directory, &gallery).unwrap();
        let work = resolve(&gallery, &state, &config.gallery.output_directory, config).unwrap();
        let plan = emit(&gallery, &work, config).unwrap();
        (gallery, plan)
    }

    #[test]
    fn photo_yields_original_and_all_sizes() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_media(&config, "Alps", "p1.jpg", b"photo");

        let (_, plan) = emit_fixture(&config);
        let subtree = media_subtree(&config.gallery.output_directory, "alps", "p1");
        assert_eq!(plan.originals, vec![(
            config.gallery.input_directory.join("Alps").join("p1.jpg"),
            subtree.join(ORIGINAL_FILENAME),
        )]);

        let thumb_outputs: Vec<&PathBuf> = plan
            .invocations
            .iter()
            .filter(|i| i.rule == RULE_THUMBNAIL)
            .map(|i| &i.output)
            .collect();
        assert_eq!(thumb_outputs.len(), config.media.thumbnail_sizes.len());
        assert!(thumb_outputs.contains(&&subtree.join("320px.jpg")));
        assert!(thumb_outputs.contains(&&subtree.join("1920px.jpg")));
    }

    #[test]
    fn video_yields_one_transcode_per_codec() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_media(&config, "B", "v1.mov", b"video");

        let (_, plan) = emit_fixture(&config);
        let subtree = media_subtree(&config.gallery.output_directory, "b", "v1");
        let outputs: Vec<&PathBuf> = plan
            .invocations
            .iter()
            .filter(|i| i.rule.starts_with("transcode"))
            .map(|i| &i.output)
            .collect();
        assert_eq!(
            outputs,
            vec![&subtree.join("video.webm"), &subtree.join("video.mp4")]
        );
    }

    #[test]
    fn assets_sync_always_scheduled() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        std::fs::create_dir_all(&config.gallery.input_directory).unwrap();

        let (_, plan) = emit_fixture(&config);
        assert!(plan.invocations.iter().any(|i| i.rule == RULE_SYNC_ASSETS));
    }

    #[test]
    fn missing_resources_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.gallery.resources_directory = tmp.path().join("nonexistent");
        write_media(&config, "Alps", "p1.jpg", b"photo");

        let gallery = scan(&config).unwrap();
        let state = inspect(&config.gallery.output_directory, &gallery).unwrap();
        let work = resolve(&gallery, &state, &config.gallery.output_directory, &config).unwrap();
        let result = emit(&gallery, &work, &config);
        assert!(matches!(result, Err(PlanError::ResourcesNotFound(_))));
    }

    #[test]
    fn colliding_collection_slugs_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_media(&config, "Alps!", "p1.jpg", b"a");
        write_media(&config, "Alps?", "p1.jpg", b"b");

        let gallery = scan(&config).unwrap();
        let state = inspect(&config.gallery.output_directory, &gallery).unwrap();
        let work = resolve(&gallery, &state, &config.gallery.output_directory, &config).unwrap();
        let result = emit(&gallery, &work, &config);
        assert!(matches!(result, Err(PlanError::DuplicateOutput(_))));
    }

    // =========================================================================
    // Archives
    // =========================================================================

    #[test]
    fn archive_scheduled_when_missing() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_media(&config, "Alps", "p1.jpg", b"photo");

        let (_, plan) = emit_fixture(&config);
        let archives: Vec<&ToolInvocation> = plan
            .invocations
            .iter()
            .filter(|i| i.rule == RULE_ARCHIVE)
            .collect();
        assert_eq!(archives.len(), 1);
        assert_eq!(
            archives[0].output,
            inspect::archive_path(&config.gallery.output_directory, "alps")
        );
    }

    #[test]
    fn archive_skipped_when_present_and_untouched() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_media(&config, "Alps", "p1.jpg", b"photo");

        // Bring the collection fully up to date.
        let gallery = scan(&config).unwrap();
        let state = inspect(&config.gallery.output_directory, &gallery).unwrap();
        let work = resolve(&gallery, &state, &config.gallery.output_directory, &config).unwrap();
        let plan = emit(&gallery, &work, &config).unwrap();
        execute(&plan, &RecordingRunner::new()).unwrap();

        let (_, second) = emit_fixture(&config);
        assert!(second.invocations.iter().all(|i| i.rule != RULE_ARCHIVE));
    }

    #[test]
    fn archive_rebuilt_when_collection_touched() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_media(&config, "Alps", "p1.jpg", b"photo v1");

        let (gallery, plan) = emit_fixture(&config);
        execute(&plan, &RecordingRunner::new()).unwrap();
        drop(gallery);

        write_media(&config, "Alps", "p1.jpg", b"photo v2");
        let (_, second) = emit_fixture(&config);
        assert!(second.invocations.iter().any(|i| i.rule == RULE_ARCHIVE));
    }

    #[test]
    fn archive_disabled_by_config() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.gallery.downloadable_archives = false;
        write_media(&config, "Alps", "p1.jpg", b"photo");

        let (_, plan) = emit_fixture(&config);
        assert!(plan.invocations.iter().all(|i| i.rule != RULE_ARCHIVE));
    }

    #[test]
    fn archive_excludes_reserved_files() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_media(&config, "Alps", "p1.jpg", b"photo");
        write_media(&config, "Alps", "metadata.toml", b"[collection]\n");
        write_media(&config, "Alps", "notes.txt", b"zipped but not media");

        let (_, plan) = emit_fixture(&config);
        let archive = plan
            .invocations
            .iter()
            .find(|i| i.rule == RULE_ARCHIVE)
            .unwrap();
        let names: Vec<String> = archive
            .inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names.contains(&"p1.jpg".to_string()));
        assert!(names.contains(&"notes.txt".to_string()));
        assert!(!names.contains(&"metadata.toml".to_string()));
    }

    // =========================================================================
    // Execution
    // =========================================================================

    #[test]
    fn execute_deletes_before_regenerating() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_media(&config, "Alps", "p1.jpg", b"new bytes");

        // Pre-seed a stale subtree with a leftover derived file.
        let subtree = media_subtree(&config.gallery.output_directory, "alps", "p1");
        std::fs::create_dir_all(&subtree).unwrap();
        std::fs::write(subtree.join(ORIGINAL_FILENAME), b"old bytes").unwrap();
        std::fs::write(subtree.join("stale-640px.jpg"), b"stale").unwrap();

        let (_, plan) = emit_fixture(&config);
        execute(&plan, &RecordingRunner::new()).unwrap();

        assert!(!subtree.join("stale-640px.jpg").exists());
        assert_eq!(
            std::fs::read(subtree.join(ORIGINAL_FILENAME)).unwrap(),
            b"new bytes"
        );
        assert!(subtree.join("320px.jpg").exists());
    }

    #[test]
    fn execute_aborts_on_tool_failure() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_media(&config, "B", "v1.mov", b"video");

        let (_, plan) = emit_fixture(&config);
        let runner = RecordingRunner::failing(RULE_TRANSCODE_WEBM);
        let err = execute(&plan, &runner).unwrap_err();
        assert!(matches!(err, PlanError::Tool(_)));

        // Nothing past the failing invocation ran.
        let rules = runner.rules();
        assert_eq!(rules.last(), Some(&RULE_TRANSCODE_WEBM));
    }

    #[test]
    fn execute_tolerates_already_absent_deletions() {
        let tmp = TempDir::new().unwrap();
        let plan = BuildPlan {
            deletions: vec![tmp.path().join("never-existed")],
            ..BuildPlan::default()
        };
        execute(&plan, &RecordingRunner::new()).unwrap();
    }
}
