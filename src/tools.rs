//! External tool invocation.
//!
//! All CPU-heavy work — thumbnailing, transcoding, assets sync, archiving —
//! is delegated to external processes with fixed argument contracts:
//!
//! - `vipsthumbnail` for photo size variants
//! - `ffmpeg` for webm/mp4 transcodes
//! - `rsync` for mirroring the static assets tree
//! - `zip` for per-collection download archives
//!
//! An invocation is a value object ([`ToolInvocation`]) carrying the rule
//! name, argv, declared inputs, and the one output path it writes. The plan
//! emitter builds invocations; execution goes through the [`ToolRunner`]
//! capability so tests can substitute an in-process fake that records what
//! would have run and materializes the declared outputs.
//!
//! Tool failure policy: any nonzero exit aborts the whole run. A gallery
//! with silently missing assets is worse than no gallery, so there is no
//! partial-success mode.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

pub const RULE_THUMBNAIL: &str = "thumbnail";
pub const RULE_TRANSCODE_WEBM: &str = "transcode-webm";
pub const RULE_TRANSCODE_MP4: &str = "transcode-mp4";
pub const RULE_SYNC_ASSETS: &str = "sync-assets";
pub const RULE_ARCHIVE: &str = "archive";

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to start {program}: {source} (is it installed?)")]
    Spawn {
        program: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {code:?}: {stderr}")]
    Failed {
        program: &'static str,
        code: Option<i32>,
        stderr: String,
    },
}

/// One external tool call: rule, argv, and the single output it writes.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Which contract this call follows (one of the `RULE_*` constants).
    pub rule: &'static str,
    pub program: &'static str,
    pub args: Vec<OsString>,
    /// Source files this call reads, for reporting.
    pub inputs: Vec<PathBuf>,
    /// The path this call produces. Unique across a whole build plan.
    pub output: PathBuf,
}

/// Capability to execute external tools; injected into plan execution.
pub trait ToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<(), ToolError>;
}

/// Production runner: spawns the real processes.
#[derive(Debug, Default)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<(), ToolError> {
        log::debug!(
            "running {} {}",
            invocation.program,
            invocation
                .args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(" ")
        );
        let output = Command::new(invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|source| ToolError::Spawn {
                program: invocation.program,
                source,
            })?;
        if !output.status.success() {
            return Err(ToolError::Failed {
                program: invocation.program,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Invocation constructors — the fixed CLI contracts
// =============================================================================

/// `vipsthumbnail --size x<N> [--eprofile <icc> --delete] -o <out>[…] <in>`
pub fn thumbnail(
    input: &Path,
    output: &Path,
    size: u32,
    icc_profile: Option<&Path>,
) -> ToolInvocation {
    let mut args: Vec<OsString> = vec!["--size".into(), format!("x{size}").into()];
    if let Some(icc) = icc_profile {
        args.push("--eprofile".into());
        args.push(icc.into());
        args.push("--delete".into());
    }
    args.push("-o".into());
    let mut out_arg = output.as_os_str().to_os_string();
    out_arg.push("[optimize_coding,strip]");
    args.push(out_arg);
    args.push(input.into());

    ToolInvocation {
        rule: RULE_THUMBNAIL,
        program: "vipsthumbnail",
        args,
        inputs: vec![input.to_path_buf()],
        output: output.to_path_buf(),
    }
}

/// `ffmpeg -i <in> -c:v libvpx … -c:a libvorbis … <out>`
pub fn transcode_webm(input: &Path, output: &Path) -> ToolInvocation {
    let mut args: Vec<OsString> = vec!["-i".into(), input.into()];
    args.extend(
        [
            "-c:v", "libvpx", "-b:v", "2M", "-crf", "10", "-qmin", "0", "-qmax", "50", "-c:a",
            "libvorbis", "-q:a", "4", "-y", "-threads", "0",
        ]
        .map(OsString::from),
    );
    args.push(output.into());

    ToolInvocation {
        rule: RULE_TRANSCODE_WEBM,
        program: "ffmpeg",
        args,
        inputs: vec![input.to_path_buf()],
        output: output.to_path_buf(),
    }
}

/// `ffmpeg -i <in> -c:v libx264 … -c:a libfdk_aac … <out>`
pub fn transcode_mp4(input: &Path, output: &Path) -> ToolInvocation {
    let mut args: Vec<OsString> = vec!["-i".into(), input.into()];
    args.extend(
        [
            "-c:v", "libx264", "-crf", "18", "-preset:v", "fast", "-c:a", "libfdk_aac", "-vbr",
            "4", "-movflags", "+faststart", "-y", "-threads", "0",
        ]
        .map(OsString::from),
    );
    args.push(output.into());

    ToolInvocation {
        rule: RULE_TRANSCODE_MP4,
        program: "ffmpeg",
        args,
        inputs: vec![input.to_path_buf()],
        output: output.to_path_buf(),
    }
}

/// `rsync -a --delete <src>/ <dst>` — mirrors a tree, pruning extras.
pub fn sync_assets(source_dir: &Path, dest_dir: &Path) -> ToolInvocation {
    let mut src_arg = source_dir.as_os_str().to_os_string();
    src_arg.push("/");
    ToolInvocation {
        rule: RULE_SYNC_ASSETS,
        program: "rsync",
        args: vec!["-a".into(), "--delete".into(), src_arg, dest_dir.into()],
        inputs: vec![source_dir.to_path_buf()],
        output: dest_dir.to_path_buf(),
    }
}

/// `zip -j <out> <files…>` — flat archive of a collection's originals.
pub fn archive(output: &Path, files: &[PathBuf]) -> ToolInvocation {
    let mut args: Vec<OsString> = vec!["-j".into(), output.into()];
    args.extend(files.iter().map(|f| f.as_os_str().to_os_string()));
    ToolInvocation {
        rule: RULE_ARCHIVE,
        program: "zip",
        args,
        inputs: files.to_vec(),
        output: output.to_path_buf(),
    }
}
