use clap::Parser;
use gallerize::tools::SystemToolRunner;
use gallerize::{config, pipeline};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gallerize")]
#[command(version)]
#[command(about = "Incremental static site generator for photo and video galleries")]
#[command(long_about = "\
Incremental static site generator for photo and video galleries

Your filesystem is the data source. Each top-level directory of the input
tree is a collection, rendered as one gallery page:

  gallery/
  ├── Alps 2019/                   # Collection
  │   ├── metadata.toml            # Optional title / uri_title overrides
  │   ├── IMG-1.jpg                # Photo → thumbnails at all configured sizes
  │   └── summit.mov               # Video → one transcode per codec
  └── Street/
      └── crossing.png

Builds are incremental: only media whose bytes changed since the last run
are reprocessed, and outputs whose sources vanished are deleted.

Requires vipsthumbnail, ffmpeg, rsync and zip on PATH.

Run 'gallerize --init' once to scaffold a config file and default resources.")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Write a default config.toml and resources bundle, then exit.
    /// Never overwrites existing files.
    #[arg(long)]
    init: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.init {
        init_logger("info");
        config::init(&cli.config)?;
        return Ok(());
    }

    let config = config::load(&cli.config)?;
    init_logger(&config.gallery.log_level);
    log::info!("using config from {}", cli.config.display());

    let summary = pipeline::run(&config, &SystemToolRunner)?;
    log::info!("{summary}");
    println!("{summary}");
    Ok(())
}

/// Configure logging from the config's level; RUST_LOG still wins when set.
fn init_logger(level: &str) {
    env_logger::Builder::new()
        .parse_filters(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}
