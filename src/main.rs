use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use depscan::{Config, Downloader, LocalDownloader, ScanCommand, Scanner};
use futures::future::join_all;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "depscan")]
#[command(
    author,
    version,
    about = "Run a cached SCA scanner CLI against dependency manifests"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one or more dependency manifests
    Scan {
        /// Manifest files to scan (e.g. requirements.txt, package.json)
        #[arg(required = true)]
        manifests: Vec<PathBuf>,

        /// Local path to a scanner binary, copied into the cache when the
        /// managed binary is missing or stale
        #[arg(short, long)]
        tool: Option<PathBuf>,

        /// Write the aggregated JSON report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report whether the managed scanner binary needs (re-)downloading
    Check,

    /// Remove the cached scanner binary
    Cleanup,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default().with_env_override();

    match cli.command {
        Commands::Scan {
            manifests,
            tool,
            output,
        } => run_scans(&config, manifests, tool, output).await,
        Commands::Check => {
            let scanner = Scanner::new(&config.tool_path, config.expiration());
            if scanner.should_download() {
                println!(
                    "{}: missing or older than {}s, download needed",
                    config.tool_path.display(),
                    config.expiration_secs
                );
            } else {
                println!("{}: fresh", config.tool_path.display());
            }
            Ok(())
        }
        Commands::Cleanup => {
            let scanner = Scanner::new(&config.tool_path, config.expiration());
            scanner.cleanup()?;
            println!("Removed {}", config.tool_path.display());
            Ok(())
        }
        Commands::Config { init, path } => {
            if init {
                Config::default().save()?;
                println!("Wrote {}", Config::config_path().display());
            } else if path {
                println!("{}", Config::config_path().display());
            } else {
                print!("{}", Config::generate_default_config());
            }
            Ok(())
        }
    }
}

async fn run_scans(
    config: &Config,
    manifests: Vec<PathBuf>,
    tool: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let scanner = Scanner::new(&config.tool_path, config.expiration());

    if scanner.should_download() {
        match tool {
            Some(source) => {
                info!(target_path = %config.tool_path.display(), "acquiring scanner binary");
                LocalDownloader::new(source)
                    .download(scanner.binary_path())
                    .await?;
            }
            None => bail!(
                "scanner binary at {} is missing or stale; pass --tool to provide one",
                config.tool_path.display()
            ),
        }
    }

    let command = ScanCommand::args(
        &config.tool_path,
        vec!["coderepo".to_string(), "scan".to_string()],
    );

    let work_dir = std::env::temp_dir().join(format!("depscan-{}", std::process::id()));
    std::fs::create_dir_all(&work_dir)
        .with_context(|| format!("failed to create {}", work_dir.display()))?;

    // One scan per manifest, each with its own output file, all in flight
    // at once. The index keeps output paths distinct when two manifests
    // share a file stem.
    let scans = manifests.iter().enumerate().map(|(i, manifest)| {
        let stem = manifest
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "manifest".to_string());
        let output_path = work_dir.join(format!("{}_{}_result.json", i, stem));
        let command = command.clone();
        let scanner = &scanner;
        async move {
            let result = scanner.run_scan(&command, manifest, &output_path).await;
            (manifest.display().to_string(), result)
        }
    });

    let results = join_all(scans).await;
    let _ = std::fs::remove_dir(&work_dir);

    let failed: Vec<&str> = results
        .iter()
        .filter(|(_, r)| r.is_empty())
        .map(|(m, _)| m.as_str())
        .collect();

    let report: serde_json::Value = results
        .iter()
        .map(|(m, r)| (m.clone(), serde_json::Value::Object(r.clone())))
        .collect::<serde_json::Map<String, serde_json::Value>>()
        .into();

    let rendered = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => std::fs::write(&path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", rendered),
    }

    if !failed.is_empty() {
        bail!("no usable result for: {}", failed.join(", "));
    }
    Ok(())
}
