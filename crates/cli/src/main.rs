use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use intake_git::{GitDirClassifier, RepoClassification, RepoClassifier, TrustFile, TrustStore};
use intake_validation::{
    RepositoryHandle, RepositoryRegistry, ValidationController, ValidationSnapshot,
    ValidationState,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

mod config;

const RESOLUTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "repo-intake")]
#[command(about = "Validate and trust local repositories before adding them", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Trust store file (overrides REPO_INTAKE_TRUST_FILE and the config file)
    #[arg(long, global = true)]
    trust_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a path without adding it
    Check(CheckArgs),
    /// Validate a path and register it when usable
    Add(AddArgs),
    /// Mark a path as trusted for future validation
    Trust(TrustArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Path to inspect
    path: String,

    /// Emit JSON instead of human-readable output
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AddArgs {
    /// Path to validate and add
    path: String,

    /// Trust an unsafe repository and retry validation
    #[arg(long)]
    trust: bool,

    /// Emit JSON instead of human-readable output
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TrustArgs {
    /// Path to trust
    path: String,
}

/// Registry for the CLI flow: mints a handle for the validated root
/// without persisting anything.
struct HandleRegistry;

#[async_trait::async_trait]
impl RepositoryRegistry for HandleRegistry {
    async fn register(&self, path: &Path) -> intake_validation::Result<RepositoryHandle> {
        Ok(RepositoryHandle {
            path: path.to_path_buf(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Check(args) => args.json,
        Commands::Add(args) => args.json,
        Commands::Trust(_) => false,
    };

    // Logging to stderr only; stdout carries command output.
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet || json_output {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = config::load(cli.trust_file.clone())?;
    let trust: Arc<dyn TrustStore> = Arc::new(TrustFile::new(config.trust_file));
    let classifier: Arc<dyn RepoClassifier> = Arc::new(GitDirClassifier::new(trust.clone()));

    match cli.command {
        Commands::Check(args) => run_check(args, classifier).await,
        Commands::Add(args) => run_add(args, classifier, trust).await,
        Commands::Trust(args) => run_trust(args, trust).await,
    }
}

async fn run_check(args: CheckArgs, classifier: Arc<dyn RepoClassifier>) -> Result<()> {
    let path = intake_paths::normalize(&args.path);
    let classification = classifier.classify(&path).await;

    if args.json {
        let payload = serde_json::json!({
            "path": path,
            "classification": classification,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{}", describe(&path, &classification));
    }

    if !classification.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_add(
    args: AddArgs,
    classifier: Arc<dyn RepoClassifier>,
    trust: Arc<dyn TrustStore>,
) -> Result<()> {
    let controller = ValidationController::spawn(classifier, trust, Arc::new(HandleRegistry));
    let mut stream = controller.snapshot_stream();

    controller.set_path(args.path.as_str()).await?;
    let mut snapshot = await_resolution(&mut stream, false).await?;

    if matches!(
        snapshot.state,
        ValidationState::Classified(RepoClassification::Unsafe { .. })
    ) && args.trust
    {
        log::info!("Trusting {} and re-validating", snapshot.path);
        controller.request_trust().await?;
        snapshot = await_resolution(&mut stream, true).await?;
    }

    match &snapshot.state {
        ValidationState::Classified(RepoClassification::Valid) => {
            let handle = controller.submit().await?;
            if args.json {
                let payload = serde_json::json!({
                    "added": true,
                    "path": handle.path,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Added repository {}", handle.path.display());
            }
            Ok(())
        }
        ValidationState::Classified(other) => {
            if args.json {
                let payload = serde_json::json!({
                    "added": false,
                    "path": snapshot.path,
                    "classification": other,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
                std::process::exit(1);
            }
            bail!("{}", describe(Path::new(&snapshot.path), other));
        }
        _ => bail!("Validation did not complete for {}", snapshot.path),
    }
}

async fn run_trust(args: TrustArgs, trust: Arc<dyn TrustStore>) -> Result<()> {
    let path = intake_paths::normalize(&args.path);
    trust
        .trust(&path)
        .await
        .with_context(|| format!("Failed to trust {}", path.display()))?;
    println!("Trusted {}", path.display());
    Ok(())
}

/// Wait until the snapshot settles on a classification with no trust
/// action in flight. `skip_current` forces at least one change first, so
/// a wait issued right after `request_trust` cannot return the snapshot
/// the remediation is about to replace.
async fn await_resolution(
    stream: &mut watch::Receiver<ValidationSnapshot>,
    skip_current: bool,
) -> Result<ValidationSnapshot> {
    let wait = async {
        let mut must_change = skip_current;
        loop {
            if must_change && stream.changed().await.is_err() {
                bail!("Validation controller stopped unexpectedly");
            }
            must_change = true;
            let current = stream.borrow_and_update().clone();
            if !current.trusting && matches!(current.state, ValidationState::Classified(_)) {
                return Ok(current);
            }
        }
    };
    tokio::time::timeout(RESOLUTION_TIMEOUT, wait)
        .await
        .context("Timed out waiting for the classifier")?
}

fn describe(path: &Path, classification: &RepoClassification) -> String {
    match classification {
        RepoClassification::Missing => {
            format!("{}: no repository found", path.display())
        }
        RepoClassification::Unsafe { owner_path } => format!(
            "{}: repository at {} is owned by another user; re-run with --trust or use `repo-intake trust`",
            path.display(),
            owner_path.display()
        ),
        RepoClassification::Bare => format!(
            "{}: bare repository (no working tree) is not supported",
            path.display()
        ),
        RepoClassification::Valid => format!("{}: usable repository", path.display()),
    }
}
