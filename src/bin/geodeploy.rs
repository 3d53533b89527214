//! geodeploy CLI
//!
//! Manage map viewer versions in the S3 bucket: list what is deployed,
//! upload a staged build, switch the live version, delete retired ones.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use geodeploy::registry::Version;
use geodeploy::{layout, marker, DeployConfig, Lifecycle, Registry, ReleaseError, S3Store};

#[derive(Parser, Debug)]
#[command(name = "geodeploy", version, about = "Manage map viewer versions in the S3 bucket")]
struct Cli {
    /// Path to a geodeploy.toml config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bucket name override
    #[arg(short, long)]
    bucket: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List available versions in the bucket
    List,
    /// Upload a staged build; the version is read from the staged index document
    Upload {
        /// Staged artifact root (defaults to the current directory)
        dir: Option<PathBuf>,
    },
    /// Make the given version live by copying its pointer documents to the root
    Activate { version: Version },
    /// Delete the given version, its directory and its pointer documents
    Delete { version: Version },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("geodeploy=info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            exit_code_for(&err)
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ReleaseError>() {
        Some(ReleaseError::VersionNotFound(_)) | Some(ReleaseError::KeyNotFound(_)) => {
            ExitCode::from(2)
        }
        _ => ExitCode::FAILURE,
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = DeployConfig::load(cli.config.as_deref())?;
    if let Some(bucket) = cli.bucket {
        config.bucket = bucket;
    }

    let store = S3Store::connect(&config)
        .with_context(|| format!("connecting to bucket '{}'", config.bucket))?;

    match cli.command {
        Commands::List => list(&store),
        Commands::Upload { dir } => upload(&store, &config, dir, cli.yes),
        Commands::Activate { version } => activate(&store, &config, version),
        Commands::Delete { version } => delete(&store, &config, version, cli.yes),
    }
}

fn confirm(prompt: &str, assume_yes: bool) -> anyhow::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim() == "y")
}

fn list(store: &S3Store) -> anyhow::Result<ExitCode> {
    let registry = Registry::new(store);
    let active = registry.active_version()?;

    for entry in registry.list_versions()? {
        let marker = if entry.version == active { "active" } else { "" };
        println!(
            "{} {} {}",
            entry.version,
            entry.last_modified.to_rfc3339(),
            marker
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn upload(
    store: &S3Store,
    config: &DeployConfig,
    dir: Option<PathBuf>,
    assume_yes: bool,
) -> anyhow::Result<ExitCode> {
    let root = match dir {
        Some(dir) => dir.canonicalize()?,
        None => std::env::current_dir()?,
    };

    let staged_index = root.join(layout::STAGING_DIR).join("index.html");
    let text = std::fs::read_to_string(&staged_index)
        .with_context(|| format!("reading staged index {}", staged_index.display()))?;
    let version = marker::extract_version(&text)
        .ok_or_else(|| ReleaseError::MarkerNotFound(staged_index.display().to_string()))?;

    let registry = Registry::new(store);
    let active = registry.active_version()?;

    let prompt = if version == active {
        format!(
            "WARNING: version {} is the active one!\nDo you really want to upload it from '{}'?",
            version,
            root.display()
        )
    } else if registry.version_exists(version)? {
        format!(
            "Version '{}' already exists in the bucket. Do you really want to overwrite it with files from '{}'?",
            version,
            root.display()
        )
    } else {
        format!(
            "Do you want to upload version '{}' from '{}'?",
            version,
            root.display()
        )
    };

    if !confirm(&prompt, assume_yes)? {
        println!("Aborting");
        return Ok(ExitCode::SUCCESS);
    }

    let report = Lifecycle::new(store).upload(version, &root, &config.languages)?;

    println!(
        "Upload finished: {} objects uploaded, {} failed",
        report.uploaded(),
        report.failed()
    );
    for failure in report.failures() {
        if let Err(cause) = &failure.result {
            println!("  failed: {} ({})", failure.key, cause);
        }
    }

    println!();
    println!(
        "Please check it on {}",
        config.object_url(&layout::pointer_key("index", version))
    );
    println!(
        "and {}",
        config.object_url(&format!("{}/src/index.html", version))
    );
    Ok(ExitCode::SUCCESS)
}

fn activate(store: &S3Store, config: &DeployConfig, version: Version) -> anyhow::Result<ExitCode> {
    println!("Trying to activate version '{}'", version);

    match Lifecycle::new(store).activate(version)? {
        geodeploy::Activation::AlreadyActive => {
            println!(
                "Version '{}' is already the active version. Doing nothing",
                version
            );
        }
        geodeploy::Activation::Switched { copied } => {
            println!("Version '{}' is now active ({} objects copied)", version, copied);
            println!();
            println!("Please check it on {}", config.object_url(layout::ROOT_INDEX));
            println!("  and {}", config.object_url("src/index.html"));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn delete(
    store: &S3Store,
    config: &DeployConfig,
    version: Version,
    assume_yes: bool,
) -> anyhow::Result<ExitCode> {
    println!("Trying to delete version '{}'", version);

    // Fail the preconditions before prompting; the engine re-checks them
    // before mutating.
    let registry = Registry::new(store);
    if !registry.version_exists(version)? {
        return Err(ReleaseError::VersionNotFound(version).into());
    }
    if registry.active_version()? == version {
        return Err(ReleaseError::ActiveVersion(version).into());
    }

    let prompt = format!(
        "Do you really want to delete version '{}' from bucket '{}'?",
        version, config.bucket
    );
    if !confirm(&prompt, assume_yes)? {
        println!("Aborting");
        return Ok(ExitCode::SUCCESS);
    }

    let deleted = Lifecycle::new(store).delete(version)?;
    for key in &deleted {
        println!("{}", key);
    }
    println!("{} objects deleted", deleted.len());
    Ok(ExitCode::SUCCESS)
}
