use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quorum_crypto::GuardianKey;
use quorum_types::{VerificationRequest, VerificationResult};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod config;

use config::QuorumConfig;

#[derive(Parser)]
#[command(
    name = "quorum",
    about = "Guardian threshold checks for custodial deposit addresses",
    version,
    author
)]
struct Cli {
    #[arg(long, global = true, value_name = "LEVEL", help = "Log filter (trace, debug, info, warn, error)")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Verify guardian signatures over a deposit address")]
    Verify {
        #[arg(long, value_name = "FILE", help = "Guardian set configuration file")]
        config: Option<PathBuf>,

        #[arg(long, value_name = "FILE", help = "Request JSON with proposal and signatures, '-' for stdin")]
        request: PathBuf,

        #[arg(long, value_name = "MS", help = "Deadline for the whole verification")]
        timeout_ms: Option<u64>,
    },

    #[command(about = "Guardian set utilities")]
    Guardians {
        #[command(subcommand)]
        command: GuardiansCommands,
    },

    #[command(about = "Configuration management")]
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    #[command(about = "Display version information")]
    Version,
}

#[derive(Subcommand)]
enum GuardiansCommands {
    #[command(about = "Parse every configured guardian key")]
    Check {
        #[arg(long, value_name = "FILE", help = "Guardian set configuration file")]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    #[command(about = "Write a configuration template")]
    Init {
        #[arg(long, value_name = "FILE", help = "Configuration file path")]
        path: Option<PathBuf>,

        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },

    #[command(about = "Show current configuration")]
    Show {
        #[arg(long, value_name = "FILE", help = "Configuration file path")]
        config: Option<PathBuf>,
    },

    #[command(about = "Validate configuration")]
    Validate {
        #[arg(value_name = "FILE", help = "Configuration file path")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    quorum_log::init_cli_tracing(cli.log_level.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    match cli.command {
        Commands::Verify {
            config,
            request,
            timeout_ms,
        } => verify_command(config, request, timeout_ms).await,
        Commands::Guardians { command } => guardians_command(command),
        Commands::Config { command } => config_command(command),
        Commands::Version => {
            version_command();
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn verify_command(
    config: Option<PathBuf>,
    request: PathBuf,
    timeout_ms: Option<u64>,
) -> Result<ExitCode> {
    let config = load_config(config.as_deref())?;
    let request = read_request(&request)?;

    tracing::info!(
        address = %request.proposal.address,
        guardians = config.guardians.len(),
        threshold = config.threshold,
        "verifying deposit address"
    );

    let verification = quorum_consensus::verify_deposit_address(
        &config.guardians,
        config.threshold,
        config.key_policy,
        &request.signatures,
        &request.proposal,
    );

    let deadline = timeout_ms
        .map(std::time::Duration::from_millis)
        .or_else(|| config.timeout());

    let result = match deadline {
        Some(deadline) => match tokio::time::timeout(deadline, verification).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(timeout_ms = deadline.as_millis() as u64, "verification timed out");
                VerificationResult::rejected(
                    config.node_ids(),
                    vec![format!(
                        "verification timed out after {} ms",
                        deadline.as_millis()
                    )],
                )
            }
        },
        None => verification.await,
    };

    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.success {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(
            address = %request.proposal.address,
            verified_count = result.verified_count,
            "deposit address not attested, do not fund it"
        );
        Ok(ExitCode::FAILURE)
    }
}

fn guardians_command(command: GuardiansCommands) -> Result<ExitCode> {
    match command {
        GuardiansCommands::Check { config } => {
            let config = load_config(config.as_deref())?;

            println!("NODE\tSTATUS");
            for guardian in &config.guardians {
                match GuardianKey::from_hex(&guardian.public_key) {
                    Ok(_) => println!("{}\tok", guardian.node_id),
                    Err(e) => println!("{}\tinvalid: {}", guardian.node_id, e),
                }
            }

            match config.engine() {
                Ok(engine) => {
                    println!(
                        "usable: {} of {} guardians, threshold {}, policy {}",
                        engine.registry().active_count(),
                        engine.registry().len(),
                        engine.threshold(),
                        engine.registry().policy().as_str()
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("unusable: {e}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn config_command(command: ConfigCommands) -> Result<ExitCode> {
    match command {
        ConfigCommands::Init { path, force } => {
            let path = path.unwrap_or_else(QuorumConfig::default_config_file);
            if QuorumConfig::init(&path, force)? {
                tracing::info!("Created configuration: {}", path.display());
            } else {
                tracing::warn!("Configuration already exists: {}", path.display());
            }
            println!("{}", path.display());
        }
        ConfigCommands::Show { config } => {
            let path = config.unwrap_or_else(QuorumConfig::default_config_file);
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            println!("{content}");
        }
        ConfigCommands::Validate { file } => {
            let config = QuorumConfig::load_from_file(&file)
                .with_context(|| format!("loading {}", file.display()))?;
            config.engine()?;
            println!("configuration is valid");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn version_command() {
    println!("quorum {}", env!("CARGO_PKG_VERSION"));
    println!("build: {}", env!("CARGO_PKG_NAME"));
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<QuorumConfig> {
    match path {
        Some(path) => QuorumConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(QuorumConfig::load_or_default()?),
    }
}

fn read_request(path: &Path) -> Result<VerificationRequest> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };

    serde_json::from_str(&content).context("parsing verification request")
}
