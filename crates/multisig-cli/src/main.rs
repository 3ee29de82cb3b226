//! `multisig` - quorum-signed log replication from the command line

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use multisig_cli::commands::common::{Context, RequestOutput};
use multisig_cli::commands::{keygen, log, sign, single, tree};
use multisig_cli::config::{CliConfig, DEFAULT_CONFIG_PATH, DEFAULT_STORAGE_PATH};
use multisig_log::FileStore;
use multisig_protocol::Tally;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "multisig")]
#[command(about = "Replicate append-only logs under M-of-N signer approval", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Storage directory for local logs
    #[arg(short, long, global = true, default_value = DEFAULT_STORAGE_PATH)]
    storage: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a signer seed
    Keygen {
        /// Write the seed to this file instead of printing it
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Manage local source logs
    Log {
        #[command(subcommand)]
        command: LogCommand,
    },

    /// Build a signing request for the source log
    RequestCore {
        /// Target length
        length: u64,

        /// Wait for the source to reach a length it does not have yet
        #[arg(long)]
        force: bool,

        /// Source wait bound in milliseconds
        #[arg(long)]
        peer_update_timeout: Option<u64>,
    },

    /// Check responses and show what a commit would apply
    VerifyCore {
        /// Request token
        request: String,

        /// Response tokens
        responses: Vec<String>,

        /// Source wait bound in milliseconds
        #[arg(long)]
        peer_update_timeout: Option<u64>,
    },

    /// Commit a signed request to the destination log
    CommitCore {
        /// Request token
        request: String,

        /// Response tokens
        #[arg(required = true)]
        responses: Vec<String>,

        /// Allow committing into an empty destination
        #[arg(long)]
        first_commit: bool,

        /// Commit even if the source no longer matches what was signed
        #[arg(long)]
        force_dangerous: bool,

        /// Source wait bound in milliseconds
        #[arg(long)]
        peer_update_timeout: Option<u64>,
    },

    /// Build a signing request for the source drive
    RequestDrive {
        /// Target metadata length
        length: u64,

        /// Target content length (defaults to the current content length)
        #[arg(long)]
        content_length: Option<u64>,

        /// Wait for the source to reach lengths it does not have yet
        #[arg(long)]
        force: bool,

        /// Source wait bound in milliseconds
        #[arg(long)]
        peer_update_timeout: Option<u64>,
    },

    /// Check responses and show what a drive commit would apply
    VerifyDrive {
        /// Request token
        request: String,

        /// Response tokens
        responses: Vec<String>,

        /// Source wait bound in milliseconds
        #[arg(long)]
        peer_update_timeout: Option<u64>,
    },

    /// Commit a signed request to the destination drive
    CommitDrive {
        /// Request token
        request: String,

        /// Response tokens
        #[arg(required = true)]
        responses: Vec<String>,

        /// Allow committing into an empty destination
        #[arg(long)]
        first_commit: bool,

        /// Commit even if the source no longer matches what was signed
        #[arg(long)]
        force_dangerous: bool,

        /// Source wait bound in milliseconds
        #[arg(long)]
        peer_update_timeout: Option<u64>,
    },

    /// Answer a request with a signer seed
    Sign {
        /// Request token
        request: String,

        /// File holding the signer seed
        #[arg(long)]
        key: PathBuf,
    },
}

#[derive(Subcommand)]
enum LogCommand {
    /// Create an empty log
    Create,

    /// Append text entries
    Append {
        /// Log identity (hex)
        id: String,

        /// Entries to append
        #[arg(required = true)]
        entries: Vec<String>,

        /// Address the tree's content log instead
        #[arg(long)]
        content: bool,
    },

    /// Print a log's state and entries
    Show {
        /// Log identity (hex)
        id: String,

        /// Address the tree's content log instead
        #[arg(long)]
        content: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Keygen { out } => {
            print_json(&keygen::run(out.as_deref())?)?;
        }
        Commands::Log { command } => {
            let store = FileStore::open(&cli.storage)
                .await
                .with_context(|| format!("opening storage {}", cli.storage.display()))?;
            match command {
                LogCommand::Create => print_json(&log::create(&store).await?)?,
                LogCommand::Append {
                    id,
                    entries,
                    content,
                } => print_json(&log::append(&store, &id, &entries, content).await?)?,
                LogCommand::Show { id, content } => {
                    print_json(&log::show(&store, &id, content).await?)?
                }
            }
        }
        Commands::RequestCore {
            length,
            force,
            peer_update_timeout,
        } => {
            let ctx = Context::open(&cli.config, &cli.storage, peer_update_timeout).await?;
            print_request(&single::request(&ctx, length, force).await?)?;
        }
        Commands::VerifyCore {
            request,
            responses,
            peer_update_timeout,
        } => {
            let ctx = Context::open(&cli.config, &cli.storage, peer_update_timeout).await?;
            let review = single::verify(&ctx, &request, &responses).await?;
            print_review(&review.quorum, review.forced, &review)?;
        }
        Commands::CommitCore {
            request,
            responses,
            first_commit,
            force_dangerous,
            peer_update_timeout,
        } => {
            let ctx = Context::open(&cli.config, &cli.storage, peer_update_timeout).await?;
            let result =
                single::commit(&ctx, &request, &responses, first_commit, force_dangerous).await?;
            print_commit("Core", result.forced, &result.identity.to_hex(), &result)?;
        }
        Commands::RequestDrive {
            length,
            content_length,
            force,
            peer_update_timeout,
        } => {
            let ctx = Context::open(&cli.config, &cli.storage, peer_update_timeout).await?;
            print_request(&tree::request(&ctx, length, content_length, force).await?)?;
        }
        Commands::VerifyDrive {
            request,
            responses,
            peer_update_timeout,
        } => {
            let ctx = Context::open(&cli.config, &cli.storage, peer_update_timeout).await?;
            let review = tree::verify(&ctx, &request, &responses).await?;
            print_review(&review.quorum, review.forced, &review)?;
        }
        Commands::CommitDrive {
            request,
            responses,
            first_commit,
            force_dangerous,
            peer_update_timeout,
        } => {
            let ctx = Context::open(&cli.config, &cli.storage, peer_update_timeout).await?;
            let result =
                tree::commit(&ctx, &request, &responses, first_commit, force_dangerous).await?;
            print_commit("Drive", result.forced, &result.identity.to_hex(), &result)?;
        }
        Commands::Sign { request, key } => {
            let config = CliConfig::load(&cli.config)?;
            println!("{}", sign::run(&config, &request, &key)?);
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_request(output: &RequestOutput) -> anyhow::Result<()> {
    print_json(output)?;
    println!();
    println!("{}", output.token);
    Ok(())
}

fn print_review<T: Serialize>(quorum: &Tally, forced: bool, review: &T) -> anyhow::Result<()> {
    println!("Quorum {} / {}", quorum.valid, quorum.required);
    if forced {
        println!("WARNING: review used --force-dangerous");
    }
    print_json(review)
}

fn print_commit<T: Serialize>(
    kind: &str,
    forced: bool,
    key: &str,
    result: &T,
) -> anyhow::Result<()> {
    if forced {
        println!("WARNING: commit used --force-dangerous");
    }
    print_json(result)?;
    println!("{kind} key: {key}");
    Ok(())
}
