mod commands;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sopqa_core::config::MAX_TOP_K;
use sopqa_core::{AppBuilder, resolve_config_path};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "sopqa", version, about = "Question answering over Standard Operating Procedures")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chunk, embed and upload every SOP in a directory.
    Ingest {
        dir: PathBuf,
        /// Delete the index before loading. Without it, records left over
        /// from a longer earlier version of a file stay in the index.
        #[arg(long)]
        recreate: bool,
    },
    /// Index management.
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Show configured services and the index document count.
    Status,
    /// Answer a single question and exit.
    Ask {
        question: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=MAX_TOP_K as i64))]
        top_k: Option<u8>,
        /// Print cited sources and retrieved excerpts.
        #[arg(long)]
        show_sources: bool,
    },
    /// Interactive question prompt (default).
    Shell,
}

#[derive(Debug, Subcommand)]
enum IndexAction {
    /// Create or replace the search index.
    Create {
        /// Vector size; defaults to `embedding.dimensions`.
        #[arg(long)]
        dimensions: Option<usize>,
    },
    /// Delete the search index. Failures are logged, not fatal.
    Delete,
}

fn init_subscriber(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_subscriber(&cli.log_level);

    let config_path = resolve_config_path(cli.config.as_deref());
    let app = AppBuilder::load(config_path)?;
    tracing::debug!("loaded config from {}", app.config_path().display());

    match cli.command.unwrap_or(Command::Shell) {
        Command::Ingest { dir, recreate } => commands::ingest(&app, &dir, recreate).await,
        Command::Index {
            action: IndexAction::Create { dimensions },
        } => commands::create_index(&app, dimensions).await,
        Command::Index {
            action: IndexAction::Delete,
        } => commands::delete_index(&app).await,
        Command::Status => commands::status(&app).await,
        Command::Ask {
            question,
            top_k,
            show_sources,
        } => commands::ask(&app, &question, top_k.map(usize::from), show_sources).await,
        Command::Shell => shell::run(app).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("sopqa").chain(args.iter().copied()))
    }

    #[test]
    fn no_subcommand_means_shell() {
        let cli = parse(&[]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn ingest_with_recreate() {
        let cli = parse(&["ingest", "data/sops", "--recreate"]).unwrap();
        match cli.command {
            Some(Command::Ingest { dir, recreate }) => {
                assert_eq!(dir, PathBuf::from("data/sops"));
                assert!(recreate);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ask_accepts_top_k_within_bounds() {
        let cli = parse(&["ask", "Who signs the audit?", "--top-k", "5", "--show-sources"]).unwrap();
        match cli.command {
            Some(Command::Ask {
                question,
                top_k,
                show_sources,
            }) => {
                assert_eq!(question, "Who signs the audit?");
                assert_eq!(top_k, Some(5));
                assert!(show_sources);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ask_rejects_top_k_out_of_bounds() {
        assert!(parse(&["ask", "q", "--top-k", "0"]).is_err());
        assert!(parse(&["ask", "q", "--top-k", "6"]).is_err());
    }

    #[test]
    fn index_create_dimensions() {
        let cli = parse(&["index", "create", "--dimensions", "3072"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Index {
                action: IndexAction::Create {
                    dimensions: Some(3072)
                }
            })
        ));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["status", "--config", "/etc/sopqa.toml", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/sopqa.toml")));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
