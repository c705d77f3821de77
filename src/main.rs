//! # LibraAI CLI (`libra`)
//!
//! The `libra` binary runs the library assistant, either as the HTTP server
//! with its browser UI or as one-shot commands against the catalog.
//!
//! ## Usage
//!
//! ```bash
//! libra --config ./config/libra.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `libra serve` | Start the HTTP server and browser UI |
//! | `libra search "<query>"` | Title substring search |
//! | `libra recommend --genre <g> --skill-level <s>` | Filter by genre and skill level |
//! | `libra check "<title>"` | Availability of a book |
//! | `libra chat "<message>"` | One chat turn with the assistant |
//! | `libra ask "<query>"` | AI suggestion plus catalog search |
//! | `libra services [query]` | List or fuzzy-match library services |
//! | `libra subscribe <email>` | Send the new-arrivals subscription email |
//! | `libra info` | Catalog summary |
//!
//! Borrowing and renewal keep state in the running server, so they are only
//! available through `POST /tools/borrow_book` and `POST /tools/renew_book`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use libra_ai::commands;
use libra_ai::config::{self, Config};
use libra_ai::library::Library;
use libra_ai::logging;
use libra_ai::server;

/// LibraAI, the AI librarian.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/libra.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "libra",
    about = "LibraAI: catalog search, recommendations, loans, and chat for a library",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/libra.toml`. Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/libra.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` and serves the browser UI at `/` and the
    /// tool API at `/tools/*`.
    Serve,

    /// Search book titles (case-insensitive substring).
    Search {
        query: String,
    },

    /// Recommend books by genre and skill level.
    ///
    /// Either filter may be omitted; an omitted filter matches everything.
    Recommend {
        #[arg(long, default_value = "")]
        genre: String,

        #[arg(long, default_value = "")]
        skill_level: String,
    },

    /// Check whether a book is available.
    Check {
        title: String,
    },

    /// Send one message to the chat assistant.
    Chat {
        message: String,
    },

    /// Ask the AI about books and search the catalog for the same text.
    Ask {
        query: String,
    },

    /// List library services, or find the one matching a query.
    Services {
        query: Option<String>,
    },

    /// Subscribe an email address to new-arrival notifications.
    Subscribe {
        email: String,
    },

    /// Print a summary of the loaded catalog.
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let missing_config = !cli.config.exists();
    let cfg = if missing_config {
        Config::minimal()
    } else {
        config::load_config(&cli.config)?
    };

    logging::init(cli.debug, cfg.logging.level.as_deref());
    if missing_config {
        tracing::warn!(
            path = %cli.config.display(),
            "config file not found, using built-in defaults"
        );
    }

    match cli.command {
        Commands::Serve => server::run_server(&cfg).await?,
        Commands::Search { query } => commands::run_search(&load_library(&cfg), &query)?,
        Commands::Recommend { genre, skill_level } => {
            commands::run_recommend(&load_library(&cfg), &genre, &skill_level)?
        }
        Commands::Check { title } => commands::run_check(&load_library(&cfg), &title)?,
        Commands::Chat { message } => commands::run_chat(&load_library(&cfg), &message).await?,
        Commands::Ask { query } => commands::run_ask(&load_library(&cfg), &query).await?,
        Commands::Services { query } => {
            commands::run_services(&load_library(&cfg), query.as_deref())?
        }
        Commands::Subscribe { email } => {
            commands::run_subscribe(&load_library(&cfg), &email).await?
        }
        Commands::Info => commands::run_info(&load_library(&cfg))?,
    }

    Ok(())
}

/// Build the library for a one-shot command, surfacing a catalog load
/// problem on stderr.
fn load_library(cfg: &Config) -> Library {
    let library = Library::from_config(cfg);
    if let Some(warning) = library.load_warning() {
        eprintln!("Warning: {}", warning);
    }
    library
}
