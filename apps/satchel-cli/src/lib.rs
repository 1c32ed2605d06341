//! # Satchel Shell Library
//!
//! An interactive shell over one cart engine, persisted to SQLite.
//!
//! ## Module Organization
//! ```text
//! satchel_cli/
//! ├── lib.rs          ◄─── You are here (startup & read loop)
//! ├── commands.rs     ◄─── Line parser and Shell
//! ├── catalog.rs      ◄─── Demo products, variants, add-ons
//! ├── config.rs       ◄─── Currency display, default cart kind
//! └── error.rs        ◄─── CliError
//! ```

pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;

use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use satchel_core::CartKind;
use satchel_db::{Database, DbConfig, KeyValueStore};
use satchel_persist::PersistConfig;
use satchel_store::CartFacade;

use catalog::Catalog;
use commands::{summary_line, Command, Reply, Shell};
use config::AppConfig;
use error::{CliError, CliResult};

/// Interactive cart shell.
#[derive(Debug, Parser)]
#[command(name = "satchel")]
#[command(author, version, about = "Interactive cart shell over the Satchel cart engine")]
pub struct Args {
    /// Cart engine: marketplace or food
    #[arg(short, long, env = "SATCHEL_CART_KIND")]
    pub kind: Option<CartKind>,

    /// SQLite database file (overrides the config file)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Persistence config file (persist.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Keep the cart in memory only
    #[arg(long, conflicts_with = "db")]
    pub memory: bool,
}

/// Runs the shell until `quit` or end of input.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Shell Startup                                     │
/// │                                                                         │
/// │  1. Load Configuration ───────────────────────────────────────────────► │
/// │     • AppConfig from env, PersistConfig from file + env                 │
/// │                                                                         │
/// │  2. Open Storage ─────────────────────────────────────────────────────► │
/// │     • --memory: in-memory SQLite                                        │
/// │     • otherwise --db, the config file, or the platform data dir         │
/// │                                                                         │
/// │  3. Build Cart ───────────────────────────────────────────────────────► │
/// │     • CartFacade + subscriber printing a summary on each change         │
/// │     • hydrate() restores the previous session                           │
/// │                                                                         │
/// │  4. Read Loop ────────────────────────────────────────────────────────► │
/// │     • one command per line                                              │
/// │                                                                         │
/// │  5. Shutdown ─────────────────────────────────────────────────────────► │
/// │     • flush pending save, close the pool                                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(args: Args) -> CliResult<()> {
    let app_config = AppConfig::from_env()?;
    let kind = args.kind.unwrap_or(app_config.default_kind);

    let persist_config = match args.config.clone() {
        Some(path) => PersistConfig::load(Some(path))?,
        None => PersistConfig::load_or_default(None),
    };

    let db = open_database(&args, &persist_config).await?;
    let facade = CartFacade::new(db.clone(), kind, &persist_config);

    let summary = {
        let config = app_config.clone();
        facade.subscribe(move |cart| println!("{}", summary_line(cart, &config)))
    };

    if facade.hydrate().await {
        info!(kind = %kind, "Previous cart restored");
    }

    let shell = Shell::new(facade, Catalog::demo(), app_config);
    let result = read_loop(&shell).await;

    shell.facade().shutdown().await;
    summary.unsubscribe();
    db.close().await;

    result
}

async fn read_loop<S: KeyValueStore>(shell: &Shell<S>) -> CliResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout
            .write_all(format!("{}> ", shell.facade().kind()).as_bytes())
            .await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };

        match shell.execute(command) {
            Ok(Reply::Quit) => return Ok(()),
            Ok(Reply::Text(text)) if text.is_empty() => {}
            Ok(Reply::Text(text)) => println!("{text}"),
            Err(e) if e.is_recoverable() => println!("error: {e}"),
            Err(e) => return Err(e),
        }
    }
}

async fn open_database(args: &Args, persist: &PersistConfig) -> CliResult<Database> {
    if args.memory {
        warn!("Running with an in-memory cart, nothing survives exit");
        return Ok(Database::new(DbConfig::in_memory()).await?);
    }

    let path = args
        .db
        .clone()
        .or_else(|| persist.database_path())
        .ok_or(CliError::InvalidSetting {
            name: "database_path",
            reason: "no data directory on this platform, pass --db".to_string(),
        })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!(?path, "Database path determined");

    Ok(Database::new(DbConfig::new(path)).await?)
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so they don't mix with shell output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=satchel_persist=trace` - Trace the write-behind gateway
/// - Default: `info,satchel=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,satchel=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
