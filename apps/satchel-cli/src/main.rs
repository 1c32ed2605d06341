//! # Satchel Shell Entry Point
//!
//! ```bash
//! # Marketplace cart in the platform data directory
//! satchel
//!
//! # Food cart in a throwaway database
//! satchel --kind food --db /tmp/food.db
//!
//! # Nothing persisted
//! satchel --memory
//! ```

use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    satchel_cli::init_tracing();

    let args = satchel_cli::Args::parse();

    match satchel_cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("satchel failed: {e}");
            ExitCode::FAILURE
        }
    }
}
