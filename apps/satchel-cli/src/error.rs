//! # Shell Error Type
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Shell                              │
//! │                                                                         │
//! │  typed line ──► Command::parse ──► Usage / InvalidNumber ──┐            │
//! │                      │                                     │            │
//! │                      ▼                                     ▼            │
//! │                 Shell::execute ──► UnknownProduct ───► printed,         │
//! │                      │             LineNotFound        shell goes on    │
//! │                      ▼                                                  │
//! │                 CartFacade (never fails, invalid = no-op)               │
//! │                                                                         │
//! │  Startup ──► Database / PersistConfig ──► Db / Persist ──► exit 1       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use satchel_db::DbError;
use satchel_persist::PersistError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Wrong arguments for a known command.
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown command '{0}', type 'help'")]
    UnknownCommand(String),

    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error("no product '{0}' in the catalog")]
    UnknownProduct(String),

    #[error("product {product} has no {kind} '{id}'")]
    UnknownModifier {
        product: String,
        kind: &'static str,
        id: String,
    },

    #[error("no line matches '{0}'")]
    LineNotFound(String),

    #[error("'{0}' matches more than one line")]
    AmbiguousLine(String),

    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("storage error: {0}")]
    Db(#[from] DbError),

    #[error("persistence config error: {0}")]
    Persist(#[from] PersistError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// True for errors the shell reports and then keeps running.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CliError::Db(_) | CliError::Persist(_) | CliError::Io(_))
    }
}

pub type CliResult<T> = Result<T, CliError>;
