//! Unified error types for the store adapter, the confirmation gate and the bot layer.

use crate::{gate::MutationKind, store::Collection};
use thiserror::Error;

/// Failures reported by the remote store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database rejected a read or write
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// An update targeted a record that does not exist
    #[error("Record '{id}' not found in '{collection}'")]
    RecordNotFound {
        /// Collection the lookup ran against
        collection: Collection,
        /// Id that was requested
        id: String,
    },

    /// A stored record could not be read back as a flat field map or typed record
    #[error("Malformed record '{id}' in '{collection}': {message}")]
    MalformedPayload {
        /// Collection holding the record
        collection: Collection,
        /// Id of the malformed record
        id: String,
        /// What was wrong with it
        message: String,
    },
}

/// Failures of the shared-secret confirmation step.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfirmationError {
    /// The supplied password did not match; the pending action was dropped
    #[error("Wrong password, {action} cancelled")]
    SecretMismatch {
        /// The kind of mutation that was rejected
        action: MutationKind,
    },

    /// `confirm` was called with nothing awaiting confirmation
    #[error("Nothing is awaiting confirmation")]
    NothingPending,
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Confirmation(#[from] ConfirmationError),

    #[error("Invalid input: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Nothing to export")]
    NothingToExport,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl Error {
    /// Shorthand for building a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::Store(StoreError::Database(value))
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
