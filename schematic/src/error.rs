use std::time::Duration;

use model::Snowflake;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single request against a live guild.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Error during HTTP request: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Discord returned {status}: {body}")]
    ResponseError {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{0}")]
    Rejected(String),
}

impl TargetError {
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            TargetError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to read guild {guild_id}: {source}")]
    Unreadable {
        guild_id: Snowflake,
        #[source]
        source: TargetError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No snapshot found for {0}")]
    NotFound(String),

    #[error("Snapshot {identifier} is corrupt: {reason}")]
    Corrupt { identifier: String, reason: String },

    #[error("Error while operating on snapshot file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Error while operating on JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Error while performing database operation: {0}")]
    DatabaseError(#[from] database::sqlx::Error),
}

/// Failures that abort an import before anything was created.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to read the current state of guild {guild_id}: {source}")]
    Target {
        guild_id: Snowflake,
        #[source]
        source: TargetError,
    },

    #[error("The bot is missing the following permissions: {}", .0.join(", "))]
    MissingPermissions(Vec<String>),

    #[error("Snapshot is malformed: {0}")]
    Malformed(String),

    #[error("{0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error loading config: {0}")]
    ConfigError(#[from] envy::Error),

    #[error("{0}")]
    ExportError(#[from] ExportError),

    #[error("{0}")]
    ImportError(#[from] ImportError),

    #[error("{0}")]
    StoreError(#[from] StoreError),

    #[error("{0}")]
    TargetError(#[from] TargetError),

    #[error("Please wait {} seconds before using this command again.", .0.as_secs())]
    OnCooldown(Duration),

    #[error("You must be the server owner or have administrator permissions to use this command.")]
    NotPermitted,

    #[error("Please select a snapshot and import scope first.")]
    IncompleteSession,

    #[error("An import is already running for this session.")]
    ImportInProgress,
}

impl<T> From<Error> for Result<T> {
    fn from(e: Error) -> Self {
        Err(e)
    }
}
