//! Error handling for the wallboard CLI.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("wallboard error: {0}")]
    Core(#[from] wallboard_core::WallboardError),

    /// The node answered, but with an error response.
    #[error("{0}")]
    Node(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
