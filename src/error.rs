use std::io;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Terminal I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid argument {arg:?}: {reason}")]
    InvalidArgument { arg: String, reason: String },
    #[error("Failed to start logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, GameError>;
