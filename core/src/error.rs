use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AudioModemError {
    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("Processor host disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, AudioModemError>;
