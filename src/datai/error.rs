// src/datai/error.rs
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataiError {
    #[error("Datai API key is required but not provided")]
    MissingApiKey,
    #[error("Invalid wallet address provided")]
    InvalidWalletAddress,
    #[error("Invalid chain ID provided")]
    InvalidChainId,
    #[error("Network error occurred while connecting to the Datai API")]
    Network,
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("An unknown error occurred")]
    Unknown,
}

impl From<serde_json::Error> for DataiError {
    fn from(err: serde_json::Error) -> Self {
        DataiError::Decode(err.to_string())
    }
}
