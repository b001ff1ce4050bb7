//! Error handling for the mining simulator
//!
//! Hashing, merkle roots and ledger checks are pure and never fail. The
//! variants below cover the few paths that can: configuration loading, key
//! handling in the wallet, and a mining call that ends without a proof.

use std::fmt;

/// Result type alias for blockchain operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for blockchain operations
#[derive(Debug, Clone)]
pub enum BlockchainError {
    /// Cryptographic operation errors
    Crypto(String),
    /// Wallet operation errors
    Wallet(String),
    /// Configuration errors
    Config(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
    /// Block construction or linkage errors
    InvalidBlock(String),
    /// Mining errors
    Mining(String),
    /// Both racing workers stopped without a satisfying nonce
    MiningExhausted {
        worker_one_nonce: u64,
        worker_two_nonce: u64,
        worker_one_hash: String,
        worker_two_hash: String,
    },
    /// The mining call observed its cancellation flag
    Cancelled,
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Wallet(msg) => write!(f, "Wallet error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
            BlockchainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            BlockchainError::Mining(msg) => write!(f, "Mining error: {msg}"),
            BlockchainError::MiningExhausted {
                worker_one_nonce,
                worker_two_nonce,
                worker_one_hash,
                worker_two_hash,
            } => {
                write!(
                    f,
                    "Mining exhausted: worker 1 nonce {worker_one_nonce} (last hash {worker_one_hash}), \
                     worker 2 nonce {worker_two_nonce} (last hash {worker_two_hash})"
                )
            }
            BlockchainError::Cancelled => write!(f, "Mining cancelled"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}
