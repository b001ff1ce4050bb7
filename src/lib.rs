//! # Nonce Chain - A Local Proof-of-Work Mining Simulator
//!
//! Builds blocks from pending transactions, mines each one by brute-force
//! nonce search against a leading-zeros target, links them into an
//! append-only chain and derives balances by replaying that chain. Nothing is
//! persisted and nothing talks to a network; a chain lives for one session.
//!
//! ## How the Code Is Organized
//! - `core/`: hashing, merkle roots, difficulty, selection, mining, blocks, ledger
//! - `wallet/`: key pairs, addresses and the transaction signer
//! - `config/`: explicit chain settings (TOML file and environment)
//! - `utils/`: cryptographic and encoding helpers
//! - `cli/`: command-line interface for the simulator binary
//!
//! ## Mining in Short
//! Each new block takes its parent's difficulty through
//! [`DifficultyAdjustment`], reserves its first slot for a reward
//! transaction, fills the rest with [`TransactionSelector`], roots them with
//! [`MerkleTree`] and hands the header to [`ProofOfWork`], either counting
//! nonces on one thread or racing two workers over even and odd nonces.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::ChainConfig;
pub use core::{
    Block, Blockchain, CancellationFlag, ChainReport, DifficultyAdjustment, DifficultySettings,
    HashEngine, HashScheme, MerkleTree, MiningStrategy, ProofOfWork, SelectionPolicy, Signer,
    Transaction, TransactionSelector,
};
pub use error::{BlockchainError, Result};
pub use utils::{current_timestamp, sha256_digest, sha256_hex};
pub use wallet::{validate_address, verify_signature, Wallet, Wallets};
