//! Core blockchain functionality
//!
//! Hashing, merkle roots, difficulty adjustment, transaction selection,
//! proof-of-work mining, block assembly and the in-memory ledger.

pub mod block;
pub mod blockchain;
pub mod difficulty;
pub mod hashing;
pub mod merkle;
pub mod monetary;
pub mod proof_of_work;
pub mod selector;
pub mod transaction;

pub use block::{AssembledBlock, Block};
pub use blockchain::{BlockReport, Blockchain, ChainReport, MinedBlock};
pub use difficulty::{DifficultyAdjustment, DifficultySettings};
pub use hashing::{meets_difficulty, BlockTemplate, HashEngine, HashScheme, MAX_DIFFICULTY};
pub use merkle::{MerkleProof, MerkleTree, ProofElement};
pub use monetary::{DEFAULT_BLOCK_REWARD, UNITS_PER_COIN};
pub use proof_of_work::{CancellationFlag, MiningOutcome, MiningStrategy, ProofOfWork};
pub use selector::{Selection, SelectionPolicy, TransactionSelector};
pub use transaction::{Signer, Transaction, REWARD_SENDER};
