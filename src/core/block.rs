use crate::config::ChainConfig;
use crate::core::monetary::format_coins;
use crate::core::{
    BlockTemplate, CancellationFlag, DifficultyAdjustment, HashScheme, MerkleProof, MerkleTree,
    ProofOfWork, SelectionPolicy, Transaction, TransactionSelector,
};
use crate::error::{BlockchainError, Result};
use crate::utils::current_timestamp;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    timestamp: i64,
    previous_hash: String,
    difficulty: u32,
    nonce: u64,
    merkle_root: String,
    miner_address: String,
    reward: u64,
    transactions: Vec<Transaction>, // Reward transaction first
    hash: String,
    hash_scheme: HashScheme, // Field ordering the hash was sealed under
}

/// A freshly mined block plus what selection reported while filling it
#[derive(Debug, Clone)]
pub struct AssembledBlock {
    pub block: Block,
    /// Address selection ran out of matching transactions before the cap
    pub address_exhausted: bool,
}

impl Block {
    /// Mine the genesis block: index 0, no parent, no transactions.
    pub fn genesis(config: &ChainConfig, cancel: &CancellationFlag) -> Result<Block> {
        let mut block = Block {
            index: 0,
            timestamp: current_timestamp()?,
            previous_hash: String::new(),
            difficulty: config.initial_difficulty,
            nonce: 0,
            merkle_root: String::new(),
            miner_address: String::new(),
            reward: 0,
            transactions: vec![],
            hash: String::new(),
            hash_scheme: config.mining_strategy.hash_scheme(),
        };
        block.seal(config, cancel)?;
        Ok(block)
    }

    /// Build and mine a block on `parent`, consuming transactions from `pool`.
    pub fn new(
        parent: &Block,
        pool: &mut Vec<Transaction>,
        miner_address: &str,
        policy: &SelectionPolicy,
        config: &ChainConfig,
        cancel: &CancellationFlag,
    ) -> Result<Block> {
        Self::assemble(parent, pool, miner_address, policy, config, cancel)
            .map(|assembled| assembled.block)
    }

    /// Like [`Block::new`], also reporting the selection outcome.
    ///
    /// If mining fails the selected transactions are put back at the front
    /// of the pool and no block is returned.
    pub fn assemble(
        parent: &Block,
        pool: &mut Vec<Transaction>,
        miner_address: &str,
        policy: &SelectionPolicy,
        config: &ChainConfig,
        cancel: &CancellationFlag,
    ) -> Result<AssembledBlock> {
        let timestamp = current_timestamp()?;
        let difficulty = DifficultyAdjustment::adjust(
            &config.difficulty,
            parent.difficulty,
            parent.timestamp,
            timestamp,
        );

        // One slot is always taken by the reward transaction
        let capacity = config.max_transactions_per_block.saturating_sub(1);
        let selection = TransactionSelector::select(pool, policy, capacity);
        let address_exhausted = selection.address_exhausted;

        let reward_tx = match selection
            .total_fees()
            .and_then(|fees| fees.checked_add(config.block_reward))
        {
            Some(amount) => Transaction::new_reward(miner_address, amount),
            None => Err(BlockchainError::InvalidBlock(format!(
                "fees of {} selected transaction(s) overflow the block reward",
                selection.transactions.len()
            ))),
        };
        let reward_tx = match reward_tx {
            Ok(tx) => tx,
            Err(e) => {
                warn!(
                    "Cannot build block {}, returning transactions to pool: {e}",
                    parent.index + 1
                );
                pool.splice(0..0, selection.transactions);
                return Err(e);
            }
        };
        let mut transactions = Vec::with_capacity(selection.transactions.len() + 1);
        transactions.push(reward_tx);
        transactions.extend(selection.transactions);

        let mut block = Block {
            index: parent.index + 1,
            timestamp,
            previous_hash: parent.hash.clone(),
            difficulty,
            nonce: 0,
            merkle_root: MerkleTree::new(&transactions).root(),
            miner_address: miner_address.to_string(),
            reward: config.block_reward,
            transactions,
            hash: String::new(),
            hash_scheme: config.mining_strategy.hash_scheme(),
        };

        if let Err(e) = block.seal(config, cancel) {
            warn!("Mining block {} failed, returning transactions to pool: {e}", block.index);
            let selected = block.transactions.split_off(1);
            pool.splice(0..0, selected);
            return Err(e);
        }

        Ok(AssembledBlock {
            block,
            address_exhausted,
        })
    }

    /// Run proof-of-work and record the winning nonce and hash.
    fn seal(&mut self, config: &ChainConfig, cancel: &CancellationFlag) -> Result<()> {
        let pow = ProofOfWork::new(self.template(), cancel.clone());
        let outcome = pow.run(config.mining_strategy)?;
        self.nonce = outcome.nonce;
        self.hash = outcome.hash;
        info!(
            "Sealed block {} with {} transaction(s) at difficulty {}",
            self.index,
            self.transactions.len(),
            self.difficulty
        );
        Ok(())
    }

    /// Hash inputs of this block, everything but the nonce.
    pub fn template(&self) -> BlockTemplate {
        BlockTemplate {
            index: self.index,
            timestamp: self.timestamp,
            previous_hash: self.previous_hash.clone(),
            merkle_root: self.merkle_root.clone(),
            reward: self.reward,
            difficulty: self.difficulty,
            scheme: self.hash_scheme,
        }
    }

    /// Recompute the identity hash from the stored fields and nonce.
    pub fn calculate_hash(&self) -> String {
        self.template().hash_with_nonce(self.nonce)
    }

    pub fn calculate_merkle_root(&self) -> String {
        MerkleTree::new(&self.transactions).root()
    }

    /// Verify that the block's Merkle root matches its transactions
    pub fn verify_merkle_root(&self) -> bool {
        self.calculate_merkle_root() == self.merkle_root
    }

    /// Generate a Merkle proof for a transaction in this block
    pub fn merkle_proof(&self, transaction_index: usize) -> Option<MerkleProof> {
        MerkleTree::new(&self.transactions).generate_proof(transaction_index)
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_merkle_root(&self) -> &str {
        self.merkle_root.as_str()
    }

    pub fn get_miner_address(&self) -> &str {
        self.miner_address.as_str()
    }

    pub fn get_reward(&self) -> u64 {
        self.reward
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub fn get_hash_scheme(&self) -> HashScheme {
        self.hash_scheme
    }

    /// Create a test block with custom fields, unmined (for testing only)
    #[cfg(test)]
    pub(crate) fn new_test_block(
        index: u64,
        timestamp: i64,
        previous_hash: &str,
        difficulty: u32,
        transactions: Vec<Transaction>,
    ) -> Block {
        Block {
            index,
            timestamp,
            previous_hash: previous_hash.to_string(),
            difficulty,
            nonce: 0,
            merkle_root: MerkleTree::new(&transactions).root(),
            miner_address: "test_miner".to_string(),
            reward: 0,
            transactions,
            hash: "test_hash".to_string(),
            hash_scheme: HashScheme::Basic,
        }
    }

    #[cfg(test)]
    pub(crate) fn transactions_mut(&mut self) -> &mut Vec<Transaction> {
        &mut self.transactions
    }

    #[cfg(test)]
    pub(crate) fn set_timestamp_unchecked(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[BLOCK START]")?;
        writeln!(f, "Index: {}\tTimestamp: {}", self.index, self.timestamp)?;
        writeln!(f, "Previous Hash: {}", self.previous_hash)?;
        writeln!(f, "-- PoW --")?;
        writeln!(f, "Difficulty Level: {}", self.difficulty)?;
        writeln!(f, "Nonce: {}", self.nonce)?;
        writeln!(f, "Hash: {} ({})", self.hash, self.hash_scheme)?;
        writeln!(f, "-- Rewards --")?;
        writeln!(f, "Reward: {}", format_coins(self.reward))?;
        writeln!(f, "Miners Address: {}", self.miner_address)?;
        writeln!(f, "-- {} Transactions --", self.transactions.len())?;
        writeln!(f, "Merkle Root: {}", self.merkle_root)?;
        for tx in &self.transactions {
            writeln!(f, "{tx}")?;
        }
        write!(f, "[BLOCK END]")
    }
}
