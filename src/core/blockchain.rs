// The chain lives entirely in memory for the session: an append-only list of
// mined blocks plus the pool of transactions still waiting to be mined.
// Balances are never stored; they are replayed from every block on request.

use crate::config::ChainConfig;
use crate::core::{Block, CancellationFlag, ProofOfWork, SelectionPolicy, Transaction};
use crate::error::{BlockchainError, Result};
use log::{info, warn};
use std::fmt;

/// Summary of one `mine_block` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedBlock {
    pub index: u64,
    pub hash: String,
    pub transaction_count: usize,
    /// Address selection found fewer matches than the block could hold
    pub address_exhausted: bool,
}

/// Validation result for a single block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReport {
    pub index: u64,
    pub hash_valid: bool,
    pub merkle_valid: bool,
    pub linked: bool,
    pub proof_of_work_valid: bool,
}

impl BlockReport {
    pub fn is_valid(&self) -> bool {
        self.hash_valid && self.merkle_valid && self.linked && self.proof_of_work_valid
    }
}

/// Validation result for the whole chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    pub blocks: Vec<BlockReport>,
}

impl ChainReport {
    pub fn is_valid(&self) -> bool {
        self.blocks.iter().all(BlockReport::is_valid)
    }

    /// Index of the first block that failed any check
    pub fn first_invalid(&self) -> Option<u64> {
        self.blocks.iter().find(|b| !b.is_valid()).map(|b| b.index)
    }
}

pub struct Blockchain {
    blocks: Vec<Block>,
    transaction_pool: Vec<Transaction>,
    config: ChainConfig,
    cancel: CancellationFlag,
}

impl Blockchain {
    /// Start a chain by mining its genesis block.
    pub fn new(config: ChainConfig) -> Result<Blockchain> {
        Self::with_cancellation(config, CancellationFlag::new())
    }

    /// Start a chain whose mining calls honour `cancel`.
    pub fn with_cancellation(config: ChainConfig, cancel: CancellationFlag) -> Result<Blockchain> {
        config.validate()?;
        let genesis = Block::genesis(&config, &cancel)?;
        info!("Genesis block mined: {}", genesis.get_hash());
        Ok(Blockchain {
            blocks: vec![genesis],
            transaction_pool: Vec::new(),
            config,
            cancel,
        })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last_block(&self) -> &Block {
        // The genesis block is mined in the constructor and blocks are never removed
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn get_block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn get_block_as_string(&self, index: usize) -> String {
        match self.blocks.get(index) {
            Some(block) => block.to_string(),
            None => "No such block exists".to_string(),
        }
    }

    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transaction_pool.push(transaction);
    }

    pub fn transaction_pool(&self) -> &[Transaction] {
        self.transaction_pool.as_slice()
    }

    pub fn pool_len(&self) -> usize {
        self.transaction_pool.len()
    }

    /// Remove and return up to `n` of the oldest pending transactions.
    pub fn pending_transactions(&mut self, n: usize) -> Vec<Transaction> {
        let take = n.min(self.transaction_pool.len());
        self.transaction_pool.drain(..take).collect()
    }

    /// Build a block on the tip from the pool, mine it and append it.
    pub fn mine_block(
        &mut self,
        miner_address: &str,
        policy: &SelectionPolicy,
    ) -> Result<MinedBlock> {
        let parent = self
            .blocks
            .last()
            .ok_or_else(|| BlockchainError::InvalidBlock("chain has no genesis".to_string()))?;
        let assembled = Block::assemble(
            parent,
            &mut self.transaction_pool,
            miner_address,
            policy,
            &self.config,
            &self.cancel,
        )?;
        let block = assembled.block;

        if !Self::is_linked(self.last_block(), &block) {
            return Err(BlockchainError::InvalidBlock(format!(
                "block {} does not extend the tip",
                block.get_index()
            )));
        }

        let mined = MinedBlock {
            index: block.get_index(),
            hash: block.get_hash().to_string(),
            transaction_count: block.get_transactions().len(),
            address_exhausted: assembled.address_exhausted,
        };
        self.append_mined_block(block);
        info!(
            "Block {} appended with {} transaction(s), {} pending",
            mined.index,
            mined.transaction_count,
            self.transaction_pool.len()
        );
        Ok(mined)
    }

    /// Push a block onto the chain. Linkage is the caller's responsibility.
    pub fn append_mined_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn is_linked(parent: &Block, block: &Block) -> bool {
        block.get_previous_hash() == parent.get_hash()
            && block.get_index() == parent.get_index() + 1
    }

    /// Recompute the block hash from its stored fields and nonce.
    pub fn validate_hash(block: &Block) -> bool {
        block.calculate_hash() == block.get_hash()
    }

    /// Recompute the merkle root from the block's transactions.
    pub fn validate_merkle_root(block: &Block) -> bool {
        block.verify_merkle_root()
    }

    /// Check every block's hash, merkle root, proof-of-work and linkage.
    pub fn validate_chain(&self) -> ChainReport {
        let blocks = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, block)| {
                let linked = match i {
                    0 => block.get_index() == 0 && block.get_previous_hash().is_empty(),
                    _ => Self::is_linked(&self.blocks[i - 1], block),
                };
                let report = BlockReport {
                    index: block.get_index(),
                    hash_valid: Self::validate_hash(block),
                    merkle_valid: Self::validate_merkle_root(block),
                    linked,
                    proof_of_work_valid: ProofOfWork::validate(block),
                };
                if !report.is_valid() {
                    warn!("Chain invalid at block {i}: {report:?}");
                }
                report
            })
            .collect();
        ChainReport { blocks }
    }

    /// Net balance of `address` replayed over every block.
    ///
    /// Incoming amounts are credited; outgoing amounts plus their fee are
    /// debited. The result may be negative.
    pub fn balance_of(&self, address: &str) -> i128 {
        // Each step moves at most 2 * u64::MAX, far inside the i128 range
        let mut balance: i128 = 0;
        for block in &self.blocks {
            for tx in block.get_transactions() {
                if tx.get_recipient() == address {
                    balance += i128::from(tx.get_amount());
                }
                if tx.get_sender() == address {
                    balance -= i128::from(tx.get_amount()) + i128::from(tx.get_fee());
                }
            }
        }
        balance
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{block}")?;
        }
        Ok(())
    }
}
