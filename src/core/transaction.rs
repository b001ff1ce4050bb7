// Transactions are plain account-to-account transfers. Balances are derived
// later by replaying every block, so a transaction only records who paid whom,
// how much, the fee offered to the miner, and a signature over its own hash.

use crate::core::monetary::format_coins;
use crate::core::HashEngine;
use crate::error::Result;
use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sender address used by the synthesized block reward
pub const REWARD_SENDER: &str = "Mine Rewards";

/// Produces the signature stamped on each new transaction.
///
/// The signer owns the sender's private key; the core never verifies the
/// result, it only carries it.
pub trait Signer {
    /// Address the signer sends from
    fn address(&self) -> String;
    /// Signature over a transaction hash
    fn sign(&self, hash: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    timestamp: i64,        // Creation time in milliseconds
    sender_address: String,
    recipient_address: String,
    amount: u64,           // Base units transferred
    fee: u64,              // Base units offered to the miner
    hash: String,          // Digest of the fields above
    signature: String,     // Empty for reward transactions
}

impl Transaction {
    /// Build, hash and sign a transfer from the signer's address.
    pub fn new(signer: &dyn Signer, to: &str, amount: u64, fee: u64) -> Result<Transaction> {
        let mut tx = Self::unsigned_at(&signer.address(), to, amount, fee, current_timestamp()?);
        tx.signature = signer.sign(&tx.hash)?;
        Ok(tx)
    }

    /// Reward paid to the miner of a block, unsigned.
    pub fn new_reward(miner_address: &str, amount: u64) -> Result<Transaction> {
        Ok(Self::unsigned_at(
            REWARD_SENDER,
            miner_address,
            amount,
            0,
            current_timestamp()?,
        ))
    }

    /// Unsigned transaction with an explicit timestamp.
    pub fn unsigned_at(from: &str, to: &str, amount: u64, fee: u64, timestamp: i64) -> Transaction {
        let hash = HashEngine::transaction_hash(timestamp, from, to, amount, fee);
        Transaction {
            timestamp,
            sender_address: from.to_string(),
            recipient_address: to.to_string(),
            amount,
            fee,
            hash,
            signature: String::new(),
        }
    }

    /// Recompute the hash from the current field values.
    pub fn calculate_hash(&self) -> String {
        HashEngine::transaction_hash(
            self.timestamp,
            &self.sender_address,
            &self.recipient_address,
            self.amount,
            self.fee,
        )
    }

    pub fn is_reward(&self) -> bool {
        self.sender_address == REWARD_SENDER && self.signature.is_empty()
    }

    pub fn involves(&self, address: &str) -> bool {
        self.sender_address == address || self.recipient_address == address
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_sender(&self) -> &str {
        self.sender_address.as_str()
    }

    pub fn get_recipient(&self) -> &str {
        self.recipient_address.as_str()
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_fee(&self) -> u64 {
        self.fee
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub fn get_signature(&self) -> &str {
        self.signature.as_str()
    }

    /// Overwrite the amount without rehashing (for tamper tests only)
    #[cfg(test)]
    pub(crate) fn set_amount_unchecked(&mut self, amount: u64) {
        self.amount = amount;
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  [TRANSACTION START]\
             \n  Timestamp: {}\
             \n  -- Verification --\
             \n  Hash: {}\
             \n  Signature: {}\
             \n  -- Quantities --\
             \n  Transferred: {}\t  Fee: {}\
             \n  -- Participants --\
             \n  Sender: {}\
             \n  Receiver: {}\
             \n  [TRANSACTION END]",
            self.timestamp,
            self.hash,
            self.signature,
            format_coins(self.amount),
            format_coins(self.fee),
            self.sender_address,
            self.recipient_address
        )
    }
}
