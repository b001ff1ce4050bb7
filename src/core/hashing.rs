use crate::utils::sha256_hex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Write};

/// Hex characters in a SHA-256 digest; no higher difficulty can be met
pub const MAX_DIFFICULTY: u32 = 64;

/// Deterministic SHA-256 digest over a sequence of field values.
///
/// Fields are rendered with `Display` and concatenated in the given order
/// with no separator, then hashed as UTF-8. Reordering fields changes the
/// digest, so callers must always pass them in their canonical order.
pub struct HashEngine;

impl HashEngine {
    pub fn digest(fields: &[&dyn Display]) -> String {
        let mut input = String::new();
        for field in fields {
            // Writing into a String cannot fail
            let _ = write!(input, "{field}");
        }
        sha256_hex(&input)
    }

    /// Digest of two hashes concatenated, used for merkle parents.
    pub fn combine(left: &str, right: &str) -> String {
        Self::digest(&[&left, &right])
    }

    /// Transaction hash: `timestamp ‖ sender ‖ recipient ‖ amount ‖ fee`.
    pub fn transaction_hash(
        timestamp: i64,
        sender: &str,
        recipient: &str,
        amount: u64,
        fee: u64,
    ) -> String {
        Self::digest(&[&timestamp, &sender, &recipient, &amount, &fee])
    }
}

/// Which field ordering sealed a block.
///
/// Two orderings exist and produce unrelated hashes for the same block, so
/// each block records the one it was mined under and is always re-verified
/// with that same ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashScheme {
    /// `timestamp ‖ index ‖ previousHash ‖ nonce ‖ merkleRoot`
    Basic,
    /// `index ‖ timestamp ‖ previousHash ‖ nonce ‖ merkleRoot ‖ reward`
    Extended,
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashScheme::Basic => write!(f, "basic"),
            HashScheme::Extended => write!(f, "extended"),
        }
    }
}

/// The block fields that feed the identity hash, everything except the nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTemplate {
    pub index: u64,
    pub timestamp: i64,
    pub previous_hash: String,
    pub merkle_root: String,
    pub reward: u64,
    pub difficulty: u32,
    pub scheme: HashScheme,
}

impl BlockTemplate {
    pub fn hash_with_nonce(&self, nonce: u64) -> String {
        match self.scheme {
            HashScheme::Basic => HashEngine::digest(&[
                &self.timestamp,
                &self.index,
                &self.previous_hash,
                &nonce,
                &self.merkle_root,
            ]),
            HashScheme::Extended => HashEngine::digest(&[
                &self.index,
                &self.timestamp,
                &self.previous_hash,
                &nonce,
                &self.merkle_root,
                &self.reward,
            ]),
        }
    }

    /// True when `hash` starts with `difficulty` '0' hex characters.
    pub fn meets_difficulty(&self, hash: &str) -> bool {
        meets_difficulty(hash, self.difficulty)
    }
}

pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let required = difficulty as usize;
    hash.len() >= required && hash.bytes().take(required).all(|b| b == b'0')
}
