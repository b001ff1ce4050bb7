use crate::core::{HashEngine, Transaction};
use serde::{Deserialize, Serialize};

/// Merkle tree over a block's transaction hashes
///
/// Every level is kept so inclusion proofs can be produced without
/// rehashing. Pairing is left to right; an odd node at the end of a level is
/// paired with itself, and a single leaf is also self-paired so the root is
/// never just a transaction hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleTree {
    levels: Vec<Vec<String>>,
}

/// Merkle proof for transaction verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Transaction hash being proven
    pub transaction_hash: String,
    /// Merkle root hash
    pub merkle_root: String,
    /// Proof path (sibling hashes and directions), leaf level first
    pub proof_path: Vec<ProofElement>,
    /// Index of the transaction in the block
    pub transaction_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofElement {
    /// Sibling hash
    pub hash: String,
    /// Direction: true if sibling is on the right, false if on the left
    pub is_right: bool,
}

impl MerkleTree {
    pub fn new(transactions: &[Transaction]) -> Self {
        let hashes: Vec<String> = transactions
            .iter()
            .map(Transaction::calculate_hash)
            .collect();
        Self::from_hashes(&hashes)
    }

    pub fn from_hashes(hashes: &[String]) -> Self {
        let mut levels = vec![hashes.to_vec()];
        if hashes.is_empty() {
            return MerkleTree { levels };
        }

        let mut current = hashes.to_vec();
        loop {
            current = Self::parent_level(&current);
            levels.push(current.clone());
            if current.len() == 1 {
                break;
            }
        }
        MerkleTree { levels }
    }

    /// Root hash, or an empty string when there are no leaves.
    pub fn root(&self) -> String {
        match self.levels.last() {
            Some(level) if self.leaf_count() > 0 => level[0].clone(),
            _ => String::new(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map(Vec::len).unwrap_or(0)
    }

    /// Root over an ordered list of transaction hashes.
    pub fn calculate_merkle_root(hashes: &[String]) -> String {
        Self::from_hashes(hashes).root()
    }

    /// Generate a Merkle proof for a transaction at the given index
    pub fn generate_proof(&self, transaction_index: usize) -> Option<MerkleProof> {
        if transaction_index >= self.leaf_count() {
            return None;
        }

        let mut proof_path = Vec::with_capacity(self.levels.len());
        let mut index = transaction_index;
        // The top level is the root and has no sibling
        for level in &self.levels[..self.levels.len() - 1] {
            let (sibling, is_right) = if index % 2 == 0 {
                // Last node of an odd level is its own sibling
                let sibling = level.get(index + 1).unwrap_or(&level[index]);
                (sibling.clone(), true)
            } else {
                (level[index - 1].clone(), false)
            };
            proof_path.push(ProofElement {
                hash: sibling,
                is_right,
            });
            index /= 2;
        }

        Some(MerkleProof {
            transaction_hash: self.levels[0][transaction_index].clone(),
            merkle_root: self.root(),
            proof_path,
            transaction_index,
        })
    }

    /// Verify a Merkle proof
    pub fn verify_proof(proof: &MerkleProof) -> bool {
        let mut current_hash = proof.transaction_hash.clone();

        for element in &proof.proof_path {
            current_hash = if element.is_right {
                HashEngine::combine(&current_hash, &element.hash)
            } else {
                HashEngine::combine(&element.hash, &current_hash)
            };
        }

        current_hash == proof.merkle_root
    }

    fn parent_level(hashes: &[String]) -> Vec<String> {
        hashes
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => HashEngine::combine(left, right),
                [single] => HashEngine::combine(single, single),
                _ => unreachable!("chunks(2) yields one or two items"),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sha256_hex;

    fn hashes(n: usize) -> Vec<String> {
        (0..n).map(|i| sha256_hex(&format!("tx-{i}"))).collect()
    }

    #[test]
    fn test_empty_root_is_empty_string() {
        assert_eq!(MerkleTree::calculate_merkle_root(&[]), "");
        assert_eq!(MerkleTree::from_hashes(&[]).leaf_count(), 0);
    }

    #[test]
    fn test_single_leaf_is_self_paired() {
        let h = hashes(1);
        assert_eq!(
            MerkleTree::calculate_merkle_root(&h),
            HashEngine::combine(&h[0], &h[0])
        );
    }

    #[test]
    fn test_two_leaves() {
        let h = hashes(2);
        assert_eq!(
            MerkleTree::calculate_merkle_root(&h),
            HashEngine::combine(&h[0], &h[1])
        );
    }

    #[test]
    fn test_odd_leaf_count_duplicates_last() {
        let h = hashes(3);
        let left = HashEngine::combine(&h[0], &h[1]);
        let right = HashEngine::combine(&h[2], &h[2]);
        assert_eq!(
            MerkleTree::calculate_merkle_root(&h),
            HashEngine::combine(&left, &right)
        );
    }

    #[test]
    fn test_root_is_order_sensitive() {
        let h = hashes(4);
        let mut swapped = h.clone();
        swapped.swap(0, 1);
        assert_ne!(
            MerkleTree::calculate_merkle_root(&h),
            MerkleTree::calculate_merkle_root(&swapped)
        );
    }

    #[test]
    fn test_proofs_verify_for_every_leaf() {
        for n in 1..=7 {
            let tree = MerkleTree::from_hashes(&hashes(n));
            for i in 0..n {
                let proof = tree.generate_proof(i).expect("index in range");
                assert_eq!(proof.merkle_root, tree.root());
                assert!(MerkleTree::verify_proof(&proof), "leaf {i} of {n}");
            }
        }
    }

    #[test]
    fn test_proof_out_of_range() {
        let tree = MerkleTree::from_hashes(&hashes(3));
        assert!(tree.generate_proof(3).is_none());
        assert!(MerkleTree::from_hashes(&[]).generate_proof(0).is_none());
    }

    #[test]
    fn test_tampered_proof_fails() {
        let tree = MerkleTree::from_hashes(&hashes(5));
        let mut proof = tree.generate_proof(2).unwrap();
        proof.transaction_hash = sha256_hex("forged");
        assert!(!MerkleTree::verify_proof(&proof));
    }
}
