use crate::core::Transaction;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How pending transactions are chosen for a new block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Uniformly random picks
    Random,
    /// Oldest first, in pool order
    #[default]
    Altruistic,
    /// Highest fee first, earliest wins ties
    Greedy,
    /// Only transactions sent from or to the given address
    ByAddress(String),
}

impl SelectionPolicy {
    /// Map the numeric policy codes 0..=3; anything else is altruistic.
    pub fn from_code(code: i32, address: &str) -> SelectionPolicy {
        match code {
            0 => SelectionPolicy::Random,
            1 => SelectionPolicy::Altruistic,
            2 => SelectionPolicy::Greedy,
            3 => SelectionPolicy::ByAddress(address.to_string()),
            _ => SelectionPolicy::Altruistic,
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::Random => write!(f, "random"),
            SelectionPolicy::Altruistic => write!(f, "altruistic"),
            SelectionPolicy::Greedy => write!(f, "greedy"),
            SelectionPolicy::ByAddress(address) => write!(f, "address({address})"),
        }
    }
}

/// Outcome of one selection pass
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub transactions: Vec<Transaction>,
    /// Set under `ByAddress` when the pool ran out of matches before the cap
    pub address_exhausted: bool,
}

impl Selection {
    /// Sum of the selected fees, `None` if it does not fit in a `u64`
    pub fn total_fees(&self) -> Option<u64> {
        self.transactions
            .iter()
            .try_fold(0u64, |total, tx| total.checked_add(tx.get_fee()))
    }
}

pub struct TransactionSelector;

impl TransactionSelector {
    /// Move up to `max_count` transactions out of `pool` under `policy`.
    ///
    /// Chosen transactions are removed from the pool; everything else keeps
    /// its relative order.
    pub fn select(
        pool: &mut Vec<Transaction>,
        policy: &SelectionPolicy,
        max_count: usize,
    ) -> Selection {
        Self::select_with_rng(pool, policy, max_count, &mut rand::thread_rng())
    }

    pub fn select_with_rng<R: Rng + ?Sized>(
        pool: &mut Vec<Transaction>,
        policy: &SelectionPolicy,
        max_count: usize,
        rng: &mut R,
    ) -> Selection {
        let mut selection = Selection::default();

        match policy {
            SelectionPolicy::Random => {
                while selection.transactions.len() < max_count && !pool.is_empty() {
                    let index = rng.gen_range(0..pool.len());
                    selection.transactions.push(pool.remove(index));
                }
            }
            SelectionPolicy::Altruistic => {
                let take = max_count.min(pool.len());
                selection.transactions.extend(pool.drain(..take));
            }
            SelectionPolicy::Greedy => {
                while selection.transactions.len() < max_count && !pool.is_empty() {
                    let mut best = 0;
                    for (index, tx) in pool.iter().enumerate().skip(1) {
                        if tx.get_fee() > pool[best].get_fee() {
                            best = index;
                        }
                    }
                    selection.transactions.push(pool.remove(best));
                }
            }
            SelectionPolicy::ByAddress(address) => {
                let mut index = 0;
                while index < pool.len() && selection.transactions.len() < max_count {
                    if pool[index].involves(address) {
                        selection.transactions.push(pool.remove(index));
                    } else {
                        index += 1;
                    }
                }
                if selection.transactions.len() < max_count {
                    selection.address_exhausted = true;
                    info!(
                        "No further transactions for address {address} ({} selected)",
                        selection.transactions.len()
                    );
                }
            }
        }

        debug!(
            "Selected {} transaction(s) with policy {policy}, {} left in pool",
            selection.transactions.len(),
            pool.len()
        );
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tx(from: &str, to: &str, fee: u64, timestamp: i64) -> Transaction {
        Transaction::unsigned_at(from, to, 10, fee, timestamp)
    }

    fn pool() -> Vec<Transaction> {
        vec![
            tx("alice", "bob", 1, 1),
            tx("bob", "carol", 5, 2),
            tx("carol", "dave", 3, 3),
            tx("dave", "alice", 5, 4),
            tx("erin", "frank", 2, 5),
            tx("frank", "erin", 4, 6),
            tx("gina", "hank", 0, 7),
        ]
    }

    fn timestamps(txs: &[Transaction]) -> Vec<i64> {
        txs.iter().map(Transaction::get_timestamp).collect()
    }

    #[test]
    fn test_policy_codes() {
        assert_eq!(SelectionPolicy::from_code(0, ""), SelectionPolicy::Random);
        assert_eq!(SelectionPolicy::from_code(1, ""), SelectionPolicy::Altruistic);
        assert_eq!(SelectionPolicy::from_code(2, ""), SelectionPolicy::Greedy);
        assert_eq!(
            SelectionPolicy::from_code(3, "alice"),
            SelectionPolicy::ByAddress("alice".to_string())
        );
        assert_eq!(SelectionPolicy::from_code(42, "alice"), SelectionPolicy::Altruistic);
        assert_eq!(SelectionPolicy::from_code(-1, ""), SelectionPolicy::Altruistic);
    }

    #[test]
    fn test_altruistic_takes_pool_order() {
        let mut pool = pool();
        let selection = TransactionSelector::select(&mut pool, &SelectionPolicy::Altruistic, 4);
        assert_eq!(timestamps(&selection.transactions), vec![1, 2, 3, 4]);
        assert_eq!(timestamps(&pool), vec![5, 6, 7]);
        assert!(!selection.address_exhausted);
    }

    #[test]
    fn test_greedy_takes_highest_fee_first_seen_on_ties() {
        let mut pool = pool();
        let selection = TransactionSelector::select(&mut pool, &SelectionPolicy::Greedy, 4);
        // fees 5 (ts 2), 5 (ts 4), 4 (ts 6), 3 (ts 3)
        assert_eq!(timestamps(&selection.transactions), vec![2, 4, 6, 3]);
        assert_eq!(selection.total_fees(), Some(17));
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_random_is_bounded_and_without_repeats() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pool = pool();
        let selection =
            TransactionSelector::select_with_rng(&mut pool, &SelectionPolicy::Random, 4, &mut rng);
        assert_eq!(selection.transactions.len(), 4);
        assert_eq!(pool.len(), 3);

        let mut seen = timestamps(&selection.transactions);
        seen.extend(timestamps(&pool));
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_by_address_matches_sender_or_recipient() {
        let mut pool = pool();
        let selection = TransactionSelector::select(
            &mut pool,
            &SelectionPolicy::ByAddress("alice".to_string()),
            4,
        );
        assert_eq!(timestamps(&selection.transactions), vec![1, 4]);
        assert!(selection.address_exhausted);
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn test_by_address_stops_at_cap() {
        let mut pool = pool();
        let selection = TransactionSelector::select(
            &mut pool,
            &SelectionPolicy::ByAddress("erin".to_string()),
            1,
        );
        assert_eq!(timestamps(&selection.transactions), vec![5]);
        assert!(!selection.address_exhausted);
    }

    #[test]
    fn test_never_exceeds_cap_or_pool() {
        let policies = [
            SelectionPolicy::Random,
            SelectionPolicy::Altruistic,
            SelectionPolicy::Greedy,
            SelectionPolicy::ByAddress("bob".to_string()),
        ];
        for policy in &policies {
            for cap in 0..10 {
                let mut pool = pool();
                let available = pool.len();
                let selection = TransactionSelector::select(&mut pool, policy, cap);
                assert!(selection.transactions.len() <= cap);
                assert!(selection.transactions.len() <= available);
                assert_eq!(selection.transactions.len() + pool.len(), available);
            }
        }
    }

    #[test]
    fn test_empty_pool() {
        let mut pool = Vec::new();
        let selection = TransactionSelector::select(&mut pool, &SelectionPolicy::Greedy, 5);
        assert!(selection.transactions.is_empty());
    }

    #[test]
    fn test_total_fees_overflow_is_none() {
        let mut pool = vec![tx("a", "b", u64::MAX, 1), tx("c", "d", 1, 2)];
        let selection = TransactionSelector::select(&mut pool, &SelectionPolicy::Altruistic, 2);
        assert_eq!(selection.total_fees(), None);
    }
}
