use crate::core::{Block, BlockTemplate, HashScheme, MAX_DIFFICULTY};
use crate::error::{BlockchainError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How the nonce space is searched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningStrategy {
    /// One worker counting up from zero
    Sequential,
    /// Two workers on even and odd nonces, first valid result wins
    #[default]
    Racing,
}

impl MiningStrategy {
    /// Field ordering a block mined with this strategy is sealed under
    pub fn hash_scheme(&self) -> HashScheme {
        match self {
            MiningStrategy::Sequential => HashScheme::Basic,
            MiningStrategy::Racing => HashScheme::Extended,
        }
    }
}

impl fmt::Display for MiningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiningStrategy::Sequential => write!(f, "sequential"),
            MiningStrategy::Racing => write!(f, "racing"),
        }
    }
}

/// Shared flag that stops a mining call at its next iteration.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Once triggered the flag remains set.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Winning nonce and the hash it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningOutcome {
    pub nonce: u64,
    pub hash: String,
}

/// Final state of one racing worker
#[derive(Debug)]
struct WorkerReport {
    nonce: u64,
    last_hash: String,
    found: bool,
    elapsed: Duration,
}

pub struct ProofOfWork {
    template: BlockTemplate,
    cancel: CancellationFlag,
}

impl ProofOfWork {
    pub fn new(template: BlockTemplate, cancel: CancellationFlag) -> ProofOfWork {
        ProofOfWork { template, cancel }
    }

    pub fn template(&self) -> &BlockTemplate {
        &self.template
    }

    /// Validate proof-of-work for a block: the stored hash must be what its
    /// fields and nonce produce, and must carry the required zero prefix.
    pub fn validate(block: &Block) -> bool {
        let template = block.template();
        let hash = template.hash_with_nonce(block.get_nonce());
        hash == block.get_hash() && template.meets_difficulty(&hash)
    }

    pub fn run(&self, strategy: MiningStrategy) -> Result<MiningOutcome> {
        info!(
            "Mining block {} at difficulty {} ({strategy})",
            self.template.index, self.template.difficulty
        );
        match strategy {
            MiningStrategy::Sequential => self.run_sequential(),
            MiningStrategy::Racing => self.run_racing(),
        }
    }

    /// Count up from zero until a hash meets the difficulty.
    pub fn run_sequential(&self) -> Result<MiningOutcome> {
        self.ensure_reachable()?;
        let started = Instant::now();
        let mut nonce: u64 = 0;
        loop {
            if self.cancel.is_cancelled() {
                return Err(BlockchainError::Cancelled);
            }
            let hash = self.template.hash_with_nonce(nonce);
            if self.template.meets_difficulty(&hash) {
                info!(
                    "Block {} mined with nonce {nonce} in {:?}: {hash}",
                    self.template.index,
                    started.elapsed()
                );
                return Ok(MiningOutcome { nonce, hash });
            }
            nonce = nonce.checked_add(1).ok_or_else(|| {
                BlockchainError::Mining(format!(
                    "nonce space exhausted at difficulty {}",
                    self.template.difficulty
                ))
            })?;
        }
    }

    /// Race two workers over disjoint halves of the nonce space.
    ///
    /// Worker one takes even nonces and worker two odd ones. Each checks the
    /// other's done flag after every miss and gives up once it is set. Both
    /// are joined before a result is chosen; worker two's wins when both
    /// found one.
    pub fn run_racing(&self) -> Result<MiningOutcome> {
        self.ensure_reachable()?;
        let worker_one_done = AtomicBool::new(false);
        let worker_two_done = AtomicBool::new(false);

        let (one, two) = thread::scope(|scope| {
            let first = scope.spawn(|| self.race_worker(0, &worker_one_done, &worker_two_done));
            let second = scope.spawn(|| self.race_worker(1, &worker_two_done, &worker_one_done));
            (first.join(), second.join())
        });

        let one = one.map_err(|_| BlockchainError::Mining("worker 1 panicked".to_string()))?;
        let two = two.map_err(|_| BlockchainError::Mining("worker 2 panicked".to_string()))?;

        debug!(
            "Worker 1 stopped at nonce {} after {:?}, worker 2 at nonce {} after {:?}",
            one.nonce, one.elapsed, two.nonce, two.elapsed
        );

        let winner = if two.found {
            Some((2, two.nonce, two.last_hash.clone(), two.elapsed))
        } else if one.found {
            Some((1, one.nonce, one.last_hash.clone(), one.elapsed))
        } else {
            None
        };

        match winner {
            Some((worker, nonce, hash, elapsed)) => {
                info!(
                    "Block {} mined by worker {worker} with nonce {nonce} in {elapsed:?}: {hash}",
                    self.template.index
                );
                Ok(MiningOutcome { nonce, hash })
            }
            None if self.cancel.is_cancelled() => Err(BlockchainError::Cancelled),
            None => Err(BlockchainError::MiningExhausted {
                worker_one_nonce: one.nonce,
                worker_two_nonce: two.nonce,
                worker_one_hash: one.last_hash,
                worker_two_hash: two.last_hash,
            }),
        }
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.template.difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "difficulty {} can never be met by a {MAX_DIFFICULTY}-digit hash",
                self.template.difficulty
            )));
        }
        Ok(())
    }

    fn race_worker(
        &self,
        start: u64,
        own_done: &AtomicBool,
        other_done: &AtomicBool,
    ) -> WorkerReport {
        let started = Instant::now();
        let mut nonce = start;
        let mut last_hash = String::new();

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            last_hash = self.template.hash_with_nonce(nonce);
            if self.template.meets_difficulty(&last_hash) {
                own_done.store(true, Ordering::Release);
                return WorkerReport {
                    nonce,
                    last_hash,
                    found: true,
                    elapsed: started.elapsed(),
                };
            }
            // A stale read here only costs one extra hash
            if other_done.load(Ordering::Acquire) {
                break;
            }
            match nonce.checked_add(2) {
                Some(next) => nonce = next,
                None => break,
            }
        }

        WorkerReport {
            nonce,
            last_hash,
            found: false,
            elapsed: started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::meets_difficulty;

    fn template(difficulty: u32, scheme: HashScheme) -> BlockTemplate {
        BlockTemplate {
            index: 1,
            timestamp: 1_700_000_000_000,
            previous_hash: "0000abcd".to_string(),
            merkle_root: "1234".to_string(),
            reward: 100_000_000,
            difficulty,
            scheme,
        }
    }

    #[test]
    fn test_sequential_finds_smallest_nonce() {
        let t = template(2, HashScheme::Basic);
        let pow = ProofOfWork::new(t.clone(), CancellationFlag::new());
        let outcome = pow.run_sequential().unwrap();

        assert!(meets_difficulty(&outcome.hash, 2));
        assert_eq!(outcome.hash, t.hash_with_nonce(outcome.nonce));
        for nonce in 0..outcome.nonce {
            assert!(!meets_difficulty(&t.hash_with_nonce(nonce), 2));
        }
    }

    #[test]
    fn test_racing_produces_valid_nonce() {
        let t = template(3, HashScheme::Extended);
        let pow = ProofOfWork::new(t.clone(), CancellationFlag::new());
        let outcome = pow.run_racing().unwrap();

        assert!(meets_difficulty(&outcome.hash, 3));
        assert_eq!(outcome.hash, t.hash_with_nonce(outcome.nonce));
    }

    #[test]
    fn test_racing_and_sequential_both_validate() {
        for scheme in [HashScheme::Basic, HashScheme::Extended] {
            let t = template(2, scheme);
            let sequential = ProofOfWork::new(t.clone(), CancellationFlag::new())
                .run(MiningStrategy::Sequential)
                .unwrap();
            let racing = ProofOfWork::new(t.clone(), CancellationFlag::new())
                .run(MiningStrategy::Racing)
                .unwrap();

            assert!(t.meets_difficulty(&t.hash_with_nonce(sequential.nonce)));
            assert!(t.meets_difficulty(&t.hash_with_nonce(racing.nonce)));
        }
    }

    #[test]
    fn test_zero_difficulty_accepts_first_nonce() {
        let t = template(0, HashScheme::Basic);
        let outcome = ProofOfWork::new(t, CancellationFlag::new())
            .run_sequential()
            .unwrap();
        assert_eq!(outcome.nonce, 0);

        // Both workers succeed on their first try and worker two is preferred
        let t = template(0, HashScheme::Extended);
        let outcome = ProofOfWork::new(t, CancellationFlag::new())
            .run_racing()
            .unwrap();
        assert_eq!(outcome.nonce, 1);
    }

    #[test]
    fn test_cancelled_calls_return_cancelled() {
        let cancel = CancellationFlag::new();
        cancel.cancel();
        // 64 zeros is unreachable, only the flag can end these calls
        let pow = ProofOfWork::new(template(64, HashScheme::Basic), cancel.clone());
        assert!(matches!(pow.run_sequential(), Err(BlockchainError::Cancelled)));
        assert!(matches!(pow.run_racing(), Err(BlockchainError::Cancelled)));
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let cancel = CancellationFlag::new();
        let pow = ProofOfWork::new(template(64, HashScheme::Extended), cancel.clone());
        let canceller = {
            let cancel = cancel.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                cancel.cancel();
            })
        };
        let result = pow.run(MiningStrategy::Racing);
        canceller.join().unwrap();
        assert!(matches!(result, Err(BlockchainError::Cancelled)));
    }

    #[test]
    fn test_unreachable_difficulty_is_rejected() {
        for strategy in [MiningStrategy::Sequential, MiningStrategy::Racing] {
            let pow = ProofOfWork::new(
                template(MAX_DIFFICULTY + 1, strategy.hash_scheme()),
                CancellationFlag::new(),
            );
            assert!(matches!(pow.run(strategy), Err(BlockchainError::Config(_))));
        }
    }

    #[test]
    fn test_strategy_schemes() {
        assert_eq!(MiningStrategy::Sequential.hash_scheme(), HashScheme::Basic);
        assert_eq!(MiningStrategy::Racing.hash_scheme(), HashScheme::Extended);
        assert_eq!(MiningStrategy::default(), MiningStrategy::Racing);
    }
}
