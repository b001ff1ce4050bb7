use crate::core::{DifficultySettings, MiningStrategy, DEFAULT_BLOCK_REWARD, MAX_DIFFICULTY};
use crate::error::{BlockchainError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const DEFAULT_DIFFICULTY: u32 = 4;
const DEFAULT_MAX_TRANSACTIONS: usize = 5;

const DIFFICULTY_KEY: &str = "NONCE_CHAIN_DIFFICULTY";
const REWARD_KEY: &str = "NONCE_CHAIN_REWARD";
const STRATEGY_KEY: &str = "NONCE_CHAIN_STRATEGY";

/// Settings a chain is constructed with.
///
/// Loaded from defaults, then an optional TOML file, then environment
/// variables; the CLI applies its own flags last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Difficulty the genesis block is mined under
    pub initial_difficulty: u32,
    /// Fixed issuance per block in base units, before fees
    pub block_reward: u64,
    /// Cap on a block's transaction list, reward included
    pub max_transactions_per_block: usize,
    pub mining_strategy: MiningStrategy,
    pub difficulty: DifficultySettings,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            initial_difficulty: DEFAULT_DIFFICULTY,
            block_reward: DEFAULT_BLOCK_REWARD,
            max_transactions_per_block: DEFAULT_MAX_TRANSACTIONS,
            mining_strategy: MiningStrategy::default(),
            difficulty: DifficultySettings::default(),
        }
    }
}

impl ChainConfig {
    pub fn new() -> ChainConfig {
        Self::default()
    }

    /// Defaults, optional TOML file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<ChainConfig> {
        let config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides()
    }

    pub fn from_toml_file(path: &Path) -> Result<ChainConfig> {
        let text = fs::read_to_string(path).map_err(|e| {
            BlockchainError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<ChainConfig> {
        let config: ChainConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_env_overrides(mut self) -> Result<ChainConfig> {
        if let Some(difficulty) = parse_env::<u32>(DIFFICULTY_KEY)? {
            self.initial_difficulty = difficulty;
        }
        if let Some(reward) = parse_env::<u64>(REWARD_KEY)? {
            self.block_reward = reward;
        }
        if let Ok(strategy) = env::var(STRATEGY_KEY) {
            self.mining_strategy = match strategy.to_lowercase().as_str() {
                "sequential" => MiningStrategy::Sequential,
                "racing" => MiningStrategy::Racing,
                other => {
                    return Err(BlockchainError::Config(format!(
                        "{STRATEGY_KEY}: unknown strategy '{other}'"
                    )))
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    /// A block must have room for its reward transaction, and no difficulty
    /// the chain can reach may exceed the length of a hash.
    pub fn validate(&self) -> Result<()> {
        if self.initial_difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "initial_difficulty {} exceeds the maximum of {MAX_DIFFICULTY}",
                self.initial_difficulty
            )));
        }
        if self.difficulty.ceiling > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "difficulty ceiling {} exceeds the maximum of {MAX_DIFFICULTY}",
                self.difficulty.ceiling
            )));
        }
        if self.max_transactions_per_block == 0 {
            return Err(BlockchainError::Config(
                "max_transactions_per_block must be at least 1".to_string(),
            ));
        }
        if self.difficulty.reset_to > self.difficulty.ceiling {
            return Err(BlockchainError::Config(format!(
                "difficulty reset_to {} exceeds ceiling {}",
                self.difficulty.reset_to, self.difficulty.ceiling
            )));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| BlockchainError::Config(format!("{key}: invalid value '{value}'"))),
        Err(_) => Ok(None),
    }
}
