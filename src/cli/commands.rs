use crate::core::{MiningStrategy, SelectionPolicy};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// Transaction selection policy as given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    Random,
    Altruistic,
    Greedy,
    Address,
}

impl PolicyArg {
    /// Resolve against the address used by `address` selection
    pub fn to_policy(self, target: &str) -> SelectionPolicy {
        match self {
            PolicyArg::Random => SelectionPolicy::Random,
            PolicyArg::Altruistic => SelectionPolicy::Altruistic,
            PolicyArg::Greedy => SelectionPolicy::Greedy,
            PolicyArg::Address => SelectionPolicy::ByAddress(target.to_string()),
        }
    }
}

impl FromStr for PolicyArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" | "0" => Ok(PolicyArg::Random),
            "altruistic" | "1" => Ok(PolicyArg::Altruistic),
            "greedy" | "2" => Ok(PolicyArg::Greedy),
            "address" | "3" => Ok(PolicyArg::Address),
            // Unknown numeric codes fall back to altruistic
            other if other.parse::<i32>().is_ok() => Ok(PolicyArg::Altruistic),
            _ => Err(format!(
                "Invalid policy: {s}. Valid options: random, altruistic, greedy, address"
            )),
        }
    }
}

impl std::fmt::Display for PolicyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyArg::Random => write!(f, "random"),
            PolicyArg::Altruistic => write!(f, "altruistic"),
            PolicyArg::Greedy => write!(f, "greedy"),
            PolicyArg::Address => write!(f, "address"),
        }
    }
}

/// Mining strategy as given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    Sequential,
    Racing,
}

impl From<StrategyArg> for MiningStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => MiningStrategy::Sequential,
            StrategyArg::Racing => MiningStrategy::Racing,
        }
    }
}

impl FromStr for StrategyArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "single" => Ok(StrategyArg::Sequential),
            "racing" | "threaded" => Ok(StrategyArg::Racing),
            _ => Err(format!(
                "Invalid strategy: {s}. Valid options: sequential, racing"
            )),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "nonce-chain", about = "Local proof-of-work mining simulator")]
pub struct Opt {
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "simulate",
        about = "Create wallets, submit transfers and mine a chain"
    )]
    Simulate {
        #[arg(long, default_value_t = 3, help = "Number of blocks to mine after genesis")]
        blocks: usize,
        #[arg(long, default_value_t = 4, help = "Transfers submitted before each block")]
        transactions: usize,
        #[arg(long, default_value_t = 3, help = "Number of wallets in the session")]
        wallets: usize,
        #[arg(
            long,
            default_value = "altruistic",
            help = "Selection policy (random, altruistic, greedy, address or 0-3)"
        )]
        policy: PolicyArg,
        #[arg(long, help = "Address for address selection (defaults to the first wallet)")]
        target: Option<String>,
        #[arg(long, help = "Mining strategy (sequential, racing)")]
        strategy: Option<StrategyArg>,
        #[arg(long, help = "Genesis difficulty")]
        difficulty: Option<u32>,
        #[arg(long, help = "Block reward in coins, e.g. 0.5")]
        reward: Option<f64>,
        #[arg(long, help = "Print the chain as JSON")]
        json: bool,
    },
    #[command(
        name = "race",
        about = "Mine one block template with both strategies and compare"
    )]
    Race {
        #[arg(long, default_value_t = 4, help = "Leading zero hex characters required")]
        difficulty: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_arg_parsing() {
        assert_eq!("greedy".parse::<PolicyArg>().unwrap(), PolicyArg::Greedy);
        assert_eq!("RANDOM".parse::<PolicyArg>().unwrap(), PolicyArg::Random);
        assert_eq!("3".parse::<PolicyArg>().unwrap(), PolicyArg::Address);
        assert_eq!("17".parse::<PolicyArg>().unwrap(), PolicyArg::Altruistic);
        assert!("cheapest".parse::<PolicyArg>().is_err());
    }

    #[test]
    fn test_policy_arg_resolves_target() {
        assert_eq!(
            PolicyArg::Address.to_policy("alice"),
            SelectionPolicy::ByAddress("alice".to_string())
        );
        assert_eq!(PolicyArg::Greedy.to_policy("alice"), SelectionPolicy::Greedy);
    }

    #[test]
    fn test_strategy_arg_parsing() {
        let strategy: MiningStrategy = "racing".parse::<StrategyArg>().unwrap().into();
        assert_eq!(strategy, MiningStrategy::Racing);
        assert!("parallel".parse::<StrategyArg>().is_err());
    }

    #[test]
    fn test_cli_parses_simulate() {
        let opt = Opt::try_parse_from([
            "nonce-chain",
            "simulate",
            "--blocks",
            "2",
            "--policy",
            "address",
            "--strategy",
            "sequential",
            "--reward",
            "0.5",
        ])
        .unwrap();
        match opt.command {
            Command::Simulate {
                blocks,
                policy,
                strategy,
                reward,
                ..
            } => {
                assert_eq!(blocks, 2);
                assert_eq!(policy, PolicyArg::Address);
                assert_eq!(strategy, Some(StrategyArg::Sequential));
                assert_eq!(reward, Some(0.5));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
