// Entry point for the mining simulator CLI. It plays the part of the display
// front end: it drives the chain, renders blocks and reports balances.
use clap::Parser;
use log::{error, info, LevelFilter};
use nonce_chain::core::monetary::{coins_to_units, format_balance};
use nonce_chain::core::{BlockTemplate, MerkleTree, ProofOfWork};
use nonce_chain::{
    current_timestamp, utils, verify_signature, Blockchain, CancellationFlag, ChainConfig,
    Command, MiningStrategy, Opt, Transaction, Wallets,
};
use rand::Rng;
use std::process;
use std::time::Instant;

fn main() {
    let opt = Opt::parse();

    // Info by default, RUST_LOG still wins when set
    let level = if opt.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = run_command(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ChainConfig::load(opt.config.as_deref())?;

    match opt.command {
        Command::Simulate {
            blocks,
            transactions,
            wallets,
            policy,
            target,
            strategy,
            difficulty,
            reward,
            json,
        } => {
            if let Some(strategy) = strategy {
                config.mining_strategy = strategy.into();
            }
            if let Some(difficulty) = difficulty {
                config.initial_difficulty = difficulty;
            }
            if let Some(coins) = reward {
                config.block_reward = coins_to_units(coins)?;
            }
            config.validate()?;

            let mut book = Wallets::new();
            for _ in 0..wallets.max(2) {
                book.create_wallet()?;
            }
            let addresses = book.get_addresses();
            let target = target.unwrap_or_else(|| addresses[0].clone());
            let policy = policy.to_policy(&target);

            info!(
                "Simulating {blocks} block(s) with {} wallets, policy {policy}, strategy {}",
                addresses.len(),
                config.mining_strategy
            );
            let mut chain = Blockchain::new(config)?;
            let mut rng = rand::thread_rng();

            for round in 0..blocks {
                for _ in 0..transactions {
                    let from = &addresses[rng.gen_range(0..addresses.len())];
                    let to = &addresses[rng.gen_range(0..addresses.len())];
                    let funds = chain.balance_of(from);
                    if funds <= 0 || from == to {
                        continue;
                    }
                    let spendable = u64::try_from(funds).unwrap_or(u64::MAX);
                    let fee = rng.gen_range(0..=spendable / 20);
                    let amount = rng.gen_range(1..=spendable - fee);
                    let wallet = book.require_wallet(from)?;
                    chain.add_transaction(Transaction::new(wallet, to, amount, fee)?);
                }

                let miner = &addresses[round % addresses.len()];
                let mined = chain.mine_block(miner, &policy)?;
                if mined.address_exhausted {
                    println!("Block {}: no further transactions for {target}", mined.index);
                }
            }

            if json {
                println!("{}", utils::to_json(&chain.blocks().to_vec())?);
            } else {
                println!("{chain}");
            }

            println!("\n-- Balances --");
            for address in &addresses {
                println!("{address}: {}", format_balance(chain.balance_of(address)));
            }
            println!("Pending transactions: {}", chain.pool_len());

            println!("\n-- Signatures --");
            for block in chain.blocks() {
                for tx in block.get_transactions().iter().filter(|tx| !tx.is_reward()) {
                    let valid = book
                        .get_wallet(tx.get_sender())
                        .map(|w| {
                            verify_signature(w.get_public_key(), tx.get_signature(), tx.get_hash())
                        })
                        .unwrap_or(false);
                    println!(
                        "Block {} tx {}: {}",
                        block.get_index(),
                        tx.get_hash(),
                        if valid { "valid" } else { "INVALID" }
                    );
                }
            }

            let report = chain.validate_chain();
            match report.first_invalid() {
                None => println!("\nChain valid ({} blocks)", report.blocks.len()),
                Some(index) => println!("\nChain invalid at block {index}"),
            }
        }
        Command::Race { difficulty } => {
            let template = |strategy: MiningStrategy| -> nonce_chain::Result<BlockTemplate> {
                Ok(BlockTemplate {
                    index: 1,
                    timestamp: current_timestamp()?,
                    previous_hash: String::new(),
                    merkle_root: MerkleTree::new(&[]).root(),
                    reward: config.block_reward,
                    difficulty,
                    scheme: strategy.hash_scheme(),
                })
            };

            for strategy in [MiningStrategy::Sequential, MiningStrategy::Racing] {
                let pow = ProofOfWork::new(template(strategy)?, CancellationFlag::new());
                let started = Instant::now();
                let outcome = pow.run(strategy)?;
                println!(
                    "{:>10}: nonce {:>10} in {:>10.3?} hash {} ({})",
                    strategy.to_string(),
                    outcome.nonce,
                    started.elapsed(),
                    outcome.hash,
                    if pow.template().meets_difficulty(&outcome.hash) {
                        "valid"
                    } else {
                        "INVALID"
                    }
                );
            }
        }
    }

    Ok(())
}
