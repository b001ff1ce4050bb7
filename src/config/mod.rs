//! Configuration management
//!
//! Chain settings are passed explicitly into the chain and miner rather than
//! read from process-wide state.

pub mod settings;

pub use settings::ChainConfig;
