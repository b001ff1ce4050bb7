//! Wallet collaborator
//!
//! Key pairs, addresses and the signer stamped onto new transactions.
//! Signature verification lives here too; the ledger never calls it.

#[allow(clippy::module_inception)]
pub mod wallet;
pub mod wallets;

pub use wallet::{hash_pub_key, validate_address, verify_signature, Wallet, ADDRESS_CHECK_SUM_LEN};
pub use wallets::Wallets;
