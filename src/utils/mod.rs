//! Utility functions and helpers
//!
//! Cryptographic primitives, encoding functions and JSON helpers used
//! throughout the crate.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, ripemd160_digest, sha256_digest, sha256_hex,
};

pub use serialization::{from_json, to_json};
