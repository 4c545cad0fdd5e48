// Core modules
mod crypto_hash;
mod identity;

// Expose cryptographic hash calculations
pub use crypto_hash::*;

// Identity keys and the per-run index
pub use identity::{identity_key, IdentityIndex};
