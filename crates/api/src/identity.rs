//! Pseudonymous user keys for rate limiting.
//!
//! The roadmap has no accounts; cooldowns are keyed by a digest of two
//! client-reported request fields. The key is a rate-limiting convenience,
//! not an authentication credential: both inputs are trivially spoofable and
//! nothing downstream may assume the key uniquely identifies a person.

use sha2::{Digest, Sha256};

const MISSING_INPUT: &str = "unknown";

/// Derives a stable pseudonymous key from client-supplied request attributes.
///
/// Total by construction: missing or empty inputs fall back to a fixed
/// placeholder, so every request maps to some key.
pub fn derive_user_key(user_agent: Option<&str>, ip_address: Option<&str>) -> String {
    let agent = non_empty_or_placeholder(user_agent);
    let address = non_empty_or_placeholder(ip_address);

    let mut hasher = Sha256::new();
    hasher.update(agent.as_bytes());
    hasher.update(address.as_bytes());
    hex::encode(hasher.finalize())
}

fn non_empty_or_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => MISSING_INPUT,
    }
}
