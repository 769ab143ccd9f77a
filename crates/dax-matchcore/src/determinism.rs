//! Fill-root hashing.
//!
//! Replaying the same market order against the same book must produce the
//! same fills. The fill root is a SHA-256 digest over those fills that lets
//! two replays be compared without diffing full payloads.

use dax_types::Fill;
use sha2::{Digest, Sha256};

/// Hash over fill ids, counterparties, prices and quantities, in order.
/// Timestamps are excluded.
#[must_use]
pub fn compute_fill_root(fills: &[Fill]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"dax:fill_root:v1:");
    hasher.update((fills.len() as u64).to_le_bytes());

    for fill in fills {
        hasher.update(fill.id.0.as_bytes());
        hasher.update(fill.pair.first.as_bytes());
        hasher.update(fill.pair.second.as_bytes());
        hasher.update(fill.taker_order_id.0.to_le_bytes());
        hasher.update(fill.maker_order_id.0.to_le_bytes());
        hasher.update(fill.taker.0.as_bytes());
        hasher.update(fill.maker.0.as_bytes());
        hasher.update(fill.price.to_string().as_bytes());
        hasher.update(fill.quantity.to_string().as_bytes());
        hasher.update(fill.quote_amount.to_string().as_bytes());
    }

    let digest = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&digest);
    root
}

#[must_use]
pub fn verify_fill_root(fills: &[Fill], expected_root: &[u8; 32]) -> bool {
    compute_fill_root(fills) == *expected_root
}
