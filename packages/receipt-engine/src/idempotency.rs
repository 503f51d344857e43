//! Deterministic idempotency keys for submission attempts.
//!
//! The key is a SHA-256 over a canonical serialization of the request
//! text and the draft's monetary content, so the same (text, draft)
//! pair maps to the same ledger row across runs and processes.

use sha2::{Digest, Sha256};

use crate::types::ReceiptDraft;

/// Derive the idempotency key for one (text, draft) pair.
///
/// Canonical form: trimmed lowercase message, operation code, then
/// one `name|price|qty` tuple per item and one `kind|amount` tuple
/// per payment, all joined with newlines. First 16 bytes of the
/// digest, hex.
pub fn derive_key(text: &str, draft: &ReceiptDraft) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.trim().to_lowercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(draft.operation.endpoint().as_bytes());
    for item in &draft.items {
        hasher.update(b"\n");
        hasher.update(item.name.as_bytes());
        hasher.update(b"|");
        hasher.update(item.unit_price.normalize().to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(item.quantity.normalize().to_string().as_bytes());
    }
    for payment in &draft.payments {
        hasher.update(b"\n");
        hasher.update([payment.kind.code()]);
        hasher.update(b"|");
        hasher.update(payment.amount.normalize().to_string().as_bytes());
    }

    let digest = hasher.finalize();
    digest[..16].iter().map(|b| format!("{b:02x}")).collect()
}
