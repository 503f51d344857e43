//! Command detector: repeat and bulk-repeat directives.
//!
//! Rules are an ordered list evaluated deterministically; precedence
//! is bulk-repeat, then repeat-with-identifier, then bare repeat.
//! Identifier tokens from voice transcription are noisy ("abc 123-45")
//! and get normalized before any ledger lookup.

use lazy_static::lazy_static;
use regex::Regex;

/// Ceiling on bulk-repeat copies, enforced by the validation gate
/// before any ledger lookup.
pub const MAX_BULK_COPIES: u32 = 50;

/// Identifiers shorter than this after normalization are treated as
/// noise, not receipt ids.
const MIN_ID_CHARS: usize = 8;

/// What a repeat directive points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatTarget {
    /// The most recent successful, non-demo receipt.
    Last,
    /// A specific receipt by gateway uuid.
    Id(String),
}

/// A recognized command, short-circuiting normal extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Repeat(RepeatTarget),
    Bulk { count: u32, target: RepeatTarget },
}

lazy_static! {
    /// "создай 5 копий чека <id>", "сделай 3 копии чека ..."
    static ref BULK_REPEAT: Regex = Regex::new(
        r"(?i)(?:созда[йть]*|сдела[йть]*)\s+(\d+)\s+копи[йию]\s+чека\s*(.*)"
    )
    .unwrap();

    /// "повтори чек <id>", "повторить чек <id>"
    static ref REPEAT_WITH_ID: Regex =
        Regex::new(r"(?i)повтор[иь][тьм]*\s+чек\s+(\S.*)").unwrap();

    /// "повтори последний чек", "повтори чек"
    static ref BARE_REPEAT: Regex =
        Regex::new(r"(?i)повтор[иь][тьм]*(?:\s+последний)?\s+чек\s*$").unwrap();
}

/// Strip non-alphanumeric characters from a noisy identifier token.
///
/// Returns None when fewer than [`MIN_ID_CHARS`] characters remain.
pub fn normalize_receipt_id(token: &str) -> Option<String> {
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    if cleaned.chars().count() >= MIN_ID_CHARS {
        Some(cleaned)
    } else {
        None
    }
}

/// Scan text for a repeat/bulk-repeat directive.
///
/// Returns None for ordinary receipt text. A bulk directive with an
/// unusable identifier falls back to the most recent receipt.
pub fn detect(text: &str) -> Option<Command> {
    let trimmed = text.trim();

    if let Some(caps) = BULK_REPEAT.captures(trimmed) {
        // Count is validated later against MAX_BULK_COPIES; parse
        // failures on absurdly long digit runs saturate the ceiling
        // check as well.
        let count: u32 = caps[1].parse().unwrap_or(u32::MAX);
        let target = normalize_receipt_id(&caps[2])
            .map(RepeatTarget::Id)
            .unwrap_or(RepeatTarget::Last);
        return Some(Command::Bulk { count, target });
    }

    if BARE_REPEAT.is_match(trimmed) {
        return Some(Command::Repeat(RepeatTarget::Last));
    }

    if let Some(caps) = REPEAT_WITH_ID.captures(trimmed) {
        let tail = &caps[1];
        if tail.trim().to_lowercase() == "последний" {
            return Some(Command::Repeat(RepeatTarget::Last));
        }
        return match normalize_receipt_id(tail) {
            Some(id) => Some(Command::Repeat(RepeatTarget::Id(id))),
            // "повтори чек" plus noise: treat as bare repeat.
            None => Some(Command::Repeat(RepeatTarget::Last)),
        };
    }

    None
}
