//! Intent filter: rejects conversational/off-topic input before any
//! expensive processing.
//!
//! Check order matters and is fixed: domain keywords or an active
//! multi-turn context always override the off-topic lexicon, and only
//! short texts can be refused.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{EngineError, Result};

/// Fixed user-facing refusal for off-topic input.
pub const REFUSAL_MESSAGE: &str =
    "Я помогаю только с созданием чеков. Опиши товар и цену, например: «кофе 200 рублей».";

/// Texts shorter than this (in characters) with no domain signal are
/// treated as conversational.
const MIN_MESSAGE_CHARS: usize = 10;

/// Greeting / small-talk lexicon.
const OFF_TOPIC: &[&str] = &[
    "привет",
    "здравствуй",
    "добрый день",
    "добрый вечер",
    "доброе утро",
    "как дела",
    "кто ты",
    "что ты умеешь",
    "спасибо",
    "пока",
    "hello",
    "hi",
];

/// Receipt-domain keywords that always pass the filter.
const DOMAIN_KEYWORDS: &[&str] = &[
    "чек",
    "руб",
    "₽",
    "почт",
    "email",
    "мейл",
    "возврат",
    "коррекц",
    "оплат",
    "налич",
    "картой",
    "аванс",
    "кредит",
];

lazy_static! {
    /// A number that looks like a price ("200", "99.50", "1 500").
    static ref PRICE_PATTERN: Regex = Regex::new(r"\d+([.,]\d{1,2})?").unwrap();
}

/// True when the text carries any receipt-domain signal.
pub fn has_domain_signal(text: &str) -> bool {
    let lower = text.to_lowercase();
    DOMAIN_KEYWORDS.iter().any(|kw| lower.contains(kw)) || PRICE_PATTERN.is_match(&lower)
}

/// True when the text matches the greeting/small-talk lexicon.
pub fn is_off_topic(text: &str) -> bool {
    let lower = text.to_lowercase();
    OFF_TOPIC.iter().any(|phrase| lower.contains(phrase))
}

/// Run the filter. `has_context` is true when a prior incomplete
/// request is being continued; context always overrides the lexicon.
pub fn check(text: &str, has_context: bool) -> Result<()> {
    if has_domain_signal(text) || has_context {
        return Ok(());
    }
    if text.chars().count() < MIN_MESSAGE_CHARS || is_off_topic(text) {
        return Err(EngineError::Refusal(REFUSAL_MESSAGE.to_string()));
    }
    Ok(())
}
