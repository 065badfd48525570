//! Extraction of the correlation id embedded in a forwarded question.
//!
//! Grammar: the id is the first run of digits that starts the text or
//! follows a whitespace character. `"1042: message from user..."` yields
//! `1042`; `"order#12"` yields nothing.

use once_cell::sync::Lazy;
use regex::Regex;

static MESSAGE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)(\d+)").expect("message id regex"));

/// Returns the embedded message id, or `None` when the text carries no
/// standalone number or the number does not fit a message id.
pub fn parse_message_id(text: &str) -> Option<i32> {
    MESSAGE_ID_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
