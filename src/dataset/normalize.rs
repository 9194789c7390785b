//! Text clean-up applied to every petition title.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_TITLE_CHARS: usize = 500;
pub const ELLIPSIS: &str = "...";

static DISALLOWED: Lazy<Regex> =
   Lazy::new(|| Regex::new(r"[^\w\s.,!?-]").expect("disallowed-character pattern is valid"));

/// Collapses whitespace runs, strips characters outside the allow-list and
/// caps the title at [`MAX_TITLE_CHARS`].
pub fn normalize_title(raw: &str) -> String {
   let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
   let cleaned = DISALLOWED.replace_all(&collapsed, "");
   truncate_chars(&cleaned, MAX_TITLE_CHARS)
}

/// Cuts `text` to `max` characters, appending [`ELLIPSIS`] when anything was
/// removed.
pub fn truncate_chars(text: &str, max: usize) -> String {
   match text.char_indices().nth(max) {
      Some((idx, _)) => format!("{}{ELLIPSIS}", &text[..idx]),
      None => text.to_string(),
   }
}

/// Parses a signature count, ignoring thousands separators.
pub fn parse_signatures(raw: &str) -> Option<u64> {
   raw.trim().replace(',', "").parse().ok()
}
