//! Column-name aliases accepted in headed CSV sources.

pub const TITLE: &[&str] = &["title", "petition", "text"];
pub const URL: &[&str] = &["url", "link"];
pub const STATE: &[&str] = &["state", "status"];
pub const SIGNATURES: &[&str] = &["signatures", "signature_count"];

/// Returns the value of the first candidate column that is present and
/// non-empty in a row.
pub fn first_match<'a, F>(candidates: &[&str], mut lookup: F) -> Option<&'a str>
where
   F: FnMut(&str) -> Option<&'a str>,
{
   candidates
      .iter()
      .filter_map(|name| lookup(name))
      .find(|value| !value.is_empty())
}

/// Canonical key for a header cell.
pub fn header_key(name: &str) -> String {
   name.trim().to_lowercase()
}
