//! Header-less, whitespace separated petition lines:
//! `<title words...> <url> <state> <signatures>`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
   dataset::normalize::{normalize_title, parse_signatures},
   error::DataError,
   types::{Petition, PetitionState},
};

static URL_PATTERN: Lazy<Regex> =
   Lazy::new(|| Regex::new(r"https?://\S+").expect("url pattern is valid"));

const MIN_TOKENS: usize = 4;

pub fn read(content: &str) -> Result<Vec<Petition>, DataError> {
   let mut petitions = Vec::new();
   for (idx, line) in content.lines().enumerate() {
      match parse_line(line, idx + 1)? {
         Some(petition) => petitions.push(petition),
         None => tracing::debug!(line = idx + 1, "skipping unparseable petition line"),
      }
   }
   Ok(petitions)
}

/// Parses one line. Lines with fewer than four tokens or no URL are skipped;
/// a malformed signature count is an error.
pub fn parse_line(line: &str, row: usize) -> Result<Option<Petition>, DataError> {
   if line.split_whitespace().count() < MIN_TOKENS {
      return Ok(None);
   }
   let Some(url) = URL_PATTERN.find(line) else {
      return Ok(None);
   };

   let mut rest = line[url.end()..].split_whitespace();
   let state = rest.next().unwrap_or("unknown");
   let signatures = match rest.next() {
      Some(raw) => parse_signatures(raw)
         .ok_or_else(|| DataError::Signatures { row, value: raw.to_string() })?,
      None => 0,
   };

   Ok(Some(Petition {
      title: normalize_title(&line[..url.start()]),
      url: url.as_str().to_string(),
      state: PetitionState::parse(state),
      signatures,
   }))
}
