use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a petition. Values outside the known set are kept
/// lower-cased in [`PetitionState::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PetitionState {
   Open,
   Closed,
   Rejected,
   #[default]
   Unknown,
   Other(String),
}

impl PetitionState {
   pub fn parse(raw: &str) -> Self {
      let lowered = raw.trim().to_lowercase();
      match lowered.as_str() {
         "open" => Self::Open,
         "closed" => Self::Closed,
         "rejected" => Self::Rejected,
         "" | "unknown" => Self::Unknown,
         _ => Self::Other(lowered),
      }
   }

   pub fn as_str(&self) -> &str {
      match self {
         Self::Open => "open",
         Self::Closed => "closed",
         Self::Rejected => "rejected",
         Self::Unknown => "unknown",
         Self::Other(s) => s,
      }
   }

   /// Case-insensitive comparison against a caller-supplied state name.
   pub fn matches(&self, filter: &str) -> bool {
      self.as_str() == filter.to_lowercase()
   }
}

impl From<String> for PetitionState {
   fn from(raw: String) -> Self {
      Self::parse(&raw)
   }
}

impl From<PetitionState> for String {
   fn from(state: PetitionState) -> Self {
      match state {
         PetitionState::Other(s) => s,
         known => known.as_str().to_string(),
      }
   }
}

impl fmt::Display for PetitionState {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Petition {
   pub title:      String,
   pub url:        String,
   pub state:      PetitionState,
   pub signatures: u64,
}

/// Conjunctive predicates applied before ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
   pub state:          Option<String>,
   pub min_signatures: Option<u64>,
   pub max_signatures: Option<u64>,
}

impl SearchFilters {
   pub fn state(state: impl Into<String>) -> Self {
      Self { state: Some(state.into()), ..Self::default() }
   }

   pub fn matches(&self, petition: &Petition) -> bool {
      if let Some(state) = &self.state
         && !petition.state.matches(state)
      {
         return false;
      }
      if self.min_signatures.is_some_and(|min| petition.signatures < min) {
         return false;
      }
      if self.max_signatures.is_some_and(|max| petition.signatures > max) {
         return false;
      }
      true
   }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
   Semantic,
   Keyword,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
   #[serde(flatten)]
   pub petition:         Petition,
   pub similarity_score: f32,
   pub rank:             usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsReport {
   pub total_petitions:    usize,
   pub open_petitions:     usize,
   pub closed_petitions:   usize,
   pub rejected_petitions: usize,
   pub total_signatures:   u64,
   pub average_signatures: f64,
   pub most_signed:        Option<Petition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
   pub open:     usize,
   pub closed:   usize,
   pub rejected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopPetition {
   pub title:            String,
   pub url:              String,
   pub state:            PetitionState,
   pub signatures:       u64,
   pub similarity_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
   pub query:              String,
   pub threshold:          f32,
   pub total_petitions:    usize,
   pub related_petitions:  usize,
   pub percentage_related: f64,
   pub status_breakdown:   StatusBreakdown,
   pub top_petitions:      Vec<TopPetition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
   Healthy,
   Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
   pub status:            HealthStatus,
   pub total_petitions:   usize,
   pub embeddings_loaded: bool,
   pub model:             Option<String>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub error:             Option<String>,
}

#[cfg(test)]
mod tests {
   use super::*;

   fn petition(state: &str, signatures: u64) -> Petition {
      Petition {
         title: "t".to_string(),
         url: "https://example.org/1".to_string(),
         state: PetitionState::parse(state),
         signatures,
      }
   }

   #[test]
   fn state_parsing_keeps_unrecognized_values_lowercased() {
      assert_eq!(PetitionState::parse("Open"), PetitionState::Open);
      assert_eq!(PetitionState::parse(" CLOSED "), PetitionState::Closed);
      assert_eq!(PetitionState::parse(""), PetitionState::Unknown);
      assert_eq!(PetitionState::parse("Debated"), PetitionState::Other("debated".to_string()));
   }

   #[test]
   fn state_serializes_as_plain_string() {
      let json = serde_json::to_string(&petition("Awaiting", 1)).unwrap();
      assert!(json.contains("\"state\":\"awaiting\""));

      let back: Petition = serde_json::from_str(&json).unwrap();
      assert_eq!(back.state, PetitionState::Other("awaiting".to_string()));
   }

   #[test]
   fn state_filter_is_case_insensitive() {
      let filters = SearchFilters::state("OPEN");
      assert!(filters.matches(&petition("open", 10)));
      assert!(!filters.matches(&petition("closed", 10)));
   }

   #[test]
   fn signature_bounds_are_inclusive() {
      let filters =
         SearchFilters { min_signatures: Some(10), max_signatures: Some(20), ..Default::default() };
      assert!(!filters.matches(&petition("open", 9)));
      assert!(filters.matches(&petition("open", 10)));
      assert!(filters.matches(&petition("open", 20)));
      assert!(!filters.matches(&petition("open", 21)));
   }

   #[test]
   fn search_result_flattens_petition_fields() {
      let result = SearchResult { petition: petition("open", 5), similarity_score: 0.5, rank: 1 };
      let value = serde_json::to_value(&result).unwrap();
      assert_eq!(value["state"], "open");
      assert_eq!(value["signatures"], 5);
      assert_eq!(value["rank"], 1);
   }
}
