//! Similarity scoring, filtering and rank assignment.
//!
//! The two strategies differ in what they include: [`semantic`] ranks every
//! petition that passes the filters whatever its score, while [`keyword`]
//! drops petitions sharing no word with the query.

use std::{cmp::Ordering, collections::HashSet};

use ndarray::ArrayView1;

use crate::{
   error::{Error, Result},
   store::EmbeddingMatrix,
   types::{Petition, SearchFilters, SearchResult},
};

/// Cosine similarity of `query` against every row of `matrix`, in row order.
/// Zero-magnitude vectors score 0.
pub fn cosine_scores(matrix: &EmbeddingMatrix, query: &[f32]) -> Result<Vec<f32>> {
   if matrix.is_empty() {
      return Ok(Vec::new());
   }
   if query.len() != matrix.dim() {
      return Err(Error::DimensionMismatch { expected: matrix.dim(), got: query.len() });
   }

   let q = ArrayView1::from(query);
   let q_norm = q.dot(&q).sqrt();
   let dots = matrix.view().dot(&q);

   Ok(dots
      .iter()
      .zip(matrix.norms())
      .map(|(&dot, &norm)| {
         if norm == 0.0 || q_norm == 0.0 {
            0.0
         } else {
            dot / (norm * q_norm)
         }
      })
      .collect())
}

/// Ranks all petitions by their precomputed `scores` (index-aligned).
pub fn semantic(
   petitions: &[Petition],
   scores: &[f32],
   filters: &SearchFilters,
   top_k: usize,
) -> Vec<SearchResult> {
   rank(petitions, scores.iter().copied().enumerate(), filters, top_k)
}

/// Ranks petitions by the fraction of query words found in the title.
/// Petitions with no overlap are excluded.
pub fn keyword(
   petitions: &[Petition],
   query: &str,
   filters: &SearchFilters,
   top_k: usize,
) -> Vec<SearchResult> {
   let query_words = word_set(query);
   if query_words.is_empty() {
      return Vec::new();
   }

   let scored = petitions.iter().enumerate().filter_map(|(idx, petition)| {
      let common = word_set(&petition.title)
         .intersection(&query_words)
         .count();
      (common > 0).then(|| (idx, common as f32 / query_words.len() as f32))
   });

   rank(petitions, scored, filters, top_k)
}

fn word_set(text: &str) -> HashSet<String> {
   text.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Filters, sorts by descending score (stable, so ties keep dataset order),
/// keeps the first `top_k` and numbers them from 1.
pub fn rank(
   petitions: &[Petition],
   scored: impl IntoIterator<Item = (usize, f32)>,
   filters: &SearchFilters,
   top_k: usize,
) -> Vec<SearchResult> {
   let mut hits: Vec<(usize, f32)> = scored
      .into_iter()
      .filter(|&(idx, _)| filters.matches(&petitions[idx]))
      .collect();

   hits.sort_by(|a, b| descending(a.1, b.1));
   hits.truncate(top_k);

   hits
      .into_iter()
      .enumerate()
      .map(|(pos, (idx, score))| SearchResult {
         petition:         petitions[idx].clone(),
         similarity_score: score,
         rank:             pos + 1,
      })
      .collect()
}

/// Descending order with NaN last, so the comparator stays total.
fn descending(a: f32, b: f32) -> Ordering {
   b.partial_cmp(&a)
      .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::types::PetitionState;

   fn make_petition(title: &str, state: PetitionState, signatures: u64) -> Petition {
      Petition { title: title.to_string(), url: String::new(), state, signatures }
   }

   fn sample() -> Vec<Petition> {
      vec![
         make_petition("Save the bees", PetitionState::Open, 100),
         make_petition("Plant more trees", PetitionState::Closed, 5000),
         make_petition("Save local libraries", PetitionState::Open, 50),
         make_petition("Ban fireworks", PetitionState::Rejected, 10),
      ]
   }

   #[test]
   fn cosine_matches_hand_computation() {
      let rows = vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![1.0, 1.0], vec![0.0, 0.0]];
      let matrix = EmbeddingMatrix::from_rows(rows).unwrap();
      let scores = cosine_scores(&matrix, &[2.0, 0.0]).unwrap();

      assert!((scores[0] - 1.0).abs() < 1e-6);
      assert!(scores[1].abs() < 1e-6);
      assert!((scores[2] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
      assert_eq!(scores[3], 0.0);
   }

   #[test]
   fn cosine_keeps_negative_scores() {
      let matrix = EmbeddingMatrix::from_rows(vec![vec![-1.0, 0.0]]).unwrap();
      let scores = cosine_scores(&matrix, &[1.0, 0.0]).unwrap();
      assert!((scores[0] + 1.0).abs() < 1e-6);
   }

   #[test]
   fn cosine_rejects_dimension_mismatch() {
      let matrix = EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0]]).unwrap();
      let err = cosine_scores(&matrix, &[1.0, 0.0, 0.0]).unwrap_err();
      assert!(matches!(err, Error::DimensionMismatch { expected: 2, got: 3 }));
   }

   #[test]
   fn semantic_sorts_truncates_and_ranks() {
      let petitions = sample();
      let results = semantic(&petitions, &[0.2, 0.9, -0.1, 0.5], &SearchFilters::default(), 3);

      let titles: Vec<_> = results.iter().map(|r| r.petition.title.as_str()).collect();
      assert_eq!(titles, ["Plant more trees", "Ban fireworks", "Save the bees"]);
      let ranks: Vec<_> = results.iter().map(|r| r.rank).collect();
      assert_eq!(ranks, [1, 2, 3]);
   }

   #[test]
   fn semantic_keeps_all_scores_including_negative() {
      let petitions = sample();
      let results = semantic(&petitions, &[-0.3, -0.2, -0.9, 0.0], &SearchFilters::default(), 10);
      assert_eq!(results.len(), 4);
      assert_eq!(results.last().unwrap().petition.title, "Save local libraries");
   }

   #[test]
   fn ties_keep_dataset_order() {
      let petitions = sample();
      let results = semantic(&petitions, &[0.5, 0.5, 0.5, 0.5], &SearchFilters::default(), 4);
      let titles: Vec<_> = results.iter().map(|r| r.petition.title.as_str()).collect();
      assert_eq!(titles, [
         "Save the bees",
         "Plant more trees",
         "Save local libraries",
         "Ban fireworks"
      ]);
   }

   #[test]
   fn filters_apply_before_ranking() {
      let petitions = sample();
      let filters = SearchFilters { state: Some("Open".to_string()), ..Default::default() };
      let results = semantic(&petitions, &[0.1, 0.9, 0.8, 0.7], &filters, 1);

      assert_eq!(results.len(), 1);
      assert_eq!(results[0].petition.title, "Save local libraries");
      assert_eq!(results[0].rank, 1);

      let filters = SearchFilters { min_signatures: Some(100), ..Default::default() };
      let results = semantic(&petitions, &[0.1, 0.2, 0.9, 0.9], &filters, 10);
      assert!(results.iter().all(|r| r.petition.signatures >= 100));
      assert_eq!(results.len(), 2);
   }

   #[test]
   fn zero_top_k_returns_nothing() {
      let petitions = sample();
      assert!(semantic(&petitions, &[0.1; 4], &SearchFilters::default(), 0).is_empty());
   }

   #[test]
   fn nan_scores_sort_last() {
      let petitions = sample();
      let results = semantic(&petitions, &[f32::NAN, 0.1, 0.3, 0.2], &SearchFilters::default(), 4);
      assert_eq!(results[0].petition.title, "Save local libraries");
      assert!(results[3].similarity_score.is_nan());
   }

   #[test]
   fn keyword_scores_overlap_fraction_and_drops_misses() {
      let petitions = sample();
      let results = keyword(&petitions, "save the trees", &SearchFilters::default(), 10);

      assert_eq!(results.len(), 3);
      assert_eq!(results[0].petition.title, "Save the bees");
      assert!((results[0].similarity_score - 2.0 / 3.0).abs() < 1e-6);
      assert!(results.iter().all(|r| r.similarity_score > 0.0));
      assert!(results.iter().all(|r| r.petition.title != "Ban fireworks"));
   }

   #[test]
   fn keyword_is_case_insensitive() {
      let petitions = sample();
      let results = keyword(&petitions, "FIREWORKS", &SearchFilters::default(), 10);
      assert_eq!(results.len(), 1);
      assert_eq!(results[0].similarity_score, 1.0);
   }

   #[test]
   fn keyword_respects_filters() {
      let petitions = sample();
      let filters = SearchFilters::state("closed");
      let results = keyword(&petitions, "save trees", &filters, 10);
      assert_eq!(results.len(), 1);
      assert_eq!(results[0].petition.title, "Plant more trees");
   }
}
