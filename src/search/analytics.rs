//! Dataset statistics and query-conditioned analytics.

use crate::{
   dataset::normalize::truncate_chars,
   types::{
      AnalyticsReport, Petition, PetitionState, StatisticsReport, StatusBreakdown, TopPetition,
   },
};

pub const TOP_RELATED: usize = 10;
pub const DISPLAY_TITLE_CHARS: usize = 45;

pub fn statistics(petitions: &[Petition]) -> StatisticsReport {
   let count = |state: PetitionState| petitions.iter().filter(|p| p.state == state).count();
   let total_signatures: u64 = petitions.iter().map(|p| p.signatures).sum();

   // First occurrence wins on equal counts.
   let most_signed = petitions.iter().fold(None::<&Petition>, |best, p| match best {
      Some(b) if b.signatures >= p.signatures => Some(b),
      _ => Some(p),
   });

   StatisticsReport {
      total_petitions: petitions.len(),
      open_petitions: count(PetitionState::Open),
      closed_petitions: count(PetitionState::Closed),
      rejected_petitions: count(PetitionState::Rejected),
      total_signatures,
      average_signatures: average(total_signatures, petitions.len()),
      most_signed: most_signed.cloned(),
   }
}

/// Summarises the petitions scoring at least `threshold` against `query`.
/// `scores` must be index-aligned with `petitions`.
pub fn analytics(
   petitions: &[Petition],
   scores: &[f32],
   query: &str,
   threshold: f32,
) -> AnalyticsReport {
   let related: Vec<(&Petition, f32)> = petitions
      .iter()
      .zip(scores.iter().copied())
      .filter(|&(_, score)| score >= threshold)
      .collect();

   let mut status_breakdown = StatusBreakdown::default();
   for (petition, _) in &related {
      match petition.state {
         PetitionState::Open => status_breakdown.open += 1,
         PetitionState::Closed => status_breakdown.closed += 1,
         PetitionState::Rejected => status_breakdown.rejected += 1,
         _ => {},
      }
   }

   let mut by_signatures = related.clone();
   by_signatures.sort_by(|a, b| b.0.signatures.cmp(&a.0.signatures));

   let top_petitions = by_signatures
      .into_iter()
      .take(TOP_RELATED)
      .map(|(petition, score)| TopPetition {
         title:            truncate_chars(&petition.title, DISPLAY_TITLE_CHARS),
         url:              petition.url.clone(),
         state:            petition.state.clone(),
         signatures:       petition.signatures,
         similarity_score: score,
      })
      .collect();

   AnalyticsReport {
      query: query.to_string(),
      threshold,
      total_petitions: petitions.len(),
      related_petitions: related.len(),
      percentage_related: percentage(related.len(), petitions.len()),
      status_breakdown,
      top_petitions,
   }
}

fn average(total: u64, count: usize) -> f64 {
   if count == 0 { 0.0 } else { total as f64 / count as f64 }
}

fn percentage(part: usize, whole: usize) -> f64 {
   if whole == 0 {
      0.0
   } else {
      round2(part as f64 / whole as f64 * 100.0)
   }
}

/// Two-decimal rounding, ties to even.
pub fn round2(value: f64) -> f64 {
   (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
   use super::*;

   fn make_petition(title: &str, state: PetitionState, signatures: u64) -> Petition {
      Petition { title: title.to_string(), url: String::new(), state, signatures }
   }

   fn sample() -> Vec<Petition> {
      vec![
         make_petition("Short", PetitionState::Open, 10),
         make_petition("Tie one", PetitionState::Closed, 500),
         make_petition("Tie two", PetitionState::Open, 500),
         make_petition("Rejected one", PetitionState::Rejected, 0),
         make_petition("Odd", PetitionState::Other("debated".to_string()), 90),
      ]
   }

   #[test]
   fn statistics_counts_and_sums() {
      let stats = statistics(&sample());
      assert_eq!(stats.total_petitions, 5);
      assert_eq!(stats.open_petitions, 2);
      assert_eq!(stats.closed_petitions, 1);
      assert_eq!(stats.rejected_petitions, 1);
      assert!(stats.open_petitions + stats.closed_petitions <= stats.total_petitions);
      assert_eq!(stats.total_signatures, 1100);
      assert!((stats.average_signatures - 220.0).abs() < 1e-9);
   }

   #[test]
   fn most_signed_prefers_first_on_ties() {
      let stats = statistics(&sample());
      assert_eq!(stats.most_signed.unwrap().title, "Tie one");
   }

   #[test]
   fn statistics_of_empty_dataset() {
      let stats = statistics(&[]);
      assert_eq!(stats.total_petitions, 0);
      assert_eq!(stats.average_signatures, 0.0);
      assert!(stats.most_signed.is_none());
   }

   #[test]
   fn analytics_threshold_is_inclusive() {
      let report = analytics(&sample(), &[0.5, 0.2, 0.49, 0.9, 0.1], "q", 0.5);
      assert_eq!(report.related_petitions, 2);
      assert_eq!(report.total_petitions, 5);
      assert_eq!(report.percentage_related, 40.0);
      assert_eq!(report.status_breakdown, StatusBreakdown { open: 1, closed: 0, rejected: 1 });
   }

   #[test]
   fn analytics_percentage_is_rounded() {
      let petitions: Vec<_> =
         (0..3).map(|i| make_petition(&i.to_string(), PetitionState::Open, i)).collect();
      let report = analytics(&petitions, &[1.0, 0.0, 0.0], "q", 0.5);
      assert_eq!(report.percentage_related, 33.33);
      assert_eq!(report.percentage_related, round2(1.0 / 3.0 * 100.0));
   }

   #[test]
   fn percentage_ties_round_to_even() {
      let petitions: Vec<_> =
         (0..32u64).map(|i| make_petition(&i.to_string(), PetitionState::Open, i)).collect();
      let mut scores = vec![0.0; 32];
      scores[0] = 1.0;

      let report = analytics(&petitions, &scores, "q", 0.5);
      assert_eq!(report.percentage_related, 3.12);
      assert_eq!(round2(0.125), 0.12);
   }

   #[test]
   fn analytics_of_empty_dataset() {
      let report = analytics(&[], &[], "q", 0.0);
      assert_eq!(report.related_petitions, 0);
      assert_eq!(report.percentage_related, 0.0);
      assert!(report.top_petitions.is_empty());
   }

   #[test]
   fn top_related_sorted_by_signatures_and_capped() {
      let petitions: Vec<_> = (0..15u64)
         .map(|i| make_petition(&format!("Petition {i}"), PetitionState::Open, i * 10))
         .collect();
      let scores = vec![0.8; 15];
      let report = analytics(&petitions, &scores, "q", 0.5);

      assert_eq!(report.top_petitions.len(), TOP_RELATED);
      assert_eq!(report.top_petitions[0].signatures, 140);
      assert!(
         report
            .top_petitions
            .windows(2)
            .all(|w| w[0].signatures >= w[1].signatures)
      );
   }

   #[test]
   fn top_related_titles_are_truncated_for_display() {
      let long = "A very long petition title that keeps going well past the limit";
      let petitions = vec![make_petition(long, PetitionState::Open, 1)];
      let report = analytics(&petitions, &[1.0], "q", 0.5);

      let title = &report.top_petitions[0].title;
      assert_eq!(title.chars().count(), DISPLAY_TITLE_CHARS + 3);
      assert!(title.ends_with("..."));
      assert!(long.starts_with(title.trim_end_matches("...")));
   }
}
