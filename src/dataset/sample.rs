use crate::types::{Petition, PetitionState};

const SAMPLE: [(&str, u32, PetitionState, u64); 10] = [
   ("Increase funding for renewable energy research and development", 700001, PetitionState::Open, 45678),
   ("Ban single-use plastics in all UK supermarkets by 2026", 700002, PetitionState::Open, 123456),
   ("Improve mental health support in schools", 700003, PetitionState::Open, 87234),
   ("Make climate change education mandatory in schools", 700004, PetitionState::Closed, 234567),
   ("Fund reconstruction surgery and psychosexual therapy for FGM survivors", 700005, PetitionState::Closed, 939),
   ("Reduce university tuition fees to £3000 per year", 700006, PetitionState::Open, 567890),
   ("Protect green belt land from housing development", 700007, PetitionState::Open, 34567),
   ("Increase NHS funding by 10% annually", 700008, PetitionState::Closed, 456789),
   ("Ban the sale of fireworks to the public", 700009, PetitionState::Open, 23456),
   ("Implement a four-day working week pilot scheme", 700010, PetitionState::Open, 98765),
];

/// The canned dataset served when no usable source exists. Titles are raw;
/// the loader normalizes them like any other source.
pub fn petitions() -> Vec<Petition> {
   SAMPLE
      .into_iter()
      .map(|(title, id, state, signatures)| Petition {
         title: title.to_string(),
         url: format!("https://petition.parliament.uk/petitions/{id}"),
         state,
         signatures,
      })
      .collect()
}
