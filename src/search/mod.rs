pub mod analytics;
pub mod ranking;

use std::{sync::Arc, time::Instant};

use tracing::{error, info};

use crate::{
   config::Config,
   dataset,
   embed::{self, Encoder},
   error::{Error, Result},
   store::EmbeddingStore,
   types::{
      AnalyticsReport, HealthReport, HealthStatus, Petition, SearchFilters, SearchResult,
      StatisticsReport,
   },
};

/// Owns the petitions, their embeddings and the encoder, and answers every
/// query against them. Immutable once built, so it can be shared across
/// concurrent requests behind an `Arc`.
pub struct SearchEngine {
   config:    Config,
   petitions: Vec<Petition>,
   store:     EmbeddingStore,
   encoder:   Option<Arc<dyn Encoder>>,
   failure:   Option<String>,
}

impl SearchEngine {
   /// Builds the encoder named in `config` and initializes the engine. An
   /// encoder that fails to load leaves the engine permanently unavailable.
   pub async fn start(config: &Config) -> Self {
      match embed::from_config(config) {
         Ok(encoder) => Self::new(config, encoder).await,
         Err(e) => {
            error!(error = %e, "failed to load encoder");
            Self::unavailable(config, e.to_string())
         },
      }
   }

   /// Loads the dataset and prepares embeddings. Blocks until the index is
   /// built or restored.
   pub async fn new(config: &Config, encoder: Arc<dyn Encoder>) -> Self {
      let petitions = dataset::load(config);

      let (store, failure) =
         match EmbeddingStore::prepare(config, &petitions, encoder.as_ref()).await {
            Ok(store) => (store, None),
            Err(e) => {
               error!(error = %e, "failed to prepare embeddings");
               (EmbeddingStore::empty(petitions.len()), Some(e.to_string()))
            },
         };

      let engine =
         Self { config: config.clone(), petitions, store, encoder: Some(encoder), failure };
      info!(
         petitions = engine.petitions.len(),
         ready = engine.is_ready(),
         "search engine initialized"
      );
      engine
   }

   /// An engine that rejects every operation with [`Error::Unavailable`].
   pub fn unavailable(config: &Config, reason: impl Into<String>) -> Self {
      Self {
         config:    config.clone(),
         petitions: Vec::new(),
         store:     EmbeddingStore::empty(0),
         encoder:   None,
         failure:   Some(reason.into()),
      }
   }

   pub fn is_ready(&self) -> bool {
      self.failure.is_none() && !self.petitions.is_empty() && self.store.is_ready()
   }

   pub const fn config(&self) -> &Config {
      &self.config
   }

   pub const fn store(&self) -> &EmbeddingStore {
      &self.store
   }

   /// Semantic search: every petition passing `filters`, ordered by cosine
   /// similarity to `query`, at most `top_k` long.
   pub async fn search(
      &self,
      query: &str,
      top_k: usize,
      filters: &SearchFilters,
   ) -> Result<Vec<SearchResult>> {
      self.validate_query(query)?;
      let start = Instant::now();

      let scores = self.score_all(query).await?;
      let results = ranking::semantic(&self.petitions, &scores, filters, self.cap(top_k));

      info!(
         query,
         results = results.len(),
         elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
         "search completed"
      );
      Ok(results)
   }

   /// Token-overlap search for degraded operation; needs no embeddings.
   pub fn keyword_search(
      &self,
      query: &str,
      top_k: usize,
      filters: &SearchFilters,
   ) -> Result<Vec<SearchResult>> {
      self.validate_query(query)?;
      self.check_available()?;
      info!(query, "using keyword search");
      Ok(ranking::keyword(&self.petitions, query, filters, self.cap(top_k)))
   }

   pub fn get_all_petitions(
      &self,
      offset: usize,
      limit: usize,
      state_filter: Option<&str>,
   ) -> Result<Vec<&Petition>> {
      self.check_available()?;
      Ok(self
         .filtered(state_filter)
         .skip(offset)
         .take(limit)
         .collect())
   }

   pub fn get_petition_count(&self, state_filter: Option<&str>) -> Result<usize> {
      self.check_available()?;
      Ok(self.filtered(state_filter).count())
   }

   pub fn statistics(&self) -> Result<StatisticsReport> {
      self.check_available()?;
      Ok(analytics::statistics(&self.petitions))
   }

   /// Breakdown of the petitions whose similarity to `query` is at least
   /// `threshold`.
   pub async fn analytics(&self, query: &str, threshold: f32) -> Result<AnalyticsReport> {
      self.validate_query(query)?;
      let scores = self.score_all(query).await?;
      Ok(analytics::analytics(&self.petitions, &scores, query, threshold))
   }

   pub fn health(&self) -> HealthReport {
      let ready = self.is_ready();
      HealthReport {
         status:            if ready {
            HealthStatus::Healthy
         } else {
            HealthStatus::Unhealthy
         },
         total_petitions:   self.petitions.len(),
         embeddings_loaded: self.store.is_ready(),
         model:             self.encoder.as_ref().map(|e| e.model_id().to_string()),
         error:             self.failure.clone(),
      }
   }

   fn validate_query(&self, query: &str) -> Result<()> {
      if query.trim().is_empty() {
         return Err(Error::EmptyQuery);
      }
      let len = query.chars().count();
      if len > self.config.max_query_length {
         return Err(Error::QueryTooLong { len, max: self.config.max_query_length });
      }
      Ok(())
   }

   fn check_available(&self) -> Result<()> {
      match &self.failure {
         Some(reason) => Err(Error::Unavailable(reason.clone())),
         None => Ok(()),
      }
   }

   /// Encodes `query` and scores it against every petition.
   async fn score_all(&self, query: &str) -> Result<Vec<f32>> {
      self.check_available()?;
      if !self.is_ready() {
         return Err(Error::NotReady);
      }
      let matrix = self.store.ready_matrix()?;
      let encoder = self.encoder.as_ref().ok_or(Error::NotReady)?;

      let query_vector = encoder.encode_query(query).await?;
      ranking::cosine_scores(matrix, &query_vector)
   }

   fn filtered<'a, 's>(
      &'a self,
      state_filter: Option<&'s str>,
   ) -> impl Iterator<Item = &'a Petition> + use<'a, 's> {
      self
         .petitions
         .iter()
         .filter(move |p| state_filter.is_none_or(|s| p.state.matches(s)))
   }

   fn cap(&self, top_k: usize) -> usize {
      top_k.min(self.config.max_limit)
   }
}
