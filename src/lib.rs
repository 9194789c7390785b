//! Semantic search and analytics over a petition dataset.
//!
//! [`SearchEngine`] loads petitions through [`dataset`], embeds their titles
//! with an [`embed::Encoder`], keeps the vectors in an [`store::EmbeddingStore`]
//! backed by a JSON cache, and answers ranked searches and aggregate queries.

pub mod config;
pub mod dataset;
pub mod embed;
pub mod error;
pub mod search;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use search::SearchEngine;
pub use types::{
   AnalyticsReport, HealthReport, HealthStatus, Petition, PetitionState, SearchFilters,
   SearchResult, SearchStrategy, StatisticsReport,
};
