use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the search engine to its callers.
#[derive(Debug, Error)]
pub enum Error {
   #[error("query cannot be empty")]
   EmptyQuery,

   #[error("query is too long ({len} characters, max {max})")]
   QueryTooLong { len: usize, max: usize },

   #[error("embeddings not loaded, search engine not ready")]
   NotReady,

   #[error("search engine unavailable: {0}")]
   Unavailable(String),

   #[error("encoder failed: {0}")]
   Encoder(String),

   #[error("query vector has {got} dimensions, index has {expected}")]
   DimensionMismatch { expected: usize, got: usize },

   #[error("invalid configuration: {0}")]
   InvalidConfig(String),

   #[error(transparent)]
   Config(#[from] Box<figment::Error>),

   #[error(transparent)]
   Io(#[from] std::io::Error),

   #[error(transparent)]
   Json(#[from] serde_json::Error),
}

/// Coarse classification of [`Error`] for caller-facing signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
   Validation,
   NotReady,
   Unavailable,
   Internal,
}

impl Error {
   pub const fn kind(&self) -> ErrorKind {
      match self {
         Self::EmptyQuery | Self::QueryTooLong { .. } => ErrorKind::Validation,
         Self::NotReady => ErrorKind::NotReady,
         Self::Unavailable(_) => ErrorKind::Unavailable,
         _ => ErrorKind::Internal,
      }
   }

   pub(crate) fn encoder(context: &str, err: impl std::fmt::Display) -> Self {
      Self::Encoder(format!("{context}: {err}"))
   }
}

impl From<figment::Error> for Error {
   fn from(err: figment::Error) -> Self {
      Self::Config(Box::new(err))
   }
}

/// Failure to read the petition source. Always recovered by the sample
/// dataset fallback.
#[derive(Debug, Error)]
pub enum DataError {
   #[error("dataset not found at {}", .0.display())]
   Missing(PathBuf),

   #[error("failed to read dataset: {0}")]
   Io(#[from] std::io::Error),

   #[error("malformed csv: {0}")]
   Csv(#[from] arrow_schema::ArrowError),

   #[error("invalid signature count {value:?} on row {row}")]
   Signatures { row: usize, value: String },
}

/// Failure to use the embeddings cache artifact. Always recovered by
/// regenerating the embeddings.
#[derive(Debug, Error)]
pub enum CacheError {
   #[error("no cache at {}", .0.display())]
   Missing(PathBuf),

   #[error("failed to access cache: {0}")]
   Io(#[from] std::io::Error),

   #[error("corrupt cache: {0}")]
   Corrupt(#[from] serde_json::Error),

   #[error("cache holds {cached} petitions, dataset has {current}")]
   CountMismatch { cached: usize, current: usize },

   #[error("cache holds {rows} vectors for {petitions} petitions")]
   RowMismatch { rows: usize, petitions: usize },

   #[error("cache was built by {cached}, encoder is {current}")]
   ModelMismatch { cached: String, current: String },

   #[error("cache rows have inconsistent dimensions")]
   Ragged,
}
