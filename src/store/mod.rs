//! Embedding matrix aligned with the petition sequence, restored from the
//! cache artifact when possible and regenerated through the encoder
//! otherwise.

pub mod cache;
pub mod lock;

use std::{path::Path, time::Instant};

use ndarray::{Array2, ArrayView2};
use tracing::{info, warn};

pub use cache::{CacheRecord, Snapshot};
pub use lock::CacheLock;

use crate::{
   config::Config,
   embed::Encoder,
   error::{CacheError, Error, Result},
   types::Petition,
};

/// Dense row-major matrix of embeddings with cached row norms.
#[derive(Debug, Clone)]
pub struct EmbeddingMatrix {
   data:  Array2<f32>,
   norms: Vec<f32>,
}

impl EmbeddingMatrix {
   /// Builds a matrix from rows of equal length. Returns `None` for ragged
   /// input.
   pub fn from_rows(rows: Vec<Vec<f32>>) -> Option<Self> {
      let n = rows.len();
      let dim = rows.first().map_or(0, Vec::len);
      if rows.iter().any(|r| r.len() != dim) {
         return None;
      }

      let flat: Vec<f32> = rows.into_iter().flatten().collect();
      let data = Array2::from_shape_vec((n, dim), flat).ok()?;
      let norms = data
         .rows()
         .into_iter()
         .map(|row| row.dot(&row).sqrt())
         .collect();

      Some(Self { data, norms })
   }

   pub fn len(&self) -> usize {
      self.data.nrows()
   }

   pub fn is_empty(&self) -> bool {
      self.len() == 0
   }

   pub fn dim(&self) -> usize {
      self.data.ncols()
   }

   pub fn view(&self) -> ArrayView2<'_, f32> {
      self.data.view()
   }

   pub fn norms(&self) -> &[f32] {
      &self.norms
   }

   pub fn to_rows(&self) -> Vec<Vec<f32>> {
      self.data.rows().into_iter().map(|row| row.to_vec()).collect()
   }
}

/// Where the held matrix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingSource {
   Cache,
   LegacyCache,
   Generated,
}

#[derive(Debug)]
pub struct EmbeddingStore {
   matrix:   Option<EmbeddingMatrix>,
   expected: usize,
   source:   Option<EmbeddingSource>,
}

impl EmbeddingStore {
   /// A store holding nothing; never ready.
   pub const fn empty(expected: usize) -> Self {
      Self { matrix: None, expected, source: None }
   }

   /// Restores the matrix from the configured cache, or regenerates and
   /// persists it. Cache problems are logged and recovered; only encoder
   /// failures are returned.
   pub async fn prepare(
      config: &Config,
      petitions: &[Petition],
      encoder: &dyn Encoder,
   ) -> Result<Self> {
      let model = encoder.model_id();
      match restore(config, petitions, model) {
         Ok((matrix, source)) => {
            info!(rows = matrix.len(), ?source, "loaded embeddings from cache");
            return Ok(Self::holding(matrix, petitions.len(), source));
         },
         Err(CacheError::Missing(path)) => {
            info!(path = %path.display(), "no embeddings cache, generating");
         },
         Err(e) => warn!(error = %e, "could not use cached embeddings, regenerating"),
      }

      let lock = lock_cache(&config.cache_path).await;

      // Another process may have written the cache while we waited.
      if lock.is_some()
         && let Ok((matrix, source)) = restore(config, petitions, model)
      {
         info!(rows = matrix.len(), "embeddings cached by another process");
         return Ok(Self::holding(matrix, petitions.len(), source));
      }

      let matrix = generate(petitions, encoder).await?;

      let snapshot = Snapshot {
         petitions:  petitions.to_vec(),
         embeddings: matrix.to_rows(),
         model:      Some(model.to_string()),
      };
      match cache::write(&config.cache_path, &snapshot) {
         Ok(()) => info!(path = %config.cache_path.display(), "cached embeddings for future use"),
         Err(e) => warn!(error = %e, "could not cache embeddings"),
      }

      Ok(Self::holding(matrix, petitions.len(), EmbeddingSource::Generated))
   }

   const fn holding(matrix: EmbeddingMatrix, expected: usize, source: EmbeddingSource) -> Self {
      Self { matrix: Some(matrix), expected, source: Some(source) }
   }

   /// True once a matrix with one row per petition is held.
   pub fn is_ready(&self) -> bool {
      self.matrix.as_ref().is_some_and(|m| m.len() == self.expected)
   }

   pub fn matrix(&self) -> Option<&EmbeddingMatrix> {
      self.matrix.as_ref()
   }

   /// The matrix, only when aligned with the petitions.
   pub fn ready_matrix(&self) -> Result<&EmbeddingMatrix> {
      self
         .matrix
         .as_ref()
         .filter(|m| m.len() == self.expected)
         .ok_or(Error::NotReady)
   }

   pub const fn source(&self) -> Option<EmbeddingSource> {
      self.source
   }
}

/// Takes the cache lock off the async workers. Failure to lock is logged and
/// generation proceeds unlocked.
async fn lock_cache(cache_path: &Path) -> Option<CacheLock> {
   let path = cache_path.to_path_buf();
   match tokio::task::spawn_blocking(move || CacheLock::acquire(&path)).await {
      Ok(Ok(lock)) => Some(lock),
      Ok(Err(e)) => {
         warn!(error = %e, "could not lock embeddings cache");
         None
      },
      Err(e) => {
         warn!(error = %e, "cache lock task failed");
         None
      },
   }
}

fn restore(
   config: &Config,
   petitions: &[Petition],
   model: &str,
) -> Result<(EmbeddingMatrix, EmbeddingSource), CacheError> {
   info!(path = %config.cache_path.display(), "loading cached embeddings");

   let (rows, source) = match cache::read(&config.cache_path)? {
      CacheRecord::Snapshot(snapshot) => {
         if snapshot.petitions.len() != petitions.len() {
            return Err(CacheError::CountMismatch {
               cached:  snapshot.petitions.len(),
               current: petitions.len(),
            });
         }
         if snapshot.embeddings.len() != petitions.len() {
            return Err(CacheError::RowMismatch {
               rows:      snapshot.embeddings.len(),
               petitions: petitions.len(),
            });
         }
         if let Some(cached) = snapshot.model
            && cached != model
         {
            return Err(CacheError::ModelMismatch { cached, current: model.to_string() });
         }
         // Titles are not part of validity; drift is reported, not acted on.
         let drifted = snapshot
            .petitions
            .iter()
            .zip(petitions)
            .filter(|(cached, current)| cached.title != current.title)
            .count();
         if drifted > 0 {
            warn!(drifted, "cached petition titles differ from dataset, serving cached embeddings");
         }
         (snapshot.embeddings, EmbeddingSource::Cache)
      },
      CacheRecord::Legacy(rows) => {
         if rows.len() != petitions.len() {
            warn!(
               rows = rows.len(),
               petitions = petitions.len(),
               "legacy cache does not match dataset size"
            );
         }
         (rows, EmbeddingSource::LegacyCache)
      },
   };

   let matrix = EmbeddingMatrix::from_rows(rows).ok_or(CacheError::Ragged)?;
   Ok((matrix, source))
}

async fn generate(petitions: &[Petition], encoder: &dyn Encoder) -> Result<EmbeddingMatrix> {
   info!(count = petitions.len(), model = encoder.model_id(), "generating embeddings");
   let start = Instant::now();

   let titles: Vec<String> = petitions.iter().map(|p| p.title.clone()).collect();
   let rows = encoder.encode(&titles).await?;

   if rows.len() != petitions.len() {
      return Err(Error::Encoder(format!(
         "encoder returned {} vectors for {} petitions",
         rows.len(),
         petitions.len()
      )));
   }
   let matrix = EmbeddingMatrix::from_rows(rows)
      .ok_or_else(|| Error::Encoder("encoder returned vectors of differing length".to_string()))?;

   info!(elapsed_ms = start.elapsed().as_millis() as u64, "generated embeddings");
   Ok(matrix)
}

#[cfg(test)]
mod tests {
   use tempfile::TempDir;

   use super::*;
   use crate::{embed::HashingEncoder, types::PetitionState};

   fn petitions(titles: &[&str]) -> Vec<Petition> {
      titles
         .iter()
         .map(|t| Petition {
            title:      (*t).to_string(),
            url:        String::new(),
            state:      PetitionState::Open,
            signatures: 1,
         })
         .collect()
   }

   #[test]
   fn matrix_rejects_ragged_rows() {
      assert!(EmbeddingMatrix::from_rows(vec![vec![1.0, 2.0], vec![1.0]]).is_none());
   }

   #[test]
   fn matrix_precomputes_norms() {
      let m = EmbeddingMatrix::from_rows(vec![vec![3.0, 4.0], vec![0.0, 0.0]]).unwrap();
      assert_eq!(m.len(), 2);
      assert_eq!(m.dim(), 2);
      assert_eq!(m.norms(), &[5.0, 0.0]);
      assert_eq!(m.to_rows(), vec![vec![3.0, 4.0], vec![0.0, 0.0]]);
   }

   #[test]
   fn empty_matrix_has_no_rows() {
      let m = EmbeddingMatrix::from_rows(Vec::new()).unwrap();
      assert!(m.is_empty());
   }

   #[tokio::test]
   async fn generates_then_restores_identical_matrix() {
      let dir = TempDir::new().unwrap();
      let config = Config::in_dir(dir.path());
      let items = petitions(&["save bees", "plant trees", "fix roads"]);
      let encoder = HashingEncoder::new(32);

      let first = EmbeddingStore::prepare(&config, &items, &encoder).await.unwrap();
      assert!(first.is_ready());
      assert_eq!(first.source(), Some(EmbeddingSource::Generated));
      assert!(config.cache_path.is_file());

      let second = EmbeddingStore::prepare(&config, &items, &encoder).await.unwrap();
      assert_eq!(second.source(), Some(EmbeddingSource::Cache));

      let a = first.matrix().unwrap().to_rows();
      let b = second.matrix().unwrap().to_rows();
      for (ra, rb) in a.iter().zip(&b) {
         for (x, y) in ra.iter().zip(rb) {
            assert!((x - y).abs() < 1e-6);
         }
      }
   }

   #[tokio::test]
   async fn corrupt_cache_is_regenerated() {
      let dir = TempDir::new().unwrap();
      let config = Config::in_dir(dir.path());
      std::fs::write(&config.cache_path, "garbage").unwrap();

      let store =
         EmbeddingStore::prepare(&config, &petitions(&["a b"]), &HashingEncoder::new(8))
            .await
            .unwrap();
      assert_eq!(store.source(), Some(EmbeddingSource::Generated));
      assert!(matches!(cache::read(&config.cache_path).unwrap(), CacheRecord::Snapshot(_)));
   }

   #[tokio::test]
   async fn legacy_cache_is_adopted_without_count_check() {
      let dir = TempDir::new().unwrap();
      let config = Config::in_dir(dir.path());
      std::fs::write(&config.cache_path, "[[1.0, 0.0]]").unwrap();

      let items = petitions(&["one", "two"]);
      let store = EmbeddingStore::prepare(&config, &items, &HashingEncoder::new(2))
         .await
         .unwrap();
      assert_eq!(store.source(), Some(EmbeddingSource::LegacyCache));
      assert!(!store.is_ready());
      assert!(matches!(store.ready_matrix(), Err(Error::NotReady)));
   }

   #[tokio::test]
   async fn snapshot_with_missing_rows_is_regenerated() {
      let dir = TempDir::new().unwrap();
      let config = Config::in_dir(dir.path());
      let items = petitions(&["one", "two", "three"]);
      let short = Snapshot {
         petitions:  items.clone(),
         embeddings: vec![vec![1.0, 0.0]],
         model:      None,
      };
      cache::write(&config.cache_path, &short).unwrap();

      let store = EmbeddingStore::prepare(&config, &items, &HashingEncoder::new(2))
         .await
         .unwrap();
      assert!(store.is_ready());
      assert_eq!(store.source(), Some(EmbeddingSource::Generated));

      let again = EmbeddingStore::prepare(&config, &items, &HashingEncoder::new(2))
         .await
         .unwrap();
      assert!(again.is_ready());
      assert_eq!(again.source(), Some(EmbeddingSource::Cache));
   }

   #[tokio::test]
   async fn cache_from_another_model_is_regenerated() {
      let dir = TempDir::new().unwrap();
      let config = Config::in_dir(dir.path());
      let items = petitions(&["save bees", "plant trees"]);

      EmbeddingStore::prepare(&config, &items, &HashingEncoder::new(16)).await.unwrap();
      let store = EmbeddingStore::prepare(&config, &items, &HashingEncoder::new(32))
         .await
         .unwrap();

      assert_eq!(store.source(), Some(EmbeddingSource::Generated));
      assert_eq!(store.matrix().unwrap().dim(), 32);
      match cache::read(&config.cache_path).unwrap() {
         CacheRecord::Snapshot(snapshot) => {
            assert_eq!(snapshot.model.as_deref(), Some("fnv1a-hashing-32"));
         },
         CacheRecord::Legacy(_) => panic!("expected a snapshot cache"),
      }
   }

   #[test]
   fn restore_checks_rows_and_model() {
      let dir = TempDir::new().unwrap();
      let config = Config::in_dir(dir.path());
      let items = petitions(&["a", "b"]);

      let mut snapshot = Snapshot {
         petitions:  items.clone(),
         embeddings: vec![vec![1.0]],
         model:      Some("model-a".to_string()),
      };
      cache::write(&config.cache_path, &snapshot).unwrap();
      assert!(matches!(
         restore(&config, &items, "model-a"),
         Err(CacheError::RowMismatch { rows: 1, petitions: 2 })
      ));

      snapshot.embeddings.push(vec![0.5]);
      cache::write(&config.cache_path, &snapshot).unwrap();
      assert!(matches!(
         restore(&config, &items, "model-b"),
         Err(CacheError::ModelMismatch { .. })
      ));
      assert!(restore(&config, &items, "model-a").is_ok());

      snapshot.model = None;
      cache::write(&config.cache_path, &snapshot).unwrap();
      assert!(restore(&config, &items, "model-b").is_ok());
   }

   #[tokio::test]
   async fn lock_is_taken_next_to_the_cache() {
      let dir = TempDir::new().unwrap();
      let cache_path = dir.path().join("nested").join("cache.json");

      let lock = lock_cache(&cache_path).await;
      assert!(lock.is_some());
      assert!(dir.path().join("nested").join("cache.json.lock").is_file());
   }

   #[test]
   fn empty_store_is_not_ready() {
      let store = EmbeddingStore::empty(3);
      assert!(!store.is_ready());
      assert!(store.matrix().is_none());
   }
}
