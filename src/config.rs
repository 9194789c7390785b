use std::path::{Path, PathBuf};

use directories::BaseDirs;
use figment::{
   Figment,
   providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_MODEL: &str = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";

pub const DEFAULT_BATCH_SIZE: usize = 48;
pub const MAX_BATCH_SIZE: usize = 96;

pub const DEFAULT_HASHING_DIM: usize = 384;

pub const ENV_PREFIX: &str = "PETSEARCH_";
pub const CONFIG_FILE: &str = "petsearch.toml";

pub fn data_dir() -> PathBuf {
   BaseDirs::new().map_or_else(
      || PathBuf::from(".petsearch"),
      |dirs| dirs.home_dir().join(".petsearch"),
   )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
   #[default]
   Candle,
   Hashing,
}

/// Engine settings, resolved once at startup and handed to every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
   pub csv_path:         PathBuf,
   pub cache_path:       PathBuf,
   pub model:            String,
   pub encoder:          EncoderKind,
   pub batch_size:       usize,
   pub default_limit:    usize,
   pub max_limit:        usize,
   pub min_similarity:   f32,
   pub max_query_length: usize,
   pub hashing_dim:      usize,
}

impl Default for Config {
   fn default() -> Self {
      Self::in_dir(&data_dir())
   }
}

impl Config {
   /// Defaults with the dataset and cache placed under `dir`.
   pub fn in_dir(dir: &Path) -> Self {
      Self {
         csv_path:         dir.join("petitions.csv"),
         cache_path:       dir.join("embeddings_cache.json"),
         model:            DEFAULT_MODEL.to_string(),
         encoder:          EncoderKind::Candle,
         batch_size:       DEFAULT_BATCH_SIZE,
         default_limit:    10,
         max_limit:        50,
         min_similarity:   0.1,
         max_query_length: 500,
         hashing_dim:      DEFAULT_HASHING_DIM,
      }
   }

   /// Layers defaults, the TOML file and `PETSEARCH_*` environment variables.
   ///
   /// Without an explicit `file`, `petsearch.toml` in the data directory is
   /// used when present.
   pub fn load(file: Option<&Path>) -> Result<Self> {
      let file = file.map_or_else(|| data_dir().join(CONFIG_FILE), Path::to_path_buf);
      Self::figment(&file).extract::<Self>()?.validated()
   }

   pub fn figment(file: &Path) -> Figment {
      Figment::from(Serialized::defaults(Self::default()))
         .merge(Toml::file(file))
         .merge(Env::prefixed(ENV_PREFIX))
   }

   pub fn validated(mut self) -> Result<Self> {
      self.validate()?;
      self.batch_size = self.batch_size.clamp(1, MAX_BATCH_SIZE);
      Ok(self)
   }

   pub fn validate(&self) -> Result<()> {
      let mut errors = Vec::new();

      if self.max_limit == 0 {
         errors.push("max_limit must be at least 1".to_string());
      }
      if self.default_limit > self.max_limit {
         errors.push(format!(
            "default_limit {} exceeds max_limit {}",
            self.default_limit, self.max_limit
         ));
      }
      if !(-1.0..=1.0).contains(&self.min_similarity) {
         errors.push(format!("min_similarity {} is outside [-1, 1]", self.min_similarity));
      }
      if self.hashing_dim == 0 {
         errors.push("hashing_dim must be at least 1".to_string());
      }

      if errors.is_empty() {
         Ok(())
      } else {
         Err(Error::InvalidConfig(errors.join("; ")))
      }
   }

   /// Clamps a requested result count to the configured maximum.
   pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
      requested.unwrap_or(self.default_limit).min(self.max_limit)
   }
}
