//! On-disk cache of the embedding matrix.
//!
//! Two shapes are accepted when reading: the current snapshot object holding
//! the petitions the matrix was generated from, and a legacy bare array of
//! vectors.

use std::{
   fs::{self, File},
   io::{BufReader, BufWriter, Write},
   path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::CacheError, types::Petition};

/// Current cache layout: the matrix plus the petitions it was generated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
   pub petitions:  Vec<Petition>,
   pub embeddings: Vec<Vec<f32>>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub model:      Option<String>,
}

#[derive(Debug, Clone)]
pub enum CacheRecord {
   Snapshot(Snapshot),
   /// Bare matrix written by older releases, without a petition snapshot.
   Legacy(Vec<Vec<f32>>),
}

impl CacheRecord {
   /// Picks the layout from the shape of the decoded document.
   pub fn from_value(value: Value) -> Result<Self, CacheError> {
      Ok(match value {
         Value::Array(_) => Self::Legacy(serde_json::from_value(value)?),
         other => Self::Snapshot(serde_json::from_value(other)?),
      })
   }
}

pub fn read(path: &Path) -> Result<CacheRecord, CacheError> {
   if !path.is_file() {
      return Err(CacheError::Missing(path.to_path_buf()));
   }
   let reader = BufReader::new(File::open(path)?);
   CacheRecord::from_value(serde_json::from_reader(reader)?)
}

/// Writes through a sibling temp file so readers never see a partial cache.
pub fn write(path: &Path, snapshot: &Snapshot) -> Result<(), CacheError> {
   if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
   {
      fs::create_dir_all(parent)?;
   }

   let tmp = temp_path(path);
   {
      let mut writer = BufWriter::new(File::create(&tmp)?);
      serde_json::to_writer(&mut writer, snapshot)?;
      writer.flush()?;
   }
   fs::rename(&tmp, path)?;
   Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
   let mut name = path.file_name().unwrap_or_default().to_os_string();
   name.push(".tmp");
   path.with_file_name(name)
}
