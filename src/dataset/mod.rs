//! Petition dataset ingestion.
//!
//! Sources are either a headed CSV (columns matched through
//! [`columns`] aliases) or header-less lines parsed by [`plain`]. Any failure
//! to read a source falls back to the canned [`sample`] dataset, which is
//! written back to the source path for the next start.

pub mod columns;
pub mod csv;
pub mod normalize;
pub mod plain;
pub mod sample;

use std::{
   fs::File,
   io::{BufRead, BufReader},
   path::Path,
};

use tracing::{info, warn};

use crate::{config::Config, error::DataError, types::Petition};

/// Loads the configured dataset, never failing.
pub fn load(config: &Config) -> Vec<Petition> {
   load_from(&config.csv_path)
}

pub fn load_from(path: &Path) -> Vec<Petition> {
   info!(path = %path.display(), "loading petition data");

   match read(path) {
      Ok(petitions) => {
         info!(count = petitions.len(), "loaded petitions");
         petitions
      },
      Err(DataError::Missing(_)) => {
         warn!(path = %path.display(), "petition data not found, creating sample data");
         sample_fallback(path)
      },
      Err(e) => {
         warn!(error = %e, "failed to load petition data, using sample data");
         sample_fallback(path)
      },
   }
}

/// Reads a source file, choosing the parser from its first line.
pub fn read(path: &Path) -> Result<Vec<Petition>, DataError> {
   if !path.is_file() {
      return Err(DataError::Missing(path.to_path_buf()));
   }

   let mut first_line = String::new();
   BufReader::new(File::open(path)?).read_line(&mut first_line)?;

   if first_line.trim().is_empty() {
      return Ok(Vec::new());
   }

   if has_header(&first_line) {
      csv::read(path)
   } else {
      plain::read(&std::fs::read_to_string(path)?)
   }
}

/// A first line without anything URL-like is taken to be a header row.
pub fn has_header(first_line: &str) -> bool {
   !first_line.to_lowercase().contains("http")
}

fn sample_fallback(path: &Path) -> Vec<Petition> {
   let raw = sample::petitions();

   match csv::write(path, &raw) {
      Ok(()) => info!(path = %path.display(), "sample data saved"),
      Err(e) => warn!(path = %path.display(), error = %e, "could not save sample data"),
   }

   raw.into_iter()
      .map(|p| Petition { title: normalize::normalize_title(&p.title), ..p })
      .collect()
}
