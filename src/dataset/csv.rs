//! Headed CSV reading and writing on top of `arrow-csv`.

use std::{collections::HashMap, fs::File, path::Path, sync::Arc};

use arrow_array::{Array, ArrayRef, RecordBatch, StringArray, UInt64Array, cast::AsArray};
use arrow_csv::{ReaderBuilder, WriterBuilder, reader::Format};
use arrow_schema::{DataType, Field, Schema};

use crate::{
   dataset::{
      columns::{self, first_match},
      normalize::{normalize_title, parse_signatures},
   },
   error::DataError,
   types::{Petition, PetitionState},
};

const BATCH_ROWS: usize = 1024;

/// Reads every record of a CSV file whose first line is a header row.
pub fn read(path: &Path) -> Result<Vec<Petition>, DataError> {
   let format = Format::default().with_header(true);
   let (inferred, _) = format.infer_schema(File::open(path)?, Some(0))?;

   // Every column is read as text; typing happens per field below.
   let fields: Vec<Field> = inferred
      .fields()
      .iter()
      .map(|f| Field::new(f.name(), DataType::Utf8, true))
      .collect();
   let schema = Arc::new(Schema::new(fields));

   let reader = ReaderBuilder::new(schema)
      .with_header(true)
      .with_truncated_rows(true)
      .with_batch_size(BATCH_ROWS)
      .build(File::open(path)?)?;

   let mut petitions = Vec::new();
   for batch in reader {
      let batch = batch?;
      append_batch(&batch, &mut petitions)?;
   }
   Ok(petitions)
}

fn append_batch(batch: &RecordBatch, out: &mut Vec<Petition>) -> Result<(), DataError> {
   let schema = batch.schema();
   let mut columns: HashMap<String, &StringArray> = HashMap::new();
   for (field, column) in schema.fields().iter().zip(batch.columns()) {
      columns
         .entry(columns::header_key(field.name()))
         .or_insert_with(|| column.as_string::<i32>());
   }

   for i in 0..batch.num_rows() {
      let lookup = |name: &str| {
         columns
            .get(name)
            .filter(|col| !col.is_null(i))
            .map(|col| col.value(i))
      };

      let title = first_match(columns::TITLE, lookup).unwrap_or("");
      let url = first_match(columns::URL, lookup).unwrap_or("");
      let state = first_match(columns::STATE, lookup).unwrap_or("unknown");
      let raw_signatures = first_match(columns::SIGNATURES, lookup).unwrap_or("0");

      let row = out.len() + 1;
      let signatures = parse_signatures(raw_signatures)
         .ok_or_else(|| DataError::Signatures { row, value: raw_signatures.to_string() })?;

      out.push(Petition {
         title: normalize_title(title),
         url: url.to_string(),
         state: PetitionState::parse(state),
         signatures,
      });
   }
   Ok(())
}

/// Writes petitions as a headed CSV with the canonical column names.
pub fn write(path: &Path, petitions: &[Petition]) -> Result<(), DataError> {
   if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
   {
      std::fs::create_dir_all(parent)?;
   }

   let schema = Arc::new(Schema::new(vec![
      Field::new("title", DataType::Utf8, false),
      Field::new("url", DataType::Utf8, false),
      Field::new("state", DataType::Utf8, false),
      Field::new("signatures", DataType::UInt64, false),
   ]));

   let columns: Vec<ArrayRef> = vec![
      Arc::new(StringArray::from_iter_values(petitions.iter().map(|p| p.title.as_str()))),
      Arc::new(StringArray::from_iter_values(petitions.iter().map(|p| p.url.as_str()))),
      Arc::new(StringArray::from_iter_values(petitions.iter().map(|p| p.state.as_str()))),
      Arc::new(UInt64Array::from_iter_values(petitions.iter().map(|p| p.signatures))),
   ];
   let batch = RecordBatch::try_new(schema, columns)?;

   let mut writer = WriterBuilder::new()
      .with_header(true)
      .build(File::create(path)?);
   writer.write(&batch)?;
   Ok(())
}

#[cfg(test)]
mod tests {
   use tempfile::TempDir;

   use super::*;

   #[test]
   fn reads_aliased_columns() {
      let dir = TempDir::new().unwrap();
      let path = dir.path().join("p.csv");
      std::fs::write(
         &path,
         "Petition,Link,Status,signature_count\n\
          Save the  bees,https://example.org/1,Open,\"1,234\"\n\
          Plant trees,https://example.org/2,CLOSED,7\n",
      )
      .unwrap();

      let petitions = read(&path).unwrap();
      assert_eq!(petitions.len(), 2);
      assert_eq!(petitions[0].title, "Save the bees");
      assert_eq!(petitions[0].url, "https://example.org/1");
      assert_eq!(petitions[0].state, PetitionState::Open);
      assert_eq!(petitions[0].signatures, 1234);
      assert_eq!(petitions[1].state, PetitionState::Closed);
   }

   #[test]
   fn missing_columns_use_defaults() {
      let dir = TempDir::new().unwrap();
      let path = dir.path().join("p.csv");
      std::fs::write(&path, "title,notes\nJust a title,whatever\n").unwrap();

      let petitions = read(&path).unwrap();
      assert_eq!(petitions.len(), 1);
      assert_eq!(petitions[0].url, "");
      assert_eq!(petitions[0].state, PetitionState::Unknown);
      assert_eq!(petitions[0].signatures, 0);
   }

   #[test]
   fn short_rows_default_missing_fields() {
      let dir = TempDir::new().unwrap();
      let path = dir.path().join("p.csv");
      std::fs::write(
         &path,
         "title,url,state,signatures
          Lower bus fares,https://x.org/1,open
          Save owls,https://x.org/2,open,5
          Fix roads
",
      )
      .unwrap();

      let petitions = read(&path).unwrap();
      assert_eq!(petitions.len(), 3);
      assert_eq!(petitions[0].title, "Lower bus fares");
      assert_eq!(petitions[0].signatures, 0);
      assert_eq!(petitions[1].signatures, 5);
      assert_eq!(petitions[2].url, "");
      assert_eq!(petitions[2].state, PetitionState::Unknown);
   }

   #[test]
   fn bad_signature_count_fails_the_load() {
      let dir = TempDir::new().unwrap();
      let path = dir.path().join("p.csv");
      std::fs::write(&path, "title,url,state,signatures\nA,u,open,lots\n").unwrap();

      let err = read(&path).unwrap_err();
      assert!(matches!(err, DataError::Signatures { row: 1, .. }));
   }

   #[test]
   fn write_then_read_preserves_records() {
      let dir = TempDir::new().unwrap();
      let path = dir.path().join("nested").join("p.csv");
      let petitions = vec![
         Petition {
            title:      "Ban fireworks, please".to_string(),
            url:        "https://example.org/9".to_string(),
            state:      PetitionState::Open,
            signatures: 23456,
         },
         Petition {
            title:      "Keep libraries open".to_string(),
            url:        "https://example.org/10".to_string(),
            state:      PetitionState::Rejected,
            signatures: 12,
         },
      ];

      write(&path, &petitions).unwrap();
      let header = std::fs::read_to_string(&path).unwrap();
      assert!(header.starts_with("title,url,state,signatures"));

      assert_eq!(read(&path).unwrap(), petitions);
   }
}
