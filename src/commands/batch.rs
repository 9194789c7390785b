use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use console::style;
use futures::future::join_all;
use petsearch::{SearchFilters, SearchResult};
use serde::Serialize;

use super::{GlobalOptions, format_results, open_engine, print_json, timestamp};

#[derive(Debug, Serialize)]
struct QueryOutcome {
   query:   String,
   #[serde(skip_serializing_if = "Option::is_none")]
   results: Option<Vec<SearchResult>>,
   #[serde(skip_serializing_if = "Option::is_none")]
   error:   Option<String>,
}

#[derive(Debug, Serialize)]
struct JsonOutput {
   queries:   Vec<QueryOutcome>,
   timestamp: String,
}

/// Runs one semantic search per non-empty line of `file`, all in flight at
/// once against a single shared engine.
pub async fn execute(
   global: &GlobalOptions,
   file: PathBuf,
   max: Option<usize>,
   json: bool,
) -> Result<()> {
   let content = tokio::fs::read_to_string(&file)
      .await
      .with_context(|| format!("failed to read queries from {}", file.display()))?;
   let queries: Vec<String> = content
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(str::to_string)
      .collect();

   let (config, engine) = open_engine(global, json).await?;
   let engine = Arc::new(engine);
   let limit = config.clamp_limit(max);

   let tasks = queries.into_iter().map(|query| {
      let engine = Arc::clone(&engine);
      tokio::spawn(async move {
         let outcome = engine.search(&query, limit, &SearchFilters::default()).await;
         (query, outcome)
      })
   });

   let mut outcomes = Vec::new();
   for joined in join_all(tasks).await {
      let (query, outcome) = joined.context("search task panicked")?;
      outcomes.push(match outcome {
         Ok(results) => QueryOutcome { query, results: Some(results), error: None },
         Err(e) => QueryOutcome { query, results: None, error: Some(e.to_string()) },
      });
   }

   if json {
      return print_json(&JsonOutput { queries: outcomes, timestamp: timestamp() });
   }

   for outcome in &outcomes {
      match (&outcome.results, &outcome.error) {
         (Some(results), _) if !results.is_empty() => format_results(results, &outcome.query, true),
         (_, Some(error)) => {
            println!("{} {}: {}", style("✗").red(), outcome.query, style(error).dim());
         },
         _ => println!("No results found for '{}'", outcome.query),
      }
   }

   Ok(())
}
