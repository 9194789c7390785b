use anyhow::Result;
use console::style;
use petsearch::{Error, SearchFilters, SearchResult, SearchStrategy};
use serde::Serialize;
use tracing::warn;

use super::{GlobalOptions, format_results, open_engine, print_json, timestamp};

#[derive(Default, Debug, Clone, Copy)]
pub struct SearchOptions {
   pub keyword: bool,
   pub json:    bool,
   pub scores:  bool,
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
   query:         &'a str,
   results:       &'a [SearchResult],
   total_results: usize,
   search_type:   SearchStrategy,
   timestamp:     String,
}

pub async fn execute(
   global: &GlobalOptions,
   query: String,
   max: Option<usize>,
   filters: SearchFilters,
   options: SearchOptions,
) -> Result<()> {
   let (config, engine) = open_engine(global, options.json).await?;
   let limit = config.clamp_limit(max);

   let (results, strategy) = if options.keyword {
      (engine.keyword_search(&query, limit, &filters)?, SearchStrategy::Keyword)
   } else {
      match engine.search(&query, limit, &filters).await {
         Ok(results) => (results, SearchStrategy::Semantic),
         Err(e @ (Error::Encoder(_) | Error::DimensionMismatch { .. })) => {
            warn!(error = %e, "semantic search failed, falling back to keyword search");
            (engine.keyword_search(&query, limit, &filters)?, SearchStrategy::Keyword)
         },
         Err(e) => return Err(e.into()),
      }
   };

   if options.json {
      return print_json(&JsonOutput {
         query:         &query,
         results:       &results,
         total_results: results.len(),
         search_type:   strategy,
         timestamp:     timestamp(),
      });
   }

   if strategy == SearchStrategy::Keyword && !options.keyword {
      println!("{}", style("Semantic search unavailable, showing keyword matches").yellow());
   }

   if results.is_empty() {
      println!("No results found for '{query}'");
      if strategy == SearchStrategy::Semantic && filters != SearchFilters::default() {
         println!("\nTip: Relax --state or the signature bounds to widen the search");
      }
      return Ok(());
   }

   format_results(&results, &query, options.scores);
   Ok(())
}
