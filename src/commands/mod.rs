pub mod analytics;
pub mod batch;
pub mod list;
pub mod search;
pub mod stats;
pub mod status;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use petsearch::{Config, SearchEngine, SearchResult, config::EncoderKind};

/// Flags shared by every subcommand.
pub struct GlobalOptions {
   pub config:  Option<PathBuf>,
   pub encoder: Option<EncoderKind>,
}

impl GlobalOptions {
   pub fn load_config(&self) -> Result<Config> {
      let mut config = Config::load(self.config.as_deref()).context("failed to load configuration")?;
      if let Some(encoder) = self.encoder {
         config.encoder = encoder;
      }
      Ok(config)
   }
}

/// Loads the configuration and starts the engine, with a spinner on stderr
/// unless the caller wants machine-readable output.
pub async fn open_engine(global: &GlobalOptions, quiet: bool) -> Result<(Config, SearchEngine)> {
   let config = global.load_config()?;

   let spinner = if quiet {
      None
   } else {
      let spinner = ProgressBar::new_spinner();
      spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
      spinner.enable_steady_tick(Duration::from_millis(100));
      spinner.set_message("Loading petitions and embeddings...");
      Some(spinner)
   };

   let engine = SearchEngine::start(&config).await;

   if let Some(spinner) = spinner {
      if engine.is_ready() {
         spinner.finish_and_clear();
      } else {
         spinner.finish_with_message(style("Engine is not ready").yellow().to_string());
      }
   }

   Ok((config, engine))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
   println!("{}", serde_json::to_string_pretty(value)?);
   Ok(())
}

pub fn timestamp() -> String {
   chrono::Utc::now().to_rfc3339()
}

pub fn format_results(results: &[SearchResult], query: &str, scores: bool) {
   println!("\n{}", style(format!("Search results for: {query}")).bold());
   println!();

   for result in results {
      let petition = &result.petition;
      print!("{}", style(format!("{}) ", result.rank)).bold().cyan());
      print!("{}", style(&petition.title).green());

      if scores {
         print!(" {}", style(format!("(score: {:.3})", result.similarity_score)).dim());
      }

      println!();
      println!(
         "   {} {} {}",
         style(format!("[{}]", petition.state)).yellow(),
         style(format!("{} signatures", petition.signatures)).dim(),
         style(&petition.url).dim()
      );
   }

   println!();
}
