use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use petsearch::config::EncoderKind;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::GlobalOptions;

#[derive(Parser)]
#[command(name = "petsearch", version, about = "Semantic search over petitions")]
struct Cli {
   /// Configuration file (defaults to ~/.petsearch/petsearch.toml)
   #[arg(long, global = true, env = "PETSEARCH_CONFIG")]
   config: Option<PathBuf>,

   /// Encoder used to embed titles and queries
   #[arg(long, global = true, value_enum)]
   encoder: Option<EncoderKind>,

   #[command(subcommand)]
   command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
   /// Rank petitions by similarity to a query
   Search {
      query: String,

      #[arg(short = 'm', long = "max")]
      max: Option<usize>,

      #[arg(long)]
      state: Option<String>,

      #[arg(long)]
      min_signatures: Option<u64>,

      #[arg(long)]
      max_signatures: Option<u64>,

      /// Match on shared words instead of embeddings
      #[arg(long)]
      keyword: bool,

      #[arg(long)]
      json: bool,

      #[arg(long)]
      scores: bool,
   },

   /// Browse the dataset page by page
   List {
      #[arg(long, default_value_t = 0)]
      offset: usize,

      #[arg(long)]
      limit: Option<usize>,

      #[arg(long)]
      state: Option<String>,

      #[arg(long)]
      json: bool,
   },

   /// Dataset-wide counts and signature totals
   Stats {
      #[arg(long)]
      json: bool,
   },

   /// Breakdown of the petitions related to a query
   Analytics {
      query: String,

      /// Minimum similarity for a petition to count as related
      #[arg(long)]
      threshold: Option<f32>,

      #[arg(long)]
      json: bool,
   },

   /// Engine health and embedding readiness
   Status {
      #[arg(long)]
      json: bool,
   },

   /// Run every query in FILE (one per line) concurrently
   Batch {
      file: PathBuf,

      #[arg(short = 'm', long = "max")]
      max: Option<usize>,

      #[arg(long)]
      json: bool,
   },
}

#[tokio::main]
async fn main() -> Result<()> {
   tracing_subscriber::fmt()
      .with_env_filter(
         EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("petsearch=info")),
      )
      .with_writer(std::io::stderr)
      .init();

   let cli = Cli::parse();
   let global = GlobalOptions { config: cli.config, encoder: cli.encoder };

   match cli.command {
      Cmd::Search { query, max, state, min_signatures, max_signatures, keyword, json, scores } => {
         let filters = petsearch::SearchFilters { state, min_signatures, max_signatures };
         let options = commands::search::SearchOptions { keyword, json, scores };
         commands::search::execute(&global, query, max, filters, options).await
      },
      Cmd::List { offset, limit, state, json } => {
         commands::list::execute(&global, offset, limit, state, json).await
      },
      Cmd::Stats { json } => commands::stats::execute(&global, json).await,
      Cmd::Analytics { query, threshold, json } => {
         commands::analytics::execute(&global, query, threshold, json).await
      },
      Cmd::Status { json } => commands::status::execute(&global, json).await,
      Cmd::Batch { file, max, json } => commands::batch::execute(&global, file, max, json).await,
   }
}
