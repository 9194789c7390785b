use anyhow::Result;
use console::style;
use petsearch::HealthStatus;

use super::{GlobalOptions, open_engine, print_json};

pub async fn execute(global: &GlobalOptions, json: bool) -> Result<()> {
   let (config, engine) = open_engine(global, json).await?;
   let health = engine.health();

   if json {
      return print_json(&health);
   }

   let marker = match health.status {
      HealthStatus::Healthy => style("●").green(),
      HealthStatus::Unhealthy => style("●").red(),
   };
   let state = if health.embeddings_loaded {
      "embeddings loaded"
   } else {
      "embeddings missing"
   };

   println!(
      "{} {} {}",
      marker,
      style(format!("{} petitions", health.total_petitions)).bold(),
      style(format!("({state})")).dim()
   );
   if let Some(model) = &health.model {
      println!("  {} {}", style("model:").dim(), model);
   }
   println!("  {} {}", style("dataset:").dim(), config.csv_path.display());
   println!("  {} {}", style("cache:").dim(), config.cache_path.display());
   if let Some(error) = &health.error {
      println!("  {} {}", style("error:").red(), error);
   }

   Ok(())
}
