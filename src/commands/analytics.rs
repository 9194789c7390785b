use anyhow::Result;
use console::style;

use super::{GlobalOptions, open_engine, print_json};

pub async fn execute(
   global: &GlobalOptions,
   query: String,
   threshold: Option<f32>,
   json: bool,
) -> Result<()> {
   let (config, engine) = open_engine(global, json).await?;
   let threshold = threshold.unwrap_or(config.min_similarity);
   let report = engine.analytics(&query, threshold).await?;

   if json {
      return print_json(&report);
   }

   println!("\n{}", style(format!("Analytics for: {query}")).bold());
   println!(
      "{}",
      style(format!(
         "{} of {} petitions related ({}%) at similarity >= {threshold}",
         report.related_petitions, report.total_petitions, report.percentage_related
      ))
      .dim()
   );
   println!();

   let breakdown = &report.status_breakdown;
   println!(
      "  {} open  {} closed  {} rejected",
      style(breakdown.open).green(),
      style(breakdown.closed).yellow(),
      style(breakdown.rejected).red()
   );

   if report.top_petitions.is_empty() {
      return Ok(());
   }

   println!();
   println!("{}", style("Most signed related petitions").bold());
   for (i, top) in report.top_petitions.iter().enumerate() {
      println!(
         "  {} {:<48} {:>9} {}",
         style(format!("{:>2}.", i + 1)).cyan(),
         top.title,
         top.signatures,
         style(format!("({:.3})", top.similarity_score)).dim()
      );
   }

   Ok(())
}
