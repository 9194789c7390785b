use anyhow::Result;
use console::style;

use super::{GlobalOptions, open_engine, print_json};

pub async fn execute(global: &GlobalOptions, json: bool) -> Result<()> {
   let (_, engine) = open_engine(global, json).await?;
   let stats = engine.statistics()?;

   if json {
      return print_json(&stats);
   }

   println!("{}", style("Petition statistics").bold());
   println!();
   println!("  Total petitions:    {}", stats.total_petitions);
   println!("  Open:               {}", style(stats.open_petitions).green());
   println!("  Closed:             {}", style(stats.closed_petitions).yellow());
   println!("  Rejected:           {}", style(stats.rejected_petitions).red());
   println!("  Total signatures:   {}", stats.total_signatures);
   println!("  Average signatures: {:.1}", stats.average_signatures);

   if let Some(top) = &stats.most_signed {
      println!();
      println!("{}", style("Most signed").bold());
      println!(
         "  {} {}",
         style(&top.title).green(),
         style(format!("({} signatures)", top.signatures)).dim()
      );
      println!("  {}", style(&top.url).dim());
   }

   Ok(())
}
