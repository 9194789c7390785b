use anyhow::Result;
use console::style;
use petsearch::Petition;
use serde::Serialize;

use super::{GlobalOptions, open_engine, print_json};

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
   petitions: Vec<&'a Petition>,
   total:     usize,
   offset:    usize,
   limit:     usize,
   has_more:  bool,
}

pub async fn execute(
   global: &GlobalOptions,
   offset: usize,
   limit: Option<usize>,
   state: Option<String>,
   json: bool,
) -> Result<()> {
   let (config, engine) = open_engine(global, json).await?;
   let limit = config.clamp_limit(limit);
   let state = state.as_deref();

   let total = engine.get_petition_count(state)?;
   let petitions = engine.get_all_petitions(offset, limit, state)?;
   let has_more = offset + petitions.len() < total;

   if json {
      return print_json(&JsonOutput { petitions, total, offset, limit, has_more });
   }

   if petitions.is_empty() {
      println!("{}", style("No petitions on this page").dim());
      return Ok(());
   }

   for (i, petition) in petitions.iter().enumerate() {
      println!(
         "{} {} {}",
         style(format!("{:>4}.", offset + i + 1)).dim(),
         style(&petition.title).green(),
         style(format!("[{}, {} signatures]", petition.state, petition.signatures)).dim()
      );
   }

   let shown_to = offset + petitions.len();
   println!();
   println!("{}", style(format!("Showing {}-{shown_to} of {total}", offset + 1)).dim());
   if has_more {
      println!(
         "{}",
         style(format!("Next page: --offset {shown_to} --limit {limit}")).dim()
      );
   }

   Ok(())
}
