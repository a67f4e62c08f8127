use clap::Parser;
use colored::Colorize;
use eyre::Result;

use super::{http, ServerArgs};

#[derive(Debug, Parser)]
pub struct TypeArgs {
    #[arg(help = "Tracked type name, as shown by `leakseal types`")]
    pub name: String,

    #[command(flatten)]
    pub server: ServerArgs,

    #[arg(long, default_value_t = false, help = "Print the raw JSON")]
    pub json: bool,
}

impl TypeArgs {
    pub fn run(&self) -> Result<()> {
        let agent = http::agent();
        let tracked = http::fetch_type(&agent, &self.server, &self.name)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&tracked)?);
            return Ok(());
        }

        let status = if tracked.is_over_limit {
            "over limit".red().bold()
        } else {
            "ok".green().bold()
        };

        println!("{} {} ({})", tracked.name.bold(), tracked.fraction_string(), status);
        for id in &tracked.live_instance_ids {
            println!("  {}", id);
        }

        Ok(())
    }
}
