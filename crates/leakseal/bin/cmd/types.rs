use clap::Parser;
use colored::Colorize;
use eyre::Result;
use leakseal::{build_table, format_duration};

use super::{http, ServerArgs};

#[derive(Debug, Parser)]
pub struct TypesArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    #[arg(long, default_value_t = false, help = "Print the raw JSON report")]
    pub json: bool,
}

impl TypesArgs {
    pub fn run(&self) -> Result<()> {
        let agent = http::agent();
        let report = http::fetch_types(&agent, &self.server)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        let over_limit = report.types.iter().filter(|t| t.is_over_limit).count();
        let status = report.status.as_str().to_uppercase();
        let status = if report.status.is_leaking() {
            status.red().bold()
        } else {
            status.green().bold()
        };

        println!(
            "{} - {} of {} tracked types over limit (runtime: {})",
            status,
            over_limit,
            report.types.len(),
            format_duration(report.current_elapsed_ns)
        );

        if report.types.is_empty() {
            println!("No tracked types registered yet.");
            return Ok(());
        }

        let use_colors = std::env::var("NO_COLOR").is_err();
        build_table(&report.types, use_colors).printstd();

        Ok(())
    }
}
