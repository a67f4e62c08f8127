use clap::Parser;
use eyre::Result;

use super::{http, ServerArgs};

#[derive(Debug, Parser)]
pub struct SetMaxArgs {
    #[arg(help = "Tracked type name, as shown by `leakseal types`")]
    pub name: String,

    #[arg(allow_negative_numbers = true, help = "New max allowed live count")]
    pub max_allowed: i64,

    #[command(flatten)]
    pub server: ServerArgs,
}

impl SetMaxArgs {
    pub fn run(&self) -> Result<()> {
        let agent = http::agent();
        let tracked = http::set_max_allowed(&agent, &self.server, &self.name, self.max_allowed)?;

        println!(
            "{} max allowed set to {} ({})",
            tracked.name,
            tracked.max_allowed,
            tracked.fraction_string()
        );

        Ok(())
    }
}
