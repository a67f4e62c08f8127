use clap::Parser;
use colored::Colorize;
use eyre::Result;
use leakseal::LeakStatus;

use super::{http, ServerArgs};

#[derive(Debug, Parser)]
pub struct StatusArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    #[arg(
        long,
        default_value_t = false,
        help = "Exit with code 1 when the process is leaking"
    )]
    pub fail_on_leak: bool,
}

impl StatusArgs {
    pub fn run(&self) -> Result<()> {
        let agent = http::agent();
        let status = http::fetch_status(&agent, &self.server)?.status;

        let label = status.as_str().to_uppercase();
        match status {
            LeakStatus::Leaking => println!("{}", label.red().bold()),
            LeakStatus::Sealed => println!("{}", label.green().bold()),
        }

        if self.fail_on_leak && status.is_leaking() {
            std::process::exit(1);
        }

        Ok(())
    }
}
