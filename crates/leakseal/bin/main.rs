mod cmd;
use clap::{Parser, Subcommand};
use cmd::set_max::SetMaxArgs;
use cmd::status::StatusArgs;
use cmd::type_info::TypeArgs;
use cmd::types::TypesArgs;
use eyre::Result;

#[derive(Subcommand, Debug)]
pub enum LSSubcommand {
    #[command(about = "Print the aggregate leak status of a running process")]
    Status(StatusArgs),
    #[command(about = "List every tracked type with its live count and limit")]
    Types(TypesArgs),
    #[command(about = "Show a single tracked type with its live instance ids")]
    Type(TypeArgs),
    #[command(about = "Change the max allowed live count of a tracked type")]
    SetMax(SetMaxArgs),
}

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "leakseal CLI: inspect live instance counts of a running process

https://github.com/pawurb/leakseal"
)]
pub struct LSArgs {
    #[command(subcommand)]
    pub cmd: LSSubcommand,
}

fn main() -> Result<()> {
    let root_args = LSArgs::parse();
    cmd::init_logging();

    match root_args.cmd {
        LSSubcommand::Status(args) => {
            args.run()?;
        }
        LSSubcommand::Types(args) => {
            args.run()?;
        }
        LSSubcommand::Type(args) => {
            args.run()?;
        }
        LSSubcommand::SetMax(args) => {
            args.run()?;
        }
    }

    Ok(())
}
