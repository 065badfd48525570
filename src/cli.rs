use clap::{Parser, Subcommand, ValueEnum};

use crate::lifecycle::SweepKind;

#[derive(Parser)]
#[command(name = "shelterbot")]
#[command(author, version, about = "Telegram bot guiding people through adopting a shelter animal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot and the lifecycle scheduler (default)
    Run,

    /// Run one lifecycle sweep now and exit
    Sweep {
        /// Which sweep to run
        #[arg(short, long, value_enum)]
        kind: SweepArg,
    },

    /// Apply database migrations and exit
    Migrate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SweepArg {
    /// Adopter and animal state transitions
    State,
    /// Overdue daily report reminders
    Reports,
}

impl From<SweepArg> for SweepKind {
    fn from(arg: SweepArg) -> Self {
        match arg {
            SweepArg::State => SweepKind::State,
            SweepArg::Reports => SweepKind::Reports,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
