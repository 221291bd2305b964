use std::io::Write;

use anyhow::Error;

use clap::{ArgAction, Parser, Subcommand};

mod demography;
use demography::Demography;

mod explore;
use explore::Explore;

mod model;

mod priors;
use priors::Priors;

mod simulate;
use simulate::Simulate;

const NAME: &str = env!("CARGO_BIN_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulate and summarise population splits under the coalescent.
#[derive(Debug, Parser)]
#[clap(name = NAME, version = VERSION, about)]
#[clap(subcommand_required = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Suppress warnings.
    ///
    /// By default, only warnings are printed. By setting this flag, warnings will be disabled.
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbosity.
    ///
    /// Flag can be set multiply times to increase verbosity, or left unset for quiet mode.
    #[clap(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print CLI arguments for debugging.
    #[clap(long, hide = true, global = true)]
    debug: bool,
}

impl Cli {
    pub fn run(self) -> Result<(), Error> {
        if self.debug {
            eprintln!("{self:#?}");
        }

        let level = if self.quiet {
            log::LevelFilter::Off
        } else {
            match self.verbose {
                0 => log::LevelFilter::Warn,
                1 => log::LevelFilter::Info,
                2 => log::LevelFilter::Debug,
                _ => log::LevelFilter::Trace,
            }
        };

        match env_logger::Builder::new()
            .filter_level(level)
            .target(env_logger::Target::Stderr)
            .format(|buf, record| {
                let level = record.level().as_str().to_lowercase();
                let args = record.args();
                writeln!(buf, "[popsim {level:>5}] {args}")
            })
            .try_init()
        {
            Ok(()) => (),
            Err(e) => eprintln!("failed to setup logger: {e}"),
        }

        self.command.run()
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Demography(Demography),
    Explore(Explore),
    Priors(Priors),
    Simulate(Simulate),
}

impl Command {
    fn run(self) -> Result<(), Error> {
        match self {
            Command::Demography(demography) => demography.run(),
            Command::Explore(explore) => explore.run(),
            Command::Priors(priors) => priors.run(),
            Command::Simulate(simulate) => simulate.run(),
        }
    }
}

macro_rules! impl_try_from_command {
    ($variant:ident) => {
        impl TryFrom<Command> for $variant {
            type Error = Command;

            fn try_from(command: Command) -> Result<Self, Self::Error> {
                match command {
                    Command::$variant(inner) => Ok(inner),
                    other => Err(other),
                }
            }
        }
    };
}

impl_try_from_command!(Demography);
impl_try_from_command!(Explore);
impl_try_from_command!(Priors);
impl_try_from_command!(Simulate);

fn main() {
    let cli = Cli::parse();

    match cli.run() {
        Ok(()) => (),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::error::ErrorKind as ClapErrorKind;

    fn try_parse_args(cmd: &str) -> Result<Cli, clap::Error> {
        Parser::try_parse_from(cmd.split_whitespace())
    }

    pub fn try_parse_subcmd<T>(cmd: &str) -> Result<T, clap::Error>
    where
        T: TryFrom<Command>,
        T::Error: std::fmt::Debug,
    {
        try_parse_args(cmd).map(|cli| T::try_from(cli.command).expect("wrong subcommand"))
    }

    pub fn parse_subcmd<T>(cmd: &str) -> T
    where
        T: TryFrom<Command>,
        T::Error: std::fmt::Debug,
    {
        try_parse_subcmd(cmd).expect("failed to parse command")
    }

    #[test]
    fn test_no_subcommand() {
        let result = try_parse_args("popsim");

        assert_eq!(
            result.unwrap_err().kind(),
            ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = try_parse_args("popsim -q -v demography");

        assert_eq!(result.unwrap_err().kind(), ClapErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_verbose_count() {
        let cli = try_parse_args("popsim demography -vv").unwrap();

        assert_eq!(cli.verbose, 2);
    }
}
