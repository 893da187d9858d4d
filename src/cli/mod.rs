use crate::console::VerbosityLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Increase verbosity (-v verbose, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Directory holding `.agent-repl/config.toml` (defaults to your home directory)
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Start without an agent; only slash commands work
    #[arg(long)]
    pub no_agent: bool,

    /// Run a single command and exit, e.g. `--command version`
    #[arg(long, num_args = 1.., value_name = "NAME [ARGS]", allow_hyphen_values = true)]
    pub command: Option<Vec<String>>,
}

impl Cli {
    pub fn get_verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else {
            match self.verbose {
                0 => VerbosityLevel::Normal,
                1 => VerbosityLevel::Verbose,
                _ => VerbosityLevel::Debug,
            }
        }
    }

    pub fn get_effective_verbosity(&self, config_verbosity: VerbosityLevel) -> VerbosityLevel {
        if self.quiet || self.verbose > 0 {
            self.get_verbosity()
        } else {
            config_verbosity
        }
    }

    /// The `--command` name and its arguments.
    pub fn single_command(&self) -> Option<(&str, &[String])> {
        let (name, args) = self.command.as_deref()?.split_first()?;
        Some((name.as_str(), args))
    }
}
