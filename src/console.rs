use colored::Colorize;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Verbosity levels for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum VerbosityLevel {
    /// Only show errors
    Quiet = 0,
    /// Normal output (default)
    #[default]
    Normal = 1,
    /// Plugin lifecycle and dispatch details
    Verbose = 2,
    /// Every stream event
    Debug = 3,
}

impl fmt::Display for VerbosityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbosityLevel::Quiet => write!(f, "quiet"),
            VerbosityLevel::Normal => write!(f, "normal"),
            VerbosityLevel::Verbose => write!(f, "verbose"),
            VerbosityLevel::Debug => write!(f, "debug"),
        }
    }
}

impl FromStr for VerbosityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quiet" => Ok(VerbosityLevel::Quiet),
            "normal" => Ok(VerbosityLevel::Normal),
            "verbose" => Ok(VerbosityLevel::Verbose),
            "debug" => Ok(VerbosityLevel::Debug),
            other => Err(format!(
                "Invalid verbosity level '{}'. Valid options: quiet, normal, verbose, debug",
                other
            )),
        }
    }
}

/// Process-wide diagnostic channel.
///
/// Turn output (agent text, prompts, tool results) goes through a
/// [`crate::display::Display`]; the console carries everything else:
/// lifecycle notes, protocol violations, background session failures.
#[derive(Debug, Clone)]
pub struct Console {
    verbosity: VerbosityLevel,
}

impl Console {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    fn should_show(&self, level: VerbosityLevel) -> bool {
        self.verbosity >= level
    }

    pub fn error(&self, message: &str) {
        if self.verbosity > VerbosityLevel::Quiet {
            eprintln!("{} {}", "error:".red().bold(), message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            eprintln!("{} {}", "warning:".yellow().bold(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            eprintln!("{}", message.dimmed());
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.should_show(VerbosityLevel::Verbose) {
            eprintln!("{}", message.dimmed());
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show(VerbosityLevel::Debug) {
            eprintln!("{} {}", "DEBUG:".magenta(), message);
        }
    }

    pub fn welcome(&self, app_name: &str, agent_name: Option<&str>) {
        if !self.should_show(VerbosityLevel::Normal) {
            return;
        }
        match agent_name {
            Some(agent) => println!("{} (agent: {})", app_name.bold(), agent.cyan()),
            None => println!("{} {}", app_name.bold(), "(no agent configured)".dimmed()),
        }
        println!(
            "{}",
            "Type /help for commands, @path to attach files, Ctrl+C to cancel or exit.".dimmed()
        );
    }

    pub fn goodbye(&self) {
        if self.should_show(VerbosityLevel::Normal) {
            println!("{}", "Goodbye!".dimmed());
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self {
            verbosity: VerbosityLevel::Normal,
        }
    }
}

static GLOBAL_CONSOLE: OnceLock<Arc<Console>> = OnceLock::new();

/// Set the process-wide console. Only the first call has an effect.
pub fn init_console(verbosity: VerbosityLevel) {
    let _ = GLOBAL_CONSOLE.set(Arc::new(Console::new(verbosity)));
}

pub fn console() -> Arc<Console> {
    GLOBAL_CONSOLE
        .get_or_init(|| Arc::new(Console::default()))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert!(VerbosityLevel::Quiet < VerbosityLevel::Normal);
        assert!(VerbosityLevel::Normal < VerbosityLevel::Verbose);
        assert!(VerbosityLevel::Verbose < VerbosityLevel::Debug);
    }

    #[test]
    fn test_console_should_show() {
        let console = Console::new(VerbosityLevel::Normal);

        assert!(!console.should_show(VerbosityLevel::Verbose));
        assert!(console.should_show(VerbosityLevel::Normal));
        assert!(!console.should_show(VerbosityLevel::Debug));
    }

    #[test]
    fn test_verbosity_round_trips_through_strings() {
        for level in [
            VerbosityLevel::Quiet,
            VerbosityLevel::Normal,
            VerbosityLevel::Verbose,
            VerbosityLevel::Debug,
        ] {
            assert_eq!(level.to_string().parse::<VerbosityLevel>(), Ok(level));
        }
        assert!("loud".parse::<VerbosityLevel>().is_err());
    }

    #[test]
    fn test_console_available_without_init() {
        let console = console();
        assert!(console.verbosity() <= VerbosityLevel::Debug);
    }
}
