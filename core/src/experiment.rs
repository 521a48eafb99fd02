use std::env;

use anyhow::{anyhow, Result};

/// How much work a run performs: `Full` is the real configuration, `Test`
/// is a reduced deterministic configuration suitable for benchmark checks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExperimentMode {
    Full,
    Test,
}

impl ExperimentMode {
    pub fn from_str(value: &str) -> Result<Self> {
        match value {
            "full" => Ok(Self::Full),
            "test" => Ok(Self::Test),
            other => Err(anyhow!("invalid mode: {}", other)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Test => "test",
        }
    }

    /// Pick between two values based on the mode.
    pub fn select<T>(&self, full: T, test: T) -> T {
        match self {
            Self::Full => full,
            Self::Test => test,
        }
    }
}

/// Command-line arguments shared by every experiment binary.
#[derive(Clone, Debug)]
pub struct ExperimentModeArgs {
    mode: ExperimentMode,
    help_requested: bool,
}

impl ExperimentModeArgs {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args().skip(1))
    }

    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut mode: Option<ExperimentMode> = None;
        let mut help_requested = false;
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            if arg == "--mode" || arg == "-m" {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("expected value after {}", arg))?;
                mode = Some(ExperimentMode::from_str(&value)?);
            } else if let Some(value) = arg.strip_prefix("--mode=") {
                mode = Some(ExperimentMode::from_str(value)?);
            } else if arg == "--help" || arg == "-h" {
                help_requested = true;
            } else {
                return Err(anyhow!("unexpected argument: {}", arg));
            }
        }

        Ok(Self {
            mode: mode.unwrap_or(ExperimentMode::Full),
            help_requested,
        })
    }

    pub fn help_requested(&self) -> bool {
        self.help_requested
    }

    pub fn mode(&self) -> ExperimentMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<ExperimentModeArgs> {
        ExperimentModeArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_to_full_mode() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.mode(), ExperimentMode::Full);
        assert!(!args.help_requested());
    }

    #[test]
    fn parses_mode_in_both_spellings() {
        assert_eq!(parse(&["--mode", "test"]).unwrap().mode(), ExperimentMode::Test);
        assert_eq!(parse(&["--mode=test"]).unwrap().mode(), ExperimentMode::Test);
        assert_eq!(parse(&["-m", "full"]).unwrap().mode(), ExperimentMode::Full);
    }

    #[test]
    fn rejects_unknown_arguments_and_modes() {
        assert!(parse(&["--mode", "half"]).is_err());
        assert!(parse(&["--mode"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
    }

    #[test]
    fn help_flag_is_recorded() {
        assert!(parse(&["--help"]).unwrap().help_requested());
        assert!(parse(&["-h"]).unwrap().help_requested());
    }
}
