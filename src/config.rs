//! Command-line configuration for the batch driver.

use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming the ledger file when it is not passed as an argument.
pub const LEDGER_PATH_ENV: &str = "BANK_LEDGER_PATH";

pub const USAGE: &str = "usage: bank-ledger [--dry-run] [<ledger.json>] <commands.csv>";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("expected a commands file and at most one ledger file")]
    Usage,
    #[error("no ledger file given and BANK_LEDGER_PATH is not set")]
    MissingLedger,
    #[error("unknown option '{0}'")]
    UnknownOption(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub ledger_path: PathBuf,
    pub commands_path: PathBuf,
    /// Process commands without writing the ledger back.
    pub dry_run: bool,
}

impl Config {
    /// Parse process arguments (without the program name) and the ledger path variable.
    pub fn from_args(
        args: impl IntoIterator<Item = String>,
        ledger_env: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut dry_run = false;
        let mut positional = Vec::new();
        for arg in args {
            match arg.as_str() {
                "--dry-run" => dry_run = true,
                flag if flag.starts_with("--") => {
                    return Err(ConfigError::UnknownOption(arg));
                }
                _ => positional.push(PathBuf::from(arg)),
            }
        }

        let (ledger_path, commands_path) = match positional.len() {
            1 => {
                let ledger = ledger_env.ok_or(ConfigError::MissingLedger)?;
                (PathBuf::from(ledger), positional.remove(0))
            }
            2 => {
                let commands = positional.remove(1);
                (positional.remove(0), commands)
            }
            _ => return Err(ConfigError::Usage),
        };

        Ok(Self {
            ledger_path,
            commands_path,
            dry_run,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_args(std::env::args().skip(1), std::env::var(LEDGER_PATH_ENV).ok())
    }
}
