use std::io;
use std::process::ExitCode;

use bank_ledger::config::{Config, USAGE};
use bank_ledger::csv::{read_commands, write_accounts};
use bank_ledger::store::{load_ledger, save_ledger};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    if config.commands_path.extension().is_none_or(|ext| ext != "csv") {
        warn!(path = %config.commands_path.display(), "input file seems to not be a csv file");
    }

    let mut ledger = match load_ledger(&config.ledger_path) {
        Ok(ledger) => ledger,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let commands = match read_commands(config.commands_path.clone()) {
        Ok(commands) => commands,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let (command_sender, command_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in commands {
            match result {
                Ok(command) => {
                    if command_sender.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    ledger.run(ReceiverStream::new(command_receiver)).await;

    if !config.dry_run {
        if let Err(e) = save_ledger(&ledger, &config.ledger_path) {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = write_accounts(ledger.banks(), io::stdout().lock()) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
