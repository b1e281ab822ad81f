mod commands;

use clap::Parser;
use ecalcond_core::domain::EcalError;
use tracing_subscriber::EnvFilter;

pub fn run_from_env() -> i32 {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let bridged = error.as_ecal_error();
            eprintln!("{}", bridged.diagnostic_line());
            bridged.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("ecalcond-rs".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();

    match Cli::try_parse_from(&full_args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Validate(args) => commands::run_validate_command(args),
        CliCommand::Export(args) => commands::run_export_command(args),
        CliCommand::Show(args) => commands::run_show_command(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(name = "ecalcond-rs", about = "ECAL conditions inspection and validation")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Parse an SRP configuration file and check its validity
    Validate(commands::ValidateArgs),
    /// Parse, optionally merge a profile, validate and emit the record as JSON
    Export(commands::ExportArgs),
    /// Parse an SRP configuration file and print the settings dump
    Show(commands::ShowArgs),
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Conditions(EcalError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<EcalError> for CliError {
    fn from(error: EcalError) -> Self {
        Self::Conditions(error)
    }
}

impl CliError {
    fn as_ecal_error(&self) -> EcalError {
        match self {
            Self::Usage(message) => EcalError::parse("PARSE.CLI_USAGE", message.clone()),
            Self::Conditions(error) => error.clone(),
            Self::Internal(error) => EcalError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
