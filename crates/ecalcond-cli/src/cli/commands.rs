use super::CliError;
use ecalcond_core::domain::EcalError;
use ecalcond_core::modules::srsettings::{SrSettings, SrSettingsProfile, parse_srp_config};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(clap::Args)]
pub(super) struct ValidateArgs {
    /// SRP configuration file
    config: PathBuf,

    /// Apply the restrictions of the selective-readout emulation
    #[arg(long)]
    emulator: bool,

    /// Echo every parsed card
    #[arg(long)]
    debug: bool,
}

#[derive(clap::Args)]
pub(super) struct ExportArgs {
    /// SRP configuration file
    config: PathBuf,

    /// JSON profile merged over the parsed configuration
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Output path; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Apply the restrictions of the selective-readout emulation
    #[arg(long)]
    emulator: bool,
}

#[derive(clap::Args)]
pub(super) struct ShowArgs {
    /// SRP configuration file
    config: PathBuf,
}

pub(super) fn run_validate_command(args: ValidateArgs) -> Result<i32, CliError> {
    let settings = load_settings(&args.config, args.debug)?;
    settings.check_validity(args.emulator)?;

    tracing::info!(
        config = %args.config.display(),
        emulator = args.emulator,
        "settings are valid"
    );
    println!("{}: valid", args.config.display());
    Ok(0)
}

pub(super) fn run_export_command(args: ExportArgs) -> Result<i32, CliError> {
    let mut settings = load_settings(&args.config, false)?;

    if let Some(profile_path) = &args.profile {
        let profile = load_profile(profile_path)?;
        settings.import_profile(&profile)?;
        tracing::info!(profile = %profile_path.display(), "profile merged");
    }
    settings.check_validity(args.emulator)?;

    let rendered = serde_json::to_string_pretty(&settings).map_err(|source| {
        EcalError::internal(
            "SYS.EXPORT_ENCODE",
            format!("failed to encode settings: {}", source),
        )
    })?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered).map_err(|source| {
                EcalError::io_system(
                    "IO.EXPORT_WRITE",
                    format!("failed to write '{}': {}", path.display(), source),
                )
            })?;
            tracing::info!(output = %path.display(), "settings exported");
        }
        None => println!("{}", rendered),
    }
    Ok(0)
}

pub(super) fn run_show_command(args: ShowArgs) -> Result<i32, CliError> {
    let settings = load_settings(&args.config, false)?;
    print!("{}", settings);
    Ok(0)
}

fn load_settings(path: &Path, debug: bool) -> Result<SrSettings, CliError> {
    let source = fs::read_to_string(path).map_err(|source| {
        CliError::Conditions(EcalError::io_system(
            "IO.SRP_CONFIG_READ",
            format!("failed to read '{}': {}", path.display(), source),
        ))
    })?;
    Ok(parse_srp_config(&source, debug)?)
}

fn load_profile(path: &Path) -> Result<SrSettingsProfile, CliError> {
    let source = fs::read_to_string(path).map_err(|source| {
        CliError::Conditions(EcalError::io_system(
            "IO.PROFILE_READ",
            format!("failed to read '{}': {}", path.display(), source),
        ))
    })?;
    serde_json::from_str(&source).map_err(|source| {
        CliError::Conditions(EcalError::parse(
            "PARSE.PROFILE",
            format!("profile '{}' is not valid JSON: {}", path.display(), source),
        ))
    })
}
