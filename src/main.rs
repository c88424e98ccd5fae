mod app_config;
mod error;

use std::{path::PathBuf, process};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    app_config::{AppConfig, PropertyOverrides},
    error::MulticonfError,
};

/// Binds `app.properties.firstProperty` and `app.properties.secondProperty`
/// from a TOML file, the environment, and command-line overrides, then prints
/// both values.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "FILE", default_value = "Config.toml")]
    config: PathBuf,

    /// Override `app.properties.firstProperty`.
    #[arg(long, value_name = "VALUE")]
    first_property: Option<String>,

    /// Override `app.properties.secondProperty`.
    #[arg(long, value_name = "VALUE")]
    second_property: Option<String>,
}

fn run(args: &Args) -> Result<(), MulticonfError> {
    info!("loading configuration from {}", args.config.display());

    let overrides = PropertyOverrides {
        first_property: args.first_property.clone(),
        second_property: args.second_property.clone(),
    };
    let config = AppConfig::build(&args.config, &overrides)?;

    info!(
        first = config.first_property(),
        second = config.second_property(),
        "configuration bound"
    );

    Ok(())
}

fn main() {
    // Logs go to stderr; stdout carries only the two property lines.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("failed to load configuration: {err}");
        process::exit(1);
    }
}
