//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// Aperture - DICOM de-identification pipeline
#[derive(Parser, Debug)]
#[command(name = "aperture")]
#[command(version, about, long_about = None)]
#[command(author = "Aperture Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "aperture.toml", env = "APERTURE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "APERTURE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the de-identification pipeline for one input
    Process(commands::process::ProcessArgs),

    /// Issue signed delivery descriptors for cleaned artifacts
    Deliver(commands::deliver::DeliverArgs),

    /// List cleaned artifacts in the configured store
    Status(commands::status::StatusArgs),

    /// Validate the configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Write a starter configuration file
    Init(commands::init::InitArgs),
}
