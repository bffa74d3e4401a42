//! Clap argument types for the demo binary.

use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};

use layerconf::ConfigTarget;

/// Resolve a server configuration from flags, a config file and defaults.
///
/// The config file is taken from --config, or from $LAYERCONF_CONFIG when
/// --config is not given. Flags on the command line always win over file
/// values.
#[derive(Parser, Debug, Clone, PartialEq, Serialize)]
#[command(name = layerconf::constants::APP_NAME, version = layerconf::constants::VERSION)]
pub struct Cli {
    /// JSON or YAML config file (.json, .yaml, .yml).
    #[arg(long, short = 'c', global = true)]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, short = 'p', default_value_t = 8000)]
    pub port: u16,

    /// Deployment mode.
    #[arg(long, value_enum, default_value_t = Mode::Development)]
    pub mode: Mode,

    /// Comma-separated labels attached to this instance.
    #[arg(long = "tag", value_name = "TAG", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Enable verbose logging (sets log level to DEBUG).
    #[arg(long, short = 'v', global = true)]
    #[serde(skip)]
    pub verbose: bool,

    #[command(subcommand)]
    #[serde(skip)]
    pub command: Option<Command>,
}

impl ConfigTarget for Cli {
    fn config_path(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}

/// Available commands.
#[derive(clap::Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the merged configuration as JSON (the default).
    Show(ShowArgs),

    /// Report where the configuration file was found, if anywhere.
    Check,
}

/// Name of the subcommand run when none is given.
pub const DEFAULT_COMMAND: &str = "show";

/// Arguments for the `show` subcommand.
#[derive(Parser, Debug, Clone, PartialEq, Serialize)]
pub struct ShowArgs {
    /// Worker threads to report.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Print compact single-line JSON.
    #[arg(long)]
    pub compact: bool,
}

/// Deployment modes.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

/// The merged configuration as printed by `show`.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    #[serde(flatten)]
    pub cli: &'a Cli,
    pub workers: usize,
}
