use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "rspk")]
#[command(about = "Pack a folder of versioned packages into a SPK archive")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Folder holding metadata.json and one folder per package
    pub input: PathBuf,

    /// Where to write the archive
    pub output: PathBuf,

    /// Factory key file used to sign the files
    pub key_file: Option<PathBuf>,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not read file content, fill the data with 0xAA instead
    #[arg(long)]
    pub skip_data: bool,

    /// Log every chunk decision
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    ParseError(#[from] toml::de::Error),
}

// Configuration
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub key_file: Option<PathBuf>,
    pub skip_data: bool,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Ok(toml::from_str(&data)?)
    }
}

// Command line flags win over the config file
pub struct Settings {
    pub key_file: Option<PathBuf>,
    pub skip_data: bool,
}

impl Settings {
    pub fn merge(cli: &Cli, config: Config) -> Self {
        Settings {
            key_file: cli.key_file.clone().or(config.key_file),
            skip_data: cli.skip_data || config.skip_data,
        }
    }
}
