use std::fs::File;
use std::io::BufWriter;
use std::process;

use clap::Parser;
use log::{error, info, warn};
use thiserror::Error;

use rspk::hash::Digester;
use rspk::key::{KeyError, SigningKey};
use rspk::metadata::{self, MetadataError};
use rspk::spk::{SpkEncoder, SpkError};

mod cli;
use crate::cli::Cli;
use crate::cli::Config;
use crate::cli::ConfigError;
use crate::cli::Settings;

#[derive(Error, Debug)]
enum RunError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    #[error("loading key: {0}")]
    KeyError(#[from] KeyError),
    #[error(transparent)]
    MetadataError(#[from] MetadataError),
    #[error(transparent)]
    SpkError(#[from] SpkError),
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let settings = Settings::merge(cli, config);

    let key = match &settings.key_file {
        Some(path) => Some(SigningKey::from_key_file(path)?),
        None => {
            warn!("Missing factory-key; signatures will be incorrect");
            None
        }
    };
    if settings.skip_data {
        warn!("Skipping file data; content and digests will be incorrect");
    }

    let digester = Digester::new(key).skip_data(settings.skip_data);
    let archive = metadata::load(&cli.input, &digester)?;

    let files: usize = archive.packages().iter().map(|p| p.files().len()).sum();
    info!("Packing {} packages, {} files", archive.packages().len(), files);

    let out = BufWriter::new(File::create(&cli.output)?);
    SpkEncoder::new(out)
        .skip_data(settings.skip_data)
        .encode(&archive)?;

    info!("Wrote {}", cli.output.display());
    Ok(())
}

fn main() {
    // Parse the cli
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&cli) {
        error!("{}", e);
        process::exit(1);
    }
}
