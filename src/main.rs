//! shader-reduce entry point.

mod cli;

use std::fs;
use std::path::Path;

use clap::Parser;
use cli::{Cli, Command};
use shader_reduce::{AppError, AppResult, ScanOptions};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn read(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).map_err(|source| AppError::io(path, source))
}

fn run(cli: Cli) -> AppResult<()> {
    match cli.command {
        Command::Check {
            file,
            language_version,
        } => {
            let options = ScanOptions {
                language_version,
                ..ScanOptions::default()
            };
            println!("{}", shader_reduce::check(&read(&file)?, &options)?);
        }
        Command::List { file, scan } => {
            for line in shader_reduce::list(&read(&file)?, &(&scan).into())? {
                println!("{line}");
            }
        }
        Command::Apply {
            file,
            index,
            scan,
            output,
        } => {
            let reduced = shader_reduce::apply(&read(&file)?, index, &(&scan).into())?;
            match output {
                Some(path) => fs::write(&path, reduced)
                    .map_err(|source| AppError::io(path, source))?,
                None => print!("{reduced}"),
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(error) = run(Cli::parse()) {
        eprintln!("fatal: {error}");
        std::process::exit(1);
    }
}
