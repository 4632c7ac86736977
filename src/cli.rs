//! Command-line interface for the shader reducer.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shader_ast::ShadingLanguageVersion;
use shader_reduce::ScanOptions;

#[derive(Parser)]
#[command(name = "shader-reduce")]
#[command(about = "Find reduction opportunities in shaders", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a shader and run the structural checker on it
    Check {
        file: PathBuf,
        /// Check against this version instead of the file's `#version`
        #[arg(long)]
        language_version: Option<ShadingLanguageVersion>,
    },
    /// List the reduction opportunities in a shader
    #[command(alias = "ls")]
    List {
        file: PathBuf,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Apply one opportunity, by its index in `list`, and print the result
    Apply {
        file: PathBuf,
        index: usize,
        #[command(flatten)]
        scan: ScanArgs,
        /// Write the reduced shader here instead of to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct ScanArgs {
    /// Consider all code, not only code the fuzzer injected
    #[arg(long)]
    pub everywhere: bool,
    /// Verify every opportunity against a copy of the shader
    #[arg(long)]
    pub check: bool,
    /// Scan as this version instead of the file's `#version`
    #[arg(long)]
    pub language_version: Option<ShadingLanguageVersion>,
}

impl From<&ScanArgs> for ScanOptions {
    fn from(args: &ScanArgs) -> Self {
        ScanOptions {
            language_version: args.language_version,
            everywhere: args.everywhere,
            check: args.check,
        }
    }
}
