// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};

use crate::core::error::{AsmError, AsmErrorKind};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const LONG_ABOUT: &str = "Assembler for the Forge64 64-bit virtual machine.

Assembles one or more source files into a single bytecode image. Label
scopes span the whole run: global labels are visible everywhere, labels
starting with '.' are local to their declaring file. Use @import/@export
to declare link-time symbols; --exports writes the link manifest as JSON.";

#[derive(Parser, Debug)]
#[command(
    name = "forge64",
    version = VERSION,
    about = "Forge64 virtual-machine assembler",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        long = "format",
        value_enum,
        default_value_t = OutputFormat::Text,
        long_help = "Select CLI output format. text is default; json emits a machine-readable run summary and diagnostics."
    )]
    pub format: OutputFormat,
    #[arg(
        short = 'q',
        long = "quiet",
        action = ArgAction::SetTrue,
        long_help = "Suppress the run summary for successful assembly runs. Errors are still reported."
    )]
    pub quiet: bool,
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "FILE",
        long_help = "Write the bytecode image to FILE. Defaults to the first input with a .f64b extension."
    )]
    pub outfile: Option<PathBuf>,
    #[arg(
        short = 'l',
        long = "list",
        value_name = "FILE",
        long_help = "Emit a listing file with offsets, emitted bytes, and substitution notes."
    )]
    pub list_name: Option<PathBuf>,
    #[arg(
        long = "exports",
        value_name = "FILE",
        long_help = "Write the link manifest (exported label offsets and import references) as JSON."
    )]
    pub exports_name: Option<PathBuf>,
    #[arg(
        value_name = "SOURCE",
        required = true,
        long_help = "Source files, assembled in declared order into one image."
    )]
    pub inputs: Vec<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Validated run configuration.
#[derive(Debug)]
pub struct CliConfig {
    pub inputs: Vec<PathBuf>,
    pub outfile: PathBuf,
    pub list_name: Option<PathBuf>,
    pub exports_name: Option<PathBuf>,
}

pub fn validate_cli(cli: &Cli) -> Result<CliConfig, AsmError> {
    if cli.inputs.is_empty() {
        return Err(AsmError::new(
            AsmErrorKind::Cli,
            "no input files given",
            None,
        ));
    }
    let outfile = match &cli.outfile {
        Some(path) => path.clone(),
        None => default_outfile(&cli.inputs[0]),
    };
    Ok(CliConfig {
        inputs: cli.inputs.clone(),
        outfile,
        list_name: cli.list_name.clone(),
        exports_name: cli.exports_name.clone(),
    })
}

fn default_outfile(input: &Path) -> PathBuf {
    input.with_extension("f64b")
}
