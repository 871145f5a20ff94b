// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for forge64.

use std::process;

use clap::Parser;
use serde_json::json;

use forge64::assembler::cli::{Cli, OutputFormat};
use forge64::assembler::{run_with_cli, RunReport, VERSION};

fn print_report(report: &RunReport, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            let statements: usize = report.files.iter().map(|file| file.lines.len()).sum();
            println!(
                "forge64 v{VERSION}: {} byte(s) from {} statement(s) -> {}",
                report.image_len,
                statements,
                report.outfile.display()
            );
            for (name, offset) in &report.exports {
                println!("  export {name} @ {offset:#010x}");
            }
            if report.import_count > 0 {
                println!("  {} import reference(s) left for link time", report.import_count);
            }
        }
        OutputFormat::Json => {
            let value = json!({
                "version": VERSION,
                "outfile": report.outfile.display().to_string(),
                "image_bytes": report.image_len,
                "files": report.files.iter().map(|file| file.name.clone()).collect::<Vec<_>>(),
                "exports": report
                    .exports
                    .iter()
                    .map(|(name, offset)| json!({ "name": name, "offset": offset }))
                    .collect::<Vec<_>>(),
                "imports": report.import_count,
            });
            println!("{value}");
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let format = cli.format;
    let quiet = cli.quiet;
    match run_with_cli(&cli) {
        Ok(report) => {
            if !quiet {
                print_report(&report, format);
            }
        }
        Err(run_error) => {
            match format {
                OutputFormat::Text => {
                    for diagnostic in &run_error.diagnostics {
                        eprintln!("{}", diagnostic.render());
                    }
                    eprintln!("forge64: error: {}", run_error.error);
                }
                OutputFormat::Json => {
                    let value = json!({
                        "version": VERSION,
                        "error": run_error.error.message(),
                        "diagnostics": run_error
                            .diagnostics
                            .iter()
                            .map(|diagnostic| {
                                json!({
                                    "file": diagnostic.file(),
                                    "line": diagnostic.line(),
                                    "code": diagnostic.error().kind().code(),
                                    "message": diagnostic.error().message(),
                                })
                            })
                            .collect::<Vec<_>>(),
                    });
                    eprintln!("{value}");
                }
            }
            process::exit(1);
        }
    }
}
