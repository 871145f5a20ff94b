// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The assembler context and run engine.
//!
//! [`Assembler`] owns every piece of mutable assembly state: the output
//! image, both label scopes, the unresolved-reference list, and the file
//! table. It is threaded explicitly through every statement; there are no
//! ambient globals. The statement driver consumes fold signals from the
//! encoder with a bounded re-offer loop, and the resolution sweep runs
//! exactly once at the end of the run.

pub mod cli;
pub mod listing;
pub mod output;
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::PathBuf;

use serde_json::json;

use crate::codegen::{self, EncodeOutcome, StatementContext, MAX_FOLD_OFFERS};
use crate::core::error::{AsmError, AsmErrorKind, AsmRunError, Diagnostic, Severity};
use crate::core::label::{ImportReference, LabelTable, UnresolvedReference};
use crate::isa::table::lookup_mnemonic;
use crate::scanner::{scan_line, Directive};

use cli::{validate_cli, Cli, CliConfig};
pub use cli::VERSION;
use listing::{ListingLine, ListingWriter};
use output::ObjectImage;

/// Result of assembling one statement, for listings and tests.
#[derive(Debug)]
pub struct StatementRecord {
    pub offset: u64,
    pub bytes: Vec<u8>,
    pub notes: Vec<String>,
}

/// One source line that produced output or was otherwise interesting.
#[derive(Debug)]
pub struct LineRecord {
    pub line: u32,
    pub source: String,
    pub offset: u64,
    pub len: usize,
    pub notes: Vec<String>,
}

#[derive(Debug)]
pub struct FileRecord {
    pub name: String,
    pub lines: Vec<LineRecord>,
}

/// The finished assembly unit.
#[derive(Debug)]
pub struct AssemblyOutput {
    pub bytes: Vec<u8>,
    pub exports: Vec<(String, u64)>,
    pub imports: Vec<ImportReference>,
}

#[derive(Debug, Default)]
pub struct Assembler {
    image: ObjectImage,
    labels: LabelTable,
    unresolved: Vec<UnresolvedReference>,
    files: Vec<String>,
    current_file: usize,
    finalized: bool,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file and make it the current local-label scope.
    pub fn begin_file(&mut self, name: &str) -> usize {
        self.files.push(name.to_string());
        self.current_file = self.files.len() - 1;
        self.current_file
    }

    pub fn position(&self) -> u64 {
        self.image.len()
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn image(&self) -> &ObjectImage {
        &self.image
    }

    fn file_name(&self, index: usize) -> &str {
        self.files.get(index).map(String::as_str).unwrap_or("<unknown>")
    }

    /// Declare a label at the current output position.
    pub fn declare_label(&mut self, name: &str, line: u32) -> Result<(), AsmError> {
        let offset = self.image.len();
        let file = self.current_file;
        match self.labels.declare(name, offset, file, line) {
            Ok(()) => Ok(()),
            Err(prior) => Err(AsmError::new(
                AsmErrorKind::DuplicateLabel,
                &format!(
                    "duplicate label {name}; previously declared at {}:{}",
                    self.file_name(prior.file),
                    prior.line
                ),
                None,
            )),
        }
    }

    pub fn register_import(&mut self, name: &str) {
        self.labels.register_import(name);
    }

    pub fn mark_export(&mut self, name: &str) {
        self.labels.mark_export(name);
    }

    /// Assemble one tokenized statement and append it to the image.
    ///
    /// Fold and fast-path signals are resolved here: a fold's replacement
    /// is re-offered to the fast-path table exactly once, and the loop is
    /// capped so a fold chain can never cycle.
    pub fn assemble_statement(
        &mut self,
        mnemonic: &str,
        operands: &[String],
        line: u32,
    ) -> Result<StatementRecord, AsmError> {
        let Some(entry) = lookup_mnemonic(mnemonic) else {
            return Err(AsmError::new(
                AsmErrorKind::Instruction,
                "unknown mnemonic",
                Some(mnemonic),
            ));
        };
        let statement_pos = self.image.len();
        let ctx = StatementContext {
            labels: &self.labels,
            file: self.current_file,
            line,
            statement_pos,
        };
        let mut outcome = codegen::encode_statement(&ctx, entry, operands)?;
        let mut notes = Vec::new();
        let mut offers = 0usize;
        let statement = loop {
            match outcome {
                EncodeOutcome::Bytes(statement) => break statement,
                EncodeOutcome::FastPathFold { reason, replacement } => {
                    notes.push(reason);
                    break replacement;
                }
                EncodeOutcome::Fold { reason, replacement } => {
                    notes.push(reason);
                    if offers >= MAX_FOLD_OFFERS {
                        break replacement;
                    }
                    offers += 1;
                    outcome = codegen::finish(replacement);
                }
            }
        };

        for reference in &statement.label_refs {
            self.unresolved.push(UnresolvedReference {
                file: self.current_file,
                name: reference.name.clone(),
                patch_offset: statement_pos + reference.offset as u64,
                width: reference.width,
                branch: reference.branch,
                line,
            });
        }
        self.image.append(&statement.bytes);
        Ok(StatementRecord {
            offset: statement_pos,
            bytes: statement.bytes,
            notes,
        })
    }

    fn sweep_error(&self, reference: &UnresolvedReference, msg: &str) -> AsmError {
        AsmError::new(
            AsmErrorKind::OutOfRange,
            msg,
            Some(&format!(
                "{} at {}:{}",
                reference.name,
                self.file_name(reference.file),
                reference.line
            )),
        )
    }

    /// The resolution sweep. Patches every recorded displacement field,
    /// converts references to imported names into link-time import
    /// references, and fails with the full referencing-line list when a
    /// label never appears.
    pub fn finalize(&mut self) -> Result<AssemblyOutput, AsmError> {
        if self.finalized {
            return Err(AsmError::new(
                AsmErrorKind::Instruction,
                "resolution sweep already ran",
                None,
            ));
        }
        self.finalized = true;

        let references = std::mem::take(&mut self.unresolved);
        let mut imports = Vec::new();
        let mut failures: Vec<UnresolvedReference> = Vec::new();
        for reference in references {
            if self.labels.is_import(&reference.name) {
                imports.push(ImportReference {
                    name: reference.name,
                    patch_offset: reference.patch_offset,
                    width: reference.width,
                    file: reference.file,
                    line: reference.line,
                });
                continue;
            }
            let Some(target) = self
                .labels
                .lookup(&reference.name, reference.file)
                .map(|entry| entry.offset)
            else {
                failures.push(reference);
                continue;
            };
            let disp = target as i64 - (reference.patch_offset + u64::from(reference.width)) as i64;
            if disp == 0 && reference.branch {
                return Err(self.sweep_error(
                    &reference,
                    "branch to the next instruction cannot be patched; only a fold may elide it",
                ));
            }
            if reference.width == 1 {
                let Ok(narrow) = i8::try_from(disp) else {
                    return Err(
                        self.sweep_error(&reference, "short branch displacement out of range")
                    );
                };
                self.image.patch(reference.patch_offset, &[narrow as u8])?;
            } else {
                let Ok(narrow) = i32::try_from(disp) else {
                    return Err(
                        self.sweep_error(&reference, "branch displacement exceeds 32 bits")
                    );
                };
                self.image.patch(reference.patch_offset, &narrow.to_le_bytes())?;
            }
        }

        if !failures.is_empty() {
            let mut by_name: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for failure in &failures {
                by_name
                    .entry(failure.name.clone())
                    .or_default()
                    .push(format!("{}:{}", self.file_name(failure.file), failure.line));
            }
            let detail = by_name
                .into_iter()
                .map(|(name, sites)| format!("{name} (referenced at {})", sites.join(", ")))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AsmError::new(
                AsmErrorKind::UndeclaredLabel,
                "undeclared label(s)",
                Some(&detail),
            ));
        }

        let exports = self.labels.exports().map_err(|missing| {
            AsmError::new(
                AsmErrorKind::UndeclaredLabel,
                "exported label never declared",
                Some(&missing.join(", ")),
            )
        })?;

        Ok(AssemblyOutput {
            bytes: self.image.as_bytes().to_vec(),
            exports,
            imports,
        })
    }

    /// Build the JSON link manifest for an assembled unit.
    pub fn link_manifest(&self, output: &AssemblyOutput) -> serde_json::Value {
        json!({
            "version": VERSION,
            "image_bytes": output.bytes.len(),
            "exports": output
                .exports
                .iter()
                .map(|(name, offset)| json!({ "name": name, "offset": offset }))
                .collect::<Vec<_>>(),
            "imports": output
                .imports
                .iter()
                .map(|reference| {
                    json!({
                        "name": reference.name,
                        "offset": reference.patch_offset,
                        "width": reference.width,
                        "file": self.file_name(reference.file),
                        "line": reference.line,
                    })
                })
                .collect::<Vec<_>>(),
        })
    }
}

fn run_error(error: AsmError, file: &str, line: u32) -> AsmRunError {
    let diagnostic =
        Diagnostic::new(line, Severity::Error, error.clone()).with_file(Some(file.to_string()));
    AsmRunError::new(error, vec![diagnostic])
}

fn io_run_error(msg: &str, param: &str) -> AsmRunError {
    AsmRunError::new(AsmError::new(AsmErrorKind::Io, msg, Some(param)), Vec::new())
}

/// Assemble one source file's text into the shared assembler context.
pub fn assemble_file_text(
    assembler: &mut Assembler,
    name: &str,
    text: &str,
) -> Result<FileRecord, AsmRunError> {
    assembler.begin_file(name);
    let mut lines = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line_no = index as u32 + 1;
        let scanned = scan_line(raw, line_no).map_err(|err| run_error(err, name, line_no))?;
        if let Some(label) = &scanned.label {
            assembler
                .declare_label(label, line_no)
                .map_err(|err| run_error(err, name, line_no))?;
        }
        if let Some(directive) = &scanned.directive {
            match directive {
                Directive::Import(symbol) => assembler.register_import(symbol),
                Directive::Export(symbol) => assembler.mark_export(symbol),
            }
        }
        let Some(mnemonic) = &scanned.mnemonic else {
            continue;
        };
        let record = assembler
            .assemble_statement(mnemonic, &scanned.operands, line_no)
            .map_err(|err| run_error(err, name, line_no))?;
        lines.push(LineRecord {
            line: line_no,
            source: raw.trim_end().to_string(),
            offset: record.offset,
            len: record.bytes.len(),
            notes: record.notes,
        });
    }
    Ok(FileRecord {
        name: name.to_string(),
        lines,
    })
}

/// A finished run, for the CLI summary.
#[derive(Debug)]
pub struct RunReport {
    pub outfile: PathBuf,
    pub image_len: u64,
    pub files: Vec<FileRecord>,
    pub exports: Vec<(String, u64)>,
    pub import_count: usize,
}

/// Run the assembler with command-line arguments.
pub fn run() -> Result<RunReport, AsmRunError> {
    use clap::Parser;
    let cli = Cli::parse();
    run_with_cli(&cli)
}

pub fn run_with_cli(cli: &Cli) -> Result<RunReport, AsmRunError> {
    let config = validate_cli(cli).map_err(|err| AsmRunError::new(err, Vec::new()))?;
    let mut assembler = Assembler::new();
    let mut files = Vec::new();
    for input in &config.inputs {
        let name = input.display().to_string();
        let text = fs::read_to_string(input)
            .map_err(|err| io_run_error("cannot read source file", &format!("{name}: {err}")))?;
        files.push(assemble_file_text(&mut assembler, &name, &text)?);
    }

    let output = assembler.finalize().map_err(|err| {
        let diagnostic = Diagnostic::new(0, Severity::Error, err.clone());
        AsmRunError::new(err, vec![diagnostic])
    })?;

    fs::write(&config.outfile, &output.bytes).map_err(|err| {
        io_run_error(
            "cannot write output image",
            &format!("{}: {err}", config.outfile.display()),
        )
    })?;

    write_listing(&config, &files, &assembler, &output)?;

    if let Some(path) = &config.exports_name {
        let manifest = assembler.link_manifest(&output);
        let rendered = serde_json::to_string_pretty(&manifest)
            .map_err(|err| io_run_error("cannot render link manifest", &err.to_string()))?;
        fs::write(path, rendered).map_err(|err| {
            io_run_error("cannot write link manifest", &format!("{}: {err}", path.display()))
        })?;
    }

    Ok(RunReport {
        outfile: config.outfile.clone(),
        image_len: output.bytes.len() as u64,
        files,
        exports: output.exports,
        import_count: output.imports.len(),
    })
}

fn write_listing(
    config: &CliConfig,
    files: &[FileRecord],
    assembler: &Assembler,
    output: &AssemblyOutput,
) -> Result<(), AsmRunError> {
    let Some(path) = &config.list_name else {
        return Ok(());
    };
    let file = File::create(path).map_err(|err| {
        io_run_error("cannot create listing file", &format!("{}: {err}", path.display()))
    })?;
    let mut listing = ListingWriter::new(file);
    let io_err =
        |err: std::io::Error| io_run_error("cannot write listing file", &err.to_string());
    listing
        .header(&format!("forge64 Assembler v{VERSION}"))
        .map_err(io_err)?;
    for file_record in files {
        for line in &file_record.lines {
            let start = line.offset as usize;
            let bytes = &output.bytes[start..start + line.len];
            listing
                .write_line(ListingLine {
                    offset: line.offset,
                    bytes,
                    line_num: line.line,
                    source: &line.source,
                    notes: &line.notes,
                })
                .map_err(io_err)?;
        }
    }
    listing
        .footer(assembler.labels(), output.bytes.len() as u64)
        .map_err(io_err)?;
    Ok(())
}
