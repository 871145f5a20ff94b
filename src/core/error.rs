// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and reporting for the assembler.

use std::fmt;

/// Categories of assembler errors.
///
/// The first five kinds are the fatal code-generation errors; `Io` and
/// `Cli` belong to the driver layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmErrorKind {
    MalformedOperand,
    OutOfRange,
    DuplicateLabel,
    UndeclaredLabel,
    UnhandledFold,
    Instruction,
    Io,
    Cli,
}

impl AsmErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::MalformedOperand => "E-OPERAND",
            Self::OutOfRange => "E-RANGE",
            Self::DuplicateLabel => "E-DUPLABEL",
            Self::UndeclaredLabel => "E-NOLABEL",
            Self::UnhandledFold => "E-FOLD",
            Self::Instruction => "E-INSTR",
            Self::Io => "E-IO",
            Self::Cli => "E-CLI",
        }
    }
}

fn format_error(msg: &str, param: Option<&str>) -> String {
    match param {
        Some(param) => format!("{msg}: {param}"),
        None => msg.to_string(),
    }
}

/// An assembler error with a kind and message.
#[derive(Debug, Clone)]
pub struct AsmError {
    kind: AsmErrorKind,
    message: String,
}

impl AsmError {
    pub fn new(kind: AsmErrorKind, msg: &str, param: Option<&str>) -> Self {
        Self {
            kind,
            message: format_error(msg, param),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> AsmErrorKind {
        self.kind
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AsmError {}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A diagnostic message with location context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub(crate) line: u32,
    pub(crate) severity: Severity,
    pub(crate) error: AsmError,
    pub(crate) file: Option<String>,
    pub(crate) notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(line: u32, severity: Severity, error: AsmError) -> Self {
        Self {
            line,
            severity,
            error,
            file: None,
            notes: Vec::new(),
        }
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Render the diagnostic in the `file:line: severity: message` form
    /// used for terminal output.
    pub fn render(&self) -> String {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        let location = match (&self.file, self.line) {
            (Some(file), 0) => format!("{file}: "),
            (Some(file), line) => format!("{file}:{line}: "),
            (None, 0) => String::new(),
            (None, line) => format!("line {line}: "),
        };
        let mut text = format!(
            "{location}{severity}[{}]: {}",
            self.error.kind().code(),
            self.error.message()
        );
        for note in &self.notes {
            text.push_str("\n  note: ");
            text.push_str(note);
        }
        text
    }
}

/// Terminal failure for a whole assembly run, carrying the diagnostics
/// collected before the abort.
#[derive(Debug)]
pub struct AsmRunError {
    pub error: AsmError,
    pub diagnostics: Vec<Diagnostic>,
}

impl AsmRunError {
    pub fn new(error: AsmError, diagnostics: Vec<Diagnostic>) -> Self {
        Self { error, diagnostics }
    }
}

impl fmt::Display for AsmRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for AsmRunError {}
