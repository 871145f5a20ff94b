// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Source-line scanning.
//!
//! Splits one raw source line into an optional label declaration, an
//! optional directive, and a mnemonic with its operand substrings.
//! Operands are comma-separated at the top level only: commas inside
//! parentheses belong to tuple-form effective addresses like `(8, r0)`.

use crate::core::error::{AsmError, AsmErrorKind};

pub const COMMENT_CHAR: char = ';';

/// The two source-level markers the assembler core consumes directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Import(String),
    Export(String),
}

/// One scanned source line.
#[derive(Debug, Clone, Default)]
pub struct SourceStatement {
    pub label: Option<String>,
    pub directive: Option<Directive>,
    pub mnemonic: Option<String>,
    pub operands: Vec<String>,
}

impl SourceStatement {
    pub fn is_blank(&self) -> bool {
        self.label.is_none() && self.directive.is_none() && self.mnemonic.is_none()
    }
}

fn is_valid_label(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '.' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split operand text on top-level commas, trimming each piece.
pub fn split_operands(text: &str) -> Vec<String> {
    let mut operands = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                operands.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() || !operands.is_empty() {
        operands.push(current.trim().to_string());
    }
    operands
}

fn scan_directive(text: &str, line: u32) -> Result<Directive, AsmError> {
    let mut parts = text.splitn(2, char::is_whitespace);
    let keyword = parts.next().unwrap_or("");
    let argument = parts.next().map(str::trim).unwrap_or("");
    if argument.is_empty() || !is_valid_label(argument) {
        return Err(AsmError::new(
            AsmErrorKind::Instruction,
            &format!("line {line}: {keyword} requires a label name"),
            None,
        ));
    }
    match keyword {
        "@import" => Ok(Directive::Import(argument.to_string())),
        "@export" => Ok(Directive::Export(argument.to_string())),
        _ => Err(AsmError::new(
            AsmErrorKind::Instruction,
            "unknown directive",
            Some(keyword),
        )),
    }
}

/// Scan one source line into its components.
pub fn scan_line(raw: &str, line: u32) -> Result<SourceStatement, AsmError> {
    let mut statement = SourceStatement::default();
    let text = match raw.find(COMMENT_CHAR) {
        Some(index) => &raw[..index],
        None => raw,
    };
    let mut text = text.trim();
    if text.is_empty() {
        return Ok(statement);
    }

    if text.starts_with('@') {
        statement.directive = Some(scan_directive(text, line)?);
        return Ok(statement);
    }

    if let Some(colon) = text.find(':') {
        let candidate = text[..colon].trim();
        if is_valid_label(candidate) {
            statement.label = Some(candidate.to_string());
            text = text[colon + 1..].trim();
        }
    }
    if text.is_empty() {
        return Ok(statement);
    }

    let (mnemonic, rest) = match text.split_once(char::is_whitespace) {
        Some((mnemonic, rest)) => (mnemonic, rest.trim()),
        None => (text, ""),
    };
    statement.mnemonic = Some(mnemonic.to_string());
    if !rest.is_empty() {
        statement.operands = split_operands(rest);
    }
    Ok(statement)
}
