// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Effective-address model and parsers.
//!
//! An operand substring is matched against the ordered parser list of a
//! capability tag and compiled to a mode byte plus extension bytes. The
//! parse result carries the metadata the optimization pipeline needs:
//! whether the operand is a statically known immediate, and whether
//! evaluating it has side effects.

pub mod immediate;
pub mod modes;
pub mod parser;

use crate::core::label::LabelTable;
use crate::core::size::OperationSize;

/// Operand roles. Each tag owns an ordered list of address-mode parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    IntRead,
    IntWrite,
    FloatRead,
    FloatWrite,
    Control,
}

/// A decoded immediate operand value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImmediateValue {
    Int(i64),
    Float(f64),
}

/// The parse result for one operand.
#[derive(Debug, Clone)]
pub struct OperandEncoding {
    /// The matched mode byte (also `bytes[0]`).
    pub mode: u8,
    /// Mode byte plus extension bytes.
    pub bytes: Vec<u8>,
    /// The decoded value when the operand is a statically known immediate.
    pub immediate: Option<ImmediateValue>,
    /// True for auto-increment/decrement addressing and unresolved label
    /// loads.
    pub side_effects: bool,
    /// Label whose 4-byte displacement placeholder occupies the last four
    /// bytes of `bytes`, awaiting the resolution sweep.
    pub label_ref: Option<String>,
}

impl OperandEncoding {
    pub fn plain(mode: u8, bytes: Vec<u8>) -> Self {
        Self {
            mode,
            bytes,
            immediate: None,
            side_effects: false,
            label_ref: None,
        }
    }

    pub fn immediate(mode: u8, bytes: Vec<u8>, value: ImmediateValue) -> Self {
        Self {
            mode,
            bytes,
            immediate: Some(value),
            side_effects: false,
            label_ref: None,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when the operand is integer or float register direct.
    pub fn is_register_direct(&self) -> bool {
        matches!(
            modes::family_of(self.mode),
            Some(modes::ModeFamily::IntDirect | modes::ModeFamily::FloatDirect)
        )
    }

    pub fn register(&self) -> u8 {
        self.mode & 0x0F
    }
}

/// Read-only context threaded through every effective-address parse.
///
/// `statement_pos` and `running_len` locate the operand's displacement
/// field inside the output stream so PC-relative forms can be resolved
/// against already-declared labels.
pub struct EaContext<'a> {
    pub labels: &'a LabelTable,
    pub file: usize,
    pub line: u32,
    pub statement_pos: u64,
    pub running_len: usize,
    pub size: OperationSize,
}

impl<'a> EaContext<'a> {
    /// Absolute output offset where the next operand's mode byte lands.
    pub fn operand_pos(&self) -> u64 {
        self.statement_pos + self.running_len as u64
    }
}
