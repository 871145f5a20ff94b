// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Forge64 instruction-set definitions.

pub mod conditions;
pub mod opcodes;
pub mod table;

pub use table::{
    has_mnemonic, lookup_mnemonic, operation_size, InstructionEntry, OperandShape,
    INSTRUCTION_TABLE,
};
