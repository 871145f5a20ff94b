// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Fast-path substitution.
//!
//! A smaller per-opcode table re-encodes dyadic instructions whose
//! operands are all plain register direct into a packed register-pair
//! form that skips effective-address decoding at run time. Monadic
//! register forms are already minimal and have no entry here.

use crate::isa::opcodes as op;

use super::EncodedStatement;

/// Generic opcode to packed register-pair opcode.
static FAST_PATHS: &[(u8, u8)] = &[
    (op::MOVE_B, op::R2R_MOVE_B),
    (op::MOVE_W, op::R2R_MOVE_W),
    (op::MOVE_L, op::R2R_MOVE_L),
    (op::MOVE_Q, op::R2R_MOVE_Q),
    (op::FMOVE_S, op::R2R_FMOVE_S),
    (op::FMOVE_D, op::R2R_FMOVE_D),
    (op::ADD_B, op::R2R_ADD_B),
    (op::ADD_W, op::R2R_ADD_W),
    (op::ADD_L, op::R2R_ADD_L),
    (op::ADD_Q, op::R2R_ADD_Q),
    (op::SUB_B, op::R2R_SUB_B),
    (op::SUB_W, op::R2R_SUB_W),
    (op::SUB_L, op::R2R_SUB_L),
    (op::SUB_Q, op::R2R_SUB_Q),
    (op::AND_B, op::R2R_AND_B),
    (op::AND_W, op::R2R_AND_W),
    (op::AND_L, op::R2R_AND_L),
    (op::AND_Q, op::R2R_AND_Q),
    (op::OR_B, op::R2R_OR_B),
    (op::OR_W, op::R2R_OR_W),
    (op::OR_L, op::R2R_OR_L),
    (op::OR_Q, op::R2R_OR_Q),
    (op::EOR_B, op::R2R_EOR_B),
    (op::EOR_W, op::R2R_EOR_W),
    (op::EOR_L, op::R2R_EOR_L),
    (op::EOR_Q, op::R2R_EOR_Q),
    (op::FADD_S, op::R2R_FADD_S),
    (op::FADD_D, op::R2R_FADD_D),
    (op::FSUB_S, op::R2R_FSUB_S),
    (op::FSUB_D, op::R2R_FSUB_D),
    (op::FMUL_S, op::R2R_FMUL_S),
    (op::FMUL_D, op::R2R_FMUL_D),
    (op::FDIV_S, op::R2R_FDIV_S),
    (op::FDIV_D, op::R2R_FDIV_D),
    (op::FNEG_S, op::R2R_FNEG_S),
    (op::FNEG_D, op::R2R_FNEG_D),
    (op::FABS_S, op::R2R_FABS_S),
    (op::FABS_D, op::R2R_FABS_D),
    (op::FSQRT_S, op::R2R_FSQRT_S),
    (op::FSQRT_D, op::R2R_FSQRT_D),
];

/// Offer a statement to the fast-path table. `None` when the opcode has
/// no packed form or an operand is not plain register direct.
pub fn offer(statement: &EncodedStatement) -> Option<(String, EncodedStatement)> {
    let [dst, src] = statement.operands.as_slice() else {
        return None;
    };
    if !dst.is_register_direct() || !src.is_register_direct() {
        return None;
    }
    let base = op::base_opcode(statement.opcode);
    let (_, packed_opcode) = FAST_PATHS.iter().find(|(generic, _)| *generic == base)?;
    let packed = (src.register() << 4) | dst.register();
    let mut replacement = EncodedStatement::empty(u16::from(*packed_opcode));
    replacement.bytes = vec![*packed_opcode, packed];
    replacement.operands = statement.operands.clone();
    Some((
        "all-register operands; packed fast-path form".to_string(),
        replacement,
    ))
}
