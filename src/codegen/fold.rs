// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Constant folding.
//!
//! Per-opcode tables map statically known immediate operands to a cheaper
//! equivalent: elimination (legal only when the destination has no side
//! effects), a narrower opcode, or a precomputed constant load. Folds are
//! substitution signals, not errors; the statement driver re-offers a
//! fold's replacement to the fast-path table exactly once.

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::size::OperationSize;
use crate::ea::immediate::{encode_float_immediate, encode_int_immediate, IntLiteral};
use crate::ea::{modes, ImmediateValue, OperandEncoding};
use crate::isa::conditions;
use crate::isa::opcodes as op;
use crate::isa::table::InstructionEntry;

use super::{assemble, EncodedStatement};

type FoldResult = Result<Option<(String, EncodedStatement)>, AsmError>;

fn clr_opcode(size: OperationSize) -> u8 {
    match size {
        OperationSize::Byte => op::CLR_B,
        OperationSize::Word => op::CLR_W,
        OperationSize::Long => op::CLR_L,
        _ => op::CLR_Q,
    }
}

fn fneg_opcode(size: OperationSize) -> u8 {
    if size == OperationSize::Single {
        op::FNEG_S
    } else {
        op::FNEG_D
    }
}

fn fmove_opcode(size: OperationSize) -> u8 {
    if size == OperationSize::Single {
        op::FMOVE_S
    } else {
        op::FMOVE_D
    }
}

fn truncated(value: i64, size: OperationSize) -> i64 {
    match size {
        OperationSize::Byte => value as i8 as i64,
        OperationSize::Word => value as i16 as i64,
        OperationSize::Long => value as i32 as i64,
        _ => value,
    }
}

fn elide(entry: &InstructionEntry, dst: &OperandEncoding) -> Option<(String, EncodedStatement)> {
    if dst.side_effects {
        // The destination evaluation must still happen; leave the
        // instruction alone.
        return None;
    }
    Some((
        format!("{} is a no-op; elided", entry.mnemonic),
        EncodedStatement::empty(entry.opcode),
    ))
}

fn fold_to_clr(entry: &InstructionEntry, dst: &OperandEncoding) -> (String, EncodedStatement) {
    let opcode = u16::from(clr_opcode(entry.size));
    (
        format!("{} of constant zero folds to clr", entry.mnemonic),
        assemble(opcode, vec![dst.clone()]),
    )
}

/// Build `fneg dst, dst`, reusing the same-as-destination byte when the
/// destination is not register direct.
fn fold_to_fneg(entry: &InstructionEntry, dst: &OperandEncoding) -> Option<(String, EncodedStatement)> {
    let opcode = u16::from(fneg_opcode(entry.size));
    let source = if dst.is_register_direct() {
        dst.clone()
    } else if modes::is_cloneable(dst.mode) {
        OperandEncoding::plain(modes::SAME_AS_DEST, vec![modes::SAME_AS_DEST])
    } else {
        return None;
    };
    Some((
        format!("{} by -1 folds to fneg", entry.mnemonic),
        assemble(opcode, vec![dst.clone(), source]),
    ))
}

/// Try to fold an assembled dyadic statement whose source operand is a
/// statically known immediate.
pub fn try_fold(entry: &InstructionEntry, statement: &EncodedStatement) -> FoldResult {
    let [dst, src] = statement.operands.as_slice() else {
        return Ok(None);
    };
    let Some(value) = src.immediate else {
        return Ok(None);
    };
    let base = op::base_opcode(entry.opcode);
    match value {
        ImmediateValue::Int(value) => fold_int(entry, base, value, dst),
        ImmediateValue::Float(value) => fold_float(entry, base, value, dst),
    }
}

fn fold_int(
    entry: &InstructionEntry,
    base: u8,
    value: i64,
    dst: &OperandEncoding,
) -> FoldResult {
    let value = truncated(value, entry.size);
    let folded = match base {
        op::MOVE_B..=op::MOVE_Q if value == 0 => Some(fold_to_clr(entry, dst)),
        op::AND_B..=op::AND_Q if value == 0 => Some(fold_to_clr(entry, dst)),
        op::AND_B..=op::AND_Q if value == -1 => elide(entry, dst),
        op::OR_B..=op::OR_Q
        | op::EOR_B..=op::EOR_Q
        | op::ADD_B..=op::ADD_Q
        | op::SUB_B..=op::SUB_Q
        | op::LSL_B..=op::LSL_Q
        | op::LSR_B..=op::LSR_Q
        | op::ASR_B..=op::ASR_Q
        | op::ROL_B..=op::ROL_Q
        | op::ROR_B..=op::ROR_Q
            if value == 0 =>
        {
            elide(entry, dst)
        }
        op::MULS_B..=op::MULS_Q | op::MULU_B..=op::MULU_Q => match value {
            1 => elide(entry, dst),
            0 => Some(fold_to_clr(entry, dst)),
            _ => None,
        },
        op::DIVS_B..=op::DIVS_Q | op::DIVU_B..=op::DIVU_Q => match value {
            1 => elide(entry, dst),
            0 => {
                return Err(AsmError::new(
                    AsmErrorKind::OutOfRange,
                    "division by constant zero",
                    Some(entry.mnemonic),
                ))
            }
            _ => None,
        },
        _ => None,
    };
    Ok(folded)
}

fn fold_float(
    entry: &InstructionEntry,
    base: u8,
    value: f64,
    dst: &OperandEncoding,
) -> FoldResult {
    let folded = match base {
        op::FADD_S | op::FADD_D | op::FSUB_S | op::FSUB_D if value == 0.0 => elide(entry, dst),
        op::FMUL_S | op::FMUL_D | op::FDIV_S | op::FDIV_D if value == 1.0 => elide(entry, dst),
        op::FMUL_S | op::FMUL_D if value == -1.0 => fold_to_fneg(entry, dst),
        op::FDIV_S | op::FDIV_D if value == -1.0 => fold_to_fneg(entry, dst),
        op::FDIV_S | op::FDIV_D if value == 0.0 => {
            return Err(AsmError::new(
                AsmErrorKind::OutOfRange,
                "division by constant zero",
                Some(entry.mnemonic),
            ))
        }
        op::FNEG_S
        | op::FNEG_D
        | op::FABS_S
        | op::FABS_D
        | op::FSQRT_S
        | op::FSQRT_D
        | op::FSIN_S
        | op::FSIN_D
        | op::FCOS_S
        | op::FCOS_D
        | op::FTAN_S
        | op::FTAN_D
        | op::FEXP_S
        | op::FEXP_D
        | op::FLOGN_S
        | op::FLOGN_D
        | op::FASIN_S
        | op::FASIN_D
        | op::FACOS_S
        | op::FACOS_D
        | op::FATAN_S
        | op::FATAN_D
        | op::FLOG2_S
        | op::FLOG2_D
        | op::FEXP2_S
        | op::FEXP2_D => {
            return fold_unary_float(entry, base, value, dst);
        }
        _ => None,
    };
    Ok(folded)
}

/// A unary float operation on an immediate source folds to a constant
/// load of the precomputed result. A non-finite result is fatal rather
/// than a silent NaN in the bytecode stream.
fn fold_unary_float(
    entry: &InstructionEntry,
    base: u8,
    value: f64,
    dst: &OperandEncoding,
) -> FoldResult {
    let result = match base {
        op::FNEG_S | op::FNEG_D => -value,
        op::FABS_S | op::FABS_D => value.abs(),
        op::FSQRT_S | op::FSQRT_D => value.sqrt(),
        op::FSIN_S | op::FSIN_D => value.sin(),
        op::FCOS_S | op::FCOS_D => value.cos(),
        op::FTAN_S | op::FTAN_D => value.tan(),
        op::FEXP_S | op::FEXP_D => value.exp(),
        op::FASIN_S | op::FASIN_D => value.asin(),
        op::FACOS_S | op::FACOS_D => value.acos(),
        op::FATAN_S | op::FATAN_D => value.atan(),
        op::FLOG2_S | op::FLOG2_D => value.log2(),
        op::FEXP2_S | op::FEXP2_D => value.exp2(),
        _ => value.ln(),
    };
    if !result.is_finite() {
        return Err(AsmError::new(
            AsmErrorKind::OutOfRange,
            "constant folds to a non-finite value",
            Some(entry.mnemonic),
        ));
    }
    let immediate = encode_float_immediate(result, false, entry.size, entry.mnemonic)?;
    let opcode = u16::from(fmove_opcode(entry.size));
    Ok(Some((
        format!("{} of a constant folds to a load", entry.mnemonic),
        assemble(opcode, vec![dst.clone(), immediate]),
    )))
}

/// Fold an SMC/SDC condition set whose tested operands are all known.
/// The destination receives a byte: `move.b #1` when the condition holds,
/// `clr.b` otherwise.
pub fn fold_condition_set(
    entry: &InstructionEntry,
    dst: &OperandEncoding,
    sources: &[&OperandEncoding],
) -> FoldResult {
    let mut values = sources.iter().map(|source| source.immediate);
    let Some(Some(first)) = values.next() else {
        return Ok(None);
    };
    let second = match values.next() {
        Some(Some(value)) => Some(value),
        Some(None) => return Ok(None),
        None => None,
    };
    let condition = (entry.opcode & 0xFF) as u8;
    let Some(holds) = conditions::evaluate(condition, first, second) else {
        return Ok(None);
    };
    if holds {
        let one = encode_int_immediate(IntLiteral::Decimal(1), OperationSize::Byte)?;
        Ok(Some((
            format!("{} always holds; folds to a load of 1", entry.mnemonic),
            assemble(u16::from(op::MOVE_B), vec![dst.clone(), one]),
        )))
    } else {
        Ok(Some((
            format!("{} never holds; folds to clr", entry.mnemonic),
            assemble(u16::from(op::CLR_B), vec![dst.clone()]),
        )))
    }
}

/// Re-derive the branch opcode and width after a fold collapsed a
/// conditional branch of `orig_len` bytes into an unconditional one.
/// Forward displacements are copied verbatim; backward displacements are
/// adjusted by the length difference. The first width whose range
/// accommodates the value wins, short form preferred. `None` means the
/// adjusted displacement is zero and the branch folds away entirely.
pub fn rebuild_fixed_branch(
    disp: i64,
    orig_len: usize,
) -> Result<Option<EncodedStatement>, AsmError> {
    const CANDIDATES: [(u8, usize, bool); 2] = [(op::BRA_B, 2, true), (op::BRA, 5, false)];
    for (opcode, len, short) in CANDIDATES {
        let adjusted = if disp >= 0 {
            disp
        } else {
            disp + orig_len as i64 - len as i64
        };
        if adjusted == 0 {
            return Ok(None);
        }
        let fits = if short {
            i8::try_from(adjusted).is_ok()
        } else {
            i32::try_from(adjusted).is_ok()
        };
        if !fits {
            continue;
        }
        if adjusted < 0 && -adjusted < len as i64 {
            continue;
        }
        if adjusted < 0 && -adjusted == len as i64 {
            return Err(AsmError::new(
                AsmErrorKind::OutOfRange,
                "branch to itself can never advance",
                Some(&disp.to_string()),
            ));
        }
        let mut statement = EncodedStatement::empty(u16::from(opcode));
        statement.bytes = vec![opcode];
        if short {
            statement.bytes.push(adjusted as i8 as u8);
        } else {
            statement.bytes.extend_from_slice(&(adjusted as i32).to_le_bytes());
        }
        return Ok(Some(statement));
    }
    Err(AsmError::new(
        AsmErrorKind::OutOfRange,
        "no branch width reaches the adjusted target",
        Some(&disp.to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::table::lookup_mnemonic;

    fn imm_int(value: i64, size: OperationSize) -> OperandEncoding {
        encode_int_immediate(IntLiteral::Decimal(value), size).unwrap()
    }

    fn reg(register: u8) -> OperandEncoding {
        let mode = modes::int_direct(register);
        OperandEncoding::plain(mode, vec![mode])
    }

    fn freg(register: u8) -> OperandEncoding {
        let mode = modes::float_direct(register);
        OperandEncoding::plain(mode, vec![mode])
    }

    fn dyadic(mnemonic: &str, dst: OperandEncoding, src: OperandEncoding) -> (
        &'static InstructionEntry,
        EncodedStatement,
    ) {
        let entry = lookup_mnemonic(mnemonic).unwrap();
        let statement = assemble(entry.opcode, vec![dst, src]);
        (entry, statement)
    }

    #[test]
    fn and_zero_folds_to_clr() {
        let (entry, statement) = dyadic("and.l", reg(0), imm_int(0, OperationSize::Long));
        let (_, replacement) = try_fold(entry, &statement).unwrap().unwrap();
        assert_eq!(replacement.bytes, vec![op::CLR_L, 0x00]);
    }

    #[test]
    fn and_all_ones_elides() {
        let (entry, statement) = dyadic("and.b", reg(2), imm_int(-1, OperationSize::Byte));
        let (_, replacement) = try_fold(entry, &statement).unwrap().unwrap();
        assert!(replacement.is_empty());
    }

    #[test]
    fn additive_identities_elide() {
        for mnemonic in ["or.q", "add.b", "lsl.w", "eor.l", "sub.q", "ror.b"] {
            let entry = lookup_mnemonic(mnemonic).unwrap();
            let statement = assemble(entry.opcode, vec![reg(1), imm_int(0, entry.size)]);
            let (_, replacement) = try_fold(entry, &statement).unwrap().unwrap();
            assert!(replacement.is_empty(), "{mnemonic} should elide");
        }
    }

    #[test]
    fn elision_requires_side_effect_free_destination() {
        let entry = lookup_mnemonic("add.l").unwrap();
        let mut dst = OperandEncoding::plain(modes::IND_POST_INC, vec![modes::IND_POST_INC, 0]);
        dst.side_effects = true;
        let statement = assemble(entry.opcode, vec![dst, imm_int(0, OperationSize::Long)]);
        assert!(try_fold(entry, &statement).unwrap().is_none());
    }

    #[test]
    fn division_by_constant_zero_is_fatal() {
        let (entry, statement) = dyadic("divs.l", reg(0), imm_int(0, OperationSize::Long));
        let err = try_fold(entry, &statement).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
    }

    #[test]
    fn fmul_minus_one_folds_to_fneg() {
        let entry = lookup_mnemonic("fmul.s").unwrap();
        let src = encode_float_immediate(-1.0, false, OperationSize::Single, "#-1.0").unwrap();
        let statement = assemble(entry.opcode, vec![freg(3), src]);
        let (_, replacement) = try_fold(entry, &statement).unwrap().unwrap();
        assert_eq!(replacement.opcode, u16::from(op::FNEG_S));
        assert_eq!(replacement.bytes, vec![op::FNEG_S, 0x13, 0x13]);
    }

    #[test]
    fn transcendental_constant_folds_to_load() {
        let entry = lookup_mnemonic("fsin.d").unwrap();
        let src = encode_float_immediate(0.0, false, OperationSize::Double, "#0.0").unwrap();
        let statement = assemble(entry.opcode, vec![freg(1), src]);
        let (_, replacement) = try_fold(entry, &statement).unwrap().unwrap();
        assert_eq!(replacement.opcode, u16::from(op::FMOVE_D));
        assert_eq!(replacement.bytes[0], op::FMOVE_D);
        assert_eq!(replacement.bytes[1], modes::float_direct(1));
        assert_eq!(&replacement.bytes[3..], &0.0f64.to_le_bytes());
    }

    #[test]
    fn non_finite_fold_result_is_fatal() {
        let entry = lookup_mnemonic("flogn.d").unwrap();
        let src = encode_float_immediate(0.0, false, OperationSize::Double, "#0.0").unwrap();
        let statement = assemble(entry.opcode, vec![freg(0), src]);
        let err = try_fold(entry, &statement).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
    }

    #[test]
    fn fixed_branch_rebuild_prefers_short_form() {
        // Forward displacement is copied verbatim.
        let statement = rebuild_fixed_branch(10, 9).unwrap().unwrap();
        assert_eq!(statement.bytes, vec![op::BRA_B, 10]);
        // Backward displacement shrinks with the instruction.
        let statement = rebuild_fixed_branch(-20, 9).unwrap().unwrap();
        assert_eq!(statement.bytes, vec![op::BRA_B, (-13i8) as u8]);
        // Out-of-short-range backward target takes the long form.
        let statement = rebuild_fixed_branch(-300, 9).unwrap().unwrap();
        assert_eq!(statement.bytes[0], op::BRA);
        assert_eq!(
            i32::from_le_bytes(statement.bytes[1..5].try_into().unwrap()),
            -300 + 9 - 5
        );
    }

    #[test]
    fn condition_set_folds_to_byte_loads() {
        let entry = lookup_mnemonic("seq.l").unwrap();
        let three = imm_int(3, OperationSize::Long);
        let (_, replacement) = fold_condition_set(entry, &reg(5), &[&three, &three])
            .unwrap()
            .unwrap();
        assert_eq!(replacement.bytes, vec![op::MOVE_B, 0x05, modes::SMALL_INT + 1]);

        let four = imm_int(4, OperationSize::Long);
        let (_, replacement) = fold_condition_set(entry, &reg(5), &[&three, &four])
            .unwrap()
            .unwrap();
        assert_eq!(replacement.bytes, vec![op::CLR_B, 0x05]);
    }
}
