// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Condition codes for the BMC/BDC/SMC/SDC families.
//!
//! A condition byte encodes both the predicate and the operand width, so
//! the composite opcode alone determines the declared operand sizes.

use crate::core::size::OperationSize;
use crate::ea::ImmediateValue;

// Monadic integer predicates, one code per b/w/l/q width.
pub const IZ_B: u8 = 0x00;
pub const NZ_B: u8 = 0x04;
pub const MI_B: u8 = 0x08;
pub const PL_B: u8 = 0x0C;

// Monadic float predicates, one code per s/d width.
pub const FIZ_S: u8 = 0x10;
pub const FNZ_S: u8 = 0x12;

// Dyadic integer predicates, one code per b/w/l/q width.
pub const EQ_B: u8 = 0x20;
pub const NE_B: u8 = 0x24;
pub const LT_B: u8 = 0x28;
pub const LE_B: u8 = 0x2C;
pub const GT_B: u8 = 0x30;
pub const GE_B: u8 = 0x34;
pub const LO_B: u8 = 0x38;
pub const LS_B: u8 = 0x3C;
pub const HI_B: u8 = 0x40;
pub const HS_B: u8 = 0x44;

// Dyadic float predicates, one code per s/d width.
pub const FEQ_S: u8 = 0x50;
pub const FNE_S: u8 = 0x52;
pub const FLT_S: u8 = 0x54;
pub const FLE_S: u8 = 0x56;
pub const FGT_S: u8 = 0x58;
pub const FGE_S: u8 = 0x5A;

/// Width index within a predicate group (b/w/l/q or s/d).
pub fn size_index(size: OperationSize) -> u8 {
    match size {
        OperationSize::Byte | OperationSize::Single => 0,
        OperationSize::Word | OperationSize::Double => 1,
        OperationSize::Long => 2,
        OperationSize::Quad => 3,
    }
}

/// Recover the operand width from a condition byte.
pub fn condition_size(condition: u8) -> Option<OperationSize> {
    let (base, float) = condition_group(condition)?;
    let index = condition - base;
    let size = if float {
        match index {
            0 => OperationSize::Single,
            _ => OperationSize::Double,
        }
    } else {
        match index {
            0 => OperationSize::Byte,
            1 => OperationSize::Word,
            2 => OperationSize::Long,
            _ => OperationSize::Quad,
        }
    };
    Some(size)
}

/// Map a condition byte to its predicate group base and float flag.
fn condition_group(condition: u8) -> Option<(u8, bool)> {
    match condition {
        0x00..=0x0F => Some((condition & !0x03, false)),
        0x10..=0x13 => Some((condition & !0x01, true)),
        0x20..=0x47 => {
            let offset = condition - EQ_B;
            Some((EQ_B + (offset / 4) * 4, false))
        }
        0x50..=0x5B => {
            let offset = condition - FEQ_S;
            Some((FEQ_S + (offset / 2) * 2, true))
        }
        _ => None,
    }
}

/// Whether the condition tests one operand (monadic) or two (dyadic).
pub fn is_monadic(condition: u8) -> bool {
    condition < 0x20
}

/// Whether the condition compares floats.
pub fn is_float(condition: u8) -> bool {
    matches!(condition_group(condition), Some((_, true)))
}

fn truncate(value: i64, size: OperationSize) -> i64 {
    match size {
        OperationSize::Byte => value as i8 as i64,
        OperationSize::Word => value as i16 as i64,
        OperationSize::Long => value as i32 as i64,
        _ => value,
    }
}

fn unsigned(value: i64, size: OperationSize) -> u64 {
    match size {
        OperationSize::Byte => value as u8 as u64,
        OperationSize::Word => value as u16 as u64,
        OperationSize::Long => value as u32 as u64,
        _ => value as u64,
    }
}

/// Evaluate a condition against statically known operand values.
///
/// Returns `None` when the value kinds do not fit the predicate (which
/// the operand parsers should have prevented).
pub fn evaluate(
    condition: u8,
    first: ImmediateValue,
    second: Option<ImmediateValue>,
) -> Option<bool> {
    let (base, float) = condition_group(condition)?;
    let size = condition_size(condition)?;
    if float {
        let ImmediateValue::Float(a) = first else {
            return None;
        };
        if is_monadic(condition) {
            return match base {
                FIZ_S => Some(a == 0.0),
                FNZ_S => Some(a != 0.0),
                _ => None,
            };
        }
        let ImmediateValue::Float(b) = second? else {
            return None;
        };
        return match base {
            FEQ_S => Some(a == b),
            FNE_S => Some(a != b),
            FLT_S => Some(a < b),
            FLE_S => Some(a <= b),
            FGT_S => Some(a > b),
            FGE_S => Some(a >= b),
            _ => None,
        };
    }

    let ImmediateValue::Int(a) = first else {
        return None;
    };
    let a_signed = truncate(a, size);
    if is_monadic(condition) {
        return match base {
            IZ_B => Some(a_signed == 0),
            NZ_B => Some(a_signed != 0),
            MI_B => Some(a_signed < 0),
            PL_B => Some(a_signed >= 0),
            _ => None,
        };
    }
    let ImmediateValue::Int(b) = second? else {
        return None;
    };
    let b_signed = truncate(b, size);
    let a_unsigned = unsigned(a, size);
    let b_unsigned = unsigned(b, size);
    match base {
        EQ_B => Some(a_signed == b_signed),
        NE_B => Some(a_signed != b_signed),
        LT_B => Some(a_signed < b_signed),
        LE_B => Some(a_signed <= b_signed),
        GT_B => Some(a_signed > b_signed),
        GE_B => Some(a_signed >= b_signed),
        LO_B => Some(a_unsigned < b_unsigned),
        LS_B => Some(a_unsigned <= b_unsigned),
        HI_B => Some(a_unsigned > b_unsigned),
        HS_B => Some(a_unsigned >= b_unsigned),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::size::OperationSize;
    use crate::ea::ImmediateValue;

    #[test]
    fn condition_size_round_trips() {
        assert_eq!(condition_size(IZ_B + 2), Some(OperationSize::Long));
        assert_eq!(condition_size(FIZ_S + 1), Some(OperationSize::Double));
        assert_eq!(condition_size(LO_B), Some(OperationSize::Byte));
        assert_eq!(condition_size(FGE_S + 1), Some(OperationSize::Double));
        assert_eq!(condition_size(0x14), None);
    }

    #[test]
    fn signed_and_unsigned_predicates_differ() {
        let minus_one = ImmediateValue::Int(-1);
        let one = ImmediateValue::Int(1);
        // Signed: -1 < 1. Unsigned byte: 0xFF > 1.
        assert_eq!(evaluate(LT_B, minus_one, Some(one)), Some(true));
        assert_eq!(evaluate(LO_B, minus_one, Some(one)), Some(false));
        assert_eq!(evaluate(HI_B, minus_one, Some(one)), Some(true));
    }

    #[test]
    fn width_truncation_applies_before_comparison() {
        // 0x100 truncates to 0 at byte width.
        let wide = ImmediateValue::Int(0x100);
        assert_eq!(evaluate(IZ_B, wide, None), Some(true));
        assert_eq!(evaluate(IZ_B + 1, wide, None), Some(false));
    }

    #[test]
    fn float_predicates_evaluate() {
        let half = ImmediateValue::Float(0.5);
        let one = ImmediateValue::Float(1.0);
        assert_eq!(evaluate(FLT_S, half, Some(one)), Some(true));
        assert_eq!(evaluate(FNZ_S, ImmediateValue::Float(0.0), None), Some(false));
        assert_eq!(evaluate(FEQ_S, half, Some(half)), Some(true));
    }
}
