// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Immediate operand encoding.
//!
//! Integers 0-8 encode directly in the mode byte with no extension.
//! Larger decimal values take the smallest sufficient signed width among
//! byte/word/long/quad. Hexadecimal and binary literals are widthed by
//! digit-run length instead, with the sign taken from the top bit of the
//! matched width; a 16-digit hex literal whose upper half is pure
//! sign/zero-extension of the lower half collapses to the long form. The
//! operation size caps every encoded width.

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::size::OperationSize;

use super::modes;
use super::{ImmediateValue, OperandEncoding};

/// A numeric literal split into value and source notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntLiteral {
    /// Decimal notation; width chosen by value.
    Decimal(i64),
    /// Hex or binary notation; width chosen by digit-run length.
    Sized(i64, usize),
}

impl IntLiteral {
    pub fn value(self) -> i64 {
        match self {
            Self::Decimal(value) | Self::Sized(value, _) => value,
        }
    }
}

fn strip_separators(text: &str) -> String {
    text.chars().filter(|&c| c != '_').collect()
}

fn width_for_digit_run(digits: usize, bits_per_digit: u32) -> Option<usize> {
    let bits = digits as u32 * bits_per_digit;
    match bits {
        1..=8 => Some(1),
        9..=16 => Some(2),
        17..=32 => Some(4),
        33..=64 => Some(8),
        _ => None,
    }
}

fn sign_extend(raw: u64, width: usize) -> i64 {
    let shift = 64 - width as u32 * 8;
    ((raw << shift) as i64) >> shift
}

/// Parse an integer literal in decimal, hex (`0x`/`$`), or binary
/// (`0b`/`%`) notation. `None` when the text is not an integer literal;
/// `Some(Err)` when the notation matched but the value is unencodable.
pub fn parse_int_literal(text: &str) -> Option<Result<IntLiteral, AsmError>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let body = strip_separators(body);
    if body.is_empty() {
        return None;
    }

    let sized = |digits: &str, radix: u32, bits: u32| -> Option<Result<IntLiteral, AsmError>> {
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return Some(Err(AsmError::new(
                AsmErrorKind::MalformedOperand,
                "invalid digits in integer literal",
                Some(text),
            )));
        }
        let Some(width) = width_for_digit_run(digits.len(), bits) else {
            return Some(Err(AsmError::new(
                AsmErrorKind::OutOfRange,
                "integer literal exceeds 64 bits",
                Some(text),
            )));
        };
        let Ok(raw) = u64::from_str_radix(digits, radix) else {
            return Some(Err(AsmError::new(
                AsmErrorKind::OutOfRange,
                "integer literal exceeds 64 bits",
                Some(text),
            )));
        };
        let mut value = sign_extend(raw, width);
        if negative {
            value = value.wrapping_neg();
        }
        Some(Ok(IntLiteral::Sized(value, width)))
    };

    if let Some(digits) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        return sized(digits, 16, 4);
    }
    if let Some(digits) = body.strip_prefix('$') {
        return sized(digits, 16, 4);
    }
    if let Some(digits) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        if digits.chars().all(|c| c == '0' || c == '1') && !digits.is_empty() {
            return sized(digits, 2, 1);
        }
    }
    if let Some(digits) = body.strip_prefix('%') {
        return sized(digits, 2, 1);
    }

    if !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match body.parse::<i64>() {
        Ok(value) => {
            let value = if negative { value.wrapping_neg() } else { value };
            Some(Ok(IntLiteral::Decimal(value)))
        }
        Err(_) => Some(Err(AsmError::new(
            AsmErrorKind::OutOfRange,
            "integer literal exceeds 64 bits",
            Some(text),
        ))),
    }
}

fn min_decimal_width(value: i64) -> usize {
    if i8::try_from(value).is_ok() {
        1
    } else if i16::try_from(value).is_ok() {
        2
    } else if i32::try_from(value).is_ok() {
        4
    } else {
        8
    }
}

fn imm_mode_for_width(width: usize) -> u8 {
    match width {
        1 => modes::INT_IMM_B,
        2 => modes::INT_IMM_W,
        4 => modes::INT_IMM_L,
        _ => modes::INT_IMM_Q,
    }
}

/// Encode an already-parsed integer literal under the given operation
/// size.
pub fn encode_int_immediate(
    literal: IntLiteral,
    size: OperationSize,
) -> Result<OperandEncoding, AsmError> {
    let value = literal.value();
    if (0..=i64::from(modes::SMALL_INT_MAX)).contains(&value) {
        let mode = modes::small_int(value as u8);
        return Ok(OperandEncoding::immediate(
            mode,
            vec![mode],
            ImmediateValue::Int(value),
        ));
    }

    let mut width = match literal {
        IntLiteral::Decimal(value) => min_decimal_width(value),
        IntLiteral::Sized(_, width) => width,
    };
    // A quad literal that is pure sign-extension of its lower half
    // collapses to the long form.
    if width == 8 && (value << 32) >> 32 == value {
        width = 4;
    }
    if width > size.byte_count() {
        return Err(AsmError::new(
            AsmErrorKind::OutOfRange,
            "immediate wider than the operation size",
            Some(&value.to_string()),
        ));
    }

    let mode = imm_mode_for_width(width);
    let mut bytes = Vec::with_capacity(1 + width);
    bytes.push(mode);
    bytes.extend_from_slice(&value.to_le_bytes()[..width]);
    Ok(OperandEncoding::immediate(
        mode,
        bytes,
        ImmediateValue::Int(value),
    ))
}

/// Parse a float literal, with an optional trailing `s` suffix forcing
/// single precision. `None` when the text does not look like a float.
pub fn parse_float_literal(text: &str) -> Option<(f64, bool)> {
    let text = strip_separators(text.trim());
    if text.is_empty() {
        return None;
    }
    let (body, single) = match text.strip_suffix(['s', 'S']) {
        Some(rest) => (rest, true),
        None => (text.as_str(), false),
    };
    if body.is_empty() {
        return None;
    }
    let numeric = body
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !numeric {
        return None;
    }
    body.parse::<f64>().ok().map(|value| (value, single))
}

/// Encode a float immediate. Single precision is selected by the
/// operation size or an explicit literal suffix, and overflow out of the
/// single-precision range is fatal rather than silently widened.
pub fn encode_float_immediate(
    value: f64,
    force_single: bool,
    size: OperationSize,
    source: &str,
) -> Result<OperandEncoding, AsmError> {
    if !value.is_finite() {
        return Err(AsmError::new(
            AsmErrorKind::OutOfRange,
            "float immediate is not finite",
            Some(source),
        ));
    }
    let single = force_single || size == OperationSize::Single;
    if single {
        let narrowed = value as f32;
        if !narrowed.is_finite() {
            return Err(AsmError::new(
                AsmErrorKind::OutOfRange,
                "float immediate exceeds single-precision range",
                Some(source),
            ));
        }
        let mut bytes = Vec::with_capacity(5);
        bytes.push(modes::FLT_IMM_S);
        bytes.extend_from_slice(&narrowed.to_le_bytes());
        return Ok(OperandEncoding::immediate(
            modes::FLT_IMM_S,
            bytes,
            ImmediateValue::Float(f64::from(narrowed)),
        ));
    }
    let mut bytes = Vec::with_capacity(9);
    bytes.push(modes::FLT_IMM_D);
    bytes.extend_from_slice(&value.to_le_bytes());
    Ok(OperandEncoding::immediate(
        modes::FLT_IMM_D,
        bytes,
        ImmediateValue::Float(value),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::size::OperationSize;

    fn enc(text: &str, size: OperationSize) -> OperandEncoding {
        let literal = parse_int_literal(text).expect("integer shape").expect("valid literal");
        encode_int_immediate(literal, size).expect("encodable")
    }

    fn enc_err(text: &str, size: OperationSize) -> AsmError {
        let literal = parse_int_literal(text).expect("integer shape").expect("valid literal");
        encode_int_immediate(literal, size).expect_err("expected range error")
    }

    #[test]
    fn small_integers_live_in_the_mode_byte() {
        for value in 0..=8u8 {
            let encoding = enc(&value.to_string(), OperationSize::Long);
            assert_eq!(encoding.bytes, vec![modes::SMALL_INT + value]);
            assert_eq!(encoding.immediate, Some(ImmediateValue::Int(i64::from(value))));
        }
    }

    #[test]
    fn decimal_width_is_smallest_sufficient() {
        assert_eq!(enc("9", OperationSize::Long).bytes, vec![modes::INT_IMM_B, 9]);
        assert_eq!(enc("-1", OperationSize::Long).bytes, vec![modes::INT_IMM_B, 0xFF]);
        assert_eq!(
            enc("300", OperationSize::Long).bytes,
            vec![modes::INT_IMM_W, 0x2C, 0x01]
        );
        assert_eq!(
            enc("70000", OperationSize::Quad).bytes,
            vec![modes::INT_IMM_L, 0x70, 0x11, 0x01, 0x00]
        );
    }

    #[test]
    fn decimal_wider_than_operation_is_fatal() {
        let err = enc_err("300", OperationSize::Byte);
        assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
        let err = enc_err("70000", OperationSize::Word);
        assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
    }

    #[test]
    fn hex_width_follows_digit_run() {
        assert_eq!(enc("0xFF", OperationSize::Long).bytes, vec![modes::INT_IMM_B, 0xFF]);
        assert_eq!(
            enc("0x0FF", OperationSize::Long).bytes,
            vec![modes::INT_IMM_W, 0xFF, 0x00]
        );
        assert_eq!(
            enc("$12345", OperationSize::Long).bytes,
            vec![modes::INT_IMM_L, 0x45, 0x23, 0x01, 0x00]
        );
        assert_eq!(
            enc("0x123456789", OperationSize::Quad).bytes,
            vec![modes::INT_IMM_Q, 0x89, 0x67, 0x45, 0x23, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn hex_sign_comes_from_matched_width() {
        assert_eq!(
            enc("0xFF", OperationSize::Long).immediate,
            Some(ImmediateValue::Int(-1))
        );
        assert_eq!(
            enc("0x0FF", OperationSize::Long).immediate,
            Some(ImmediateValue::Int(255))
        );
    }

    #[test]
    fn sign_extended_quad_collapses_to_long() {
        let encoding = enc("0xFFFFFFFFFFFFFFFF", OperationSize::Quad);
        assert_eq!(encoding.bytes, vec![modes::INT_IMM_L, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(encoding.immediate, Some(ImmediateValue::Int(-1)));

        // Upper half zero but lower top bit set: not sign-extension,
        // stays quad.
        let encoding = enc("0x00000000FFFFFFFF", OperationSize::Quad);
        assert_eq!(encoding.mode, modes::INT_IMM_Q);
    }

    #[test]
    fn binary_literals_width_by_bit_run() {
        assert_eq!(enc("%00001001", OperationSize::Long).bytes, vec![modes::INT_IMM_B, 9]);
        assert_eq!(
            enc("0b1_0000_0000", OperationSize::Long).bytes,
            vec![modes::INT_IMM_W, 0x00, 0x01]
        );
    }

    #[test]
    fn float_single_range_is_enforced() {
        let err = encode_float_immediate(1.0e39, false, OperationSize::Single, "1.0e39")
            .expect_err("overflows single");
        assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
        let ok = encode_float_immediate(1.0e39, false, OperationSize::Double, "1.0e39").unwrap();
        assert_eq!(ok.mode, modes::FLT_IMM_D);
    }

    #[test]
    fn float_suffix_forces_single() {
        let (value, single) = parse_float_literal("2.5s").unwrap();
        assert!(single);
        let encoding =
            encode_float_immediate(value, single, OperationSize::Double, "2.5s").unwrap();
        assert_eq!(encoding.bytes[0], modes::FLT_IMM_S);
        assert_eq!(encoding.bytes.len(), 5);
    }
}
