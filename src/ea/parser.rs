// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Table-driven effective-address matching.
//!
//! Each capability tag owns an ordered try-list of matcher functions,
//! tried in descending frequency order. A matcher returns `Ok(None)` when
//! the text is not its shape, and an error only when the shape matched
//! but the payload is unencodable. The caller turns an exhausted list
//! into a MalformedOperand error.

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::register::{parse_float_register, parse_int_register};

use super::immediate::{
    encode_float_immediate, encode_int_immediate, parse_float_literal, parse_int_literal,
};
use super::modes::{self, IndexSize};
use super::{Capability, EaContext, OperandEncoding};

type Matcher = fn(&EaContext<'_>, &str) -> Result<Option<OperandEncoding>, AsmError>;

static INT_READ: &[Matcher] = &[
    match_int_direct,
    match_int_immediate,
    match_indirect_auto,
    match_indirect,
    match_indirect_disp,
    match_indexed,
    match_indexed_disp,
    match_pc_disp,
    match_pc_indexed,
    match_absolute,
];

static INT_WRITE: &[Matcher] = &[
    match_int_direct,
    match_indirect_auto,
    match_indirect,
    match_indirect_disp,
    match_indexed,
    match_indexed_disp,
    match_absolute,
];

static FLOAT_READ: &[Matcher] = &[
    match_float_direct,
    match_float_immediate,
    match_indirect_auto,
    match_indirect,
    match_indirect_disp,
    match_indexed,
    match_indexed_disp,
    match_pc_disp,
    match_pc_indexed,
    match_absolute,
];

static FLOAT_WRITE: &[Matcher] = &[
    match_float_direct,
    match_indirect_auto,
    match_indirect,
    match_indirect_disp,
    match_indexed,
    match_indexed_disp,
    match_absolute,
];

static CONTROL: &[Matcher] = &[
    match_indirect,
    match_indirect_disp,
    match_indexed,
    match_indexed_disp,
    match_pc_disp,
    match_pc_indexed,
    match_absolute,
    match_bare_label,
];

fn matchers_for(capability: Capability) -> &'static [Matcher] {
    match capability {
        Capability::IntRead => INT_READ,
        Capability::IntWrite => INT_WRITE,
        Capability::FloatRead => FLOAT_READ,
        Capability::FloatWrite => FLOAT_WRITE,
        Capability::Control => CONTROL,
    }
}

/// Match `text` against the capability's parser list. `Ok(None)` means no
/// parser matched (the statement layer reports MalformedOperand).
pub fn parse_operand(
    ctx: &EaContext<'_>,
    text: &str,
    capability: Capability,
) -> Result<Option<OperandEncoding>, AsmError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    for matcher in matchers_for(capability) {
        if let Some(encoding) = matcher(ctx, text)? {
            return Ok(Some(encoding));
        }
    }
    Ok(None)
}

/// Split `prefix(part, part, ...)` into prefix and trimmed inner parts.
/// Effective-address syntax never nests parentheses.
fn paren_parts(text: &str) -> Option<(&str, Vec<&str>)> {
    let open = text.find('(')?;
    if !text.ends_with(')') {
        return None;
    }
    let prefix = text[..open].trim();
    let inner = &text[open + 1..text.len() - 1];
    if inner.contains('(') || inner.contains(')') {
        return None;
    }
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.iter().any(|part| part.is_empty()) {
        return None;
    }
    Some((prefix, parts))
}

fn is_pc(text: &str) -> bool {
    text.eq_ignore_ascii_case("pc")
}

fn is_label_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '.' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_disp(text: &str) -> Result<Option<i32>, AsmError> {
    let Some(parsed) = parse_int_literal(text) else {
        return Ok(None);
    };
    let value = parsed?.value();
    let Ok(narrow) = i32::try_from(value) else {
        return Err(AsmError::new(
            AsmErrorKind::OutOfRange,
            "displacement exceeds 32 bits",
            Some(text),
        ));
    };
    Ok(Some(narrow))
}

/// Parse `rI`, `rI.z`, `rI*s`, or `rI.z*s`.
fn parse_index_spec(text: &str) -> Option<(u8, IndexSize, u8)> {
    let (register_part, scale) = match text.split_once('*') {
        Some((register, scale)) => (register.trim(), scale.trim().parse::<u8>().ok()?),
        None => (text, 1),
    };
    let (register_text, size) = match register_part.rsplit_once('.') {
        Some((register, suffix)) => (
            register.trim(),
            IndexSize::from_suffix(&suffix.trim().to_ascii_lowercase())?,
        ),
        None => (register_part.trim(), IndexSize::Quad),
    };
    let register = parse_int_register(register_text)?;
    if !matches!(scale, 1 | 2 | 4 | 8) {
        return None;
    }
    Some((register, size, scale))
}

fn match_int_direct(
    _ctx: &EaContext<'_>,
    text: &str,
) -> Result<Option<OperandEncoding>, AsmError> {
    Ok(parse_int_register(text).map(|register| {
        let mode = modes::int_direct(register);
        OperandEncoding::plain(mode, vec![mode])
    }))
}

fn match_float_direct(
    _ctx: &EaContext<'_>,
    text: &str,
) -> Result<Option<OperandEncoding>, AsmError> {
    Ok(parse_float_register(text).map(|register| {
        let mode = modes::float_direct(register);
        OperandEncoding::plain(mode, vec![mode])
    }))
}

fn match_int_immediate(
    ctx: &EaContext<'_>,
    text: &str,
) -> Result<Option<OperandEncoding>, AsmError> {
    let Some(body) = text.strip_prefix('#') else {
        return Ok(None);
    };
    match parse_int_literal(body) {
        Some(literal) => encode_int_immediate(literal?, ctx.size).map(Some),
        None => Err(AsmError::new(
            AsmErrorKind::MalformedOperand,
            "invalid integer immediate",
            Some(text),
        )),
    }
}

fn match_float_immediate(
    ctx: &EaContext<'_>,
    text: &str,
) -> Result<Option<OperandEncoding>, AsmError> {
    let Some(body) = text.strip_prefix('#') else {
        return Ok(None);
    };
    if let Some((value, single)) = parse_float_literal(body) {
        return encode_float_immediate(value, single, ctx.size, text).map(Some);
    }
    if let Some(literal) = parse_int_literal(body) {
        let value = literal?.value() as f64;
        return encode_float_immediate(value, false, ctx.size, text).map(Some);
    }
    Err(AsmError::new(
        AsmErrorKind::MalformedOperand,
        "invalid float immediate",
        Some(text),
    ))
}

fn match_indirect(_ctx: &EaContext<'_>, text: &str) -> Result<Option<OperandEncoding>, AsmError> {
    let Some(("", parts)) = paren_parts(text) else {
        return Ok(None);
    };
    let [register_text] = parts.as_slice() else {
        return Ok(None);
    };
    let Some(register) = parse_int_register(register_text) else {
        return Ok(None);
    };
    Ok(Some(OperandEncoding::plain(
        modes::IND,
        vec![modes::IND, register],
    )))
}

fn match_indirect_auto(
    _ctx: &EaContext<'_>,
    text: &str,
) -> Result<Option<OperandEncoding>, AsmError> {
    let (mode, inner) = if let Some(rest) = text.strip_suffix('+') {
        (modes::IND_POST_INC, rest)
    } else if let Some(rest) = text.strip_suffix('-') {
        (modes::IND_POST_DEC, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (modes::IND_PRE_INC, rest)
    } else if let Some(rest) = text.strip_prefix('-') {
        (modes::IND_PRE_DEC, rest)
    } else {
        return Ok(None);
    };
    let Some(("", parts)) = paren_parts(inner.trim()) else {
        return Ok(None);
    };
    let [register_text] = parts.as_slice() else {
        return Ok(None);
    };
    let Some(register) = parse_int_register(register_text) else {
        return Ok(None);
    };
    let mut encoding = OperandEncoding::plain(mode, vec![mode, register]);
    encoding.side_effects = true;
    Ok(Some(encoding))
}

fn match_indirect_disp(
    _ctx: &EaContext<'_>,
    text: &str,
) -> Result<Option<OperandEncoding>, AsmError> {
    let Some((prefix, parts)) = paren_parts(text) else {
        return Ok(None);
    };
    let (disp_text, register_text) = match (prefix, parts.as_slice()) {
        (prefix, [register]) if !prefix.is_empty() => (prefix, *register),
        ("", [disp, register]) => (*disp, *register),
        _ => return Ok(None),
    };
    let Some(register) = parse_int_register(register_text) else {
        return Ok(None);
    };
    let Some(disp) = parse_disp(disp_text)? else {
        return Ok(None);
    };
    let mut bytes = Vec::with_capacity(6);
    bytes.push(modes::IND_DISP);
    bytes.push(register);
    bytes.extend_from_slice(&disp.to_le_bytes());
    Ok(Some(OperandEncoding::plain(modes::IND_DISP, bytes)))
}

fn match_indexed(_ctx: &EaContext<'_>, text: &str) -> Result<Option<OperandEncoding>, AsmError> {
    let Some(("", parts)) = paren_parts(text) else {
        return Ok(None);
    };
    let [base_text, index_text] = parts.as_slice() else {
        return Ok(None);
    };
    let Some(base) = parse_int_register(base_text) else {
        return Ok(None);
    };
    let Some((index, size, scale)) = parse_index_spec(index_text) else {
        return Ok(None);
    };
    let Some(mode) = modes::indexed_mode(modes::IDX, size, scale) else {
        return Ok(None);
    };
    Ok(Some(OperandEncoding::plain(
        mode,
        vec![mode, (index << 4) | base],
    )))
}

fn match_indexed_disp(
    _ctx: &EaContext<'_>,
    text: &str,
) -> Result<Option<OperandEncoding>, AsmError> {
    let Some((prefix, parts)) = paren_parts(text) else {
        return Ok(None);
    };
    let (disp_text, base_text, index_text) = match (prefix, parts.as_slice()) {
        (prefix, [base, index]) if !prefix.is_empty() => (prefix, *base, *index),
        ("", [disp, base, index]) => (*disp, *base, *index),
        _ => return Ok(None),
    };
    let Some(base) = parse_int_register(base_text) else {
        return Ok(None);
    };
    let Some((index, size, scale)) = parse_index_spec(index_text) else {
        return Ok(None);
    };
    let Some(mode) = modes::indexed_mode(modes::IDX_DISP, size, scale) else {
        return Ok(None);
    };
    let Some(disp) = parse_disp(disp_text)? else {
        return Ok(None);
    };
    let mut bytes = Vec::with_capacity(6);
    bytes.push(mode);
    bytes.push((index << 4) | base);
    bytes.extend_from_slice(&disp.to_le_bytes());
    Ok(Some(OperandEncoding::plain(mode, bytes)))
}

fn pc_disp_encoding(ctx: &EaContext<'_>, target_text: &str) -> Result<OperandEncoding, AsmError> {
    if let Some(disp) = parse_disp(target_text)? {
        let mut bytes = Vec::with_capacity(5);
        bytes.push(modes::PC_DISP);
        bytes.extend_from_slice(&disp.to_le_bytes());
        return Ok(OperandEncoding::plain(modes::PC_DISP, bytes));
    }
    if !is_label_name(target_text) {
        return Err(AsmError::new(
            AsmErrorKind::MalformedOperand,
            "invalid program-counter displacement",
            Some(target_text),
        ));
    }
    // Field starts one byte past the mode byte; the displacement is
    // relative to the byte following the field.
    let field_end = ctx.operand_pos() + 1 + 4;
    if let Some(entry) = ctx.labels.lookup(target_text, ctx.file) {
        let disp = entry.offset as i64 - field_end as i64;
        let Ok(narrow) = i32::try_from(disp) else {
            return Err(AsmError::new(
                AsmErrorKind::OutOfRange,
                "label displacement exceeds 32 bits",
                Some(target_text),
            ));
        };
        let mut bytes = Vec::with_capacity(5);
        bytes.push(modes::PC_DISP);
        bytes.extend_from_slice(&narrow.to_le_bytes());
        return Ok(OperandEncoding::plain(modes::PC_DISP, bytes));
    }
    let mut encoding =
        OperandEncoding::plain(modes::PC_DISP, vec![modes::PC_DISP, 0, 0, 0, 0]);
    encoding.label_ref = Some(target_text.to_string());
    encoding.side_effects = true;
    Ok(encoding)
}

fn match_pc_disp(ctx: &EaContext<'_>, text: &str) -> Result<Option<OperandEncoding>, AsmError> {
    let Some((prefix, parts)) = paren_parts(text) else {
        return Ok(None);
    };
    let target_text = match (prefix, parts.as_slice()) {
        (prefix, [pc]) if !prefix.is_empty() && is_pc(pc) => prefix,
        ("", [target, pc]) if is_pc(pc) && !is_pc(target) => *target,
        _ => return Ok(None),
    };
    pc_disp_encoding(ctx, target_text).map(Some)
}

fn match_pc_indexed(
    _ctx: &EaContext<'_>,
    text: &str,
) -> Result<Option<OperandEncoding>, AsmError> {
    let Some(("", parts)) = paren_parts(text) else {
        return Ok(None);
    };
    let [pc, index_text] = parts.as_slice() else {
        return Ok(None);
    };
    if !is_pc(pc) {
        return Ok(None);
    }
    let Some((index, size, scale)) = parse_index_spec(index_text) else {
        return Ok(None);
    };
    let Some(mode) = modes::indexed_mode(modes::PC_IDX, size, scale) else {
        return Ok(None);
    };
    Ok(Some(OperandEncoding::plain(mode, vec![mode, index])))
}

fn parse_abs_value(text: &str) -> Option<Result<(u64, u8), AsmError>> {
    let text = text.trim();
    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('$'));
    if let Some(digits) = hex {
        let digits: String = digits.chars().filter(|&c| c != '_').collect();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        if digits.len() > 16 {
            return Some(Err(AsmError::new(
                AsmErrorKind::OutOfRange,
                "absolute address exceeds 64 bits",
                Some(text),
            )));
        }
        let value = u64::from_str_radix(&digits, 16).ok()?;
        let implicit = if digits.len() <= 8 {
            modes::ABS_L
        } else {
            modes::ABS_Q
        };
        return Some(Ok((value, implicit)));
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) || text.is_empty() {
        return None;
    }
    match text.parse::<u64>() {
        Ok(value) => {
            let implicit = if u32::try_from(value).is_ok() {
                modes::ABS_L
            } else {
                modes::ABS_Q
            };
            Some(Ok((value, implicit)))
        }
        Err(_) => Some(Err(AsmError::new(
            AsmErrorKind::OutOfRange,
            "absolute address exceeds 64 bits",
            Some(text),
        ))),
    }
}

fn match_absolute(_ctx: &EaContext<'_>, text: &str) -> Result<Option<OperandEncoding>, AsmError> {
    let (body, explicit) = if let Some(rest) = text.strip_suffix(".l") {
        (rest, Some(modes::ABS_L))
    } else if let Some(rest) = text.strip_suffix(".q") {
        (rest, Some(modes::ABS_Q))
    } else {
        (text, None)
    };
    let Some(("", parts)) = paren_parts(body.trim()) else {
        return Ok(None);
    };
    let [value_text] = parts.as_slice() else {
        return Ok(None);
    };
    let Some(parsed) = parse_abs_value(value_text) else {
        return Ok(None);
    };
    let (value, implicit) = parsed?;
    let mode = explicit.unwrap_or(implicit);
    if mode == modes::ABS_L && u32::try_from(value).is_err() {
        return Err(AsmError::new(
            AsmErrorKind::OutOfRange,
            "absolute address exceeds the long form",
            Some(value_text),
        ));
    }
    let mut bytes = Vec::with_capacity(9);
    bytes.push(mode);
    if mode == modes::ABS_L {
        bytes.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    Ok(Some(OperandEncoding::plain(mode, bytes)))
}

fn match_bare_label(ctx: &EaContext<'_>, text: &str) -> Result<Option<OperandEncoding>, AsmError> {
    if !is_label_name(text) || crate::core::register::is_register(text) {
        return Ok(None);
    }
    pc_disp_encoding(ctx, text).map(Some)
}
