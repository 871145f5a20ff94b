// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand-set assembly.
//!
//! The statement encoder dispatches on the instruction's arity shape,
//! parses each operand with the capability list declared for its
//! position, and tracks the running instruction length so displaced and
//! PC-relative operands see accurate byte positions. The result is an
//! [`EncodeOutcome`]: plain bytes, or a fold/fast-path substitution
//! signal the statement driver resolves with a bounded re-offer loop.

pub mod fastpath;
pub mod fold;

use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::label::LabelTable;
use crate::core::register::parse_float_register;
use crate::ea::parser::parse_operand;
use crate::ea::{modes, Capability, EaContext, OperandEncoding};
use crate::isa::conditions;
use crate::isa::opcodes as op;
use crate::isa::table::{InstructionEntry, OperandShape};

/// Upper bound on fold re-offers per statement. Two is the observed
/// maximum chain: fold, then one fast-path re-offer.
pub const MAX_FOLD_OFFERS: usize = 2;

/// A displacement field awaiting the resolution sweep, addressed relative
/// to the statement start. `branch` distinguishes branch targets, whose
/// patched displacement must not be zero, from plain PC-relative operand
/// loads, where zero is an ordinary address.
#[derive(Debug, Clone)]
pub struct PendingLabelRef {
    pub name: String,
    pub offset: usize,
    pub width: u8,
    pub branch: bool,
}

/// A fully assembled statement: the byte sequence plus the operand
/// metadata the optimization pipeline inspects.
#[derive(Debug, Clone)]
pub struct EncodedStatement {
    pub opcode: u16,
    pub bytes: Vec<u8>,
    pub operands: Vec<OperandEncoding>,
    pub label_refs: Vec<PendingLabelRef>,
}

impl EncodedStatement {
    pub fn empty(opcode: u16) -> Self {
        Self {
            opcode,
            bytes: Vec::new(),
            operands: Vec::new(),
            label_refs: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encoder result. Fold and FastPathFold are substitution signals, not
/// errors; only the statement driver consumes them.
#[derive(Debug)]
pub enum EncodeOutcome {
    Bytes(EncodedStatement),
    Fold {
        reason: String,
        replacement: EncodedStatement,
    },
    FastPathFold {
        reason: String,
        replacement: EncodedStatement,
    },
}

/// Per-statement ambient context.
pub struct StatementContext<'a> {
    pub labels: &'a LabelTable,
    pub file: usize,
    pub line: u32,
    pub statement_pos: u64,
}

fn arity(shape: OperandShape) -> usize {
    match shape {
        OperandShape::None => 0,
        OperandShape::Monadic { .. } | OperandShape::Branch { .. } => 1,
        OperandShape::Dyadic { .. }
        | OperandShape::MonadicBranch { .. }
        | OperandShape::MonadicSet { .. } => 2,
        OperandShape::Triadic { .. }
        | OperandShape::DyadicBranch { .. }
        | OperandShape::DyadicSet { .. } => 3,
        OperandShape::TetradicRegs => 4,
    }
}

fn opcode_header(opcode: u16) -> Vec<u8> {
    let base = op::base_opcode(opcode);
    if op::is_condition_coded(base) {
        vec![base, (opcode & 0xFF) as u8]
    } else {
        vec![base]
    }
}

/// Assemble the header and operand encodings into a statement, recording
/// any displacement fields that still await label resolution.
pub fn assemble(opcode: u16, operands: Vec<OperandEncoding>) -> EncodedStatement {
    let mut bytes = opcode_header(opcode);
    let mut label_refs = Vec::new();
    for operand in &operands {
        if let Some(name) = &operand.label_ref {
            label_refs.push(PendingLabelRef {
                name: name.clone(),
                offset: bytes.len() + operand.bytes.len() - 4,
                width: 4,
                branch: false,
            });
        }
        bytes.extend_from_slice(&operand.bytes);
    }
    EncodedStatement {
        opcode,
        bytes,
        operands,
        label_refs,
    }
}

struct Parser<'b> {
    ea: EaContext<'b>,
}

impl<'b> Parser<'b> {
    fn new(ctx: &StatementContext<'b>, entry: &InstructionEntry, header_len: usize) -> Self {
        let ea = EaContext {
            labels: ctx.labels,
            file: ctx.file,
            line: ctx.line,
            statement_pos: ctx.statement_pos,
            running_len: header_len,
            size: entry.size,
        };
        Self { ea }
    }

    fn parse(&mut self, text: &str, capability: Capability) -> Result<OperandEncoding, AsmError> {
        let parsed = parse_operand(&self.ea, text, capability)?;
        let Some(encoding) = parsed else {
            return Err(AsmError::new(
                AsmErrorKind::MalformedOperand,
                "no addressing mode matches operand",
                Some(text.trim()),
            ));
        };
        self.ea.running_len += encoding.len();
        Ok(encoding)
    }
}

fn expect_arity(entry: &InstructionEntry, operands: &[String]) -> Result<(), AsmError> {
    let expected = arity(entry.shape);
    if operands.len() != expected {
        return Err(AsmError::new(
            AsmErrorKind::Instruction,
            &format!(
                "{} expects {} operand(s), found {}",
                entry.mnemonic,
                expected,
                operands.len()
            ),
            None,
        ));
    }
    Ok(())
}

/// Encode one tokenized statement.
pub fn encode_statement(
    ctx: &StatementContext<'_>,
    entry: &InstructionEntry,
    operands: &[String],
) -> Result<EncodeOutcome, AsmError> {
    expect_arity(entry, operands)?;
    let header_len = opcode_header(entry.opcode).len();
    let mut parser = Parser::new(ctx, entry, header_len);

    let statement = match entry.shape {
        OperandShape::None => assemble(entry.opcode, Vec::new()),
        OperandShape::Monadic { ea } => {
            let target = parser.parse(&operands[0], ea)?;
            assemble(entry.opcode, vec![target])
        }
        OperandShape::Dyadic { src, dst } => {
            // Destination is parsed (and emitted) before the source so an
            // identical source can collapse to the same-as-destination
            // byte.
            let dst_op = parser.parse(&operands[1], dst)?;
            let src_op = parser.parse(&operands[0], src)?;
            let src_op = compact_same_as_dest(src_op, &dst_op);
            assemble(entry.opcode, vec![dst_op, src_op])
        }
        OperandShape::Triadic { src1, src2, dst } => {
            let dst_op = parser.parse(&operands[2], dst)?;
            let src1_op = parser.parse(&operands[0], src1)?;
            let src2_op = parser.parse(&operands[1], src2)?;
            assemble(entry.opcode, vec![dst_op, src1_op, src2_op])
        }
        OperandShape::TetradicRegs => {
            return encode_tetradic(entry, operands);
        }
        OperandShape::Branch { short } => {
            return encode_branch(ctx, entry, &operands[0], short);
        }
        OperandShape::MonadicBranch { src } => {
            let src_op = parser.parse(&operands[0], src)?;
            return encode_conditional_branch(ctx, &mut parser, entry, vec![src_op], &operands[1]);
        }
        OperandShape::DyadicBranch { src } => {
            let first = parser.parse(&operands[0], src)?;
            let second = parser.parse(&operands[1], src)?;
            return encode_conditional_branch(
                ctx,
                &mut parser,
                entry,
                vec![first, second],
                &operands[2],
            );
        }
        OperandShape::MonadicSet { src } => {
            let dst_op = parser.parse(&operands[1], Capability::IntWrite)?;
            let src_op = parser.parse(&operands[0], src)?;
            if let Some(folded) = fold::fold_condition_set(entry, &dst_op, &[&src_op])? {
                return Ok(EncodeOutcome::Fold {
                    reason: folded.0,
                    replacement: folded.1,
                });
            }
            assemble(entry.opcode, vec![dst_op, src_op])
        }
        OperandShape::DyadicSet { src } => {
            let dst_op = parser.parse(&operands[2], Capability::IntWrite)?;
            let first = parser.parse(&operands[0], src)?;
            let second = parser.parse(&operands[1], src)?;
            if let Some(folded) = fold::fold_condition_set(entry, &dst_op, &[&first, &second])? {
                return Ok(EncodeOutcome::Fold {
                    reason: folded.0,
                    replacement: folded.1,
                });
            }
            assemble(entry.opcode, vec![dst_op, first, second])
        }
    };

    if let Some((reason, replacement)) = fold::try_fold(entry, &statement)? {
        return Ok(EncodeOutcome::Fold {
            reason,
            replacement,
        });
    }
    Ok(finish(statement))
}

/// Final fast-path check shared by the first encode and the driver's
/// re-offer of a fold replacement.
pub fn finish(statement: EncodedStatement) -> EncodeOutcome {
    match fastpath::offer(&statement) {
        Some((reason, replacement)) => EncodeOutcome::FastPathFold {
            reason,
            replacement,
        },
        None => EncodeOutcome::Bytes(statement),
    }
}

fn compact_same_as_dest(src: OperandEncoding, dst: &OperandEncoding) -> OperandEncoding {
    // Register-direct pairs are left intact for the fast-path table; the
    // reserved byte would gain nothing there.
    if src.is_register_direct() && dst.is_register_direct() {
        return src;
    }
    if src.bytes == dst.bytes && modes::is_cloneable(dst.mode) {
        return OperandEncoding::plain(modes::SAME_AS_DEST, vec![modes::SAME_AS_DEST]);
    }
    src
}

fn encode_tetradic(
    entry: &InstructionEntry,
    operands: &[String],
) -> Result<EncodeOutcome, AsmError> {
    let mut registers = [0u8; 4];
    for (slot, text) in registers.iter_mut().zip(operands) {
        let Some(register) = parse_float_register(text) else {
            return Err(AsmError::new(
                AsmErrorKind::MalformedOperand,
                &format!("{} requires float register operands", entry.mnemonic),
                Some(text.trim()),
            ));
        };
        *slot = register;
    }
    let mut statement = EncodedStatement::empty(entry.opcode);
    statement.bytes = vec![
        op::base_opcode(entry.opcode),
        (registers[0] << 4) | registers[1],
        (registers[2] << 4) | registers[3],
    ];
    Ok(EncodeOutcome::Bytes(statement))
}

/// A parsed branch-target operand.
enum BranchTarget {
    Explicit(i64),
    Resolved(u64),
    Unresolved(String),
}

fn parse_branch_target(ctx: &StatementContext<'_>, text: &str) -> Result<BranchTarget, AsmError> {
    let text = text.trim();
    if let Some(body) = text.strip_prefix('#') {
        let Some(literal) = crate::ea::immediate::parse_int_literal(body) else {
            return Err(AsmError::new(
                AsmErrorKind::MalformedOperand,
                "invalid branch displacement",
                Some(text),
            ));
        };
        return Ok(BranchTarget::Explicit(literal?.value()));
    }
    if !is_branch_label(text) {
        return Err(AsmError::new(
            AsmErrorKind::MalformedOperand,
            "invalid branch target",
            Some(text),
        ));
    }
    match ctx.labels.lookup(text, ctx.file) {
        Some(entry) => Ok(BranchTarget::Resolved(entry.offset)),
        None => Ok(BranchTarget::Unresolved(text.to_string())),
    }
}

fn is_branch_label(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '.' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a resolved branch displacement against the instruction's own
/// length. `Ok(true)` means the branch folds to nothing.
pub fn check_branch_disp(
    disp: i64,
    len: usize,
    operand_side_effects: bool,
) -> Result<bool, AsmError> {
    if disp == 0 {
        if operand_side_effects {
            return Err(AsmError::new(
                AsmErrorKind::UnhandledFold,
                "cannot elide branch-to-next: compared operands have side effects",
                None,
            ));
        }
        return Ok(true);
    }
    if disp < 0 {
        let magnitude = -disp;
        if magnitude < len as i64 {
            return Err(AsmError::new(
                AsmErrorKind::OutOfRange,
                "branch target lands inside its own instruction",
                Some(&disp.to_string()),
            ));
        }
        if magnitude == len as i64 && !operand_side_effects {
            return Err(AsmError::new(
                AsmErrorKind::OutOfRange,
                "branch to itself can never advance",
                Some(&disp.to_string()),
            ));
        }
    }
    Ok(false)
}

fn push_disp(statement: &mut EncodedStatement, disp: i64, short: bool) -> Result<(), AsmError> {
    if short {
        let Ok(narrow) = i8::try_from(disp) else {
            return Err(AsmError::new(
                AsmErrorKind::OutOfRange,
                "short branch displacement out of range",
                Some(&disp.to_string()),
            ));
        };
        statement.bytes.push(narrow as u8);
    } else {
        let Ok(narrow) = i32::try_from(disp) else {
            return Err(AsmError::new(
                AsmErrorKind::OutOfRange,
                "branch displacement exceeds 32 bits",
                Some(&disp.to_string()),
            ));
        };
        statement.bytes.extend_from_slice(&narrow.to_le_bytes());
    }
    Ok(())
}

fn unresolved_branch(opcode: u16, name: String, short: bool) -> EncodedStatement {
    let mut statement = EncodedStatement::empty(opcode);
    statement.bytes = opcode_header(opcode);
    let width: u8 = if short { 1 } else { 4 };
    statement.label_refs.push(PendingLabelRef {
        name,
        offset: statement.bytes.len(),
        width,
        branch: true,
    });
    statement
        .bytes
        .extend(std::iter::repeat(0u8).take(width as usize));
    statement
}

/// Encode `bra`/`bsr` and their explicit short forms, choosing the
/// tightest width for already-resolved targets.
fn encode_branch(
    ctx: &StatementContext<'_>,
    entry: &InstructionEntry,
    target_text: &str,
    short: bool,
) -> Result<EncodeOutcome, AsmError> {
    let target = parse_branch_target(ctx, target_text)?;
    match target {
        BranchTarget::Explicit(disp) => {
            let len = if short { 2 } else { 5 };
            if check_branch_disp(disp, len, false)? {
                return Ok(EncodeOutcome::Fold {
                    reason: "branch to next instruction folded away".to_string(),
                    replacement: EncodedStatement::empty(entry.opcode),
                });
            }
            let mut statement = EncodedStatement::empty(entry.opcode);
            statement.bytes = opcode_header(entry.opcode);
            push_disp(&mut statement, disp, short)?;
            Ok(EncodeOutcome::Bytes(statement))
        }
        BranchTarget::Resolved(offset) => {
            let statement =
                encode_resolved_branch(entry.opcode, ctx.statement_pos, offset, short)?;
            match statement {
                Some(statement) => Ok(EncodeOutcome::Bytes(statement)),
                None => Ok(EncodeOutcome::Fold {
                    reason: "branch to next instruction folded away".to_string(),
                    replacement: EncodedStatement::empty(entry.opcode),
                }),
            }
        }
        BranchTarget::Unresolved(name) => {
            Ok(EncodeOutcome::Bytes(unresolved_branch(entry.opcode, name, short)))
        }
    }
}

/// Pick the tightest encoding for a branch whose target is already known.
/// `None` means the displacement is zero and the branch folds away.
fn encode_resolved_branch(
    opcode: u16,
    statement_pos: u64,
    target: u64,
    explicit_short: bool,
) -> Result<Option<EncodedStatement>, AsmError> {
    let base = op::base_opcode(opcode);
    let (short_opcode, long_opcode) = match base {
        op::BRA_B | op::BRA => (op::BRA_B, op::BRA),
        _ => (op::BSR_B, op::BSR),
    };
    // Try the short form first; fall back to the long form when the
    // 8-bit displacement cannot reach.
    let short_disp = target as i64 - statement_pos as i64 - 2;
    let fits_short = i8::try_from(short_disp).is_ok();
    if explicit_short || fits_short {
        if check_branch_disp(short_disp, 2, false)? {
            return Ok(None);
        }
        let mut statement = EncodedStatement::empty(u16::from(short_opcode));
        statement.bytes = vec![short_opcode];
        push_disp(&mut statement, short_disp, true)?;
        return Ok(Some(statement));
    }
    let long_disp = target as i64 - statement_pos as i64 - 5;
    if check_branch_disp(long_disp, 5, false)? {
        return Ok(None);
    }
    let mut statement = EncodedStatement::empty(u16::from(long_opcode));
    statement.bytes = vec![long_opcode];
    push_disp(&mut statement, long_disp, false)?;
    Ok(Some(statement))
}

/// Encode the BMC/BDC families: condition byte, operand encodings, then
/// the trailing 32-bit displacement. Statically decided conditions fold
/// to an unconditional branch or to nothing.
fn encode_conditional_branch(
    ctx: &StatementContext<'_>,
    parser: &mut Parser<'_>,
    entry: &InstructionEntry,
    eas: Vec<OperandEncoding>,
    target_text: &str,
) -> Result<EncodeOutcome, AsmError> {
    let target = parse_branch_target(ctx, target_text)?;
    let side_effects = eas.iter().any(|ea| ea.side_effects);
    let full_len = parser.ea.running_len + 4;

    let condition = (entry.opcode & 0xFF) as u8;
    let decided = statically_decided(condition, &eas);

    if let Some(taken) = decided {
        if !taken {
            return Ok(EncodeOutcome::Fold {
                reason: format!("{} can never branch; elided", entry.mnemonic),
                replacement: EncodedStatement::empty(entry.opcode),
            });
        }
        // Always taken: materialize an unconditional branch re-encoded
        // for the shorter instruction.
        let replacement = match target {
            BranchTarget::Explicit(disp) => {
                fold::rebuild_fixed_branch(disp, full_len)?
            }
            BranchTarget::Resolved(offset) => {
                encode_resolved_branch(u16::from(op::BRA), ctx.statement_pos, offset, false)?
            }
            BranchTarget::Unresolved(name) => {
                Some(unresolved_branch(u16::from(op::BRA), name, false))
            }
        };
        let replacement = replacement.unwrap_or_else(|| EncodedStatement::empty(entry.opcode));
        return Ok(EncodeOutcome::Fold {
            reason: format!("{} always branches; folded to bra", entry.mnemonic),
            replacement,
        });
    }

    let mut statement = assemble(entry.opcode, eas);
    match target {
        BranchTarget::Explicit(disp) => {
            if check_branch_disp(disp, full_len, side_effects)? {
                return elide_conditional(entry, side_effects);
            }
            push_disp(&mut statement, disp, false)?;
        }
        BranchTarget::Resolved(offset) => {
            let disp = offset as i64 - ctx.statement_pos as i64 - full_len as i64;
            if check_branch_disp(disp, full_len, side_effects)? {
                return elide_conditional(entry, side_effects);
            }
            push_disp(&mut statement, disp, false)?;
        }
        BranchTarget::Unresolved(name) => {
            statement.label_refs.push(PendingLabelRef {
                name,
                offset: statement.bytes.len(),
                width: 4,
                branch: true,
            });
            statement.bytes.extend_from_slice(&[0, 0, 0, 0]);
        }
    }
    Ok(EncodeOutcome::Bytes(statement))
}

fn elide_conditional(
    entry: &InstructionEntry,
    side_effects: bool,
) -> Result<EncodeOutcome, AsmError> {
    debug_assert!(!side_effects, "checked by check_branch_disp");
    Ok(EncodeOutcome::Fold {
        reason: format!("{} targets the next instruction; elided", entry.mnemonic),
        replacement: EncodedStatement::empty(entry.opcode),
    })
}

/// Evaluate a condition whose tested operands are all immediates.
fn statically_decided(condition: u8, eas: &[OperandEncoding]) -> Option<bool> {
    let mut values = eas.iter().map(|ea| ea.immediate);
    let first = values.next()??;
    let second = match values.next() {
        Some(value) => Some(value?),
        None => None,
    };
    conditions::evaluate(condition, first, second)
}
