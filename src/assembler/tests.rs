// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::{assemble_file_text, Assembler, StatementRecord};
use crate::core::error::{AsmError, AsmErrorKind};
use crate::core::label::LabelTable;
use crate::core::size::OperationSize;
use crate::ea::parser::parse_operand;
use crate::ea::{modes, Capability, EaContext};
use crate::isa::opcodes as op;
use crate::scanner::scan_line;

fn assemble_bytes(source: &str) -> Vec<u8> {
    let mut assembler = Assembler::new();
    assemble_file_text(&mut assembler, "test.f64", source).expect("assembly should succeed");
    assembler.finalize().expect("finalize should succeed").bytes
}

fn assemble_err(source: &str) -> AsmError {
    let mut assembler = Assembler::new();
    match assemble_file_text(&mut assembler, "test.f64", source) {
        Err(run_error) => run_error.error,
        Ok(_) => assembler
            .finalize()
            .expect_err("expected the resolution sweep to fail"),
    }
}

fn single_record(line: &str) -> StatementRecord {
    let mut assembler = Assembler::new();
    assembler.begin_file("test.f64");
    let scanned = scan_line(line, 1).unwrap();
    assembler
        .assemble_statement(scanned.mnemonic.as_deref().unwrap(), &scanned.operands, 1)
        .unwrap()
}

fn parse_ea(text: &str, capability: Capability, size: OperationSize) -> Vec<u8> {
    let labels = LabelTable::new();
    let ctx = EaContext {
        labels: &labels,
        file: 0,
        line: 1,
        statement_pos: 0,
        running_len: 1,
        size,
    };
    parse_operand(&ctx, text, capability)
        .expect("no parse error")
        .expect("expected a match")
        .bytes
}

// --- §encoding basics -------------------------------------------------

#[test]
fn clr_l_register_encodes_as_two_bytes() {
    assert_eq!(assemble_bytes("clr.l r0"), vec![op::CLR_L, 0x00]);
}

#[test]
fn and_zero_folds_byte_identical_to_clr() {
    assert_eq!(assemble_bytes("and.l #0, r0"), assemble_bytes("clr.l r0"));
}

#[test]
fn identity_operations_fold_to_nothing() {
    assert!(assemble_bytes("or.q #0, r0").is_empty());
    assert!(assemble_bytes("add.b #0, r0").is_empty());
    assert!(assemble_bytes("lsl.w #0, r0").is_empty());
}

#[test]
fn register_move_takes_the_fast_path() {
    assert_eq!(assemble_bytes("move.l r1, r0"), vec![op::R2R_MOVE_L, 0x10]);
}

#[test]
fn folding_is_idempotent() {
    // The fold replacement gets exactly one fast-path offer and is then
    // terminal: the clr produced by the and-fold encodes identically when
    // assembled directly, with no further substitution.
    let folded = single_record("and.l #0, r0");
    assert_eq!(folded.notes.len(), 1);
    let direct = single_record("clr.l r0");
    assert!(direct.notes.is_empty());
    assert_eq!(folded.bytes, direct.bytes);
}

#[test]
fn small_immediates_encode_in_the_mode_byte() {
    assert_eq!(
        assemble_bytes("add.l #5, r0"),
        vec![op::ADD_L, 0x00, modes::SMALL_INT + 5]
    );
}

#[test]
fn sign_extended_hex_quad_collapses_to_long() {
    assert_eq!(
        assemble_bytes("move.q #0xFFFFFFFFFFFFFFFF, r0"),
        vec![op::MOVE_Q, 0x00, modes::INT_IMM_L, 0xFF, 0xFF, 0xFF, 0xFF]
    );
}

#[test]
fn same_as_destination_compacts_identical_memory_operands() {
    assert_eq!(
        assemble_bytes("add.l (r0), (r0)"),
        vec![op::ADD_L, modes::IND, 0x00, modes::SAME_AS_DEST]
    );
}

#[test]
fn auto_modes_are_never_cloneable() {
    assert_eq!(
        assemble_bytes("add.l (r0)+, (r0)+"),
        vec![
            op::ADD_L,
            modes::IND_POST_INC,
            0x00,
            modes::IND_POST_INC,
            0x00
        ]
    );
}

#[test]
fn tetradic_fma_packs_four_registers() {
    assert_eq!(
        assemble_bytes("fma.s fp1, fp2, fp3, fp4"),
        vec![op::FMA_S, 0x12, 0x34]
    );
}

#[test]
fn triadic_fmadd_emits_destination_first() {
    assert_eq!(
        assemble_bytes("fmadd.d fp1, fp2, fp3"),
        vec![op::FMADD_D, 0x13, 0x11, 0x12]
    );
}

// --- §address-mode round trips ---------------------------------------

#[test]
fn canonical_forms_decode_back_exactly() {
    // (mode byte, payload) recovered from each canonical surface form.
    let bytes = parse_ea("(r3)", Capability::IntRead, OperationSize::Long);
    assert_eq!(bytes, vec![modes::IND, 3]);

    let bytes = parse_ea("-8(r2)", Capability::IntRead, OperationSize::Long);
    assert_eq!(modes::payload_len(bytes[0]), Some(5));
    assert_eq!(bytes[1], 2);
    assert_eq!(i32::from_le_bytes(bytes[2..6].try_into().unwrap()), -8);

    let bytes = parse_ea("(r1, r2.w*4)", Capability::IntRead, OperationSize::Long);
    assert_eq!(
        modes::family_of(bytes[0]),
        Some(modes::ModeFamily::Indexed)
    );
    assert_eq!(modes::indexed_parts(bytes[0]), (modes::IndexSize::Word, 4));
    assert_eq!(bytes[1], 0x21);

    let bytes = parse_ea("(0x123456789)", Capability::IntRead, OperationSize::Quad);
    assert_eq!(bytes[0], modes::ABS_Q);
    assert_eq!(
        u64::from_le_bytes(bytes[1..9].try_into().unwrap()),
        0x1_2345_6789
    );

    let bytes = parse_ea("#7", Capability::IntRead, OperationSize::Long);
    assert_eq!(bytes, vec![modes::SMALL_INT + 7]);

    let bytes = parse_ea("#1000", Capability::IntRead, OperationSize::Long);
    assert_eq!(bytes[0], modes::INT_IMM_W);
    assert_eq!(i16::from_le_bytes(bytes[1..3].try_into().unwrap()), 1000);

    let bytes = parse_ea("#2.5", Capability::FloatRead, OperationSize::Single);
    assert_eq!(bytes[0], modes::FLT_IMM_S);
    assert_eq!(f32::from_le_bytes(bytes[1..5].try_into().unwrap()), 2.5);
}

#[test]
fn payload_shape_matches_emitted_length_for_every_operand() {
    for text in [
        "r9", "fp2", "(r4)", "(r4)+", "-(sp)", "12(r0)", "(12, r0)", "(r0, r1.b)",
        "4(r0, r1.q*8)", "(pc, r2.l)", "8(pc)", "(4096)", "(4096).q", "#8", "#300",
    ] {
        let capability = Capability::IntRead;
        let bytes = parse_ea(text, capability, OperationSize::Quad);
        let payload = modes::payload_len(bytes[0]).expect("assigned mode byte");
        assert_eq!(bytes.len(), 1 + payload, "length mismatch for {text}");
    }
}

// --- §branches --------------------------------------------------------

#[test]
fn explicit_short_branch_encodes_verbatim() {
    assert_eq!(assemble_bytes("bra.b #1"), vec![op::BRA_B, 0x01]);
    assert_eq!(assemble_bytes("bra.b #127"), vec![op::BRA_B, 0x7F]);
}

#[test]
fn short_branch_range_is_enforced() {
    let err = assemble_err("bra.b #128");
    assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
}

#[test]
fn branch_into_own_instruction_is_fatal() {
    let err = assemble_err("bra.b #-1");
    assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
    let err = assemble_err("bra.b #-2");
    assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
}

#[test]
fn branch_to_next_instruction_folds_to_nothing() {
    assert!(assemble_bytes("bra #0").is_empty());
}

#[test]
fn resolved_backward_branch_compacts_to_short_form() {
    let bytes = assemble_bytes("loop: add.l r1, r0\nbra loop");
    assert_eq!(
        bytes,
        vec![op::R2R_ADD_L, 0x10, op::BRA_B, (-4i8) as u8]
    );
}

#[test]
fn unconditional_self_branch_is_fatal() {
    let err = assemble_err("loop: bra loop");
    assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
}

#[test]
fn self_branch_with_side_effecting_operand_is_allowed() {
    let bytes = assemble_bytes("loop: biz.q (r0)+, loop");
    assert_eq!(bytes[0], op::BMC);
    assert_eq!(bytes[2], modes::IND_POST_INC);
    assert_eq!(
        i32::from_le_bytes(bytes[4..8].try_into().unwrap()),
        -(bytes.len() as i32)
    );
}

#[test]
fn backward_displacement_magnitude_is_at_least_instruction_length() {
    // |d| >= L for every backward branch without side effects; the
    // boundary case |d| == L is rejected above.
    let bytes = assemble_bytes("start: clr.l r0\nloop: sub.q r2, r3\nbra loop");
    let disp = bytes[bytes.len() - 1] as i8;
    assert!(disp < 0);
    assert!((-disp) as usize >= 2);
}

#[test]
fn forward_reference_is_patched_by_the_sweep() {
    let bytes = assemble_bytes("bra skip\nclr.l r0\nskip: rts");
    assert_eq!(bytes[0], op::BRA);
    assert_eq!(i32::from_le_bytes(bytes[1..5].try_into().unwrap()), 2);
    assert_eq!(&bytes[5..], &[op::CLR_L, 0x00, op::RTS]);
}

#[test]
fn sweep_rejects_zero_branch_displacement() {
    // A displacement of zero is only legal when the branch was folded
    // away; once bytes are emitted it cannot be.
    let err = assemble_err("bra next\nnext: rts");
    assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
}

#[test]
fn zero_displacement_operand_loads_are_fine() {
    // lea is 7 bytes: opcode, destination register, pc-disp operand. The
    // displacement field patches to zero, addressing the byte right after
    // itself, which is a perfectly ordinary effective address.
    let bytes = assemble_bytes("lea next(pc), r0\nnext: rts");
    assert_eq!(bytes[0], op::LEA);
    assert_eq!(bytes[2], modes::PC_DISP);
    assert_eq!(i32::from_le_bytes(bytes[3..7].try_into().unwrap()), 0);
    assert_eq!(bytes[7], op::RTS);
}

#[test]
fn short_forward_reference_is_range_checked_at_the_sweep() {
    let mut source = String::from("bra.b far\n");
    for _ in 0..70 {
        source.push_str("clr.q r1\n");
    }
    source.push_str("far: rts\n");
    let err = assemble_err(&source);
    assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
}

// --- §conditional folds ----------------------------------------------

#[test]
fn statically_true_compare_branch_becomes_unconditional() {
    // Original: [BDC][cc][#3][#3][disp32] = 8 bytes; the forward
    // displacement is copied verbatim into the short branch.
    assert_eq!(assemble_bytes("beq.l #3, #3, #8"), vec![op::BRA_B, 0x08]);
}

#[test]
fn statically_false_compare_branch_elides() {
    assert!(assemble_bytes("beq.l #3, #4, #8").is_empty());
}

#[test]
fn folded_branch_to_label_still_resolves_forward() {
    let bytes = assemble_bytes("beq.l #1, #1, target\nclr.l r0\ntarget: rts");
    assert_eq!(bytes[0], op::BRA);
    assert_eq!(i32::from_le_bytes(bytes[1..5].try_into().unwrap()), 2);
}

#[test]
fn unsigned_and_signed_compare_folds_differ() {
    // -1 unsigned is the maximum value: blo never branches, bhi always.
    assert!(assemble_bytes("blo.b #-1, #1, #8").is_empty());
    assert_eq!(assemble_bytes("bhi.b #-1, #1, #8"), vec![op::BRA_B, 0x08]);
}

#[test]
fn eliding_a_branch_with_side_effects_is_unhandled() {
    let err = assemble_err("biz.q (r0)+, #0");
    assert_eq!(err.kind(), AsmErrorKind::UnhandledFold);
}

#[test]
fn condition_set_folds_to_byte_load() {
    assert_eq!(
        assemble_bytes("seq.l #3, #3, r5"),
        vec![op::MOVE_B, 0x05, modes::SMALL_INT + 1]
    );
    assert_eq!(assemble_bytes("sne.l #3, #3, r5"), vec![op::CLR_B, 0x05]);
}

// --- §float folds -----------------------------------------------------

#[test]
fn fmul_by_minus_one_reaches_the_fneg_fast_path() {
    let record = single_record("fmul.s #-1.0, fp3");
    assert_eq!(record.bytes, vec![op::R2R_FNEG_S, 0x33]);
    // Fold note plus fast-path note: the single re-offer happened.
    assert_eq!(record.notes.len(), 2);
}

#[test]
fn transcendental_fold_loads_the_precomputed_constant() {
    let bytes = assemble_bytes("fsin.d #0.0, fp1");
    assert_eq!(bytes[0], op::FMOVE_D);
    assert_eq!(bytes[1], modes::float_direct(1));
    assert_eq!(bytes[2], modes::FLT_IMM_D);
    assert_eq!(&bytes[3..], &0.0f64.to_le_bytes());
}

#[test]
fn non_finite_fold_is_fatal() {
    let err = assemble_err("flogn.d #0.0, fp0");
    assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
}

#[test]
fn domain_errors_in_folds_are_fatal() {
    let err = assemble_err("fasin.d #2.0, fp0");
    assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
    let err = assemble_err("flog2.s #0.0, fp0");
    assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
}

#[test]
fn sign_extension_ops_are_monadic() {
    assert_eq!(assemble_bytes("extb.q r4"), vec![op::EXTB_Q, 0x04]);
    assert_eq!(
        assemble_bytes("extl.q (r2)"),
        vec![op::EXTL_Q, modes::IND, 0x02]
    );
}

#[test]
fn single_precision_overflow_is_fatal() {
    let err = assemble_err("fmove.s #1.0e39, fp0");
    assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
}

// --- §labels ----------------------------------------------------------

#[test]
fn duplicate_label_reports_prior_declaration() {
    let err = assemble_err("start: rts\nstart: rts");
    assert_eq!(err.kind(), AsmErrorKind::DuplicateLabel);
    assert!(err.message().contains("test.f64:1"));
}

#[test]
fn undeclared_label_reports_every_referencing_line() {
    let err = assemble_err("bra nowhere\nbra nowhere");
    assert_eq!(err.kind(), AsmErrorKind::UndeclaredLabel);
    assert!(err.message().contains("test.f64:1"));
    assert!(err.message().contains("test.f64:2"));
}

#[test]
fn local_labels_are_scoped_to_their_file() {
    let mut assembler = Assembler::new();
    assemble_file_text(&mut assembler, "one.f64", ".done: rts").unwrap();
    assemble_file_text(&mut assembler, "two.f64", "bra .done").unwrap();
    let err = assembler.finalize().expect_err("local label must not leak");
    assert_eq!(err.kind(), AsmErrorKind::UndeclaredLabel);
}

#[test]
fn local_labels_resolve_within_their_file() {
    let bytes = assemble_bytes("bra .done\nclr.l r0\n.done: rts");
    assert_eq!(i32::from_le_bytes(bytes[1..5].try_into().unwrap()), 2);
}

#[test]
fn global_labels_resolve_across_files() {
    let mut assembler = Assembler::new();
    assemble_file_text(&mut assembler, "one.f64", "bra entry").unwrap();
    assemble_file_text(&mut assembler, "two.f64", "clr.l r0\nentry: rts").unwrap();
    let output = assembler.finalize().unwrap();
    // entry sits at offset 7; the displacement is measured from the byte
    // after the 5-byte branch.
    assert_eq!(
        i32::from_le_bytes(output.bytes[1..5].try_into().unwrap()),
        2
    );
}

// --- §exports and imports ---------------------------------------------

#[test]
fn exports_carry_resolved_offsets() {
    let mut assembler = Assembler::new();
    assemble_file_text(
        &mut assembler,
        "main.f64",
        "@export main\nclr.l r0\nmain: rts",
    )
    .unwrap();
    let output = assembler.finalize().unwrap();
    assert_eq!(output.exports, vec![("main".to_string(), 2)]);
}

#[test]
fn exporting_an_undeclared_label_is_fatal() {
    let err = assemble_err("@export ghost\nrts");
    assert_eq!(err.kind(), AsmErrorKind::UndeclaredLabel);
}

#[test]
fn imported_references_survive_to_link_time() {
    let mut assembler = Assembler::new();
    assemble_file_text(&mut assembler, "main.f64", "@import ext\nbra ext").unwrap();
    let output = assembler.finalize().unwrap();
    assert_eq!(output.imports.len(), 1);
    let reference = &output.imports[0];
    assert_eq!(reference.name, "ext");
    assert_eq!(reference.patch_offset, 1);
    assert_eq!(reference.width, 4);
    // The placeholder stays zero for the linker.
    assert_eq!(&output.bytes[1..5], &[0, 0, 0, 0]);
}

#[test]
fn link_manifest_lists_exports_and_imports() {
    let mut assembler = Assembler::new();
    assemble_file_text(
        &mut assembler,
        "main.f64",
        "@export main\n@import ext\nmain: bra ext",
    )
    .unwrap();
    let output = assembler.finalize().unwrap();
    let manifest = assembler.link_manifest(&output);
    assert_eq!(manifest["exports"][0]["name"], "main");
    assert_eq!(manifest["imports"][0]["name"], "ext");
    assert_eq!(manifest["imports"][0]["file"], "main.f64");
}

// --- §errors ----------------------------------------------------------

#[test]
fn unknown_mnemonic_is_an_instruction_error() {
    let err = assemble_err("frobnicate r0");
    assert_eq!(err.kind(), AsmErrorKind::Instruction);
}

#[test]
fn unmatched_operand_is_malformed() {
    let err = assemble_err("add.l !!, r0");
    assert_eq!(err.kind(), AsmErrorKind::MalformedOperand);
}

#[test]
fn immediate_destination_is_malformed() {
    let err = assemble_err("move.l r0, #5");
    assert_eq!(err.kind(), AsmErrorKind::MalformedOperand);
}

#[test]
fn arity_mismatch_is_an_instruction_error() {
    let err = assemble_err("move.l r0");
    assert_eq!(err.kind(), AsmErrorKind::Instruction);
}

#[test]
fn immediate_wider_than_operation_is_out_of_range() {
    let err = assemble_err("add.b #300, r0");
    assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
}

#[test]
fn division_by_constant_zero_is_fatal() {
    let err = assemble_err("divs.l #0, r0");
    assert_eq!(err.kind(), AsmErrorKind::OutOfRange);
}

#[test]
fn finalize_runs_exactly_once() {
    let mut assembler = Assembler::new();
    assemble_file_text(&mut assembler, "main.f64", "rts").unwrap();
    assembler.finalize().unwrap();
    assert!(assembler.finalize().is_err());
}
