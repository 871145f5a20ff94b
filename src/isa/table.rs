// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The mnemonic lookup table.
//!
//! One entry per surface mnemonic, carrying the composite opcode, the
//! operand-set shape, and the declared operation size. The table also
//! backs the composite-opcode operand-width lookup the optimization
//! pipeline uses when it re-derives encodings.

use crate::core::size::OperationSize::{self, Byte, Double, Long, Quad, Single, Word};
use crate::ea::Capability;

use super::conditions as cond;
use super::opcodes as op;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    None,
    Monadic { ea: Capability },
    Dyadic { src: Capability, dst: Capability },
    Triadic { src1: Capability, src2: Capability, dst: Capability },
    TetradicRegs,
    Branch { short: bool },
    MonadicBranch { src: Capability },
    DyadicBranch { src: Capability },
    MonadicSet { src: Capability },
    DyadicSet { src: Capability },
}

#[derive(Debug, Clone, Copy)]
pub struct InstructionEntry {
    pub mnemonic: &'static str,
    pub opcode: u16,
    pub shape: OperandShape,
    pub size: OperationSize,
}

const fn plain(opcode: u8) -> u16 {
    opcode as u16
}

const fn cc(opcode: u8, condition: u8) -> u16 {
    ((opcode as u16) << 8) | condition as u16
}

const fn entry(
    mnemonic: &'static str,
    opcode: u16,
    shape: OperandShape,
    size: OperationSize,
) -> InstructionEntry {
    InstructionEntry {
        mnemonic,
        opcode,
        shape,
        size,
    }
}

const DY_INT: OperandShape = OperandShape::Dyadic {
    src: Capability::IntRead,
    dst: Capability::IntWrite,
};
const DY_FLT: OperandShape = OperandShape::Dyadic {
    src: Capability::FloatRead,
    dst: Capability::FloatWrite,
};
const DY_SWAP: OperandShape = OperandShape::Dyadic {
    src: Capability::IntWrite,
    dst: Capability::IntWrite,
};
const DY_FSWAP: OperandShape = OperandShape::Dyadic {
    src: Capability::FloatWrite,
    dst: Capability::FloatWrite,
};
const DY_LEA: OperandShape = OperandShape::Dyadic {
    src: Capability::Control,
    dst: Capability::IntWrite,
};
const MO_INT: OperandShape = OperandShape::Monadic {
    ea: Capability::IntWrite,
};
const MO_CTL: OperandShape = OperandShape::Monadic {
    ea: Capability::Control,
};
const TRI_FLT: OperandShape = OperandShape::Triadic {
    src1: Capability::FloatRead,
    src2: Capability::FloatRead,
    dst: Capability::FloatWrite,
};
const BR_S: OperandShape = OperandShape::Branch { short: true };
const BR_L: OperandShape = OperandShape::Branch { short: false };
const MB_INT: OperandShape = OperandShape::MonadicBranch {
    src: Capability::IntRead,
};
const MB_FLT: OperandShape = OperandShape::MonadicBranch {
    src: Capability::FloatRead,
};
const DB_INT: OperandShape = OperandShape::DyadicBranch {
    src: Capability::IntRead,
};
const DB_FLT: OperandShape = OperandShape::DyadicBranch {
    src: Capability::FloatRead,
};
const MS_INT: OperandShape = OperandShape::MonadicSet {
    src: Capability::IntRead,
};
const DS_INT: OperandShape = OperandShape::DyadicSet {
    src: Capability::IntRead,
};

pub static INSTRUCTION_TABLE: &[InstructionEntry] = &[
    // Control flow.
    entry("hcf", plain(op::HCF), OperandShape::None, Quad),
    entry("nop", plain(op::NOP), OperandShape::None, Quad),
    entry("rts", plain(op::RTS), OperandShape::None, Quad),
    entry("bra.b", plain(op::BRA_B), BR_S, Quad),
    entry("bra", plain(op::BRA), BR_L, Quad),
    entry("bsr.b", plain(op::BSR_B), BR_S, Quad),
    entry("bsr", plain(op::BSR), BR_L, Quad),
    entry("jmp", plain(op::JMP), MO_CTL, Quad),
    entry("jsr", plain(op::JSR), MO_CTL, Quad),
    // Monadic conditional branches.
    entry("biz.b", cc(op::BMC, cond::IZ_B), MB_INT, Byte),
    entry("biz.w", cc(op::BMC, cond::IZ_B + 1), MB_INT, Word),
    entry("biz.l", cc(op::BMC, cond::IZ_B + 2), MB_INT, Long),
    entry("biz.q", cc(op::BMC, cond::IZ_B + 3), MB_INT, Quad),
    entry("bnz.b", cc(op::BMC, cond::NZ_B), MB_INT, Byte),
    entry("bnz.w", cc(op::BMC, cond::NZ_B + 1), MB_INT, Word),
    entry("bnz.l", cc(op::BMC, cond::NZ_B + 2), MB_INT, Long),
    entry("bnz.q", cc(op::BMC, cond::NZ_B + 3), MB_INT, Quad),
    entry("bmi.b", cc(op::BMC, cond::MI_B), MB_INT, Byte),
    entry("bmi.w", cc(op::BMC, cond::MI_B + 1), MB_INT, Word),
    entry("bmi.l", cc(op::BMC, cond::MI_B + 2), MB_INT, Long),
    entry("bmi.q", cc(op::BMC, cond::MI_B + 3), MB_INT, Quad),
    entry("bpl.b", cc(op::BMC, cond::PL_B), MB_INT, Byte),
    entry("bpl.w", cc(op::BMC, cond::PL_B + 1), MB_INT, Word),
    entry("bpl.l", cc(op::BMC, cond::PL_B + 2), MB_INT, Long),
    entry("bpl.q", cc(op::BMC, cond::PL_B + 3), MB_INT, Quad),
    entry("fbiz.s", cc(op::BMC, cond::FIZ_S), MB_FLT, Single),
    entry("fbiz.d", cc(op::BMC, cond::FIZ_S + 1), MB_FLT, Double),
    entry("fbnz.s", cc(op::BMC, cond::FNZ_S), MB_FLT, Single),
    entry("fbnz.d", cc(op::BMC, cond::FNZ_S + 1), MB_FLT, Double),
    // Compare-and-branch.
    entry("beq.b", cc(op::BDC, cond::EQ_B), DB_INT, Byte),
    entry("beq.w", cc(op::BDC, cond::EQ_B + 1), DB_INT, Word),
    entry("beq.l", cc(op::BDC, cond::EQ_B + 2), DB_INT, Long),
    entry("beq.q", cc(op::BDC, cond::EQ_B + 3), DB_INT, Quad),
    entry("bne.b", cc(op::BDC, cond::NE_B), DB_INT, Byte),
    entry("bne.w", cc(op::BDC, cond::NE_B + 1), DB_INT, Word),
    entry("bne.l", cc(op::BDC, cond::NE_B + 2), DB_INT, Long),
    entry("bne.q", cc(op::BDC, cond::NE_B + 3), DB_INT, Quad),
    entry("blt.b", cc(op::BDC, cond::LT_B), DB_INT, Byte),
    entry("blt.w", cc(op::BDC, cond::LT_B + 1), DB_INT, Word),
    entry("blt.l", cc(op::BDC, cond::LT_B + 2), DB_INT, Long),
    entry("blt.q", cc(op::BDC, cond::LT_B + 3), DB_INT, Quad),
    entry("ble.b", cc(op::BDC, cond::LE_B), DB_INT, Byte),
    entry("ble.w", cc(op::BDC, cond::LE_B + 1), DB_INT, Word),
    entry("ble.l", cc(op::BDC, cond::LE_B + 2), DB_INT, Long),
    entry("ble.q", cc(op::BDC, cond::LE_B + 3), DB_INT, Quad),
    entry("bgt.b", cc(op::BDC, cond::GT_B), DB_INT, Byte),
    entry("bgt.w", cc(op::BDC, cond::GT_B + 1), DB_INT, Word),
    entry("bgt.l", cc(op::BDC, cond::GT_B + 2), DB_INT, Long),
    entry("bgt.q", cc(op::BDC, cond::GT_B + 3), DB_INT, Quad),
    entry("bge.b", cc(op::BDC, cond::GE_B), DB_INT, Byte),
    entry("bge.w", cc(op::BDC, cond::GE_B + 1), DB_INT, Word),
    entry("bge.l", cc(op::BDC, cond::GE_B + 2), DB_INT, Long),
    entry("bge.q", cc(op::BDC, cond::GE_B + 3), DB_INT, Quad),
    entry("blo.b", cc(op::BDC, cond::LO_B), DB_INT, Byte),
    entry("blo.w", cc(op::BDC, cond::LO_B + 1), DB_INT, Word),
    entry("blo.l", cc(op::BDC, cond::LO_B + 2), DB_INT, Long),
    entry("blo.q", cc(op::BDC, cond::LO_B + 3), DB_INT, Quad),
    entry("bls.b", cc(op::BDC, cond::LS_B), DB_INT, Byte),
    entry("bls.w", cc(op::BDC, cond::LS_B + 1), DB_INT, Word),
    entry("bls.l", cc(op::BDC, cond::LS_B + 2), DB_INT, Long),
    entry("bls.q", cc(op::BDC, cond::LS_B + 3), DB_INT, Quad),
    entry("bhi.b", cc(op::BDC, cond::HI_B), DB_INT, Byte),
    entry("bhi.w", cc(op::BDC, cond::HI_B + 1), DB_INT, Word),
    entry("bhi.l", cc(op::BDC, cond::HI_B + 2), DB_INT, Long),
    entry("bhi.q", cc(op::BDC, cond::HI_B + 3), DB_INT, Quad),
    entry("bhs.b", cc(op::BDC, cond::HS_B), DB_INT, Byte),
    entry("bhs.w", cc(op::BDC, cond::HS_B + 1), DB_INT, Word),
    entry("bhs.l", cc(op::BDC, cond::HS_B + 2), DB_INT, Long),
    entry("bhs.q", cc(op::BDC, cond::HS_B + 3), DB_INT, Quad),
    entry("fbeq.s", cc(op::BDC, cond::FEQ_S), DB_FLT, Single),
    entry("fbeq.d", cc(op::BDC, cond::FEQ_S + 1), DB_FLT, Double),
    entry("fbne.s", cc(op::BDC, cond::FNE_S), DB_FLT, Single),
    entry("fbne.d", cc(op::BDC, cond::FNE_S + 1), DB_FLT, Double),
    entry("fblt.s", cc(op::BDC, cond::FLT_S), DB_FLT, Single),
    entry("fblt.d", cc(op::BDC, cond::FLT_S + 1), DB_FLT, Double),
    entry("fble.s", cc(op::BDC, cond::FLE_S), DB_FLT, Single),
    entry("fble.d", cc(op::BDC, cond::FLE_S + 1), DB_FLT, Double),
    entry("fbgt.s", cc(op::BDC, cond::FGT_S), DB_FLT, Single),
    entry("fbgt.d", cc(op::BDC, cond::FGT_S + 1), DB_FLT, Double),
    entry("fbge.s", cc(op::BDC, cond::FGE_S), DB_FLT, Single),
    entry("fbge.d", cc(op::BDC, cond::FGE_S + 1), DB_FLT, Double),
    // Monadic condition sets.
    entry("siz.b", cc(op::SMC, cond::IZ_B), MS_INT, Byte),
    entry("siz.w", cc(op::SMC, cond::IZ_B + 1), MS_INT, Word),
    entry("siz.l", cc(op::SMC, cond::IZ_B + 2), MS_INT, Long),
    entry("siz.q", cc(op::SMC, cond::IZ_B + 3), MS_INT, Quad),
    entry("snz.b", cc(op::SMC, cond::NZ_B), MS_INT, Byte),
    entry("snz.w", cc(op::SMC, cond::NZ_B + 1), MS_INT, Word),
    entry("snz.l", cc(op::SMC, cond::NZ_B + 2), MS_INT, Long),
    entry("snz.q", cc(op::SMC, cond::NZ_B + 3), MS_INT, Quad),
    entry("smi.b", cc(op::SMC, cond::MI_B), MS_INT, Byte),
    entry("smi.w", cc(op::SMC, cond::MI_B + 1), MS_INT, Word),
    entry("smi.l", cc(op::SMC, cond::MI_B + 2), MS_INT, Long),
    entry("smi.q", cc(op::SMC, cond::MI_B + 3), MS_INT, Quad),
    entry("spl.b", cc(op::SMC, cond::PL_B), MS_INT, Byte),
    entry("spl.w", cc(op::SMC, cond::PL_B + 1), MS_INT, Word),
    entry("spl.l", cc(op::SMC, cond::PL_B + 2), MS_INT, Long),
    entry("spl.q", cc(op::SMC, cond::PL_B + 3), MS_INT, Quad),
    // Compare sets.
    entry("seq.b", cc(op::SDC, cond::EQ_B), DS_INT, Byte),
    entry("seq.w", cc(op::SDC, cond::EQ_B + 1), DS_INT, Word),
    entry("seq.l", cc(op::SDC, cond::EQ_B + 2), DS_INT, Long),
    entry("seq.q", cc(op::SDC, cond::EQ_B + 3), DS_INT, Quad),
    entry("sne.b", cc(op::SDC, cond::NE_B), DS_INT, Byte),
    entry("sne.w", cc(op::SDC, cond::NE_B + 1), DS_INT, Word),
    entry("sne.l", cc(op::SDC, cond::NE_B + 2), DS_INT, Long),
    entry("sne.q", cc(op::SDC, cond::NE_B + 3), DS_INT, Quad),
    entry("slt.b", cc(op::SDC, cond::LT_B), DS_INT, Byte),
    entry("slt.w", cc(op::SDC, cond::LT_B + 1), DS_INT, Word),
    entry("slt.l", cc(op::SDC, cond::LT_B + 2), DS_INT, Long),
    entry("slt.q", cc(op::SDC, cond::LT_B + 3), DS_INT, Quad),
    entry("sle.b", cc(op::SDC, cond::LE_B), DS_INT, Byte),
    entry("sle.w", cc(op::SDC, cond::LE_B + 1), DS_INT, Word),
    entry("sle.l", cc(op::SDC, cond::LE_B + 2), DS_INT, Long),
    entry("sle.q", cc(op::SDC, cond::LE_B + 3), DS_INT, Quad),
    entry("sgt.b", cc(op::SDC, cond::GT_B), DS_INT, Byte),
    entry("sgt.w", cc(op::SDC, cond::GT_B + 1), DS_INT, Word),
    entry("sgt.l", cc(op::SDC, cond::GT_B + 2), DS_INT, Long),
    entry("sgt.q", cc(op::SDC, cond::GT_B + 3), DS_INT, Quad),
    entry("sge.b", cc(op::SDC, cond::GE_B), DS_INT, Byte),
    entry("sge.w", cc(op::SDC, cond::GE_B + 1), DS_INT, Word),
    entry("sge.l", cc(op::SDC, cond::GE_B + 2), DS_INT, Long),
    entry("sge.q", cc(op::SDC, cond::GE_B + 3), DS_INT, Quad),
    entry("slo.b", cc(op::SDC, cond::LO_B), DS_INT, Byte),
    entry("slo.w", cc(op::SDC, cond::LO_B + 1), DS_INT, Word),
    entry("slo.l", cc(op::SDC, cond::LO_B + 2), DS_INT, Long),
    entry("slo.q", cc(op::SDC, cond::LO_B + 3), DS_INT, Quad),
    entry("sls.b", cc(op::SDC, cond::LS_B), DS_INT, Byte),
    entry("sls.w", cc(op::SDC, cond::LS_B + 1), DS_INT, Word),
    entry("sls.l", cc(op::SDC, cond::LS_B + 2), DS_INT, Long),
    entry("sls.q", cc(op::SDC, cond::LS_B + 3), DS_INT, Quad),
    entry("shi.b", cc(op::SDC, cond::HI_B), DS_INT, Byte),
    entry("shi.w", cc(op::SDC, cond::HI_B + 1), DS_INT, Word),
    entry("shi.l", cc(op::SDC, cond::HI_B + 2), DS_INT, Long),
    entry("shi.q", cc(op::SDC, cond::HI_B + 3), DS_INT, Quad),
    entry("shs.b", cc(op::SDC, cond::HS_B), DS_INT, Byte),
    entry("shs.w", cc(op::SDC, cond::HS_B + 1), DS_INT, Word),
    entry("shs.l", cc(op::SDC, cond::HS_B + 2), DS_INT, Long),
    entry("shs.q", cc(op::SDC, cond::HS_B + 3), DS_INT, Quad),
    // Data movement.
    entry("move.b", plain(op::MOVE_B), DY_INT, Byte),
    entry("move.w", plain(op::MOVE_W), DY_INT, Word),
    entry("move.l", plain(op::MOVE_L), DY_INT, Long),
    entry("move.q", plain(op::MOVE_Q), DY_INT, Quad),
    entry("fmove.s", plain(op::FMOVE_S), DY_FLT, Single),
    entry("fmove.d", plain(op::FMOVE_D), DY_FLT, Double),
    entry("lea", plain(op::LEA), DY_LEA, Quad),
    entry("clr.b", plain(op::CLR_B), MO_INT, Byte),
    entry("clr.w", plain(op::CLR_W), MO_INT, Word),
    entry("clr.l", plain(op::CLR_L), MO_INT, Long),
    entry("clr.q", plain(op::CLR_Q), MO_INT, Quad),
    entry("exg", plain(op::EXG), DY_SWAP, Quad),
    entry("fexg", plain(op::FEXG), DY_FSWAP, Double),
    // Integer arithmetic.
    entry("add.b", plain(op::ADD_B), DY_INT, Byte),
    entry("add.w", plain(op::ADD_W), DY_INT, Word),
    entry("add.l", plain(op::ADD_L), DY_INT, Long),
    entry("add.q", plain(op::ADD_Q), DY_INT, Quad),
    entry("sub.b", plain(op::SUB_B), DY_INT, Byte),
    entry("sub.w", plain(op::SUB_W), DY_INT, Word),
    entry("sub.l", plain(op::SUB_L), DY_INT, Long),
    entry("sub.q", plain(op::SUB_Q), DY_INT, Quad),
    entry("neg.b", plain(op::NEG_B), MO_INT, Byte),
    entry("neg.w", plain(op::NEG_W), MO_INT, Word),
    entry("neg.l", plain(op::NEG_L), MO_INT, Long),
    entry("neg.q", plain(op::NEG_Q), MO_INT, Quad),
    entry("muls.b", plain(op::MULS_B), DY_INT, Byte),
    entry("muls.w", plain(op::MULS_W), DY_INT, Word),
    entry("muls.l", plain(op::MULS_L), DY_INT, Long),
    entry("muls.q", plain(op::MULS_Q), DY_INT, Quad),
    entry("mulu.b", plain(op::MULU_B), DY_INT, Byte),
    entry("mulu.w", plain(op::MULU_W), DY_INT, Word),
    entry("mulu.l", plain(op::MULU_L), DY_INT, Long),
    entry("mulu.q", plain(op::MULU_Q), DY_INT, Quad),
    entry("divs.b", plain(op::DIVS_B), DY_INT, Byte),
    entry("divs.w", plain(op::DIVS_W), DY_INT, Word),
    entry("divs.l", plain(op::DIVS_L), DY_INT, Long),
    entry("divs.q", plain(op::DIVS_Q), DY_INT, Quad),
    entry("divu.b", plain(op::DIVU_B), DY_INT, Byte),
    entry("divu.w", plain(op::DIVU_W), DY_INT, Word),
    entry("divu.l", plain(op::DIVU_L), DY_INT, Long),
    entry("divu.q", plain(op::DIVU_Q), DY_INT, Quad),
    // Logic and shifts.
    entry("and.b", plain(op::AND_B), DY_INT, Byte),
    entry("and.w", plain(op::AND_W), DY_INT, Word),
    entry("and.l", plain(op::AND_L), DY_INT, Long),
    entry("and.q", plain(op::AND_Q), DY_INT, Quad),
    entry("or.b", plain(op::OR_B), DY_INT, Byte),
    entry("or.w", plain(op::OR_W), DY_INT, Word),
    entry("or.l", plain(op::OR_L), DY_INT, Long),
    entry("or.q", plain(op::OR_Q), DY_INT, Quad),
    entry("eor.b", plain(op::EOR_B), DY_INT, Byte),
    entry("eor.w", plain(op::EOR_W), DY_INT, Word),
    entry("eor.l", plain(op::EOR_L), DY_INT, Long),
    entry("eor.q", plain(op::EOR_Q), DY_INT, Quad),
    entry("not.b", plain(op::NOT_B), MO_INT, Byte),
    entry("not.w", plain(op::NOT_W), MO_INT, Word),
    entry("not.l", plain(op::NOT_L), MO_INT, Long),
    entry("not.q", plain(op::NOT_Q), MO_INT, Quad),
    entry("lsl.b", plain(op::LSL_B), DY_INT, Byte),
    entry("lsl.w", plain(op::LSL_W), DY_INT, Word),
    entry("lsl.l", plain(op::LSL_L), DY_INT, Long),
    entry("lsl.q", plain(op::LSL_Q), DY_INT, Quad),
    entry("lsr.b", plain(op::LSR_B), DY_INT, Byte),
    entry("lsr.w", plain(op::LSR_W), DY_INT, Word),
    entry("lsr.l", plain(op::LSR_L), DY_INT, Long),
    entry("lsr.q", plain(op::LSR_Q), DY_INT, Quad),
    entry("asr.b", plain(op::ASR_B), DY_INT, Byte),
    entry("asr.w", plain(op::ASR_W), DY_INT, Word),
    entry("asr.l", plain(op::ASR_L), DY_INT, Long),
    entry("asr.q", plain(op::ASR_Q), DY_INT, Quad),
    entry("rol.b", plain(op::ROL_B), DY_INT, Byte),
    entry("rol.w", plain(op::ROL_W), DY_INT, Word),
    entry("rol.l", plain(op::ROL_L), DY_INT, Long),
    entry("rol.q", plain(op::ROL_Q), DY_INT, Quad),
    entry("ror.b", plain(op::ROR_B), DY_INT, Byte),
    entry("ror.w", plain(op::ROR_W), DY_INT, Word),
    entry("ror.l", plain(op::ROR_L), DY_INT, Long),
    entry("ror.q", plain(op::ROR_Q), DY_INT, Quad),
    entry("extb.w", plain(op::EXTB_W), MO_INT, Word),
    entry("extb.l", plain(op::EXTB_L), MO_INT, Long),
    entry("extb.q", plain(op::EXTB_Q), MO_INT, Quad),
    entry("extw.l", plain(op::EXTW_L), MO_INT, Long),
    entry("extw.q", plain(op::EXTW_Q), MO_INT, Quad),
    entry("extl.q", plain(op::EXTL_Q), MO_INT, Quad),
    // Floating point.
    entry("fadd.s", plain(op::FADD_S), DY_FLT, Single),
    entry("fadd.d", plain(op::FADD_D), DY_FLT, Double),
    entry("fsub.s", plain(op::FSUB_S), DY_FLT, Single),
    entry("fsub.d", plain(op::FSUB_D), DY_FLT, Double),
    entry("fmul.s", plain(op::FMUL_S), DY_FLT, Single),
    entry("fmul.d", plain(op::FMUL_D), DY_FLT, Double),
    entry("fdiv.s", plain(op::FDIV_S), DY_FLT, Single),
    entry("fdiv.d", plain(op::FDIV_D), DY_FLT, Double),
    entry("fmod.s", plain(op::FMOD_S), DY_FLT, Single),
    entry("fmod.d", plain(op::FMOD_D), DY_FLT, Double),
    entry("fneg.s", plain(op::FNEG_S), DY_FLT, Single),
    entry("fneg.d", plain(op::FNEG_D), DY_FLT, Double),
    entry("fabs.s", plain(op::FABS_S), DY_FLT, Single),
    entry("fabs.d", plain(op::FABS_D), DY_FLT, Double),
    entry("fsqrt.s", plain(op::FSQRT_S), DY_FLT, Single),
    entry("fsqrt.d", plain(op::FSQRT_D), DY_FLT, Double),
    entry("fsin.s", plain(op::FSIN_S), DY_FLT, Single),
    entry("fsin.d", plain(op::FSIN_D), DY_FLT, Double),
    entry("fcos.s", plain(op::FCOS_S), DY_FLT, Single),
    entry("fcos.d", plain(op::FCOS_D), DY_FLT, Double),
    entry("ftan.s", plain(op::FTAN_S), DY_FLT, Single),
    entry("ftan.d", plain(op::FTAN_D), DY_FLT, Double),
    entry("fexp.s", plain(op::FEXP_S), DY_FLT, Single),
    entry("fexp.d", plain(op::FEXP_D), DY_FLT, Double),
    entry("flogn.s", plain(op::FLOGN_S), DY_FLT, Single),
    entry("flogn.d", plain(op::FLOGN_D), DY_FLT, Double),
    entry("fasin.s", plain(op::FASIN_S), DY_FLT, Single),
    entry("fasin.d", plain(op::FASIN_D), DY_FLT, Double),
    entry("facos.s", plain(op::FACOS_S), DY_FLT, Single),
    entry("facos.d", plain(op::FACOS_D), DY_FLT, Double),
    entry("fatan.s", plain(op::FATAN_S), DY_FLT, Single),
    entry("fatan.d", plain(op::FATAN_D), DY_FLT, Double),
    entry("flog2.s", plain(op::FLOG2_S), DY_FLT, Single),
    entry("flog2.d", plain(op::FLOG2_D), DY_FLT, Double),
    entry("fexp2.s", plain(op::FEXP2_S), DY_FLT, Single),
    entry("fexp2.d", plain(op::FEXP2_D), DY_FLT, Double),
    entry("fmadd.s", plain(op::FMADD_S), TRI_FLT, Single),
    entry("fmadd.d", plain(op::FMADD_D), TRI_FLT, Double),
    entry("fma.s", plain(op::FMA_S), OperandShape::TetradicRegs, Single),
    entry("fma.d", plain(op::FMA_D), OperandShape::TetradicRegs, Double),
];

/// Look a surface mnemonic up, case-insensitively.
pub fn lookup_mnemonic(mnemonic: &str) -> Option<&'static InstructionEntry> {
    INSTRUCTION_TABLE
        .iter()
        .find(|entry| entry.mnemonic.eq_ignore_ascii_case(mnemonic))
}

pub fn has_mnemonic(mnemonic: &str) -> bool {
    lookup_mnemonic(mnemonic).is_some()
}

/// Declared operand width for a full composite opcode.
pub fn operation_size(opcode: u16) -> Option<OperationSize> {
    INSTRUCTION_TABLE
        .iter()
        .find(|entry| entry.opcode == opcode)
        .map(|entry| entry.size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn mnemonics_and_opcodes_are_unique() {
        let mut mnemonics = HashSet::new();
        let mut opcodes = HashSet::new();
        for entry in INSTRUCTION_TABLE {
            assert!(mnemonics.insert(entry.mnemonic), "dup {}", entry.mnemonic);
            assert!(opcodes.insert(entry.opcode), "dup opcode {:#06x}", entry.opcode);
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup_mnemonic("MOVE.L").unwrap().opcode, u16::from(op::MOVE_L));
        assert_eq!(lookup_mnemonic("Bra.B").unwrap().opcode, u16::from(op::BRA_B));
        assert!(lookup_mnemonic("move").is_none());
    }

    #[test]
    fn composite_opcodes_carry_width() {
        let beq_l = lookup_mnemonic("beq.l").unwrap();
        assert_eq!(beq_l.opcode >> 8, u16::from(op::BDC));
        assert_eq!(operation_size(beq_l.opcode), Some(OperationSize::Long));
        assert_eq!(operation_size(u16::from(op::CLR_L)), Some(OperationSize::Long));
    }

    #[test]
    fn condition_sizes_agree_with_entries() {
        use crate::isa::conditions::condition_size;
        for entry in INSTRUCTION_TABLE {
            if entry.opcode > 0xFF {
                let condition = (entry.opcode & 0xFF) as u8;
                assert_eq!(
                    condition_size(condition),
                    Some(entry.size),
                    "size mismatch for {}",
                    entry.mnemonic
                );
            }
        }
    }
}
