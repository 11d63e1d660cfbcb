//! C1: the 256-entry first-byte dispatch table.
//!
//! Every decoding decision — which bytes follow, which side carries the
//! register operand, whether the instruction is word- or byte-wide — is
//! encoded as data here rather than in branching decode logic, so the
//! `0x80..0x83` group's secondary dispatch on ModR/M's middle three bits
//! can reuse the exact same machinery as the primary dispatch.

use bitflags::bitflags;
use once_cell::sync::Lazy;

use crate::opcode::{Opcode, IMM_TO_RM_EXT};

bitflags! {
    /// Bits a [`Recipe`] sets to steer the operand decoder.
    pub(crate) struct RecipeFlags: u16 {
        /// If unset, the reg-side operand is the source.
        const REG_IS_DST    = 1 << 0;
        /// 8-bit immediates are sign-extended to the operand width.
        const SIGN_EXT      = 1 << 1;
        /// Operands are word- (not byte-) wide.
        const WIDTH_WORD    = 1 << 2;
        /// The low 3 bits of byte 1 are a register code.
        const REG_BYTE1     = 1 << 3;
        /// Byte 2 is a ModR/M byte.
        const MOD_RM        = 1 << 4;
        /// The middle 3 bits of byte 2 (ModR/M `reg`) are a register code.
        const REG_BYTE2     = 1 << 5;
        /// The middle 3 bits of byte 2 index `ext_table` for a secondary
        /// opcode dispatch.
        const ADDTL_OP_CODE = 1 << 6;
        /// An immediate operand follows.
        const IMM           = 1 << 7;
        /// A 16-bit direct memory address follows.
        const MEM           = 1 << 8;
        /// The instruction has an implicit AL/AX operand.
        const ACC           = 1 << 9;
        /// The sole operand is an 8-bit signed IP-relative displacement.
        const INC_IP_8BIT   = 1 << 10;
    }
}

/// The decode recipe for one first-opcode-byte value.
#[derive(Clone, Copy)]
pub(crate) struct Recipe {
    pub(crate) opcode: Opcode,
    pub(crate) flags: RecipeFlags,
    pub(crate) ext_table: Option<&'static [Opcode; 8]>,
}

impl Recipe {
    const fn new(opcode: Opcode, flags: RecipeFlags) -> Self {
        Self {
            opcode,
            flags,
            ext_table: None,
        }
    }

    const fn with_ext(opcode: Opcode, flags: RecipeFlags, ext_table: &'static [Opcode; 8]) -> Self {
        Self {
            opcode,
            flags,
            ext_table: Some(ext_table),
        }
    }
}

const REG_IS_DST: RecipeFlags = RecipeFlags::REG_IS_DST;
const SIGN_EXT: RecipeFlags = RecipeFlags::SIGN_EXT;
const WIDTH_WORD: RecipeFlags = RecipeFlags::WIDTH_WORD;
const REG_BYTE1: RecipeFlags = RecipeFlags::REG_BYTE1;
const MOD_RM: RecipeFlags = RecipeFlags::MOD_RM;
const REG_BYTE2: RecipeFlags = RecipeFlags::REG_BYTE2;
const ADDTL_OP_CODE: RecipeFlags = RecipeFlags::ADDTL_OP_CODE;
const IMM: RecipeFlags = RecipeFlags::IMM;
const MEM: RecipeFlags = RecipeFlags::MEM;
const ACC: RecipeFlags = RecipeFlags::ACC;
const INC_IP_8BIT: RecipeFlags = RecipeFlags::INC_IP_8BIT;

/// 256-entry opcode table, indexed by the first instruction byte. `None`
/// means the byte is an undefined first-byte encoding for this decoder's
/// supported subset and decoding must fail with `DecodeError::UnsupportedOpcode`.
pub(crate) static OPCODE_TABLE: Lazy<[Option<Recipe>; 256]> = Lazy::new(build_table);

fn build_table() -> [Option<Recipe>; 256] {
    let mut table: [Option<Recipe>; 256] = [None; 256];

    // ADD r/m,reg | reg,r/m | acc,imm : 0x00..0x05
    table[0x00] = Some(Recipe::new(Opcode::AddRmToFromReg, (MOD_RM | REG_BYTE2)));
    table[0x01] = Some(Recipe::new(
        Opcode::AddRmToFromReg,
        (MOD_RM | REG_BYTE2 | WIDTH_WORD),
    ));
    table[0x02] = Some(Recipe::new(
        Opcode::AddRmToFromReg,
        (MOD_RM | REG_BYTE2 | REG_IS_DST),
    ));
    table[0x03] = Some(Recipe::new(
        Opcode::AddRmToFromReg,
        (MOD_RM | REG_BYTE2 | REG_IS_DST | WIDTH_WORD),
    ));
    table[0x04] = Some(Recipe::new(Opcode::AddImmToAcc, (ACC | IMM | REG_IS_DST)));
    table[0x05] = Some(Recipe::new(
        Opcode::AddImmToAcc,
        (ACC | IMM | REG_IS_DST | WIDTH_WORD),
    ));

    // SUB: 0x28..0x2D
    table[0x28] = Some(Recipe::new(Opcode::SubRmToFromReg, (MOD_RM | REG_BYTE2)));
    table[0x29] = Some(Recipe::new(
        Opcode::SubRmToFromReg,
        (MOD_RM | REG_BYTE2 | WIDTH_WORD),
    ));
    table[0x2A] = Some(Recipe::new(
        Opcode::SubRmToFromReg,
        (MOD_RM | REG_BYTE2 | REG_IS_DST),
    ));
    table[0x2B] = Some(Recipe::new(
        Opcode::SubRmToFromReg,
        (MOD_RM | REG_BYTE2 | REG_IS_DST | WIDTH_WORD),
    ));
    table[0x2C] = Some(Recipe::new(Opcode::SubImmFromAcc, (ACC | IMM | REG_IS_DST)));
    table[0x2D] = Some(Recipe::new(
        Opcode::SubImmFromAcc,
        (ACC | IMM | REG_IS_DST | WIDTH_WORD),
    ));

    // CMP: 0x38..0x3D
    table[0x38] = Some(Recipe::new(Opcode::CmpRmAndReg, (MOD_RM | REG_BYTE2)));
    table[0x39] = Some(Recipe::new(
        Opcode::CmpRmAndReg,
        (MOD_RM | REG_BYTE2 | WIDTH_WORD),
    ));
    table[0x3A] = Some(Recipe::new(
        Opcode::CmpRmAndReg,
        (MOD_RM | REG_BYTE2 | REG_IS_DST),
    ));
    table[0x3B] = Some(Recipe::new(
        Opcode::CmpRmAndReg,
        (MOD_RM | REG_BYTE2 | REG_IS_DST | WIDTH_WORD),
    ));
    table[0x3C] = Some(Recipe::new(Opcode::CmpImmAndAcc, (ACC | IMM | REG_IS_DST)));
    table[0x3D] = Some(Recipe::new(
        Opcode::CmpImmAndAcc,
        (ACC | IMM | REG_IS_DST | WIDTH_WORD),
    ));

    // Conditional jumps: 0x70..0x7F
    table[0x70] = Some(Recipe::new(Opcode::Jo, (INC_IP_8BIT)));
    table[0x71] = Some(Recipe::new(Opcode::Jno, (INC_IP_8BIT)));
    table[0x72] = Some(Recipe::new(Opcode::JbJnae, (INC_IP_8BIT)));
    table[0x73] = Some(Recipe::new(Opcode::JnbJae, (INC_IP_8BIT)));
    table[0x74] = Some(Recipe::new(Opcode::JeJz, (INC_IP_8BIT)));
    table[0x75] = Some(Recipe::new(Opcode::JneJnz, (INC_IP_8BIT)));
    table[0x76] = Some(Recipe::new(Opcode::JbeJna, (INC_IP_8BIT)));
    table[0x77] = Some(Recipe::new(Opcode::JnbeJa, (INC_IP_8BIT)));
    table[0x78] = Some(Recipe::new(Opcode::Js, (INC_IP_8BIT)));
    table[0x79] = Some(Recipe::new(Opcode::Jns, (INC_IP_8BIT)));
    table[0x7A] = Some(Recipe::new(Opcode::JpJpe, (INC_IP_8BIT)));
    table[0x7B] = Some(Recipe::new(Opcode::JnpJpo, (INC_IP_8BIT)));
    table[0x7C] = Some(Recipe::new(Opcode::JlJnge, (INC_IP_8BIT)));
    table[0x7D] = Some(Recipe::new(Opcode::JnlJge, (INC_IP_8BIT)));
    table[0x7E] = Some(Recipe::new(Opcode::JleJng, (INC_IP_8BIT)));
    table[0x7F] = Some(Recipe::new(Opcode::JnleJg, (INC_IP_8BIT)));

    // ImmToRm group: 0x80..0x83, dispatched further by ModR/M's reg field.
    table[0x80] = Some(Recipe::with_ext(
        Opcode::AddImmToRm,
        (MOD_RM | ADDTL_OP_CODE | IMM),
        &IMM_TO_RM_EXT,
    ));
    table[0x81] = Some(Recipe::with_ext(
        Opcode::AddImmToRm,
        (MOD_RM | ADDTL_OP_CODE | IMM | WIDTH_WORD),
        &IMM_TO_RM_EXT,
    ));
    table[0x82] = Some(Recipe::with_ext(
        Opcode::AddImmToRm,
        (MOD_RM | ADDTL_OP_CODE | IMM | SIGN_EXT),
        &IMM_TO_RM_EXT,
    ));
    table[0x83] = Some(Recipe::with_ext(
        Opcode::AddImmToRm,
        (MOD_RM | ADDTL_OP_CODE | IMM | SIGN_EXT | WIDTH_WORD),
        &IMM_TO_RM_EXT,
    ));

    // MOV r/m <-> reg: 0x88..0x8B
    table[0x88] = Some(Recipe::new(Opcode::MovRmToFromReg, (MOD_RM | REG_BYTE2)));
    table[0x89] = Some(Recipe::new(
        Opcode::MovRmToFromReg,
        (MOD_RM | REG_BYTE2 | WIDTH_WORD),
    ));
    table[0x8A] = Some(Recipe::new(
        Opcode::MovRmToFromReg,
        (MOD_RM | REG_BYTE2 | REG_IS_DST),
    ));
    table[0x8B] = Some(Recipe::new(
        Opcode::MovRmToFromReg,
        (MOD_RM | REG_BYTE2 | REG_IS_DST | WIDTH_WORD),
    ));

    // MOV acc <-> direct memory: 0xA0..0xA3
    table[0xA0] = Some(Recipe::new(Opcode::MovMemToAcc, (ACC | MEM | REG_IS_DST)));
    table[0xA1] = Some(Recipe::new(
        Opcode::MovMemToAcc,
        (ACC | MEM | REG_IS_DST | WIDTH_WORD),
    ));
    table[0xA2] = Some(Recipe::new(Opcode::MovAccToMem, (ACC | MEM)));
    table[0xA3] = Some(Recipe::new(Opcode::MovAccToMem, (ACC | MEM | WIDTH_WORD)));

    // MOV imm -> reg: 0xB0..0xBF
    for reg_code in 0..8 {
        table[0xB0 + reg_code] = Some(Recipe::new(
            Opcode::MovImmToReg,
            (REG_BYTE1 | REG_IS_DST | IMM),
        ));
        table[0xB8 + reg_code] = Some(Recipe::new(
            Opcode::MovImmToReg,
            (REG_BYTE1 | REG_IS_DST | IMM | WIDTH_WORD),
        ));
    }

    // MOV imm -> r/m: 0xC6..0xC7
    table[0xC6] = Some(Recipe::new(Opcode::MovImmToRm, (MOD_RM | IMM)));
    table[0xC7] = Some(Recipe::new(Opcode::MovImmToRm, (MOD_RM | IMM | WIDTH_WORD)));

    // LOOPNZ, LOOPZ, LOOP, JCXZ: 0xE0..0xE3
    table[0xE0] = Some(Recipe::new(Opcode::LoopnzLoopne, (INC_IP_8BIT)));
    table[0xE1] = Some(Recipe::new(Opcode::LoopzLoope, (INC_IP_8BIT)));
    table[0xE2] = Some(Recipe::new(Opcode::Loop, (INC_IP_8BIT)));
    table[0xE3] = Some(Recipe::new(Opcode::Jcxz, (INC_IP_8BIT)));

    table
}
