//! The closed set of instruction variants this decoder understands.

use core::fmt;
use std::fmt::Display;

/// An 8086 instruction variant, grouped into contiguous-ordinal families.
///
/// The family of an opcode determines its textual mnemonic ([`Opcode::mnemonic`]):
/// every `Mov*` variant renders as `mov`, every `Add*` as `add`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // --- MOV family ---
    /// `mov r/m, reg` or `mov reg, r/m`
    MovRmToFromReg,
    /// `mov r/m, imm`
    MovImmToRm,
    /// `mov reg, imm`
    MovImmToReg,
    /// `mov acc, [addr]`
    MovMemToAcc,
    /// `mov [addr], acc`
    MovAccToMem,

    // --- ADD family ---
    /// `add r/m, reg` or `add reg, r/m`
    AddRmToFromReg,
    /// `add r/m, imm` (via the `0x80..0x83` group)
    AddImmToRm,
    /// `add acc, imm`
    AddImmToAcc,

    // --- SUB family ---
    /// `sub r/m, reg` or `sub reg, r/m`
    SubRmToFromReg,
    /// `sub r/m, imm` (via the `0x80..0x83` group)
    SubImmFromRm,
    /// `sub acc, imm`
    SubImmFromAcc,

    // --- CMP family ---
    /// `cmp r/m, reg` or `cmp reg, r/m`
    CmpRmAndReg,
    /// `cmp r/m, imm` (via the `0x80..0x83` group)
    CmpImmAndRm,
    /// `cmp acc, imm`
    CmpImmAndAcc,

    // --- conditional jumps (IP-relative) ---
    ///
    JeJz,
    ///
    JlJnge,
    ///
    JleJng,
    ///
    JbJnae,
    ///
    JbeJna,
    ///
    JpJpe,
    ///
    Jo,
    ///
    Js,
    ///
    JneJnz,
    ///
    JnlJge,
    ///
    JnleJg,
    ///
    JnbJae,
    ///
    JnbeJa,
    ///
    JnpJpo,
    ///
    Jno,
    ///
    Jns,
    /// `loop`
    Loop,
    /// `loopz`/`loope`
    LoopzLoope,
    /// `loopnz`/`loopne`
    LoopnzLoopne,
    ///
    Jcxz,

    // --- remaining ImmToRm group members (0x80..0x83, reg field 2, 3, 4, 6) ---
    /// `adc r/m, imm`
    AdcImmToRm,
    /// `sbb r/m, imm`
    SbbImmFromRm,
    /// `and r/m, imm`
    AndImmWithRm,
    /// `or r/m, imm`
    OrImmWithRm,
    /// `xor r/m, imm`
    XorImmWithRm,
}

impl Opcode {
    /// The textual mnemonic NASM expects for this variant.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::MovRmToFromReg
            | Opcode::MovImmToRm
            | Opcode::MovImmToReg
            | Opcode::MovMemToAcc
            | Opcode::MovAccToMem => "mov",

            Opcode::AddRmToFromReg | Opcode::AddImmToRm | Opcode::AddImmToAcc => "add",

            Opcode::SubRmToFromReg | Opcode::SubImmFromRm | Opcode::SubImmFromAcc => "sub",

            Opcode::CmpRmAndReg | Opcode::CmpImmAndRm | Opcode::CmpImmAndAcc => "cmp",

            Opcode::JeJz => "je",
            Opcode::JlJnge => "jl",
            Opcode::JleJng => "jle",
            Opcode::JbJnae => "jb",
            Opcode::JbeJna => "jbe",
            Opcode::JpJpe => "jp",
            Opcode::Jo => "jo",
            Opcode::Js => "js",
            Opcode::JneJnz => "jne",
            Opcode::JnlJge => "jnl",
            Opcode::JnleJg => "jnle",
            Opcode::JnbJae => "jnb",
            Opcode::JnbeJa => "jnbe",
            Opcode::JnpJpo => "jnp",
            Opcode::Jno => "jno",
            Opcode::Jns => "jns",
            Opcode::Loop => "loop",
            Opcode::LoopzLoope => "loopz",
            Opcode::LoopnzLoopne => "loopnz",
            Opcode::Jcxz => "jcxz",

            Opcode::AdcImmToRm => "adc",
            Opcode::SbbImmFromRm => "sbb",
            Opcode::AndImmWithRm => "and",
            Opcode::OrImmWithRm => "or",
            Opcode::XorImmWithRm => "xor",
        }
    }

    /// `true` for the sixteen `0x70..0x7F` conditional jumps.
    #[must_use]
    pub const fn is_conditional_jump(self) -> bool {
        matches!(
            self,
            Opcode::JeJz
                | Opcode::JlJnge
                | Opcode::JleJng
                | Opcode::JbJnae
                | Opcode::JbeJna
                | Opcode::JpJpe
                | Opcode::Jo
                | Opcode::Js
                | Opcode::JneJnz
                | Opcode::JnlJge
                | Opcode::JnleJg
                | Opcode::JnbJae
                | Opcode::JnbeJa
                | Opcode::JnpJpo
                | Opcode::Jno
                | Opcode::Jns
        )
    }

    /// `true` for LOOP/LOOPZ/LOOPNZ/JCXZ (`0xE0..0xE3`).
    #[must_use]
    pub const fn is_loop_family(self) -> bool {
        matches!(
            self,
            Opcode::Loop | Opcode::LoopzLoope | Opcode::LoopnzLoopne | Opcode::Jcxz
        )
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// The middle three ModR/M bits of the `0x80..0x83` ImmToRm group select
/// among these eight arithmetic opcodes, in this exact order.
pub(crate) const IMM_TO_RM_EXT: [Opcode; 8] = [
    Opcode::AddImmToRm,    // 000
    Opcode::OrImmWithRm,   // 001
    Opcode::AdcImmToRm,    // 010
    Opcode::SbbImmFromRm,  // 011
    Opcode::AndImmWithRm,  // 100
    Opcode::SubImmFromRm,  // 101
    Opcode::XorImmWithRm,  // 110
    Opcode::CmpImmAndRm,   // 111
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonics_follow_family() {
        assert_eq!(Opcode::MovImmToReg.mnemonic(), "mov");
        assert_eq!(Opcode::AddImmToAcc.mnemonic(), "add");
        assert_eq!(Opcode::SubRmToFromReg.mnemonic(), "sub");
        assert_eq!(Opcode::CmpImmAndAcc.mnemonic(), "cmp");
    }

    #[test]
    fn imm_to_rm_ext_order() {
        assert_eq!(IMM_TO_RM_EXT[0], Opcode::AddImmToRm);
        assert_eq!(IMM_TO_RM_EXT[5], Opcode::SubImmFromRm);
        assert_eq!(IMM_TO_RM_EXT[7], Opcode::CmpImmAndRm);
    }
}
