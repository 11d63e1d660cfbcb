//! The decoded, transient value that flows from the decoder to the
//! formatter and (optionally) the executor.

use crate::opcode::Opcode;
use crate::operand::Operand;

/// A fully decoded 8086 instruction.
///
/// Invariant: `size_bytes` is in `1..=6`, the longest encoded form this
/// decoder supports. Invariant: either both `dst` and `src` are present, or
/// `src` is [`Operand::Absent`] and `dst` carries the sole IP-relative
/// displacement operand of a short jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    ///
    pub opcode: Opcode,
    ///
    pub dst: Operand,
    ///
    pub src: Operand,
    /// Total bytes consumed by the decoder, including the opcode byte.
    pub size_bytes: u8,
}

impl Instruction {
    pub(crate) const fn new(opcode: Opcode, dst: Operand, src: Operand, size_bytes: u8) -> Self {
        Self {
            opcode,
            dst,
            src,
            size_bytes,
        }
    }
}
