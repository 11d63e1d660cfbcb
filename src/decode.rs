//! C2: turns a byte cursor plus a [`crate::table::Recipe`] into a fully
//! populated [`Instruction`].

use core::fmt;
use std::fmt::{Debug, Display};

use log::trace;

use crate::instruction::Instruction;
use crate::operand::{Bases, ImmWidth, Operand};
use crate::registers::Register;
use crate::table::{RecipeFlags, OPCODE_TABLE};

/// Decodes one instruction starting at `bytes[0]`.
///
/// `bytes` must contain at least the instruction's encoded bytes (the
/// caller passes the remainder of the code image from the current IP;
/// there is no requirement that it end exactly at the instruction
/// boundary). Returns the decoded instruction; [`Instruction::size_bytes`]
/// is the number of bytes actually consumed.
///
/// # Errors
/// Returns [`DecodeError::UnsupportedOpcode`] when the first byte has no
/// recipe in the table.
pub fn decode(bytes: &[u8]) -> Result<Instruction, DecodeError> {
    let first = bytes[0];
    let recipe = OPCODE_TABLE[first as usize].ok_or(DecodeError::UnsupportedOpcode(first))?;
    trace!("decode: first byte 0x{first:02x} -> {:?}", recipe.opcode);

    let mut cursor = Cursor { bytes, pos: 1 };
    let flags = recipe.flags;
    let wide = flags.contains(RecipeFlags::WIDTH_WORD);
    let reg_is_dst = flags.contains(RecipeFlags::REG_IS_DST);

    let mut dst = Operand::Absent;
    let mut src = Operand::Absent;
    let mut opcode = recipe.opcode;

    // Phase: ACC
    if flags.contains(RecipeFlags::ACC) {
        let acc = Operand::Register(if wide { Register::Ax } else { Register::Al });
        if reg_is_dst {
            dst = acc;
        } else {
            src = acc;
        }
    }

    // Phase: byte-1 register
    if flags.contains(RecipeFlags::REG_BYTE1) {
        let reg = Operand::Register(Register::from_code(first, wide));
        if reg_is_dst {
            dst = reg;
        } else {
            src = reg;
        }
    }

    // Phase: ModR/M
    if flags.contains(RecipeFlags::MOD_RM) {
        let modrm = cursor.take_u8();
        let md = modrm >> 6;
        let reg_field = (modrm >> 3) & 0b111;
        let rm = modrm & 0b111;

        if flags.contains(RecipeFlags::REG_BYTE2) {
            let reg = Operand::Register(Register::from_code(reg_field, wide));
            if reg_is_dst {
                dst = reg;
            } else {
                src = reg;
            }
        }

        if flags.contains(RecipeFlags::ADDTL_OP_CODE) {
            let ext_table = recipe
                .ext_table
                .expect("ADDTL_OP_CODE recipe must carry an ext_table");
            opcode = ext_table[reg_field as usize];
        }

        let rm_operand = decode_rm(&mut cursor, md, rm, wide);
        if !reg_is_dst {
            dst = rm_operand;
        } else {
            src = rm_operand;
        }
    }

    // Phase: immediate
    if flags.contains(RecipeFlags::IMM) {
        let sign_ext = flags.contains(RecipeFlags::SIGN_EXT);
        let (value, width) = if wide && !sign_ext {
            (cursor.take_i16(), ImmWidth::Word)
        } else {
            (i16::from(cursor.take_i8()), ImmWidth::Byte)
        };
        src = Operand::Immediate { value, width };
    }

    // Phase: direct memory address
    if flags.contains(RecipeFlags::MEM) {
        let address = cursor.take_u16();
        let mem = Operand::DirectMemory { address, wide };
        if reg_is_dst {
            src = mem;
        } else {
            dst = mem;
        }
    }

    // Phase: IP-relative 8-bit displacement
    if flags.contains(RecipeFlags::INC_IP_8BIT) {
        let disp = cursor.take_i8();
        dst = Operand::Immediate {
            value: i16::from(disp),
            width: ImmWidth::Byte,
        };
        src = Operand::Absent;
    }

    let size_bytes = cursor.pos as u8;
    Ok(Instruction::new(opcode, dst, src, size_bytes))
}

/// Decodes the ModR/M `r/m` operand given `mod`, `rm` and the operand
/// width: register direct (`mod == 11`), the direct-memory exception
/// (`mod == 00, rm == 110`), or an effective address with zero, one, or two
/// base registers and an optional displacement.
fn decode_rm(cursor: &mut Cursor<'_>, md: u8, rm: u8, wide: bool) -> Operand {
    if md == 0b11 {
        Operand::Register(Register::from_code(rm, wide))
    } else if md == 0b00 && rm == 0b110 {
        Operand::DirectMemory {
            address: cursor.take_u16(),
            wide,
        }
    } else {
        let bases = Bases::decode(rm);
        let displacement = match md {
            0b00 => 0,
            0b01 => i16::from(cursor.take_i8()),
            0b10 => cursor.take_i16(),
            _ => unreachable!("mod is a 2-bit field"),
        };
        Operand::Memory {
            bases,
            displacement,
            wide,
        }
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn take_u8(&mut self) -> u8 {
        let b = self.bytes[self.pos];
        self.pos += 1;
        b
    }

    fn take_i8(&mut self) -> i8 {
        self.take_u8() as i8
    }

    fn take_u16(&mut self) -> u16 {
        let lo = self.take_u8();
        let hi = self.take_u8();
        u16::from_le_bytes([lo, hi])
    }

    fn take_i16(&mut self) -> i16 {
        self.take_u16() as i16
    }
}

/// Error raised when a byte sequence cannot be decoded into a supported
/// instruction.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeError {
    /// The first opcode byte has no recipe in the supported subset.
    UnsupportedOpcode(u8),
    /// The first byte selects an `ADDTL_OP_CODE` recipe whose secondary
    /// table has no entry for the ModR/M `reg` field that was decoded.
    /// Never produced by this decoder's table — `IMM_TO_RM_EXT` covers
    /// all eight `reg` values — but kept in the taxonomy since a future,
    /// sparser secondary-dispatch table could need it.
    UnimplementedExtOp { byte: u8, ext: u8 },
}

impl Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnsupportedOpcode(byte) => {
                write!(f, "UnsupportedOpcode(0x{byte:02x})")
            }
            DecodeError::UnimplementedExtOp { byte, ext } => {
                write!(f, "UnimplementedExtOp {{ byte: 0x{byte:02x}, ext: {ext} }}")
            }
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnsupportedOpcode(byte) => {
                write!(f, "ERROR: unsupported instruction (first byte 0x{byte:02x})")
            }
            DecodeError::UnimplementedExtOp { byte, ext } => {
                write!(f, "ERROR: unsupported instruction (0x{byte:02x} /{ext})")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
