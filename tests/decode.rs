//! Decoder scenarios drawn from the reference listing examples: each
//! checks the decoded `Instruction` shape for a literal byte sequence.

use pretty_assertions::assert_eq;

use sim8086::decode::{decode, DecodeError};
use sim8086::operand::{Bases, ImmWidth, Operand};
use sim8086::registers::Register;

#[test]
fn mov_reg_to_reg() {
    let inst = decode(&[0x89, 0xD9]).unwrap();
    assert_eq!(inst.dst, Operand::Register(Register::Cx));
    assert_eq!(inst.src, Operand::Register(Register::Bx));
    assert_eq!(inst.size_bytes, 2);
}

#[test]
fn mov_word_immediate_to_reg() {
    let inst = decode(&[0xB8, 0x01, 0x00]).unwrap();
    assert_eq!(inst.dst, Operand::Register(Register::Ax));
    assert_eq!(
        inst.src,
        Operand::Immediate {
            value: 1,
            width: ImmWidth::Word
        }
    );
}

#[test]
fn mov_byte_immediate_to_memory() {
    let inst = decode(&[0xC6, 0x03, 0x07]).unwrap();
    assert_eq!(
        inst.dst,
        Operand::Memory {
            bases: Bases::BpDi,
            displacement: 0,
            wide: false,
        }
    );
    assert_eq!(
        inst.src,
        Operand::Immediate {
            value: 7,
            width: ImmWidth::Byte
        }
    );
}

#[test]
fn add_then_sub_decode_as_arithmetic_family() {
    // mov ax, 0xFFFF; add ax, 1
    let mov = decode(&[0xB8, 0xFF, 0xFF]).unwrap();
    let add = decode(&[0x05, 0x01, 0x00]).unwrap();
    assert_eq!(mov.size_bytes, 3);
    assert_eq!(add.size_bytes, 3);
    assert_eq!(add.dst, Operand::Register(Register::Ax));
}

#[test]
fn every_size_bytes_is_in_range() {
    let samples: &[&[u8]] = &[
        &[0x89, 0xD9],
        &[0xB8, 0x01, 0x00],
        &[0xC6, 0x03, 0x07],
        &[0x83, 0xE8, 0x01],
        &[0x75, 0xFD],
        &[0xE2, 0xFE],
        &[0x8B, 0x0E, 0xE8, 0x03],
    ];
    for bytes in samples {
        let inst = decode(bytes).unwrap();
        assert!((1..=6).contains(&inst.size_bytes));
        assert_eq!(inst.size_bytes as usize, bytes.len());
    }
}

#[test]
fn direct_memory_exception_for_mod00_rm110() {
    let inst = decode(&[0x8B, 0x0E, 0xE8, 0x03]).unwrap();
    assert_eq!(
        inst.src,
        Operand::DirectMemory {
            address: 1000,
            wide: true
        }
    );
}

#[test]
fn undefined_first_byte_is_unsupported_opcode() {
    assert_eq!(decode(&[0x06]), Err(DecodeError::UnsupportedOpcode(0x06)));
    assert_eq!(decode(&[0xF4]), Err(DecodeError::UnsupportedOpcode(0xF4)));
}

#[test]
fn imm_to_rm_group_selects_opcode_from_modrm_reg_field() {
    use sim8086::opcode::Opcode;
    // 83 /5 ib -> sub r/m16, imm8 sign-extended
    let inst = decode(&[0x83, 0xE8, 0x01]).unwrap();
    assert_eq!(inst.opcode, Opcode::SubImmFromRm);
    // 83 /7 ib -> cmp r/m16, imm8 sign-extended
    let inst = decode(&[0x83, 0xF8, 0x01]).unwrap();
    assert_eq!(inst.opcode, Opcode::CmpImmAndRm);
}
