//! Formatter scenarios: byte sequence -> exact NASM-style source line.

use pretty_assertions::assert_eq;

use sim8086::decode::decode;
use sim8086::formatter::{format_instruction, PROLOGUE};

fn render(bytes: &[u8]) -> String {
    format_instruction(decode(bytes).unwrap())
}

#[test]
fn mov_reg_to_reg() {
    assert_eq!(render(&[0x89, 0xD9]), "mov cx, bx");
}

#[test]
fn mov_word_immediate_to_reg() {
    assert_eq!(render(&[0xB8, 0x01, 0x00]), "mov ax, 1");
}

#[test]
fn mov_byte_immediate_to_effective_address() {
    assert_eq!(render(&[0xC6, 0x03, 0x07]), "mov [bp + di], byte 7");
}

#[test]
fn effective_address_with_two_bases_and_positive_displacement() {
    // mov ax, [bx + si + 1000] -- 8B 80 E8 03
    assert_eq!(render(&[0x8B, 0x80, 0xE8, 0x03]), "mov ax, [bx + si + 1000]");
}

#[test]
fn effective_address_with_negative_displacement() {
    // mov ax, [bx - 10] -- 8B 47 F6
    assert_eq!(render(&[0x8B, 0x47, 0xF6]), "mov ax, [bx - 10]");
}

#[test]
fn zero_displacement_is_omitted() {
    // mov ax, [bx + si] -- 8B 00
    assert_eq!(render(&[0x8B, 0x00]), "mov ax, [bx + si]");
}

#[test]
fn direct_memory_operand_renders_bracketed_address() {
    // mov cx, [1000] -- 8B 0E E8 03
    assert_eq!(render(&[0x8B, 0x0E, 0xE8, 0x03]), "mov cx, [1000]");
}

#[test]
fn direct_memory_immediate_gets_size_prefix() {
    // mov [1000], word 5 -- C7 06 E8 03 05 00
    assert_eq!(render(&[0xC7, 0x06, 0xE8, 0x03, 0x05, 0x00]), "mov [1000], word 5");
}

#[test]
fn conditional_jump_renders_as_dollar_relative_offset() {
    assert_eq!(render(&[0x75, 0xFD]), "jne $-1");
    assert_eq!(render(&[0x74, 0x05]), "je $+7");
}

#[test]
fn loop_family_mnemonics() {
    assert_eq!(render(&[0xE2, 0xFE]), "loop $+0");
    assert_eq!(render(&[0xE3, 0x02]), "jcxz $+4");
}

#[test]
fn prologue_matches_reference_header() {
    assert_eq!(
        PROLOGUE,
        "; Instruction decoding on the 8086 Homework by Connor Haskins\n\nbits 16\n\n"
    );
}

#[test]
fn rendering_is_a_pure_function_of_the_instruction() {
    let inst = decode(&[0x00, 0xD9]).unwrap();
    assert_eq!(format_instruction(inst), format_instruction(inst));
}
