//! Simulation scenarios: decode, execute against a fresh `Cpu`, and
//! check the resulting state.

use pretty_assertions::assert_eq;

use sim8086::cpu::{Cpu, Flags};
use sim8086::decode::decode;
use sim8086::exec::execute;
use sim8086::registers::Register;

fn run(cpu: &mut Cpu, program: &[u8]) {
    let mut ip = 0usize;
    while ip < program.len() {
        let inst = decode(&program[ip..]).unwrap();
        cpu.ip = ip as u16;
        execute(cpu, inst).unwrap();
        ip = cpu.ip as usize;
    }
}

#[test]
fn mov_immediate_to_reg_leaves_everything_else_zero() {
    let mut cpu = Cpu::new();
    run(&mut cpu, &[0xB8, 0x01, 0x00]); // mov ax, 1
    assert_eq!(cpu.reg_val(Register::Ax), 0x0001);
    assert_eq!(cpu.reg_val(Register::Bx), 0);
    assert_eq!(cpu.flags, Flags::empty());
}

#[test]
fn add_wraparound_sets_parity_and_zero_flags() {
    let mut cpu = Cpu::new();
    run(&mut cpu, &[0xB8, 0xFF, 0xFF, 0x05, 0x01, 0x00]); // mov ax,0xFFFF; add ax,1
    assert_eq!(cpu.reg_val(Register::Ax), 0x0000);
    assert_eq!(cpu.flags.letters(), "PZ");
}

#[test]
fn sub_below_zero_sets_sign_and_parity_flags() {
    let mut cpu = Cpu::new();
    run(&mut cpu, &[0xB8, 0x00, 0x00, 0x2D, 0x01, 0x00]); // mov ax,0; sub ax,1
    assert_eq!(cpu.reg_val(Register::Ax), 0xFFFF);
    assert_eq!(cpu.flags.letters(), "PS");
}

#[test]
fn mov_never_touches_flags() {
    let mut cpu = Cpu::new();
    cpu.flags.insert(Flags::ZF | Flags::SF);
    run(&mut cpu, &[0x89, 0xD9]); // mov cx, bx
    assert_eq!(cpu.flags, Flags::ZF | Flags::SF);
}

#[test]
fn sign_and_zero_flags_are_never_both_set() {
    let mut cpu = Cpu::new();
    run(&mut cpu, &[0xB8, 0x00, 0x80, 0x05, 0x00, 0x00]); // mov ax,0x8000; add ax,0
    assert!(cpu.flags.contains(Flags::SF));
    assert!(!cpu.flags.contains(Flags::ZF));
}

#[test]
fn byte_register_write_preserves_sibling_byte() {
    let mut cpu = Cpu::new();
    run(&mut cpu, &[0xB8, 0x34, 0x12]); // mov ax, 0x1234
    run(&mut cpu, &[0xB0, 0xFF]); // mov al, 0xff
    assert_eq!(cpu.reg_val(Register::Ax), 0x12FF);
    assert_eq!(cpu.reg_val(Register::Ah), 0x12);
}

#[test]
fn conditional_loop_via_sub_and_jne_converges_to_zero() {
    // A conditional-loop idiom built from SUB + JNE, since DEC is not
    // part of this decoder's supported set on its own.
    let mut cpu = Cpu::new();
    // mov cx, 3; sub cx, 1; jne $-5 (back to the sub, 8 bytes in - 5 = offset 3)
    let program = [0xB9, 0x03, 0x00, 0x83, 0xE9, 0x01, 0x75, 0xFB];
    let mut ip = 0usize;
    let mut iterations = 0;
    loop {
        let inst = decode(&program[ip..]).unwrap();
        cpu.ip = ip as u16;
        execute(&mut cpu, inst).unwrap();
        ip = cpu.ip as usize;
        iterations += 1;
        if cpu.reg_val(Register::Cx) == 0 && cpu.flags.contains(Flags::ZF) {
            break;
        }
        assert!(iterations < 100, "loop did not converge");
    }
    assert_eq!(cpu.reg_val(Register::Cx), 0);
}

#[test]
fn loop_opcode_decrements_cx_whether_or_not_it_jumps() {
    let mut cpu = Cpu::new();
    cpu.reg_set(Register::Cx, 1);
    cpu.ip = 0;
    let inst = decode(&[0xE2, 0xFE]).unwrap(); // loop -2
    execute(&mut cpu, inst).unwrap();
    assert_eq!(cpu.reg_val(Register::Cx), 0);
    assert_eq!(cpu.ip, 2); // not taken: CX hit zero
}

#[test]
fn unimplemented_arithmetic_opcode_reports_and_does_not_panic() {
    let mut cpu = Cpu::new();
    // 80 /4 ib -- and byte bl, imm8
    let inst = decode(&[0x80, 0xE3, 0x0F]).unwrap();
    let err = execute(&mut cpu, inst).unwrap_err();
    assert_eq!(err.to_string(), "ERROR: Executing op and not yet implemented!");
}
