//! C3: renders a decoded [`Instruction`] as a NASM-style source line.

use crate::instruction::Instruction;
use crate::operand::Operand;

/// The listing header emitted exactly once, before any instruction.
pub const PROLOGUE: &str = "; Instruction decoding on the 8086 Homework by Connor Haskins\n\nbits 16\n\n";

/// Renders one decoded instruction as a single NASM source line (no
/// trailing newline). A pure function of `inst` — the same value always
/// renders to the same bytes.
#[must_use]
pub fn format_instruction(inst: Instruction) -> String {
    if inst.src == Operand::Absent {
        let displacement = match inst.dst {
            Operand::Immediate { value, .. } => value,
            other => panic!("INC_IP_8BIT instruction had a non-immediate dst: {other:?}"),
        };
        // NASM's `$` is relative to the start of the jump instruction, two
        // bytes further along than the end of the displacement byte.
        return format!("{} ${:+}", inst.opcode.mnemonic(), displacement + 2);
    }

    let dst = render_operand(inst.dst, inst.src);
    let src = render_operand(inst.src, inst.dst);
    format!("{} {dst}, {src}", inst.opcode.mnemonic())
}

fn render_operand(operand: Operand, sibling: Operand) -> String {
    match operand {
        Operand::Register(reg) => reg.name().to_string(),
        Operand::Memory {
            bases,
            displacement,
            ..
        } => render_effective_address(&bases.to_string(), displacement),
        Operand::DirectMemory { address, .. } => format!("[{address}]"),
        Operand::Immediate { value, .. } => {
            if sibling.is_memory() {
                let prefix = if sibling.is_wide() { "word" } else { "byte" };
                format!("{prefix} {value}")
            } else {
                value.to_string()
            }
        }
        Operand::Absent => panic!("render_operand called on Operand::Absent"),
    }
}

fn render_effective_address(bases: &str, displacement: i16) -> String {
    match displacement.cmp(&0) {
        std::cmp::Ordering::Equal => format!("[{bases}]"),
        std::cmp::Ordering::Greater => format!("[{bases} + {displacement}]"),
        std::cmp::Ordering::Less => format!("[{bases} - {}]", displacement.unsigned_abs()),
    }
}
