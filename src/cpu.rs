//! C4: register file, 1 MiB memory image, and effective-address resolution.

use bitflags::bitflags;

use crate::operand::Operand;
use crate::registers::Register;

/// Size of the linear memory image: the 8086's full 20-bit address space.
pub const MEMORY_SIZE: usize = 1 << 20;

bitflags! {
    /// The FLAGS register. Bit positions match the 8086's layout; this
    /// model only ever sets or clears {SF, ZF, PF} (see
    /// [`crate::exec`]) — the rest exist so the bitset and its letter
    /// rendering are complete, but are never touched.
    pub struct Flags: u16 {
        /// Carry flag.
        const CF = 1 << 0;
        /// Parity flag.
        const PF = 1 << 2;
        /// Auxiliary carry flag.
        const AF = 1 << 4;
        /// Zero flag.
        const ZF = 1 << 6;
        /// Sign flag.
        const SF = 1 << 7;
        /// Trap flag.
        const TF = 1 << 8;
        /// Interrupt-enable flag.
        const IF = 1 << 9;
        /// Direction flag.
        const DF = 1 << 10;
        /// Overflow flag.
        const OF = 1 << 11;
    }
}

impl Flags {
    /// Renders the set bits as the concatenation of single letters, in
    /// `C P A Z S T I D O` order, skipping unset flags — `""` when none
    /// are set.
    #[must_use]
    pub fn letters(self) -> String {
        const LETTERED: [(Flags, char); 9] = [
            (Flags::CF, 'C'),
            (Flags::PF, 'P'),
            (Flags::AF, 'A'),
            (Flags::ZF, 'Z'),
            (Flags::SF, 'S'),
            (Flags::TF, 'T'),
            (Flags::IF, 'I'),
            (Flags::DF, 'D'),
            (Flags::OF, 'O'),
        ];
        LETTERED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, letter)| letter)
            .collect()
    }
}

/// Programmer-visible 8086 state: the register file, FLAGS, and a 1 MiB
/// linear memory image. The loaded code image occupies the start of that
/// same memory (see [`Cpu::load`]) — there is no separate code buffer.
pub struct Cpu {
    /// Byte-addressable backing store for the eight word registers and
    /// their byte aliases, indexed via [`Register::offset`].
    gp: [u8; 16],
    /// Code segment.
    pub cs: u16,
    /// Data segment.
    pub ds: u16,
    /// Stack segment.
    pub ss: u16,
    /// Extra segment.
    pub es: u16,
    /// Instruction pointer: always the address of the next instruction
    /// to decode.
    pub ip: u16,
    /// FLAGS register.
    pub flags: Flags,
    /// The full 1 MiB linear memory image.
    pub memory: Vec<u8>,
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            gp: [0; 16],
            cs: 0,
            ds: 0,
            ss: 0,
            es: 0,
            ip: 0,
            flags: Flags::empty(),
            memory: vec![0; MEMORY_SIZE],
        }
    }
}

impl Cpu {
    /// Creates a fresh CPU state: all registers and flags zeroed, memory
    /// zero-filled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `code` into memory at offset 0, the conventional load
    /// address for a flat 8086 binary.
    pub fn load(&mut self, code: &[u8]) {
        self.memory[..code.len()].copy_from_slice(code);
    }

    /// Reads a register's value. Byte registers return their aliased
    /// byte of the parent word, zero-extended; word registers return the
    /// full word.
    #[must_use]
    pub fn reg_val(&self, reg: Register) -> u16 {
        let offset = reg.offset();
        if reg.is_wide() {
            u16::from_le_bytes([self.gp[offset], self.gp[offset + 1]])
        } else {
            u16::from(self.gp[offset])
        }
    }

    /// Writes a register's value. A byte-register write touches only its
    /// aliased byte, leaving the other half of the parent word untouched.
    pub fn reg_set(&mut self, reg: Register, value: u16) {
        let offset = reg.offset();
        if reg.is_wide() {
            let bytes = value.to_le_bytes();
            self.gp[offset] = bytes[0];
            self.gp[offset + 1] = bytes[1];
        } else {
            self.gp[offset] = value as u8;
        }
    }

    /// Reads a byte from memory.
    #[must_use]
    pub fn mem8(&self, addr: u32) -> u8 {
        self.memory[addr as usize]
    }

    /// Writes a byte to memory.
    pub fn set_mem8(&mut self, addr: u32, value: u8) {
        self.memory[addr as usize] = value;
    }

    /// Reads a little-endian word from memory.
    #[must_use]
    pub fn mem16(&self, addr: u32) -> u16 {
        let lo = self.mem8(addr);
        let hi = self.mem8((addr + 1) % MEMORY_SIZE as u32);
        u16::from_le_bytes([lo, hi])
    }

    /// Writes a little-endian word to memory.
    pub fn set_mem16(&mut self, addr: u32, value: u16) {
        let bytes = value.to_le_bytes();
        self.set_mem8(addr, bytes[0]);
        self.set_mem8((addr + 1) % MEMORY_SIZE as u32, bytes[1]);
    }

    /// Resolves a memory operand's effective address: the sum of its
    /// base register(s) and its (sign-extended) displacement, wrapped
    /// modulo the 1 MiB address space — the 8086's natural address
    /// wraparound, chosen here over a hard out-of-range assertion (see
    /// DESIGN.md).
    ///
    /// # Panics
    /// Panics if `operand` is not a memory shape — a programmer error at
    /// the call site, not a runtime condition callers need to recover
    /// from.
    #[must_use]
    pub fn ea(&self, operand: Operand) -> u32 {
        match operand {
            Operand::Memory {
                bases,
                displacement,
                ..
            } => {
                let (base1, base2) = bases.registers();
                let sum = i64::from(self.reg_val(base1))
                    + base2.map_or(0, |r| i64::from(self.reg_val(r)))
                    + i64::from(displacement);
                sum.rem_euclid(MEMORY_SIZE as i64) as u32
            }
            Operand::DirectMemory { address, .. } => u32::from(address),
            _ => panic!("ea() called on a non-memory operand: {operand:?}"),
        }
    }

    /// Reads the value an operand denotes: a register's contents, a
    /// memory operand's effective-address load (width taken from the
    /// operand's `wide` tag), or an immediate's stored value.
    ///
    /// # Panics
    /// Panics on [`Operand::Absent`] — never a valid read site.
    #[must_use]
    pub fn read(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Register(reg) => self.reg_val(reg),
            Operand::Memory { wide, .. } | Operand::DirectMemory { wide, .. } => {
                let addr = self.ea(operand);
                if wide {
                    self.mem16(addr)
                } else {
                    u16::from(self.mem8(addr))
                }
            }
            Operand::Immediate { value, .. } => value as u16,
            Operand::Absent => panic!("read() called on Operand::Absent"),
        }
    }

    /// Writes `value` to the location an operand denotes (register or
    /// memory); the inverse of [`Cpu::read`].
    ///
    /// # Panics
    /// Panics on [`Operand::Immediate`] or [`Operand::Absent`] — neither
    /// is a writable location.
    pub fn write(&mut self, operand: Operand, value: u16) {
        match operand {
            Operand::Register(reg) => self.reg_set(reg, value),
            Operand::Memory { wide, .. } | Operand::DirectMemory { wide, .. } => {
                let addr = self.ea(operand);
                if wide {
                    self.set_mem16(addr, value);
                } else {
                    self.set_mem8(addr, value as u8);
                }
            }
            other => panic!("write() called on a non-writable operand: {other:?}"),
        }
    }

    /// Formats the final register/flags dump emitted after an `-exec`
    /// run, in the exact layout the reference CLI prints.
    #[must_use]
    pub fn dump_registers(&self) -> String {
        let mut out = String::from(";Final registers:\n");
        for (name, value) in [
            ("ax", self.reg_val(Register::Ax)),
            ("bx", self.reg_val(Register::Bx)),
            ("cx", self.reg_val(Register::Cx)),
            ("dx", self.reg_val(Register::Dx)),
            ("sp", self.reg_val(Register::Sp)),
            ("bp", self.reg_val(Register::Bp)),
            ("si", self.reg_val(Register::Si)),
            ("di", self.reg_val(Register::Di)),
        ] {
            out.push_str(&format!(";\t{name}: 0x{value:04x} ({value})\n"));
        }
        out.push_str(";\n");
        for (name, value) in [
            ("cs", self.cs),
            ("ds", self.ds),
            ("ss", self.ss),
            ("es", self.es),
        ] {
            out.push_str(&format!(";\t{name}: 0x{value:04x} ({value})\n"));
        }
        out.push_str(";\n");
        out.push_str(&format!(";\tip: 0x{:04x} ({})\n", self.ip, self.ip));
        out.push_str(";\n");
        out.push_str(&format!(";\tflags: {}\n", self.flags.letters()));
        out
    }
}
