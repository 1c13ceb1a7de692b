use parse_display::Display;
use rand::Rng;
use tracing::debug;

use crate::constants::{self as C, FONT_GLYPH_SIZE, FONT_START, KEY_COUNT};
use crate::hooks::{DisplayHook, InputHook};

use super::{exception::Exception, registers::Reg, Computer};

/// 12-bit address operand (`NNN`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addr(pub C::Address);

impl std::fmt::Display for Addr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#05X}", self.0)
    }
}

/// 8-bit immediate operand (`NN`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Imm(pub C::Word);

impl std::fmt::Display for Imm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04X}", self.0)
    }
}

/// Where the program counter goes once an instruction is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Following instruction
    Next,

    /// Skip the following instruction
    Skip,

    /// Explicit target
    Jump(C::Address),

    /// Execute the same instruction again on the next step
    Stay,
}

impl Flow {
    fn skip_if(condition: bool) -> Self {
        if condition {
            Self::Skip
        } else {
            Self::Next
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Instruction {
    /// Clear the screen
    #[display("cls")]
    Cls,

    /// Return from a `call`
    #[display("ret")]
    Ret,

    /// Unconditional jump
    #[display("jp   {0}")]
    Jp(Addr),

    /// Push `PC` and go to the given address
    #[display("call {0}")]
    Call(Addr),

    /// Skip if a register equals an immediate
    #[display("se   {0}, {1}")]
    SeImm(Reg, Imm),

    /// Skip if a register differs from an immediate
    #[display("sne  {0}, {1}")]
    SneImm(Reg, Imm),

    /// Skip if two registers are equal
    #[display("se   {0}, {1}")]
    SeReg(Reg, Reg),

    /// Skip if two registers differ
    #[display("sne  {0}, {1}")]
    SneReg(Reg, Reg),

    /// Load an immediate in a register
    #[display("ld   {0}, {1}")]
    Ld(Reg, Imm),

    /// Add an immediate to a register, without touching the flag
    #[display("add  {0}, {1}")]
    Add(Reg, Imm),

    /// Copy a register into another
    #[display("ld   {0}, {1}")]
    Mov(Reg, Reg),

    #[display("or   {0}, {1}")]
    Or(Reg, Reg),

    #[display("and  {0}, {1}")]
    And(Reg, Reg),

    #[display("xor  {0}, {1}")]
    Xor(Reg, Reg),

    /// Add two registers, `VF` holds the carry
    #[display("add  {0}, {1}")]
    AddReg(Reg, Reg),

    /// `Vx - Vy`, `VF` is set when there is no borrow
    #[display("sub  {0}, {1}")]
    Sub(Reg, Reg),

    /// Shift right in place, `VF` holds the bit shifted out
    #[display("shr  {0}")]
    Shr(Reg),

    /// `Vy - Vx`, `VF` is set when there is no borrow
    #[display("subn {0}, {1}")]
    Subn(Reg, Reg),

    /// Shift left in place, `VF` holds the bit shifted out
    #[display("shl  {0}")]
    Shl(Reg),

    /// Load the index register
    #[display("ld   I, {0}")]
    LdI(Addr),

    /// Jump to `V0` plus an offset
    #[display("jp   V0, {0}")]
    JpV0(Addr),

    /// Random byte masked by an immediate
    #[display("rnd  {0}, {1}")]
    Rnd(Reg, Imm),

    /// Draw an `N` rows sprite read from `I`
    #[display("drw  {0}, {1}, {2}")]
    Drw(Reg, Reg, u8),

    /// Skip if the key is pressed
    #[display("skp  {0}")]
    Skp(Reg),

    /// Skip if the key is not pressed
    #[display("sknp {0}")]
    Sknp(Reg),

    /// Read the delay timer
    #[display("ld   {0}, DT")]
    LdFromDelay(Reg),

    /// Wait for a key press
    #[display("ld   {0}, K")]
    LdKey(Reg),

    /// Set the delay timer
    #[display("ld   DT, {0}")]
    LdDelay(Reg),

    /// Set the sound timer
    #[display("ld   ST, {0}")]
    LdSound(Reg),

    #[display("add  I, {0}")]
    AddI(Reg),

    /// Point `I` to the glyph of a hexadecimal digit
    #[display("ld   F, {0}")]
    LdFont(Reg),

    /// Store the decimal digits of a register at `I`
    #[display("ld   B, {0}")]
    Bcd(Reg),

    /// Store `V0..=Vx` at `I`
    #[display("ld   [I], {0}")]
    Store(Reg),

    /// Load `V0..=Vx` from `I`
    #[display("ld   {0}, [I]")]
    Load(Reg),
}

impl Instruction {
    /// Decode a big-endian opcode
    ///
    /// # Errors
    ///
    /// Raises [`Exception::DecodeFault`] if the bit pattern is not part of the instruction set.
    pub fn decode(opcode: C::Opcode) -> Result<Self, Exception> {
        use Instruction::*;

        let [hi, lo] = opcode.to_be_bytes();
        let x = Reg::from_nibble(hi);
        let y = Reg::from_nibble(lo >> 4);
        let n = lo & 0xF;
        let nn = Imm(lo);
        let nnn = Addr(opcode & 0x0FFF);
        let fault = Err(Exception::DecodeFault { opcode });

        let instruction = match hi >> 4 {
            0x0 => match opcode {
                0x00E0 => Cls,
                0x00EE => Ret,
                _ => return fault,
            },
            0x1 => Jp(nnn),
            0x2 => Call(nnn),
            0x3 => SeImm(x, nn),
            0x4 => SneImm(x, nn),
            0x5 if n == 0 => SeReg(x, y),
            0x5 => return fault,
            0x6 => Ld(x, nn),
            0x7 => Add(x, nn),
            0x8 => match n {
                0x0 => Mov(x, y),
                0x1 => Or(x, y),
                0x2 => And(x, y),
                0x3 => Xor(x, y),
                0x4 => AddReg(x, y),
                0x5 => Sub(x, y),
                0x6 => Shr(x),
                0x7 => Subn(x, y),
                0xE => Shl(x),
                _ => return fault,
            },
            // A non-zero low nibble is tolerated here, see `is_malformed`
            0x9 => SneReg(x, y),
            0xA => LdI(nnn),
            0xB => JpV0(nnn),
            0xC => Rnd(x, nn),
            0xD => Drw(x, y, n),
            0xE => match lo {
                0x9E => Skp(x),
                0xA1 => Sknp(x),
                _ => return fault,
            },
            0xF => match lo {
                0x07 => LdFromDelay(x),
                0x0A => LdKey(x),
                0x15 => LdDelay(x),
                0x18 => LdSound(x),
                0x1E => AddI(x),
                0x29 => LdFont(x),
                0x33 => Bcd(x),
                0x55 => Store(x),
                0x65 => Load(x),
                _ => return fault,
            },
            _ => return fault,
        };

        Ok(instruction)
    }

    /// Whether the opcode decodes but has non-zero bits where zeros are expected.
    ///
    /// Only `9XY_` falls in this category: `5XY_` with a non-zero low nibble does not decode.
    #[must_use]
    pub fn is_malformed(opcode: C::Opcode) -> bool {
        opcode & 0xF000 == 0x9000 && opcode & 0x000F != 0
    }

    /// Execute the instruction
    #[tracing::instrument(skip(computer, display, input), level = "trace")]
    pub(crate) fn execute(
        self,
        computer: &mut Computer,
        display: &mut dyn DisplayHook,
        input: &dyn InputHook,
    ) -> Result<Flow, Exception> {
        use Instruction::*;

        let regs = &mut computer.registers;

        let flow = match self {
            Cls => {
                display.clear_screen();
                Flow::Next
            }

            Ret => {
                let address = computer.stack.pop()?;
                debug!(address, "Returning");
                // Resume after the `call` instruction
                Flow::Jump(address.wrapping_add(2))
            }

            Jp(Addr(address)) => Flow::Jump(address),

            Call(Addr(address)) => {
                computer.stack.push(regs.pc)?;
                debug!(address, sp = computer.stack.sp(), "Calling");
                Flow::Jump(address)
            }

            SeImm(x, Imm(nn)) => Flow::skip_if(regs.get(x) == nn),
            SneImm(x, Imm(nn)) => Flow::skip_if(regs.get(x) != nn),
            SeReg(x, y) => Flow::skip_if(regs.get(x) == regs.get(y)),
            SneReg(x, y) => Flow::skip_if(regs.get(x) != regs.get(y)),

            Ld(x, Imm(nn)) => {
                regs.set(x, nn);
                Flow::Next
            }

            Add(x, Imm(nn)) => {
                regs.set(x, regs.get(x).wrapping_add(nn));
                Flow::Next
            }

            Mov(x, y) => {
                regs.set(x, regs.get(y));
                Flow::Next
            }

            Or(x, y) => {
                regs.set(x, regs.get(x) | regs.get(y));
                Flow::Next
            }

            And(x, y) => {
                regs.set(x, regs.get(x) & regs.get(y));
                Flow::Next
            }

            Xor(x, y) => {
                regs.set(x, regs.get(x) ^ regs.get(y));
                Flow::Next
            }

            // For the arithmetic ones, operands are read first and `Vx` is written last: when
            // `x` is `VF`, the result overrides the flag.
            AddReg(x, y) => {
                let (res, carry) = regs.get(x).overflowing_add(regs.get(y));
                debug!("{} + {} = {} (carry: {})", regs.get(x), regs.get(y), res, carry);
                regs.set_flag(carry);
                regs.set(x, res);
                Flow::Next
            }

            Sub(x, y) => {
                let (a, b) = (regs.get(x), regs.get(y));
                regs.set_flag(a > b);
                regs.set(x, a.wrapping_sub(b));
                Flow::Next
            }

            Shr(x) => {
                let a = regs.get(x);
                regs.set_flag(a & 0x01 != 0);
                regs.set(x, a >> 1);
                Flow::Next
            }

            Subn(x, y) => {
                let (a, b) = (regs.get(x), regs.get(y));
                regs.set_flag(b > a);
                regs.set(x, b.wrapping_sub(a));
                Flow::Next
            }

            Shl(x) => {
                let a = regs.get(x);
                regs.set_flag(a & 0x80 != 0);
                regs.set(x, a << 1);
                Flow::Next
            }

            LdI(Addr(address)) => {
                regs.i = address;
                Flow::Next
            }

            JpV0(Addr(offset)) => Flow::Jump(C::Address::from(regs.get(Reg::V0)) + offset),

            Rnd(x, Imm(mask)) => {
                let byte: u8 = computer.rng.gen();
                regs.set(x, byte & mask);
                Flow::Next
            }

            Drw(x, y, n) => {
                let (vx, vy) = (regs.get(x), regs.get(y));
                let sprite = computer.memory.slice(regs.i, usize::from(n))?;
                let collided = display.draw_sprite(vx, vy, sprite);
                regs.set_flag(collided);
                Flow::Next
            }

            Skp(x) => Flow::skip_if(input.is_key_pressed(regs.get(x) & 0xF)),
            Sknp(x) => Flow::skip_if(!input.is_key_pressed(regs.get(x) & 0xF)),

            LdFromDelay(x) => {
                regs.set(x, computer.timers.delay());
                Flow::Next
            }

            LdKey(x) => {
                let key = (0u8..)
                    .take(KEY_COUNT)
                    .find(|code| input.is_key_pressed(*code));
                if let Some(key) = key {
                    regs.set(x, key);
                    Flow::Next
                } else {
                    Flow::Stay
                }
            }

            LdDelay(x) => {
                computer.timers.set_delay(regs.get(x));
                Flow::Next
            }

            LdSound(x) => {
                computer.timers.set_sound(regs.get(x));
                Flow::Next
            }

            AddI(x) => {
                regs.i = regs.i.wrapping_add(C::Address::from(regs.get(x)));
                Flow::Next
            }

            LdFont(x) => {
                regs.i = FONT_START + C::Address::from(regs.get(x) & 0xF) * FONT_GLYPH_SIZE;
                Flow::Next
            }

            Bcd(x) => {
                let value = regs.get(x);
                let cells = computer.memory.slice_mut(regs.i, 3)?;
                cells.copy_from_slice(&[value / 100, value / 10 % 10, value % 10]);
                Flow::Next
            }

            Store(x) => {
                let count = x.index() + 1;
                let cells = computer.memory.slice_mut(regs.i, count)?;
                cells.copy_from_slice(&regs.v[..count]);
                Flow::Next
            }

            Load(x) => {
                let count = x.index() + 1;
                let cells = computer.memory.slice(regs.i, count)?;
                regs.v[..count].copy_from_slice(cells);
                Flow::Next
            }
        };

        Ok(flow)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn decode_test() {
        use Instruction::*;

        assert_eq!(Instruction::decode(0x00E0), Ok(Cls));
        assert_eq!(Instruction::decode(0x00EE), Ok(Ret));
        assert_eq!(Instruction::decode(0x1ABC), Ok(Jp(Addr(0xABC))));
        assert_eq!(Instruction::decode(0x3A05), Ok(SeImm(Reg::VA, Imm(0x05))));
        assert_eq!(Instruction::decode(0x5120), Ok(SeReg(Reg::V1, Reg::V2)));
        assert_eq!(Instruction::decode(0x8AB4), Ok(AddReg(Reg::VA, Reg::VB)));
        assert_eq!(Instruction::decode(0x8A0E), Ok(Shl(Reg::VA)));
        assert_eq!(Instruction::decode(0xD125), Ok(Drw(Reg::V1, Reg::V2, 5)));
        assert_eq!(Instruction::decode(0xE39E), Ok(Skp(Reg::V3)));
        assert_eq!(Instruction::decode(0xF40A), Ok(LdKey(Reg::V4)));
        assert_eq!(Instruction::decode(0xFF65), Ok(Load(Reg::VF)));
    }

    #[test]
    fn decode_fault_test() {
        for opcode in [
            0x0000, 0x0123, 0x00E1, 0x5121, 0x8128, 0x812F, 0xE100, 0xE1A2, 0xF100, 0xF156,
        ] {
            assert_eq!(
                Instruction::decode(opcode),
                Err(Exception::DecodeFault { opcode }),
                "{opcode:#06X}"
            );
        }
    }

    #[test]
    fn malformed_test() {
        assert_eq!(
            Instruction::decode(0x9121),
            Ok(Instruction::SneReg(Reg::V1, Reg::V2))
        );
        assert!(Instruction::is_malformed(0x9121));
        assert!(!Instruction::is_malformed(0x9120));
        assert!(!Instruction::is_malformed(0x5121));
    }

    #[test]
    fn display_test() {
        let cases = [
            (0x00E0, "cls"),
            (0x1200, "jp   0x200"),
            (0x2ABC, "call 0xABC"),
            (0x6A05, "ld   VA, 0x05"),
            (0x8124, "add  V1, V2"),
            (0x8106, "shr  V1"),
            (0xA050, "ld   I, 0x050"),
            (0xB300, "jp   V0, 0x300"),
            (0xD01F, "drw  V0, V1, 15"),
            (0xF507, "ld   V5, DT"),
            (0xF555, "ld   [I], V5"),
        ];

        for (opcode, expected) in cases {
            assert_eq!(Instruction::decode(opcode).unwrap().to_string(), expected);
        }
    }
}
