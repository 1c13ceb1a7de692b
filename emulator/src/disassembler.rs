use crate::constants::{Address, Opcode};
use crate::runtime::Instruction;

/// One decoded instruction slot of a program image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub address: Address,
    pub opcode: Opcode,

    /// `None` if the opcode is not a valid instruction (data, padding…)
    pub instruction: Option<Instruction>,
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#05X}  {:04X}  ", self.address, self.opcode)?;
        match &self.instruction {
            Some(instruction) => write!(f, "{instruction}"),
            None => write!(f, "–"),
        }
    }
}

/// Decode `bytes` two at a time, as if they were loaded at `origin`.
///
/// A trailing odd byte is decoded as the high byte of an opcode.
pub fn disassemble(bytes: &[u8], origin: Address) -> impl Iterator<Item = Line> + '_ {
    (origin..).step_by(2).zip(bytes.chunks(2)).map(|(address, chunk)| {
        let opcode = match *chunk {
            [hi, lo] => Opcode::from_be_bytes([hi, lo]),
            [hi] => Opcode::from(hi) << 8,
            _ => 0,
        };

        Line {
            address,
            opcode,
            instruction: Instruction::decode(opcode).ok(),
        }
    })
}
