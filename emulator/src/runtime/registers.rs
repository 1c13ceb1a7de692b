use parse_display::Display;
use thiserror::Error;

use crate::constants::{self as C, REGISTER_COUNT};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registers {
    /// General purpose, `VF` doubles as the flag register
    pub v: [C::Word; REGISTER_COUNT],

    /// Index register
    pub i: C::Address,

    /// Program counter
    pub pc: C::Address,
}

impl Registers {
    #[must_use]
    pub fn get(&self, reg: Reg) -> C::Word {
        self.v[reg.index()]
    }

    pub fn set(&mut self, reg: Reg, value: C::Word) {
        self.v[reg.index()] = value;
    }

    /// Set the flag register
    pub(crate) fn set_flag(&mut self, flag: bool) {
        self.set(Reg::VF, flag.into());
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (reg, value) in Reg::ALL.iter().zip(self.v) {
            write!(f, "{reg} = {value:#04X} | ")?;
        }
        write!(f, "I = {:#05X} | PC = {:#05X}", self.i, self.pc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Reg {
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    /// Flag register (carry, no borrow, collision)
    VF,
}

impl Reg {
    pub const ALL: [Reg; REGISTER_COUNT] = [
        Reg::V0,
        Reg::V1,
        Reg::V2,
        Reg::V3,
        Reg::V4,
        Reg::V5,
        Reg::V6,
        Reg::V7,
        Reg::V8,
        Reg::V9,
        Reg::VA,
        Reg::VB,
        Reg::VC,
        Reg::VD,
        Reg::VE,
        Reg::VF,
    ];

    /// Register selected by the low four bits of `nibble`
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Self {
        Self::ALL[(nibble & 0xF) as usize]
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Registers `V0` up to and including `self`
    pub fn through(self) -> impl Iterator<Item = Reg> {
        Self::ALL.into_iter().take(self.index() + 1)
    }
}

#[derive(Error, Debug)]
#[error("could not parse register")]
pub struct RegisterParseError;

impl std::str::FromStr for Reg {
    type Err = RegisterParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim_start_matches('%');
        let digit = s
            .strip_prefix('v')
            .or_else(|| s.strip_prefix('V'))
            .ok_or(RegisterParseError)?;
        if digit.len() != 1 {
            return Err(RegisterParseError);
        }
        let nibble = u8::from_str_radix(digit, 16).map_err(|_| RegisterParseError)?;
        Ok(Reg::from_nibble(nibble))
    }
}
