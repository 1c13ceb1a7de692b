use thiserror::Error;

use crate::constants::{Address, Opcode};

use super::memory::MemoryError;

/// Illegal conditions raised while executing an instruction.
///
/// None of them escape [`Computer::step`](super::Computer::step): they are all
/// routed to the fault handler, which restarts execution at address 0.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    #[error("unrecognized instruction {opcode:#06X}")]
    DecodeFault { opcode: Opcode },

    #[error("return with an empty call stack")]
    StackUnderflow,

    #[error("call with a full call stack")]
    StackOverflow,

    #[error("access of {len} byte(s) at {address:#05X} is out of memory bounds")]
    AddressRangeFault { address: Address, len: usize },
}

impl From<MemoryError> for Exception {
    fn from(e: MemoryError) -> Self {
        match e {
            MemoryError::OutOfRange { address, len } => Self::AddressRangeFault { address, len },
        }
    }
}

impl Exception {
    /// Short code used in diagnostics
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Exception::DecodeFault { .. } => "decode",
            Exception::StackUnderflow => "stack-underflow",
            Exception::StackOverflow => "stack-overflow",
            Exception::AddressRangeFault { .. } => "address-range",
        }
    }
}
