//! A CHIP-8 virtual machine.
//!
//! The [`Computer`] owns the processor state; peripherals are handed to every step through the
//! [`hooks`] traits.

pub mod constants;
pub mod disassembler;
pub mod hooks;
pub mod rom;
pub mod runtime;
pub mod sanity;

pub use self::disassembler::disassemble;
pub use self::rom::{Rom, RomError};
pub use self::runtime::Computer;
