//! Self-checks runnable from an embedding application.
//!
//! Checks are plain functions collected in a [`SanityRegistry`] owned by whoever runs them;
//! nothing registers itself globally. [`builtin`] returns the machine's own checks.

use thiserror::Error;
use tracing::{info, warn};

use crate::constants::{FONT_GLYPH_SIZE, FONT_START, PROGRAM_START, STACK_DEPTH};
use crate::hooks::{Framebuffer, Keypad, RecordingSink};
use crate::rom::Rom;
use crate::runtime::{Computer, Reg};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SanityError(String);

pub type SanityResult = Result<(), SanityError>;

/// Fail the check with a message if `condition` does not hold
macro_rules! ensure {
    ($condition:expr, $($arg:tt)+) => {
        if !$condition {
            return Err(SanityError(format!($($arg)+)));
        }
    };
}

struct SanityCheck {
    name: &'static str,
    run: Box<dyn Fn() -> SanityResult>,
}

/// Ordered list of named checks
#[derive(Default)]
pub struct SanityRegistry {
    checks: Vec<SanityCheck>,
}

impl std::fmt::Debug for SanityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.checks.iter().map(|c| c.name))
            .finish()
    }
}

/// Outcome of [`SanityRegistry::run`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SanityReport {
    pub passed: Vec<&'static str>,
    pub failed: Vec<(&'static str, SanityError)>,
}

impl SanityReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl SanityRegistry {
    pub fn register<F>(&mut self, name: &'static str, check: F) -> &mut Self
    where
        F: Fn() -> SanityResult + 'static,
    {
        self.checks.push(SanityCheck {
            name,
            run: Box::new(check),
        });
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checks.iter().map(|c| c.name)
    }

    /// Run every check in registration order
    #[tracing::instrument(skip(self), fields(count = self.checks.len()))]
    pub fn run(&self) -> SanityReport {
        let mut report = SanityReport::default();
        for check in &self.checks {
            match (check.run)() {
                Ok(()) => {
                    info!(name = check.name, "Sanity check passed");
                    report.passed.push(check.name);
                }
                Err(e) => {
                    warn!(name = check.name, error = %e, "Sanity check failed");
                    report.failed.push((check.name, e));
                }
            }
        }
        report
    }
}

fn machine(program: &[u8]) -> Result<Computer, SanityError> {
    let rom = Rom::from_bytes(program.to_vec()).map_err(|e| SanityError(e.to_string()))?;
    let mut computer = Computer::default().with_seed(0).with_sink(RecordingSink::default());
    computer
        .load(&rom)
        .map_err(|e| SanityError(e.to_string()))?;
    Ok(computer)
}

fn initial_state() -> SanityResult {
    let computer = Computer::default();
    ensure!(computer.registers.pc == 0, "PC is not zero");
    ensure!(computer.registers.i == 0, "I is not zero");
    ensure!(computer.stack.sp() == 0, "SP is not zero");
    ensure!(
        computer.registers.v.iter().all(|v| *v == 0),
        "registers are not zeroed"
    );
    let memory = computer
        .memory
        .slice(0, crate::constants::MEMORY_SIZE)
        .map_err(|e| SanityError(e.to_string()))?;
    ensure!(memory.iter().all(|c| *c == 0), "memory is not zeroed");
    Ok(())
}

fn load_immediate() -> SanityResult {
    let mut computer = machine(&[0x60, 0x05])?;
    computer.step(&mut Framebuffer::default(), &Keypad::default());
    ensure!(
        computer.registers.get(Reg::V0) == 5,
        "V0 = {}",
        computer.registers.get(Reg::V0)
    );
    ensure!(
        computer.registers.pc == PROGRAM_START + 2,
        "PC = {:#05X}",
        computer.registers.pc
    );
    Ok(())
}

fn call_and_return() -> SanityResult {
    // call 0x204, (padding), ret
    let mut computer = machine(&[0x22, 0x04, 0x00, 0x00, 0x00, 0xEE])?;
    let mut fb = Framebuffer::default();
    let keys = Keypad::default();

    computer.step(&mut fb, &keys);
    ensure!(computer.registers.pc == 0x204, "call did not jump");
    ensure!(computer.stack.frames() == [0x200], "call did not push PC");

    computer.step(&mut fb, &keys);
    ensure!(
        computer.registers.pc == 0x202,
        "ret went to {:#05X}",
        computer.registers.pc
    );
    Ok(())
}

fn stack_overflow() -> SanityResult {
    // An endless chain of calls to the next instruction
    let program: Vec<u8> = (0..=STACK_DEPTH)
        .flat_map(|i| {
            let target = PROGRAM_START + 2 * (u16::try_from(i).unwrap_or(0) + 1);
            (0x2000 | target).to_be_bytes()
        })
        .collect();
    let mut computer = machine(&program)?;
    computer.registers.i = 0x300;

    computer.run(STACK_DEPTH, &mut Framebuffer::default(), &Keypad::default());
    ensure!(computer.stack.sp() == STACK_DEPTH, "stack is not full");

    computer.step(&mut Framebuffer::default(), &Keypad::default());
    ensure!(
        computer.registers.pc == 0 && computer.registers.i == 0 && computer.stack.sp() == 0,
        "overflow did not fault"
    );
    Ok(())
}

fn arithmetic_flags() -> SanityResult {
    // ld V0, 0xFF; ld V1, 0x02; add V0, V1; sub V1, V0
    let mut computer = machine(&[0x60, 0xFF, 0x61, 0x02, 0x80, 0x14, 0x81, 0x05])?;
    let mut fb = Framebuffer::default();
    let keys = Keypad::default();

    computer.run(3, &mut fb, &keys);
    ensure!(computer.registers.get(Reg::V0) == 0x01, "sum was not truncated");
    ensure!(computer.registers.get(Reg::VF) == 1, "carry was not set");

    computer.step(&mut fb, &keys);
    ensure!(computer.registers.get(Reg::V1) == 0x01, "wrong difference");
    ensure!(computer.registers.get(Reg::VF) == 1, "no-borrow flag was not set");
    Ok(())
}

fn block_transfer_range() -> SanityResult {
    // ld I, 0xFFE; ld [I], V3
    let mut computer = machine(&[0xAF, 0xFE, 0xF3, 0x55])?;
    computer.registers.v[..4].copy_from_slice(&[1, 2, 3, 4]);
    computer.run(2, &mut Framebuffer::default(), &Keypad::default());

    let tail = computer
        .memory
        .slice(0xFFE, 2)
        .map_err(|e| SanityError(e.to_string()))?;
    ensure!(tail == [0, 0], "partial write at the end of memory");
    ensure!(computer.registers.pc == 0, "range violation did not fault");
    Ok(())
}

fn font_sprite() -> SanityResult {
    // ld V0, 0x0A; ld F, V0; drw V1, V1, 5
    let mut computer = machine(&[0x60, 0x0A, 0xF0, 0x29, 0xD1, 0x15])?;
    let mut fb = Framebuffer::default();
    computer.run(2, &mut fb, &Keypad::default());
    ensure!(
        computer.registers.i == FONT_START + 10 * FONT_GLYPH_SIZE,
        "wrong glyph address"
    );

    computer.step(&mut fb, &Keypad::default());
    // "A" is 0xF0 0x90 0xF0 0x90 0x90
    ensure!(fb.lit() == 14, "glyph has {} lit pixels", fb.lit());
    ensure!(computer.registers.get(Reg::VF) == 0, "unexpected collision");
    Ok(())
}

/// The machine's own checks
#[must_use]
pub fn builtin() -> SanityRegistry {
    let mut registry = SanityRegistry::default();
    registry
        .register("initial-state", initial_state)
        .register("load-immediate", load_immediate)
        .register("call-and-return", call_and_return)
        .register("stack-overflow", stack_overflow)
        .register("arithmetic-flags", arithmetic_flags)
        .register("block-transfer-range", block_transfer_range)
        .register("font-sprite", font_sprite);
    registry
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn builtin_passes_test() {
        let report = builtin().run();
        assert!(report.is_success(), "{:?}", report.failed);
        assert_eq!(report.passed.len(), builtin().len());
    }

    #[test]
    fn failures_are_reported_test() {
        let mut registry = SanityRegistry::default();
        registry
            .register("ok", || Ok(()))
            .register("ko", || {
                ensure!(1 + 1 == 3, "math is broken");
                Ok(())
            });

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["ok", "ko"]);

        let report = registry.run();
        assert!(!report.is_success());
        assert_eq!(report.passed, vec!["ok"]);
        assert_eq!(
            report.failed,
            vec![("ko", SanityError("math is broken".to_owned()))]
        );
    }
}
