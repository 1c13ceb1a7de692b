use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, trace};

use crate::constants::{self as C, FONT, FONT_START, PROGRAM_START};
use crate::hooks::{DisplayHook, InputHook, TraceSink, TracingSink};
use crate::rom::Rom;

mod exception;
mod instructions;
mod memory;
mod registers;
mod stack;
mod timers;

pub use self::exception::Exception;
pub use self::instructions::{Addr, Imm, Instruction};
pub use self::memory::{Memory, MemoryError};
pub use self::registers::{Reg, RegisterParseError, Registers};
pub use self::stack::CallStack;
pub use self::timers::Timers;

use self::instructions::Flow;

/// The whole machine: registers, memory, call stack and timers.
///
/// Peripherals are not owned: they are handed to every [`Computer::step`].
pub struct Computer {
    pub registers: Registers,
    pub memory: Memory,
    pub stack: CallStack,
    pub cycles: usize,
    timers: Arc<Timers>,
    rng: StdRng,
    sink: Box<dyn TraceSink>,
}

impl Default for Computer {
    fn default() -> Self {
        Self {
            registers: Registers::default(),
            memory: Memory::default(),
            stack: CallStack::default(),
            cycles: 0,
            timers: Arc::default(),
            rng: StdRng::from_entropy(),
            sink: Box::new(TracingSink),
        }
    }
}

impl std::fmt::Debug for Computer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Computer {{ registers: {:?}, stack: {:?}, memory: [...] }}",
            self.registers, self.stack
        )
    }
}

impl Computer {
    /// Use a deterministic random generator
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Send diagnostics to another sink
    #[must_use]
    pub fn with_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Shared handle on the delay and sound timers, for the driver ticking them
    #[must_use]
    pub fn timers(&self) -> Arc<Timers> {
        Arc::clone(&self.timers)
    }

    fn trace(&mut self, message: &str) {
        self.sink.trace(message);
    }

    /// Wipe memory, registers, call stack and timers
    #[tracing::instrument(skip(self))]
    pub fn reset(&mut self) {
        self.memory.clear();
        self.registers = Registers::default();
        self.stack = CallStack::default();
        self.timers.clear();
        self.cycles = 0;
        self.trace("reset completed");
    }

    /// Reset the machine, install the hexadecimal font and the program image, and point `PC` at
    /// the start of the program.
    ///
    /// # Errors
    ///
    /// Fails if the image does not fit in memory, which a [`Rom`] rules out on construction.
    #[tracing::instrument(skip_all, fields(size = rom.len()))]
    pub fn load(&mut self, rom: &Rom) -> Result<(), MemoryError> {
        self.reset();
        self.memory.write_all(FONT_START, &FONT)?;
        self.memory.write_all(PROGRAM_START, rom.bytes())?;
        self.registers.pc = PROGRAM_START;
        info!(size = rom.len(), "Program loaded");
        Ok(())
    }

    /// Restart execution from address 0 after an illegal condition.
    ///
    /// Only control-flow state is cleared (`PC`, `I` and the stack pointer); memory and
    /// general purpose registers are kept.
    pub(crate) fn fault(&mut self, exception: &Exception) {
        let pc = self.registers.pc;
        debug!(%exception, pc, "Fault, restarting at address 0");
        self.trace(&format!(
            "fault ({}) at {pc:#05X}: {exception}",
            exception.code()
        ));

        self.registers.pc = 0;
        self.registers.i = 0;
        self.stack.reset_pointer();
    }

    /// Fetch and decode the instruction at `PC`
    fn decode_instruction(&self) -> Result<(C::Opcode, Instruction), Exception> {
        let opcode = self.memory.read_u16(self.registers.pc)?;
        let instruction = Instruction::decode(opcode)?;
        Ok((opcode, instruction))
    }

    /// Execute one instruction. `PC` is left on the next one to run.
    ///
    /// # Errors
    ///
    /// Returns the exception raised by the instruction. The state is left as it was when the
    /// exception was raised: callers are expected to hand it to the fault handler.
    pub(crate) fn try_step(
        &mut self,
        display: &mut dyn DisplayHook,
        input: &dyn InputHook,
    ) -> Result<(), Exception> {
        let pc = self.registers.pc;
        let (opcode, instruction) = self.decode_instruction()?;
        if Instruction::is_malformed(opcode) {
            self.trace(&format!(
                "malformed instruction {opcode:#06X} at {pc:#05X}, low nibble ignored"
            ));
        }

        debug!(pc, "Executing instruction \"{}\"", instruction);
        let flow = instruction.execute(self, display, input)?;

        self.registers.pc = match flow {
            Flow::Next => pc + 2,
            Flow::Skip => pc + 4,
            Flow::Jump(target) => target,
            Flow::Stay => pc,
        };

        Ok(())
    }

    /// Fetch, decode and execute the instruction at `PC`.
    ///
    /// Illegal conditions never escape: they go through the fault handler, and the next step
    /// starts over at address 0.
    #[tracing::instrument(skip_all, level = "debug", fields(pc = self.registers.pc))]
    pub fn step(&mut self, display: &mut dyn DisplayHook, input: &dyn InputHook) {
        if let Err(exception) = self.try_step(display, input) {
            self.fault(&exception);
        }
        self.cycles += 1;
        trace!("Register state {}", self.registers);
    }

    /// Run `count` steps
    pub fn run(&mut self, count: usize, display: &mut dyn DisplayHook, input: &dyn InputHook) {
        for _ in 0..count {
            self.step(display, input);
        }
    }
}
