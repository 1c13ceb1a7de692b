use camino::Utf8PathBuf;
use chip8_emulator::constants::TIMER_FREQUENCY;
use chip8_emulator::hooks::{Framebuffer, Keypad};
use chip8_emulator::{Computer, Rom};
use clap::{ArgAction, Parser, ValueHint};
use tracing::{debug, info};

use crate::interactive::parse::parse_key;
use crate::interactive::run_interactive;

#[derive(Parser, Debug)]
pub struct RunOpt {
    /// Program image
    #[arg(value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// Number of instructions to execute
    #[arg(short = 'n', long, default_value_t = 10_000)]
    cycles: u64,

    /// Instructions executed per emulated second, used to pace the timers
    #[arg(long, default_value_t = 700)]
    clock: u32,

    /// Seed of the random generator
    #[arg(long)]
    seed: Option<u64>,

    /// Key held down during the whole run, as a hexadecimal digit. Can be repeated.
    #[arg(short, long = "key", value_parser = parse_key)]
    keys: Vec<u8>,

    /// Print the screen once the program stops
    #[arg(long, action = ArgAction::SetTrue)]
    screen: bool,

    /// Run the program in interactive mode
    #[arg(short, long, action = ArgAction::SetTrue)]
    interactive: bool,
}

impl RunOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        info!(path = %self.input, "Reading program");
        let rom = Rom::read(&self.input)?;

        let mut computer = Computer::default();
        if let Some(seed) = self.seed {
            computer = computer.with_seed(seed);
        }
        computer.load(&rom)?;

        let mut screen = Framebuffer::default();
        let mut keypad = Keypad::default();
        for key in &self.keys {
            keypad.press(*key);
        }

        // Timers run at a fixed rate of emulated time
        let ticks_every = u64::from((self.clock / TIMER_FREQUENCY).max(1));

        if self.interactive {
            run_interactive(&mut computer, &rom, &mut screen, &mut keypad, ticks_every)?;
        } else {
            debug!(ticks_every, "Running program");
            let timers = computer.timers();

            for cycle in 1..=self.cycles {
                computer.step(&mut screen, &keypad);
                if cycle % ticks_every == 0 {
                    timers.tick();
                }
            }
        }

        info!(registers = %computer.registers, cycles = computer.cycles, "End of program");
        if self.screen {
            print!("{screen}");
        }

        Ok(())
    }
}
