//! This module implements the TTY interactive interface.
//!
//! It is mainly based on two crates:
//!   - rustyline, to handle the line-editting logic
//!   - clap, to handle the parsing of those interactive commands
//!
//! Using Parser to do this is a bit of a hack, and requires some weird options
//! to have it working but works nonetheless.

use std::collections::HashSet;

use anyhow::Context as _;
use chip8_emulator::constants as C;
use chip8_emulator::hooks::{Framebuffer, Keypad};
use chip8_emulator::runtime::{Computer, Instruction, Reg};
use chip8_emulator::Rom;
use clap::{Parser, ValueEnum};
use rustyline::history::DefaultHistory;
use rustyline::{Behavior, CompletionType, Config, EditMode, Editor};
use tracing::{debug, info, warn};

mod helper;
pub(crate) mod parse;
use self::helper::RunHelper;

static HELP: &str = r#"
Run "help [command]" for command-specific help.
An empty line re-runs the last valid command."#;

#[derive(Parser, Clone, Debug)]
#[command(
    help_template = "{about}\n\nCOMMANDS:\n{subcommands}\n{after-help}",
    after_help = HELP,
    disable_version_flag = true,
    infer_subcommands = true,
    no_binary_name = true,
    allow_negative_numbers = true,
)]
/// Interactive mode commands
enum Command {
    /// Execute the next instructions
    #[command(alias = "s")]
    Step {
        /// Number of steps to execute
        #[arg(default_value = "1")]
        number: u64,
    },

    /// Run the program until the next breakpoint
    #[command(alias = "c")]
    Continue {
        /// Give up after this many instructions
        #[arg(default_value = "100000")]
        limit: u64,
    },

    /// Exit the emulator
    Exit,

    /// Show the state of registers
    Registers { register: Option<Reg> },

    /// Show the content of a block in memory
    Memory {
        /// The address to show. Can be a direct address (number literal) or an
        /// indirect one (register with an optional offset).
        address: parse::Argument,

        /// Number of bytes to show. Negative numbers go backwards.
        #[arg(default_value = "1")]
        number: i32,
    },

    /// Set a register, a timer or a byte in memory
    Set {
        /// What to set: a register, `i`, `pc`, `dt`, `st` or an address between brackets
        target: parse::AssignmentTarget,

        /// The value to set
        value: parse::Argument,
    },

    /// Show the next few instructions
    List {
        /// Number of instructions to show.
        #[arg(default_value = "10")]
        number: u16,
    },

    /// Set a breakpoint
    Break {
        /// The address where to set the breakpoint
        address: parse::Argument,
    },

    /// Remove a breakpoint
    Unbreak {
        /// The address of the breakpoint to remove
        address: parse::Argument,
    },

    /// Press or release a key of the keypad
    Key {
        /// Key code, from 0 to F
        #[arg(value_parser = parse::parse_key)]
        key: u8,

        #[arg(value_enum, default_value = "down")]
        state: KeyState,
    },

    /// Decrement the delay and sound timers
    Tick {
        #[arg(default_value = "1")]
        number: u32,
    },

    /// Print the screen
    Screen,

    /// Reload the program and start over
    Reset,

    /// Show informations about the current debugging session
    Info {
        #[command(subcommand)]
        sub: Option<InfoCommand>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum KeyState {
    Down,
    Up,
}

#[derive(Parser, Clone, Debug)]
enum InfoCommand {
    /// List active breakpoints
    Breakpoints,

    /// Show the return addresses on the call stack
    Stack,

    /// Show the delay and sound timers
    Timers,

    /// Show the number of instructions executed since the program was loaded
    Cycles,
}

/// Holds informations about a interactive session
#[derive(Debug, Default)]
struct Session {
    /// List of active breakpoints
    breakpoints: HashSet<C::Address>,

    /// Current address for the `list` command
    list_address: Option<C::Address>,

    /// Number of instructions between two timer ticks on `continue`
    ticks_every: u64,
}

impl Session {
    /// Add a breakpoint
    fn add_breakpoint(&mut self, address: C::Address) {
        if self.breakpoints.insert(address) {
            info!(address, "Setting a breakpoint");
        } else {
            warn!(address, "A breakpoint was already set");
        }
    }

    /// Remove a breakpoint
    fn remove_breakpoint(&mut self, address: C::Address) {
        if self.breakpoints.remove(&address) {
            info!(address, "Removing breakpoint");
        } else {
            warn!(address, "No breakpoint was set here");
        }
    }

    fn has_breakpoint(&self, address: C::Address) -> bool {
        self.breakpoints.contains(&address)
    }

    /// Reset the `list` command (after running an instruction)
    fn reset_list(&mut self) {
        self.list_address = None;
    }

    /// Offset the `list` command, returns the address to show
    fn offset_list(&mut self, computer: &Computer, offset: C::Address) -> C::Address {
        let addr = self.list_address.unwrap_or(computer.registers.pc);
        self.list_address = Some(addr.saturating_add(offset));
        addr
    }

    fn display_breakpoints(&self, computer: &Computer) {
        match self.breakpoints.len() {
            0 => info!("No breakpoints"),
            1 => info!("1 breakpoint:"),
            x => info!("{} breakpoints:", x),
        }

        let mut bp: Vec<_> = self.breakpoints.iter().copied().collect();
        bp.sort_unstable();
        for addr in bp {
            self.display_instruction(computer, addr);
        }
    }

    /// Display an instruction at specified address
    fn display_instruction(&self, computer: &Computer, address: C::Address) {
        let is_current_line = computer.registers.pc == address;
        let has_breakpoint = self.has_breakpoint(address);

        let gutter = match (has_breakpoint, is_current_line) {
            (true, true) => "B>",
            (true, false) => "B ",
            (false, true) => " >",
            (false, false) => "  ",
        };

        // `None` past the end of memory
        let Ok(opcode) = computer.memory.read_u16(address) else {
            info!("{:<2} {:#05X}  ----  –", gutter, address);
            return;
        };

        match Instruction::decode(opcode) {
            Ok(instruction) => info!("{:<2} {:#05X}  {:04X}  {}", gutter, address, opcode, instruction),
            Err(_) => info!("{:<2} {:#05X}  {:04X}  –", gutter, address, opcode),
        }
    }

    fn display_stack(computer: &Computer) {
        let frames = computer.stack.frames();
        if frames.is_empty() {
            info!("Call stack is empty");
        }

        for (depth, address) in frames.iter().enumerate().rev() {
            info!("  #{depth:<2} {address:#05X}");
        }
    }

    fn display_timers(computer: &Computer) {
        let timers = computer.timers();
        info!(
            delay = timers.delay(),
            sound = timers.sound(),
            sounding = timers.is_sounding(),
            "Timers"
        );
    }

    fn display_cycles(computer: &Computer) {
        info!("Cycles: {}", computer.cycles);
    }
}

/// Narrow an evaluated argument to a byte
fn to_byte(value: C::Address) -> anyhow::Result<C::Word> {
    C::Word::try_from(value).with_context(|| format!("{value:#X} does not fit in a byte"))
}

fn assign(
    computer: &mut Computer,
    target: parse::AssignmentTarget,
    value: C::Address,
) -> anyhow::Result<()> {
    use parse::AssignmentTarget as T;

    match target {
        T::Register(reg) => {
            info!("Setting register {reg} to {value:#04X}");
            computer.registers.set(reg, to_byte(value)?);
        }
        T::Index => {
            info!("Setting I to {value:#05X}");
            computer.registers.i = value;
        }
        T::ProgramCounter => {
            info!("Setting PC to {value:#05X}");
            computer.registers.pc = value;
        }
        T::DelayTimer => {
            info!("Setting the delay timer to {value}");
            computer.timers().set_delay(to_byte(value)?);
        }
        T::SoundTimer => {
            info!("Setting the sound timer to {value}");
            computer.timers().set_sound(to_byte(value)?);
        }
        T::Memory(address) => {
            let address = address.evaluate(computer)?;
            let byte = to_byte(value)?;
            info!("Setting memory at address {address:#05X} to {byte:#04X}");
            *computer.memory.get_mut(address)? = byte;
        }
    }

    Ok(())
}

/// Run the debugger prompt on a loaded machine until the user exits
#[allow(clippy::too_many_lines)]
pub(crate) fn run_interactive(
    computer: &mut Computer,
    rom: &Rom,
    screen: &mut Framebuffer,
    keypad: &mut Keypad,
    ticks_every: u64,
) -> anyhow::Result<()> {
    info!("Running in interactive mode. Type \"help\" to list available commands.");
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .behavior(Behavior::PreferTerm)
        .auto_add_history(true)
        .build();

    let mut session = Session {
        ticks_every: ticks_every.max(1),
        ..Session::default()
    };

    let h: RunHelper<Command> = RunHelper::new();
    let mut rl: Editor<RunHelper<Command>, DefaultHistory> =
        Editor::with_config(config).context("could not initialize terminal input")?;
    rl.set_helper(Some(h));

    let mut last_command: Option<Command> = None;

    'read: loop {
        // A macro to unwrap an error, log it and continue the loop
        macro_rules! warn_and_continue {
            ($e:expr) => {
                match $e {
                    Ok(o) => o,
                    Err(e) => {
                        tracing::warn!(error = %e);
                        continue 'read;
                    }
                }
            };
        }

        let Ok(readline) = rl.readline(">> ") else {
            info!("EOF, exitting");
            return Ok(());
        };

        let command = if readline.is_empty() {
            if let Some(command) = &last_command {
                command.clone()
            } else {
                info!("Type \"help\" to get the list of available commands");
                continue 'read;
            }
        } else {
            let Ok(words) = shell_words::split(readline.as_str()) else {
                warn!("Invalid input");
                continue 'read;
            };

            let command = match Command::try_parse_from(words) {
                Ok(command) => command,
                Err(e) => {
                    // Help and usage errors are printed as clap formats them
                    let _ = e.print();
                    continue 'read;
                }
            };
            last_command = Some(command.clone());
            command
        };

        debug!("Executing command: {:?}", command);

        match command {
            Command::Exit => break,

            Command::Step { number } => {
                session.reset_list();
                for _ in 0..number {
                    computer.step(screen, &*keypad);
                }
            }

            Command::Continue { limit } => {
                session.reset_list();
                let timers = computer.timers();
                let mut stopped = false;

                for executed in 1..=limit {
                    computer.step(screen, &*keypad);
                    if executed % session.ticks_every == 0 {
                        timers.tick();
                    }

                    if session.has_breakpoint(computer.registers.pc) {
                        info!(address = computer.registers.pc, "Stopped at a breakpoint");
                        stopped = true;
                        break;
                    }
                }

                if !stopped {
                    warn!(limit, "No breakpoint reached");
                }
            }

            Command::Registers { register } => {
                if let Some(reg) = register {
                    let value = computer.registers.get(reg);
                    info!("Register {} = {:#04X} ({})", reg, value, value);
                } else {
                    info!("Registers: {}", computer.registers);
                }
            }

            Command::Memory { address, number } => {
                let address = warn_and_continue!(address.evaluate(computer));

                for i in 0..number.unsigned_abs() {
                    let offset = warn_and_continue!(C::Address::try_from(i));
                    let address = if number.is_positive() {
                        address.checked_add(offset)
                    } else {
                        address.checked_sub(offset)
                    };
                    let Some(address) = address else {
                        break;
                    };

                    let value = warn_and_continue!(computer.memory.get(address));
                    info!("{address:#05X}: {value:#04X}");
                }
            }

            Command::Set { target, value } => {
                let value = warn_and_continue!(value.evaluate(computer));
                warn_and_continue!(assign(computer, target, value));
                session.reset_list();
            }

            Command::List { number } => {
                let addr = session.offset_list(computer, number.saturating_mul(2));
                for i in 0..number {
                    let Some(addr) = i.checked_mul(2).and_then(|o| addr.checked_add(o)) else {
                        break;
                    };
                    session.display_instruction(computer, addr);
                }
            }

            Command::Break { address } => {
                let address = warn_and_continue!(address.evaluate(computer));
                session.add_breakpoint(address);
            }

            Command::Unbreak { address } => {
                let address = warn_and_continue!(address.evaluate(computer));
                session.remove_breakpoint(address);
            }

            Command::Key { key, state } => {
                keypad.set(key, state == KeyState::Down);
                let pressed: Vec<_> = keypad.pressed().map(|k| format!("{k:X}")).collect();
                info!("Keys down: [{}]", pressed.join(" "));
            }

            Command::Tick { number } => {
                let timers = computer.timers();
                for _ in 0..number {
                    timers.tick();
                }
                Session::display_timers(computer);
            }

            Command::Screen => {
                print!("{screen}");
            }

            Command::Reset => {
                warn_and_continue!(computer.load(rom));
                *screen = Framebuffer::default();
                session.reset_list();
                info!("Program reloaded");
            }

            Command::Info { sub } => match sub {
                Some(InfoCommand::Breakpoints) => session.display_breakpoints(computer),
                Some(InfoCommand::Stack) => Session::display_stack(computer),
                Some(InfoCommand::Timers) => Session::display_timers(computer),
                Some(InfoCommand::Cycles) => Session::display_cycles(computer),
                None => {
                    session.display_breakpoints(computer);
                    info!("–");
                    Session::display_stack(computer);
                    info!("–");
                    Session::display_timers(computer);
                    info!("–");
                    Session::display_cycles(computer);
                }
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::try_parse_from(shell_words::split(line).unwrap()).unwrap()
    }

    #[test]
    fn parse_commands_test() {
        assert!(matches!(parse("s 3"), Command::Step { number: 3 }));
        assert!(matches!(parse("cont"), Command::Continue { limit: 100_000 }));
        assert!(matches!(
            parse("key a up"),
            Command::Key {
                key: 0xA,
                state: KeyState::Up
            }
        ));
        assert!(matches!(
            parse("registers vf"),
            Command::Registers {
                register: Some(Reg::VF)
            }
        ));
        assert!(matches!(
            parse("set '[i + 1]' 0x20"),
            Command::Set {
                target: parse::AssignmentTarget::Memory(_),
                ..
            }
        ));
    }

    #[test]
    fn assign_test() {
        let mut computer = Computer::default();
        assign(&mut computer, "v3".parse().unwrap(), 0x42).unwrap();
        assert_eq!(computer.registers.get(Reg::V3), 0x42);

        assign(&mut computer, "i".parse().unwrap(), 0x300).unwrap();
        assign(&mut computer, "[i+1]".parse().unwrap(), 0x7F).unwrap();
        assert_eq!(computer.memory.get(0x301).unwrap(), 0x7F);

        assign(&mut computer, "dt".parse().unwrap(), 30).unwrap();
        assert_eq!(computer.timers().delay(), 30);

        assert!(assign(&mut computer, "v0".parse().unwrap(), 0x100).is_err());
        assert!(assign(&mut computer, "[0x1000]".parse().unwrap(), 1).is_err());
    }

    #[test]
    fn list_offset_test() {
        let mut computer = Computer::default();
        computer.registers.pc = 0x200;
        let mut session = Session::default();

        assert_eq!(session.offset_list(&computer, 20), 0x200);
        assert_eq!(session.offset_list(&computer, 20), 0x214);
        session.reset_list();
        assert_eq!(session.offset_list(&computer, 20), 0x200);
    }
}
