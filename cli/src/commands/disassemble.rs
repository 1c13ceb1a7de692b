use camino::Utf8PathBuf;
use chip8_emulator::constants::PROGRAM_START;
use chip8_emulator::{disassemble, Rom};
use clap::{Parser, ValueHint};
use tracing::info;

#[derive(Parser, Debug)]
pub struct DisassembleOpt {
    /// Program image
    #[arg(value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,
}

impl DisassembleOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        info!(path = %self.input, "Reading program");
        let rom = Rom::read(&self.input)?;

        for line in disassemble(rom.bytes(), PROGRAM_START) {
            println!("{line}");
        }

        Ok(())
    }
}
