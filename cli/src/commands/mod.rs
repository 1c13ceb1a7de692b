mod completion;
mod disassemble;
mod run;
mod sanity;

#[derive(clap::Subcommand)]
pub enum Command {
    /// Load and run a program image
    Run(self::run::RunOpt),

    /// Print the instructions of a program image
    Disassemble(self::disassemble::DisassembleOpt),

    /// Run the machine self-checks
    Sanity(self::sanity::SanityOpt),

    /// Generate shell completions
    Completion(self::completion::CompletionOpt),
}

impl Command {
    /// Run a subcommand
    pub fn exec(self) -> anyhow::Result<()> {
        match self {
            Command::Run(opt) => opt.exec(),
            Command::Disassemble(opt) => opt.exec(),
            Command::Sanity(opt) => opt.exec(),
            Command::Completion(opt) => {
                opt.exec();
                Ok(())
            }
        }
    }
}
