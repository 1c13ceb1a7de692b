use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
pub struct SanityOpt {
    /// Only list the checks, without running them
    #[arg(short, long)]
    list: bool,
}

impl SanityOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let registry = chip8_emulator::sanity::builtin();

        if self.list {
            for name in registry.names() {
                println!("{name}");
            }
            return Ok(());
        }

        info!(count = registry.len(), "Begin sanity test");
        let report = registry.run();
        info!(
            passed = report.passed.len(),
            failed = report.failed.len(),
            "Sanity test complete"
        );

        for (name, error) in &report.failed {
            println!("FAILED {name}: {error}");
        }

        if report.is_success() {
            Ok(())
        } else {
            anyhow::bail!("{} sanity check(s) failed", report.failed.len())
        }
    }
}
