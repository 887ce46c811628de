//! Completions command.

use clap::CommandFactory;
use clap_complete::{generate, Shell as Target};

use crate::cli::{Cli, Shell};
use crate::error::Result;

/// Write a completion script for `shell` to stdout.
pub fn execute(shell: Shell) -> Result<()> {
    let target = match shell {
        Shell::Bash => Target::Bash,
        Shell::Zsh => Target::Zsh,
        Shell::Fish => Target::Fish,
        Shell::PowerShell => Target::PowerShell,
    };
    generate(target, &mut Cli::command(), "cellar", &mut std::io::stdout());
    Ok(())
}
