//! `otacheck completions` — print a shell completion script to stdout.
//!
//! Usage:
//!   otacheck completions bash > ~/.local/share/bash-completion/completions/otacheck
//!   otacheck completions zsh > ~/.zfunc/_otacheck

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "otacheck", &mut io::stdout());
    Ok(())
}
