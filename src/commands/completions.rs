//! # Completions Command Implementation
//!
//! Generates shell completion scripts with `clap_complete`. The script is
//! written to stdout; redirect it to wherever your shell loads completions
//! from.
//!
//! ```bash
//! confgen completions bash > ~/.local/share/bash-completion/completions/confgen
//! confgen completions zsh > ~/.zfunc/_confgen
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io::{self, Write};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    write_completions(args.shell, &mut io::stdout().lock());
    Ok(())
}

fn write_completions(shell: Shell, out: &mut impl Write) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "confgen", out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut out = Vec::new();
        write_completions(shell, &mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_completions_cover_subcommands() {
        let bash = script(Shell::Bash);
        for subcommand in ["resolve", "validate", "roles", "completions"] {
            assert!(bash.contains(subcommand), "missing {}", subcommand);
        }
    }

    #[test]
    fn test_completions_name_the_binary() {
        assert!(script(Shell::Zsh).contains("#compdef confgen"));
        assert!(script(Shell::PowerShell).contains("confgen"));
    }
}
