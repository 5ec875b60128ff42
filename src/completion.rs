//! # Shell Completion Module
//!
//! Generation of completion scripts through clap's completion system.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! tracklens completion bash > ~/.local/share/bash-completion/completions/tracklens
//!
//! # Generate zsh completions
//! tracklens completion zsh > ~/.config/zsh/completions/_tracklens
//! ```

use crate::cli;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::{self, Write};

/// Write completions for `cmd` to `out`.
pub fn write_completions<G: Generator>(gen: G, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(gen, cmd, name, out);
}

/// Generate shell completions for the given shell on stdout
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    write_completions(gen, cmd, &mut io::stdout());
}

/// Convert our Shell enum to clap_complete's Shell enum
#[must_use]
pub fn shell_to_completion_shell(shell: &cli::Shell) -> CompletionShell {
    match shell {
        cli::Shell::Bash => CompletionShell::Bash,
        cli::Shell::Zsh => CompletionShell::Zsh,
        cli::Shell::Fish => CompletionShell::Fish,
        cli::Shell::PowerShell => CompletionShell::PowerShell,
        cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_bash_completion_lists_subcommands() {
        let mut cmd = cli::Args::command();
        let mut buf: Vec<u8> = Vec::new();
        write_completions(shell_to_completion_shell(&cli::Shell::Bash), &mut cmd, &mut buf);

        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("_tracklens"));
        assert!(script.contains("scatter"));
        assert!(script.contains("bars"));
    }

    #[test]
    fn test_every_shell_generates() {
        for shell in [cli::Shell::Bash, cli::Shell::Zsh, cli::Shell::Fish, cli::Shell::PowerShell, cli::Shell::Elvish] {
            let mut cmd = cli::Args::command();
            let mut buf: Vec<u8> = Vec::new();
            write_completions(shell_to_completion_shell(&shell), &mut cmd, &mut buf);
            assert!(!buf.is_empty(), "{shell:?} produced no output");
        }
    }
}
