pub mod dispatch;
pub mod error;
pub mod jobs;
pub mod signals;
pub mod state;

use std::io::{self, BufRead, IsTerminal, Write};

use self::error::Error;
use self::state::ShellState;
use crate::config::Config;

pub struct Shell {
    state: ShellState,
    config: Config,
}

/// Splits a raw line into tokens. No quoting or expansion.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

impl Shell {
    pub fn new(config: Config) -> Self {
        Shell {
            state: ShellState::new(),
            config,
        }
    }

    /// Runs `-c` if given, otherwise reads commands from stdin until EOF.
    /// Returns the interpreter's exit code.
    pub fn run(&mut self) -> i32 {
        if let Err(e) = self.state.prepare() {
            eprintln!("forksh: {}", e);
            return 1;
        }
        let result = match self.config.command.take() {
            Some(line) => self.run_line(&line),
            None => self.run_interactive(),
        };
        self.state.finalize();
        match result {
            Ok(()) => 0,
            Err(e) => {
                error!("fatal: {}", e);
                eprintln!("forksh: {}", e);
                1
            }
        }
    }

    fn run_interactive(&mut self) -> Result<(), Error> {
        let stdin = io::stdin();
        let show_prompt = stdin.is_terminal();
        let mut input = stdin.lock();
        let mut line = String::new();
        loop {
            if show_prompt {
                print!("{}", self.config.prompt);
                let _ = io::stdout().flush();
            }
            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => return Ok(()),
                Ok(_) => self.run_line(&line)?,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("input error: {}", e);
                    return Ok(());
                }
            }
        }
    }

    pub fn run_line(&mut self, line: &str) -> Result<(), Error> {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            self.state.reap_background();
            return Ok(());
        }
        self.state.process_arglist(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn shell() -> Shell {
        Shell::new(Config {
            prompt: String::from("$ "),
            command: None,
            verbose: false,
        })
    }

    #[test]
    fn tokenize_splits_on_any_whitespace() {
        assert_eq!(tokenize("  ls\t-l  |  wc\n"), vec!["ls", "-l", "|", "wc"]);
        assert!(tokenize(" \n").is_empty());
    }

    #[test]
    fn run_line_handles_a_full_command() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut sh = shell();
        sh.run_line(&format!("echo x | cat > {}\n", out.display())).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "x\n");
        sh.run_line("   \n").unwrap();
        sh.run_line("| oops\n").unwrap();
    }

    #[test]
    fn single_command_mode_exits_cleanly() {
        let mut sh = Shell::new(Config {
            prompt: String::from("$ "),
            command: Some(String::from("true")),
            verbose: false,
        });
        assert_eq!(sh.run(), 0);
    }
}
