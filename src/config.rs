use clap::Parser;

/// Command-line configuration for the interpreter.
#[derive(Parser, Debug)]
#[command(name = "forksh", version, about = "A small fork/exec command interpreter")]
pub struct Config {
    /// Prompt shown before each line when stdin is a terminal
    #[arg(long, env = "FORKSH_PROMPT", default_value = "$ ")]
    pub prompt: String,

    /// Run a single command line and exit
    #[arg(short = 'c', long = "command")]
    pub command: Option<String>,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,
}
