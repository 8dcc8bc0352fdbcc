extern crate libc;
#[macro_use]
extern crate log;

mod config;
mod logging;
mod shell;

use clap::Parser;
use std::process;

fn main() {
    let config = config::Config::parse();
    logging::init(config.verbose);
    let mut s = shell::Shell::new(config);
    process::exit(s.run());
}
