//! Logging setup using env_logger

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initialize the logger. `RUST_LOG` picks the filter unless `verbose` is set.
pub fn init(verbose: bool) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.target(Target::Stderr).init();
}
