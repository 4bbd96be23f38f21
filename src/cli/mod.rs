pub mod build;
pub mod check;
pub mod opt;
pub mod run;

use std::path::Path;
use std::process;

use tracing::Level;

use tapeopt::diagnostic::render_diagnostics;
use tapeopt::{ConfigFile, Error, Program};

/// Install the stderr log subscriber.
pub fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the nearest `tapeopt.toml` above `input`, applying a level override.
pub fn load_config(input: &Path, level: Option<u8>) -> Result<ConfigFile, Error> {
    let dir = input.parent().unwrap_or(Path::new("."));
    let mut config = ConfigFile::discover(dir)?;
    if let Some(level) = level {
        config.optimizer.level = level;
    }
    Ok(config)
}

/// Print an error, rendering syntax diagnostics against their source.
pub fn report(err: &Error) {
    match err {
        Error::Syntax { path, diagnostics } => match std::fs::read_to_string(path) {
            Ok(source) => render_diagnostics(diagnostics, &path.to_string_lossy(), &source),
            Err(_) => eprintln!("error: {}", err),
        },
        other => eprintln!("error: {}", other),
    }
}

/// Load config and program or exit with the error rendered.
pub fn load_or_exit(input: &Path, level: Option<u8>) -> (ConfigFile, Program) {
    let loaded = load_config(input, level)
        .and_then(|config| tapeopt::load_program(input).map(|(_, program)| (config, program)));
    match loaded {
        Ok(loaded) => loaded,
        Err(err) => {
            report(&err);
            process::exit(1);
        }
    }
}
