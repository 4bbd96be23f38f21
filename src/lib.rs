//! tapeopt: an optimizing compiler from tape-machine programs to C.
//!
//! Source text is parsed by [`syntax`] into the statement tree of [`ir`],
//! optimized by the [`pipeline`] (local rewrites from [`opt`] plus the global
//! facts of [`analysis`]), lowered to offset form by [`lower`] and printed by
//! [`emit`]. [`interp`] executes any revision for testing.

pub mod analysis;
pub mod config;
pub mod diagnostic;
pub mod emit;
pub mod error;
pub mod field;
pub mod interp;
pub mod ir;
pub mod lower;
pub mod opt;
pub mod pipeline;
pub mod span;
pub mod syntax;

pub use config::{ConfigFile, EmitConfig, OptConfig};
pub use error::{Error, Result};
pub use ir::{Program, Stmt};
pub use pipeline::{Optimized, PassStats, Pipeline};

use std::path::Path;

use diagnostic::Diagnostic;

/// Parse and optimize source text.
pub fn optimize_source(source: &str, config: &OptConfig) -> std::result::Result<Optimized, Vec<Diagnostic>> {
    let program = syntax::parse(source)?;
    Ok(Pipeline::new(config.clone()).run(program))
}

/// Parse, optimize, lower and emit C.
pub fn compile_to_c(source: &str, config: &ConfigFile) -> std::result::Result<String, Vec<Diagnostic>> {
    let optimized = optimize_source(source, &config.optimizer)?;
    let ops = lower::lower(&optimized.program);
    Ok(emit::c::emit(&ops, &emit::EmitOptions::from(&config.emit)))
}

/// Read a source file.
pub fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a source file, keeping the text for diagnostics.
pub fn load_program(path: &Path) -> Result<(String, Program)> {
    let source = read_source(path)?;
    match syntax::parse(&source) {
        Ok(program) => Ok((source, program)),
        Err(diagnostics) => Err(Error::Syntax {
            path: path.to_path_buf(),
            diagnostics,
        }),
    }
}
