use std::path::PathBuf;
use std::process;

use clap::Args;

use tapeopt::diagnostic::render_diagnostics;

#[derive(Args)]
pub struct CheckArgs {
    /// Input source file
    pub input: PathBuf,
}

pub fn cmd_check(args: CheckArgs) {
    let source = match tapeopt::read_source(&args.input) {
        Ok(source) => source,
        Err(err) => {
            super::report(&err);
            process::exit(1);
        }
    };
    let filename = args.input.to_string_lossy();
    match tapeopt::syntax::parse_with_warnings(&source) {
        Ok((program, warnings)) => {
            render_diagnostics(&warnings, &filename, &source);
            eprintln!(
                "OK: {} ({} statements, {} loops)",
                args.input.display(),
                program.stmt_count(),
                program.loop_count()
            );
        }
        Err(errors) => {
            render_diagnostics(&errors, &filename, &source);
            process::exit(1);
        }
    }
}
