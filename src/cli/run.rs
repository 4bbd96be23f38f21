use std::io::{Read, Write};
use std::path::PathBuf;
use std::process;

use clap::Args;

use tapeopt::interp::{self, Outcome};
use tapeopt::Pipeline;

#[derive(Args)]
pub struct RunArgs {
    /// Input source file
    pub input: PathBuf,
    /// Read program input from a file instead of stdin
    #[arg(long, value_name = "PATH")]
    pub input_file: Option<PathBuf>,
    /// Optimization level (0-3), overrides tapeopt.toml
    #[arg(short = 'O', long = "opt-level")]
    pub level: Option<u8>,
    /// Statement budget
    #[arg(long, default_value_t = u64::MAX)]
    pub fuel: u64,
}

pub fn cmd_run(args: RunArgs) {
    let (config, program) = super::load_or_exit(&args.input, args.level);
    let optimized = Pipeline::new(config.optimizer).run(program);

    let mut input = Vec::new();
    let read = match &args.input_file {
        Some(path) => std::fs::File::open(path).and_then(|mut f| f.read_to_end(&mut input)),
        None => std::io::stdin().read_to_end(&mut input),
    };
    if let Err(err) = read {
        eprintln!("error: cannot read program input: {}", err);
        process::exit(1);
    }

    let outcome = interp::run(&optimized.program, &input, args.fuel);
    let mut stdout = std::io::stdout().lock();
    if let Err(err) = stdout.write_all(&outcome.trace().output).and_then(|_| stdout.flush()) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
    if let Outcome::OutOfFuel(_) = outcome {
        eprintln!("error: out of fuel after {} statements", args.fuel);
        process::exit(2);
    }
}
