use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, ValueEnum};
use rayon::prelude::*;
use tracing::info;

use tapeopt::emit::{self, EmitOptions};
use tapeopt::{lower, Error, PassStats, Pipeline};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EmitKind {
    /// C source
    C,
    /// Optimized IR listing
    Ir,
    /// Optimized IR as JSON
    Json,
}

impl EmitKind {
    fn extension(self) -> &'static str {
        match self {
            EmitKind::C => "c",
            EmitKind::Ir => "ir",
            EmitKind::Json => "json",
        }
    }
}

#[derive(Args)]
pub struct BuildArgs {
    /// Input source files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Output file (default: <input>.c); only with a single input
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Optimization level (0-3), overrides tapeopt.toml
    #[arg(short = 'O', long = "opt-level")]
    pub level: Option<u8>,
    /// What to write
    #[arg(long, value_enum, default_value = "c")]
    pub emit: EmitKind,
    /// Tape length of the generated C, overrides tapeopt.toml
    #[arg(long)]
    pub tape_size: Option<usize>,
    /// Print optimizer statistics as JSON
    #[arg(long)]
    pub stats: bool,
}

struct Built {
    input: PathBuf,
    output: PathBuf,
    stats: PassStats,
}

pub fn cmd_build(args: BuildArgs) {
    if args.output.is_some() && args.inputs.len() > 1 {
        eprintln!("error: --output needs exactly one input");
        process::exit(1);
    }

    let results: Vec<Result<Built, Error>> = args
        .inputs
        .par_iter()
        .map(|input| build_one(input, &args))
        .collect();

    let mut failed = false;
    let mut stats = Vec::new();
    for result in results {
        match result {
            Ok(built) => {
                info!(input = %built.input.display(), output = %built.output.display(), "built");
                eprintln!("Compiled -> {}", built.output.display());
                stats.push(serde_json::json!({
                    "input": built.input,
                    "output": built.output,
                    "stats": built.stats,
                }));
            }
            Err(err) => {
                super::report(&err);
                failed = true;
            }
        }
    }

    if args.stats {
        match serde_json::to_string_pretty(&stats) {
            Ok(json) => println!("{}", json),
            Err(err) => eprintln!("error: {}", err),
        }
    }
    if failed {
        process::exit(1);
    }
}

fn build_one(input: &Path, args: &BuildArgs) -> Result<Built, Error> {
    let mut config = super::load_config(input, args.level)?;
    if let Some(tape_size) = args.tape_size {
        config.emit.tape_size = tape_size;
    }
    let (_, program) = tapeopt::load_program(input)?;
    let optimized = Pipeline::new(config.optimizer).run(program);

    let text = match args.emit {
        EmitKind::C => {
            let ops = lower::lower(&optimized.program);
            emit::c::emit(&ops, &EmitOptions::from(&config.emit))
        }
        EmitKind::Ir => optimized.program.to_string(),
        EmitKind::Json => serde_json::to_string_pretty(&optimized.program)
            .map_err(|err| Error::Io {
                path: input.to_path_buf(),
                source: err.into(),
            })?,
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| input.with_extension(args.emit.extension()));
    std::fs::write(&output, text).map_err(|source| Error::Io {
        path: output.clone(),
        source,
    })?;

    Ok(Built {
        input: input.to_path_buf(),
        output,
        stats: optimized.stats,
    })
}
