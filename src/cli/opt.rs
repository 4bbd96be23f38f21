use std::path::PathBuf;
use std::process;

use clap::Args;

use tapeopt::Pipeline;

#[derive(Args)]
pub struct OptArgs {
    /// Input source file
    pub input: PathBuf,
    /// Optimization level (0-3), overrides tapeopt.toml
    #[arg(short = 'O', long = "opt-level")]
    pub level: Option<u8>,
    /// Print the IR as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn cmd_opt(args: OptArgs) {
    let (config, program) = super::load_or_exit(&args.input, args.level);
    let optimized = Pipeline::new(config.optimizer).run(program);
    if args.json {
        match serde_json::to_string_pretty(&optimized.program) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("error: {}", err);
                process::exit(1);
            }
        }
    } else {
        print!("{}", optimized.program);
    }
}
