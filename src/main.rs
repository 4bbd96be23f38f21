mod cli;

use clap::{ArgAction, Parser, Subcommand};

use cli::build::{cmd_build, BuildArgs};
use cli::check::{cmd_check, CheckArgs};
use cli::opt::{cmd_opt, OptArgs};
use cli::run::{cmd_run, RunArgs};

#[derive(Parser)]
#[command(
    name = "tapeopt",
    version,
    about = "Optimizing tape-machine to C compiler"
)]
struct Cli {
    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile source files to C
    Build(BuildArgs),
    /// Print the optimized IR
    Opt(OptArgs),
    /// Interpret the optimized program
    Run(RunArgs),
    /// Check brackets without compiling
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Build(args) => cmd_build(args),
        Command::Opt(args) => cmd_opt(args),
        Command::Run(args) => cmd_run(args),
        Command::Check(args) => cmd_check(args),
    }
}
