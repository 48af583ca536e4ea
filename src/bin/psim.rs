//! `psim` — the pipelined Y86-64 simulator CLI.

use anyhow::{Context, Result};
use clap::Parser;

use y86_pipe_sim::isa::Stat;
use y86_pipe_sim::object;
use y86_pipe_sim::pipeline::{shell, Simulator};
use y86_pipe_sim::utils;

/// Run a `.yo` object file through the pipelined simulator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, styles = utils::cli_styles())]
struct Args {
    /// Path to the input .yo file
    input: String,

    /// Instruction budget: stop after this many instructions retire even if
    /// not halted
    #[arg(short = 'l', long, default_value_t = 1_000_000)]
    limit: u64,

    /// Verbosity: 0 = quiet, 1 = info, 2 = debug
    #[arg(short = 'v', long, default_value_t = 0)]
    verbose: u8,

    /// Drop into the interactive shell instead of running to completion
    #[arg(short = 'i', long)]
    interactive: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    utils::logging_setup(log_level, None::<&std::fs::File>);

    let source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("could not read file `{}`", &args.input))?;
    let mem = object::load(&source).with_context(|| format!("could not parse `{}`", &args.input))?;

    let mut sim = Simulator::new(mem);

    if args.interactive {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        shell::run(&mut sim, stdin.lock(), stdout.lock())?;
    } else {
        let before = sim.memory().clone();
        sim.run_instructions(args.limit);
        utils::mem_diff(&before, sim.memory());
        tracing::info!(
            cycles = sim.cycle(),
            instructions = sim.instructions_retired(),
            stat = %sim.stat(),
            "simulation finished"
        );
        if sim.stat() != Stat::Hlt {
            std::process::exit(1);
        }
    }

    Ok(())
}
