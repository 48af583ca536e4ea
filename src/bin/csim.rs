//! `csim` — the set-associative writeback cache simulator CLI.

use anyhow::{Context, Result};
use clap::Parser;

use y86_pipe_sim::cache::{trace, Cache, Geometry};
use y86_pipe_sim::utils;

/// Replay a memory-access trace through a configurable cache.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, styles = utils::cli_styles())]
struct Args {
    /// Number of set-index bits (2^s sets)
    #[arg(short = 's')]
    s: u32,

    /// Associativity: lines per set
    #[arg(short = 'E')]
    e: usize,

    /// Number of block-offset bits (2^b bytes per line)
    #[arg(short = 'b')]
    b: u32,

    /// Path to the memory trace to replay
    #[arg(short = 't', long = "trace")]
    trace: String,

    /// Print a trace line for every access
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    utils::logging_setup(log_level, None::<&std::fs::File>);

    let source = std::fs::read_to_string(&args.trace)
        .with_context(|| format!("could not read file `{}`", &args.trace))?;
    let accesses = trace::parse(&source).with_context(|| format!("could not parse `{}`", &args.trace))?;

    let mut cache = Cache::new(Geometry {
        s: args.s,
        b: args.b,
        e: args.e,
    });

    for access in accesses {
        let addr = access.addr();
        for op in access.operations() {
            let result = cache.access(addr, op);
            tracing::debug!(
                addr = format!("{addr:#x}"),
                hit = result.hit,
                op = ?op,
                "access"
            );
        }
    }

    let stats = cache.stats();
    println!(
        "hits:{} misses:{} evictions:{} dirty_bytes_in_cache:{} dirty_bytes_evicted:{}",
        stats.hits,
        stats.misses,
        stats.dirty_evictions + stats.clean_evictions,
        cache.dirty_bytes_in_cache(),
        stats.dirty_bytes_evicted,
    );

    Ok(())
}
