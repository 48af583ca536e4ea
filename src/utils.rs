//! Terminal styling and logging setup, folded in from the separate
//! `binutils` helper crate this project was split off from.

use ansi_term::Colour::{Green, Red, White, Yellow};
use ansi_term::Style;

use crate::memory::Memory;

/// Cargo-like `clap` color scheme.
pub fn cli_styles() -> clap::builder::Styles {
    use clap::builder::styling::{AnsiColor, Color, Style as ClapStyle};
    clap::builder::Styles::styled()
        .usage(ClapStyle::new().bold().fg_color(Some(Color::Ansi(AnsiColor::BrightGreen))))
        .header(ClapStyle::new().bold().fg_color(Some(Color::Ansi(AnsiColor::BrightGreen))))
        .literal(ClapStyle::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .invalid(ClapStyle::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
        .error(ClapStyle::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
        .valid(ClapStyle::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .placeholder(ClapStyle::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}

/// Wire up `tracing` to print compact logs to the terminal, filtered by
/// `max_level`, and optionally mirror JSON records to `log_file`.
pub fn logging_setup(
    max_level: tracing::Level,
    log_file: Option<impl std::io::Write + Clone + Send + 'static>,
) {
    use tracing_subscriber::{filter, prelude::*};

    let filter = filter::filter_fn(move |meta| meta.level() <= &max_level);

    let terminal_log = tracing_subscriber::fmt::layer()
        .compact()
        .with_file(false)
        .with_target(false)
        .without_time()
        .with_thread_names(false)
        .with_filter(filter.clone());

    let file_log = log_file.map(|file| {
        let file = std::sync::Mutex::new(file);
        tracing_subscriber::fmt::layer()
            .json()
            .with_thread_names(true)
            .with_writer(move || file.lock().unwrap().clone())
            .with_filter(filter)
    });

    tracing_subscriber::registry()
        .with(file_log)
        .with(terminal_log)
        .init();
}

/// Print every 8-byte word that differs between two memory images, in the
/// `old -> new` diff style the shell and `psim --run` use.
pub fn mem_diff(before: &Memory, after: &Memory) {
    let (lo, hi) = (before.as_slice(), after.as_slice());
    for offset in (0..lo.len()).step_by(8) {
        let l = &lo[offset..offset + 8];
        let r = &hi[offset..offset + 8];
        if l == r {
            continue;
        }
        print!("{:#06x}: ", offset);
        for i in 0..8 {
            let styled = if l[i] != r[i] { Red.bold() } else { White.dimmed() };
            print!("{}", styled.paint(format!("{:02x}", l[i])));
        }
        print!(" -> ");
        for i in 0..8 {
            let styled = if l[i] != r[i] { Green.bold() } else { White.dimmed() };
            print!("{}", styled.paint(format!("{:02x}", r[i])));
        }
        println!();
    }
}

/// Format a register value, dimming an all-zero word so non-zero ones
/// stand out when scanning a register dump.
pub fn format_reg_val(val: u64) -> String {
    if val == 0 {
        White.dimmed().paint(format!("{:016x}", 0)).to_string()
    } else {
        Style::new().bold().paint(format!("{val:016x}")).to_string()
    }
}

/// Format a pipeline-register control op for the shell's per-cycle trace.
pub fn format_ctrl(bubble: bool, stall: bool) -> String {
    if bubble {
        Red.bold().paint("Bubble").to_string()
    } else if stall {
        Yellow.bold().paint("Stall ").to_string()
    } else {
        Green.paint("Normal").to_string()
    }
}
