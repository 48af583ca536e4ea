//! A line-oriented interactive shell over [`Simulator`] (spec §4.11, §6):
//! single-letter commands read from any `BufRead`, rendered to any `Write`.
//! The shell owns no architectural state of its own.

use std::io::{BufRead, Write};

use crate::isa::{inst_code, reg_code};
use crate::utils::{format_reg_val, mem_diff};

use super::registers::{DecodeReg, ExecuteReg, FetchReg, MemoryReg, WritebackReg};
use super::Simulator;

/// Run the shell, reading commands from `input` and writing all output to
/// `out`, until `q` or end-of-input.
pub fn run(sim: &mut Simulator, mut input: impl BufRead, mut out: impl Write) -> std::io::Result<()> {
    writeln!(out, "y86 pipeline shell. Type `h` for help.")?;
    let initial_mem = sim.memory().clone();
    let mut line = String::new();
    loop {
        write!(out, "(y86) ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !dispatch(sim, line, &initial_mem, &mut out)? {
            break;
        }
    }
    Ok(())
}

/// Execute a single command line. Returns `false` on `q`.
fn dispatch(
    sim: &mut Simulator,
    line: &str,
    initial_mem: &crate::memory::Memory,
    out: &mut impl Write,
) -> std::io::Result<bool> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or("");
    let arg: u64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1);

    match cmd {
        "g" => {
            let before = sim.memory().clone();
            sim.run(u64::MAX);
            mem_diff(&before, sim.memory());
            writeln!(out, "program terminated: {}", sim.stat())?;
        }
        "n" => {
            for _ in 0..arg {
                if sim.is_halted() {
                    break;
                }
                step_one_instruction(sim);
            }
            writeln!(out, "cycle {}, {}", sim.cycle(), sim.stat())?;
        }
        "c" => {
            for _ in 0..arg {
                if sim.is_halted() {
                    break;
                }
                sim.step_cycle();
            }
            writeln!(out, "cycle {}, {}", sim.cycle(), sim.stat())?;
        }
        "u" => {
            for _ in 0..arg {
                if !sim.undo_instruction() {
                    break;
                }
            }
            writeln!(out, "cycle {}, {}", sim.cycle(), sim.stat())?;
        }
        "b" => {
            for _ in 0..arg {
                if !sim.undo_cycle() {
                    break;
                }
            }
            writeln!(out, "cycle {}, {}", sim.cycle(), sim.stat())?;
        }
        "r" => print_registers(sim, out)?,
        "a" => print_architectural_state(sim, out)?,
        "p" => {
            let which = parts.next().unwrap_or("");
            print_stage(sim, which, out)?;
        }
        "m" => mem_diff(initial_mem, sim.memory()),
        "h" => print_help(out)?,
        "q" => return Ok(false),
        other => writeln!(out, "unknown command {other:?}; type `h` for help")?,
    }
    Ok(true)
}

fn step_one_instruction(sim: &mut Simulator) {
    let start = sim.instructions_retired();
    while !sim.is_halted() && sim.instructions_retired() == start {
        sim.step_cycle();
    }
}

fn print_registers(sim: &Simulator, out: &mut impl Write) -> std::io::Result<()> {
    for (reg, val) in sim.registers().iter() {
        writeln!(
            out,
            "%{:<4} {}",
            reg_code::name_of(reg).to_lowercase(),
            format_reg_val(val)
        )?;
    }
    writeln!(out, "{}", sim.condition_code())
}

fn print_architectural_state(sim: &Simulator, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "cycle {} stat {}", sim.cycle(), sim.stat())?;
    print_registers(sim, out)
}

fn print_stage(sim: &Simulator, which: &str, out: &mut impl Write) -> std::io::Result<()> {
    match which {
        "f" => writeln!(out, "{:?}", FetchRegView(sim.fetch_output()))?,
        "d" => writeln!(out, "{:?}", DecodeRegView(sim.decode_output()))?,
        "e" => writeln!(out, "{:?}", ExecuteRegView(sim.execute_output()))?,
        "m" => writeln!(out, "{:?}", MemoryRegView(sim.memory_output()))?,
        "w" => writeln!(out, "{:?}", WritebackRegView(sim.writeback_output()))?,
        other => writeln!(out, "unknown stage {other:?}; expected one of f/d/e/m/w")?,
    }
    Ok(())
}

fn print_help(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(
        out,
        "g          run to completion\n\
         n [N]      step N instructions (default 1)\n\
         c [N]      step N cycles (default 1)\n\
         u [N]      undo N instructions (default 1)\n\
         b [N]      undo N cycles (default 1)\n\
         r          print registers and condition codes\n\
         a          print architectural state\n\
         p {{f,d,e,m,w}}  print a pipeline stage\n\
         m          print memory diffs since the program was loaded\n\
         h          this help\n\
         q          quit"
    )
}

struct FetchRegView<'a>(&'a FetchReg);
struct DecodeRegView<'a>(&'a DecodeReg);
struct ExecuteRegView<'a>(&'a ExecuteReg);
struct MemoryRegView<'a>(&'a MemoryReg);
struct WritebackRegView<'a>(&'a WritebackReg);

impl std::fmt::Debug for FetchRegView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F: predPC {:#x}", self.0.pred_pc)
    }
}

impl std::fmt::Debug for DecodeRegView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "D: {} icode={} ra={} rb={}",
            self.0.stat,
            inst_code::name_of(self.0.icode),
            reg_code::name_of(self.0.ra),
            reg_code::name_of(self.0.rb)
        )
    }
}

impl std::fmt::Debug for ExecuteRegView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "E: {} icode={} valA={:#x} valB={:#x}",
            self.0.stat,
            inst_code::name_of(self.0.icode),
            self.0.vala,
            self.0.valb
        )
    }
}

impl std::fmt::Debug for MemoryRegView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "M: {} icode={} cnd={} valE={:#x}",
            self.0.stat,
            inst_code::name_of(self.0.icode),
            self.0.cnd,
            self.0.vale
        )
    }
}

impl std::fmt::Debug for WritebackRegView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "W: {} icode={} valE={:#x} valM={:#x}",
            self.0.stat,
            inst_code::name_of(self.0.icode),
            self.0.vale,
            self.0.valm
        )
    }
}
