//! The pipeline driver: owns the five [`PipeReg`]s plus memory/register/cc
//! state, advances one cycle at a time, and keeps a checkpoint stack deep
//! enough to support the interactive shell's `u`/`b` undo commands
//! (spec §4.11).

use crate::isa::{ConditionCode, Stat};
use crate::memory::{Memory, RegisterFile};

use super::hazard;
use super::reg::PipeReg;
use super::registers::{DecodeReg, ExecuteReg, FetchReg, MemoryReg, WritebackReg};
use super::stages::{decode_stage, execute_stage, fetch_stage, memory_stage, writeback_stage};

/// One cycle's worth of undo information: enough to reverse exactly what
/// that cycle did, without keeping a full memory snapshot per cycle.
#[derive(Debug, Clone, Default)]
struct Delta {
    reg_writes: Vec<(u8, u64)>,
    mem_write: Option<(u64, [u8; 8])>,
    prior_cc: Option<ConditionCode>,
    retired: bool,
}

/// A single snapshot of all five pipeline registers, taken right before
/// `update()` is applied, so undo can restore the prior cycle's state.
#[derive(Debug, Clone)]
struct Checkpoint {
    f: FetchReg,
    d: DecodeReg,
    e: ExecuteReg,
    m: MemoryReg,
    w: WritebackReg,
    delta: Delta,
}

/// The pipelined Y86-64 simulator (spec §4).
pub struct Simulator {
    f: PipeReg<FetchReg>,
    d: PipeReg<DecodeReg>,
    e: PipeReg<ExecuteReg>,
    m: PipeReg<MemoryReg>,
    w: PipeReg<WritebackReg>,

    mem: Memory,
    regs: RegisterFile,
    cc: ConditionCode,

    cycle: u64,
    instructions_retired: u64,
    stat: Stat,

    history: Vec<Checkpoint>,
}

impl Simulator {
    pub fn new(mem: Memory) -> Self {
        Self {
            f: PipeReg::new(FetchReg::default()),
            d: PipeReg::new(DecodeReg::default()),
            e: PipeReg::new(ExecuteReg::default()),
            m: PipeReg::new(MemoryReg::default()),
            w: PipeReg::new(WritebackReg::default()),
            mem,
            regs: RegisterFile::new(),
            cc: ConditionCode::initial(),
            cycle: 0,
            instructions_retired: 0,
            stat: Stat::Aok,
            history: Vec::new(),
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn instructions_retired(&self) -> u64 {
        self.instructions_retired
    }

    pub fn stat(&self) -> Stat {
        self.stat
    }

    pub fn is_halted(&self) -> bool {
        self.stat.is_terminal()
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn condition_code(&self) -> ConditionCode {
        self.cc
    }

    pub fn fetch_output(&self) -> &FetchReg {
        self.f.output()
    }

    pub fn decode_output(&self) -> &DecodeReg {
        self.d.output()
    }

    pub fn execute_output(&self) -> &ExecuteReg {
        self.e.output()
    }

    pub fn memory_output(&self) -> &MemoryReg {
        self.m.output()
    }

    pub fn writeback_output(&self) -> &WritebackReg {
        self.w.output()
    }

    /// Advance the pipeline by exactly one cycle (spec §5's stage order:
    /// Writeback, Memory, Execute, Decode, Fetch, hazard control, then the
    /// atomic register update). No-op once halted.
    pub fn step_cycle(&mut self) {
        if self.is_halted() {
            return;
        }

        let mut delta = Delta::default();

        let (prog_stat, retired, reg_writes) = writeback_stage(self.w.output(), &mut self.regs);
        delta.reg_writes = reg_writes;
        delta.retired = retired;
        if retired {
            self.instructions_retired += 1;
        }
        self.stat = prog_stat;

        let (w_next, mem_write) = memory_stage(self.m.output(), &mut self.mem);
        delta.mem_write = mem_write;
        *self.w.input_mut() = w_next;

        let gate_cc = self.m.output().stat.is_terminal() || self.w.output().stat.is_terminal();
        let (m_next, prior_cc) = execute_stage(self.e.output(), &mut self.cc, gate_cc);
        delta.prior_cc = prior_cc;
        *self.m.input_mut() = m_next;

        let e_next = decode_stage(
            self.d.output(),
            self.m.input(),
            self.m.output(),
            self.w.input(),
            self.w.output(),
            &self.regs,
        );
        *self.e.input_mut() = e_next;

        let (f_next, d_next) = fetch_stage(self.f.output().pred_pc, self.m.output(), self.w.output(), &self.mem);
        *self.f.input_mut() = f_next;
        *self.d.input_mut() = d_next;

        let hazards = hazard::detect(self.d.output(), self.e.output(), self.m.input());
        let (f_op, d_op, e_op) = hazard::control_ops(hazards);
        self.f.set_ctrl(f_op);
        self.d.set_ctrl(d_op);
        self.e.set_ctrl(e_op);
        self.m
            .set_ctrl(hazard::memory_ctrl(self.w.output().stat.is_terminal()));

        self.history.push(Checkpoint {
            f: self.f.output().clone(),
            d: self.d.output().clone(),
            e: self.e.output().clone(),
            m: self.m.output().clone(),
            w: self.w.output().clone(),
            delta,
        });

        self.f.update();
        self.d.update();
        self.e.update();
        self.m.update();
        self.w.update();

        self.cycle += 1;
    }

    /// Run until halted or `max_cycles` is exhausted, whichever first.
    pub fn run(&mut self, max_cycles: u64) {
        while !self.is_halted() && self.cycle < max_cycles {
            self.step_cycle();
        }
    }

    /// Run until halted or `max_instructions` have retired, whichever first
    /// (spec §5's instruction-budget stop condition, distinct from a cycle
    /// cap).
    pub fn run_instructions(&mut self, max_instructions: u64) {
        while !self.is_halted() && self.instructions_retired < max_instructions {
            self.step_cycle();
        }
    }

    /// Undo the most recently executed cycle. Returns `false` if there is
    /// nothing to undo.
    pub fn undo_cycle(&mut self) -> bool {
        let Some(ck) = self.history.pop() else {
            return false;
        };

        *self.f.output_mut() = ck.f;
        *self.d.output_mut() = ck.d;
        *self.e.output_mut() = ck.e;
        *self.m.output_mut() = ck.m;
        *self.w.output_mut() = ck.w;

        for (reg, prior) in ck.delta.reg_writes.iter().rev() {
            self.regs.set(*reg, *prior);
        }
        if let Some((addr, bytes)) = ck.delta.mem_write {
            let _ = self.mem.set_u64(addr, u64::from_le_bytes(bytes));
        }
        if let Some(prior_cc) = ck.delta.prior_cc {
            self.cc = prior_cc;
        }
        if ck.delta.retired {
            self.instructions_retired -= 1;
        }

        self.cycle -= 1;
        self.stat = Stat::Aok;
        true
    }

    /// Undo cycles until the most recently retired instruction is undone,
    /// or the history is exhausted.
    pub fn undo_instruction(&mut self) -> bool {
        if self.history.is_empty() {
            return false;
        }
        loop {
            let was_retiring = self
                .history
                .last()
                .map(|ck| ck.delta.retired)
                .unwrap_or(false);
            if !self.undo_cycle() {
                return false;
            }
            if was_retiring {
                return true;
            }
            if self.history.is_empty() {
                return true;
            }
        }
    }
}
