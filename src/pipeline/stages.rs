//! The five pipeline stages (spec §4.2-§4.6), each a function from the
//! `output` sides of the registers it reads to a payload for the `input`
//! side of the register it feeds. Stages never touch pipeline-register
//! control ops directly; that is the hazard unit's job (see
//! [`super::hazard`]).

use crate::isa::{arithmetic_compute, inst_code, op_code, reg_code, ConditionCode, Stat};
use crate::memory::{Memory, RegisterFile};

use super::registers::{DecodeReg, ExecuteReg, FetchReg, MemoryReg, WritebackReg};

/// Fetch: choose this cycle's PC, read and decode one instruction.
pub fn fetch_stage(
    f_pred_pc: u64,
    m_output: &MemoryReg,
    w_output: &WritebackReg,
    mem: &Memory,
) -> (FetchReg, DecodeReg) {
    use inst_code::*;

    let pc = if w_output.icode == RET {
        w_output.valm
    } else if m_output.icode == JX && !m_output.cnd {
        m_output.vala
    } else {
        f_pred_pc
    };

    let opcode = mem.get_byte(pc);
    let (icode, ifun, stat, len) = match opcode {
        Err(_) => (NOP, 0, Stat::Adr, 1),
        Ok(byte) => {
            let icode = byte >> 4;
            let ifun = byte & 0xf;
            if !crate::isa::is_valid_icode(icode) {
                (icode, ifun, Stat::Ins, 1)
            } else if icode == HALT {
                (icode, ifun, Stat::Hlt, 1)
            } else {
                (icode, ifun, Stat::Aok, crate::isa::inst_len(icode))
            }
        }
    };

    let need_regids = matches!(
        icode,
        CMOVX | OPQ | PUSHQ | POPQ | IRMOVQ | RMMOVQ | MRMOVQ
    );
    let need_valc = matches!(icode, IRMOVQ | RMMOVQ | MRMOVQ | JX | CALL);

    let (ra, rb, valc, stat) = if stat == Stat::Aok && len > 1 {
        match mem.get_run(pc + 1, len - 1) {
            Err(_) => (reg_code::RNONE, reg_code::RNONE, 0, Stat::Adr),
            Ok(rest) => {
                if need_regids {
                    let ra = rest[0] >> 4;
                    let rb = rest[0] & 0xf;
                    let valc = if need_valc {
                        u64::from_le_bytes(rest[1..9].try_into().unwrap())
                    } else {
                        0
                    };
                    (ra, rb, valc, stat)
                } else {
                    let valc = u64::from_le_bytes(rest[0..8].try_into().unwrap());
                    (reg_code::RNONE, reg_code::RNONE, valc, stat)
                }
            }
        }
    } else {
        (reg_code::RNONE, reg_code::RNONE, 0, stat)
    };

    let valp = pc + len as u64;
    let pred_pc = if matches!(icode, JX | CALL) { valc } else { valp };

    (
        FetchReg { pred_pc },
        DecodeReg {
            stat,
            icode,
            ifun,
            ra,
            rb,
            valc,
            valp,
            stage_pc: pc,
        },
    )
}

/// Per-icode source/destination table (spec §4.3).
pub(crate) fn decode_table(icode: u8, ra: u8, rb: u8) -> (u8, u8, u8, u8) {
    use inst_code::*;
    use reg_code::{RNONE, RSP};

    let srca = match icode {
        CMOVX | RMMOVQ | OPQ | PUSHQ => ra,
        POPQ | RET => RSP,
        _ => RNONE,
    };
    let srcb = match icode {
        OPQ | RMMOVQ | MRMOVQ => rb,
        PUSHQ | POPQ | CALL | RET => RSP,
        _ => RNONE,
    };
    let dste = match icode {
        CMOVX | IRMOVQ | OPQ => rb,
        PUSHQ | POPQ | CALL | RET => RSP,
        _ => RNONE,
    };
    let dstm = match icode {
        MRMOVQ | POPQ => ra,
        _ => RNONE,
    };
    (srca, srcb, dste, dstm)
}

/// The six-source (plus register-file fallback) forwarding multiplexer of
/// spec §4.3. `src == RNONE` never matches a forwarding source. Priority 3
/// (`m_output.dstm` matching) reads `valM` from `w_input`, not `m_output`:
/// Memory only produces `valM` this same cycle, and it doesn't land in a
/// named field until it latches into Writeback's input.
#[allow(clippy::too_many_arguments)]
fn forward(
    src: u8,
    is_vala: bool,
    d_icode: u8,
    d_valp: u64,
    m_input: &MemoryReg,
    m_output: &MemoryReg,
    w_input: &WritebackReg,
    w_output: &WritebackReg,
    regs: &RegisterFile,
) -> u64 {
    if is_vala && matches!(d_icode, inst_code::CALL | inst_code::JX) {
        return d_valp;
    }
    if src != reg_code::RNONE {
        if src == m_input.dste {
            return m_input.vale;
        }
        if src == m_output.dstm {
            return w_input.valm;
        }
        if src == m_output.dste {
            return m_output.vale;
        }
        if src == w_output.dstm {
            return w_output.valm;
        }
        if src == w_output.dste {
            return w_output.vale;
        }
    }
    regs.get(src)
}

/// Decode (and implicit writeback-forwarding read).
#[allow(clippy::too_many_arguments)]
pub fn decode_stage(
    d: &DecodeReg,
    m_input: &MemoryReg,
    m_output: &MemoryReg,
    w_input: &WritebackReg,
    w_output: &WritebackReg,
    regs: &RegisterFile,
) -> ExecuteReg {
    let (srca, srcb, dste, dstm) = decode_table(d.icode, d.ra, d.rb);
    let vala = forward(
        srca, true, d.icode, d.valp, m_input, m_output, w_input, w_output, regs,
    );
    let valb = forward(
        srcb, false, d.icode, d.valp, m_input, m_output, w_input, w_output, regs,
    );

    ExecuteReg {
        stat: d.stat,
        icode: d.icode,
        ifun: d.ifun,
        vala,
        valb,
        valc: d.valc,
        dste,
        dstm,
        srca,
        srcb,
        stage_pc: d.stage_pc,
    }
}

/// Execute: ALU/shift/vector-add, address computation, condition evaluation.
/// Returns the Memory-stage payload plus the condition code's prior value
/// when it was overwritten (used to build an undo delta).
pub fn execute_stage(
    e: &ExecuteReg,
    cc: &mut ConditionCode,
    gate_cc: bool,
) -> (MemoryReg, Option<ConditionCode>) {
    use inst_code::*;

    let alua = match e.icode {
        CMOVX | OPQ => e.vala,
        IRMOVQ | RMMOVQ | MRMOVQ => e.valc,
        CALL | PUSHQ => crate::isa::NEG_8,
        RET | POPQ => 8,
        _ => 0,
    };
    let alub = match e.icode {
        RMMOVQ | MRMOVQ | OPQ | CALL | PUSHQ | RET | POPQ => e.valb,
        _ => 0,
    };
    let alufun = if e.icode == OPQ { e.ifun } else { op_code::ADD };
    let vale = arithmetic_compute(alua, alub, alufun).unwrap_or(0);

    let set_cc = e.icode == OPQ && !gate_cc;
    let prior_cc = if set_cc {
        let prior = *cc;
        cc.set(alua, alub, vale, alufun);
        Some(prior)
    } else {
        None
    };

    let cnd = cc.test(e.ifun);
    let dste = if e.icode == CMOVX && !cnd {
        reg_code::RNONE
    } else {
        e.dste
    };

    (
        MemoryReg {
            stat: e.stat,
            icode: e.icode,
            cnd,
            vale,
            vala: e.vala,
            dste,
            dstm: e.dstm,
            stage_pc: e.stage_pc,
        },
        prior_cc,
    )
}

/// Memory: at most one 8-byte access. Returns the Writeback payload plus an
/// undo record `(addr, prior_bytes)` when a store actually happened.
pub fn memory_stage(m: &MemoryReg, mem: &mut Memory) -> (WritebackReg, Option<(u64, [u8; 8])>) {
    use inst_code::*;

    let read = matches!(m.icode, MRMOVQ | POPQ | RET);
    let write = matches!(m.icode, RMMOVQ | PUSHQ | CALL);
    let addr = match m.icode {
        RMMOVQ | PUSHQ | CALL | MRMOVQ => m.vale,
        POPQ | RET => m.vala,
        _ => 0,
    };

    let mut valm = 0u64;
    let mut stat = m.stat;
    let mut undo = None;

    if m.stat == Stat::Aok {
        if write {
            match mem.get_u64(addr) {
                Ok(prior) => {
                    let _ = mem.set_u64(addr, m.vala);
                    undo = Some((addr, prior.to_le_bytes()));
                }
                Err(_) => stat = Stat::Adr,
            }
        } else if read {
            match mem.get_u64(addr) {
                Ok(v) => valm = v,
                Err(_) => stat = Stat::Adr,
            }
        }
    }

    (
        WritebackReg {
            stat,
            icode: m.icode,
            vale: m.vale,
            valm,
            dste: m.dste,
            dstm: m.dstm,
            stage_pc: m.stage_pc,
        },
        undo,
    )
}

/// Writeback: commit architectural register writes for an `AOK` instruction.
/// Returns the program status this cycle (BUB mapped to AOK), whether an
/// instruction retired, and an undo record of every register write
/// performed. The values it exports to the forwarding network are read
/// directly off `w` by [`decode_stage`]; no separate export step is needed.
pub fn writeback_stage(w: &WritebackReg, regs: &mut RegisterFile) -> (Stat, bool, Vec<(u8, u64)>) {
    let mut writes = Vec::new();

    if w.stat == Stat::Aok {
        if w.dste != reg_code::RNONE {
            writes.push((w.dste, regs.set(w.dste, w.vale)));
        }
        if w.dstm != reg_code::RNONE {
            writes.push((w.dstm, regs.set(w.dstm, w.valm)));
        }
    }

    // A bubble never reaches Writeback as a real instruction, but HALT and
    // every error status still retire the instruction that carried them.
    let retired = w.stat != Stat::Bub;
    let prog_stat = if w.stat == Stat::Bub { Stat::Aok } else { w.stat };

    (prog_stat, retired, writes)
}
