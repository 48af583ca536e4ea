//! The hazard-control unit (spec §4.7): inspects the registers' `output`
//! (and, for the Execute stage, the about-to-be-latched `input`) sides and
//! decides the [`CtrlOp`] for F, D and E. M and W are never stalled or
//! bubbled; they always load.

use crate::isa::inst_code;

use super::reg::CtrlOp;
use super::registers::{DecodeReg, ExecuteReg, MemoryReg};
use super::stages::decode_table;

/// The three conditions the control matrix is keyed on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hazards {
    pub load_use: bool,
    pub mispredict: bool,
    pub ret_in_flight: bool,
}

/// `true` when the instruction in Execute is a load (`mrmovq`/`popq`) whose
/// destination is read by the instruction now in Decode.
fn load_use_hazard(d: &DecodeReg, e: &ExecuteReg) -> bool {
    let is_load = matches!(e.icode, inst_code::MRMOVQ | inst_code::POPQ);
    if !is_load || e.dstm == crate::isa::reg_code::RNONE {
        return false;
    }
    let (srca, srcb, ..) = decode_table(d.icode, d.ra, d.rb);
    srca == e.dstm || srcb == e.dstm
}

/// Detect the three hazard conditions for the cycle about to be retired.
/// `e_cnd` is the condition bit the Execute stage computed this cycle for
/// the instruction that will latch into M (Memory's `input`), since
/// mispredict is only knowable once Execute has run.
pub fn detect(d: &DecodeReg, e: &ExecuteReg, m_input: &MemoryReg) -> Hazards {
    let ret_in_flight =
        d.icode == inst_code::RET || e.icode == inst_code::RET || m_input.icode == inst_code::RET;
    Hazards {
        load_use: load_use_hazard(d, e),
        mispredict: e.icode == inst_code::JX && !m_input.cnd,
        ret_in_flight,
    }
}

/// Control ops for F, D and E given this cycle's hazards (spec §4.7's
/// matrix, collapsed to booleans rather than enumerated named cases).
pub fn control_ops(h: Hazards) -> (CtrlOp, CtrlOp, CtrlOp) {
    let f = if h.load_use || h.ret_in_flight {
        CtrlOp::Stall
    } else {
        CtrlOp::Load
    };

    let d = if h.load_use {
        CtrlOp::Stall
    } else if h.mispredict || h.ret_in_flight {
        CtrlOp::Bubble
    } else {
        CtrlOp::Load
    };

    let e = if h.load_use || h.mispredict {
        CtrlOp::Bubble
    } else {
        CtrlOp::Load
    };

    (f, d, e)
}

/// Memory's control op is independent of the hazard matrix above: it
/// bubbles ("mB") whenever Writeback's current output already carries a
/// terminal status, so a retired exception can't let a later instruction
/// also retire through Memory (spec §4.7's precise-exception note).
pub fn memory_ctrl(writeback_stat_is_terminal: bool) -> CtrlOp {
    if writeback_stat_is_terminal {
        CtrlOp::Bubble
    } else {
        CtrlOp::Load
    }
}

/// `true` when the hazard-control unit's own matrix is self-contradictory
/// (STALL and BUBBLE requested on the same register in the same cycle).
/// The canonical matrix above never produces this, but [`CtrlOp::Error`]
/// is reserved for a future, richer hazard table and for defensive checks
/// against it in tests.
pub fn is_consistent(op: CtrlOp) -> bool {
    !matches!(op, CtrlOp::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::{reg_code, Stat};

    fn decode_of(icode: u8, ra: u8, rb: u8) -> DecodeReg {
        DecodeReg {
            stat: Stat::Aok,
            icode,
            ra,
            rb,
            ..Default::default()
        }
    }

    fn execute_of(icode: u8, dstm: u8) -> ExecuteReg {
        ExecuteReg {
            stat: Stat::Aok,
            icode,
            dstm,
            ..Default::default()
        }
    }

    #[test]
    fn load_use_stalls_fetch_and_decode() {
        let d = decode_of(inst_code::OPQ, reg_code::RAX, reg_code::RBX);
        let e = execute_of(inst_code::MRMOVQ, reg_code::RAX);
        let m = MemoryReg::default();
        let h = detect(&d, &e, &m);
        assert!(h.load_use);
        let (f, dd, ee) = control_ops(h);
        assert_eq!(f, CtrlOp::Stall);
        assert_eq!(dd, CtrlOp::Stall);
        assert_eq!(ee, CtrlOp::Bubble);
    }

    #[test]
    fn mispredict_bubbles_decode_and_execute() {
        let d = DecodeReg::default();
        let e = execute_of(inst_code::JX, reg_code::RNONE);
        let mut m = MemoryReg::default();
        m.cnd = false;
        let h = detect(&d, &e, &m);
        assert!(h.mispredict);
        let (f, dd, ee) = control_ops(h);
        assert_eq!(f, CtrlOp::Load);
        assert_eq!(dd, CtrlOp::Bubble);
        assert_eq!(ee, CtrlOp::Bubble);
    }

    #[test]
    fn ret_drains_with_bubbles() {
        let d = decode_of(inst_code::RET, reg_code::RNONE, reg_code::RNONE);
        let e = ExecuteReg::default();
        let m = MemoryReg::default();
        let h = detect(&d, &e, &m);
        assert!(h.ret_in_flight);
        let (f, dd, _ee) = control_ops(h);
        assert_eq!(f, CtrlOp::Stall);
        assert_eq!(dd, CtrlOp::Bubble);
    }
}
