//! The five pipeline register payload types (spec §3). Each is wrapped in a
//! [`crate::pipeline::reg::PipeReg`]; the `Default` impl is that register's
//! bubble value (a NOP with `Stat::Bub`).

use crate::isa::{inst_code, reg_code, Stat};

#[derive(Debug, Clone, PartialEq)]
pub struct FetchReg {
    pub pred_pc: u64,
}

impl Default for FetchReg {
    fn default() -> Self {
        Self { pred_pc: 0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeReg {
    pub stat: Stat,
    pub icode: u8,
    pub ifun: u8,
    pub ra: u8,
    pub rb: u8,
    pub valc: u64,
    pub valp: u64,
    pub stage_pc: u64,
}

impl Default for DecodeReg {
    fn default() -> Self {
        Self {
            stat: Stat::Bub,
            icode: inst_code::NOP,
            ifun: 0,
            ra: reg_code::RNONE,
            rb: reg_code::RNONE,
            valc: 0,
            valp: 0,
            stage_pc: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteReg {
    pub stat: Stat,
    pub icode: u8,
    pub ifun: u8,
    pub vala: u64,
    pub valb: u64,
    pub valc: u64,
    pub dste: u8,
    pub dstm: u8,
    pub srca: u8,
    pub srcb: u8,
    pub stage_pc: u64,
}

impl Default for ExecuteReg {
    fn default() -> Self {
        Self {
            stat: Stat::Bub,
            icode: inst_code::NOP,
            ifun: 0,
            vala: 0,
            valb: 0,
            valc: 0,
            dste: reg_code::RNONE,
            dstm: reg_code::RNONE,
            srca: reg_code::RNONE,
            srcb: reg_code::RNONE,
            stage_pc: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryReg {
    pub stat: Stat,
    pub icode: u8,
    pub cnd: bool,
    pub vale: u64,
    pub vala: u64,
    pub dste: u8,
    pub dstm: u8,
    pub stage_pc: u64,
}

impl Default for MemoryReg {
    fn default() -> Self {
        Self {
            stat: Stat::Bub,
            icode: inst_code::NOP,
            cnd: false,
            vale: 0,
            vala: 0,
            dste: reg_code::RNONE,
            dstm: reg_code::RNONE,
            stage_pc: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WritebackReg {
    pub stat: Stat,
    pub icode: u8,
    pub vale: u64,
    pub valm: u64,
    pub dste: u8,
    pub dstm: u8,
    pub stage_pc: u64,
}

impl Default for WritebackReg {
    fn default() -> Self {
        Self {
            stat: Stat::Bub,
            icode: inst_code::NOP,
            vale: 0,
            valm: 0,
            dste: reg_code::RNONE,
            dstm: reg_code::RNONE,
            stage_pc: 0,
        }
    }
}
