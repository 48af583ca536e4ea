//! A non-pipelined, single-instruction-at-a-time reference interpreter
//! (spec §4.10), used as a test oracle: the final architectural state it
//! reaches for a program must match the pipeline simulator's.

use crate::isa::{arithmetic_compute, inst_code, reg_code, ConditionCode, Stat};
use crate::memory::{Memory, RegisterFile};

/// Final outcome of running a program to completion (or to an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub stat: Stat,
    pub cycles: u64,
}

/// Sequential Y86-64 interpreter over the same [`Memory`]/[`RegisterFile`]
/// types the pipeline uses.
pub struct Oracle {
    pub mem: Memory,
    pub regs: RegisterFile,
    pub cc: ConditionCode,
    pub pc: u64,
}

impl Oracle {
    pub fn new(mem: Memory) -> Self {
        Self {
            mem,
            regs: RegisterFile::new(),
            cc: ConditionCode::initial(),
            pc: 0,
        }
    }

    /// Execute one instruction at `self.pc`, returning the status it
    /// produced. A `BUB` never escapes this function: status is always one
    /// of `AOK`, `HLT`, `ADR`, or `INS`.
    pub fn step(&mut self) -> Stat {
        let opcode = match self.mem.get_byte(self.pc) {
            Ok(b) => b,
            Err(_) => return Stat::Adr,
        };
        let icode = opcode >> 4;
        let ifun = opcode & 0xf;

        if !crate::isa::is_valid_icode(icode) {
            return Stat::Ins;
        }
        if icode == inst_code::HALT {
            return Stat::Hlt;
        }

        let len = crate::isa::inst_len(icode);
        let need_regids = matches!(
            icode,
            inst_code::CMOVX
                | inst_code::OPQ
                | inst_code::PUSHQ
                | inst_code::POPQ
                | inst_code::IRMOVQ
                | inst_code::RMMOVQ
                | inst_code::MRMOVQ
        );
        let need_valc = matches!(
            icode,
            inst_code::IRMOVQ | inst_code::RMMOVQ | inst_code::MRMOVQ | inst_code::JX | inst_code::CALL
        );

        let (ra, rb, valc) = if len > 1 {
            let rest = match self.mem.get_run(self.pc + 1, len - 1) {
                Ok(r) => r,
                Err(_) => return Stat::Adr,
            };
            if need_regids {
                let ra = rest[0] >> 4;
                let rb = rest[0] & 0xf;
                let valc = if need_valc {
                    u64::from_le_bytes(rest[1..9].try_into().unwrap())
                } else {
                    0
                };
                (ra, rb, valc)
            } else {
                let valc = u64::from_le_bytes(rest[0..8].try_into().unwrap());
                (reg_code::RNONE, reg_code::RNONE, valc)
            }
        } else {
            (reg_code::RNONE, reg_code::RNONE, 0)
        };

        let valp = self.pc + len as u64;
        let mut next_pc = valp;
        let mut stat = Stat::Aok;

        match icode {
            inst_code::NOP => {}
            inst_code::CMOVX => {
                if self.cc.test(ifun) {
                    self.regs.set(rb, self.regs.get(ra));
                }
            }
            inst_code::IRMOVQ => {
                self.regs.set(rb, valc);
            }
            inst_code::RMMOVQ => {
                let addr = self.regs.get(rb).wrapping_add(valc);
                if self.mem.set_u64(addr, self.regs.get(ra)).is_err() {
                    stat = Stat::Adr;
                }
            }
            inst_code::MRMOVQ => {
                let addr = self.regs.get(rb).wrapping_add(valc);
                match self.mem.get_u64(addr) {
                    Ok(v) => {
                        self.regs.set(ra, v);
                    }
                    Err(_) => stat = Stat::Adr,
                }
            }
            inst_code::OPQ => {
                let a = self.regs.get(ra);
                let b = self.regs.get(rb);
                let e = arithmetic_compute(a, b, ifun).unwrap_or(0);
                self.cc.set(a, b, e, ifun);
                self.regs.set(rb, e);
            }
            inst_code::JX => {
                if self.cc.test(ifun) {
                    next_pc = valc;
                }
            }
            inst_code::CALL => {
                let new_sp = self.regs.get(reg_code::RSP).wrapping_sub(8);
                if self.mem.set_u64(new_sp, valp).is_err() {
                    stat = Stat::Adr;
                } else {
                    self.regs.set(reg_code::RSP, new_sp);
                    next_pc = valc;
                }
            }
            inst_code::RET => {
                let sp = self.regs.get(reg_code::RSP);
                match self.mem.get_u64(sp) {
                    Ok(ret_addr) => {
                        self.regs.set(reg_code::RSP, sp.wrapping_add(8));
                        next_pc = ret_addr;
                    }
                    Err(_) => stat = Stat::Adr,
                }
            }
            inst_code::PUSHQ => {
                let new_sp = self.regs.get(reg_code::RSP).wrapping_sub(8);
                if self.mem.set_u64(new_sp, self.regs.get(ra)).is_err() {
                    stat = Stat::Adr;
                } else {
                    self.regs.set(reg_code::RSP, new_sp);
                }
            }
            inst_code::POPQ => {
                let sp = self.regs.get(reg_code::RSP);
                match self.mem.get_u64(sp) {
                    Ok(v) => {
                        self.regs.set(reg_code::RSP, sp.wrapping_add(8));
                        self.regs.set(ra, v);
                    }
                    Err(_) => stat = Stat::Adr,
                }
            }
            _ => unreachable!("icode validity already checked"),
        }

        if stat == Stat::Aok {
            self.pc = next_pc;
        }
        stat
    }

    /// Run until a terminal status, capped at `max_cycles` (a runaway
    /// guard, not an architectural feature).
    pub fn run(&mut self, max_cycles: u64) -> Outcome {
        for cycles in 0..max_cycles {
            let stat = self.step();
            if stat.is_terminal() {
                return Outcome {
                    stat,
                    cycles: cycles + 1,
                };
            }
        }
        Outcome {
            stat: Stat::Aok,
            cycles: max_cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halts_on_halt_opcode() {
        let mut mem = Memory::new();
        mem.set_byte(0, 0x00).unwrap();
        let mut oracle = Oracle::new(mem);
        let outcome = oracle.run(10);
        assert_eq!(outcome.stat, Stat::Hlt);
    }

    #[test]
    fn irmovq_then_halt() {
        let mut mem = Memory::new();
        // irmovq $0x2a, %rax ; halt
        mem.set_byte(0, 0x30).unwrap();
        mem.set_byte(1, 0xf0).unwrap();
        mem.set_u64(2, 0x2a).unwrap();
        mem.set_byte(10, 0x00).unwrap();
        let mut oracle = Oracle::new(mem);
        let outcome = oracle.run(10);
        assert_eq!(outcome.stat, Stat::Hlt);
        assert_eq!(oracle.regs.get(reg_code::RAX), 0x2a);
    }
}
