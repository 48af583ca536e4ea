//! End-to-end pipeline scenarios, each built directly from Y86-64 machine
//! bytes (there is no assembler in this crate) and checked against the
//! architectural state the pipeline reaches, and in one case against the
//! sequential oracle.

use y86_pipe_sim::isa::{inst_code, reg_code, Stat};
use y86_pipe_sim::memory::Memory;
use y86_pipe_sim::oracle::Oracle;
use y86_pipe_sim::pipeline::Simulator;

/// Minimal byte-level encoder for the handful of instructions these
/// scenarios need.
struct Asm {
    bytes: Vec<u8>,
}

impl Asm {
    fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    fn halt(&mut self) -> &mut Self {
        self.bytes.push(inst_code::HALT << 4);
        self
    }

    fn nop(&mut self) -> &mut Self {
        self.bytes.push(inst_code::NOP << 4);
        self
    }

    fn irmovq(&mut self, imm: u64, rb: u8) -> &mut Self {
        self.bytes.push(inst_code::IRMOVQ << 4);
        self.bytes.push((reg_code::RNONE << 4) | rb);
        self.bytes.extend_from_slice(&imm.to_le_bytes());
        self
    }

    fn opq(&mut self, ifun: u8, ra: u8, rb: u8) -> &mut Self {
        self.bytes.push((inst_code::OPQ << 4) | ifun);
        self.bytes.push((ra << 4) | rb);
        self
    }

    fn rmmovq(&mut self, ra: u8, d: u64, rb: u8) -> &mut Self {
        self.bytes.push(inst_code::RMMOVQ << 4);
        self.bytes.push((ra << 4) | rb);
        self.bytes.extend_from_slice(&d.to_le_bytes());
        self
    }

    fn mrmovq(&mut self, d: u64, rb: u8, ra: u8) -> &mut Self {
        self.bytes.push(inst_code::MRMOVQ << 4);
        self.bytes.push((ra << 4) | rb);
        self.bytes.extend_from_slice(&d.to_le_bytes());
        self
    }

    fn jx(&mut self, ifun: u8, target: u64) -> &mut Self {
        self.bytes.push((inst_code::JX << 4) | ifun);
        self.bytes.extend_from_slice(&target.to_le_bytes());
        self
    }

    fn call(&mut self, target: u64) -> &mut Self {
        self.bytes.push(inst_code::CALL << 4);
        self.bytes.extend_from_slice(&target.to_le_bytes());
        self
    }

    fn ret(&mut self) -> &mut Self {
        self.bytes.push(inst_code::RET << 4);
        self
    }

    fn memory(&self) -> Memory {
        Memory::from_bytes(self.bytes.clone())
    }

    fn pc(&self) -> u64 {
        self.bytes.len() as u64
    }
}

// S1: irmovq $3,%rax; irmovq $4,%rbx; addq %rax,%rbx; halt
#[test]
fn straight_line_addition() {
    let mut asm = Asm::new();
    asm.irmovq(3, reg_code::RAX)
        .irmovq(4, reg_code::RBX)
        .opq(0, reg_code::RAX, reg_code::RBX)
        .halt();

    let mut sim = Simulator::new(asm.memory());
    sim.run(100);

    assert_eq!(sim.stat(), Stat::Hlt);
    assert_eq!(sim.registers().get(reg_code::RBX), 7);
    let cc = sim.condition_code();
    assert!(!cc.zf && !cc.sf && !cc.of);
    assert_eq!(sim.instructions_retired(), 4);
    assert_eq!(sim.cycle(), 8);
}

// S2: a not-taken branch (cc starts ZF=1, so `jne` evaluates false) falls
// through to the next instruction; the predicted-taken target (here an
// address that is never actually reached) must not corrupt final state.
#[test]
fn not_taken_branch_falls_through() {
    let mut asm = Asm::new();
    asm.jx(4, 0xff00) // jne: NE is false while ZF=1, so this does not branch
        .irmovq(1, reg_code::RAX)
        .halt();

    let mut sim = Simulator::new(asm.memory());
    sim.run(100);

    assert_eq!(sim.stat(), Stat::Hlt);
    assert_eq!(sim.registers().get(reg_code::RAX), 1);
}

// S3: a load whose value is immediately used by the next instruction must
// stall exactly one cycle, and the final result must match the oracle.
#[test]
fn load_use_hazard_stalls_and_matches_oracle() {
    let mut asm = Asm::new();
    asm.irmovq(8, reg_code::RSP)
        .irmovq(100, reg_code::RBX)
        .rmmovq(reg_code::RBX, 0, reg_code::RSP) // store 100 at address 8
        .mrmovq(0, reg_code::RSP, reg_code::RAX) // load it back into %rax
        .opq(0, reg_code::RAX, reg_code::RBX) // %rbx += %rax
        .halt();

    let mem = asm.memory();
    let mut sim = Simulator::new(mem.clone());
    sim.run(100);
    assert_eq!(sim.stat(), Stat::Hlt);

    let mut oracle = Oracle::new(mem);
    let outcome = oracle.run(100);
    assert_eq!(outcome.stat, Stat::Hlt);

    assert_eq!(sim.registers().get(reg_code::RAX), oracle.regs.get(reg_code::RAX));
    assert_eq!(sim.registers().get(reg_code::RBX), oracle.regs.get(reg_code::RBX));
}

// S4: call/ret round-trips through the stack and resumes at the return
// address, surviving the ret-stall bubbles.
#[test]
fn call_and_ret_round_trip() {
    let mut asm = Asm::new();
    asm.irmovq(1024, reg_code::RSP);
    // layout: call f; halt; f: irmovq $9,%rax; ret
    let call_instr_len = 9;
    let halt_len = 1;
    let f_addr = asm.pc() + call_instr_len as u64 + halt_len as u64;
    asm.call(f_addr).halt();
    asm.irmovq(9, reg_code::RAX).ret();

    let mut sim = Simulator::new(asm.memory());
    sim.run(100);

    assert_eq!(sim.stat(), Stat::Hlt);
    assert_eq!(sim.registers().get(reg_code::RAX), 9);
}

// An instruction-budget cap below the program's length must stop the
// simulator early, short of retiring the halt.
#[test]
fn instruction_budget_stops_before_halt() {
    let mut asm = Asm::new();
    asm.irmovq(3, reg_code::RAX)
        .irmovq(4, reg_code::RBX)
        .opq(0, reg_code::RAX, reg_code::RBX)
        .halt();

    let mut sim = Simulator::new(asm.memory());
    sim.run_instructions(2);

    assert_ne!(sim.stat(), Stat::Hlt);
    assert_eq!(sim.instructions_retired(), 2);
}

#[test]
fn halt_on_empty_memory() {
    let mem = Memory::new(); // byte 0 is 0x00 == HALT
    let mut sim = Simulator::new(mem);
    sim.run(10);
    assert_eq!(sim.stat(), Stat::Hlt);
    // HALT itself retires once it reaches Writeback.
    assert_eq!(sim.instructions_retired(), 1);
}
