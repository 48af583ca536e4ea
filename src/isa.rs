//! Instruction Set definition for the Y86-64 architecture.

/// Defines a small namespace of named byte constants plus a `name_of` lookup,
/// used for icode/ifun/register/condition tables below.
macro_rules! define_code {
    {
        @mod $modname:ident;
        @type $typ:ty;
        $( $cname:ident = $cval:expr; )*
    } => {
        pub mod $modname {
            $(pub const $cname : $typ = $cval; )*
            #[allow(unused)]
            pub fn name_of(code: $typ) -> &'static str {
                match code {
                    $($cname => stringify!($cname), )*
                    _ => "no name"
                }
            }
        }
    };
}

define_code! {
    @mod inst_code;
    @type u8;
    HALT = 0x0;
    NOP = 0x1;
    CMOVX = 0x2;
    IRMOVQ = 0x3;
    RMMOVQ = 0x4;
    MRMOVQ = 0x5;
    OPQ = 0x6;
    JX = 0x7;
    CALL = 0x8;
    RET = 0x9;
    PUSHQ = 0xa;
    POPQ = 0xb;
}

define_code! {
    @mod reg_code;
    @type u8;
    RAX = 0;
    RCX = 1;
    RDX = 2;
    RBX = 3;
    RSP = 4;
    RBP = 5;
    RSI = 6;
    RDI = 7;
    R8 = 8;
    R9 = 9;
    R10 = 0xa;
    R11 = 0xb;
    R12 = 0xc;
    R13 = 0xd;
    R14 = 0xe;
    RNONE = 0xf;
}

define_code! {
    @mod op_code;
    @type u8;
    ADD = 0;
    SUB = 1;
    AND = 2;
    XOR = 3;
    SHL = 4;
    SHR = 5;
    VECADD = 6;
}

define_code! {
    @mod cond_fn;
    @type u8;
    YES = 0;
    LE = 1;
    L = 2;
    E = 3;
    NE = 4;
    GE = 5;
    G = 6;
}

/// A constant that represents the value -8, used for stack-pointer arithmetic.
pub const NEG_8: u64 = -8i64 as u64;

/// Number of bytes occupied by an instruction, keyed on icode. `0` marks an
/// invalid icode.
pub fn inst_len(icode: u8) -> usize {
    use inst_code::*;
    match icode {
        HALT | NOP | RET => 1,
        CMOVX | OPQ | PUSHQ | POPQ => 2,
        CALL | JX => 9,
        IRMOVQ | RMMOVQ | MRMOVQ => 10,
        _ => 0,
    }
}

pub fn is_valid_icode(icode: u8) -> bool {
    inst_len(icode) != 0
}

/// 3-bit condition code: zero, sign, overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConditionCode {
    pub zf: bool,
    pub sf: bool,
    pub of: bool,
}

impl ConditionCode {
    /// Initial architectural condition code: ZF set, SF/OF clear.
    pub fn initial() -> Self {
        Self {
            zf: true,
            sf: false,
            of: false,
        }
    }

    /// Recompute ZF/SF (and, for ADD/SUB, OF) from an ALU operation's inputs
    /// and result. SHL/SHR/VECADD update ZF/SF only, per the narrower
    /// semantics resolved in the design notes.
    pub fn set(&mut self, a: u64, b: u64, e: u64, opfun: u8) {
        use op_code::*;
        self.zf = e == 0;
        self.sf = (e as i64) < 0;
        // OF is only meaningful for ADD/SUB; SHL/SHR/VECADD leave it as-is.
        if let ADD | SUB = opfun {
            let (sa, sb, se) = (a as i64, b as i64, e as i64);
            self.of = if opfun == ADD {
                (sb >= 0 && sa >= 0 && se < 0) || (sb < 0 && sa < 0 && se >= 0)
            } else {
                // e = b - a
                (sb >= 0 && sa < 0 && se < 0) || (sb < 0 && sa >= 0 && se >= 0)
            };
        }
    }

    /// Evaluate a jump/cmov condition function against this condition code.
    pub fn test(&self, condfun: u8) -> bool {
        use cond_fn::*;
        match condfun {
            YES => true,
            LE => self.sf != self.of || self.zf,
            L => self.sf != self.of,
            E => self.zf,
            NE => !self.zf,
            GE => self.sf == self.of,
            G => self.sf == self.of && !self.zf,
            _ => false,
        }
    }
}

impl std::fmt::Display for ConditionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ZF {} SF {} OF {}",
            self.zf as u8, self.sf as u8, self.of as u8
        )
    }
}

/// Compute `b OP a` (note the operand order: this mirrors the hardware ALU,
/// whose `A` input carries the second operand). Returns `None` for unknown
/// `opfun`.
pub fn arithmetic_compute(a: u64, b: u64, opfun: u8) -> Option<u64> {
    use op_code::*;
    Some(match opfun {
        ADD => b.wrapping_add(a),
        SUB => b.wrapping_sub(a),
        AND => b & a,
        XOR => b ^ a,
        SHL => b.wrapping_shl(a as u32 & 63),
        SHR => b.wrapping_shr(a as u32 & 63),
        VECADD => vecadd(a, b),
        _ => return None,
    })
}

/// Eight independent byte-lane additions packed into a 64-bit word, with no
/// carry propagation between lanes.
fn vecadd(a: u64, b: u64) -> u64 {
    let ab = a.to_le_bytes();
    let bb = b.to_le_bytes();
    let mut out = [0u8; 8];
    for i in 0..8 {
        out[i] = ab[i].wrapping_add(bb[i]);
    }
    u64::from_le_bytes(out)
}

/// Machine status, attached to every in-flight instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    /// Everything is fine, instruction is (or was) executing normally.
    Aok,
    /// The stage is bubbled: it holds the NOP instruction.
    Bub,
    /// The halt instruction was retired.
    Hlt,
    /// A memory access used an out-of-range address.
    Adr,
    /// The instruction fetcher read an invalid opcode.
    Ins,
    /// The hazard-control unit produced an inconsistent control signal
    /// (e.g. STALL and BUBBLE on the same register in the same cycle).
    Pip,
}

impl Default for Stat {
    fn default() -> Self {
        Self::Bub
    }
}

impl Stat {
    /// Whether this status should stop the cycle driver when it reaches the
    /// Writeback stage's output.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Stat::Aok | Stat::Bub)
    }
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stat::Aok => "AOK",
            Stat::Bub => "BUB",
            Stat::Hlt => "HLT",
            Stat::Adr => "ADR",
            Stat::Ins => "INS",
            Stat::Pip => "PIP",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cc_zero_flag() {
        let mut cc = ConditionCode::default();
        cc.set(0, 5, 5, op_code::ADD);
        assert!(!cc.zf);
        cc.set(5, 5, 0, op_code::SUB);
        assert!(cc.zf);
    }

    #[test]
    fn vecadd_has_no_carry() {
        // 0xff + 0x01 in lane 0 wraps to 0x00 without touching lane 1.
        let a = 0x00_01u64;
        let b = 0x00_ffu64;
        assert_eq!(vecadd(a, b), 0x00_00u64);
    }

    #[test]
    fn inst_len_table() {
        assert_eq!(inst_len(inst_code::HALT), 1);
        assert_eq!(inst_len(inst_code::IRMOVQ), 10);
        assert_eq!(inst_len(0xf), 0);
        assert!(!is_valid_icode(0xf));
    }
}
