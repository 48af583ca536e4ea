//! The pipeline register primitive (spec §4.1): a two-slot holder with an
//! `input` side written by the producing stage and an `output` side read by
//! the consuming stage, advanced by a single control op each cycle.

/// Per-cycle control signal latched onto a pipeline register by the
/// hazard-control unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlOp {
    /// `output <- input`.
    Load,
    /// `output` holds its value; the stage re-executes the same instruction.
    Stall,
    /// `output <- bubble_value` (the next stage sees a NOP/BUB).
    Bubble,
    /// Like `Bubble`, but the op is *not* reset to `Load` afterwards: it
    /// stays latched until explicitly cleared. Used for PIP.
    Error,
}

impl Default for CtrlOp {
    fn default() -> Self {
        CtrlOp::Load
    }
}

/// A single pipeline register holding payload `T`.
#[derive(Debug, Clone)]
pub struct PipeReg<T> {
    input: T,
    output: T,
    bubble_value: T,
    op: CtrlOp,
}

impl<T: Clone> PipeReg<T> {
    pub fn new(bubble_value: T) -> Self {
        Self {
            input: bubble_value.clone(),
            output: bubble_value.clone(),
            bubble_value,
            op: CtrlOp::Load,
        }
    }

    pub fn input(&self) -> &T {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut T {
        &mut self.input
    }

    pub fn output(&self) -> &T {
        &self.output
    }

    /// Direct access to `output`, bypassing `update()`'s control-op logic.
    /// Reserved for the checkpoint/undo stack, which restores a prior
    /// cycle's output without replaying a control op.
    pub(crate) fn output_mut(&mut self) -> &mut T {
        &mut self.output
    }

    pub fn ctrl(&self) -> CtrlOp {
        self.op
    }

    pub fn set_ctrl(&mut self, op: CtrlOp) {
        self.op = op;
    }

    /// Apply this cycle's latched control op. Must be called for every
    /// register in a single atomic pass once all stages have finished
    /// writing their `input` sides (spec §5).
    pub fn update(&mut self) {
        match self.op {
            CtrlOp::Load => self.output = self.input.clone(),
            CtrlOp::Bubble => self.output = self.bubble_value.clone(),
            CtrlOp::Error => self.output = self.bubble_value.clone(),
            CtrlOp::Stall => {}
        }
        if !matches!(self.op, CtrlOp::Error) {
            self.op = CtrlOp::Load;
        }
    }

    pub fn clear(&mut self) {
        self.input = self.bubble_value.clone();
        self.output = self.bubble_value.clone();
        self.op = CtrlOp::Load;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_copies_input_to_output() {
        let mut r = PipeReg::new(0u64);
        *r.input_mut() = 7;
        r.update();
        assert_eq!(*r.output(), 7);
    }

    #[test]
    fn stall_keeps_output() {
        let mut r = PipeReg::new(0u64);
        *r.input_mut() = 7;
        r.update();
        *r.input_mut() = 99;
        r.set_ctrl(CtrlOp::Stall);
        r.update();
        assert_eq!(*r.output(), 7);
    }

    #[test]
    fn bubble_resets_to_bubble_value() {
        let mut r = PipeReg::new(42u64);
        *r.input_mut() = 7;
        r.set_ctrl(CtrlOp::Bubble);
        r.update();
        assert_eq!(*r.output(), 42);
        // bubble is not latched: next cycle defaults back to load
        assert_eq!(r.ctrl(), CtrlOp::Load);
    }

    #[test]
    fn error_stays_latched() {
        let mut r = PipeReg::new(0u64);
        r.set_ctrl(CtrlOp::Error);
        r.update();
        assert_eq!(r.ctrl(), CtrlOp::Error);
    }
}
