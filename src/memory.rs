//! Byte-addressable memory and the architectural register file.
//!
//! Both containers are deliberately thin: they are the simulator's
//! collaborators at the data-storage boundary, not part of the hazard or
//! cache logic the rest of the crate is built around.

/// Size of the linear memory store backing both the pipeline simulator and
/// the sequential oracle.
pub const MEM_SIZE: usize = 1 << 16;

/// Raised when a byte or 8-byte access falls outside `[0, MEM_SIZE)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("address {addr:#x} is out of bounds (memory size {MEM_SIZE:#x})")]
pub struct AddressError {
    pub addr: u64,
}

/// A flat byte-addressable store.
#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; MEM_SIZE],
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mut bytes = bytes;
        bytes.resize(MEM_SIZE, 0);
        Self { bytes }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn get_byte(&self, addr: u64) -> Result<u8, AddressError> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or(AddressError { addr })
    }

    pub fn set_byte(&mut self, addr: u64, val: u8) -> Result<(), AddressError> {
        let slot = self
            .bytes
            .get_mut(addr as usize)
            .ok_or(AddressError { addr })?;
        *slot = val;
        Ok(())
    }

    /// Read a contiguous run of `len` bytes starting at `addr`, used by Fetch
    /// to grab an instruction's opcode/regid/immediate bytes in one shot.
    pub fn get_run(&self, addr: u64, len: usize) -> Result<&[u8], AddressError> {
        let addr = addr as usize;
        self.bytes
            .get(addr..addr + len)
            .ok_or(AddressError { addr: addr as u64 })
    }

    /// Read an 8-byte little-endian word. Fails if any of the 8 bytes are
    /// out of range.
    pub fn get_u64(&self, addr: u64) -> Result<u64, AddressError> {
        let run = self.get_run(addr, 8)?;
        Ok(u64::from_le_bytes(run.try_into().unwrap()))
    }

    /// Write an 8-byte little-endian word. Fails if any of the 8 bytes are
    /// out of range.
    pub fn set_u64(&mut self, addr: u64, val: u64) -> Result<(), AddressError> {
        let addr_usize = addr as usize;
        let slot = self
            .bytes
            .get_mut(addr_usize..addr_usize + 8)
            .ok_or(AddressError { addr })?;
        slot.copy_from_slice(&val.to_le_bytes());
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// The architectural register file: 15 general-purpose registers plus the
/// `RNONE` sentinel at index 15, which is never actually stored to.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    regs: [u64; 16],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self { regs: [0; 16] }
    }

    pub fn get(&self, reg: u8) -> u64 {
        if reg == crate::isa::reg_code::RNONE {
            0
        } else {
            self.regs[reg as usize]
        }
    }

    /// Writes are no-ops for `RNONE`; returns the prior value so callers
    /// (the checkpoint stack) can record an undo delta.
    pub fn set(&mut self, reg: u8, val: u64) -> u64 {
        if reg == crate::isa::reg_code::RNONE {
            return 0;
        }
        let prior = self.regs[reg as usize];
        self.regs[reg as usize] = val;
        prior
    }

    /// All 15 addressable registers and their current values.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        (0..15u8).map(|r| (r, self.regs[r as usize]))
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
