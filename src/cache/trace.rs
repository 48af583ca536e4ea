//! Parser for Valgrind-style memory-access traces, e.g.:
//! ```text
//!  L 7ff000184,8
//!  S 7ff0001a8,8
//!  M 601038,8
//! I  0400d7d4,5
//! ```
//! A leading space marks a data access (`L` load, `S` store, `M`
//! modify = load then store); lines starting with `I` are instruction
//! fetches and are not cache-modeled here.

use thiserror::Error;

use super::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Load { addr: u64, size: u32 },
    Store { addr: u64, size: u32 },
    Modify { addr: u64, size: u32 },
}

impl Access {
    /// The operation(s) an [`Access`] drives through the cache, in order.
    pub fn operations(self) -> Vec<Operation> {
        match self {
            Access::Load { .. } => vec![Operation::Read],
            Access::Store { .. } => vec![Operation::Write],
            Access::Modify { .. } => vec![Operation::Read, Operation::Write],
        }
    }

    pub fn addr(self) -> u64 {
        match self {
            Access::Load { addr, .. } | Access::Store { addr, .. } | Access::Modify { addr, .. } => addr,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: malformed trace entry {text:?}")]
pub struct TraceError {
    pub line: usize,
    pub text: String,
}

/// Parse a full trace file, skipping instruction-fetch (`I`) lines.
pub fn parse(source: &str) -> Result<Vec<Access>, TraceError> {
    let mut out = Vec::new();
    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        if raw_line.is_empty() || raw_line.starts_with('I') {
            continue;
        }
        let trimmed = raw_line.trim_start();
        let mut chars = trimmed.chars();
        let kind = chars.next().ok_or_else(|| TraceError {
            line: line_no,
            text: raw_line.to_string(),
        })?;
        let rest = chars.as_str().trim();
        let (addr_str, size_str) = rest.split_once(',').ok_or_else(|| TraceError {
            line: line_no,
            text: raw_line.to_string(),
        })?;
        let addr = u64::from_str_radix(addr_str.trim(), 16).map_err(|_| TraceError {
            line: line_no,
            text: raw_line.to_string(),
        })?;
        let size: u32 = size_str.trim().parse().map_err(|_| TraceError {
            line: line_no,
            text: raw_line.to_string(),
        })?;

        let access = match kind {
            'L' => Access::Load { addr, size },
            'S' => Access::Store { addr, size },
            'M' => Access::Modify { addr, size },
            _ => {
                return Err(TraceError {
                    line: line_no,
                    text: raw_line.to_string(),
                })
            }
        };
        out.push(access);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loads_stores_and_modifies() {
        let src = " L 10,4\n S 20,8\n M 30,1\nI  40,5\n";
        let accesses = parse(src).unwrap();
        assert_eq!(
            accesses,
            vec![
                Access::Load { addr: 0x10, size: 4 },
                Access::Store { addr: 0x20, size: 8 },
                Access::Modify { addr: 0x30, size: 1 },
            ]
        );
    }

    #[test]
    fn modify_drives_a_read_then_a_write() {
        let ops = Access::Modify { addr: 0, size: 1 }.operations();
        assert_eq!(ops, vec![Operation::Read, Operation::Write]);
    }

    #[test]
    fn rejects_unknown_access_kind() {
        assert!(parse("X 10,4\n").is_err());
    }
}
