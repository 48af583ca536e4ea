//! Loader for the `.yo` object-file text format (spec §4.9): each line is
//! either blank, a comment (`source text` with no `ADDR:` prefix), or
//! `ADDR: B0 B1 ... Bk | source text`, where `ADDR` is hex and each `Bi` is
//! a hex byte. Lines with no `|` are still valid; everything after it is
//! ignored.

use thiserror::Error;

use crate::memory::Memory;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObjectError {
    #[error("line {line}: malformed address field {text:?}")]
    BadAddress { line: usize, text: String },
    #[error("line {line}: malformed byte {text:?}")]
    BadByte { line: usize, text: String },
    #[error("line {line}: address {addr:#x} overflows memory")]
    Overflow { line: usize, addr: u64 },
}

/// Parse a `.yo`-format object file into a freshly populated [`Memory`].
pub fn load(source: &str) -> Result<Memory, ObjectError> {
    let mut mem = Memory::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line = idx + 1;
        let code_part = raw_line.split('|').next().unwrap_or("").trim();
        if code_part.is_empty() {
            continue;
        }

        let Some((addr_field, bytes_field)) = code_part.split_once(':') else {
            continue;
        };
        let addr_field = addr_field.trim();
        if addr_field.is_empty() {
            continue;
        }
        let addr_digits = addr_field
            .strip_prefix("0x")
            .or_else(|| addr_field.strip_prefix("0X"))
            .unwrap_or(addr_field);
        let addr = u64::from_str_radix(addr_digits, 16).map_err(|_| ObjectError::BadAddress {
            line,
            text: addr_field.to_string(),
        })?;

        for (i, tok) in bytes_field.split_whitespace().enumerate() {
            let byte = u8::from_str_radix(tok, 16).map_err(|_| ObjectError::BadByte {
                line,
                text: tok.to_string(),
            })?;
            let at = addr + i as u64;
            mem.set_byte(at, byte)
                .map_err(|_| ObjectError::Overflow { line, addr: at })?;
        }
    }

    Ok(mem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_bytes_at_address() {
        let src = "0x000: 30 f4 08 00 00 00 00 00 00 00 | irmovq $8, %rsp\n";
        let mem = load(src).unwrap();
        assert_eq!(mem.get_byte(0).unwrap(), 0x30);
        assert_eq!(mem.get_byte(1).unwrap(), 0xf4);
        assert_eq!(mem.get_u64(2).unwrap(), 8);
    }

    #[test]
    fn ignores_comment_only_lines() {
        let src = "                    | # a comment with no address\n";
        let mem = load(src).unwrap();
        assert_eq!(mem.get_byte(0).unwrap(), 0);
    }

    #[test]
    fn rejects_bad_address() {
        let err = load("zz: 00 | oops\n").unwrap_err();
        assert!(matches!(err, ObjectError::BadAddress { .. }));
    }
}
