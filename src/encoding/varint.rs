//! # Variable-Length Integer Encoding
//!
//! This module provides the 7-bit variable-length integer encoding used by the
//! HybridRow format for string/binary length prefixes, tokenized paths, tuple
//! arities and the VarInt/VarUInt field types.
//!
//! ## Encoding Format
//!
//! Each byte carries seven payload bits, least significant group first. The high
//! bit is set on every byte except the last:
//!
//! | Value Range              | Bytes |
//! |--------------------------|-------|
//! | 0 - 127                  | 1     |
//! | 128 - 16383              | 2     |
//! | 16384 - 2097151          | 3     |
//! | ...                      | ...   |
//! | 2^63 - u64::MAX          | 10    |
//!
//! Signed values are zig-zag mapped before encoding so that small negative
//! numbers stay short:
//!
//! ```text
//!  0 -> 0    -1 -> 1    1 -> 2    -2 -> 3    2 -> 4 ...
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use hybridrow::encoding::varint::{decode_varuint, encode_varuint, varuint_len};
//!
//! let mut buf = [0u8; 10];
//! let written = encode_varuint(300, &mut buf);
//! assert_eq!(written, varuint_len(300));
//! assert_eq!(&buf[..written], &[0xAC, 0x02]);
//!
//! let (value, read) = decode_varuint(&buf).unwrap();
//! assert_eq!((value, read), (300, 2));
//! ```
//!
//! ## Zero-Copy Design
//!
//! All functions operate on byte slices directly and never allocate.
//!
//! ## Error Handling
//!
//! The decoders return `eyre::Result` with descriptive error messages:
//! - Empty buffer: "empty buffer for varint decode"
//! - Missing continuation bytes: "truncated varint after N bytes"
//! - More than ten bytes: "varint exceeds 10 bytes"

use eyre::{bail, ensure, Result};

use crate::config::MAX_VARINT_LEN;

pub fn varuint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

pub fn varint_len(value: i64) -> usize {
    varuint_len(zigzag_encode(value))
}

pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Writes `value` into `buf` and returns the number of bytes written.
///
/// `buf` must hold at least [`varuint_len`]`(value)` bytes.
pub fn encode_varuint(mut value: u64, buf: &mut [u8]) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        buf[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    i + 1
}

pub fn encode_varint(value: i64, buf: &mut [u8]) -> usize {
    encode_varuint(zigzag_encode(value), buf)
}

pub fn decode_varuint(buf: &[u8]) -> Result<(u64, usize)> {
    ensure!(!buf.is_empty(), "empty buffer for varint decode");

    let mut value = 0u64;
    for (i, &byte) in buf.iter().enumerate() {
        ensure!(i < MAX_VARINT_LEN, "varint exceeds {} bytes", MAX_VARINT_LEN);
        value |= ((byte & 0x7F) as u64) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    bail!("truncated varint after {} bytes", buf.len())
}

pub fn decode_varint(buf: &[u8]) -> Result<(i64, usize)> {
    let (raw, len) = decode_varuint(buf)?;
    Ok((zigzag_decode(raw), len))
}
