//! # Encoding Module
//!
//! Low-level integer encodings shared by the row engine and the layout
//! tokenizer:
//!
//! - **Varint encoding**: 7-bit variable-length unsigned integers and zig-zag
//!   signed integers for length prefixes, path tokens and VarInt/VarUInt fields

pub mod varint;

pub use varint::{
    decode_varint, decode_varuint, encode_varint, encode_varuint, varint_len, varuint_len,
    zigzag_decode, zigzag_encode,
};
