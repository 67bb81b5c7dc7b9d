//! # Row Engine
//!
//! This module implements in-place reading and writing of HybridRow rows. A
//! row is a single byte buffer; values are read and written where they live,
//! and a write that changes a value's size moves the bytes after it.
//!
//! ## Row Binary Layout
//!
//! ```text
//! +--------+-----------+--------------+-----------------+---------------------+
//! | Header | Bitmask   | Fixed values | Variable values | Sparse values       |
//! | 5 B    | presence  | byte offsets | length-prefixed | self-describing,    |
//! |        | + bools   |              | present only    | until end of row    |
//! +--------+-----------+--------------+-----------------+---------------------+
//! ```
//!
//! | Component | Addressed by | Description |
//! |-----------|--------------|-------------|
//! | **Header** | - | version byte and root schema id |
//! | **Bitmask** | [`LayoutBit`](crate::layouts::LayoutBit) | presence of nullable columns and fixed boolean values |
//! | **Fixed** | column offset | zero-filled when absent |
//! | **Variable** | column index | only present values take space |
//! | **Sparse** | path or position | type-tagged values and nested scopes |
//!
//! ## Navigation
//!
//! A [`RowCursor`] points at one element of one scope. Cursors start at the
//! root ([`RowCursor::create`]), move with [`RowCursor::move_next`] and
//! [`RowCursor::find`], and descend through scope reads. Typed access goes
//! through the field types in [`crate::layouts`].
//!
//! ## Module Structure
//!
//! - `buffer`: `RowBuffer`, byte primitives and the variable segment
//! - `cursor`: `RowCursor` and scope navigation
//! - `sparse`: sparse element metadata, sizing and insertion
//! - `unique`: sorted, duplicate-free set and map scopes
//! - `header`: the zerocopy row header
//! - `resizer`: growth policies for the backing buffer
//! - `result`: `RowError` and write options

pub mod buffer;
pub mod cursor;
pub mod header;
pub mod resizer;
pub mod result;
mod sparse;
mod unique;

#[cfg(test)]
mod tests;

pub use buffer::RowBuffer;
pub use cursor::RowCursor;
pub use header::{HybridRowHeader, HybridRowVersion};
pub use resizer::{DefaultSpanResizer, MemorySpanResizer, SpanResizer};
pub use result::{RowError, RowResult, UpdateOptions};
pub(crate) use result::RowOptions;
