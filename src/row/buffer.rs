//! # Row Buffer
//!
//! [`RowBuffer`] owns the bytes of one row and implements every primitive the
//! typed field and scope operations are built from.
//!
//! ## Byte Layout
//!
//! ```text
//! +--------+----------+--------------+-----------------+------------------+
//! | header | bitmask  | fixed values | variable values | sparse values    |
//! | 5 B    |          |              | present only    | until row length |
//! +--------+----------+--------------+-----------------+------------------+
//!          |<------ layout.size ---->|
//! ```
//!
//! The vector behind the row is always at least `length` bytes long and every
//! byte past `length` is zero. Growing is delegated to the row's
//! [`SpanResizer`]; shrinking zeroes the vacated tail but keeps the capacity.
//!
//! ## Variable Segment
//!
//! Variable columns are stored in layout order, but only the ones whose
//! presence bit is set occupy bytes. The offset of variable column `i` is found
//! by walking columns `0..i` and skipping each present one:
//!
//! ```text
//! Utf8 / Binary     [varuint len][len bytes]
//! VarInt / VarUInt  [varint]
//! ```
//!
//! Inserting, growing, shrinking or deleting a variable value moves every byte
//! after it, including the whole sparse segment.

use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use eyre::{ensure, Result, WrapErr};
use log::trace;
use zerocopy::IntoBytes;

use super::cursor::RowCursor;
use super::header::{HybridRowHeader, HybridRowVersion};
use super::resizer::{DefaultSpanResizer, SpanResizer};
use super::result::{RowError, RowResult};
use crate::config::HYBRID_ROW_HEADER_SIZE;
use crate::encoding::varint::{decode_varint, decode_varuint};
use crate::layouts::{Layout, LayoutBit, LayoutColumn, LayoutResolver, SchemaId};
use crate::types::FixedValue;

pub struct RowBuffer {
    pub(super) buffer: Vec<u8>,
    pub(super) length: usize,
    resizer: Box<dyn SpanResizer>,
    resolver: Arc<dyn LayoutResolver>,
    layout: Arc<Layout>,
}

impl fmt::Debug for RowBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowBuffer")
            .field("length", &self.length)
            .field("capacity", &self.buffer.len())
            .field("schema_id", &self.layout.schema_id())
            .finish()
    }
}

impl RowBuffer {
    /// Creates an empty row of `layout`: header, zeroed bitmask and fixed
    /// segment, no variable or sparse values.
    pub fn init_layout(
        version: HybridRowVersion,
        layout: Arc<Layout>,
        resolver: Arc<dyn LayoutResolver>,
    ) -> RowBuffer {
        Self::init_layout_with_resizer(version, layout, resolver, Box::new(DefaultSpanResizer))
    }

    pub fn init_layout_with_resizer(
        version: HybridRowVersion,
        layout: Arc<Layout>,
        resolver: Arc<dyn LayoutResolver>,
        mut resizer: Box<dyn SpanResizer>,
    ) -> RowBuffer {
        let length = HYBRID_ROW_HEADER_SIZE + layout.size();
        let mut buffer = Vec::with_capacity(resizer.initial_capacity().max(length));
        resizer.resize(length, &mut buffer);

        let header = HybridRowHeader::new(version, layout.schema_id());
        buffer[..HYBRID_ROW_HEADER_SIZE].copy_from_slice(header.as_bytes());

        trace!(
            "initialized row for schema {} ({} bytes)",
            layout.schema_id(),
            length
        );

        RowBuffer {
            buffer,
            length,
            resizer,
            resolver,
            layout,
        }
    }

    /// Takes ownership of serialized row bytes, validating the header and
    /// resolving the root layout.
    pub fn read_from(
        bytes: Vec<u8>,
        version: HybridRowVersion,
        resolver: Arc<dyn LayoutResolver>,
    ) -> RowResult<RowBuffer> {
        Self::read_from_with_resizer(bytes, version, resolver, Box::new(DefaultSpanResizer))
    }

    pub fn read_from_with_resizer(
        bytes: Vec<u8>,
        version: HybridRowVersion,
        resolver: Arc<dyn LayoutResolver>,
        resizer: Box<dyn SpanResizer>,
    ) -> RowResult<RowBuffer> {
        let header = HybridRowHeader::from_bytes(&bytes).map_err(|_| RowError::InvalidRow)?;
        let stored = header.version().map_err(|_| RowError::InvalidRow)?;
        if stored != version {
            return Err(RowError::InvalidRow);
        }

        let layout = resolver
            .resolve(header.schema_id())
            .map_err(|_| RowError::NotFound)?;
        if bytes.len() < HYBRID_ROW_HEADER_SIZE + layout.size() {
            return Err(RowError::InvalidRow);
        }

        let length = bytes.len();
        Ok(RowBuffer {
            buffer: bytes,
            length,
            resizer,
            resolver,
            layout,
        })
    }

    /// Reads exactly `length` bytes from `reader` and parses them as a row.
    pub fn read_from_reader<R: Read>(
        reader: &mut R,
        length: usize,
        version: HybridRowVersion,
        resolver: Arc<dyn LayoutResolver>,
    ) -> Result<RowBuffer> {
        ensure!(
            length >= HYBRID_ROW_HEADER_SIZE,
            "row length {} is shorter than the header",
            length
        );
        let mut bytes = vec![0u8; length];
        reader
            .read_exact(&mut bytes)
            .wrap_err_with(|| format!("failed to read {} row bytes", length))?;
        RowBuffer::read_from(bytes, version, resolver).wrap_err("failed to parse row")
    }

    /// Writes the `length` bytes of the row.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer
            .write_all(self.as_bytes())
            .wrap_err("failed to write row bytes")
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.length]
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buffer.truncate(self.length);
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn header(&self) -> Result<&HybridRowHeader> {
        HybridRowHeader::from_bytes(&self.buffer)
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn resolver(&self) -> &Arc<dyn LayoutResolver> {
        &self.resolver
    }

    /// Layout of a nested UDT.
    pub fn resolve(&self, schema_id: SchemaId) -> RowResult<Arc<Layout>> {
        if schema_id == self.layout.schema_id() {
            return Ok(Arc::clone(&self.layout));
        }
        self.resolver
            .resolve(schema_id)
            .map_err(|_| RowError::NotFound)
    }

    /// Grows the backing vector to hold at least `size` bytes.
    pub(crate) fn ensure(&mut self, size: usize) {
        if self.buffer.len() < size {
            self.resizer.resize(size, &mut self.buffer);
        }
    }

    /// Bytes from `offset` to the end of the row.
    pub(crate) fn slice_from(&self, offset: usize) -> RowResult<&[u8]> {
        self.buffer
            .get(offset..self.length)
            .ok_or(RowError::InvalidRow)
    }

    pub(crate) fn read_u8(&self, offset: usize) -> RowResult<u8> {
        self.read_fixed(offset)
    }

    pub(crate) fn read_u32(&self, offset: usize) -> RowResult<u32> {
        self.read_fixed(offset)
    }

    pub(crate) fn write_u32(&mut self, offset: usize, value: u32) {
        self.write_fixed(offset, value);
    }

    pub(crate) fn read_fixed<T: FixedValue>(&self, offset: usize) -> RowResult<T> {
        T::read_from(self.slice_from(offset)?)
    }

    pub(crate) fn write_fixed<T: FixedValue>(&mut self, offset: usize, value: T) {
        value.write_to(&mut self.buffer[offset..offset + T::SIZE]);
    }

    pub(crate) fn read_bytes(&self, offset: usize, len: usize) -> RowResult<&[u8]> {
        let end = self.checked_end(offset, len as u64)?;
        self.buffer.get(offset..end).ok_or(RowError::InvalidRow)
    }

    /// `offset + len`, provided the range fits inside the row.
    pub(crate) fn checked_end(&self, offset: usize, len: u64) -> RowResult<usize> {
        usize::try_from(len)
            .ok()
            .and_then(|len| offset.checked_add(len))
            .filter(|&end| end <= self.length)
            .ok_or(RowError::InvalidRow)
    }

    pub(crate) fn write_bytes(&mut self, offset: usize, bytes: &[u8]) {
        self.buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub(crate) fn read_varuint(&self, offset: usize) -> RowResult<(u64, usize)> {
        decode_varuint(self.slice_from(offset)?).map_err(|_| RowError::InvalidRow)
    }

    pub(crate) fn read_varint(&self, offset: usize) -> RowResult<(i64, usize)> {
        decode_varint(self.slice_from(offset)?).map_err(|_| RowError::InvalidRow)
    }

    /// Reads a presence or boolean bit of the bitmask at `base`. A column
    /// without a bit reads as set.
    pub(crate) fn read_bit(&self, base: usize, bit: LayoutBit) -> RowResult<bool> {
        if bit.is_invalid() {
            return Ok(true);
        }
        let offset = bit.offset(base);
        if offset >= self.length {
            return Err(RowError::InvalidRow);
        }
        let byte = self.buffer.get(offset).ok_or(RowError::InvalidRow)?;
        Ok(byte & (1 << bit.bit()) != 0)
    }

    pub(crate) fn set_bit(&mut self, base: usize, bit: LayoutBit) {
        if bit.is_invalid() {
            return;
        }
        if let Some(byte) = self.buffer.get_mut(bit.offset(base)) {
            *byte |= 1 << bit.bit();
        }
    }

    pub(crate) fn unset_bit(&mut self, base: usize, bit: LayoutBit) {
        if bit.is_invalid() {
            return;
        }
        if let Some(byte) = self.buffer.get_mut(bit.offset(base)) {
            *byte &= !(1 << bit.bit());
        }
    }

    pub(crate) fn write_bit(&mut self, base: usize, bit: LayoutBit, value: bool) {
        if value {
            self.set_bit(base, bit);
        } else {
            self.unset_bit(base, bit);
        }
    }

    /// Moves the bytes from `offset` to the end of the row by `shift`, growing
    /// the buffer or zeroing the vacated tail, and adjusts the row length.
    pub(crate) fn shift_tail(&mut self, offset: usize, shift: isize) {
        if shift == 0 {
            return;
        }
        let new_length = self.length.wrapping_add_signed(shift);
        if shift > 0 {
            self.ensure(new_length);
        }
        let dest = offset.wrapping_add_signed(shift);
        self.buffer.copy_within(offset..self.length, dest);
        if shift < 0 {
            self.buffer[new_length..self.length].fill(0);
        }
        self.length = new_length;
    }

    /// Offset of variable column `var_index` of `layout` in the scope whose
    /// bitmask starts at `scope_offset`. With `var_index == num_variable` this
    /// is the start of the sparse segment.
    pub(crate) fn compute_variable_value_offset(
        &self,
        layout: &Layout,
        scope_offset: usize,
        var_index: usize,
    ) -> RowResult<usize> {
        let mut offset = scope_offset + layout.size();
        let variable = &layout.columns()[layout.num_fixed()..layout.num_fixed() + var_index];
        for column in variable {
            if self.read_bit(scope_offset, column.null_bit())? {
                let (len, n) = self.read_varuint(offset)?;
                offset += n;
                if !column.layout_type().is_varint() {
                    offset = self.checked_end(offset, len)?;
                }
            }
        }
        Ok(offset)
    }

    /// Encoded size of the present variable value at `offset`.
    fn variable_size(&self, offset: usize, is_varint: bool) -> RowResult<usize> {
        let (len, n) = self.read_varuint(offset)?;
        if is_varint {
            return Ok(n);
        }
        Ok(self.checked_end(offset + n, len)? - offset)
    }

    /// Writes an encoded variable value of `num_bytes`, replacing any present
    /// value, and sets the column's presence bit.
    pub(crate) fn write_variable(
        &mut self,
        scope: &mut RowCursor,
        column: &LayoutColumn,
        num_bytes: usize,
        encode: impl FnOnce(&mut [u8]),
    ) -> RowResult<()> {
        let is_varint = column.layout_type().is_varint();
        let exists = self.read_bit(scope.start, column.null_bit())?;
        let offset = self.compute_variable_value_offset(&scope.layout, scope.start, column.offset())?;
        let space_available = if exists {
            self.variable_size(offset, is_varint)?
        } else {
            0
        };

        let shift = num_bytes as isize - space_available as isize;
        self.shift_tail(offset + space_available, shift);
        encode(&mut self.buffer[offset..offset + num_bytes]);
        self.set_bit(scope.start, column.null_bit());

        scope.meta_offset = scope.meta_offset.wrapping_add_signed(shift);
        scope.value_offset = scope.value_offset.wrapping_add_signed(shift);
        Ok(())
    }

    /// Bytes of a present Utf8 or Binary variable value.
    pub(crate) fn read_variable_bytes(
        &self,
        scope: &RowCursor,
        column: &LayoutColumn,
    ) -> RowResult<&[u8]> {
        if !self.read_bit(scope.start, column.null_bit())? {
            return Err(RowError::NotFound);
        }
        let offset = self.compute_variable_value_offset(&scope.layout, scope.start, column.offset())?;
        let (len, n) = self.read_varuint(offset)?;
        let start = offset + n;
        let end = self.checked_end(start, len)?;
        self.read_bytes(start, end - start)
    }

    /// Offset of a present VarInt or VarUInt variable value.
    pub(crate) fn variable_varint_offset(
        &self,
        scope: &RowCursor,
        column: &LayoutColumn,
    ) -> RowResult<usize> {
        if !self.read_bit(scope.start, column.null_bit())? {
            return Err(RowError::NotFound);
        }
        self.compute_variable_value_offset(&scope.layout, scope.start, column.offset())
    }

    /// Removes a variable value and clears its presence bit. Deleting an
    /// absent value is a no-op.
    pub(crate) fn delete_variable(&mut self, scope: &mut RowCursor, column: &LayoutColumn) -> RowResult<()> {
        if !self.read_bit(scope.start, column.null_bit())? {
            return Ok(());
        }
        let is_varint = column.layout_type().is_varint();
        let offset = self.compute_variable_value_offset(&scope.layout, scope.start, column.offset())?;
        let space = self.variable_size(offset, is_varint)?;

        self.shift_tail(offset + space, -(space as isize));
        self.unset_bit(scope.start, column.null_bit());

        scope.meta_offset = scope.meta_offset.wrapping_sub(space);
        scope.value_offset = scope.value_offset.wrapping_sub(space);
        Ok(())
    }

    /// Adds `delta` to the element count stored at the start of a typed
    /// collection.
    pub(crate) fn adjust_collection_count(&mut self, start: usize, delta: isize) -> RowResult<()> {
        let count = self.read_u32(start)? as isize;
        let updated = (count + delta).max(0) as u32;
        self.write_u32(start, updated);
        Ok(())
    }
}
