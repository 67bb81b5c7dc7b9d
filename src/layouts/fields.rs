//! # Typed Field Access
//!
//! Every primitive HybridRow type has a unit struct implementing
//! [`LayoutField`], which reads, writes and deletes values of that type in
//! each of the three storage segments:
//!
//! | Operation | Fixed | Variable | Sparse |
//! |-----------|-------|----------|--------|
//! | addressed by | column offset | column index | cursor position |
//! | absent value | presence bit clear | presence bit clear | no element |
//! | write | overwrite in place | resize and shift | insert, replace, shift |
//!
//! ```ignore
//! let mut cursor = RowCursor::create(&row)?;
//! cursor.find(&row, "age")?;
//! LayoutInt32.write_sparse(&mut row, &mut cursor, 42, UpdateOptions::Upsert)?;
//! assert_eq!(LayoutInt32.read_sparse(&row, &mut cursor)?, 42);
//! ```
//!
//! Fixed and variable access needs the [`LayoutColumn`] of the field, looked
//! up with [`Layout::try_find`](super::Layout::try_find). Types without a
//! representation in a segment fail with [`RowError::Failure`].

use super::column::{LayoutColumn, StorageKind};
use super::layout_type::LayoutType;
use super::type_argument::TypeArgument;
use crate::encoding::varint::{encode_varint, encode_varuint, varint_len, varuint_len};
use crate::row::{RowBuffer, RowCursor, RowError, RowResult, UpdateOptions};
use crate::types::{
    DateTime, Decimal, FixedValue, Float128, Guid, MongoDbObjectId, NullValue, UnixDateTime,
};

pub trait LayoutField {
    type Value<'a>;

    const LAYOUT_TYPE: LayoutType;

    fn type_arg(&self) -> TypeArgument {
        TypeArgument::new(Self::LAYOUT_TYPE)
    }

    fn write_fixed(
        &self,
        row: &mut RowBuffer,
        scope: &mut RowCursor,
        column: &LayoutColumn,
        value: Self::Value<'_>,
    ) -> RowResult<()>;

    fn read_fixed<'a>(
        &self,
        row: &'a RowBuffer,
        scope: &RowCursor,
        column: &LayoutColumn,
    ) -> RowResult<Self::Value<'a>>;

    /// Clears the column's presence bit. Fails with `TypeMismatch` for
    /// columns that are not nullable.
    fn delete_fixed(
        &self,
        row: &mut RowBuffer,
        scope: &mut RowCursor,
        column: &LayoutColumn,
    ) -> RowResult<()> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Fixed)?;
        if scope.immutable {
            return Err(RowError::InsufficientPermissions);
        }
        if column.null_bit().is_invalid() {
            return Err(RowError::TypeMismatch);
        }
        row.unset_bit(scope.start, column.null_bit());
        Ok(())
    }

    fn write_variable(
        &self,
        _row: &mut RowBuffer,
        _scope: &mut RowCursor,
        _column: &LayoutColumn,
        _value: Self::Value<'_>,
    ) -> RowResult<()> {
        Err(RowError::Failure)
    }

    fn read_variable<'a>(
        &self,
        _row: &'a RowBuffer,
        _scope: &RowCursor,
        _column: &LayoutColumn,
    ) -> RowResult<Self::Value<'a>> {
        Err(RowError::Failure)
    }

    fn delete_variable(
        &self,
        row: &mut RowBuffer,
        scope: &mut RowCursor,
        column: &LayoutColumn,
    ) -> RowResult<()> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Variable)?;
        if scope.immutable {
            return Err(RowError::InsufficientPermissions);
        }
        row.delete_variable(scope, column)
    }

    fn write_sparse(
        &self,
        row: &mut RowBuffer,
        edit: &mut RowCursor,
        value: Self::Value<'_>,
        options: UpdateOptions,
    ) -> RowResult<()>;

    fn read_sparse<'a>(&self, row: &'a RowBuffer, edit: &mut RowCursor) -> RowResult<Self::Value<'a>>;

    /// Deletes the element under the cursor. Deleting an absent element is a
    /// no-op.
    fn delete_sparse(&self, row: &mut RowBuffer, edit: &mut RowCursor) -> RowResult<()> {
        row.prepare_sparse_delete(edit, Self::LAYOUT_TYPE)?;
        row.delete_sparse(edit)
    }
}

fn check_column(
    scope: &RowCursor,
    column: &LayoutColumn,
    expected: LayoutType,
    storage: StorageKind,
) -> RowResult<()> {
    if !scope.scope_type.is_udt() || column.layout_type() != expected || column.storage() != storage {
        return Err(RowError::TypeMismatch);
    }
    // The column has to come from the layout the scope was read with.
    let owned = scope.layout.columns().get(column.index()).is_some_and(|own| {
        own.full_path() == column.full_path()
            && own.layout_type() == column.layout_type()
            && own.storage() == column.storage()
            && own.offset() == column.offset()
    });
    if !owned {
        return Err(RowError::TypeMismatch);
    }
    Ok(())
}

fn check_writable(scope: &RowCursor) -> RowResult<()> {
    if scope.immutable {
        return Err(RowError::InsufficientPermissions);
    }
    Ok(())
}

macro_rules! fixed_field {
    ($($(#[$doc:meta])* $name:ident => $value:ty, $layout:ident;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl LayoutField for $name {
                type Value<'a> = $value;

                const LAYOUT_TYPE: LayoutType = LayoutType::$layout;

                fn write_fixed(
                    &self,
                    row: &mut RowBuffer,
                    scope: &mut RowCursor,
                    column: &LayoutColumn,
                    value: $value,
                ) -> RowResult<()> {
                    check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Fixed)?;
                    check_writable(scope)?;
                    row.write_fixed(scope.start + column.offset(), value);
                    row.set_bit(scope.start, column.null_bit());
                    Ok(())
                }

                fn read_fixed<'a>(
                    &self,
                    row: &'a RowBuffer,
                    scope: &RowCursor,
                    column: &LayoutColumn,
                ) -> RowResult<$value> {
                    check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Fixed)?;
                    if !row.read_bit(scope.start, column.null_bit())? {
                        return Err(RowError::NotFound);
                    }
                    row.read_fixed(scope.start + column.offset())
                }

                fn write_sparse(
                    &self,
                    row: &mut RowBuffer,
                    edit: &mut RowCursor,
                    value: $value,
                    options: UpdateOptions,
                ) -> RowResult<()> {
                    row.prepare_sparse_write(edit, &self.type_arg(), options)?;
                    row.write_sparse_value(edit, Self::LAYOUT_TYPE, <$value as FixedValue>::SIZE, options, |buf| {
                        value.write_to(buf)
                    })
                }

                fn read_sparse<'a>(&self, row: &'a RowBuffer, edit: &mut RowCursor) -> RowResult<$value> {
                    row.prepare_sparse_read(edit, Self::LAYOUT_TYPE)?;
                    row.read_sparse_fixed(edit)
                }
            }
        )*
    };
}

fixed_field! {
    LayoutInt8 => i8, Int8;
    LayoutInt16 => i16, Int16;
    LayoutInt32 => i32, Int32;
    LayoutInt64 => i64, Int64;
    LayoutUInt8 => u8, UInt8;
    LayoutUInt16 => u16, UInt16;
    LayoutUInt32 => u32, UInt32;
    LayoutUInt64 => u64, UInt64;
    LayoutFloat32 => f32, Float32;
    LayoutFloat64 => f64, Float64;
    LayoutFloat128 => Float128, Float128;
    LayoutDecimal => Decimal, Decimal;
    /// 100ns ticks since 0001-01-01.
    LayoutDateTime => DateTime, DateTime;
    /// Milliseconds since the Unix epoch.
    LayoutUnixDateTime => UnixDateTime, UnixDateTime;
    LayoutGuid => Guid, Guid;
    LayoutMongoDbObjectId => MongoDbObjectId, MongoDbObjectId;
}

/// The `null` type. A fixed null column is just a presence bit; a sparse null
/// element is its type code and path.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutNull;

impl LayoutField for LayoutNull {
    type Value<'a> = NullValue;

    const LAYOUT_TYPE: LayoutType = LayoutType::Null;

    fn write_fixed(
        &self,
        row: &mut RowBuffer,
        scope: &mut RowCursor,
        column: &LayoutColumn,
        _value: NullValue,
    ) -> RowResult<()> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Fixed)?;
        check_writable(scope)?;
        row.set_bit(scope.start, column.null_bit());
        Ok(())
    }

    fn read_fixed<'a>(&self, row: &'a RowBuffer, scope: &RowCursor, column: &LayoutColumn) -> RowResult<NullValue> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Fixed)?;
        if !row.read_bit(scope.start, column.null_bit())? {
            return Err(RowError::NotFound);
        }
        Ok(NullValue)
    }

    fn write_sparse(
        &self,
        row: &mut RowBuffer,
        edit: &mut RowCursor,
        _value: NullValue,
        options: UpdateOptions,
    ) -> RowResult<()> {
        row.prepare_sparse_write(edit, &self.type_arg(), options)?;
        row.write_sparse_value(edit, Self::LAYOUT_TYPE, 0, options, |_| {})
    }

    fn read_sparse<'a>(&self, row: &'a RowBuffer, edit: &mut RowCursor) -> RowResult<NullValue> {
        row.prepare_sparse_read(edit, Self::LAYOUT_TYPE)?;
        edit.end_offset = edit.value_offset;
        Ok(NullValue)
    }
}

/// Booleans live in the layout's bitmask when fixed, and in the type code
/// itself when sparse.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutBoolean;

impl LayoutField for LayoutBoolean {
    type Value<'a> = bool;

    const LAYOUT_TYPE: LayoutType = LayoutType::Boolean;

    fn write_fixed(
        &self,
        row: &mut RowBuffer,
        scope: &mut RowCursor,
        column: &LayoutColumn,
        value: bool,
    ) -> RowResult<()> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Fixed)?;
        check_writable(scope)?;
        row.write_bit(scope.start, column.bool_bit(), value);
        row.set_bit(scope.start, column.null_bit());
        Ok(())
    }

    fn read_fixed<'a>(&self, row: &'a RowBuffer, scope: &RowCursor, column: &LayoutColumn) -> RowResult<bool> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Fixed)?;
        if !row.read_bit(scope.start, column.null_bit())? {
            return Err(RowError::NotFound);
        }
        row.read_bit(scope.start, column.bool_bit())
    }

    fn delete_fixed(&self, row: &mut RowBuffer, scope: &mut RowCursor, column: &LayoutColumn) -> RowResult<()> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Fixed)?;
        check_writable(scope)?;
        if column.null_bit().is_invalid() {
            return Err(RowError::TypeMismatch);
        }
        row.unset_bit(scope.start, column.bool_bit());
        row.unset_bit(scope.start, column.null_bit());
        Ok(())
    }

    fn write_sparse(
        &self,
        row: &mut RowBuffer,
        edit: &mut RowCursor,
        value: bool,
        options: UpdateOptions,
    ) -> RowResult<()> {
        row.prepare_sparse_write(edit, &self.type_arg(), options)?;
        row.write_sparse_bool(edit, value, options)
    }

    fn read_sparse<'a>(&self, row: &'a RowBuffer, edit: &mut RowCursor) -> RowResult<bool> {
        row.prepare_sparse_read(edit, Self::LAYOUT_TYPE)?;
        row.read_sparse_bool(edit)
    }
}

/// Writes `[varuint len][bytes]` into a variable column.
fn write_variable_bytes(
    row: &mut RowBuffer,
    scope: &mut RowCursor,
    column: &LayoutColumn,
    expected: LayoutType,
    bytes: &[u8],
) -> RowResult<()> {
    check_column(scope, column, expected, StorageKind::Variable)?;
    check_writable(scope)?;
    if column.size() > 0 && bytes.len() > column.size() {
        return Err(RowError::TooBig);
    }
    let num_bytes = varuint_len(bytes.len() as u64) + bytes.len();
    row.write_variable(scope, column, num_bytes, |buf| {
        let n = encode_varuint(bytes.len() as u64, buf);
        buf[n..].copy_from_slice(bytes);
    })
}

/// Writes exactly `column.size()` bytes into a fixed column.
fn write_fixed_bytes(
    row: &mut RowBuffer,
    scope: &mut RowCursor,
    column: &LayoutColumn,
    expected: LayoutType,
    bytes: &[u8],
) -> RowResult<()> {
    check_column(scope, column, expected, StorageKind::Fixed)?;
    check_writable(scope)?;
    if bytes.len() > column.size() {
        return Err(RowError::TooBig);
    }
    if bytes.len() < column.size() {
        return Err(RowError::TypeConstraint);
    }
    row.write_bytes(scope.start + column.offset(), bytes);
    row.set_bit(scope.start, column.null_bit());
    Ok(())
}

fn read_fixed_bytes<'a>(
    row: &'a RowBuffer,
    scope: &RowCursor,
    column: &LayoutColumn,
    expected: LayoutType,
) -> RowResult<&'a [u8]> {
    check_column(scope, column, expected, StorageKind::Fixed)?;
    if !row.read_bit(scope.start, column.null_bit())? {
        return Err(RowError::NotFound);
    }
    row.read_bytes(scope.start + column.offset(), column.size())
}

fn write_sparse_bytes(
    row: &mut RowBuffer,
    edit: &mut RowCursor,
    type_arg: &TypeArgument,
    bytes: &[u8],
    options: UpdateOptions,
) -> RowResult<()> {
    row.prepare_sparse_write(edit, type_arg, options)?;
    let num_bytes = varuint_len(bytes.len() as u64) + bytes.len();
    row.write_sparse_value(edit, type_arg.layout_type(), num_bytes, options, |buf| {
        let n = encode_varuint(bytes.len() as u64, buf);
        buf[n..].copy_from_slice(bytes);
    })
}

fn to_str(bytes: &[u8]) -> RowResult<&str> {
    std::str::from_utf8(bytes).map_err(|_| RowError::InvalidRow)
}

/// UTF-8 text. Fixed columns hold exactly their declared byte length.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutUtf8;

impl LayoutField for LayoutUtf8 {
    type Value<'a> = &'a str;

    const LAYOUT_TYPE: LayoutType = LayoutType::Utf8;

    fn write_fixed(
        &self,
        row: &mut RowBuffer,
        scope: &mut RowCursor,
        column: &LayoutColumn,
        value: &str,
    ) -> RowResult<()> {
        write_fixed_bytes(row, scope, column, Self::LAYOUT_TYPE, value.as_bytes())
    }

    fn read_fixed<'a>(&self, row: &'a RowBuffer, scope: &RowCursor, column: &LayoutColumn) -> RowResult<&'a str> {
        to_str(read_fixed_bytes(row, scope, column, Self::LAYOUT_TYPE)?)
    }

    fn write_variable(
        &self,
        row: &mut RowBuffer,
        scope: &mut RowCursor,
        column: &LayoutColumn,
        value: &str,
    ) -> RowResult<()> {
        write_variable_bytes(row, scope, column, Self::LAYOUT_TYPE, value.as_bytes())
    }

    fn read_variable<'a>(&self, row: &'a RowBuffer, scope: &RowCursor, column: &LayoutColumn) -> RowResult<&'a str> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Variable)?;
        to_str(row.read_variable_bytes(scope, column)?)
    }

    fn write_sparse(
        &self,
        row: &mut RowBuffer,
        edit: &mut RowCursor,
        value: &str,
        options: UpdateOptions,
    ) -> RowResult<()> {
        write_sparse_bytes(row, edit, &self.type_arg(), value.as_bytes(), options)
    }

    fn read_sparse<'a>(&self, row: &'a RowBuffer, edit: &mut RowCursor) -> RowResult<&'a str> {
        row.prepare_sparse_read(edit, Self::LAYOUT_TYPE)?;
        to_str(row.read_sparse_bytes(edit)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutBinary;

impl LayoutField for LayoutBinary {
    type Value<'a> = &'a [u8];

    const LAYOUT_TYPE: LayoutType = LayoutType::Binary;

    fn write_fixed(
        &self,
        row: &mut RowBuffer,
        scope: &mut RowCursor,
        column: &LayoutColumn,
        value: &[u8],
    ) -> RowResult<()> {
        write_fixed_bytes(row, scope, column, Self::LAYOUT_TYPE, value)
    }

    fn read_fixed<'a>(&self, row: &'a RowBuffer, scope: &RowCursor, column: &LayoutColumn) -> RowResult<&'a [u8]> {
        read_fixed_bytes(row, scope, column, Self::LAYOUT_TYPE)
    }

    fn write_variable(
        &self,
        row: &mut RowBuffer,
        scope: &mut RowCursor,
        column: &LayoutColumn,
        value: &[u8],
    ) -> RowResult<()> {
        write_variable_bytes(row, scope, column, Self::LAYOUT_TYPE, value)
    }

    fn read_variable<'a>(&self, row: &'a RowBuffer, scope: &RowCursor, column: &LayoutColumn) -> RowResult<&'a [u8]> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Variable)?;
        row.read_variable_bytes(scope, column)
    }

    fn write_sparse(
        &self,
        row: &mut RowBuffer,
        edit: &mut RowCursor,
        value: &[u8],
        options: UpdateOptions,
    ) -> RowResult<()> {
        write_sparse_bytes(row, edit, &self.type_arg(), value, options)
    }

    fn read_sparse<'a>(&self, row: &'a RowBuffer, edit: &mut RowCursor) -> RowResult<&'a [u8]> {
        row.prepare_sparse_read(edit, Self::LAYOUT_TYPE)?;
        row.read_sparse_bytes(edit)
    }
}

/// Zig-zag encoded signed varint. Not available in the fixed segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutVarInt;

impl LayoutField for LayoutVarInt {
    type Value<'a> = i64;

    const LAYOUT_TYPE: LayoutType = LayoutType::VarInt;

    fn write_fixed(&self, _: &mut RowBuffer, _: &mut RowCursor, _: &LayoutColumn, _: i64) -> RowResult<()> {
        Err(RowError::Failure)
    }

    fn read_fixed<'a>(&self, _: &'a RowBuffer, _: &RowCursor, _: &LayoutColumn) -> RowResult<i64> {
        Err(RowError::Failure)
    }

    fn delete_fixed(&self, _: &mut RowBuffer, _: &mut RowCursor, _: &LayoutColumn) -> RowResult<()> {
        Err(RowError::Failure)
    }

    fn write_variable(
        &self,
        row: &mut RowBuffer,
        scope: &mut RowCursor,
        column: &LayoutColumn,
        value: i64,
    ) -> RowResult<()> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Variable)?;
        check_writable(scope)?;
        row.write_variable(scope, column, varint_len(value), |buf| {
            encode_varint(value, buf);
        })
    }

    fn read_variable<'a>(&self, row: &'a RowBuffer, scope: &RowCursor, column: &LayoutColumn) -> RowResult<i64> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Variable)?;
        let offset = row.variable_varint_offset(scope, column)?;
        Ok(row.read_varint(offset)?.0)
    }

    fn write_sparse(
        &self,
        row: &mut RowBuffer,
        edit: &mut RowCursor,
        value: i64,
        options: UpdateOptions,
    ) -> RowResult<()> {
        row.prepare_sparse_write(edit, &self.type_arg(), options)?;
        row.write_sparse_value(edit, Self::LAYOUT_TYPE, varint_len(value), options, |buf| {
            encode_varint(value, buf);
        })
    }

    fn read_sparse<'a>(&self, row: &'a RowBuffer, edit: &mut RowCursor) -> RowResult<i64> {
        row.prepare_sparse_read(edit, Self::LAYOUT_TYPE)?;
        row.read_sparse_varint(edit)
    }
}

/// Unsigned varint. Not available in the fixed segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutVarUInt;

impl LayoutField for LayoutVarUInt {
    type Value<'a> = u64;

    const LAYOUT_TYPE: LayoutType = LayoutType::VarUInt;

    fn write_fixed(&self, _: &mut RowBuffer, _: &mut RowCursor, _: &LayoutColumn, _: u64) -> RowResult<()> {
        Err(RowError::Failure)
    }

    fn read_fixed<'a>(&self, _: &'a RowBuffer, _: &RowCursor, _: &LayoutColumn) -> RowResult<u64> {
        Err(RowError::Failure)
    }

    fn delete_fixed(&self, _: &mut RowBuffer, _: &mut RowCursor, _: &LayoutColumn) -> RowResult<()> {
        Err(RowError::Failure)
    }

    fn write_variable(
        &self,
        row: &mut RowBuffer,
        scope: &mut RowCursor,
        column: &LayoutColumn,
        value: u64,
    ) -> RowResult<()> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Variable)?;
        check_writable(scope)?;
        row.write_variable(scope, column, varuint_len(value), |buf| {
            encode_varuint(value, buf);
        })
    }

    fn read_variable<'a>(&self, row: &'a RowBuffer, scope: &RowCursor, column: &LayoutColumn) -> RowResult<u64> {
        check_column(scope, column, Self::LAYOUT_TYPE, StorageKind::Variable)?;
        let offset = row.variable_varint_offset(scope, column)?;
        Ok(row.read_varuint(offset)?.0)
    }

    fn write_sparse(
        &self,
        row: &mut RowBuffer,
        edit: &mut RowCursor,
        value: u64,
        options: UpdateOptions,
    ) -> RowResult<()> {
        row.prepare_sparse_write(edit, &self.type_arg(), options)?;
        row.write_sparse_value(edit, Self::LAYOUT_TYPE, varuint_len(value), options, |buf| {
            encode_varuint(value, buf);
        })
    }

    fn read_sparse<'a>(&self, row: &'a RowBuffer, edit: &mut RowCursor) -> RowResult<u64> {
        row.prepare_sparse_read(edit, Self::LAYOUT_TYPE)?;
        row.read_sparse_varuint(edit)
    }
}
