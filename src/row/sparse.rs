//! # Sparse Values
//!
//! Sparse values are self-describing. Each one is stored as
//!
//! ```text
//! [type code + type arguments]   omitted when the scope implies the type
//! [path]                         omitted in indexed scopes
//! [value]
//! ```
//!
//! A path is a varuint token. Tokens below the layout tokenizer's count name a
//! tokenized path; a larger token `t` is followed by `t - count` bytes of UTF-8
//! holding a literal path.
//!
//! ## Scope Extents
//!
//! | Scope | Encoded as |
//! |-------|------------|
//! | Object, Array, UDT | elements, then an `EndScope` code |
//! | TypedArray, TypedSet, TypedMap | u32 count, then elements |
//! | Tuple | elements (one per position), then `EndScope` |
//! | TypedTuple, Tagged, Tagged2 | one element per type argument |
//! | Nullable | has-value byte, then the inner value |
//! | UDT | the UDT's own bitmask, fixed and variable segments, then sparse elements |
//!
//! Every structural edit goes through [`RowBuffer::ensure_sparse`], which makes
//! room for (or removes) one element, keeps the element count of sized scopes
//! in step, and updates the cursor's cell type.

use std::sync::Arc;

use super::buffer::RowBuffer;
use super::cursor::{RowCursor, WritePath};
use super::result::{RowError, RowOptions, RowResult, UpdateOptions};
use crate::config::{LAYOUT_CODE_SIZE, NULLABLE_HAS_VALUE_SIZE, TYPED_COLLECTION_COUNT_SIZE};
use crate::encoding::varint::{encode_varuint, varuint_len};
use crate::layouts::{
    LayoutCode, LayoutScope, LayoutType, ScopeKind, TypeArgument, TypeArgumentList,
};
use crate::types::FixedValue;

/// Space claimed for one sparse element by [`RowBuffer::ensure_sparse`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct SparseSpace {
    pub meta_bytes: usize,
    pub shift: isize,
}

impl RowBuffer {
    pub(crate) fn sparse_iterator_move_next(&self, edit: &mut RowCursor) -> RowResult<bool> {
        match edit.cell_type {
            Some(LayoutType::EndScope) => return Ok(false),
            Some(_) => {
                if edit.scope_type.is_indexed_scope() {
                    edit.index += 1;
                }
                if edit.end_offset != 0 {
                    edit.meta_offset = edit.end_offset;
                    edit.end_offset = 0;
                } else {
                    edit.meta_offset += self.sparse_compute_size(edit)?;
                }
            }
            None => {}
        }

        if edit.meta_offset < self.length
            && (!edit.scope_type.is_sized_scope() || edit.index != edit.count)
        {
            self.read_sparse_metadata(edit)?;
            if edit.cell_type != Some(LayoutType::EndScope) {
                edit.exists = true;
                return Ok(true);
            }
        }

        edit.cell_type = Some(LayoutType::EndScope);
        edit.cell_type_args = TypeArgumentList::EMPTY;
        edit.exists = false;
        edit.value_offset = edit.meta_offset;
        Ok(false)
    }

    /// Decodes the type and path of the element at `edit.meta_offset`.
    pub(crate) fn read_sparse_metadata(&self, edit: &mut RowCursor) -> RowResult<()> {
        let scope = edit.scope_type;
        if scope.has_implicit_type_code(edit) {
            scope.set_implicit_type_code(edit);
            edit.value_offset = edit.meta_offset;
        } else {
            let cell_type = LayoutType::from_byte(self.read_u8(edit.meta_offset)?)?;
            edit.cell_type = Some(cell_type);
            edit.value_offset = edit.meta_offset + LAYOUT_CODE_SIZE;
            if cell_type == LayoutType::EndScope {
                edit.cell_type_args = TypeArgumentList::EMPTY;
                edit.path_token = 0;
                edit.path_offset = 0;
                edit.value_offset = edit.meta_offset;
                return Ok(());
            }
            let (args, len) = cell_type.read_type_argument_list(self.slice_from(edit.value_offset)?)?;
            edit.cell_type_args = args;
            edit.value_offset += len;
        }
        self.read_sparse_path(edit)
    }

    fn read_sparse_path(&self, edit: &mut RowCursor) -> RowResult<()> {
        if edit.scope_type.is_indexed_scope() {
            edit.path_token = 0;
            edit.path_offset = 0;
            return Ok(());
        }

        let (token, n) = self.read_varuint(edit.value_offset)?;
        let token = token as usize;
        let count = edit.layout.tokenizer().count();
        edit.path_token = token;
        if token < count {
            edit.path_offset = edit.value_offset;
            edit.value_offset += n;
        } else {
            edit.path_offset = edit.value_offset + n;
            edit.value_offset = self.checked_end(edit.path_offset, (token - count) as u64)?;
        }
        Ok(())
    }

    /// Whether the literal path of the current element equals `path`.
    pub(crate) fn sparse_path_equals(&self, edit: &RowCursor, path: &str) -> RowResult<bool> {
        let count = edit.layout.tokenizer().count();
        if edit.path_token < count || edit.path_token - count != path.len() {
            return Ok(false);
        }
        Ok(self.read_bytes(edit.path_offset, path.len())? == path.as_bytes())
    }

    /// Total encoded size of the element under `edit`, metadata included.
    pub(crate) fn sparse_compute_size(&self, edit: &RowCursor) -> RowResult<usize> {
        let cell_type = edit.cell_type.ok_or(RowError::Failure)?;
        match cell_type {
            LayoutType::Scope(_) => {
                let mut child = self.sparse_iterator_read_scope(edit, true)?;
                let end = self.skip_scope(&mut child)?;
                Ok(end - edit.meta_offset)
            }
            _ => {
                let meta_bytes = edit.value_offset - edit.meta_offset;
                Ok(meta_bytes + self.sparse_value_size(cell_type, edit.value_offset)?)
            }
        }
    }

    fn sparse_value_size(&self, cell_type: LayoutType, value_offset: usize) -> RowResult<usize> {
        Ok(match cell_type {
            LayoutType::Null | LayoutType::Boolean => 0,
            LayoutType::Utf8 | LayoutType::Binary => {
                let (len, n) = self.read_varuint(value_offset)?;
                self.checked_end(value_offset + n, len)? - value_offset
            }
            LayoutType::VarInt | LayoutType::VarUInt => self.read_varuint(value_offset)?.1,
            LayoutType::EndScope | LayoutType::Scope(_) => return Err(RowError::Failure),
            fixed => fixed.size(),
        })
    }

    /// Iterates `edit` to the end of its scope and returns the offset just
    /// past the scope.
    fn skip_scope(&self, edit: &mut RowCursor) -> RowResult<usize> {
        while self.sparse_iterator_move_next(edit)? {}
        if !edit.scope_type.is_sized_scope() {
            edit.meta_offset += LAYOUT_CODE_SIZE;
        }
        Ok(edit.meta_offset)
    }

    /// Child cursor over the scope stored in the element under `edit`.
    pub(crate) fn sparse_iterator_read_scope(
        &self,
        edit: &RowCursor,
        immutable: bool,
    ) -> RowResult<RowCursor> {
        let scope = edit
            .cell_type
            .and_then(LayoutType::as_scope)
            .ok_or(RowError::TypeMismatch)?;
        let value = edit.value_offset;
        let mut child = RowCursor::scope(
            Arc::clone(&edit.layout),
            scope,
            edit.cell_type_args.clone(),
            value,
        );
        child.immutable = immutable;

        match scope.kind {
            ScopeKind::Object | ScopeKind::Array => {}
            ScopeKind::TypedArray | ScopeKind::TypedSet | ScopeKind::TypedMap => {
                child.meta_offset = value + TYPED_COLLECTION_COUNT_SIZE;
                child.count = self.read_u32(value)? as usize;
            }
            ScopeKind::Tuple | ScopeKind::TypedTuple | ScopeKind::Tagged | ScopeKind::Tagged2 => {
                child.count = edit.cell_type_args.len();
            }
            ScopeKind::Nullable => {
                let has_value = self.read_u8(value)? != 0;
                if has_value {
                    child.meta_offset = value + NULLABLE_HAS_VALUE_SIZE;
                    child.count = 2;
                    child.index = 1;
                } else {
                    let inner = edit.cell_type_args.get(0).ok_or(RowError::InvalidRow)?;
                    child.meta_offset = value + NULLABLE_HAS_VALUE_SIZE + self.count_default_value(inner)?;
                    child.count = 2;
                    child.index = 2;
                }
            }
            ScopeKind::Udt => {
                let udt = self.resolve(edit.cell_type_args.schema_id())?;
                self.checked_end(value, udt.size() as u64)?;
                child.meta_offset = self.compute_variable_value_offset(&udt, value, udt.num_variable())?;
                child.layout = udt;
            }
        }
        child.value_offset = child.meta_offset;
        Ok(child)
    }

    /// Bytes the type code, type arguments and path of a new element take.
    fn count_sparse_metadata(
        &self,
        edit: &mut RowCursor,
        cell_type: LayoutType,
        type_args: &TypeArgumentList,
    ) -> RowResult<usize> {
        let scope = edit.scope_type;
        let mut meta_bytes = if scope.has_implicit_type_code(edit) {
            0
        } else {
            cell_type.count_type_argument(type_args)
        };
        if !scope.is_indexed_scope() {
            meta_bytes += self.count_sparse_path(edit)?;
        }
        Ok(meta_bytes)
    }

    fn count_sparse_path(&self, edit: &mut RowCursor) -> RowResult<usize> {
        let layout = Arc::clone(&edit.layout);
        let tokenizer = layout.tokenizer();
        match &edit.write_path {
            WritePath::Token(token) => Ok(token.varint().len()),
            WritePath::Literal(path) => match tokenizer.try_find_token(path) {
                Some(token) => {
                    let len = token.varint().len();
                    edit.write_path = WritePath::Token(token.clone());
                    Ok(len)
                }
                None => Ok(varuint_len((tokenizer.count() + path.len()) as u64) + path.len()),
            },
            WritePath::None => Err(RowError::Failure),
        }
    }

    /// Makes room for one element of `num_bytes` value bytes at the cursor,
    /// replacing the element there if it exists, or removes it when `options`
    /// is `Delete`. Adjusts the element count of sized scopes and the row
    /// length.
    pub(crate) fn ensure_sparse(
        &mut self,
        edit: &mut RowCursor,
        cell_type: LayoutType,
        type_args: &TypeArgumentList,
        num_bytes: usize,
        options: RowOptions,
    ) -> RowResult<SparseSpace> {
        let meta_offset = edit.meta_offset;
        let meta_bytes = if options == RowOptions::Delete {
            0
        } else {
            self.count_sparse_metadata(edit, cell_type, type_args)?
        };
        let space_available = if edit.exists {
            self.sparse_compute_size(edit)?
        } else {
            0
        };
        let space_needed = if options == RowOptions::Delete {
            0
        } else {
            meta_bytes + num_bytes
        };

        let shift = space_needed as isize - space_available as isize;
        self.shift_tail(meta_offset + space_available, shift);

        let scope = edit.scope_type;
        if scope.is_sized_scope() && !scope.is_fixed_arity() {
            let delta = match options {
                RowOptions::Insert | RowOptions::InsertAt => 1,
                RowOptions::Upsert if !edit.exists => 1,
                RowOptions::Delete if edit.exists => -1,
                _ => 0,
            };
            if delta != 0 {
                self.adjust_collection_count(edit.start, delta)?;
                edit.count = edit.count.wrapping_add_signed(delta);
            }
        }

        if options == RowOptions::Delete {
            edit.cell_type = None;
            edit.cell_type_args = TypeArgumentList::EMPTY;
            edit.exists = false;
        } else {
            edit.cell_type = Some(cell_type);
            edit.cell_type_args = type_args.clone();
            edit.exists = true;
        }
        edit.end_offset = 0;

        Ok(SparseSpace { meta_bytes, shift })
    }

    /// Writes the type code, type arguments and path of the element at the
    /// cursor and points `value_offset` past them.
    pub(crate) fn write_sparse_metadata(
        &mut self,
        edit: &mut RowCursor,
        cell_type: LayoutType,
        type_args: &TypeArgumentList,
        meta_bytes: usize,
    ) {
        let mut offset = edit.meta_offset;
        let scope = edit.scope_type;
        if !scope.has_implicit_type_code(edit) {
            offset += cell_type.write_type_argument(&mut self.buffer[offset..], type_args);
        }
        self.write_sparse_path(edit, offset);
        edit.value_offset = edit.meta_offset + meta_bytes;
    }

    fn write_sparse_path(&mut self, edit: &mut RowCursor, offset: usize) {
        if edit.scope_type.is_indexed_scope() {
            edit.path_token = 0;
            edit.path_offset = 0;
            return;
        }

        match &edit.write_path {
            WritePath::Token(token) => {
                let varint = token.varint();
                self.buffer[offset..offset + varint.len()].copy_from_slice(varint);
                edit.path_token = token.id() as usize;
                edit.path_offset = offset;
            }
            WritePath::Literal(path) => {
                let token = edit.layout.tokenizer().count() + path.len();
                let n = encode_varuint(token as u64, &mut self.buffer[offset..]);
                self.buffer[offset + n..offset + n + path.len()].copy_from_slice(path.as_bytes());
                edit.path_token = token;
                edit.path_offset = offset + n;
            }
            WritePath::None => {}
        }
    }

    /// Validates a sparse write of a value of type `type_arg` at the cursor.
    pub(crate) fn prepare_sparse_write(
        &self,
        edit: &mut RowCursor,
        type_arg: &TypeArgument,
        options: UpdateOptions,
    ) -> RowResult<()> {
        let scope = edit.scope_type;
        if edit.immutable || (scope.is_unique_scope() && !edit.defer_unique_index) {
            return Err(RowError::InsufficientPermissions);
        }

        if scope.is_fixed_arity() && scope.kind != ScopeKind::Nullable {
            if let Some(expected) = edit.scope_type_args.get(edit.index) {
                if type_arg != expected {
                    return Err(RowError::TypeConstraint);
                }
            }
        } else if scope.kind == ScopeKind::TypedMap {
            let is_tuple = matches!(
                type_arg.layout_type().as_scope(),
                Some(LayoutScope { kind: ScopeKind::TypedTuple, .. })
            );
            if !is_tuple || type_arg.type_args() != &edit.scope_type_args {
                return Err(RowError::TypeConstraint);
            }
        } else if scope.is_typed_scope() && edit.scope_type_args.get(0) != Some(type_arg) {
            return Err(RowError::TypeConstraint);
        }

        if options == UpdateOptions::InsertAt {
            if scope.is_fixed_arity() {
                return Err(RowError::TypeConstraint);
            }
            edit.exists = false;
        }

        if options == UpdateOptions::Update && !edit.exists {
            return Err(RowError::NotFound);
        }
        if options == UpdateOptions::Insert && edit.exists {
            return Err(RowError::Exists);
        }

        if !scope.is_indexed_scope() && matches!(edit.write_path, WritePath::None) {
            if !edit.exists {
                return Err(RowError::Failure);
            }
            edit.write_path = self.stored_write_path(edit)?;
        }
        Ok(())
    }

    /// Path of the existing element under the cursor, reused when a field
    /// reached by iteration is overwritten.
    fn stored_write_path(&self, edit: &RowCursor) -> RowResult<WritePath> {
        let tokenizer = edit.layout.tokenizer();
        if edit.path_token < tokenizer.count() {
            let path = tokenizer
                .try_find_string(edit.path_token as u64)
                .ok_or(RowError::InvalidRow)?;
            let token = tokenizer.try_find_token(path).ok_or(RowError::InvalidRow)?;
            return Ok(WritePath::Token(token.clone()));
        }
        let len = edit.path_token - tokenizer.count();
        let bytes = self.read_bytes(edit.path_offset, len)?;
        let path = std::str::from_utf8(bytes).map_err(|_| RowError::InvalidRow)?;
        Ok(WritePath::Literal(Arc::from(path)))
    }

    pub(crate) fn prepare_sparse_read(&self, edit: &RowCursor, expected: LayoutType) -> RowResult<()> {
        if !edit.exists {
            return Err(RowError::NotFound);
        }
        if edit.cell_type != Some(expected) {
            return Err(RowError::TypeMismatch);
        }
        Ok(())
    }

    pub(crate) fn prepare_sparse_delete(&self, edit: &RowCursor, expected: LayoutType) -> RowResult<()> {
        if edit.scope_type.is_fixed_arity() {
            return Err(RowError::TypeConstraint);
        }
        if edit.immutable {
            return Err(RowError::InsufficientPermissions);
        }
        if edit.exists && edit.cell_type != Some(expected) {
            return Err(RowError::TypeMismatch);
        }
        Ok(())
    }

    /// Removes the element under the cursor, if any.
    pub(crate) fn delete_sparse(&mut self, edit: &mut RowCursor) -> RowResult<()> {
        if !edit.exists {
            return Ok(());
        }
        let cell_type = edit.cell_type.ok_or(RowError::Failure)?;
        let args = edit.cell_type_args.clone();
        self.ensure_sparse(edit, cell_type, &args, 0, RowOptions::Delete)?;
        Ok(())
    }

    /// Writes a primitive element whose value is `num_bytes` long; `encode`
    /// fills the value bytes.
    pub(crate) fn write_sparse_value(
        &mut self,
        edit: &mut RowCursor,
        cell_type: LayoutType,
        num_bytes: usize,
        options: UpdateOptions,
        encode: impl FnOnce(&mut [u8]),
    ) -> RowResult<()> {
        let args = TypeArgumentList::EMPTY;
        let space = self.ensure_sparse(edit, cell_type, &args, num_bytes, options.into())?;
        self.write_sparse_metadata(edit, cell_type, &args, space.meta_bytes);
        let start = edit.value_offset;
        encode(&mut self.buffer[start..start + num_bytes]);
        Ok(())
    }

    pub(crate) fn write_sparse_bool(
        &mut self,
        edit: &mut RowCursor,
        value: bool,
        options: UpdateOptions,
    ) -> RowResult<()> {
        self.write_sparse_value(edit, LayoutType::Boolean, 0, options, |_| {})?;
        if !value {
            self.buffer[edit.meta_offset] = LayoutCode::BooleanFalse as u8;
        }
        Ok(())
    }

    pub(crate) fn read_sparse_bool(&self, edit: &mut RowCursor) -> RowResult<bool> {
        edit.end_offset = edit.value_offset;
        Ok(self.read_u8(edit.meta_offset)? == LayoutCode::Boolean as u8)
    }

    pub(crate) fn read_sparse_fixed<T: FixedValue>(&self, edit: &mut RowCursor) -> RowResult<T> {
        let value = self.read_fixed(edit.value_offset)?;
        edit.end_offset = edit.value_offset + T::SIZE;
        Ok(value)
    }

    /// Length-prefixed bytes of a Utf8 or Binary element.
    pub(crate) fn read_sparse_bytes(&self, edit: &mut RowCursor) -> RowResult<&[u8]> {
        let (len, n) = self.read_varuint(edit.value_offset)?;
        let start = edit.value_offset + n;
        edit.end_offset = self.checked_end(start, len)?;
        self.read_bytes(start, edit.end_offset - start)
    }

    pub(crate) fn read_sparse_varuint(&self, edit: &mut RowCursor) -> RowResult<u64> {
        let (value, n) = self.read_varuint(edit.value_offset)?;
        edit.end_offset = edit.value_offset + n;
        Ok(value)
    }

    pub(crate) fn read_sparse_varint(&self, edit: &mut RowCursor) -> RowResult<i64> {
        let (value, n) = self.read_varint(edit.value_offset)?;
        edit.end_offset = edit.value_offset + n;
        Ok(value)
    }

    /// Bytes the default value of `type_arg` occupies.
    pub(crate) fn count_default_value(&self, type_arg: &TypeArgument) -> RowResult<usize> {
        let layout_type = type_arg.layout_type();
        let args = type_arg.type_args();
        Ok(match layout_type {
            LayoutType::Null | LayoutType::Boolean => LAYOUT_CODE_SIZE,
            LayoutType::Utf8 | LayoutType::Binary | LayoutType::VarInt | LayoutType::VarUInt => 1,
            LayoutType::EndScope => return Err(RowError::Failure),
            LayoutType::Scope(scope) => match scope.kind {
                ScopeKind::Object | ScopeKind::Array => LAYOUT_CODE_SIZE,
                ScopeKind::TypedArray | ScopeKind::TypedSet | ScopeKind::TypedMap => {
                    TYPED_COLLECTION_COUNT_SIZE
                }
                ScopeKind::Tuple => LAYOUT_CODE_SIZE * (args.len() + 1),
                ScopeKind::TypedTuple | ScopeKind::Tagged | ScopeKind::Tagged2 => {
                    let mut size = 0;
                    for arg in args {
                        size += self.count_default_value(arg)?;
                    }
                    size
                }
                ScopeKind::Nullable => {
                    let inner = args.get(0).ok_or(RowError::TypeConstraint)?;
                    NULLABLE_HAS_VALUE_SIZE + self.count_default_value(inner)?
                }
                ScopeKind::Udt => self.resolve(args.schema_id())?.size() + LAYOUT_CODE_SIZE,
            },
            fixed => fixed.size(),
        })
    }

    /// Writes the default value of `type_arg` at `offset` and returns its size.
    /// Assumes the bytes are zero.
    pub(crate) fn write_default_value(&mut self, offset: usize, type_arg: &TypeArgument) -> RowResult<usize> {
        let layout_type = type_arg.layout_type();
        let args = type_arg.type_args();
        Ok(match layout_type {
            LayoutType::Null => {
                self.buffer[offset] = LayoutCode::Null as u8;
                LAYOUT_CODE_SIZE
            }
            LayoutType::Boolean => {
                self.buffer[offset] = LayoutCode::BooleanFalse as u8;
                LAYOUT_CODE_SIZE
            }
            LayoutType::Utf8 | LayoutType::Binary | LayoutType::VarInt | LayoutType::VarUInt => {
                self.buffer[offset] = 0;
                1
            }
            LayoutType::EndScope => return Err(RowError::Failure),
            LayoutType::Scope(scope) => match scope.kind {
                ScopeKind::Object | ScopeKind::Array => {
                    self.buffer[offset] = LayoutCode::EndScope as u8;
                    LAYOUT_CODE_SIZE
                }
                ScopeKind::TypedArray | ScopeKind::TypedSet | ScopeKind::TypedMap => {
                    self.write_u32(offset, 0);
                    TYPED_COLLECTION_COUNT_SIZE
                }
                ScopeKind::Tuple => {
                    let n = args.len();
                    self.buffer[offset..offset + n].fill(LayoutCode::Null as u8);
                    self.buffer[offset + n] = LayoutCode::EndScope as u8;
                    LAYOUT_CODE_SIZE * (n + 1)
                }
                ScopeKind::TypedTuple | ScopeKind::Tagged | ScopeKind::Tagged2 => {
                    let mut size = 0;
                    for arg in args {
                        size += self.write_default_value(offset + size, arg)?;
                    }
                    size
                }
                ScopeKind::Nullable => {
                    let inner = args.get(0).ok_or(RowError::TypeConstraint)?;
                    self.buffer[offset] = 0;
                    NULLABLE_HAS_VALUE_SIZE
                        + self.write_default_value(offset + NULLABLE_HAS_VALUE_SIZE, inner)?
                }
                ScopeKind::Udt => {
                    let size = self.resolve(args.schema_id())?.size();
                    self.buffer[offset..offset + size].fill(0);
                    self.buffer[offset + size] = LayoutCode::EndScope as u8;
                    size + LAYOUT_CODE_SIZE
                }
            },
            fixed => {
                let size = fixed.size();
                self.buffer[offset..offset + size].fill(0);
                size
            }
        })
    }

    /// Writes a new scope element with its default contents and returns a
    /// cursor over the new scope.
    pub(crate) fn write_sparse_scope(
        &mut self,
        edit: &mut RowCursor,
        scope: LayoutScope,
        type_args: &TypeArgumentList,
        has_value: bool,
        options: UpdateOptions,
    ) -> RowResult<RowCursor> {
        let cell_type = LayoutType::Scope(scope);
        let type_arg = TypeArgument::with_args(cell_type, type_args.clone());
        let num_bytes = self.count_default_value(&type_arg)?;

        let space = self.ensure_sparse(edit, cell_type, type_args, num_bytes, options.into())?;
        self.write_sparse_metadata(edit, cell_type, type_args, space.meta_bytes);
        let value = edit.value_offset;
        // The replaced element's bytes may still be there.
        self.buffer[value..value + num_bytes].fill(0);
        self.write_default_value(value, &type_arg)?;

        let mut child = RowCursor::scope(Arc::clone(&edit.layout), scope, type_args.clone(), value);
        match scope.kind {
            ScopeKind::Object | ScopeKind::Array => {}
            ScopeKind::TypedArray | ScopeKind::TypedSet | ScopeKind::TypedMap => {
                child.meta_offset = value + TYPED_COLLECTION_COUNT_SIZE;
                child.value_offset = child.meta_offset;
            }
            ScopeKind::Tuple => {
                self.sparse_iterator_move_next(&mut child)?;
            }
            ScopeKind::TypedTuple | ScopeKind::Tagged | ScopeKind::Tagged2 => {
                child.count = type_args.len();
                self.sparse_iterator_move_next(&mut child)?;
            }
            ScopeKind::Nullable => {
                self.buffer[value] = has_value as u8;
                child.meta_offset = value + NULLABLE_HAS_VALUE_SIZE;
                child.count = 1;
                self.sparse_iterator_move_next(&mut child)?;
            }
            ScopeKind::Udt => {
                let udt = self.resolve(type_args.schema_id())?;
                child.meta_offset = value + udt.size();
                child.value_offset = child.meta_offset;
                child.layout = udt;
            }
        }
        Ok(child)
    }
}
