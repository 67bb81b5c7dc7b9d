//! # Unique Scopes
//!
//! Typed sets and typed maps keep their elements sorted and free of
//! duplicates. Elements are never written into them directly: a value is built
//! elsewhere in the row and moved in, or the scope is written in one go and
//! re-indexed afterwards.
//!
//! ## Ordering
//!
//! Elements are ordered by the key's wire encoding:
//!
//! ```text
//! (type code, value length, value bytes)
//! ```
//!
//! For a set the key is the element itself; for a map it is the first element
//! of the `(key, value)` tuple. The order only needs to be total and stable,
//! not meaningful.
//!
//! ## Rebuild
//!
//! After a deferred write the scope is rebuilt: elements are stably sorted by
//! key, and of each run of equal keys only the last written element is kept.

use std::cmp::Ordering;

use super::buffer::RowBuffer;
use super::cursor::RowCursor;
use super::result::{RowError, RowOptions, RowResult};
use crate::layouts::{LayoutScope, LayoutType, ScopeKind, TypeArgument, TypeArgumentList};

/// Location of a key's wire encoding inside the row.
#[derive(Debug, Clone, Copy)]
struct UniqueKey {
    code: u8,
    offset: usize,
    len: usize,
}

#[derive(Debug, Clone, Copy)]
struct UniqueIndexItem {
    meta_offset: usize,
    size: usize,
    key: UniqueKey,
}

impl RowBuffer {
    fn cell_code(&self, edit: &RowCursor) -> RowResult<u8> {
        let cell_type = edit.cell_type.ok_or(RowError::Failure)?;
        if cell_type.is_bool() {
            return self.read_u8(edit.meta_offset);
        }
        Ok(cell_type.code() as u8)
    }

    fn unique_key(&self, edit: &RowCursor, is_map: bool) -> RowResult<UniqueKey> {
        if is_map {
            let mut child = self.sparse_iterator_read_scope(edit, true)?;
            if !self.sparse_iterator_move_next(&mut child)? {
                return Err(RowError::InvalidRow);
            }
            return self.unique_key(&child, false);
        }

        let size = self.sparse_compute_size(edit)?;
        let meta_bytes = edit.value_offset - edit.meta_offset;
        Ok(UniqueKey {
            code: self.cell_code(edit)?,
            offset: edit.value_offset,
            len: size - meta_bytes,
        })
    }

    fn compare_keys(&self, left: &UniqueKey, right: &UniqueKey) -> Ordering {
        left.code
            .cmp(&right.code)
            .then(left.len.cmp(&right.len))
            .then_with(|| {
                let l = &self.buffer[left.offset..left.offset + left.len];
                let r = &self.buffer[right.offset..right.offset + right.len];
                l.cmp(r)
            })
    }

    /// Finds where `src` belongs in the unique scope `scope`: on the equal
    /// element (`exists`) or on the first greater one.
    pub(crate) fn prepare_sparse_move(
        &self,
        scope: &RowCursor,
        src: &RowCursor,
    ) -> RowResult<RowCursor> {
        let is_map = scope.scope_type.kind == ScopeKind::TypedMap;
        let src_key = self.unique_key(src, is_map)?;

        let mut dst = scope.typed_collection(self)?;
        dst.defer_unique_index = true;
        while dst.index < dst.count {
            self.read_sparse_metadata(&mut dst)?;
            let size = self.sparse_compute_size(&dst)?;
            let dst_key = self.unique_key(&dst, is_map)?;
            match self.compare_keys(&src_key, &dst_key) {
                Ordering::Greater => {
                    dst.index += 1;
                    dst.meta_offset += size;
                }
                ordering => {
                    dst.exists = ordering == Ordering::Equal;
                    return Ok(dst);
                }
            }
        }

        dst.exists = false;
        dst.cell_type = Some(LayoutType::EndScope);
        dst.value_offset = dst.meta_offset;
        Ok(dst)
    }

    /// Copies the element under `src` to `dst`, then deletes `src`. `scope` is
    /// the cursor over the destination scope; its offsets, and those of `src`
    /// and `dst`, are kept valid across both edits.
    pub(crate) fn typed_collection_move_field(
        &mut self,
        scope: &mut RowCursor,
        dst: &mut RowCursor,
        src: &mut RowCursor,
        options: RowOptions,
    ) -> RowResult<()> {
        let cell_type = src.cell_type.ok_or(RowError::Failure)?;
        let args = src.cell_type_args.clone();
        let encoded_size = self.sparse_compute_size(src)?;
        let num_bytes = encoded_size - (src.value_offset - src.meta_offset);
        let src_code = self.read_u8(src.meta_offset)?;

        let dst_meta = dst.meta_offset;
        let space = self.ensure_sparse(dst, cell_type, &args, num_bytes, options)?;
        self.write_sparse_metadata(dst, cell_type, &args, space.meta_bytes);
        if cell_type.is_bool() {
            self.buffer[dst.meta_offset] = src_code;
        }

        if src.meta_offset >= dst_meta {
            src.meta_offset = src.meta_offset.wrapping_add_signed(space.shift);
            src.value_offset = src.value_offset.wrapping_add_signed(space.shift);
        }
        if src.start >= dst_meta {
            src.start = src.start.wrapping_add_signed(space.shift);
        }

        self.buffer
            .copy_within(src.value_offset..src.value_offset + num_bytes, dst.value_offset);

        let src_meta = src.meta_offset;
        let removed = self.delete_moved(src, cell_type, &args, num_bytes)?;
        if src_meta < scope.start {
            scope.start -= removed;
            scope.meta_offset -= removed;
            scope.value_offset -= removed;
            dst.start -= removed;
            dst.meta_offset -= removed;
            dst.value_offset -= removed;
        }
        scope.count = dst.count;
        Ok(())
    }

    fn delete_moved(
        &mut self,
        src: &mut RowCursor,
        cell_type: LayoutType,
        args: &TypeArgumentList,
        num_bytes: usize,
    ) -> RowResult<usize> {
        let before = self.length;
        self.ensure_sparse(src, cell_type, args, num_bytes, RowOptions::Delete)?;
        Ok(before - self.length)
    }

    /// Deletes the element under `src`, keeping `dst` valid if it lies after
    /// the deleted bytes.
    pub(crate) fn delete_pattern(&mut self, src: &mut RowCursor, dst: &mut RowCursor) -> RowResult<()> {
        let src_meta = src.meta_offset;
        let before = self.length;
        self.delete_sparse(src)?;
        let removed = before - self.length;
        if src_meta < dst.start {
            dst.start -= removed;
            dst.meta_offset -= removed;
            dst.value_offset -= removed;
        }
        Ok(())
    }

    /// Sorts the elements of a unique scope written with deferred indexing
    /// and drops duplicates, keeping the last written element of each key.
    pub(crate) fn typed_collection_unique_index_rebuild(&mut self, scope: &RowCursor) -> RowResult<()> {
        let is_map = scope.scope_type.kind == ScopeKind::TypedMap;
        let mut edit = scope.typed_collection(self)?;
        if edit.count <= 1 {
            return Ok(());
        }

        let elements_start = edit.meta_offset;
        let mut items = Vec::with_capacity(edit.count);
        while edit.index < edit.count {
            self.read_sparse_metadata(&mut edit)?;
            let size = self.sparse_compute_size(&edit)?;
            items.push(UniqueIndexItem {
                meta_offset: edit.meta_offset,
                size,
                key: self.unique_key(&edit, is_map)?,
            });
            edit.index += 1;
            edit.meta_offset += size;
        }
        let elements_end = edit.meta_offset;

        items.sort_by(|a, b| self.compare_keys(&a.key, &b.key));

        let mut survivors: Vec<UniqueIndexItem> = Vec::with_capacity(items.len());
        for item in items {
            match survivors.last_mut() {
                Some(last) if self.compare_keys(&last.key, &item.key) == Ordering::Equal => *last = item,
                _ => survivors.push(item),
            }
        }

        let original = self.buffer[elements_start..elements_end].to_vec();
        let mut offset = elements_start;
        for item in &survivors {
            let from = item.meta_offset - elements_start;
            self.buffer[offset..offset + item.size].copy_from_slice(&original[from..from + item.size]);
            offset += item.size;
        }

        let removed = elements_end - offset;
        self.shift_tail(elements_end, -(removed as isize));
        self.write_u32(scope.start, survivors.len() as u32);
        Ok(())
    }

    /// Element type of a unique scope.
    pub(crate) fn unique_field_type(scope: &RowCursor) -> RowResult<TypeArgument> {
        match scope.scope_type.kind {
            ScopeKind::TypedSet => scope
                .scope_type_args
                .get(0)
                .cloned()
                .ok_or(RowError::InvalidRow),
            ScopeKind::TypedMap => Ok(TypeArgument::with_args(
                LayoutType::Scope(LayoutScope::new(ScopeKind::TypedTuple, scope.scope_type.immutable)),
                scope.scope_type_args.clone(),
            )),
            _ => Err(RowError::TypeMismatch),
        }
    }
}
