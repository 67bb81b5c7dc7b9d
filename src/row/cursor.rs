//! # Row Cursor
//!
//! A [`RowCursor`] addresses one position inside one scope of a row. It records
//! the scope being iterated (type, type arguments, start offset, element
//! count), the current element (type, path, metadata and value offsets) and
//! the path a subsequent write will use.
//!
//! ```text
//! scope.start                meta_offset        value_offset
//!     |                          |                   |
//!     v                          v                   v
//!     [count] [elem 0] [elem 1]  [code][args][path]  [value bytes] [elem 3] ...
//! ```
//!
//! Cursors are plain values. Cloning one is cheap (the layout and type
//! arguments are shared) and a cursor is only valid against the row it was
//! created from. A write through one cursor moves bytes that other cursors into
//! the same row may still point at; only the cursor used for the write and the
//! scope cursor handed to it are adjusted.

use std::sync::Arc;

use crate::layouts::{
    Layout, LayoutScope, LayoutType, StringToken, TypeArgumentList,
};

use super::buffer::RowBuffer;
use super::result::{RowError, RowResult};
use crate::config::{HYBRID_ROW_HEADER_SIZE, LAYOUT_CODE_SIZE, TYPED_COLLECTION_COUNT_SIZE};

/// Path a sparse write will record for the element it creates.
#[derive(Debug, Clone, Default)]
pub(crate) enum WritePath {
    #[default]
    None,
    Token(StringToken),
    Literal(Arc<str>),
}

#[derive(Debug, Clone)]
pub struct RowCursor {
    pub(crate) layout: Arc<Layout>,
    pub(crate) scope_type: LayoutScope,
    pub(crate) scope_type_args: TypeArgumentList,
    pub(crate) immutable: bool,
    pub(crate) defer_unique_index: bool,
    pub(crate) start: usize,
    pub(crate) exists: bool,
    pub(crate) write_path: WritePath,
    pub(crate) path_offset: usize,
    pub(crate) path_token: usize,
    pub(crate) meta_offset: usize,
    pub(crate) cell_type: Option<LayoutType>,
    pub(crate) cell_type_args: TypeArgumentList,
    pub(crate) value_offset: usize,
    pub(crate) end_offset: usize,
    pub(crate) count: usize,
    pub(crate) index: usize,
}

impl RowCursor {
    /// Cursor over the root sparse segment, positioned before its first field.
    pub fn create(row: &RowBuffer) -> RowResult<RowCursor> {
        let layout = Arc::clone(row.layout());
        let meta_offset = row.compute_variable_value_offset(
            &layout,
            HYBRID_ROW_HEADER_SIZE,
            layout.num_variable(),
        )?;
        let scope_type_args = TypeArgumentList::from_schema_id(layout.schema_id());
        let mut cursor = RowCursor::scope(layout, LayoutScope::UDT, scope_type_args, HYBRID_ROW_HEADER_SIZE);
        cursor.meta_offset = meta_offset;
        cursor.value_offset = meta_offset;
        Ok(cursor)
    }

    /// Cursor positioned at the end of the row, for appending new sparse
    /// fields to the root scope without scanning it.
    pub fn create_for_append(row: &RowBuffer) -> RowCursor {
        let layout = Arc::clone(row.layout());
        let scope_type_args = TypeArgumentList::from_schema_id(layout.schema_id());
        let mut cursor = RowCursor::scope(layout, LayoutScope::UDT, scope_type_args, HYBRID_ROW_HEADER_SIZE);
        cursor.meta_offset = row.len();
        cursor.value_offset = row.len();
        cursor
    }

    /// Fresh cursor over a scope whose first element starts at `start`.
    pub(crate) fn scope(
        layout: Arc<Layout>,
        scope_type: LayoutScope,
        scope_type_args: TypeArgumentList,
        start: usize,
    ) -> RowCursor {
        RowCursor {
            layout,
            scope_type,
            scope_type_args,
            immutable: false,
            defer_unique_index: false,
            start,
            exists: false,
            write_path: WritePath::None,
            path_offset: 0,
            path_token: 0,
            meta_offset: start,
            cell_type: None,
            cell_type_args: TypeArgumentList::EMPTY,
            value_offset: start,
            end_offset: 0,
            count: 0,
            index: 0,
        }
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn scope_type(&self) -> LayoutScope {
        self.scope_type
    }

    pub fn scope_type_args(&self) -> &TypeArgumentList {
        &self.scope_type_args
    }

    /// Type of the element under the cursor, `None` before the first move.
    pub fn cell_type(&self) -> Option<LayoutType> {
        self.cell_type
    }

    pub fn cell_type_args(&self) -> &TypeArgumentList {
        &self.cell_type_args
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn immutable(&self) -> bool {
        self.immutable
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of elements in a sized scope.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Tokenizer id of the current element's path. Literal paths report a
    /// value at or above the tokenizer's count.
    pub fn path_token(&self) -> usize {
        self.path_token
    }

    /// Path of the current element, if the scope records paths.
    pub fn path(&self, row: &RowBuffer) -> RowResult<Option<String>> {
        if self.scope_type.is_indexed_scope() || !self.exists {
            return Ok(None);
        }
        let count = self.layout.tokenizer().count();
        if self.path_token < count {
            let path = self
                .layout
                .tokenizer()
                .try_find_string(self.path_token as u64)
                .ok_or(RowError::InvalidRow)?;
            return Ok(Some(path.to_string()));
        }
        let bytes = row.read_bytes(self.path_offset, self.path_token - count)?;
        let path = std::str::from_utf8(bytes).map_err(|_| RowError::InvalidRow)?;
        Ok(Some(path.to_string()))
    }

    /// Returns the cursor with writes disabled.
    pub fn as_read_only(mut self) -> RowCursor {
        self.immutable = true;
        self
    }

    /// Advances to the next element of the scope. Returns `false` once the end
    /// of the scope is reached.
    pub fn move_next(&mut self, row: &RowBuffer) -> RowResult<bool> {
        self.write_path = WritePath::None;
        row.sparse_iterator_move_next(self)
    }

    /// Advances until the element at `index` of an indexed scope.
    pub fn move_to(&mut self, row: &RowBuffer, index: usize) -> RowResult<bool> {
        debug_assert!(self.scope_type.is_indexed_scope());
        if self.cell_type.is_none() && !self.move_next(row)? {
            return Ok(false);
        }
        while self.index < index {
            if !self.move_next(row)? {
                return Ok(false);
            }
        }
        Ok(self.exists)
    }

    /// Advances past `child`, a cursor over the scope under this cursor, and
    /// onto the element after it.
    pub fn move_next_after(&mut self, row: &RowBuffer, child: &mut RowCursor) -> RowResult<bool> {
        self.skip(row, child)?;
        self.move_next(row)
    }

    /// Records the end of `child`'s scope so the next move does not have to
    /// re-measure it.
    pub fn skip(&mut self, row: &RowBuffer, child: &mut RowCursor) -> RowResult<()> {
        debug_assert_eq!(self.value_offset, child.start);
        if child.scope_type.is_sized_scope() && !child.scope_type.is_fixed_arity() {
            child.count = row.read_u32(child.start)? as usize;
        }
        if child.cell_type != Some(LayoutType::EndScope) {
            while row.sparse_iterator_move_next(child)? {}
        }
        self.end_offset = if child.scope_type.is_sized_scope() {
            child.meta_offset
        } else {
            child.meta_offset + LAYOUT_CODE_SIZE
        };
        Ok(())
    }

    /// Positions the cursor on the field named `path` in a path-addressed
    /// scope. Whether or not the field exists, a following write targets it.
    pub fn find(&mut self, row: &RowBuffer, path: &str) -> RowResult<()> {
        debug_assert!(!self.scope_type.is_indexed_scope());
        if let Some(token) = self.layout.tokenizer().try_find_token(path) {
            let token = token.clone();
            return self.find_token(row, &token);
        }

        if self.cell_type != Some(LayoutType::EndScope) {
            while row.sparse_iterator_move_next(self)? {
                if self.path_token >= self.layout.tokenizer().count()
                    && row.sparse_path_equals(self, path)?
                {
                    break;
                }
            }
        }
        self.write_path = WritePath::Literal(Arc::from(path));
        Ok(())
    }

    /// Positions the cursor on the field whose path has the given token.
    pub fn find_token(&mut self, row: &RowBuffer, token: &StringToken) -> RowResult<()> {
        debug_assert!(!self.scope_type.is_indexed_scope());
        if self.cell_type != Some(LayoutType::EndScope) {
            while row.sparse_iterator_move_next(self)? {
                if self.path_token as u64 == token.id() {
                    break;
                }
            }
        }
        self.write_path = WritePath::Token(token.clone());
        Ok(())
    }

    /// Child cursor for a typed collection, positioned before its first element.
    pub(crate) fn typed_collection(&self, row: &RowBuffer) -> RowResult<RowCursor> {
        let mut child = self.clone();
        child.meta_offset = self.start + TYPED_COLLECTION_COUNT_SIZE;
        child.value_offset = child.meta_offset;
        child.count = row.read_u32(self.start)? as usize;
        child.index = 0;
        child.cell_type = None;
        child.cell_type_args = TypeArgumentList::EMPTY;
        child.exists = false;
        child.end_offset = 0;
        child.write_path = WritePath::None;
        Ok(child)
    }
}
