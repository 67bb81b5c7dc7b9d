//! # Scope Operations
//!
//! Reading, writing and deleting nested scopes, plus the operations specific
//! to nullable and unique scopes. A scope write creates the scope with its
//! default contents and returns a cursor over it:
//!
//! | Scope | Fresh contents | Returned cursor |
//! |-------|----------------|-----------------|
//! | Object, Array | empty | before the first element |
//! | TypedArray, TypedSet, TypedMap | count of zero | before the first element |
//! | Tuple | one `null` per position | on position 0 |
//! | TypedTuple, Tagged, Tagged2 | default of every position | on position 0 |
//! | Nullable | has-value flag, default inner value | on the inner value |
//! | UDT | zeroed fixed segment, no sparse fields | on the UDT's sparse segment |
//!
//! Unique scopes (TypedSet, TypedMap) refuse direct element writes. Elements
//! are moved in with [`LayoutScope::move_field`], or the whole scope is written
//! with [`LayoutScope::write_scope_with`], which re-indexes it afterwards.

use log::warn;

use super::layout_type::{LayoutScope, LayoutType, ScopeKind};
use super::type_argument::{TypeArgument, TypeArgumentList};
use crate::row::{RowBuffer, RowCursor, RowError, RowOptions, RowResult, UpdateOptions};

impl LayoutScope {
    /// Whether elements of this scope at the cursor's position carry no type
    /// code because the scope's type arguments already determine it.
    pub(crate) fn has_implicit_type_code(self, edit: &RowCursor) -> bool {
        let implicit = |arg: Option<&TypeArgument>| {
            arg.is_some_and(|arg| !arg.layout_type().code().always_requires_type_code())
        };
        match self.kind {
            ScopeKind::TypedArray | ScopeKind::TypedSet | ScopeKind::Nullable => {
                implicit(edit.scope_type_args.get(0))
            }
            ScopeKind::TypedMap => true,
            ScopeKind::TypedTuple | ScopeKind::Tagged | ScopeKind::Tagged2 => {
                implicit(edit.scope_type_args.get(edit.index))
            }
            _ => false,
        }
    }

    pub(crate) fn set_implicit_type_code(self, edit: &mut RowCursor) {
        let arg = match self.kind {
            ScopeKind::TypedMap => {
                edit.cell_type = Some(LayoutType::Scope(LayoutScope::new(
                    ScopeKind::TypedTuple,
                    self.immutable,
                )));
                edit.cell_type_args = edit.scope_type_args.clone();
                return;
            }
            ScopeKind::TypedTuple | ScopeKind::Tagged | ScopeKind::Tagged2 => {
                edit.scope_type_args.get(edit.index)
            }
            _ => edit.scope_type_args.get(0),
        };
        if let Some(arg) = arg.cloned() {
            edit.cell_type = Some(arg.layout_type());
            edit.cell_type_args = arg.type_args().clone();
        }
    }

    /// Writes a new scope of this type at the cursor and returns a cursor over
    /// it.
    pub fn write_scope(
        self,
        row: &mut RowBuffer,
        edit: &mut RowCursor,
        type_args: &TypeArgumentList,
        options: UpdateOptions,
    ) -> RowResult<RowCursor> {
        self.write_scope_inner(row, edit, type_args, true, options)
    }

    /// Writes a nullable scope whose has-value flag is `has_value`.
    pub fn write_nullable(
        self,
        row: &mut RowBuffer,
        edit: &mut RowCursor,
        type_args: &TypeArgumentList,
        has_value: bool,
        options: UpdateOptions,
    ) -> RowResult<RowCursor> {
        if self.kind != ScopeKind::Nullable {
            return Err(RowError::TypeMismatch);
        }
        self.write_scope_inner(row, edit, type_args, has_value, options)
    }

    fn write_scope_inner(
        self,
        row: &mut RowBuffer,
        edit: &mut RowCursor,
        type_args: &TypeArgumentList,
        has_value: bool,
        options: UpdateOptions,
    ) -> RowResult<RowCursor> {
        if self.is_udt() {
            row.resolve(type_args.schema_id())?;
        }
        let type_arg = TypeArgument::with_args(LayoutType::Scope(self), type_args.clone());
        row.prepare_sparse_write(edit, &type_arg, options)?;
        row.write_sparse_scope(edit, self, type_args, has_value, options)
    }

    /// Writes a scope and fills it through `writer`. A failing writer leaves
    /// no scope behind. Unique scopes are filled with indexing deferred and
    /// re-indexed once `writer` returns. On success the parent cursor is
    /// moved past the new scope.
    pub fn write_scope_with<C, F>(
        self,
        row: &mut RowBuffer,
        scope: &mut RowCursor,
        type_args: &TypeArgumentList,
        context: C,
        writer: F,
        options: UpdateOptions,
    ) -> RowResult<()>
    where
        F: FnOnce(&mut RowBuffer, &mut RowCursor, C) -> RowResult<()>,
    {
        let mut child = self.write_scope(row, scope, type_args, options)?;
        if self.is_unique_scope() {
            child.defer_unique_index = true;
        }

        let mut result = writer(row, &mut child, context);
        if result.is_ok() && self.is_unique_scope() {
            result = row.typed_collection_unique_index_rebuild(&child);
        }
        if let Err(err) = result {
            if let Err(cleanup) = self.delete_scope(row, scope) {
                warn!("failed to remove partially written {:?} scope: {}", self.kind, cleanup);
            }
            return Err(err);
        }

        let mut fresh = row.sparse_iterator_read_scope(scope, true)?;
        scope.move_next_after(row, &mut fresh)?;
        Ok(())
    }

    /// Returns a cursor over the scope stored at `edit`. Unique scopes, and
    /// scopes reached through an immutable cursor, are read-only.
    pub fn read_scope(self, row: &RowBuffer, edit: &mut RowCursor) -> RowResult<RowCursor> {
        row.prepare_sparse_read(edit, LayoutType::Scope(self))?;
        let immutable = self.immutable || edit.immutable || edit.scope_type.is_unique_scope();
        row.sparse_iterator_read_scope(edit, immutable)
    }

    pub fn delete_scope(self, row: &mut RowBuffer, edit: &mut RowCursor) -> RowResult<()> {
        row.prepare_sparse_delete(edit, LayoutType::Scope(self))?;
        row.delete_sparse(edit)
    }

    /// Whether the nullable scope under `scope` holds a value.
    pub fn has_value(row: &RowBuffer, scope: &RowCursor) -> RowResult<bool> {
        if scope.scope_type.kind != ScopeKind::Nullable {
            return Err(RowError::TypeMismatch);
        }
        Ok(row.read_u8(scope.start)? != 0)
    }

    /// Moves the element under `source` into the unique scope
    /// `destination_scope` at its sorted position. The source element is
    /// deleted whether or not the move succeeds.
    pub fn move_field(
        self,
        row: &mut RowBuffer,
        destination_scope: &mut RowCursor,
        source: &mut RowCursor,
        options: UpdateOptions,
    ) -> RowResult<()> {
        if !self.is_unique_scope() || destination_scope.scope_type.kind != self.kind {
            return Err(RowError::TypeMismatch);
        }
        let element_type = RowBuffer::unique_field_type(destination_scope)?;
        row.prepare_sparse_delete(source, element_type.layout_type())?;
        if !source.exists {
            return Err(RowError::NotFound);
        }

        if destination_scope.immutable {
            return refuse(row, source, RowError::InsufficientPermissions);
        }
        if source.cell_type_args != *element_type.type_args() {
            return refuse(row, source, RowError::TypeConstraint);
        }
        if options == UpdateOptions::InsertAt {
            return refuse(row, source, RowError::TypeConstraint);
        }

        let mut dst = row.prepare_sparse_move(destination_scope, source)?;
        if options == UpdateOptions::Update && !dst.exists {
            return refuse(row, source, RowError::NotFound);
        }
        if options == UpdateOptions::Insert && dst.exists {
            return refuse(row, source, RowError::Exists);
        }

        row.typed_collection_move_field(destination_scope, &mut dst, source, RowOptions::from(options))
    }

    /// Finds the element of the unique scope `scope` equal to the element
    /// under `pattern`, which is deleted. Fails with `NotFound` if there is
    /// none.
    pub fn find(
        self,
        row: &mut RowBuffer,
        scope: &RowCursor,
        pattern: &mut RowCursor,
    ) -> RowResult<RowCursor> {
        if !self.is_unique_scope() || scope.scope_type.kind != self.kind {
            return Err(RowError::TypeMismatch);
        }
        let element_type = RowBuffer::unique_field_type(scope)?;
        row.prepare_sparse_delete(pattern, element_type.layout_type())?;
        if !pattern.exists {
            return Err(RowError::NotFound);
        }

        let mut found = row.prepare_sparse_move(scope, pattern)?;
        let exists = found.exists;
        row.delete_pattern(pattern, &mut found)?;
        if !exists {
            return Err(RowError::NotFound);
        }
        found.immutable = scope.immutable;
        found.defer_unique_index = false;
        Ok(found)
    }
}

/// Deletes a source element whose move was refused and reports why.
fn refuse(row: &mut RowBuffer, source: &mut RowCursor, err: RowError) -> RowResult<()> {
    row.delete_sparse(source)?;
    Err(err)
}
