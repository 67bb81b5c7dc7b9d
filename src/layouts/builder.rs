//! # Layout Builder
//!
//! [`LayoutBuilder`] accumulates columns while a schema is walked and freezes
//! them into a [`Layout`].
//!
//! Columns are collected into three lists. Offsets are provisional until
//! [`LayoutBuilder::build`] knows the final bitmask size and fixed column count:
//!
//! ```text
//! add_fixed_column      offset = running fixed size     (bitmask not yet known)
//! add_variable_column   index  = running variable count (fixed count not yet known)
//!
//! build():
//!   fixed.offset    += bitmask bytes
//!   variable.index  += fixed count
//!   columns          = fixed ++ variable ++ sparse
//! ```
//!
//! Nested object properties are tracked with a scope stack; the innermost open
//! scope becomes the parent of every column added while it is open.

use std::sync::Arc;

use eyre::{bail, ensure, Result};

use super::bit::{BitAllocator, LayoutBit};
use super::column::{LayoutColumn, StorageKind};
use super::layout::Layout;
use super::layout_type::{LayoutType, ScopeKind};
use super::type_argument::{SchemaId, TypeArgumentList};

#[derive(Debug)]
pub struct LayoutBuilder {
    name: String,
    schema_id: SchemaId,
    bits: BitAllocator,
    arena: Vec<LayoutColumn>,
    fixed: Vec<usize>,
    variable: Vec<usize>,
    sparse: Vec<usize>,
    fixed_size: usize,
    scope: Vec<usize>,
}

impl LayoutBuilder {
    pub fn new(name: impl Into<String>, schema_id: SchemaId) -> Self {
        Self {
            name: name.into(),
            schema_id,
            bits: BitAllocator::new(),
            arena: Vec::new(),
            fixed: Vec::new(),
            variable: Vec::new(),
            sparse: Vec::new(),
            fixed_size: 0,
            scope: Vec::new(),
        }
    }

    /// Adds a byte-offset addressed column to the fixed segment.
    ///
    /// `length` is the width of a fixed Utf8/Binary column and ignored otherwise.
    pub fn add_fixed_column(
        &mut self,
        path: &str,
        layout_type: LayoutType,
        nullable: bool,
        length: usize,
    ) -> Result<()> {
        ensure!(
            self.scope.is_empty(),
            "fixed column '{}' must be declared at the schema scope",
            path
        );
        ensure!(
            !layout_type.is_varint(),
            "varint column '{}' cannot be fixed",
            path
        );

        let index = self.fixed.len();
        let (null_bit, bool_bit, offset, size) = if layout_type.is_null() {
            ensure!(nullable, "null column '{}' must be nullable", path);
            (self.bits.allocate(), LayoutBit::INVALID, 0, 0)
        } else if layout_type.is_bool() {
            let null_bit = self.allocate_if(nullable);
            (null_bit, self.bits.allocate(), 0, 0)
        } else {
            let size = if layout_type.is_fixed() {
                layout_type.size()
            } else {
                ensure!(
                    matches!(layout_type, LayoutType::Utf8 | LayoutType::Binary) && length > 0,
                    "fixed column '{}' of type {} requires a length",
                    path,
                    layout_type.name()
                );
                length
            };
            let offset = self.fixed_size;
            self.fixed_size += size;
            (self.allocate_if(nullable), LayoutBit::INVALID, offset, size)
        };

        let id = self.push(
            path,
            layout_type,
            TypeArgumentList::EMPTY,
            StorageKind::Fixed,
            index,
            offset,
            null_bit,
            bool_bit,
            size,
        )?;
        self.fixed.push(id);
        Ok(())
    }

    /// Adds an index-addressed, length-prefixed column to the variable segment.
    pub fn add_variable_column(
        &mut self,
        path: &str,
        layout_type: LayoutType,
        length: usize,
    ) -> Result<()> {
        ensure!(
            self.scope.is_empty(),
            "variable column '{}' must be declared at the schema scope",
            path
        );
        ensure!(
            layout_type.allow_variable(),
            "type {} of column '{}' cannot be stored as variable",
            layout_type.name(),
            path
        );

        let ordinal = self.variable.len();
        let null_bit = self.bits.allocate();
        let id = self.push(
            path,
            layout_type,
            TypeArgumentList::EMPTY,
            StorageKind::Variable,
            ordinal,
            ordinal,
            null_bit,
            LayoutBit::INVALID,
            length,
        )?;
        self.variable.push(id);
        Ok(())
    }

    pub fn add_sparse_column(
        &mut self,
        path: &str,
        layout_type: LayoutType,
        type_args: TypeArgumentList,
    ) -> Result<()> {
        let id = self.push_sparse(path, layout_type, type_args)?;
        self.sparse.push(id);
        Ok(())
    }

    /// Adds a sparse object column and opens it as the parent of subsequent columns.
    pub fn add_object_scope(&mut self, path: &str, layout_type: LayoutType) -> Result<()> {
        ensure!(
            matches!(layout_type.as_scope(), Some(s) if s.kind == ScopeKind::Object),
            "column '{}' of type {} is not an object scope",
            path,
            layout_type.name()
        );
        let id = self.push_sparse(path, layout_type, TypeArgumentList::EMPTY)?;
        self.sparse.push(id);
        self.scope.push(id);
        Ok(())
    }

    pub fn end_object_scope(&mut self) -> Result<()> {
        if self.scope.pop().is_none() {
            bail!("no object scope is open");
        }
        Ok(())
    }

    pub fn build(self) -> Result<Layout> {
        ensure!(self.scope.is_empty(), "unclosed object scope in '{}'", self.name);

        let bitmask_bytes = self.bits.num_bytes();
        let fixed_count = self.fixed.len();

        let order: Vec<usize> = self
            .fixed
            .iter()
            .chain(&self.variable)
            .chain(&self.sparse)
            .copied()
            .collect();

        let mut position = vec![0usize; self.arena.len()];
        for (final_index, &arena_index) in order.iter().enumerate() {
            position[arena_index] = final_index;
        }

        let arena = self.arena;
        let columns = order
            .iter()
            .map(|&arena_index| {
                let mut column = arena[arena_index].clone();
                match column.storage {
                    StorageKind::Fixed => column.offset += bitmask_bytes,
                    StorageKind::Variable => column.index += fixed_count,
                    StorageKind::Sparse => {}
                }
                column.parent = column.parent.map(|p| position[p]);
                column
            })
            .collect();

        Layout::new(
            self.name,
            self.schema_id,
            bitmask_bytes,
            self.fixed_size + bitmask_bytes,
            columns,
        )
    }

    fn allocate_if(&mut self, condition: bool) -> LayoutBit {
        if condition {
            self.bits.allocate()
        } else {
            LayoutBit::INVALID
        }
    }

    fn push_sparse(
        &mut self,
        path: &str,
        layout_type: LayoutType,
        type_args: TypeArgumentList,
    ) -> Result<usize> {
        let index = self.sparse.len();
        self.push(
            path,
            layout_type,
            type_args,
            StorageKind::Sparse,
            index,
            0,
            LayoutBit::INVALID,
            LayoutBit::INVALID,
            0,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        path: &str,
        layout_type: LayoutType,
        type_args: TypeArgumentList,
        storage: StorageKind,
        index: usize,
        offset: usize,
        null_bit: LayoutBit,
        bool_bit: LayoutBit,
        size: usize,
    ) -> Result<usize> {
        let parent = self.scope.last().copied();
        let full_path = match parent {
            Some(p) => full_path(&self.arena[p], path)?,
            None => Arc::from(path),
        };

        self.arena.push(LayoutColumn {
            path: Arc::from(path),
            full_path,
            layout_type,
            type_args,
            storage,
            parent,
            index,
            offset,
            null_bit,
            bool_bit,
            size,
        });
        Ok(self.arena.len() - 1)
    }
}

fn full_path(parent: &LayoutColumn, path: &str) -> Result<Arc<str>> {
    let separator = match parent.layout_type.as_scope().map(|s| s.kind) {
        Some(ScopeKind::Object) | Some(ScopeKind::Udt) => ".",
        Some(ScopeKind::Array)
        | Some(ScopeKind::TypedArray)
        | Some(ScopeKind::TypedSet)
        | Some(ScopeKind::TypedMap) => "[]",
        _ => bail!(
            "parent scope type not supported: {}",
            parent.layout_type.name()
        ),
    };
    Ok(Arc::from(format!("{}{}{}", parent.full_path, separator, path)))
}
