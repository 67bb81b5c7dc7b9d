//! # Layout Columns
//!
//! A [`LayoutColumn`] describes one field of a layout: where it lives
//! ([`StorageKind`]), its physical type and the bits it owns in the bitmask.
//!
//! | Storage | `offset` means | Presence |
//! |---------|----------------|----------|
//! | Fixed | byte offset from the scope start (bitmask included) | `null_bit` unless non-nullable |
//! | Variable | ordinal among the layout's variable columns | `null_bit` |
//! | Sparse | unused | the value's existence in the sparse segment |
//!
//! Parents are indices into the owning layout's column list.

use std::sync::Arc;

use super::bit::LayoutBit;
use super::layout_type::LayoutType;
use super::type_argument::{TypeArgument, TypeArgumentList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Fixed,
    Variable,
    Sparse,
}

impl StorageKind {
    pub fn name(self) -> &'static str {
        match self {
            StorageKind::Fixed => "Fixed",
            StorageKind::Variable => "Variable",
            StorageKind::Sparse => "Sparse",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutColumn {
    pub(crate) path: Arc<str>,
    pub(crate) full_path: Arc<str>,
    pub(crate) layout_type: LayoutType,
    pub(crate) type_args: TypeArgumentList,
    pub(crate) storage: StorageKind,
    pub(crate) parent: Option<usize>,
    pub(crate) index: usize,
    pub(crate) offset: usize,
    pub(crate) null_bit: LayoutBit,
    pub(crate) bool_bit: LayoutBit,
    pub(crate) size: usize,
}

impl LayoutColumn {
    /// Path relative to the enclosing scope.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Dotted path from the layout root, e.g. `address.street` or `tags[]`.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn layout_type(&self) -> LayoutType {
        self.layout_type
    }

    pub fn type_args(&self) -> &TypeArgumentList {
        &self.type_args
    }

    /// The column's type as a single type argument.
    pub fn type_arg(&self) -> TypeArgument {
        TypeArgument::with_args(self.layout_type, self.type_args.clone())
    }

    pub fn storage(&self) -> StorageKind {
        self.storage
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn null_bit(&self) -> LayoutBit {
        self.null_bit
    }

    pub fn bool_bit(&self) -> LayoutBit {
        self.bool_bit
    }

    /// Fixed width, or the maximum length of a variable column (0 = unbounded).
    pub fn size(&self) -> usize {
        self.size
    }
}
