//! # Type Arguments
//!
//! Generic scopes carry the types of their elements as type arguments:
//!
//! | Scope | Arguments |
//! |-------|-----------|
//! | `TypedArray<T>`, `TypedSet<T>`, `Nullable<T>` | `[T]` |
//! | `TypedMap<K, V>` | `[K, V]` |
//! | `Tuple<..>`, `TypedTuple<..>` | one per position |
//! | `Tagged<T>` / `Tagged2<T1, T2>` | `[UInt8 tag, T]` / `[UInt8 tag, T1, T2]` |
//! | UDT | a [`SchemaId`] instead of a list |
//!
//! A [`TypeArgumentList`] holds either the ordered arguments or a schema id.
//! The argument slice is shared, so cloning a list or a cursor holding one never
//! copies the arguments.

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use super::layout_type::LayoutType;

/// Identifier of a schema within a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SchemaId(pub i32);

impl SchemaId {
    pub const INVALID: SchemaId = SchemaId(0);

    pub fn id(self) -> i32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A physical type together with its own type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeArgument {
    layout_type: LayoutType,
    type_args: TypeArgumentList,
}

impl TypeArgument {
    pub fn new(layout_type: LayoutType) -> Self {
        Self {
            layout_type,
            type_args: TypeArgumentList::EMPTY,
        }
    }

    pub fn with_args(layout_type: LayoutType, type_args: TypeArgumentList) -> Self {
        Self {
            layout_type,
            type_args,
        }
    }

    pub fn layout_type(&self) -> LayoutType {
        self.layout_type
    }

    pub fn type_args(&self) -> &TypeArgumentList {
        &self.type_args
    }
}

impl fmt::Display for TypeArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.layout_type.name(), self.type_args)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypeArgumentList {
    args: Option<Arc<[TypeArgument]>>,
    schema_id: SchemaId,
}

impl TypeArgumentList {
    pub const EMPTY: TypeArgumentList = TypeArgumentList {
        args: None,
        schema_id: SchemaId::INVALID,
    };

    pub fn new(args: Vec<TypeArgument>) -> Self {
        if args.is_empty() {
            return Self::EMPTY;
        }
        Self {
            args: Some(args.into()),
            schema_id: SchemaId::INVALID,
        }
    }

    pub fn from_schema_id(schema_id: SchemaId) -> Self {
        Self {
            args: None,
            schema_id,
        }
    }

    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
    }

    pub fn as_slice(&self) -> &[TypeArgument] {
        self.args.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TypeArgument> {
        self.as_slice().get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeArgument> {
        self.as_slice().iter()
    }
}

impl Index<usize> for TypeArgumentList {
    type Output = TypeArgument;

    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a TypeArgumentList {
    type Item = &'a TypeArgument;
    type IntoIter = std::slice::Iter<'a, TypeArgument>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<TypeArgument> for TypeArgumentList {
    fn from_iter<I: IntoIterator<Item = TypeArgument>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for TypeArgumentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.schema_id.is_valid() {
            return write!(f, "<{}>", self.schema_id);
        }
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "<")?;
        for (i, arg) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ">")
    }
}
