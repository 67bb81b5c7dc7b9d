//! # Layouts
//!
//! A layout is the physical form of a schema: which columns live in the fixed,
//! variable and sparse segments of a row, at which offsets, with which
//! presence bits. This module holds the type system shared by layouts and rows
//! and the compiler that turns schemas into layouts.
//!
//! ## Pipeline
//!
//! ```text
//! Namespace + Schema --LayoutCompiler--> LayoutBuilder --build--> Arc<Layout>
//!                                                                    |
//!                       LayoutResolver (SchemaId -> Arc<Layout>) <---+
//! ```
//!
//! ## Module Structure
//!
//! - `code`: the one-byte wire codes of every type
//! - `layout_type`: `LayoutType`, `LayoutScope` and type argument encoding
//! - `type_argument`: `TypeArgument`, `TypeArgumentList`, `SchemaId`
//! - `bit`: presence and boolean bit allocation
//! - `column`, `builder`, `layout`: the physical layout and its construction
//! - `compiler`: schema to layout compilation
//! - `tokenizer`: path tokens for sparse fields
//! - `resolver`: schema id to layout lookup
//! - `fields`: typed reads and writes of primitive values
//! - `scope`: reads and writes of nested scopes

pub mod bit;
pub mod builder;
pub mod code;
pub mod column;
pub mod compiler;
pub mod fields;
pub mod layout;
pub mod layout_type;
pub mod resolver;
mod scope;
pub mod tokenizer;
pub mod type_argument;

#[cfg(test)]
mod tests;

pub use bit::{BitAllocator, LayoutBit};
pub use builder::LayoutBuilder;
pub use code::LayoutCode;
pub use column::{LayoutColumn, StorageKind};
pub use compiler::LayoutCompiler;
pub use fields::{
    LayoutBinary, LayoutBoolean, LayoutDateTime, LayoutDecimal, LayoutField, LayoutFloat128,
    LayoutFloat32, LayoutFloat64, LayoutGuid, LayoutInt16, LayoutInt32, LayoutInt64, LayoutInt8,
    LayoutMongoDbObjectId, LayoutNull, LayoutUInt16, LayoutUInt32, LayoutUInt64, LayoutUInt8,
    LayoutUnixDateTime, LayoutUtf8, LayoutVarInt, LayoutVarUInt,
};
pub use layout::Layout;
pub use layout_type::{read_type_argument, LayoutScope, LayoutType, ScopeKind};
pub use resolver::{LayoutResolver, LayoutResolverNamespace, LayoutResolverSimple};
pub use tokenizer::{StringToken, StringTokenizer};
pub use type_argument::{SchemaId, TypeArgument, TypeArgumentList};
