//! # HybridRow - Schema-Driven Binary Rows
//!
//! HybridRow is a self-describing binary row format with in-place field
//! access. A schema is compiled once into a layout; rows of that layout are
//! read and written where their values live, without decoding the whole row.
//!
//! - **Fixed columns**: byte-addressed, presence tracked in a bitmask
//! - **Variable columns**: length-prefixed, only present values take space
//! - **Sparse fields**: type-tagged values and nested scopes addressed by path
//!   or position
//!
//! ## Quick Start
//!
//! ```ignore
//! use hybridrow::layouts::{LayoutInt32, LayoutField, LayoutResolverNamespace, LayoutResolver};
//! use hybridrow::row::{HybridRowVersion, RowBuffer, RowCursor, UpdateOptions};
//!
//! let resolver = Arc::new(LayoutResolverNamespace::new(namespace));
//! let layout = resolver.resolve(SchemaId(1))?;
//! let mut row = RowBuffer::init_layout(HybridRowVersion::V1, layout, resolver);
//!
//! let mut cursor = RowCursor::create(&row)?;
//! cursor.find(&row, "age")?;
//! LayoutInt32.write_sparse(&mut row, &mut cursor, 42, UpdateOptions::Upsert)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Schemas (Namespace, Schema)        │
//! ├─────────────────────────────────────┤
//! │   Layout Compiler  │  Resolvers      │
//! ├─────────────────────────────────────┤
//! │   Layouts, Types, Field Accessors    │
//! ├─────────────────────────────────────┤
//! │   RowCursor (navigation)             │
//! ├─────────────────────────────────────┤
//! │   RowBuffer (bytes, sparse engine)   │
//! ├─────────────────────────────────────┤
//! │   Encoding (varints), Config         │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Schema compilation and I/O return `eyre::Result` with context attached.
//! Row operations return [`row::RowResult`], whose [`row::RowError`] kinds are
//! part of the API: callers match on them rather than on messages.

#[macro_use]
mod macros;

pub mod config;
pub mod encoding;
pub mod layouts;
pub mod row;
pub mod schemas;
pub mod types;

pub use layouts::{Layout, LayoutCompiler, LayoutResolver, LayoutScope, LayoutType, SchemaId};
pub use row::{HybridRowVersion, RowBuffer, RowCursor, RowError, RowResult, UpdateOptions};
pub use schemas::{Namespace, PropertyType, Schema, TypeKind};
