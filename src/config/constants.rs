//! # HybridRow Configuration Constants
//!
//! This module centralizes all format constants, grouping interdependent values
//! together and documenting their relationships.
//!
//! ## Dependency Graph
//!
//! ```text
//! HYBRID_ROW_HEADER_SIZE (5 bytes)
//!       │
//!       ├─> HYBRID_ROW_VERSION_SIZE (1 byte, version tag)
//!       │
//!       └─> SCHEMA_ID_SIZE (4 bytes, little-endian i32)
//!
//! LAYOUT_CODE_SIZE (1 byte)
//!       │
//!       ├─> every sparse type tag
//!       └─> the EndScope terminator of object/array/tuple/UDT scopes
//!
//! MIN_TAGGED_ARGUMENTS (1) ..= MAX_TAGGED_ARGUMENTS (2)
//!       │
//!       └─> Tagged (1 payload) / Tagged2 (2 payloads)
//! ```
//!
//! ## Critical Invariants
//!
//! 1. `HYBRID_ROW_HEADER_SIZE == HYBRID_ROW_VERSION_SIZE + SCHEMA_ID_SIZE`
//! 2. `MIN_TAGGED_ARGUMENTS <= MAX_TAGGED_ARGUMENTS`
//! 3. `SAMPLING_HASH_SAMPLES > 0`

// ============================================================================
// ROW HEADER
// ============================================================================

/// Size of the version tag at the start of every row.
pub const HYBRID_ROW_VERSION_SIZE: usize = 1;

/// Size of an encoded schema id (little-endian i32).
pub const SCHEMA_ID_SIZE: usize = 4;

/// Total size of the row header: version tag followed by the root schema id.
pub const HYBRID_ROW_HEADER_SIZE: usize = HYBRID_ROW_VERSION_SIZE + SCHEMA_ID_SIZE;

const _: () = assert!(
    HYBRID_ROW_HEADER_SIZE == HYBRID_ROW_VERSION_SIZE + SCHEMA_ID_SIZE,
    "HYBRID_ROW_HEADER_SIZE derivation mismatch"
);

// ============================================================================
// SPARSE ENCODING
// ============================================================================

/// Size of a layout code (sparse type tag).
pub const LAYOUT_CODE_SIZE: usize = 1;

/// Size of the element count that prefixes typed arrays, sets and maps.
pub const TYPED_COLLECTION_COUNT_SIZE: usize = 4;

/// Size of the has-value flag that prefixes a nullable scope.
pub const NULLABLE_HAS_VALUE_SIZE: usize = 1;

/// Maximum number of bytes of a 7-bit encoded u64.
pub const MAX_VARINT_LEN: usize = 10;

// ============================================================================
// SCHEMA COMPILATION
// ============================================================================

/// Minimum number of payload arguments of a tagged type.
pub const MIN_TAGGED_ARGUMENTS: usize = 1;

/// Maximum number of payload arguments of a tagged type.
pub const MAX_TAGGED_ARGUMENTS: usize = 2;

const _: () = assert!(
    MIN_TAGGED_ARGUMENTS <= MAX_TAGGED_ARGUMENTS,
    "tagged arity bounds are inverted"
);

/// Name of the synthetic column that holds an inherited base schema.
pub const BASE_COLUMN_NAME: &str = "__base";

// ============================================================================
// PATH TOKENIZER
// ============================================================================

/// Number of bytes sampled by the tokenizer's hash function.
pub const SAMPLING_HASH_SAMPLES: usize = 4;

/// Distance between two sampled bytes.
pub const SAMPLING_HASH_STRIDE: usize = 13;

const _: () = assert!(SAMPLING_HASH_SAMPLES > 0, "sampling hash needs samples");

// ============================================================================
// ROW BUFFER
// ============================================================================

/// Initial capacity of a row buffer created without an explicit size.
pub const DEFAULT_ROW_CAPACITY: usize = 512;

const _: () = assert!(
    DEFAULT_ROW_CAPACITY >= HYBRID_ROW_HEADER_SIZE,
    "default capacity must hold at least a row header"
);
