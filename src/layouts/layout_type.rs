//! # Layout Types
//!
//! [`LayoutType`] is the physical type of a column or sparse value. It is a
//! plain `Copy` enum: every type is a stateless descriptor, so columns, cursors
//! and type arguments hold it by value and dispatch with `match`.
//!
//! Scope types are grouped under [`LayoutType::Scope`] and described by a
//! [`LayoutScope`], which pairs the [`ScopeKind`] with the immutability flag
//! that selects between the two wire codes of every scope.
//!
//! ## Scope Traits
//!
//! | Scope | sized | indexed | fixed arity | unique | typed |
//! |-------|-------|---------|-------------|--------|-------|
//! | Object | | | | | |
//! | Array | | x | | | |
//! | TypedArray | x | x | | | x |
//! | TypedSet | x | x | | x | x |
//! | TypedMap | x | x | | x | x |
//! | Tuple | | x | x | | |
//! | TypedTuple | x | x | x | | x |
//! | Tagged, Tagged2 | x | x | x | | x |
//! | Nullable | x | x | x | | x |
//! | UDT | | | | | |
//!
//! - **sized**: the scope is delimited by a count or by its arity instead of an
//!   end-of-scope marker.
//! - **indexed**: elements are addressed by position and carry no path.
//! - **unique**: elements are kept sorted without duplicates.
//! - **typed**: element types are declared by the scope's type arguments.
//!
//! ## Type Argument Encoding
//!
//! ```text
//! primitive        [code]
//! TypedArray<T>    [code][T]
//! TypedMap<K,V>    [code][K][V]
//! TypedTuple<..>   [code][varuint count][T1]..[Tn]
//! Tagged2<T1,T2>   [code][T1][T2]            (the UInt8 tag is implied)
//! UDT              [code][schema id: i32 LE]
//! ```

use smallvec::SmallVec;

use super::code::LayoutCode;
use super::type_argument::{SchemaId, TypeArgument, TypeArgumentList};
use crate::config::{LAYOUT_CODE_SIZE, SCHEMA_ID_SIZE};
use crate::encoding::varint::{decode_varuint, encode_varuint, varuint_len};
use crate::row::{RowError, RowResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Object,
    Array,
    TypedArray,
    TypedSet,
    TypedMap,
    Tuple,
    TypedTuple,
    Tagged,
    Tagged2,
    Nullable,
    Udt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutScope {
    pub kind: ScopeKind,
    pub immutable: bool,
}

macro_rules! scope_consts {
    ($($name:ident, $immutable_name:ident => $kind:ident;)*) => {
        impl LayoutScope {
            $(
                pub const $name: LayoutScope = LayoutScope { kind: ScopeKind::$kind, immutable: false };
                pub const $immutable_name: LayoutScope = LayoutScope { kind: ScopeKind::$kind, immutable: true };
            )*
        }
    };
}

scope_consts! {
    OBJECT, IMMUTABLE_OBJECT => Object;
    ARRAY, IMMUTABLE_ARRAY => Array;
    TYPED_ARRAY, IMMUTABLE_TYPED_ARRAY => TypedArray;
    TYPED_SET, IMMUTABLE_TYPED_SET => TypedSet;
    TYPED_MAP, IMMUTABLE_TYPED_MAP => TypedMap;
    TUPLE, IMMUTABLE_TUPLE => Tuple;
    TYPED_TUPLE, IMMUTABLE_TYPED_TUPLE => TypedTuple;
    TAGGED, IMMUTABLE_TAGGED => Tagged;
    TAGGED2, IMMUTABLE_TAGGED2 => Tagged2;
    NULLABLE, IMMUTABLE_NULLABLE => Nullable;
    UDT, IMMUTABLE_UDT => Udt;
}

impl LayoutScope {
    pub fn new(kind: ScopeKind, immutable: bool) -> Self {
        Self { kind, immutable }
    }

    pub fn code(self) -> LayoutCode {
        let (mutable, immutable) = match self.kind {
            ScopeKind::Object => (LayoutCode::ObjectScope, LayoutCode::ImmutableObjectScope),
            ScopeKind::Array => (LayoutCode::ArrayScope, LayoutCode::ImmutableArrayScope),
            ScopeKind::TypedArray => (
                LayoutCode::TypedArrayScope,
                LayoutCode::ImmutableTypedArrayScope,
            ),
            ScopeKind::TypedSet => (LayoutCode::TypedSetScope, LayoutCode::ImmutableTypedSetScope),
            ScopeKind::TypedMap => (LayoutCode::TypedMapScope, LayoutCode::ImmutableTypedMapScope),
            ScopeKind::Tuple => (LayoutCode::TupleScope, LayoutCode::ImmutableTupleScope),
            ScopeKind::TypedTuple => (
                LayoutCode::TypedTupleScope,
                LayoutCode::ImmutableTypedTupleScope,
            ),
            ScopeKind::Tagged => (LayoutCode::TaggedScope, LayoutCode::ImmutableTaggedScope),
            ScopeKind::Tagged2 => (LayoutCode::Tagged2Scope, LayoutCode::ImmutableTagged2Scope),
            ScopeKind::Nullable => (LayoutCode::NullableScope, LayoutCode::ImmutableNullableScope),
            ScopeKind::Udt => (LayoutCode::Schema, LayoutCode::ImmutableSchema),
        };
        if self.immutable {
            immutable
        } else {
            mutable
        }
    }

    pub fn name(self) -> &'static str {
        match (self.kind, self.immutable) {
            (ScopeKind::Object, false) => "object",
            (ScopeKind::Object, true) => "im_object",
            (ScopeKind::Array, false) => "array",
            (ScopeKind::Array, true) => "im_array",
            (ScopeKind::TypedArray, false) => "array_t",
            (ScopeKind::TypedArray, true) => "im_array_t",
            (ScopeKind::TypedSet, false) => "set_t",
            (ScopeKind::TypedSet, true) => "im_set_t",
            (ScopeKind::TypedMap, false) => "map_t",
            (ScopeKind::TypedMap, true) => "im_map_t",
            (ScopeKind::Tuple, false) => "tuple",
            (ScopeKind::Tuple, true) => "im_tuple",
            (ScopeKind::TypedTuple, false) => "tuple_t",
            (ScopeKind::TypedTuple, true) => "im_tuple_t",
            (ScopeKind::Tagged, false) => "tagged_t",
            (ScopeKind::Tagged, true) => "im_tagged_t",
            (ScopeKind::Tagged2, false) => "tagged2_t",
            (ScopeKind::Tagged2, true) => "im_tagged2_t",
            (ScopeKind::Nullable, false) => "nullable",
            (ScopeKind::Nullable, true) => "im_nullable",
            (ScopeKind::Udt, false) => "udt",
            (ScopeKind::Udt, true) => "im_udt",
        }
    }

    pub fn is_sized_scope(self) -> bool {
        matches!(
            self.kind,
            ScopeKind::TypedArray
                | ScopeKind::TypedSet
                | ScopeKind::TypedMap
                | ScopeKind::TypedTuple
                | ScopeKind::Tagged
                | ScopeKind::Tagged2
                | ScopeKind::Nullable
        )
    }

    pub fn is_indexed_scope(self) -> bool {
        !matches!(self.kind, ScopeKind::Object | ScopeKind::Udt)
    }

    pub fn is_fixed_arity(self) -> bool {
        matches!(
            self.kind,
            ScopeKind::Tuple
                | ScopeKind::TypedTuple
                | ScopeKind::Tagged
                | ScopeKind::Tagged2
                | ScopeKind::Nullable
        )
    }

    pub fn is_unique_scope(self) -> bool {
        matches!(self.kind, ScopeKind::TypedSet | ScopeKind::TypedMap)
    }

    pub fn is_typed_scope(self) -> bool {
        self.is_sized_scope()
    }

    pub fn is_udt(self) -> bool {
        self.kind == ScopeKind::Udt
    }

    fn count_type_argument(self, args: &TypeArgumentList) -> usize {
        match self.kind {
            ScopeKind::Object | ScopeKind::Array => 0,
            ScopeKind::TypedArray | ScopeKind::TypedSet | ScopeKind::Nullable => {
                count_arguments(&args.as_slice()[..1.min(args.len())])
            }
            ScopeKind::TypedMap => count_arguments(&args.as_slice()[..2.min(args.len())]),
            ScopeKind::Tuple | ScopeKind::TypedTuple => {
                varuint_len(args.len() as u64) + count_arguments(args.as_slice())
            }
            ScopeKind::Tagged | ScopeKind::Tagged2 => {
                count_arguments(args.as_slice().get(1..).unwrap_or(&[]))
            }
            ScopeKind::Udt => SCHEMA_ID_SIZE,
        }
    }

    fn write_type_argument(self, buf: &mut [u8], args: &TypeArgumentList) -> usize {
        match self.kind {
            ScopeKind::Object | ScopeKind::Array => 0,
            ScopeKind::TypedArray | ScopeKind::TypedSet | ScopeKind::Nullable => {
                write_arguments(buf, &args.as_slice()[..1.min(args.len())])
            }
            ScopeKind::TypedMap => write_arguments(buf, &args.as_slice()[..2.min(args.len())]),
            ScopeKind::Tuple | ScopeKind::TypedTuple => {
                let len = encode_varuint(args.len() as u64, buf);
                len + write_arguments(&mut buf[len..], args.as_slice())
            }
            ScopeKind::Tagged | ScopeKind::Tagged2 => {
                write_arguments(buf, args.as_slice().get(1..).unwrap_or(&[]))
            }
            ScopeKind::Udt => {
                buf[..SCHEMA_ID_SIZE].copy_from_slice(&args.schema_id().id().to_le_bytes());
                SCHEMA_ID_SIZE
            }
        }
    }

    fn read_type_argument_list(self, buf: &[u8]) -> RowResult<(TypeArgumentList, usize)> {
        match self.kind {
            ScopeKind::Object | ScopeKind::Array => Ok((TypeArgumentList::EMPTY, 0)),
            ScopeKind::TypedArray | ScopeKind::TypedSet | ScopeKind::Nullable => {
                read_arguments(buf, 1, SmallVec::new())
            }
            ScopeKind::TypedMap => read_arguments(buf, 2, SmallVec::new()),
            ScopeKind::Tuple | ScopeKind::TypedTuple => {
                let (count, len) = decode_varuint(buf).map_err(|_| RowError::InvalidRow)?;
                if count as usize > buf.len() {
                    return Err(RowError::InvalidRow);
                }
                let (list, args_len) = read_arguments(&buf[len..], count as usize, SmallVec::new())?;
                Ok((list, len + args_len))
            }
            ScopeKind::Tagged | ScopeKind::Tagged2 => {
                let count = if self.kind == ScopeKind::Tagged { 1 } else { 2 };
                let mut prefix = SmallVec::new();
                prefix.push(TypeArgument::new(LayoutType::UInt8));
                read_arguments(buf, count, prefix)
            }
            ScopeKind::Udt => {
                let bytes = buf.get(..SCHEMA_ID_SIZE).ok_or(RowError::InvalidRow)?;
                let mut raw = [0u8; SCHEMA_ID_SIZE];
                raw.copy_from_slice(bytes);
                let schema_id = SchemaId(i32::from_le_bytes(raw));
                Ok((TypeArgumentList::from_schema_id(schema_id), SCHEMA_ID_SIZE))
            }
        }
    }
}

fn count_arguments(args: &[TypeArgument]) -> usize {
    args.iter()
        .map(|arg| arg.layout_type().count_type_argument(arg.type_args()))
        .sum()
}

fn write_arguments(buf: &mut [u8], args: &[TypeArgument]) -> usize {
    let mut offset = 0;
    for arg in args {
        offset += arg
            .layout_type()
            .write_type_argument(&mut buf[offset..], arg.type_args());
    }
    offset
}

fn read_arguments(
    buf: &[u8],
    count: usize,
    mut args: SmallVec<[TypeArgument; 4]>,
) -> RowResult<(TypeArgumentList, usize)> {
    let mut offset = 0;
    for _ in 0..count {
        let (arg, len) = read_type_argument(buf.get(offset..).ok_or(RowError::InvalidRow)?)?;
        args.push(arg);
        offset += len;
    }
    Ok((TypeArgumentList::new(args.into_vec()), offset))
}

/// Decodes one `[code][arguments]` type argument from the front of `buf`.
pub fn read_type_argument(buf: &[u8]) -> RowResult<(TypeArgument, usize)> {
    let code = *buf.first().ok_or(RowError::InvalidRow)?;
    let layout_type = LayoutType::from_byte(code)?;
    let (type_args, len) = layout_type.read_type_argument_list(&buf[LAYOUT_CODE_SIZE..])?;
    Ok((
        TypeArgument::with_args(layout_type, type_args),
        LAYOUT_CODE_SIZE + len,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutType {
    Null,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    VarInt,
    VarUInt,
    Float32,
    Float64,
    Float128,
    Decimal,
    DateTime,
    UnixDateTime,
    Guid,
    MongoDbObjectId,
    Utf8,
    Binary,
    EndScope,
    Scope(LayoutScope),
}

impl LayoutType {
    pub fn code(self) -> LayoutCode {
        match self {
            LayoutType::Null => LayoutCode::Null,
            LayoutType::Boolean => LayoutCode::Boolean,
            LayoutType::Int8 => LayoutCode::Int8,
            LayoutType::Int16 => LayoutCode::Int16,
            LayoutType::Int32 => LayoutCode::Int32,
            LayoutType::Int64 => LayoutCode::Int64,
            LayoutType::UInt8 => LayoutCode::UInt8,
            LayoutType::UInt16 => LayoutCode::UInt16,
            LayoutType::UInt32 => LayoutCode::UInt32,
            LayoutType::UInt64 => LayoutCode::UInt64,
            LayoutType::VarInt => LayoutCode::VarInt,
            LayoutType::VarUInt => LayoutCode::VarUInt,
            LayoutType::Float32 => LayoutCode::Float32,
            LayoutType::Float64 => LayoutCode::Float64,
            LayoutType::Float128 => LayoutCode::Float128,
            LayoutType::Decimal => LayoutCode::Decimal,
            LayoutType::DateTime => LayoutCode::DateTime,
            LayoutType::UnixDateTime => LayoutCode::UnixDateTime,
            LayoutType::Guid => LayoutCode::Guid,
            LayoutType::MongoDbObjectId => LayoutCode::MongoDbObjectId,
            LayoutType::Utf8 => LayoutCode::Utf8,
            LayoutType::Binary => LayoutCode::Binary,
            LayoutType::EndScope => LayoutCode::EndScope,
            LayoutType::Scope(scope) => scope.code(),
        }
    }

    /// Maps a wire code onto its type. Both boolean codes map to
    /// [`LayoutType::Boolean`]; the reserved untyped map/set codes have no type.
    pub fn from_code(code: LayoutCode) -> Option<LayoutType> {
        let scope = |kind, immutable| Some(LayoutType::Scope(LayoutScope::new(kind, immutable)));
        match code {
            LayoutCode::Invalid | LayoutCode::MapScope | LayoutCode::ImmutableMapScope => None,
            LayoutCode::SetScope | LayoutCode::ImmutableSetScope => None,
            LayoutCode::Null => Some(LayoutType::Null),
            LayoutCode::BooleanFalse | LayoutCode::Boolean => Some(LayoutType::Boolean),
            LayoutCode::Int8 => Some(LayoutType::Int8),
            LayoutCode::Int16 => Some(LayoutType::Int16),
            LayoutCode::Int32 => Some(LayoutType::Int32),
            LayoutCode::Int64 => Some(LayoutType::Int64),
            LayoutCode::UInt8 => Some(LayoutType::UInt8),
            LayoutCode::UInt16 => Some(LayoutType::UInt16),
            LayoutCode::UInt32 => Some(LayoutType::UInt32),
            LayoutCode::UInt64 => Some(LayoutType::UInt64),
            LayoutCode::VarInt => Some(LayoutType::VarInt),
            LayoutCode::VarUInt => Some(LayoutType::VarUInt),
            LayoutCode::Float32 => Some(LayoutType::Float32),
            LayoutCode::Float64 => Some(LayoutType::Float64),
            LayoutCode::Decimal => Some(LayoutType::Decimal),
            LayoutCode::DateTime => Some(LayoutType::DateTime),
            LayoutCode::Guid => Some(LayoutType::Guid),
            LayoutCode::Utf8 => Some(LayoutType::Utf8),
            LayoutCode::Binary => Some(LayoutType::Binary),
            LayoutCode::Float128 => Some(LayoutType::Float128),
            LayoutCode::UnixDateTime => Some(LayoutType::UnixDateTime),
            LayoutCode::MongoDbObjectId => Some(LayoutType::MongoDbObjectId),
            LayoutCode::ObjectScope => scope(ScopeKind::Object, false),
            LayoutCode::ImmutableObjectScope => scope(ScopeKind::Object, true),
            LayoutCode::ArrayScope => scope(ScopeKind::Array, false),
            LayoutCode::ImmutableArrayScope => scope(ScopeKind::Array, true),
            LayoutCode::TypedArrayScope => scope(ScopeKind::TypedArray, false),
            LayoutCode::ImmutableTypedArrayScope => scope(ScopeKind::TypedArray, true),
            LayoutCode::TupleScope => scope(ScopeKind::Tuple, false),
            LayoutCode::ImmutableTupleScope => scope(ScopeKind::Tuple, true),
            LayoutCode::TypedTupleScope => scope(ScopeKind::TypedTuple, false),
            LayoutCode::ImmutableTypedTupleScope => scope(ScopeKind::TypedTuple, true),
            LayoutCode::TypedMapScope => scope(ScopeKind::TypedMap, false),
            LayoutCode::ImmutableTypedMapScope => scope(ScopeKind::TypedMap, true),
            LayoutCode::TypedSetScope => scope(ScopeKind::TypedSet, false),
            LayoutCode::ImmutableTypedSetScope => scope(ScopeKind::TypedSet, true),
            LayoutCode::NullableScope => scope(ScopeKind::Nullable, false),
            LayoutCode::ImmutableNullableScope => scope(ScopeKind::Nullable, true),
            LayoutCode::TaggedScope => scope(ScopeKind::Tagged, false),
            LayoutCode::ImmutableTaggedScope => scope(ScopeKind::Tagged, true),
            LayoutCode::Tagged2Scope => scope(ScopeKind::Tagged2, false),
            LayoutCode::ImmutableTagged2Scope => scope(ScopeKind::Tagged2, true),
            LayoutCode::Schema => scope(ScopeKind::Udt, false),
            LayoutCode::ImmutableSchema => scope(ScopeKind::Udt, true),
            LayoutCode::EndScope => Some(LayoutType::EndScope),
        }
    }

    /// Decodes a type code read from a row.
    pub(crate) fn from_byte(byte: u8) -> RowResult<LayoutType> {
        LayoutCode::try_from(byte)
            .ok()
            .and_then(LayoutType::from_code)
            .ok_or(RowError::InvalidRow)
    }

    pub fn name(self) -> &'static str {
        match self {
            LayoutType::Null => "null",
            LayoutType::Boolean => "bool",
            LayoutType::Int8 => "int8",
            LayoutType::Int16 => "int16",
            LayoutType::Int32 => "int32",
            LayoutType::Int64 => "int64",
            LayoutType::UInt8 => "uint8",
            LayoutType::UInt16 => "uint16",
            LayoutType::UInt32 => "uint32",
            LayoutType::UInt64 => "uint64",
            LayoutType::VarInt => "varint",
            LayoutType::VarUInt => "varuint",
            LayoutType::Float32 => "float32",
            LayoutType::Float64 => "float64",
            LayoutType::Float128 => "float128",
            LayoutType::Decimal => "decimal",
            LayoutType::DateTime => "datetime",
            LayoutType::UnixDateTime => "unixdatetime",
            LayoutType::Guid => "guid",
            LayoutType::MongoDbObjectId => "mongodbobjectid",
            LayoutType::Utf8 => "utf8",
            LayoutType::Binary => "binary",
            LayoutType::EndScope => "end",
            LayoutType::Scope(scope) => scope.name(),
        }
    }

    /// Encoded width of a fixed value; zero for null, boolean (bit) and
    /// non-fixed types.
    pub fn size(self) -> usize {
        match self {
            LayoutType::Int8 | LayoutType::UInt8 => 1,
            LayoutType::Int16 | LayoutType::UInt16 => 2,
            LayoutType::Int32 | LayoutType::UInt32 | LayoutType::Float32 => 4,
            LayoutType::Int64
            | LayoutType::UInt64
            | LayoutType::Float64
            | LayoutType::DateTime
            | LayoutType::UnixDateTime => 8,
            LayoutType::MongoDbObjectId => 12,
            LayoutType::Float128 | LayoutType::Decimal | LayoutType::Guid => 16,
            _ => 0,
        }
    }

    pub fn is_fixed(self) -> bool {
        matches!(
            self,
            LayoutType::Null
                | LayoutType::Boolean
                | LayoutType::Int8
                | LayoutType::Int16
                | LayoutType::Int32
                | LayoutType::Int64
                | LayoutType::UInt8
                | LayoutType::UInt16
                | LayoutType::UInt32
                | LayoutType::UInt64
                | LayoutType::Float32
                | LayoutType::Float64
                | LayoutType::Float128
                | LayoutType::Decimal
                | LayoutType::DateTime
                | LayoutType::UnixDateTime
                | LayoutType::Guid
                | LayoutType::MongoDbObjectId
        )
    }

    pub fn is_varint(self) -> bool {
        matches!(self, LayoutType::VarInt | LayoutType::VarUInt)
    }

    pub fn is_bool(self) -> bool {
        self == LayoutType::Boolean
    }

    pub fn is_null(self) -> bool {
        self == LayoutType::Null
    }

    /// Types that may be stored in the variable segment of a layout.
    pub fn allow_variable(self) -> bool {
        matches!(
            self,
            LayoutType::Utf8 | LayoutType::Binary | LayoutType::VarInt | LayoutType::VarUInt
        )
    }

    pub fn as_scope(self) -> Option<LayoutScope> {
        match self {
            LayoutType::Scope(scope) => Some(scope),
            _ => None,
        }
    }

    pub fn is_scope(self) -> bool {
        matches!(self, LayoutType::Scope(_))
    }

    pub fn immutable(self) -> bool {
        matches!(self, LayoutType::Scope(scope) if scope.immutable)
    }

    /// Number of bytes [`LayoutType::write_type_argument`] writes.
    pub fn count_type_argument(self, args: &TypeArgumentList) -> usize {
        LAYOUT_CODE_SIZE
            + match self {
                LayoutType::Scope(scope) => scope.count_type_argument(args),
                _ => 0,
            }
    }

    /// Writes the type code followed by the encoded type arguments.
    pub fn write_type_argument(self, buf: &mut [u8], args: &TypeArgumentList) -> usize {
        buf[0] = self.code() as u8;
        LAYOUT_CODE_SIZE
            + match self {
                LayoutType::Scope(scope) => {
                    scope.write_type_argument(&mut buf[LAYOUT_CODE_SIZE..], args)
                }
                _ => 0,
            }
    }

    /// Reads the type arguments that follow this type's code in `buf`.
    pub fn read_type_argument_list(self, buf: &[u8]) -> RowResult<(TypeArgumentList, usize)> {
        match self {
            LayoutType::Scope(scope) => scope.read_type_argument_list(buf),
            _ => Ok((TypeArgumentList::EMPTY, 0)),
        }
    }
}

impl From<LayoutScope> for LayoutType {
    fn from(scope: LayoutScope) -> Self {
        LayoutType::Scope(scope)
    }
}
