//! # Layout Codes
//!
//! A [`LayoutCode`] is the one-byte type tag written in front of every sparse
//! value and inside every encoded type argument. The numeric values are part of
//! the wire format and must never change.
//!
//! ## Discriminant Values
//!
//! | Range | Meaning |
//! |-------|---------|
//! | 0 | Invalid |
//! | 1-3 | Null and the two boolean codes (the value lives in the code) |
//! | 5-24 | Primitive scalars, strings and binary |
//! | 30-53 | Scope types; odd values are the immutable variant |
//! | 68-69 | User defined type (schema) scope |
//! | 70 | End of scope marker |
//!
//! Scope codes come in pairs: `code | 1` is the immutable variant of `code`.

/// Physical type tag of a sparse value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayoutCode {
    Invalid = 0,

    Null = 1,
    BooleanFalse = 2,
    Boolean = 3,

    Int8 = 5,
    Int16 = 6,
    Int32 = 7,
    Int64 = 8,
    UInt8 = 9,
    UInt16 = 10,
    UInt32 = 11,
    UInt64 = 12,
    VarInt = 13,
    VarUInt = 14,

    Float32 = 15,
    Float64 = 16,
    Decimal = 17,
    DateTime = 18,
    Guid = 19,

    Utf8 = 20,
    Binary = 21,

    Float128 = 22,
    UnixDateTime = 23,
    MongoDbObjectId = 24,

    ObjectScope = 30,
    ImmutableObjectScope = 31,
    ArrayScope = 32,
    ImmutableArrayScope = 33,
    TypedArrayScope = 34,
    ImmutableTypedArrayScope = 35,
    TupleScope = 36,
    ImmutableTupleScope = 37,
    TypedTupleScope = 38,
    ImmutableTypedTupleScope = 39,
    MapScope = 40,
    ImmutableMapScope = 41,
    TypedMapScope = 42,
    ImmutableTypedMapScope = 43,
    SetScope = 44,
    ImmutableSetScope = 45,
    TypedSetScope = 46,
    ImmutableTypedSetScope = 47,
    NullableScope = 48,
    ImmutableNullableScope = 49,
    TaggedScope = 50,
    ImmutableTaggedScope = 51,
    Tagged2Scope = 52,
    ImmutableTagged2Scope = 53,

    Schema = 68,
    ImmutableSchema = 69,

    EndScope = 70,
}

impl LayoutCode {
    /// Maps the two boolean codes onto [`LayoutCode::Boolean`].
    pub fn canonicalize(self) -> LayoutCode {
        match self {
            LayoutCode::BooleanFalse => LayoutCode::Boolean,
            other => other,
        }
    }

    /// Codes whose value is carried by the code itself, so the code can never
    /// be elided by a typed scope.
    pub fn always_requires_type_code(self) -> bool {
        matches!(
            self,
            LayoutCode::Boolean | LayoutCode::BooleanFalse | LayoutCode::Null
        )
    }

    pub fn is_immutable_scope(self) -> bool {
        let value = self as u8;
        (LayoutCode::ObjectScope as u8..=LayoutCode::ImmutableSchema as u8).contains(&value)
            && value & 1 == 1
    }
}

impl TryFrom<u8> for LayoutCode {
    type Error = eyre::Report;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LayoutCode::Invalid),
            1 => Ok(LayoutCode::Null),
            2 => Ok(LayoutCode::BooleanFalse),
            3 => Ok(LayoutCode::Boolean),
            5 => Ok(LayoutCode::Int8),
            6 => Ok(LayoutCode::Int16),
            7 => Ok(LayoutCode::Int32),
            8 => Ok(LayoutCode::Int64),
            9 => Ok(LayoutCode::UInt8),
            10 => Ok(LayoutCode::UInt16),
            11 => Ok(LayoutCode::UInt32),
            12 => Ok(LayoutCode::UInt64),
            13 => Ok(LayoutCode::VarInt),
            14 => Ok(LayoutCode::VarUInt),
            15 => Ok(LayoutCode::Float32),
            16 => Ok(LayoutCode::Float64),
            17 => Ok(LayoutCode::Decimal),
            18 => Ok(LayoutCode::DateTime),
            19 => Ok(LayoutCode::Guid),
            20 => Ok(LayoutCode::Utf8),
            21 => Ok(LayoutCode::Binary),
            22 => Ok(LayoutCode::Float128),
            23 => Ok(LayoutCode::UnixDateTime),
            24 => Ok(LayoutCode::MongoDbObjectId),
            30 => Ok(LayoutCode::ObjectScope),
            31 => Ok(LayoutCode::ImmutableObjectScope),
            32 => Ok(LayoutCode::ArrayScope),
            33 => Ok(LayoutCode::ImmutableArrayScope),
            34 => Ok(LayoutCode::TypedArrayScope),
            35 => Ok(LayoutCode::ImmutableTypedArrayScope),
            36 => Ok(LayoutCode::TupleScope),
            37 => Ok(LayoutCode::ImmutableTupleScope),
            38 => Ok(LayoutCode::TypedTupleScope),
            39 => Ok(LayoutCode::ImmutableTypedTupleScope),
            40 => Ok(LayoutCode::MapScope),
            41 => Ok(LayoutCode::ImmutableMapScope),
            42 => Ok(LayoutCode::TypedMapScope),
            43 => Ok(LayoutCode::ImmutableTypedMapScope),
            44 => Ok(LayoutCode::SetScope),
            45 => Ok(LayoutCode::ImmutableSetScope),
            46 => Ok(LayoutCode::TypedSetScope),
            47 => Ok(LayoutCode::ImmutableTypedSetScope),
            48 => Ok(LayoutCode::NullableScope),
            49 => Ok(LayoutCode::ImmutableNullableScope),
            50 => Ok(LayoutCode::TaggedScope),
            51 => Ok(LayoutCode::ImmutableTaggedScope),
            52 => Ok(LayoutCode::Tagged2Scope),
            53 => Ok(LayoutCode::ImmutableTagged2Scope),
            68 => Ok(LayoutCode::Schema),
            69 => Ok(LayoutCode::ImmutableSchema),
            70 => Ok(LayoutCode::EndScope),
            _ => eyre::bail!("invalid LayoutCode: {}", value),
        }
    }
}
