//! # Logical Schema Model
//!
//! The in-memory description of a namespace of schemas that the
//! [`LayoutCompiler`](crate::layouts::LayoutCompiler) turns into physical
//! layouts. There is no parser here: schemas are constructed in code.
//!
//! ## Shape
//!
//! ```text
//! Namespace
//!   ├── version: SchemaLanguageVersion
//!   ├── schemas: [Schema]
//!   │     ├── name, schema_id, optional base schema
//!   │     └── properties: [Property { path, property_type }]
//!   └── enums: [EnumSchema { name, base_type, values }]
//! ```
//!
//! A [`PropertyType`] is either a primitive (with a storage kind and optional
//! length) or a scope (object, array, set, map, tuple, tagged, UDT reference).
//! Every property type carries a `nullable` flag; scope types additionally
//! carry an `immutable` flag.

use crate::layouts::{SchemaId, StorageKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SchemaLanguageVersion {
    V1,
    #[default]
    V2,
}

/// Logical primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Any type; only meaningful as the item type of an untyped array.
    Any,
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
}

#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub name: String,
    pub version: SchemaLanguageVersion,
    pub schemas: Vec<Schema>,
    pub enums: Vec<EnumSchema>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: SchemaLanguageVersion::default(),
            schemas: Vec::new(),
            enums: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: SchemaLanguageVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn with_enum(mut self, schema: EnumSchema) -> Self {
        self.enums.push(schema);
        self
    }

    pub fn find_schema(&self, schema_id: SchemaId) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.schema_id == schema_id)
    }

    pub fn find_enum(&self, name: &str) -> Option<&EnumSchema> {
        self.enums.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    pub schema_id: SchemaId,
    pub base_name: Option<String>,
    pub base_schema_id: SchemaId,
    pub properties: Vec<Property>,
}

impl Schema {
    pub fn new(name: impl Into<String>, schema_id: SchemaId) -> Self {
        Self {
            name: name.into(),
            schema_id,
            base_name: None,
            base_schema_id: SchemaId::INVALID,
            properties: Vec::new(),
        }
    }

    /// Inherits from the schema named `name`; `schema_id` may be
    /// [`SchemaId::INVALID`] to resolve by name alone.
    pub fn with_base(mut self, name: impl Into<String>, schema_id: SchemaId) -> Self {
        self.base_name = Some(name.into());
        self.base_schema_id = schema_id;
        self
    }

    pub fn with_property(mut self, path: impl Into<String>, property_type: PropertyType) -> Self {
        self.properties.push(Property::new(path, property_type));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub path: String,
    pub property_type: PropertyType,
}

impl Property {
    pub fn new(path: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            path: path.into(),
            property_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub name: String,
    pub base_type: TypeKind,
    pub values: Vec<(String, i64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyType {
    pub kind: PropertyKind,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Primitive {
        type_kind: TypeKind,
        storage: StorageKind,
        length: usize,
    },
    Enum {
        name: String,
        storage: StorageKind,
    },
    Object {
        properties: Vec<Property>,
        immutable: bool,
    },
    Array {
        items: Box<PropertyType>,
        immutable: bool,
    },
    Set {
        items: Box<PropertyType>,
        immutable: bool,
    },
    Map {
        keys: Box<PropertyType>,
        values: Box<PropertyType>,
        immutable: bool,
    },
    Tuple {
        items: Vec<PropertyType>,
        immutable: bool,
    },
    Tagged {
        items: Vec<PropertyType>,
        immutable: bool,
    },
    Udt {
        name: String,
        schema_id: SchemaId,
        immutable: bool,
    },
}

impl PropertyType {
    /// A nullable sparse primitive.
    pub fn sparse(type_kind: TypeKind) -> Self {
        Self::primitive(type_kind, StorageKind::Sparse, 0)
    }

    pub fn fixed(type_kind: TypeKind) -> Self {
        Self::primitive(type_kind, StorageKind::Fixed, 0)
    }

    pub fn variable(type_kind: TypeKind) -> Self {
        Self::primitive(type_kind, StorageKind::Variable, 0)
    }

    pub fn primitive(type_kind: TypeKind, storage: StorageKind, length: usize) -> Self {
        Self {
            kind: PropertyKind::Primitive {
                type_kind,
                storage,
                length,
            },
            nullable: true,
        }
    }

    pub fn enumeration(name: impl Into<String>, storage: StorageKind) -> Self {
        Self {
            kind: PropertyKind::Enum {
                name: name.into(),
                storage,
            },
            nullable: true,
        }
    }

    pub fn object(properties: Vec<Property>) -> Self {
        Self::scope(PropertyKind::Object {
            properties,
            immutable: false,
        })
    }

    pub fn array(items: PropertyType) -> Self {
        Self::scope(PropertyKind::Array {
            items: Box::new(items),
            immutable: false,
        })
    }

    pub fn set(items: PropertyType) -> Self {
        Self::scope(PropertyKind::Set {
            items: Box::new(items),
            immutable: false,
        })
    }

    pub fn map(keys: PropertyType, values: PropertyType) -> Self {
        Self::scope(PropertyKind::Map {
            keys: Box::new(keys),
            values: Box::new(values),
            immutable: false,
        })
    }

    pub fn tuple(items: Vec<PropertyType>) -> Self {
        Self::scope(PropertyKind::Tuple {
            items,
            immutable: false,
        })
    }

    pub fn tagged(items: Vec<PropertyType>) -> Self {
        Self::scope(PropertyKind::Tagged {
            items,
            immutable: false,
        })
    }

    pub fn udt(name: impl Into<String>, schema_id: SchemaId) -> Self {
        Self::scope(PropertyKind::Udt {
            name: name.into(),
            schema_id,
            immutable: false,
        })
    }

    fn scope(kind: PropertyKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Marks a scope type immutable; has no effect on primitives.
    pub fn with_immutable(mut self, value: bool) -> Self {
        match &mut self.kind {
            PropertyKind::Object { immutable, .. }
            | PropertyKind::Array { immutable, .. }
            | PropertyKind::Set { immutable, .. }
            | PropertyKind::Map { immutable, .. }
            | PropertyKind::Tuple { immutable, .. }
            | PropertyKind::Tagged { immutable, .. }
            | PropertyKind::Udt { immutable, .. } => *immutable = value,
            PropertyKind::Primitive { .. } | PropertyKind::Enum { .. } => {}
        }
        self
    }

    pub fn is_any(&self) -> bool {
        matches!(
            self.kind,
            PropertyKind::Primitive {
                type_kind: TypeKind::Any,
                ..
            }
        )
    }
}
