//! # Layout Compiler
//!
//! Translates a logical [`Schema`] into a physical [`Layout`].
//!
//! ## Compilation Rules
//!
//! | Logical | Physical |
//! |---------|----------|
//! | base schema | sparse `udt` column named `__base`, first |
//! | primitive, `Fixed` storage | fixed column (schema scope only) |
//! | primitive, `Variable` storage | variable column (schema scope only, nullable) |
//! | primitive, `Sparse` storage | sparse column (nullable) |
//! | enum | its base integer type (language V2 and later) |
//! | object | sparse object scope, properties nested under it |
//! | array of `Any` | untyped array |
//! | array / set of `T` | typed array / typed set |
//! | map of `K` to `V` | typed map |
//! | tuple | typed tuple |
//! | tagged of 1 or 2 items | tagged / tagged2 with an implied `uint8` tag |
//! | UDT reference | `udt` scope carrying the referenced schema id |
//!
//! Nullable items of collections, tuples and tagged types are wrapped in a
//! `nullable` scope. Every violation is reported as an `eyre` error naming the
//! offending property; compilation never touches a row.

use eyre::{bail, ensure, eyre, Result, WrapErr};
use log::debug;

use super::builder::LayoutBuilder;
use super::column::StorageKind;
use super::layout::Layout;
use super::layout_type::{LayoutScope, LayoutType, ScopeKind};
use super::type_argument::{SchemaId, TypeArgument, TypeArgumentList};
use crate::config::{BASE_COLUMN_NAME, MAX_TAGGED_ARGUMENTS, MIN_TAGGED_ARGUMENTS};
use crate::schemas::{
    Namespace, Property, PropertyKind, PropertyType, Schema, SchemaLanguageVersion, TypeKind,
};

pub struct LayoutCompiler;

impl LayoutCompiler {
    pub fn compile(ns: &Namespace, schema: &Schema) -> Result<Layout> {
        ensure!(
            !schema.name.trim().is_empty(),
            "layout compilation errors: schema {} has no name",
            schema.schema_id
        );

        let mut builder = LayoutBuilder::new(schema.name.clone(), schema.schema_id);
        Self::add_base(&mut builder, ns, schema)?;
        Self::add_properties(&mut builder, ns, ScopeKind::Udt, &schema.properties)
            .wrap_err_with(|| format!("layout compilation errors in schema '{}'", schema.name))?;

        let layout = builder.build()?;
        debug!(
            "compiled layout '{}' ({}): {} columns, {} fixed bytes",
            layout.name(),
            layout.schema_id(),
            layout.columns().len(),
            layout.size()
        );
        Ok(layout)
    }

    fn add_base(builder: &mut LayoutBuilder, ns: &Namespace, schema: &Schema) -> Result<()> {
        if let Some(base_name) = &schema.base_name {
            let base = find_schema(ns, base_name, schema.base_schema_id)?;
            builder.add_sparse_column(
                BASE_COLUMN_NAME,
                LayoutType::Scope(LayoutScope::UDT),
                TypeArgumentList::from_schema_id(base.schema_id),
            )?;
        }
        Ok(())
    }

    fn add_properties(
        builder: &mut LayoutBuilder,
        ns: &Namespace,
        scope: ScopeKind,
        properties: &[Property],
    ) -> Result<()> {
        for property in properties {
            Self::add_property(builder, ns, scope, property)
                .wrap_err_with(|| format!("property '{}'", property.path))?;
        }
        Ok(())
    }

    fn add_property(
        builder: &mut LayoutBuilder,
        ns: &Namespace,
        scope: ScopeKind,
        property: &Property,
    ) -> Result<()> {
        let pt = &property.property_type;
        let (layout_type, type_args) = logical_to_physical(ns, pt)?;

        match layout_type.as_scope().map(|s| s.kind) {
            Some(ScopeKind::Nullable) => bail!("nullables cannot be explicitly declared as columns"),
            Some(ScopeKind::Object) => {
                ensure!(pt.nullable, "non-nullable sparse columns are not supported");
                let PropertyKind::Object { properties, .. } = &pt.kind else {
                    bail!("object scope without object properties");
                };
                builder.add_object_scope(&property.path, layout_type)?;
                Self::add_properties(builder, ns, ScopeKind::Object, properties)?;
                builder.end_object_scope()
            }
            Some(_) => {
                ensure!(pt.nullable, "non-nullable sparse columns are not supported");
                builder.add_sparse_column(&property.path, layout_type, type_args)
            }
            None => {
                let (storage, length) = match &pt.kind {
                    PropertyKind::Primitive {
                        storage, length, ..
                    } => (*storage, *length),
                    PropertyKind::Enum { storage, .. } => (*storage, 0),
                    _ => bail!("unknown property type: {}", layout_type.name()),
                };

                match storage {
                    StorageKind::Fixed => {
                        ensure!(
                            scope == ScopeKind::Udt,
                            "cannot have fixed storage within a sparse scope"
                        );
                        ensure!(
                            !(layout_type.is_null() && !pt.nullable),
                            "non-nullable null columns are not supported"
                        );
                        builder.add_fixed_column(&property.path, layout_type, pt.nullable, length)
                    }
                    StorageKind::Variable => {
                        ensure!(
                            scope == ScopeKind::Udt,
                            "cannot have variable storage within a sparse scope"
                        );
                        ensure!(pt.nullable, "non-nullable variable columns are not supported");
                        builder.add_variable_column(&property.path, layout_type, length)
                    }
                    StorageKind::Sparse => {
                        ensure!(pt.nullable, "non-nullable sparse columns are not supported");
                        builder.add_sparse_column(
                            &property.path,
                            layout_type,
                            TypeArgumentList::EMPTY,
                        )
                    }
                }
            }
        }
    }
}

fn find_schema<'a>(ns: &'a Namespace, name: &str, schema_id: SchemaId) -> Result<&'a Schema> {
    if schema_id.is_valid() {
        let schema = ns
            .find_schema(schema_id)
            .ok_or_else(|| eyre!("cannot resolve schema reference '{}:{}'", name, schema_id))?;
        ensure!(
            schema.name == name,
            "ambiguous schema reference: '{}:{}'",
            name,
            schema_id
        );
        return Ok(schema);
    }

    let mut matches = ns.schemas.iter().filter(|s| s.name == name);
    let schema = matches
        .next()
        .ok_or_else(|| eyre!("cannot resolve schema reference '{}'", name))?;
    ensure!(
        matches.next().is_none(),
        "ambiguous schema reference: '{}'",
        name
    );
    Ok(schema)
}

fn primitive_type(type_kind: TypeKind) -> Result<LayoutType> {
    Ok(match type_kind {
        TypeKind::Null => LayoutType::Null,
        TypeKind::Boolean => LayoutType::Boolean,
        TypeKind::Int8 => LayoutType::Int8,
        TypeKind::Int16 => LayoutType::Int16,
        TypeKind::Int32 => LayoutType::Int32,
        TypeKind::Int64 => LayoutType::Int64,
        TypeKind::UInt8 => LayoutType::UInt8,
        TypeKind::UInt16 => LayoutType::UInt16,
        TypeKind::UInt32 => LayoutType::UInt32,
        TypeKind::UInt64 => LayoutType::UInt64,
        TypeKind::VarInt => LayoutType::VarInt,
        TypeKind::VarUInt => LayoutType::VarUInt,
        TypeKind::Float32 => LayoutType::Float32,
        TypeKind::Float64 => LayoutType::Float64,
        TypeKind::Float128 => LayoutType::Float128,
        TypeKind::Decimal => LayoutType::Decimal,
        TypeKind::DateTime => LayoutType::DateTime,
        TypeKind::UnixDateTime => LayoutType::UnixDateTime,
        TypeKind::Guid => LayoutType::Guid,
        TypeKind::MongoDbObjectId => LayoutType::MongoDbObjectId,
        TypeKind::Utf8 => LayoutType::Utf8,
        TypeKind::Binary => LayoutType::Binary,
        TypeKind::Any => bail!("unknown property type: any"),
    })
}

fn scope(kind: ScopeKind, immutable: bool) -> LayoutType {
    LayoutType::Scope(LayoutScope::new(kind, immutable))
}

/// Compiles an item type, wrapping nullable items in a nullable scope.
fn item_argument(ns: &Namespace, item: &PropertyType) -> Result<TypeArgument> {
    let (layout_type, type_args) = logical_to_physical(ns, item)?;
    if item.nullable {
        let inner = TypeArgumentList::new(vec![TypeArgument::with_args(layout_type, type_args)]);
        return Ok(TypeArgument::with_args(
            scope(ScopeKind::Nullable, layout_type.immutable()),
            inner,
        ));
    }
    Ok(TypeArgument::with_args(layout_type, type_args))
}

fn logical_to_physical(ns: &Namespace, pt: &PropertyType) -> Result<(LayoutType, TypeArgumentList)> {
    let empty = TypeArgumentList::EMPTY;
    match &pt.kind {
        PropertyKind::Primitive { type_kind, .. } => Ok((primitive_type(*type_kind)?, empty)),
        PropertyKind::Enum { name, .. } => {
            ensure!(
                ns.version >= SchemaLanguageVersion::V2,
                "enums are not supported in a namespace prior to V2"
            );
            let es = ns
                .find_enum(name)
                .ok_or_else(|| eyre!("cannot resolve enum reference '{}'", name))?;
            let base = primitive_type(es.base_type)?;
            ensure!(
                matches!(
                    base,
                    LayoutType::Int8
                        | LayoutType::Int16
                        | LayoutType::Int32
                        | LayoutType::Int64
                        | LayoutType::UInt8
                        | LayoutType::UInt16
                        | LayoutType::UInt32
                        | LayoutType::UInt64
                        | LayoutType::VarInt
                        | LayoutType::VarUInt
                ),
                "enum '{}' must have an integer base type, found {}",
                name,
                base.name()
            );
            Ok((base, empty))
        }
        PropertyKind::Object { immutable, .. } => Ok((scope(ScopeKind::Object, *immutable), empty)),
        PropertyKind::Array { items, immutable } => {
            if items.is_any() {
                return Ok((scope(ScopeKind::Array, *immutable), empty));
            }
            let args = TypeArgumentList::new(vec![item_argument(ns, items)?]);
            Ok((scope(ScopeKind::TypedArray, *immutable), args))
        }
        PropertyKind::Set { items, immutable } => {
            ensure!(!items.is_any(), "untyped sets are not supported");
            let args = TypeArgumentList::new(vec![item_argument(ns, items)?]);
            Ok((scope(ScopeKind::TypedSet, *immutable), args))
        }
        PropertyKind::Map {
            keys,
            values,
            immutable,
        } => {
            ensure!(
                !keys.is_any() && !values.is_any(),
                "untyped maps are not supported"
            );
            let args = TypeArgumentList::new(vec![
                item_argument(ns, keys)?,
                item_argument(ns, values)?,
            ]);
            Ok((scope(ScopeKind::TypedMap, *immutable), args))
        }
        PropertyKind::Tuple { items, immutable } => {
            let args = items
                .iter()
                .map(|item| item_argument(ns, item))
                .collect::<Result<Vec<_>>>()?;
            Ok((scope(ScopeKind::TypedTuple, *immutable), TypeArgumentList::new(args)))
        }
        PropertyKind::Tagged { items, immutable } => {
            ensure!(
                (MIN_TAGGED_ARGUMENTS..=MAX_TAGGED_ARGUMENTS).contains(&items.len()),
                "invalid number of arguments in tagged: {}",
                items.len()
            );
            let mut args = Vec::with_capacity(items.len() + 1);
            args.push(TypeArgument::new(LayoutType::UInt8));
            for item in items {
                args.push(item_argument(ns, item)?);
            }
            let kind = if items.len() == 1 {
                ScopeKind::Tagged
            } else {
                ScopeKind::Tagged2
            };
            Ok((scope(kind, *immutable), TypeArgumentList::new(args)))
        }
        PropertyKind::Udt {
            name,
            schema_id,
            immutable,
        } => {
            let udt = find_schema(ns, name, *schema_id)?;
            Ok((
                scope(ScopeKind::Udt, *immutable),
                TypeArgumentList::from_schema_id(udt.schema_id),
            ))
        }
    }
}
