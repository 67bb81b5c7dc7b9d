use super::*;
use crate::schemas::{EnumSchema, Namespace, Property, PropertyType, Schema, SchemaLanguageVersion, TypeKind};

fn compile(ns: &Namespace, name: &str) -> eyre::Result<Layout> {
    let schema = ns
        .schemas
        .iter()
        .find(|s| s.name == name)
        .expect("schema in namespace");
    LayoutCompiler::compile(ns, schema)
}

fn int32() -> PropertyType {
    PropertyType::sparse(TypeKind::Int32).with_nullable(false)
}

mod compiler_tests {
    use super::*;

    #[test]
    fn fixed_variable_and_sparse_columns_land_in_their_segments() {
        let ns = Namespace::new("test").with_schema(
            Schema::new("Person", SchemaId(1))
                .with_property("id", PropertyType::fixed(TypeKind::Int64).with_nullable(false))
                .with_property("age", PropertyType::fixed(TypeKind::Int32))
                .with_property("name", PropertyType::variable(TypeKind::Utf8))
                .with_property("notes", PropertyType::sparse(TypeKind::Utf8)),
        );
        let layout = compile(&ns, "Person").unwrap();

        assert_eq!(layout.num_fixed(), 2);
        assert_eq!(layout.num_variable(), 1);

        let id = layout.try_find("id").unwrap();
        assert_eq!(id.storage(), StorageKind::Fixed);
        assert!(id.null_bit().is_invalid());

        let age = layout.try_find("age").unwrap();
        assert!(!age.null_bit().is_invalid());

        let name = layout.try_find("name").unwrap();
        assert_eq!(name.storage(), StorageKind::Variable);
        assert_eq!(name.offset(), 0);

        let notes = layout.try_find("notes").unwrap();
        assert_eq!(notes.storage(), StorageKind::Sparse);
        assert_eq!(notes.layout_type(), LayoutType::Utf8);
    }

    #[test]
    fn non_nullable_variable_column_is_rejected() {
        let ns = Namespace::new("test").with_schema(
            Schema::new("S", SchemaId(1))
                .with_property("v", PropertyType::variable(TypeKind::Utf8).with_nullable(false)),
        );
        let err = compile(&ns, "S").unwrap_err();
        assert!(format!("{:#}", err).contains("non-nullable variable columns"));
    }

    #[test]
    fn non_nullable_sparse_column_is_rejected() {
        let ns = Namespace::new("test")
            .with_schema(Schema::new("S", SchemaId(1)).with_property("v", int32()));
        let err = compile(&ns, "S").unwrap_err();
        assert!(format!("{:#}", err).contains("non-nullable sparse columns"));
    }

    #[test]
    fn fixed_column_inside_object_is_rejected() {
        let inner = vec![Property::new("x", PropertyType::fixed(TypeKind::Int32))];
        let ns = Namespace::new("test").with_schema(
            Schema::new("S", SchemaId(1)).with_property("o", PropertyType::object(inner)),
        );
        let err = compile(&ns, "S").unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("fixed storage within a sparse scope"));
        assert!(message.contains("'x'"));
    }

    #[test]
    fn object_properties_are_nested() {
        let inner = vec![
            Property::new("street", PropertyType::sparse(TypeKind::Utf8)),
            Property::new("zip", PropertyType::sparse(TypeKind::Int32)),
        ];
        let ns = Namespace::new("test").with_schema(
            Schema::new("S", SchemaId(1)).with_property("address", PropertyType::object(inner)),
        );
        let layout = compile(&ns, "S").unwrap();

        let street = layout.try_find("address.street").unwrap();
        let parent = street.parent().unwrap();
        assert_eq!(layout.columns()[parent].path(), "address");
        assert!(layout.tokenizer().try_find_token("street").is_some());
    }

    #[test]
    fn nullable_items_are_wrapped() {
        let ns = Namespace::new("test").with_schema(
            Schema::new("S", SchemaId(1))
                .with_property("a", PropertyType::array(PropertyType::sparse(TypeKind::Int32)))
                .with_property("b", PropertyType::array(int32())),
        );
        let layout = compile(&ns, "S").unwrap();

        let a = layout.try_find("a").unwrap();
        assert_eq!(a.layout_type(), LayoutType::Scope(LayoutScope::TYPED_ARRAY));
        assert_eq!(a.type_args().to_string(), "<nullable<int32>>");

        let b = layout.try_find("b").unwrap();
        assert_eq!(b.type_args().to_string(), "<int32>");
    }

    #[test]
    fn array_of_any_is_untyped() {
        let ns = Namespace::new("test").with_schema(
            Schema::new("S", SchemaId(1))
                .with_property("a", PropertyType::array(PropertyType::sparse(TypeKind::Any))),
        );
        let layout = compile(&ns, "S").unwrap();
        assert_eq!(
            layout.try_find("a").unwrap().layout_type(),
            LayoutType::Scope(LayoutScope::ARRAY)
        );
    }

    #[test]
    fn untyped_map_is_rejected() {
        let ns = Namespace::new("test").with_schema(Schema::new("S", SchemaId(1)).with_property(
            "m",
            PropertyType::map(PropertyType::sparse(TypeKind::Any), int32()),
        ));
        assert!(compile(&ns, "S").is_err());
    }

    #[test]
    fn tagged_gets_an_implied_tag_argument() {
        let ns = Namespace::new("test").with_schema(
            Schema::new("S", SchemaId(1))
                .with_property("t1", PropertyType::tagged(vec![int32()]))
                .with_property("t2", PropertyType::tagged(vec![int32(), int32()]))
                .with_property("t3", PropertyType::tagged(vec![int32(), int32(), int32()])),
        );
        let err = compile(&ns, "S").unwrap_err();
        assert!(format!("{:#}", err).contains("invalid number of arguments in tagged"));

        let ns = Namespace::new("test").with_schema(
            Schema::new("S", SchemaId(1))
                .with_property("t1", PropertyType::tagged(vec![int32()]))
                .with_property("t2", PropertyType::tagged(vec![int32(), int32()])),
        );
        let layout = compile(&ns, "S").unwrap();
        let t1 = layout.try_find("t1").unwrap();
        assert_eq!(t1.layout_type(), LayoutType::Scope(LayoutScope::TAGGED));
        assert_eq!(t1.type_args().to_string(), "<uint8, int32>");
        let t2 = layout.try_find("t2").unwrap();
        assert_eq!(t2.layout_type(), LayoutType::Scope(LayoutScope::TAGGED2));
        assert_eq!(t2.type_args().len(), 3);
    }

    #[test]
    fn udt_reference_resolves_by_name() {
        let ns = Namespace::new("test")
            .with_schema(Schema::new("Point", SchemaId(2)).with_property("x", PropertyType::fixed(TypeKind::Int32)))
            .with_schema(
                Schema::new("Shape", SchemaId(1))
                    .with_property("origin", PropertyType::udt("Point", SchemaId::INVALID)),
            );
        let layout = compile(&ns, "Shape").unwrap();
        let origin = layout.try_find("origin").unwrap();
        assert_eq!(origin.layout_type(), LayoutType::Scope(LayoutScope::UDT));
        assert_eq!(origin.type_args().schema_id(), SchemaId(2));
    }

    #[test]
    fn udt_reference_with_mismatched_id_is_ambiguous() {
        let ns = Namespace::new("test")
            .with_schema(Schema::new("Point", SchemaId(2)))
            .with_schema(
                Schema::new("Shape", SchemaId(1))
                    .with_property("origin", PropertyType::udt("Other", SchemaId(2))),
            );
        let err = compile(&ns, "Shape").unwrap_err();
        assert!(format!("{:#}", err).contains("ambiguous schema reference"));
    }

    #[test]
    fn base_schema_becomes_first_sparse_column() {
        let ns = Namespace::new("test")
            .with_schema(Schema::new("Base", SchemaId(2)))
            .with_schema(
                Schema::new("Derived", SchemaId(1))
                    .with_base("Base", SchemaId::INVALID)
                    .with_property("x", PropertyType::sparse(TypeKind::Int32)),
            );
        let layout = compile(&ns, "Derived").unwrap();
        let base = layout.try_find("__base").unwrap();
        assert_eq!(base.layout_type(), LayoutType::Scope(LayoutScope::UDT));
        assert_eq!(base.type_args().schema_id(), SchemaId(2));
        assert_eq!(layout.columns()[0].path(), "__base");
    }

    #[test]
    fn enums_compile_to_their_base_type_from_v2() {
        let color = EnumSchema {
            name: "Color".to_string(),
            base_type: TypeKind::UInt8,
            values: vec![("Red".to_string(), 0), ("Green".to_string(), 1)],
        };
        let schema = Schema::new("S", SchemaId(1)).with_property(
            "c",
            PropertyType::enumeration("Color", StorageKind::Fixed),
        );

        let ns = Namespace::new("test").with_enum(color.clone()).with_schema(schema.clone());
        let layout = compile(&ns, "S").unwrap();
        assert_eq!(layout.try_find("c").unwrap().layout_type(), LayoutType::UInt8);

        let ns = Namespace::new("test")
            .with_version(SchemaLanguageVersion::V1)
            .with_enum(color)
            .with_schema(schema);
        assert!(compile(&ns, "S").is_err());
    }

    #[test]
    fn immutable_scopes_keep_their_flag() {
        let ns = Namespace::new("test").with_schema(Schema::new("S", SchemaId(1)).with_property(
            "a",
            PropertyType::array(int32()).with_immutable(true),
        ));
        let layout = compile(&ns, "S").unwrap();
        assert_eq!(
            layout.try_find("a").unwrap().layout_type(),
            LayoutType::Scope(LayoutScope::IMMUTABLE_TYPED_ARRAY)
        );
    }
}

mod tokenizer_tests {
    use super::*;

    #[test]
    fn every_column_path_is_tokenized_once() {
        let ns = Namespace::new("test").with_schema(
            Schema::new("S", SchemaId(1))
                .with_property("a", PropertyType::sparse(TypeKind::Int32))
                .with_property(
                    "o",
                    PropertyType::object(vec![Property::new("a", PropertyType::sparse(TypeKind::Int32))]),
                ),
        );
        let layout = compile(&ns, "S").unwrap();
        // "", "a", "o"
        assert_eq!(layout.tokenizer().count(), 3);
        let a = layout.tokenizer().try_find_token("a").unwrap();
        assert_eq!(layout.tokenizer().try_find_string(a.id()), Some("a"));
    }
}
