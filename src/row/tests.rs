use std::sync::Arc;

use super::*;
use crate::config::HYBRID_ROW_HEADER_SIZE;
use crate::layouts::{
    Layout, LayoutBinary, LayoutBoolean, LayoutColumn, LayoutDateTime, LayoutDecimal,
    LayoutField, LayoutFloat128, LayoutFloat32, LayoutFloat64, LayoutGuid, LayoutInt16,
    LayoutInt32, LayoutInt64, LayoutInt8, LayoutMongoDbObjectId, LayoutNull, LayoutResolver,
    LayoutResolverNamespace, LayoutScope, LayoutType, LayoutUInt16, LayoutUInt32, LayoutUInt64,
    LayoutUInt8, LayoutUnixDateTime, LayoutUtf8, LayoutVarInt, LayoutVarUInt, SchemaId,
    StorageKind, TypeArgument, TypeArgumentList,
};
use crate::schemas::{Namespace, Property, PropertyType, Schema, TypeKind};
use crate::types::{DateTime, Decimal, Float128, Guid, MongoDbObjectId, NullValue, UnixDateTime};

const ROOT: SchemaId = SchemaId(1);
const POINT: SchemaId = SchemaId(2);

fn namespace() -> Namespace {
    let required = |kind| PropertyType::sparse(kind).with_nullable(false);
    Namespace::new("row-tests")
        .with_schema(
            Schema::new("Point", POINT)
                .with_property("x", PropertyType::fixed(TypeKind::Int32))
                .with_property("label", PropertyType::variable(TypeKind::Utf8)),
        )
        .with_schema(
            Schema::new("Root", ROOT)
                .with_property(
                    "id",
                    PropertyType::fixed(TypeKind::Int64).with_nullable(false),
                )
                .with_property("age", PropertyType::fixed(TypeKind::Int32))
                .with_property("active", PropertyType::fixed(TypeKind::Boolean))
                .with_property(
                    "code",
                    PropertyType::primitive(TypeKind::Utf8, StorageKind::Fixed, 3),
                )
                .with_property("name", PropertyType::variable(TypeKind::Utf8))
                .with_property(
                    "nick",
                    PropertyType::primitive(TypeKind::Utf8, StorageKind::Variable, 4),
                )
                .with_property("score", PropertyType::variable(TypeKind::VarInt))
                .with_property("title", PropertyType::sparse(TypeKind::Utf8))
                .with_property("count", PropertyType::sparse(TypeKind::Int32))
                .with_property("flag", PropertyType::sparse(TypeKind::Boolean))
                .with_property("blob", PropertyType::sparse(TypeKind::Binary))
                .with_property("nums", PropertyType::array(required(TypeKind::Int32)))
                .with_property("maybe", PropertyType::array(PropertyType::sparse(TypeKind::Int32)))
                .with_property("tags", PropertyType::set(required(TypeKind::Utf8)))
                .with_property(
                    "attrs",
                    PropertyType::map(required(TypeKind::Utf8), required(TypeKind::Int32)),
                )
                .with_property(
                    "pair",
                    PropertyType::tuple(vec![required(TypeKind::Int32), required(TypeKind::Utf8)]),
                )
                .with_property("origin", PropertyType::udt("Point", POINT))
                .with_property(
                    "address",
                    PropertyType::object(vec![Property::new(
                        "city",
                        PropertyType::sparse(TypeKind::Utf8),
                    )]),
                ),
        )
}

fn resolver() -> Arc<dyn LayoutResolver> {
    Arc::new(LayoutResolverNamespace::new(namespace()))
}

fn new_row() -> RowBuffer {
    let resolver = resolver();
    let layout = resolver.resolve(ROOT).unwrap();
    RowBuffer::init_layout(HybridRowVersion::V1, layout, resolver)
}

fn column(layout: &Layout, path: &str) -> LayoutColumn {
    layout.try_find(path).unwrap().clone()
}

fn root_at(row: &RowBuffer, path: &str) -> RowCursor {
    let mut cursor = RowCursor::create(row).unwrap();
    cursor.find(row, path).unwrap();
    cursor
}

fn args(types: &[LayoutType]) -> TypeArgumentList {
    types.iter().map(|&t| TypeArgument::new(t)).collect()
}

fn read_int_array(row: &RowBuffer, path: &str) -> Vec<i32> {
    let mut cursor = root_at(row, path);
    let mut array = LayoutScope::TYPED_ARRAY.read_scope(row, &mut cursor).unwrap();
    let mut values = Vec::new();
    while array.move_next(row).unwrap() {
        values.push(LayoutInt32.read_sparse(row, &mut array).unwrap());
    }
    values
}

fn write_int_array(row: &mut RowBuffer, path: &str, values: &[i32]) {
    let mut cursor = root_at(row, path);
    let mut array = LayoutScope::TYPED_ARRAY
        .write_scope(row, &mut cursor, &args(&[LayoutType::Int32]), UpdateOptions::Upsert)
        .unwrap();
    for &value in values {
        LayoutInt32
            .write_sparse(row, &mut array, value, UpdateOptions::Upsert)
            .unwrap();
        array.move_next(row).unwrap();
    }
}

/// Writes a standalone `(key, value)` tuple at the end of the row, ready to
/// be moved into a map.
fn map_entry(row: &mut RowBuffer, key: &str, value: i32) -> RowCursor {
    let mut temp = RowCursor::create_for_append(row);
    temp.find(row, "").unwrap();
    let mut tuple = LayoutScope::TYPED_TUPLE
        .write_scope(
            row,
            &mut temp,
            &args(&[LayoutType::Utf8, LayoutType::Int32]),
            UpdateOptions::Upsert,
        )
        .unwrap();
    LayoutUtf8
        .write_sparse(row, &mut tuple, key, UpdateOptions::Upsert)
        .unwrap();
    assert!(tuple.move_next(row).unwrap());
    LayoutInt32
        .write_sparse(row, &mut tuple, value, UpdateOptions::Upsert)
        .unwrap();
    temp
}

fn read_map(row: &RowBuffer) -> Vec<(String, i32)> {
    let mut cursor = root_at(row, "attrs");
    let mut map = LayoutScope::TYPED_MAP.read_scope(row, &mut cursor).unwrap();
    let mut entries = Vec::new();
    while map.move_next(row).unwrap() {
        let mut tuple = LayoutScope::TYPED_TUPLE.read_scope(row, &mut map).unwrap();
        assert!(tuple.move_next(row).unwrap());
        let key = LayoutUtf8.read_sparse(row, &mut tuple).unwrap().to_string();
        assert!(tuple.move_next(row).unwrap());
        let value = LayoutInt32.read_sparse(row, &mut tuple).unwrap();
        entries.push((key, value));
    }
    entries
}

mod header_tests {
    use super::*;

    #[test]
    fn new_row_has_header_and_zeroed_fixed_segment() {
        let row = new_row();

        assert_eq!(row.len(), HYBRID_ROW_HEADER_SIZE + row.layout().size());
        let header = row.header().unwrap();
        assert_eq!(header.version().unwrap(), HybridRowVersion::V1);
        assert_eq!(header.schema_id(), ROOT);
        assert!(row.as_bytes()[HYBRID_ROW_HEADER_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn read_from_round_trips_written_row() {
        let mut row = new_row();
        let layout = Arc::clone(row.layout());
        let mut root = RowCursor::create(&row).unwrap();
        LayoutInt64
            .write_fixed(&mut row, &mut root, &column(&layout, "id"), 77)
            .unwrap();
        LayoutUtf8
            .write_variable(&mut row, &mut root, &column(&layout, "name"), "ann")
            .unwrap();
        let resolver = Arc::clone(row.resolver());

        let copy = RowBuffer::read_from(row.into_bytes(), HybridRowVersion::V1, resolver).unwrap();
        let root = RowCursor::create(&copy).unwrap();

        assert_eq!(
            LayoutInt64.read_fixed(&copy, &root, &column(&layout, "id")),
            Ok(77)
        );
        assert_eq!(
            LayoutUtf8.read_variable(&copy, &root, &column(&layout, "name")),
            Ok("ann")
        );
    }

    #[test]
    fn read_from_rejects_bad_version_and_unknown_schema() {
        let bytes = new_row().into_bytes();

        let mut bad_version = bytes.clone();
        bad_version[0] = 0x42;
        assert_eq!(
            RowBuffer::read_from(bad_version, HybridRowVersion::V1, resolver()).unwrap_err(),
            RowError::InvalidRow
        );

        let mut unknown = bytes.clone();
        unknown[1..5].copy_from_slice(&99i32.to_le_bytes());
        assert_eq!(
            RowBuffer::read_from(unknown, HybridRowVersion::V1, resolver()).unwrap_err(),
            RowError::NotFound
        );

        assert_eq!(
            RowBuffer::read_from(bytes[..3].to_vec(), HybridRowVersion::V1, resolver())
                .unwrap_err(),
            RowError::InvalidRow
        );
    }

    #[test]
    fn memory_resizer_backs_a_growing_row() {
        let resolver = resolver();
        let layout = resolver.resolve(ROOT).unwrap();
        let mut row = RowBuffer::init_layout_with_resizer(
            HybridRowVersion::V1,
            layout,
            resolver,
            Box::new(MemorySpanResizer::new(16)),
        );

        let mut cursor = root_at(&row, "title");
        let long = "x".repeat(300);
        LayoutUtf8
            .write_sparse(&mut row, &mut cursor, &long, UpdateOptions::Upsert)
            .unwrap();

        assert_eq!(LayoutUtf8.read_sparse(&row, &mut cursor), Ok(long.as_str()));
    }
}

mod fixed_tests {
    use super::*;

    #[test]
    fn fixed_values_round_trip_and_delete() {
        let mut row = new_row();
        let layout = Arc::clone(row.layout());
        let mut root = RowCursor::create(&row).unwrap();
        let age = column(&layout, "age");

        assert_eq!(LayoutInt32.read_fixed(&row, &root, &age), Err(RowError::NotFound));
        LayoutInt32.write_fixed(&mut row, &mut root, &age, 42).unwrap();
        assert_eq!(LayoutInt32.read_fixed(&row, &root, &age), Ok(42));

        LayoutInt32.delete_fixed(&mut row, &mut root, &age).unwrap();
        assert_eq!(LayoutInt32.read_fixed(&row, &root, &age), Err(RowError::NotFound));
    }

    #[test]
    fn non_nullable_fixed_column_is_always_present() {
        let mut row = new_row();
        let layout = Arc::clone(row.layout());
        let mut root = RowCursor::create(&row).unwrap();
        let id = column(&layout, "id");

        assert_eq!(LayoutInt64.read_fixed(&row, &root, &id), Ok(0));
        assert_eq!(
            LayoutInt64.delete_fixed(&mut row, &mut root, &id),
            Err(RowError::TypeMismatch)
        );
    }

    #[test]
    fn fixed_access_checks_column_type() {
        let mut row = new_row();
        let layout = Arc::clone(row.layout());
        let mut root = RowCursor::create(&row).unwrap();

        assert_eq!(
            LayoutInt64.write_fixed(&mut row, &mut root, &column(&layout, "age"), 1),
            Err(RowError::TypeMismatch)
        );
        assert_eq!(
            LayoutUtf8.write_fixed(&mut row, &mut root, &column(&layout, "name"), "abc"),
            Err(RowError::TypeMismatch)
        );
    }

    #[test]
    fn column_from_another_layout_is_rejected() {
        let mut row = new_row();
        let point_layout = row.resolve(POINT).unwrap();
        let x = column(&point_layout, "x");
        let mut root = RowCursor::create(&row).unwrap();
        let before = row.as_bytes().to_vec();

        assert_eq!(
            LayoutInt32.write_fixed(&mut row, &mut root, &x, 5),
            Err(RowError::TypeMismatch)
        );
        assert_eq!(LayoutInt32.read_fixed(&row, &root, &x), Err(RowError::TypeMismatch));
        assert_eq!(
            LayoutUtf8.write_variable(&mut row, &mut root, &column(&point_layout, "label"), "p"),
            Err(RowError::TypeMismatch)
        );
        assert_eq!(row.as_bytes(), &before[..]);
    }

    #[test]
    fn fixed_boolean_lives_in_the_bitmask() {
        let mut row = new_row();
        let layout = Arc::clone(row.layout());
        let mut root = RowCursor::create(&row).unwrap();
        let active = column(&layout, "active");

        LayoutBoolean.write_fixed(&mut row, &mut root, &active, true).unwrap();
        assert_eq!(LayoutBoolean.read_fixed(&row, &root, &active), Ok(true));
        LayoutBoolean.write_fixed(&mut row, &mut root, &active, false).unwrap();
        assert_eq!(LayoutBoolean.read_fixed(&row, &root, &active), Ok(false));

        LayoutBoolean.delete_fixed(&mut row, &mut root, &active).unwrap();
        assert_eq!(
            LayoutBoolean.read_fixed(&row, &root, &active),
            Err(RowError::NotFound)
        );
    }

    #[test]
    fn fixed_string_must_match_column_length() {
        let mut row = new_row();
        let layout = Arc::clone(row.layout());
        let mut root = RowCursor::create(&row).unwrap();
        let code = column(&layout, "code");

        assert_eq!(
            LayoutUtf8.write_fixed(&mut row, &mut root, &code, "abcd"),
            Err(RowError::TooBig)
        );
        assert_eq!(
            LayoutUtf8.write_fixed(&mut row, &mut root, &code, "ab"),
            Err(RowError::TypeConstraint)
        );
        LayoutUtf8.write_fixed(&mut row, &mut root, &code, "abc").unwrap();
        assert_eq!(LayoutUtf8.read_fixed(&row, &root, &code), Ok("abc"));
    }
}

mod variable_tests {
    use super::*;

    #[test]
    fn variable_writes_shift_following_values() {
        let mut row = new_row();
        let layout = Arc::clone(row.layout());
        let mut root = RowCursor::create(&row).unwrap();
        let name = column(&layout, "name");
        let nick = column(&layout, "nick");
        let score = column(&layout, "score");

        LayoutUtf8.write_variable(&mut row, &mut root, &nick, "bob").unwrap();
        root.find(&row, "title").unwrap();
        LayoutUtf8
            .write_sparse(&mut row, &mut root, "hello", UpdateOptions::Upsert)
            .unwrap();

        let before = row.len();
        LayoutUtf8.write_variable(&mut row, &mut root, &name, "alice").unwrap();
        assert_eq!(row.len(), before + 6);
        LayoutVarInt.write_variable(&mut row, &mut root, &score, -3).unwrap();

        assert_eq!(LayoutUtf8.read_variable(&row, &root, &name), Ok("alice"));
        assert_eq!(LayoutUtf8.read_variable(&row, &root, &nick), Ok("bob"));
        assert_eq!(LayoutVarInt.read_variable(&row, &root, &score), Ok(-3));
        assert_eq!(LayoutUtf8.read_sparse(&row, &mut root), Ok("hello"));

        LayoutUtf8.write_variable(&mut row, &mut root, &name, "al").unwrap();
        assert_eq!(LayoutUtf8.read_variable(&row, &root, &name), Ok("al"));
        assert_eq!(LayoutUtf8.read_variable(&row, &root, &nick), Ok("bob"));

        let mut fresh = root_at(&row, "title");
        assert_eq!(LayoutUtf8.read_sparse(&row, &mut fresh), Ok("hello"));
    }

    #[test]
    fn delete_variable_removes_value_and_keeps_neighbours() {
        let mut row = new_row();
        let layout = Arc::clone(row.layout());
        let mut root = RowCursor::create(&row).unwrap();
        let name = column(&layout, "name");
        let nick = column(&layout, "nick");
        let empty_len = row.len();

        LayoutUtf8.write_variable(&mut row, &mut root, &name, "alice").unwrap();
        LayoutUtf8.write_variable(&mut row, &mut root, &nick, "bob").unwrap();
        LayoutUtf8.delete_variable(&mut row, &mut root, &name).unwrap();

        assert_eq!(
            LayoutUtf8.read_variable(&row, &root, &name),
            Err(RowError::NotFound)
        );
        assert_eq!(LayoutUtf8.read_variable(&row, &root, &nick), Ok("bob"));
        assert_eq!(row.len(), empty_len + 4);

        // Deleting an absent value is a no-op.
        LayoutUtf8.delete_variable(&mut row, &mut root, &name).unwrap();
        assert_eq!(row.len(), empty_len + 4);
    }

    #[test]
    fn variable_length_limit_is_enforced() {
        let mut row = new_row();
        let layout = Arc::clone(row.layout());
        let mut root = RowCursor::create(&row).unwrap();
        let nick = column(&layout, "nick");
        let before = row.as_bytes().to_vec();

        assert_eq!(
            LayoutUtf8.write_variable(&mut row, &mut root, &nick, "toolong"),
            Err(RowError::TooBig)
        );
        assert_eq!(row.as_bytes(), &before[..]);
    }
}

mod sparse_tests {
    use super::*;

    #[test]
    fn update_options_govern_existing_values() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "count");

        assert_eq!(
            LayoutInt32.write_sparse(&mut row, &mut cursor, 1, UpdateOptions::Update),
            Err(RowError::NotFound)
        );
        LayoutInt32
            .write_sparse(&mut row, &mut cursor, 1, UpdateOptions::Insert)
            .unwrap();
        assert_eq!(
            LayoutInt32.write_sparse(&mut row, &mut cursor, 2, UpdateOptions::Insert),
            Err(RowError::Exists)
        );
        LayoutInt32
            .write_sparse(&mut row, &mut cursor, 3, UpdateOptions::Update)
            .unwrap();

        let mut fresh = root_at(&row, "count");
        assert_eq!(LayoutInt32.read_sparse(&row, &mut fresh), Ok(3));
        assert_eq!(
            LayoutInt64.read_sparse(&row, &mut fresh),
            Err(RowError::TypeMismatch)
        );
    }

    #[test]
    fn every_primitive_round_trips_through_sparse_storage() {
        let mut row = new_row();

        macro_rules! round_trip {
            ($($field:expr => $path:literal, $value:expr;)*) => {
                $(
                    let mut cursor = root_at(&row, $path);
                    $field
                        .write_sparse(&mut row, &mut cursor, $value, UpdateOptions::Upsert)
                        .unwrap();
                )*
                $(
                    let mut cursor = root_at(&row, $path);
                    assert_eq!($field.read_sparse(&row, &mut cursor), Ok($value), "{}", $path);
                )*
            };
        }

        round_trip! {
            LayoutNull => "null", NullValue;
            LayoutInt8 => "i8", -8;
            LayoutInt16 => "i16", -1600;
            LayoutInt32 => "i32", -320_000;
            LayoutInt64 => "i64", i64::MIN;
            LayoutUInt8 => "u8", 200;
            LayoutUInt16 => "u16", 65_000;
            LayoutUInt32 => "u32", u32::MAX;
            LayoutUInt64 => "u64", u64::MAX;
            LayoutVarInt => "varint", -1_000_000;
            LayoutVarUInt => "varuint", 1 << 40;
            LayoutFloat32 => "f32", 1.5f32;
            LayoutFloat64 => "f64", -2.25f64;
            LayoutFloat128 => "f128", Float128::new(-1, 42);
            LayoutDecimal => "decimal", Decimal::new(1, 2, 3, false, 4);
            LayoutDateTime => "datetime", DateTime::from_ticks(637_000_000_000_000_000);
            LayoutUnixDateTime => "unix", UnixDateTime::from_milliseconds(1_700_000_000_000);
            LayoutGuid => "guid", Guid([0xab; 16]);
            LayoutMongoDbObjectId => "oid", MongoDbObjectId([3; 12]);
            LayoutUtf8 => "utf8", "text";
            LayoutBinary => "binary", &[0xde, 0xad][..];
        }
    }

    #[test]
    fn replacing_with_different_size_keeps_following_fields() {
        let mut row = new_row();
        let mut title = root_at(&row, "title");
        LayoutUtf8
            .write_sparse(&mut row, &mut title, "short", UpdateOptions::Upsert)
            .unwrap();
        let mut blob = root_at(&row, "blob");
        LayoutBinary
            .write_sparse(&mut row, &mut blob, &[1, 2, 3], UpdateOptions::Upsert)
            .unwrap();

        let mut title = root_at(&row, "title");
        LayoutUtf8
            .write_sparse(&mut row, &mut title, "a much longer title", UpdateOptions::Upsert)
            .unwrap();

        let mut title = root_at(&row, "title");
        assert_eq!(
            LayoutUtf8.read_sparse(&row, &mut title),
            Ok("a much longer title")
        );
        let mut blob = root_at(&row, "blob");
        assert_eq!(LayoutBinary.read_sparse(&row, &mut blob), Ok(&[1u8, 2, 3][..]));
    }

    #[test]
    fn sparse_booleans_carry_value_in_type_code() {
        let mut row = new_row();
        let mut flag = root_at(&row, "flag");
        LayoutBoolean
            .write_sparse(&mut row, &mut flag, false, UpdateOptions::Upsert)
            .unwrap();

        let mut fresh = root_at(&row, "flag");
        assert!(fresh.exists());
        assert_eq!(LayoutBoolean.read_sparse(&row, &mut fresh), Ok(false));

        LayoutBoolean
            .write_sparse(&mut row, &mut fresh, true, UpdateOptions::Upsert)
            .unwrap();
        let mut fresh = root_at(&row, "flag");
        assert_eq!(LayoutBoolean.read_sparse(&row, &mut fresh), Ok(true));
    }

    #[test]
    fn iteration_visits_fields_in_write_order() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "title");
        LayoutUtf8
            .write_sparse(&mut row, &mut cursor, "t", UpdateOptions::Upsert)
            .unwrap();
        let mut cursor = root_at(&row, "count");
        LayoutInt32
            .write_sparse(&mut row, &mut cursor, 7, UpdateOptions::Upsert)
            .unwrap();
        let mut cursor = root_at(&row, "extra");
        LayoutInt8
            .write_sparse(&mut row, &mut cursor, -1, UpdateOptions::Upsert)
            .unwrap();

        let mut cursor = RowCursor::create(&row).unwrap();
        let mut seen = Vec::new();
        while cursor.move_next(&row).unwrap() {
            seen.push((cursor.path(&row).unwrap().unwrap(), cursor.cell_type().unwrap()));
        }

        assert_eq!(
            seen,
            vec![
                ("title".to_string(), LayoutType::Utf8),
                ("count".to_string(), LayoutType::Int32),
                ("extra".to_string(), LayoutType::Int8),
            ]
        );
    }

    #[test]
    fn undeclared_paths_are_stored_literally() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "undeclared");
        LayoutInt16
            .write_sparse(&mut row, &mut cursor, 512, UpdateOptions::Upsert)
            .unwrap();

        let mut fresh = root_at(&row, "undeclared");
        assert!(fresh.exists());
        assert_eq!(fresh.path(&row).unwrap().as_deref(), Some("undeclared"));
        assert_eq!(LayoutInt16.read_sparse(&row, &mut fresh), Ok(512));

        let missing = root_at(&row, "undeclare");
        assert!(!missing.exists());
    }

    #[test]
    fn delete_sparse_removes_only_the_target() {
        let mut row = new_row();
        let empty_len = row.len();
        let mut count = root_at(&row, "count");
        LayoutInt32
            .write_sparse(&mut row, &mut count, 5, UpdateOptions::Upsert)
            .unwrap();
        let mut title = root_at(&row, "title");
        LayoutUtf8
            .write_sparse(&mut row, &mut title, "kept", UpdateOptions::Upsert)
            .unwrap();

        let mut count = root_at(&row, "count");
        LayoutInt32.delete_sparse(&mut row, &mut count).unwrap();

        assert!(!root_at(&row, "count").exists());
        let mut title = root_at(&row, "title");
        assert_eq!(LayoutUtf8.read_sparse(&row, &mut title), Ok("kept"));

        let mut title = root_at(&row, "title");
        LayoutUtf8.delete_sparse(&mut row, &mut title).unwrap();
        assert_eq!(row.len(), empty_len);

        let mut missing = root_at(&row, "title");
        LayoutUtf8.delete_sparse(&mut row, &mut missing).unwrap();
        assert_eq!(row.len(), empty_len);
    }

    #[test]
    fn reading_absent_value_is_not_found() {
        let row = new_row();
        let mut cursor = root_at(&row, "title");
        assert_eq!(LayoutUtf8.read_sparse(&row, &mut cursor), Err(RowError::NotFound));
    }
}

mod scope_tests {
    use super::*;

    #[test]
    fn typed_array_appends_and_inserts() {
        let mut row = new_row();
        write_int_array(&mut row, "nums", &[1, 2, 3]);
        assert_eq!(read_int_array(&row, "nums"), vec![1, 2, 3]);

        let mut cursor = root_at(&row, "nums");
        let mut array = LayoutScope::TYPED_ARRAY.read_scope(&row, &mut cursor).unwrap();
        assert_eq!(array.count(), 3);
        assert!(array.move_to(&row, 1).unwrap());
        LayoutInt32
            .write_sparse(&mut row, &mut array, 9, UpdateOptions::InsertAt)
            .unwrap();

        assert_eq!(read_int_array(&row, "nums"), vec![1, 9, 2, 3]);
    }

    #[test]
    fn typed_array_rejects_other_element_types() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "nums");
        let mut array = LayoutScope::TYPED_ARRAY
            .write_scope(&mut row, &mut cursor, &args(&[LayoutType::Int32]), UpdateOptions::Upsert)
            .unwrap();

        assert_eq!(
            LayoutUtf8.write_sparse(&mut row, &mut array, "nope", UpdateOptions::Upsert),
            Err(RowError::TypeConstraint)
        );
    }

    #[test]
    fn nullable_elements_record_presence() {
        let mut row = new_row();
        let nullable_int = args(&[LayoutType::Int32]);
        let element = TypeArgument::with_args(
            LayoutType::Scope(LayoutScope::NULLABLE),
            nullable_int.clone(),
        );

        let mut cursor = root_at(&row, "maybe");
        let mut array = LayoutScope::TYPED_ARRAY
            .write_scope(
                &mut row,
                &mut cursor,
                &TypeArgumentList::new(vec![element]),
                UpdateOptions::Upsert,
            )
            .unwrap();
        let mut some = LayoutScope::NULLABLE
            .write_nullable(&mut row, &mut array, &nullable_int, true, UpdateOptions::Upsert)
            .unwrap();
        LayoutInt32
            .write_sparse(&mut row, &mut some, 5, UpdateOptions::Upsert)
            .unwrap();
        array.move_next_after(&row, &mut some).unwrap();
        LayoutScope::NULLABLE
            .write_nullable(&mut row, &mut array, &nullable_int, false, UpdateOptions::Upsert)
            .unwrap();

        let mut cursor = root_at(&row, "maybe");
        let mut array = LayoutScope::TYPED_ARRAY.read_scope(&row, &mut cursor).unwrap();
        assert_eq!(array.count(), 2);

        assert!(array.move_next(&row).unwrap());
        let mut first = LayoutScope::NULLABLE.read_scope(&row, &mut array).unwrap();
        assert!(LayoutScope::has_value(&row, &first).unwrap());
        assert!(first.move_next(&row).unwrap());
        assert_eq!(LayoutInt32.read_sparse(&row, &mut first), Ok(5));

        assert!(array.move_next(&row).unwrap());
        let second = LayoutScope::NULLABLE.read_scope(&row, &mut array).unwrap();
        assert!(!LayoutScope::has_value(&row, &second).unwrap());
        assert!(!array.move_next(&row).unwrap());
    }

    #[test]
    fn immutable_cursor_refuses_writes() {
        let mut row = new_row();
        write_int_array(&mut row, "nums", &[1]);
        let before = row.as_bytes().to_vec();

        let mut cursor = root_at(&row, "nums");
        let mut array = LayoutScope::TYPED_ARRAY
            .read_scope(&row, &mut cursor)
            .unwrap()
            .as_read_only();
        assert!(array.move_next(&row).unwrap());

        assert_eq!(
            LayoutInt32.write_sparse(&mut row, &mut array, 2, UpdateOptions::Upsert),
            Err(RowError::InsufficientPermissions)
        );
        assert_eq!(
            LayoutInt32.delete_sparse(&mut row, &mut array),
            Err(RowError::InsufficientPermissions)
        );
        assert_eq!(row.as_bytes(), &before[..]);
    }

    #[test]
    fn typed_set_is_sorted_and_deduplicated() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "tags");
        LayoutScope::TYPED_SET
            .write_scope_with(
                &mut row,
                &mut cursor,
                &args(&[LayoutType::Utf8]),
                ["b", "a", "b", "c"],
                |row, set, tags| {
                    for tag in tags {
                        LayoutUtf8.write_sparse(row, set, tag, UpdateOptions::Upsert)?;
                        set.move_next(row)?;
                    }
                    Ok(())
                },
                UpdateOptions::Upsert,
            )
            .unwrap();

        let mut cursor = root_at(&row, "tags");
        let mut set = LayoutScope::TYPED_SET.read_scope(&row, &mut cursor).unwrap();
        assert_eq!(set.count(), 3);
        let mut tags = Vec::new();
        while set.move_next(&row).unwrap() {
            tags.push(LayoutUtf8.read_sparse(&row, &mut set).unwrap().to_string());
        }
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn typed_set_refuses_direct_writes() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "tags");
        let mut set = LayoutScope::TYPED_SET
            .write_scope(&mut row, &mut cursor, &args(&[LayoutType::Utf8]), UpdateOptions::Upsert)
            .unwrap();

        assert_eq!(
            LayoutUtf8.write_sparse(&mut row, &mut set, "z", UpdateOptions::Upsert),
            Err(RowError::InsufficientPermissions)
        );
    }

    #[test]
    fn typed_map_move_field_keeps_keys_unique() {
        let mut row = new_row();
        let map_args = args(&[LayoutType::Utf8, LayoutType::Int32]);
        let mut cursor = root_at(&row, "attrs");
        let mut map = LayoutScope::TYPED_MAP
            .write_scope(&mut row, &mut cursor, &map_args, UpdateOptions::Upsert)
            .unwrap();

        for (key, value) in [("b", 2), ("a", 1)] {
            let mut entry = map_entry(&mut row, key, value);
            LayoutScope::TYPED_MAP
                .move_field(&mut row, &mut map, &mut entry, UpdateOptions::Insert)
                .unwrap();
        }
        let settled = row.len();

        let mut duplicate = map_entry(&mut row, "a", 10);
        assert_eq!(
            LayoutScope::TYPED_MAP.move_field(&mut row, &mut map, &mut duplicate, UpdateOptions::Insert),
            Err(RowError::Exists)
        );
        assert_eq!(row.len(), settled);

        let mut missing = map_entry(&mut row, "zz", 0);
        assert_eq!(
            LayoutScope::TYPED_MAP.move_field(&mut row, &mut map, &mut missing, UpdateOptions::Update),
            Err(RowError::NotFound)
        );

        let mut replacement = map_entry(&mut row, "a", 10);
        LayoutScope::TYPED_MAP
            .move_field(&mut row, &mut map, &mut replacement, UpdateOptions::Upsert)
            .unwrap();

        assert_eq!(
            read_map(&row),
            vec![("a".to_string(), 10), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn typed_map_find_locates_entry_by_key() {
        let mut row = new_row();
        let map_args = args(&[LayoutType::Utf8, LayoutType::Int32]);
        let mut cursor = root_at(&row, "attrs");
        let mut map = LayoutScope::TYPED_MAP
            .write_scope(&mut row, &mut cursor, &map_args, UpdateOptions::Upsert)
            .unwrap();
        for (key, value) in [("x", 1), ("y", 2)] {
            let mut entry = map_entry(&mut row, key, value);
            LayoutScope::TYPED_MAP
                .move_field(&mut row, &mut map, &mut entry, UpdateOptions::Upsert)
                .unwrap();
        }
        let settled = row.len();

        let mut cursor = root_at(&row, "attrs");
        let map = LayoutScope::TYPED_MAP.read_scope(&row, &mut cursor).unwrap();
        let mut pattern = map_entry(&mut row, "y", 0);
        let mut found = LayoutScope::TYPED_MAP.find(&mut row, &map, &mut pattern).unwrap();
        assert_eq!(row.len(), settled);

        let mut tuple = LayoutScope::TYPED_TUPLE.read_scope(&row, &mut found).unwrap();
        assert!(tuple.move_next(&row).unwrap());
        assert_eq!(LayoutUtf8.read_sparse(&row, &mut tuple), Ok("y"));
        assert!(tuple.move_next(&row).unwrap());
        assert_eq!(LayoutInt32.read_sparse(&row, &mut tuple), Ok(2));

        let mut absent = map_entry(&mut row, "q", 0);
        assert_eq!(
            LayoutScope::TYPED_MAP.find(&mut row, &map, &mut absent).unwrap_err(),
            RowError::NotFound
        );
        assert_eq!(row.len(), settled);
    }

    #[test]
    fn typed_tuple_has_fixed_arity() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "pair");
        let mut tuple = LayoutScope::TYPED_TUPLE
            .write_scope(
                &mut row,
                &mut cursor,
                &args(&[LayoutType::Int32, LayoutType::Utf8]),
                UpdateOptions::Upsert,
            )
            .unwrap();
        LayoutInt32
            .write_sparse(&mut row, &mut tuple, 1, UpdateOptions::Upsert)
            .unwrap();
        assert!(tuple.move_next(&row).unwrap());
        LayoutUtf8
            .write_sparse(&mut row, &mut tuple, "x", UpdateOptions::Upsert)
            .unwrap();
        assert_eq!(
            LayoutUtf8.delete_sparse(&mut row, &mut tuple),
            Err(RowError::TypeConstraint)
        );

        let mut cursor = root_at(&row, "pair");
        let mut tuple = LayoutScope::TYPED_TUPLE.read_scope(&row, &mut cursor).unwrap();
        assert_eq!(tuple.count(), 2);
        assert!(tuple.move_next(&row).unwrap());
        assert_eq!(LayoutInt32.read_sparse(&row, &mut tuple), Ok(1));
        assert!(tuple.move_next(&row).unwrap());
        assert_eq!(LayoutUtf8.read_sparse(&row, &mut tuple), Ok("x"));
        assert!(!tuple.move_next(&row).unwrap());
    }

    #[test]
    fn tagged_scope_holds_tag_and_value() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "choice");
        let tagged_args = args(&[LayoutType::UInt8, LayoutType::Int32]);
        let mut tagged = LayoutScope::TAGGED
            .write_scope(&mut row, &mut cursor, &tagged_args, UpdateOptions::Upsert)
            .unwrap();
        LayoutUInt8
            .write_sparse(&mut row, &mut tagged, 3, UpdateOptions::Upsert)
            .unwrap();
        assert!(tagged.move_next(&row).unwrap());
        LayoutInt32
            .write_sparse(&mut row, &mut tagged, -8, UpdateOptions::Upsert)
            .unwrap();

        let mut cursor = root_at(&row, "choice");
        let mut tagged = LayoutScope::TAGGED.read_scope(&row, &mut cursor).unwrap();
        assert!(tagged.move_next(&row).unwrap());
        assert_eq!(LayoutUInt8.read_sparse(&row, &mut tagged), Ok(3));
        assert!(tagged.move_next(&row).unwrap());
        assert_eq!(LayoutInt32.read_sparse(&row, &mut tagged), Ok(-8));
    }

    #[test]
    fn nested_udt_has_its_own_segments() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "origin");
        let mut point = LayoutScope::UDT
            .write_scope(
                &mut row,
                &mut cursor,
                &TypeArgumentList::from_schema_id(POINT),
                UpdateOptions::Upsert,
            )
            .unwrap();
        let point_layout = Arc::clone(point.layout());
        assert_eq!(point_layout.schema_id(), POINT);

        let x = column(&point_layout, "x");
        let label = column(&point_layout, "label");
        LayoutInt32.write_fixed(&mut row, &mut point, &x, 7).unwrap();
        LayoutUtf8
            .write_variable(&mut row, &mut point, &label, "origin")
            .unwrap();
        point.find(&row, "z").unwrap();
        LayoutInt16
            .write_sparse(&mut row, &mut point, 3, UpdateOptions::Upsert)
            .unwrap();

        let mut count = root_at(&row, "count");
        LayoutInt32
            .write_sparse(&mut row, &mut count, 9, UpdateOptions::Upsert)
            .unwrap();

        let mut cursor = root_at(&row, "origin");
        let mut point = LayoutScope::UDT.read_scope(&row, &mut cursor).unwrap();
        assert_eq!(LayoutInt32.read_fixed(&row, &point, &x), Ok(7));
        assert_eq!(LayoutUtf8.read_variable(&row, &point, &label), Ok("origin"));
        point.find(&row, "z").unwrap();
        assert_eq!(LayoutInt16.read_sparse(&row, &mut point), Ok(3));

        let mut count = root_at(&row, "count");
        assert_eq!(LayoutInt32.read_sparse(&row, &mut count), Ok(9));
    }

    #[test]
    fn udt_with_unknown_schema_is_not_found() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "origin");
        assert_eq!(
            LayoutScope::UDT
                .write_scope(
                    &mut row,
                    &mut cursor,
                    &TypeArgumentList::from_schema_id(SchemaId(404)),
                    UpdateOptions::Upsert,
                )
                .unwrap_err(),
            RowError::NotFound
        );
    }

    #[test]
    fn object_scope_uses_nested_paths() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "address");
        let mut object = LayoutScope::OBJECT
            .write_scope(&mut row, &mut cursor, &TypeArgumentList::EMPTY, UpdateOptions::Upsert)
            .unwrap();
        object.find(&row, "city").unwrap();
        LayoutUtf8
            .write_sparse(&mut row, &mut object, "Paris", UpdateOptions::Upsert)
            .unwrap();

        let mut cursor = root_at(&row, "address");
        let mut object = LayoutScope::OBJECT.read_scope(&row, &mut cursor).unwrap();
        object.find(&row, "city").unwrap();
        assert_eq!(LayoutUtf8.read_sparse(&row, &mut object), Ok("Paris"));
    }

    #[test]
    fn failing_writer_leaves_no_scope_behind() {
        let mut row = new_row();
        let before = row.as_bytes().to_vec();

        let mut cursor = root_at(&row, "nums");
        let err = LayoutScope::TYPED_ARRAY
            .write_scope_with(
                &mut row,
                &mut cursor,
                &args(&[LayoutType::Int32]),
                (),
                |row, array, ()| {
                    LayoutInt32.write_sparse(row, array, 1, UpdateOptions::Upsert)?;
                    array.move_next(row)?;
                    LayoutUtf8.write_sparse(row, array, "nope", UpdateOptions::Upsert)
                },
                UpdateOptions::Upsert,
            )
            .unwrap_err();

        assert_eq!(err, RowError::TypeConstraint);
        assert_eq!(row.as_bytes(), &before[..]);
        assert!(!root_at(&row, "nums").exists());
    }

    #[test]
    fn failing_writer_error_survives_undeletable_scope() {
        let mut row = new_row();
        let tuple_args: TypeArgumentList = [TypeArgument::with_args(
            LayoutType::Scope(LayoutScope::TYPED_ARRAY),
            args(&[LayoutType::Int32]),
        )]
        .into_iter()
        .collect();
        let mut cursor = root_at(&row, "nest");
        let mut tuple = LayoutScope::TYPED_TUPLE
            .write_scope(&mut row, &mut cursor, &tuple_args, UpdateOptions::Upsert)
            .unwrap();

        // Positions of a typed tuple cannot be deleted, so the rollback fails.
        let err = LayoutScope::TYPED_ARRAY
            .write_scope_with(
                &mut row,
                &mut tuple,
                &args(&[LayoutType::Int32]),
                (),
                |_, _, ()| Err(RowError::TooBig),
                UpdateOptions::Upsert,
            )
            .unwrap_err();

        assert_eq!(err, RowError::TooBig);
        assert!(root_at(&row, "nest").exists());
    }

    #[test]
    fn delete_scope_removes_whole_collection() {
        let mut row = new_row();
        let empty_len = row.len();
        write_int_array(&mut row, "nums", &[4, 5, 6]);

        let mut cursor = root_at(&row, "nums");
        LayoutScope::TYPED_ARRAY.delete_scope(&mut row, &mut cursor).unwrap();

        assert_eq!(row.len(), empty_len);
        assert!(!root_at(&row, "nums").exists());
    }
}

mod malformed_row_tests {
    use super::*;

    fn reparse(bytes: Vec<u8>) -> RowBuffer {
        RowBuffer::read_from(bytes, HybridRowVersion::V1, resolver()).unwrap()
    }

    fn find_in(row: &RowBuffer, path: &str) -> RowResult<RowCursor> {
        let mut cursor = RowCursor::create(row)?;
        cursor.find(row, path)?;
        Ok(cursor)
    }

    #[test]
    fn truncated_nested_udt_is_invalid_row() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "origin");
        LayoutScope::UDT
            .write_scope(
                &mut row,
                &mut cursor,
                &TypeArgumentList::from_schema_id(POINT),
                UpdateOptions::Upsert,
            )
            .unwrap();
        let value_offset = root_at(&row, "origin").value_offset;

        let mut bytes = row.into_bytes();
        bytes.truncate(value_offset + 1);
        let row = reparse(bytes);

        assert_eq!(find_in(&row, "count").unwrap_err(), RowError::InvalidRow);
        let mut cursor = root_at(&row, "origin");
        assert_eq!(
            LayoutScope::UDT.read_scope(&row, &mut cursor).unwrap_err(),
            RowError::InvalidRow
        );
    }

    #[test]
    fn huge_sparse_length_prefix_is_invalid_row() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "title");
        LayoutUtf8
            .write_sparse(&mut row, &mut cursor, "abc", UpdateOptions::Upsert)
            .unwrap();
        let mut cursor = root_at(&row, "count");
        LayoutInt32
            .write_sparse(&mut row, &mut cursor, 5, UpdateOptions::Upsert)
            .unwrap();
        let length_at = root_at(&row, "title").value_offset;

        let bytes = row.into_bytes();
        assert_eq!(bytes[length_at], 3);
        let mut spliced = bytes[..length_at].to_vec();
        spliced.extend_from_slice(&[0xff; 9]);
        spliced.push(0x01);
        spliced.extend_from_slice(&bytes[length_at + 1..]);
        let row = reparse(spliced);

        assert_eq!(find_in(&row, "count").unwrap_err(), RowError::InvalidRow);
        let mut title = root_at(&row, "title");
        assert_eq!(LayoutUtf8.read_sparse(&row, &mut title), Err(RowError::InvalidRow));
    }

    #[test]
    fn huge_variable_length_prefix_is_invalid_row() {
        let mut row = new_row();
        let layout = Arc::clone(row.layout());
        let mut root = RowCursor::create(&row).unwrap();
        LayoutUtf8
            .write_variable(&mut row, &mut root, &column(&layout, "name"), "ann")
            .unwrap();
        let length_at = HYBRID_ROW_HEADER_SIZE + layout.size();

        let bytes = row.into_bytes();
        assert_eq!(bytes[length_at], 3);
        let mut spliced = bytes[..length_at].to_vec();
        spliced.extend_from_slice(&[0xff; 9]);
        spliced.push(0x01);
        spliced.extend_from_slice(&bytes[length_at + 1..]);
        let row = reparse(spliced);

        assert_eq!(RowCursor::create(&row).unwrap_err(), RowError::InvalidRow);
    }

    #[test]
    fn unknown_type_code_is_invalid_row() {
        let mut row = new_row();
        let mut cursor = root_at(&row, "title");
        LayoutUtf8
            .write_sparse(&mut row, &mut cursor, "abc", UpdateOptions::Upsert)
            .unwrap();
        let code_at = root_at(&row, "title").meta_offset;

        let mut bytes = row.into_bytes();
        bytes[code_at] = 0xFE;
        let row = reparse(bytes);

        assert_eq!(find_in(&row, "count").unwrap_err(), RowError::InvalidRow);
        let mut cursor = RowCursor::create(&row).unwrap();
        assert_eq!(cursor.move_next(&row), Err(RowError::InvalidRow));
    }
}
