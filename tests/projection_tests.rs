//! End-to-end projection tests: schema resolution scenarios driven through
//! the binary decoder.

use avrolens::decoder::{encode_zigzag, BinaryDecoder};
use avrolens::projector::{DatumProjector, ProjectionTarget};
use avrolens::schema::parse_schema;
use avrolens::value::AvroValue;
use avrolens::ProjectError;

/// Append an Avro-encoded string (length-prefixed UTF-8).
fn push_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&encode_zigzag(s.len() as i64));
    buf.extend_from_slice(s.as_bytes());
}

fn record(value: AvroValue) -> avrolens::GenericRecord {
    match value {
        AvroValue::Record(r) => r,
        other => panic!("expected record, got {:?}", other),
    }
}

// ============================================================================
// Primitive promotions
// ============================================================================

#[test]
fn promotes_int_to_long() {
    let writer = parse_schema(r#""int""#).unwrap();
    let reader = parse_schema(r#""long""#).unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    let mut dec = BinaryDecoder::new(&[0x02]);
    assert_eq!(projector.project(&mut dec).unwrap(), AvroValue::Long(1));
    assert_eq!(dec.remaining(), 0);
}

#[test]
fn promotes_all_numeric_pairs() {
    let data = encode_zigzag(42);
    for (reader_json, expected) in [
        (r#""float""#, AvroValue::Float(42.0)),
        (r#""double""#, AvroValue::Double(42.0)),
    ] {
        for writer_json in [r#""int""#, r#""long""#] {
            let writer = parse_schema(writer_json).unwrap();
            let reader = parse_schema(reader_json).unwrap();
            let projector = DatumProjector::new(&reader, &writer).unwrap();
            let mut dec = BinaryDecoder::new(&data);
            assert_eq!(projector.project(&mut dec).unwrap(), expected);
        }
    }

    // float -> double
    let writer = parse_schema(r#""float""#).unwrap();
    let reader = parse_schema(r#""double""#).unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();
    let bytes = 1.5f32.to_le_bytes();
    let mut dec = BinaryDecoder::new(&bytes);
    assert_eq!(projector.project(&mut dec).unwrap(), AvroValue::Double(1.5));
}

#[test]
fn string_and_bytes_are_interchangeable() {
    let mut data = Vec::new();
    push_string(&mut data, "foo");

    let writer = parse_schema(r#""string""#).unwrap();
    let reader = parse_schema(r#""bytes""#).unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();
    let mut dec = BinaryDecoder::new(&data);
    assert_eq!(
        projector.project(&mut dec).unwrap(),
        AvroValue::Bytes(b"foo".to_vec())
    );

    let writer = parse_schema(r#""bytes""#).unwrap();
    let reader = parse_schema(r#""string""#).unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();
    let mut dec = BinaryDecoder::new(&data);
    assert_eq!(
        projector.project(&mut dec).unwrap(),
        AvroValue::String("foo".into())
    );
}

#[test]
fn impermissible_pairs_fail_at_construction() {
    let pairs = [
        (r#""int""#, r#""long""#),
        (r#""int""#, r#""string""#),
        (r#""float""#, r#""double""#),
        (r#""boolean""#, r#""int""#),
        (r#""null""#, r#""boolean""#),
    ];
    for (reader_json, writer_json) in pairs {
        let reader = parse_schema(reader_json).unwrap();
        let writer = parse_schema(writer_json).unwrap();
        assert!(
            matches!(
                DatumProjector::new(&reader, &writer),
                Err(ProjectError::Incompatible(_))
            ),
            "expected {} <- {} to be rejected",
            reader_json,
            writer_json
        );
    }
}

// ============================================================================
// Enums
// ============================================================================

#[test]
fn enum_symbols_are_remapped() {
    let writer =
        parse_schema(r#"{"type": "enum", "name": "E", "symbols": ["A", "B", "C"]}"#).unwrap();
    let reader =
        parse_schema(r#"{"type": "enum", "name": "E", "symbols": ["C", "B", "A"]}"#).unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    // Writer emits index 0, symbol A; the reader knows A at index 2
    let data = encode_zigzag(0);
    let mut dec = BinaryDecoder::new(&data);
    assert_eq!(
        projector.project(&mut dec).unwrap(),
        AvroValue::Enum(2, "A".into())
    );
}

#[test]
fn enum_symbol_missing_from_reader_is_a_runtime_error() {
    let writer =
        parse_schema(r#"{"type": "enum", "name": "E", "symbols": ["A", "B"]}"#).unwrap();
    let reader = parse_schema(r#"{"type": "enum", "name": "E", "symbols": ["A"]}"#).unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    // Symbol A still projects
    let data = encode_zigzag(0);
    let mut dec = BinaryDecoder::new(&data);
    assert_eq!(
        projector.project(&mut dec).unwrap(),
        AvroValue::Enum(0, "A".into())
    );

    // Symbol B does not exist on the reader side
    let data = encode_zigzag(1);
    let mut dec = BinaryDecoder::new(&data);
    assert!(matches!(
        projector.project(&mut dec),
        Err(ProjectError::EnumSymbolMissing { .. })
    ));
}

// ============================================================================
// Records: aliases, deleted fields, defaults, reordering
// ============================================================================

#[test]
fn field_renamed_via_alias() {
    let writer = parse_schema(
        r#"{"type": "record", "name": "P", "fields": [{"name": "fullName", "type": "string"}]}"#,
    )
    .unwrap();
    let reader = parse_schema(
        r#"{"type": "record", "name": "P", "fields": [
            {"name": "name", "type": "string", "aliases": ["fullName"]}
        ]}"#,
    )
    .unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    let mut data = Vec::new();
    push_string(&mut data, "x");
    let mut dec = BinaryDecoder::new(&data);
    let result = record(projector.project(&mut dec).unwrap());

    assert_eq!(result.get("name"), Some(&AvroValue::String("x".into())));
    assert_eq!(result.get("fullName"), None);
}

#[test]
fn deleted_field_is_drained_exactly() {
    let writer = parse_schema(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "id", "type": "int"},
            {"name": "debug", "type": "string"}
        ]}"#,
    )
    .unwrap();
    let reader = parse_schema(
        r#"{"type": "record", "name": "R", "fields": [{"name": "id", "type": "int"}]}"#,
    )
    .unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    // id=1, debug="foo"
    let data = [0x02, 0x06, 0x66, 0x6F, 0x6F];
    let mut dec = BinaryDecoder::new(&data);
    let result = record(projector.project(&mut dec).unwrap());

    assert_eq!(result.get("id"), Some(&AvroValue::Int(1)));
    assert_eq!(result.get("debug"), None);
    assert_eq!(result.len(), 1);
    assert_eq!(dec.remaining(), 0, "deleted field must be fully consumed");
}

#[test]
fn missing_field_receives_its_default() {
    let writer = parse_schema(r#"{"type": "record", "name": "R", "fields": []}"#).unwrap();
    let reader = parse_schema(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "count", "type": "int", "default": 5}
        ]}"#,
    )
    .unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    let mut dec = BinaryDecoder::new(&[]);
    let result = record(projector.project(&mut dec).unwrap());
    assert_eq!(result.get("count"), Some(&AvroValue::Int(5)));
}

#[test]
fn missing_field_without_default_is_incompatible() {
    let writer = parse_schema(r#"{"type": "record", "name": "R", "fields": []}"#).unwrap();
    let reader = parse_schema(
        r#"{"type": "record", "name": "R", "fields": [{"name": "count", "type": "int"}]}"#,
    )
    .unwrap();
    assert!(matches!(
        DatumProjector::new(&reader, &writer),
        Err(ProjectError::Incompatible(_))
    ));
}

#[test]
fn reordered_fields_land_under_their_names() {
    let writer = parse_schema(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "name", "type": "string"},
            {"name": "id", "type": "long"}
        ]}"#,
    )
    .unwrap();
    let reader = parse_schema(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "id", "type": "long"},
            {"name": "name", "type": "string"}
        ]}"#,
    )
    .unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    // Writer order: name="Alice", id=42
    let mut data = Vec::new();
    push_string(&mut data, "Alice");
    data.extend_from_slice(&encode_zigzag(42));
    let mut dec = BinaryDecoder::new(&data);
    let result = record(projector.project(&mut dec).unwrap());

    assert_eq!(result.get("id"), Some(&AvroValue::Long(42)));
    assert_eq!(result.get("name"), Some(&AvroValue::String("Alice".into())));

    // Identical to the matched-order projection
    let matched = DatumProjector::new(&writer, &writer).unwrap();
    let mut dec = BinaryDecoder::new(&data);
    let same = record(matched.project(&mut dec).unwrap());
    assert_eq!(same.get("id"), result.get("id"));
    assert_eq!(same.get("name"), result.get("name"));
}

#[test]
fn construction_is_idempotent() {
    let writer = parse_schema(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": ["null", "string"]}
        ]}"#,
    )
    .unwrap();

    let first = DatumProjector::new(&writer, &writer).unwrap();
    let second = DatumProjector::new(&writer, &writer).unwrap();

    let mut data = encode_zigzag(7);
    data.extend_from_slice(&encode_zigzag(1));
    push_string(&mut data, "x");

    let mut dec = BinaryDecoder::new(&data);
    let a = record(first.project(&mut dec).unwrap());
    let mut dec = BinaryDecoder::new(&data);
    let b = record(second.project(&mut dec).unwrap());
    assert_eq!(a, b);
}

// ============================================================================
// Unions
// ============================================================================

#[test]
fn union_to_union_keeps_writer_branches() {
    let schema = parse_schema(r#"["null", "string", "long"]"#).unwrap();
    let projector = DatumProjector::new(&schema, &schema).unwrap();

    let mut data = encode_zigzag(1);
    push_string(&mut data, "hi");
    let mut dec = BinaryDecoder::new(&data);
    assert_eq!(
        projector.project(&mut dec).unwrap(),
        AvroValue::String("hi".into())
    );

    let mut data = encode_zigzag(2);
    data.extend_from_slice(&encode_zigzag(-5));
    let mut dec = BinaryDecoder::new(&data);
    assert_eq!(projector.project(&mut dec).unwrap(), AvroValue::Long(-5));

    let data = encode_zigzag(0);
    let mut dec = BinaryDecoder::new(&data);
    assert_eq!(projector.project(&mut dec).unwrap(), AvroValue::Null);
}

#[test]
fn union_narrowing_to_single_branch() {
    let writer = parse_schema(r#"["null", "string"]"#).unwrap();
    let reader = parse_schema(r#""string""#).unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    let mut data = encode_zigzag(1);
    push_string(&mut data, "foo");
    let mut dec = BinaryDecoder::new(&data);
    assert_eq!(
        projector.project(&mut dec).unwrap(),
        AvroValue::String("foo".into())
    );

    // The null branch has no mapping in the narrowed projector
    let data = encode_zigzag(0);
    let mut dec = BinaryDecoder::new(&data);
    assert!(matches!(
        projector.project(&mut dec),
        Err(ProjectError::UnionIndexOutOfRange { index: 0, .. })
    ));
}

#[test]
fn union_widening_from_plain_writer() {
    let writer = parse_schema(r#""string""#).unwrap();
    let reader = parse_schema(r#"["null", "string"]"#).unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    // No union index on the wire: the writer wrote a bare string
    let mut data = Vec::new();
    push_string(&mut data, "bare");
    let mut dec = BinaryDecoder::new(&data);
    assert_eq!(
        projector.project(&mut dec).unwrap(),
        AvroValue::String("bare".into())
    );
}

#[test]
fn out_of_range_union_index_is_rejected() {
    let schema = parse_schema(r#"["null", "string"]"#).unwrap();
    let projector = DatumProjector::new(&schema, &schema).unwrap();

    let data = encode_zigzag(7);
    let mut dec = BinaryDecoder::new(&data);
    assert!(matches!(
        projector.project(&mut dec),
        Err(ProjectError::UnionIndexOutOfRange { index: 7, len: 2 })
    ));
}

// ============================================================================
// Arrays and maps
// ============================================================================

#[test]
fn array_spanning_multiple_blocks() {
    let schema = parse_schema(r#"{"type": "array", "items": "int"}"#).unwrap();
    let projector = DatumProjector::new(&schema, &schema).unwrap();

    // Two blocks of two items, then the terminator
    let mut data = Vec::new();
    data.extend_from_slice(&encode_zigzag(2));
    data.extend_from_slice(&encode_zigzag(1));
    data.extend_from_slice(&encode_zigzag(2));
    data.extend_from_slice(&encode_zigzag(2));
    data.extend_from_slice(&encode_zigzag(3));
    data.extend_from_slice(&encode_zigzag(4));
    data.extend_from_slice(&encode_zigzag(0));

    let mut dec = BinaryDecoder::new(&data);
    assert_eq!(
        projector.project(&mut dec).unwrap(),
        AvroValue::Array(vec![
            AvroValue::Int(1),
            AvroValue::Int(2),
            AvroValue::Int(3),
            AvroValue::Int(4)
        ])
    );
    assert_eq!(dec.remaining(), 0);
}

#[test]
fn array_items_are_promoted() {
    let writer = parse_schema(r#"{"type": "array", "items": "int"}"#).unwrap();
    let reader = parse_schema(r#"{"type": "array", "items": "long"}"#).unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    let mut data = Vec::new();
    data.extend_from_slice(&encode_zigzag(1));
    data.extend_from_slice(&encode_zigzag(9));
    data.extend_from_slice(&encode_zigzag(0));

    let mut dec = BinaryDecoder::new(&data);
    assert_eq!(
        projector.project(&mut dec).unwrap(),
        AvroValue::Array(vec![AvroValue::Long(9)])
    );
}

#[test]
fn map_values_are_projected() {
    let writer = parse_schema(r#"{"type": "map", "values": "int"}"#).unwrap();
    let reader = parse_schema(r#"{"type": "map", "values": "double"}"#).unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    let mut data = Vec::new();
    data.extend_from_slice(&encode_zigzag(1));
    push_string(&mut data, "k");
    data.extend_from_slice(&encode_zigzag(3));
    data.extend_from_slice(&encode_zigzag(0));

    let mut dec = BinaryDecoder::new(&data);
    assert_eq!(
        projector.project(&mut dec).unwrap(),
        AvroValue::Map(vec![("k".to_string(), AvroValue::Double(3.0))])
    );
}

// ============================================================================
// Recursive records
// ============================================================================

#[test]
fn recursive_record_three_deep() {
    let schema = parse_schema(
        r#"{"type": "record", "name": "Node", "fields": [
            {"name": "value", "type": "int"},
            {"name": "next", "type": ["null", "Node"]}
        ]}"#,
    )
    .unwrap();
    let projector = DatumProjector::new(&schema, &schema).unwrap();

    // value=1 -> value=2 -> value=3 -> null
    let mut data = Vec::new();
    data.extend_from_slice(&encode_zigzag(1));
    data.extend_from_slice(&encode_zigzag(1)); // next: branch 1 (Node)
    data.extend_from_slice(&encode_zigzag(2));
    data.extend_from_slice(&encode_zigzag(1));
    data.extend_from_slice(&encode_zigzag(3));
    data.extend_from_slice(&encode_zigzag(0)); // next: branch 0 (null)

    let mut dec = BinaryDecoder::new(&data);
    let level1 = record(projector.project(&mut dec).unwrap());
    assert_eq!(dec.remaining(), 0);

    assert_eq!(level1.get("value"), Some(&AvroValue::Int(1)));
    let level2 = match level1.get("next") {
        Some(AvroValue::Record(r)) => r,
        other => panic!("expected nested record, got {:?}", other),
    };
    assert_eq!(level2.get("value"), Some(&AvroValue::Int(2)));
    let level3 = match level2.get("next") {
        Some(AvroValue::Record(r)) => r,
        other => panic!("expected nested record, got {:?}", other),
    };
    assert_eq!(level3.get("value"), Some(&AvroValue::Int(3)));
    assert_eq!(level3.get("next"), None);

    // The cached recursive body serves a second read
    let mut dec = BinaryDecoder::new(&data);
    let again = record(projector.project(&mut dec).unwrap());
    assert_eq!(again, level1);
}

// ============================================================================
// Typed targets
// ============================================================================

#[derive(Default)]
struct User {
    id: i64,
    name: String,
    active: bool,
}

impl ProjectionTarget for User {
    fn put_field(&mut self, name: &str, value: AvroValue) -> bool {
        match (name, value) {
            ("id", AvroValue::Long(v)) => self.id = v,
            ("name", AvroValue::String(v)) => self.name = v,
            ("active", AvroValue::Boolean(v)) => self.active = v,
            _ => return false,
        }
        true
    }
}

#[test]
fn typed_target_is_populated_field_by_field() {
    let writer = parse_schema(
        r#"{"type": "record", "name": "User", "fields": [
            {"name": "id", "type": "long"},
            {"name": "legacy", "type": "string"},
            {"name": "name", "type": "string"}
        ]}"#,
    )
    .unwrap();
    let reader = parse_schema(
        r#"{"type": "record", "name": "User", "fields": [
            {"name": "id", "type": "long"},
            {"name": "name", "type": "string"},
            {"name": "active", "type": "boolean", "default": true}
        ]}"#,
    )
    .unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    let mut data = encode_zigzag(42);
    push_string(&mut data, "old"); // writer-only, drained
    push_string(&mut data, "Alice");

    let mut user = User::default();
    let mut dec = BinaryDecoder::new(&data);
    projector.project_into(&mut user, &mut dec).unwrap();

    assert_eq!(user.id, 42);
    assert_eq!(user.name, "Alice");
    assert!(user.active, "default must be injected into the target");
    assert_eq!(dec.remaining(), 0);
}

#[test]
fn typed_target_without_slot_still_advances_decoder() {
    // Reader keeps a field the target has no slot for
    let schema = parse_schema(
        r#"{"type": "record", "name": "User", "fields": [
            {"name": "id", "type": "long"},
            {"name": "nickname", "type": "string"}
        ]}"#,
    )
    .unwrap();
    let projector = DatumProjector::new(&schema, &schema).unwrap();

    let mut data = encode_zigzag(1);
    push_string(&mut data, "zed");

    let mut user = User::default();
    let mut dec = BinaryDecoder::new(&data);
    projector.project_into(&mut user, &mut dec).unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(dec.remaining(), 0);
}
