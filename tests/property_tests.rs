//! Property-based tests: round-trips and promotions across generated inputs.

use proptest::prelude::*;

use avrolens::decoder::{encode_zigzag, BinaryDecoder};
use avrolens::projector::DatumProjector;
use avrolens::schema::parse_schema;
use avrolens::value::AvroValue;

/// Encode a string the way the Avro binary format does.
fn encode_string(s: &str) -> Vec<u8> {
    let mut buf = encode_zigzag(s.len() as i64);
    buf.extend_from_slice(s.as_bytes());
    buf
}

/// Encode an int array as a single block plus terminator.
fn encode_int_array(items: &[i32]) -> Vec<u8> {
    let mut buf = Vec::new();
    if !items.is_empty() {
        buf.extend_from_slice(&encode_zigzag(items.len() as i64));
        for item in items {
            buf.extend_from_slice(&encode_zigzag(i64::from(*item)));
        }
    }
    buf.extend_from_slice(&encode_zigzag(0));
    buf
}

proptest! {
    /// Identity projection reproduces any long.
    #[test]
    fn long_roundtrip(value in any::<i64>()) {
        let schema = parse_schema(r#""long""#).unwrap();
        let projector = DatumProjector::new(&schema, &schema).unwrap();
        let data = encode_zigzag(value);
        let mut dec = BinaryDecoder::new(&data);
        prop_assert_eq!(projector.project(&mut dec).unwrap(), AvroValue::Long(value));
        prop_assert_eq!(dec.remaining(), 0);
    }

    /// int -> long promotion preserves the numeric value for every i32.
    #[test]
    fn int_to_long_promotion(value in any::<i32>()) {
        let writer = parse_schema(r#""int""#).unwrap();
        let reader = parse_schema(r#""long""#).unwrap();
        let projector = DatumProjector::new(&reader, &writer).unwrap();
        let data = encode_zigzag(i64::from(value));
        let mut dec = BinaryDecoder::new(&data);
        prop_assert_eq!(
            projector.project(&mut dec).unwrap(),
            AvroValue::Long(i64::from(value))
        );
    }

    /// int -> double promotion is exact for every i32.
    #[test]
    fn int_to_double_promotion(value in any::<i32>()) {
        let writer = parse_schema(r#""int""#).unwrap();
        let reader = parse_schema(r#""double""#).unwrap();
        let projector = DatumProjector::new(&reader, &writer).unwrap();
        let data = encode_zigzag(i64::from(value));
        let mut dec = BinaryDecoder::new(&data);
        prop_assert_eq!(
            projector.project(&mut dec).unwrap(),
            AvroValue::Double(f64::from(value))
        );
    }

    /// Identity projection reproduces any string.
    #[test]
    fn string_roundtrip(value in ".*") {
        let schema = parse_schema(r#""string""#).unwrap();
        let projector = DatumProjector::new(&schema, &schema).unwrap();
        let data = encode_string(&value);
        let mut dec = BinaryDecoder::new(&data);
        prop_assert_eq!(
            projector.project(&mut dec).unwrap(),
            AvroValue::String(value)
        );
        prop_assert_eq!(dec.remaining(), 0);
    }

    /// Identity projection reproduces int arrays of any length.
    #[test]
    fn int_array_roundtrip(items in prop::collection::vec(any::<i32>(), 0..50)) {
        let schema = parse_schema(r#"{"type": "array", "items": "int"}"#).unwrap();
        let projector = DatumProjector::new(&schema, &schema).unwrap();
        let data = encode_int_array(&items);
        let mut dec = BinaryDecoder::new(&data);
        let expected: Vec<AvroValue> = items.iter().map(|i| AvroValue::Int(*i)).collect();
        prop_assert_eq!(projector.project(&mut dec).unwrap(), AvroValue::Array(expected));
        prop_assert_eq!(dec.remaining(), 0);
    }

    /// A record read through a field-permuted reader carries the same
    /// values as the identity projection.
    #[test]
    fn reordered_record_projection(id in any::<i64>(), name in "[a-z]{0,12}") {
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

        let mut data = encode_string(&name);
        data.extend_from_slice(&encode_zigzag(id));
        let mut dec = BinaryDecoder::new(&data);
        let result = match projector.project(&mut dec).unwrap() {
            AvroValue::Record(r) => r,
            other => panic!("expected record, got {:?}", other),
        };

        prop_assert_eq!(result.get("id"), Some(&AvroValue::Long(id)));
        prop_assert_eq!(result.get("name"), Some(&AvroValue::String(name)));
        prop_assert_eq!(dec.remaining(), 0);
    }

    /// Zigzag encoding round-trips through the decoder for any value.
    #[test]
    fn zigzag_roundtrip(value in any::<i64>()) {
        use avrolens::decoder::Decoder;
        let data = encode_zigzag(value);
        let mut dec = BinaryDecoder::new(&data);
        prop_assert_eq!(dec.read_long().unwrap(), value);
        prop_assert_eq!(dec.remaining(), 0);
    }
}
