//! Integration tests for primitive encoding and container framing

#![allow(clippy::expect_used, clippy::unwrap_used)]

use binary_protocol::accel::FastCodec;
use binary_protocol::{
    read_value, skip, write_value, BinaryProtocol, BulkCodec, DecodeLimits, Field, FieldHeader, ListHeader, MapHeader,
    MemoryTransport, ProtocolConfig, ProtocolError, SetHeader, TType, Value,
};

fn protocol() -> BinaryProtocol<MemoryTransport> {
    BinaryProtocol::new(MemoryTransport::new(), ProtocolConfig::default())
}

#[test]
fn test_integer_extremes_roundtrip() {
    let mut proto = protocol();
    proto.write_byte(i8::MIN).unwrap();
    proto.write_byte(i8::MAX).unwrap();
    proto.write_i16(i16::MIN).unwrap();
    proto.write_i16(i16::MAX).unwrap();
    proto.write_i32(i32::MIN).unwrap();
    proto.write_i32(i32::MAX).unwrap();
    proto.write_i64(i64::MIN).unwrap();
    proto.write_i64(i64::MAX).unwrap();
    assert_eq!(proto.transport().len(), 2 + 4 + 8 + 16);

    assert_eq!(proto.read_byte().unwrap(), i8::MIN);
    assert_eq!(proto.read_byte().unwrap(), i8::MAX);
    assert_eq!(proto.read_i16().unwrap(), i16::MIN);
    assert_eq!(proto.read_i16().unwrap(), i16::MAX);
    assert_eq!(proto.read_i32().unwrap(), i32::MIN);
    assert_eq!(proto.read_i32().unwrap(), i32::MAX);
    assert_eq!(proto.read_i64().unwrap(), i64::MIN);
    assert_eq!(proto.read_i64().unwrap(), i64::MAX);
}

#[test]
fn test_double_special_values() {
    let mut proto = protocol();
    for v in [0.0, -0.0, f64::INFINITY, f64::NEG_INFINITY, f64::MIN_POSITIVE, f64::NAN] {
        proto.write_double(v).unwrap();
    }
    assert_eq!(proto.read_double().unwrap().to_bits(), 0.0f64.to_bits());
    assert_eq!(proto.read_double().unwrap().to_bits(), (-0.0f64).to_bits());
    assert_eq!(proto.read_double().unwrap(), f64::INFINITY);
    assert_eq!(proto.read_double().unwrap(), f64::NEG_INFINITY);
    assert_eq!(proto.read_double().unwrap(), f64::MIN_POSITIVE);
    assert!(proto.read_double().unwrap().is_nan());
}

#[test]
fn test_bool_writes_one_and_zero() {
    let mut proto = protocol();
    proto.write_bool(true).unwrap();
    proto.write_bool(false).unwrap();
    assert_eq!(proto.transport().as_slice(), &[1, 0]);
}

#[test]
fn test_empty_and_unicode_strings() {
    let mut proto = protocol();
    proto.write_string("").unwrap();
    proto.write_string("héllo ✓").unwrap();
    assert_eq!(&proto.transport().as_slice()[..4], &[0, 0, 0, 0]);

    assert_eq!(proto.read_string().unwrap(), "");
    assert_eq!(proto.read_string().unwrap(), "héllo ✓");
}

#[test]
fn test_binary_arbitrary_bytes() {
    let payload: Vec<u8> = (0..=255).collect();
    let mut proto = protocol();
    proto.write_binary(&payload).unwrap();
    assert_eq!(proto.read_binary().unwrap(), payload);
}

#[test]
fn test_truncated_fixed_width_reads() {
    for (bytes, width) in [(&[][..], 1usize), (&[0x00][..], 2), (&[0, 0, 0][..], 4), (&[0; 7][..], 8)] {
        let mut proto = BinaryProtocol::new(MemoryTransport::from_slice(bytes), ProtocolConfig::default());
        let result = match width {
            1 => proto.read_byte().map(|_| ()),
            2 => proto.read_i16().map(|_| ()),
            4 => proto.read_i32().map(|_| ()),
            _ => proto.read_i64().map(|_| ()),
        };
        match result {
            Err(ProtocolError::UnexpectedEof { needed }) => assert_eq!(needed, width),
            other => panic!("expected EOF for width {width}, got {other:?}"),
        }
    }
}

#[test]
fn test_truncated_double_and_bool() {
    let mut proto = BinaryProtocol::new(MemoryTransport::from_slice(&[0; 4]), ProtocolConfig::default());
    assert!(matches!(proto.read_double(), Err(ProtocolError::UnexpectedEof { .. })));

    let mut proto = BinaryProtocol::new(MemoryTransport::new(), ProtocolConfig::default());
    assert!(matches!(proto.read_bool(), Err(ProtocolError::UnexpectedEof { .. })));
}

#[test]
fn test_struct_field_sequence_roundtrip() {
    let mut proto = protocol();
    proto.write_field_begin(TType::I32, 1).unwrap();
    proto.write_i32(10).unwrap();
    proto.write_field_begin(TType::String, 2).unwrap();
    proto.write_string("x").unwrap();
    proto.write_field_begin(TType::Bool, -3).unwrap();
    proto.write_bool(false).unwrap();
    proto.write_field_stop().unwrap();

    assert_eq!(
        proto.read_field_begin().unwrap(),
        FieldHeader::Field { field_type: TType::I32, id: 1 }
    );
    assert_eq!(proto.read_i32().unwrap(), 10);
    assert_eq!(
        proto.read_field_begin().unwrap(),
        FieldHeader::Field { field_type: TType::String, id: 2 }
    );
    assert_eq!(proto.read_string().unwrap(), "x");
    assert_eq!(
        proto.read_field_begin().unwrap(),
        FieldHeader::Field { field_type: TType::Bool, id: -3 }
    );
    assert!(!proto.read_bool().unwrap());
    assert_eq!(proto.read_field_begin().unwrap(), FieldHeader::Stop);
    assert!(proto.transport().is_empty());
}

#[test]
fn test_empty_containers_roundtrip() {
    let mut proto = protocol();
    proto.write_map_begin(&MapHeader::new(TType::I32, TType::String, 0)).unwrap();
    proto.write_list_begin(&ListHeader::new(TType::Double, 0)).unwrap();
    proto.write_set_begin(&SetHeader::new(TType::I64, 0)).unwrap();

    assert_eq!(proto.read_map_begin().unwrap().size, 0);
    assert_eq!(proto.read_list_begin().unwrap().size, 0);
    assert_eq!(proto.read_set_begin().unwrap().size, 0);
    assert!(proto.transport().is_empty());
}

#[test]
fn test_nested_containers_roundtrip() {
    let value = Value::Struct(vec![
        Field::new(
            1,
            Value::map(
                TType::String,
                TType::List,
                vec![
                    (
                        Value::string("evens"),
                        Value::list(TType::I32, vec![Value::I32(2), Value::I32(4)]),
                    ),
                    (Value::string("none"), Value::list(TType::I32, vec![])),
                ],
            ),
        ),
        Field::new(2, Value::set(TType::Struct, vec![Value::Struct(vec![])])),
    ]);

    let mut proto = protocol();
    write_value(&mut proto, &value).unwrap();
    assert_eq!(read_value(&mut proto, TType::Struct).unwrap(), value);
    assert!(proto.transport().is_empty());
}

#[test]
fn test_field_lookup_helpers() {
    let value = Value::Struct(vec![Field::new(4, Value::string("name"))]);
    assert_eq!(value.field(4).and_then(Value::as_str), Some("name"));
    assert!(value.field(5).is_none());
}

#[test]
fn test_text_encoding_tags_decode_as_binary() {
    // struct { 1: utf8 "hi", 2: list<utf16> [ [0x00, 0x41] ] }
    let bytes = [
        16, 0, 1, 0, 0, 0, 2, b'h', b'i', //
        15, 0, 2, 17, 0, 0, 0, 1, 0, 0, 0, 2, 0x00, 0x41, //
        0,
    ];
    let expected = Value::Struct(vec![
        Field::new(1, Value::string("hi")),
        Field::new(
            2,
            Value::list(TType::Utf16, vec![Value::Binary(vec![0x00, 0x41].into())]),
        ),
    ]);

    let mut proto = BinaryProtocol::new(MemoryTransport::from_slice(&bytes), ProtocolConfig::default());
    assert_eq!(read_value(&mut proto, TType::Struct).unwrap(), expected);
    assert!(proto.transport().is_empty());

    let mut proto = BinaryProtocol::new(MemoryTransport::from_slice(&bytes), ProtocolConfig::default());
    skip(&mut proto, TType::Struct).unwrap();
    assert!(proto.transport().is_empty());

    let (decoded, used) = BulkCodec
        .decode(&bytes, TType::Struct, &DecodeLimits::unlimited())
        .unwrap();
    assert_eq!(decoded, expected);
    assert_eq!(used, bytes.len());
}

#[test]
fn test_text_encoding_container_keeps_its_tag() {
    let value = Value::list(TType::Utf8, vec![Value::string("a"), Value::string("bc")]);
    let mut proto = protocol();
    write_value(&mut proto, &value).unwrap();
    assert_eq!(&proto.transport().as_slice()[..5], &[16, 0, 0, 0, 2]);
    assert_eq!(read_value(&mut proto, TType::List).unwrap(), value);
}
