//! Integration tests for the accelerated fast path
//!
//! The bulk codec must be indistinguishable from the generic codec on the
//! wire, and must hand over to the generic codec whenever the transport's
//! buffered window ends before the value does.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use binary_protocol::accel::{no_fast_path, FastCodec};
use binary_protocol::utils::metrics::global_metrics;
use binary_protocol::{
    read_message, read_value, write_message, write_value, AcceleratedConfig, AcceleratedProtocol,
    AcceleratedProtocolFactory, BinaryProtocol, BulkCodec, Field, MemoryTransport, Message,
    MessageEnvelope, ProtocolConfig, ProtocolError, TType, Value,
};
use std::io::BufReader;

fn sample() -> Value {
    Value::Struct(vec![
        Field::new(1, Value::Bool(true)),
        Field::new(2, Value::Byte(-7)),
        Field::new(3, Value::I16(300)),
        Field::new(4, Value::I32(-70_000)),
        Field::new(5, Value::I64(1 << 40)),
        Field::new(6, Value::Double(3.25)),
        Field::new(7, Value::string("fast path")),
        Field::new(
            8,
            Value::map(
                TType::I32,
                TType::List,
                vec![(
                    Value::I32(1),
                    Value::list(TType::String, vec![Value::string("a"), Value::string("")]),
                )],
            ),
        ),
        Field::new(9, Value::set(TType::I64, vec![Value::I64(0), Value::I64(-1)])),
        Field::new(10, Value::Struct(vec![Field::new(-1, Value::Bool(false))])),
    ])
}

fn generic_bytes(value: &Value) -> Vec<u8> {
    let mut proto = BinaryProtocol::new(MemoryTransport::new(), ProtocolConfig::default());
    write_value(&mut proto, value).unwrap();
    proto.into_inner().into_bytes().to_vec()
}

fn accelerated<T>(transport: T, config: AcceleratedConfig) -> AcceleratedProtocol<T> {
    AcceleratedProtocol::new(transport, config).expect("built-in codec binds")
}

#[test]
fn test_fast_encode_matches_generic_bytes() {
    let mut proto = accelerated(MemoryTransport::new(), AcceleratedConfig::default());
    assert!(proto.is_accelerated());
    proto.write_value(&sample()).unwrap();
    assert_eq!(proto.transport().as_slice(), generic_bytes(&sample()).as_slice());
}

#[test]
fn test_generic_reads_fast_output() {
    let mut fast = accelerated(MemoryTransport::new(), AcceleratedConfig::default());
    fast.write_value(&sample()).unwrap();

    let mut generic = BinaryProtocol::new(fast.into_inner(), ProtocolConfig::default());
    assert_eq!(read_value(&mut generic, TType::Struct).unwrap(), sample());
}

#[test]
fn test_fast_reads_generic_output() {
    let bytes = generic_bytes(&sample());
    let mut fast = accelerated(MemoryTransport::from_slice(&bytes), AcceleratedConfig::default());
    assert_eq!(fast.read_value(TType::Struct).unwrap(), sample());
    assert!(fast.transport().is_empty());
}

#[test]
fn test_partial_window_falls_back_to_stream() {
    let mut bytes = generic_bytes(&sample());
    bytes.extend_from_slice(&[0, 0, 0, 9]);
    let before = global_metrics().snapshot().fast_fallbacks;

    let transport = BufReader::with_capacity(4, &bytes[..]);
    let mut fast = accelerated(transport, AcceleratedConfig::default());
    assert_eq!(fast.read_value(TType::Struct).unwrap(), sample());
    assert_eq!(fast.read_i32().unwrap(), 9);

    assert!(global_metrics().snapshot().fast_fallbacks > before);
}

#[test]
fn test_truncated_stream_still_eof() {
    let bytes = generic_bytes(&sample());
    let transport = BufReader::with_capacity(8, &bytes[..bytes.len() - 1]);
    let mut fast = accelerated(transport, AcceleratedConfig::default());
    assert!(matches!(
        fast.read_value(TType::Struct),
        Err(ProtocolError::UnexpectedEof { .. })
    ));
}

#[test]
fn test_fast_path_enforces_limits() {
    let config = AcceleratedConfig {
        protocol: ProtocolConfig {
            string_length_limit: Some(4),
            ..ProtocolConfig::default()
        },
        ..AcceleratedConfig::default()
    };
    let bytes = generic_bytes(&sample());
    let mut fast = accelerated(MemoryTransport::from_slice(&bytes), config);
    assert!(matches!(
        fast.read_value(TType::Struct),
        Err(ProtocolError::StringLimitExceeded { length: 9, limit: 4 })
    ));
}

#[test]
fn test_fast_path_container_limit_and_negative_length() {
    let config = AcceleratedConfig {
        protocol: ProtocolConfig {
            container_length_limit: Some(1),
            ..ProtocolConfig::default()
        },
        ..AcceleratedConfig::default()
    };
    let list = [8, 0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, 2];
    let mut fast = accelerated(MemoryTransport::from_slice(&list), config);
    assert!(matches!(
        fast.read_value(TType::List),
        Err(ProtocolError::ContainerLimitExceeded { length: 2, limit: 1 })
    ));

    let negative = [0xFF, 0xFF, 0xFF, 0xFF];
    let mut fast = accelerated(MemoryTransport::from_slice(&negative), AcceleratedConfig::default());
    assert!(matches!(
        fast.read_value(TType::String),
        Err(ProtocolError::NegativeLength(-1))
    ));
}

#[test]
fn test_message_roundtrip_through_fast_path() {
    let message = Message::new(MessageEnvelope::new("ping", 1, 42), sample());
    let mut fast = accelerated(MemoryTransport::new(), AcceleratedConfig::default());
    fast.write_message(&message).unwrap();

    let bytes = fast.transport().as_slice().to_vec();
    let mut generic = BinaryProtocol::new(MemoryTransport::new(), ProtocolConfig::default());
    write_message(&mut generic, &message).unwrap();
    assert_eq!(generic.transport().as_slice(), bytes.as_slice());

    assert_eq!(fast.read_message().unwrap(), message);
    assert_eq!(read_message(&mut generic).unwrap(), message);
}

#[test]
fn test_absent_message_on_fast_path() {
    let mut fast = accelerated(
        MemoryTransport::from_slice(&[0, 0, 0, 0, 0xAA]),
        AcceleratedConfig::default(),
    );
    let message = fast.read_message().unwrap();
    assert_eq!(message.envelope, MessageEnvelope::empty());
    assert_eq!(fast.transport().as_slice(), &[0xAA]);
}

#[test]
fn test_unavailable_codec_with_and_without_fallback() {
    let factory = AcceleratedProtocolFactory::with_loader(AcceleratedConfig::default(), no_fast_path);
    let mut proto = factory.get_protocol(MemoryTransport::new()).unwrap();
    assert!(!proto.is_accelerated());
    proto.write_value(&sample()).unwrap();
    assert_eq!(proto.read_value(TType::Struct).unwrap(), sample());

    let strict = AcceleratedConfig {
        fallback: false,
        ..AcceleratedConfig::default()
    };
    let factory = AcceleratedProtocolFactory::with_loader(strict, no_fast_path);
    assert!(matches!(
        factory.get_protocol(MemoryTransport::new()),
        Err(ProtocolError::AcceleratorUnavailable)
    ));
}

#[test]
fn test_custom_loader_is_used() {
    let proto = AcceleratedProtocol::with_loader(MemoryTransport::new(), AcceleratedConfig::default(), || {
        Some(Box::new(BulkCodec::new()) as Box<dyn FastCodec>)
    })
    .unwrap();
    assert_eq!(proto.fast_codec_name(), Some("bulk"));
}
