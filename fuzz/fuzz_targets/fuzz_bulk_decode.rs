#![no_main]

use binary_protocol::accel::FastCodec;
use binary_protocol::{read_value, BinaryProtocol, BulkCodec, DecodeLimits, MemoryTransport, ProtocolConfig, TType};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The bulk decoder must agree with the generic decoder on every input
    let config = ProtocolConfig {
        string_length_limit: Some(1 << 16),
        container_length_limit: Some(1 << 12),
        ..ProtocolConfig::default()
    };
    let limits = DecodeLimits::from_config(&config);

    let bulk = BulkCodec.decode(data, TType::Struct, &limits);
    let mut proto = BinaryProtocol::new(MemoryTransport::from_slice(data), config);
    let generic = read_value(&mut proto, TType::Struct);

    match (bulk, generic) {
        (Ok((a, _)), Ok(b)) => assert!(a == b || format!("{a:?}") == format!("{b:?}")),
        (Err(_), Err(_)) => {}
        (a, b) => panic!("codecs disagree: {a:?} vs {b:?}"),
    }
});
