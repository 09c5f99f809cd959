#![no_main]

use binary_protocol::{read_message, BinaryProtocol, MemoryTransport, ProtocolConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Header probing plus body decoding on untrusted bytes, lenient and strict
    let limited = ProtocolConfig {
        string_length_limit: Some(1 << 16),
        container_length_limit: Some(1 << 12),
        ..ProtocolConfig::default()
    };
    let strict = ProtocolConfig {
        strict_read: true,
        ..limited.clone()
    };
    for config in [limited, strict] {
        let mut proto = BinaryProtocol::new(MemoryTransport::from_slice(data), config);
        let _ = read_message(&mut proto);
    }
});
