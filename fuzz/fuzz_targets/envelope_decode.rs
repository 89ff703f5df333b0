//! Envelope decoding never panics, and anything decoded as outbound
//! re-encodes to something that decodes again.

#![no_main]

use libfuzzer_sys::fuzz_target;
use moonwatch_proto::{Inbound, Outbound};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(inbound) = Inbound::decode(text) {
        let _ = inbound.kind();
    }

    if let Ok(outbound) = Outbound::decode(text) {
        let encoded = outbound.encode().expect("decoded envelope re-encodes");
        assert!(Outbound::decode(&encoded).is_ok(), "{encoded}");
    }
});
