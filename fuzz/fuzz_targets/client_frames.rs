//! Arbitrary frames on a live connection never panic the client or drop the
//! connection.

#![no_main]

use libfuzzer_sys::fuzz_target;
use moonwatch_client::{ClientConfig, ClientEvent, ObserverClient};
use moonwatch_core::{ConnectionState, TransportEvent, TransportSignal};
use moonwatch_harness::SimEnv;

fuzz_target!(|data: &[u8]| {
    let mut client = ObserverClient::new(SimEnv::new(), ClientConfig::default());
    client.handle(ClientEvent::Connect);
    let generation = client.connection().generation();
    client.handle(ClientEvent::Transport(TransportSignal { generation, event: TransportEvent::Opened }));

    for frame in data.split(|byte| *byte == b'\n') {
        let text = String::from_utf8_lossy(frame).into_owned();
        client.handle(ClientEvent::Transport(TransportSignal {
            generation,
            event: TransportEvent::Message(text),
        }));
    }

    assert_eq!(client.connection_state(), ConnectionState::Connected);
});
