// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end loopback test: two UDP-backed Reader Sessions, one
//! Receive Multiplexer, frames round-tripped over the real loopback
//! interface rather than through a direct `handle_recv` call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use rfid_reader_sdk::{
    session_handle, ConnectParams, Dialect, ReaderCallback, ReaderSession, ReceiveMultiplexer,
    SessionConfig,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::try_init();
    });
}

#[derive(Default)]
struct CountingCallback {
    resets: Arc<AtomicUsize>,
}

impl ReaderCallback for CountingCallback {
    fn notify_reset(&mut self, _key: &str, _frame: &[u8], _offset: usize) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

fn udp_config(local_port: u16, remote_port: u16) -> SessionConfig {
    SessionConfig::new(
        Dialect::General,
        ConnectParams::Udp {
            remote_addr: "127.0.0.1".into(),
            remote_port,
            local_addr: Some("127.0.0.1".into()),
            local_port: Some(local_port),
        },
    )
}

#[test]
fn reset_command_round_trips_through_real_udp_sockets() {
    init_logging();

    let mux = ReceiveMultiplexer::new().expect("multiplexer");
    mux.start().expect("start worker");

    let mut receiver = ReaderSession::new(udp_config(19201, 19202));
    receiver.connect().expect("receiver connect");
    let resets = Arc::new(AtomicUsize::new(0));
    receiver.set_callback(Box::new(CountingCallback { resets: resets.clone() }));
    mux.add(session_handle(receiver)).expect("register receiver");

    let mut sender = ReaderSession::new(udp_config(19202, 19201));
    sender.connect().expect("sender connect");
    sender.reset().expect("send reset frame");

    let deadline = Instant::now() + Duration::from_secs(2);
    while resets.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }

    mux.stop();
    assert_eq!(resets.load(Ordering::SeqCst), 1);
}
