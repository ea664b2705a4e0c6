// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receive Multiplexer: one worker thread drains every connected Reader
//! Session's transport and feeds the bytes into its `handle_recv`.
//!
//! UDP and TCP sessions register their socket with a single
//! `mio::Poll` selector so the worker wakes as soon as data arrives;
//! serial sessions expose no OS readiness mechanism and are polled on a
//! timer instead, coalesced to a 50ms cadence so a trickle of single
//! bytes doesn't spin the worker thread reading one byte at a time.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::session::ReaderSession;

const POLL_TIMEOUT: Duration = Duration::from_millis(10);
const SERIAL_COALESCE_INTERVAL: Duration = Duration::from_millis(50);
const LOOP_SLEEP: Duration = Duration::from_millis(10);
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(2);
const STOP_TOKEN: mio::Token = mio::Token(usize::MAX);

/// A Reader Session shared between the caller that issues commands and
/// the multiplexer's worker thread that feeds it received bytes.
pub type SessionHandle = Arc<Mutex<ReaderSession>>;

/// Wrap a session for registration with a [`ReceiveMultiplexer`].
pub fn session_handle(session: ReaderSession) -> SessionHandle {
    Arc::new(Mutex::new(session))
}

struct PollState {
    poll: mio::Poll,
}

struct Shared {
    poll_state: Mutex<PollState>,
    waker: mio::Waker,
    next_token: Mutex<usize>,
    pollable: Mutex<HashMap<mio::Token, SessionHandle>>,
    serial: Mutex<Vec<SessionHandle>>,
    by_key: Mutex<HashMap<String, SessionHandle>>,
}

struct WorkerHandle {
    join: JoinHandle<()>,
    stop_tx: mpsc::Sender<()>,
}

/// Owns the worker thread and the session registry it drains. Sessions
/// are added after `connect`, when their key and pollability are known,
/// and removed (or dropped wholesale by `stop`) when no longer needed.
pub struct ReceiveMultiplexer {
    shared: Arc<Shared>,
    worker: Mutex<Option<WorkerHandle>>,
}

impl ReceiveMultiplexer {
    /// Build a fresh multiplexer with its own `mio::Poll` instance and no
    /// worker thread running yet. Exposed directly (rather than only
    /// through [`Self::get_instance`]) so tests can construct an
    /// isolated instance instead of sharing the process-wide singleton.
    pub fn new() -> Result<Self> {
        let poll = mio::Poll::new().map_err(Error::from)?;
        let waker = mio::Waker::new(poll.registry(), STOP_TOKEN).map_err(Error::from)?;
        Ok(ReceiveMultiplexer {
            shared: Arc::new(Shared {
                poll_state: Mutex::new(PollState { poll }),
                waker,
                next_token: Mutex::new(0),
                pollable: Mutex::new(HashMap::new()),
                serial: Mutex::new(Vec::new()),
                by_key: Mutex::new(HashMap::new()),
            }),
            worker: Mutex::new(None),
        })
    }

    /// The process-wide multiplexer most applications should use.
    pub fn get_instance() -> &'static ReceiveMultiplexer {
        static INSTANCE: OnceLock<ReceiveMultiplexer> = OnceLock::new();
        INSTANCE.get_or_init(|| {
            ReceiveMultiplexer::new().expect("failed to create the process-wide receive multiplexer")
        })
    }

    /// Spawn the worker thread, if it is not already running. Calling
    /// `start` again after `stop` reuses the same `mio::Poll` instance
    /// and registry, so sessions added before the restart are still
    /// live.
    pub fn start(&self) -> Result<()> {
        let mut worker_guard = self.worker.lock();
        if worker_guard.is_some() {
            return Ok(());
        }
        let (stop_tx, stop_rx) = mpsc::channel();
        let shared = self.shared.clone();
        let join = std::thread::Builder::new()
            .name("rfid-receive-mux".into())
            .spawn(move || worker_loop(&shared, &stop_rx))
            .map_err(|e| Error::Internal(format!("failed to spawn receive multiplexer worker: {e}")))?;
        *worker_guard = Some(WorkerHandle { join, stop_tx });
        Ok(())
    }

    /// Stop the worker thread (bounded by a 2 second join) and release
    /// every session's transport, emptying the registry. A fresh `start`
    /// afterward begins with no sessions registered.
    pub fn stop(&self) {
        let worker = self.worker.lock().take();
        if let Some(WorkerHandle { join, stop_tx }) = worker {
            let _ = stop_tx.send(());
            let _ = self.shared.waker.wake();
            let (done_tx, done_rx) = mpsc::channel();
            std::thread::spawn(move || {
                let _ = join.join();
                let _ = done_tx.send(());
            });
            if done_rx.recv_timeout(STOP_JOIN_TIMEOUT).is_err() {
                log_warn!("receive multiplexer: worker thread did not stop within {STOP_JOIN_TIMEOUT:?}");
            }
        }

        for (_, handle) in self.shared.pollable.lock().drain() {
            let _ = handle.lock().release();
        }
        for handle in self.shared.serial.lock().drain(..) {
            let _ = handle.lock().release();
        }
        self.shared.by_key.lock().clear();
    }

    /// Hand a connected session to the multiplexer. Registers UDP/TCP
    /// sessions with the `mio::Poll` selector; serial sessions are
    /// appended to the timer-polled list instead. Returns the session's
    /// key, which doubles as the handle applications use with
    /// [`Self::remove`] and [`Self::get`].
    pub fn add(&self, session: SessionHandle) -> Result<String> {
        let (key, is_pollable) = {
            let guard = session.lock();
            (guard.key().to_string(), guard.is_pollable().ok_or(Error::NotConnected)?)
        };
        if key.is_empty() {
            return Err(Error::NotConnected);
        }

        if is_pollable {
            let token = {
                let mut next = self.shared.next_token.lock();
                let token = mio::Token(*next);
                *next += 1;
                token
            };
            {
                let state = self.shared.poll_state.lock();
                session.lock().register_with(state.poll.registry(), token)?;
            }
            self.shared.pollable.lock().insert(token, session.clone());
        } else {
            self.shared.serial.lock().push(session.clone());
        }

        self.shared.by_key.lock().insert(key.clone(), session);
        Ok(key)
    }

    /// Look up a registered session by its transport key.
    pub fn get(&self, key: &str) -> Option<SessionHandle> {
        self.shared.by_key.lock().get(key).cloned()
    }

    /// Stop draining `key`'s session and forget it. Does not release the
    /// session's transport or change its state; callers that also want
    /// that should call `release` on the handle themselves.
    pub fn remove(&self, key: &str) -> Result<()> {
        let Some(handle) = self.shared.by_key.lock().remove(key) else {
            return Ok(());
        };

        let token = {
            let pollable = self.shared.pollable.lock();
            pollable.iter().find(|(_, h)| Arc::ptr_eq(h, &handle)).map(|(t, _)| *t)
        };

        if let Some(token) = token {
            self.shared.pollable.lock().remove(&token);
            let state = self.shared.poll_state.lock();
            handle.lock().deregister_from(state.poll.registry())?;
        } else {
            self.shared.serial.lock().retain(|h| !Arc::ptr_eq(h, &handle));
        }
        Ok(())
    }
}

fn worker_loop(shared: &Arc<Shared>, stop_rx: &mpsc::Receiver<()>) {
    let mut events = mio::Events::with_capacity(64);
    let mut last_serial_poll = Instant::now();

    loop {
        if stop_rx.try_recv().is_ok() {
            break;
        }

        {
            let mut state = shared.poll_state.lock();
            if let Err(e) = state.poll.poll(&mut events, Some(POLL_TIMEOUT)) {
                log_warn!("receive multiplexer: poll error: {e}");
                continue;
            }
        }

        for event in events.iter() {
            if event.token() == STOP_TOKEN {
                continue;
            }
            let handle = shared.pollable.lock().get(&event.token()).cloned();
            if let Some(handle) = handle {
                poll_one(&handle);
            }
        }

        if last_serial_poll.elapsed() >= SERIAL_COALESCE_INTERVAL {
            let handles: Vec<SessionHandle> = shared.serial.lock().clone();
            for handle in &handles {
                poll_one(handle);
            }
            last_serial_poll = Instant::now();
        }

        std::thread::sleep(LOOP_SLEEP);
    }
}

/// Drain one session's transport, isolating a panicking callback so it
/// cannot take the whole worker thread down with it.
fn poll_one(handle: &SessionHandle) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handle.lock().poll_transport()));
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log_warn!("receive multiplexer: session recv failed: {e}"),
        Err(_) => log_error!("receive multiplexer: callback panicked while dispatching a frame"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Dialect;
    use crate::session::{ReaderCallback, SessionConfig};
    use crate::transport::ConnectParams;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn udp_config(local_port: u16, remote_port: u16) -> SessionConfig {
        SessionConfig::new(
            Dialect::Uhf,
            ConnectParams::Udp {
                remote_addr: "127.0.0.1".into(),
                remote_port,
                local_addr: Some("127.0.0.1".into()),
                local_port: Some(local_port),
            },
        )
        .with_address(1)
    }

    #[derive(Default)]
    struct CountingCallback {
        inventory_once: Arc<AtomicUsize>,
    }

    impl ReaderCallback for CountingCallback {
        fn notify_inventory_once(&mut self, _key: &str, _frame: &[u8], _offset: usize) {
            self.inventory_once.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn add_requires_connected_session() {
        let mux = ReceiveMultiplexer::new().unwrap();
        let session = session_handle(ReaderSession::new(udp_config(19101, 19102)));
        assert!(matches!(mux.add(session), Err(Error::NotConnected)));
    }

    #[test]
    fn add_then_get_then_remove_roundtrips() {
        let mux = ReceiveMultiplexer::new().unwrap();
        let mut raw = ReaderSession::new(udp_config(19103, 19104));
        raw.connect().unwrap();
        let key = raw.key().to_string();
        let session = session_handle(raw);

        let returned_key = mux.add(session.clone()).unwrap();
        assert_eq!(returned_key, key);
        assert!(mux.get(&key).is_some());

        mux.remove(&key).unwrap();
        assert!(mux.get(&key).is_none());
    }

    #[test]
    fn worker_dispatches_frames_received_over_loopback_udp() {
        let mux = ReceiveMultiplexer::new().unwrap();
        mux.start().unwrap();

        let mut receiver = ReaderSession::new(udp_config(19105, 19106));
        receiver.connect().unwrap();
        let counts = Arc::new(AtomicUsize::new(0));
        receiver.set_callback(Box::new(CountingCallback { inventory_once: counts.clone() }));
        mux.add(session_handle(receiver)).unwrap();

        let mut sender = ReaderSession::new(udp_config(19106, 19105));
        sender.connect().unwrap();
        sender.inventory_once().unwrap(); // UHF: single INVENTORY_ONCE frame, harmless as test traffic

        let deadline = Instant::now() + Duration::from_secs(2);
        while counts.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }

        mux.stop();
        assert!(counts.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn start_is_idempotent_and_stop_without_start_is_harmless() {
        let mux = ReceiveMultiplexer::new().unwrap();
        mux.stop(); // no worker running yet
        mux.start().unwrap();
        mux.start().unwrap(); // second start is a no-op, not a second thread
        mux.stop();
    }
}
