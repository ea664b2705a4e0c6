// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compile-time gated logging, delegating to the `log` facade.
//!
//! A `logging`/`trace` Cargo feature split backed by the ecosystem `log`
//! crate instead of a hand-rolled logger: downstream binaries still
//! choose their own subscriber (e.g. `env_logger`), this crate just
//! avoids paying for the macro expansion at every call site when the
//! `logging` feature is off. `trace!` further requires the `trace`
//! feature, for the receive loop's byte-level detail that would
//! otherwise dominate output at `debug` level.

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        log::debug!($($arg)*);
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        log::info!($($arg)*);
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        log::warn!($($arg)*);
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        log::error!($($arg)*);
    };
}

#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        #[cfg(all(feature = "logging", feature = "trace"))]
        log::trace!($($arg)*);
    };
}
