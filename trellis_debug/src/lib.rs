// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and Chrome trace export for trellis propagation cycles.
//!
//! This crate provides [`TraceSink`](trellis_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`chrome::ChromeTraceSink`]: timestamps events as they arrive and writes
//!   Chrome Trace Event Format JSON.

pub mod chrome;
pub mod pretty;
