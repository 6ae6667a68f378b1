// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing and Chrome trace export for strata
//! diagnostics.
//!
//! This crate provides [`TraceSink`](strata_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] writes one human-readable line per event.
//! - [`recorder::RecorderSink`] records compactly in binary, with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`] turns recorded bytes into Chrome Trace Event Format
//!   JSON, one track per thread of the composition cycle.

pub mod chrome;
pub mod pretty;
pub mod recorder;
