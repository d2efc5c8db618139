// Copyright 2025 Perfdash Ingest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data model for perfdash ingestion.
//!
//! This crate holds the types both payload ingestors produce and the
//! per-test, per-build history they accumulate into.
//!
//! # Modules
//!
//! - [`measurement`] - The `MeasurementItem` record and the responsiveness payload envelope
//! - [`history`] - `TestToBuildData`, the accumulator keyed by test and build
//! - [`naming`] - Pod name canonicalization

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod history;
pub mod measurement;
pub mod naming;

pub use history::{BuildRecord, TestToBuildData};
pub use measurement::{MeasurementItem, PerfData};
pub use naming::canonicalize;
