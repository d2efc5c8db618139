// Copyright 2025 Perfdash Ingest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Performance payload ingestion for perfdash.
//!
//! Test jobs publish two payload shapes: responsiveness payloads (versioned
//! lists of measurement items) and resource-usage payloads (per-percentile
//! container CPU/memory samples). This crate decodes both and folds them into
//! a [`TestToBuildData`] history keyed by test name and build number.
//!
//! # Quick Start
//!
//! ```
//! use perfdash_ingest::{CollectingSink, Ingestor, PayloadKind, TestDescription, TestToBuildData};
//!
//! let ingestor = Ingestor::new([TestDescription::new(
//!     "load_latency",
//!     "ci-perf-load",
//!     PayloadKind::Responsiveness,
//! )]);
//! let mut history = TestToBuildData::new();
//! let mut sink = CollectingSink::new();
//!
//! let raw = br#"{"version":"v1","dataItems":[{"data":{"Perc50":1.2},"unit":"ms","labels":{"Count":"5"}}]}"#;
//! ingestor.ingest("load_latency", 42, raw, &mut history, &mut sink);
//!
//! assert_eq!(history.get("load_latency").unwrap().items("42").len(), 1);
//! assert!(sink.is_empty());
//! ```
//!
//! # Modules
//!
//! - [`responsiveness`] - Responsiveness payload ingestion
//! - [`resource_usage`] - Resource-usage payload ingestion
//! - [`dispatch`] - Routing payloads to ingestors by test or artifact name
//! - [`diagnostics`] - Injected sinks for malformed-payload reports
//! - [`config`] - TOML and environment configuration
//! - [`logging`] - Tracing subscriber setup

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod resource_usage;
pub mod responsiveness;

pub use crate::config::{IngestConfig, LoggingConfig};
pub use diagnostics::{CollectingSink, DiagnosticSink, TracingSink, WriterSink};
pub use dispatch::{Ingestor, PayloadKind, TestDescription};
pub use error::{IngestError, IngestOutcome};
pub use perfdash_core::{canonicalize, BuildRecord, MeasurementItem, PerfData, TestToBuildData};
pub use resource_usage::ingest_resource_usage;
pub use responsiveness::ingest_responsiveness;
