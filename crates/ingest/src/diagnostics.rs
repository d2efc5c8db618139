// Copyright 2025 Perfdash Ingest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic sinks.
//!
//! Ingestors never write to a process-wide stream themselves; the caller
//! injects a [`DiagnosticSink`] and decides where reports go.

use crate::error::IngestError;
use std::io::{self, Write};
use tracing::{error, warn};

/// Destination for ingestion diagnostics.
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticSink {
    /// Record one diagnostic.
    fn report(&mut self, error: &IngestError);
}

/// Emits every diagnostic as a `tracing` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, err: &IngestError) {
        warn!(
            build = err.build(),
            test = %err.test(),
            error = %err,
            "Dropping payload"
        );
    }
}

/// Writes one line per diagnostic to an `io::Write` target.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<io::Stderr> {
    /// Sink writing to the process error stream.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn report(&mut self, err: &IngestError) {
        if let Err(io_err) = writeln!(self.writer, "{}", err) {
            error!(error = %io_err, "Failed to write diagnostic");
        }
    }
}

/// Keeps rendered diagnostics in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    lines: Vec<String>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered diagnostics in report order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of diagnostics reported so far.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, err: &IngestError) {
        self.lines.push(err.to_string());
    }
}
