// Copyright 2025 Perfdash Ingest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ingestion diagnostics.
//!
//! These errors never escape an ingestion call: they are handed to a
//! [`DiagnosticSink`](crate::diagnostics::DiagnosticSink) and the offending
//! payload is dropped so the rest of the batch can proceed.

use thiserror::Error;

/// Errors reported while ingesting a single payload.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Payload is not valid JSON or does not match the expected shape
    #[error("error parsing JSON in build {build}: {source} {payload}")]
    MalformedPayload {
        /// Build the payload belongs to.
        build: i64,
        /// Test the payload was ingested for.
        test: String,
        /// Raw payload, lossily decoded as UTF-8.
        payload: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// No ingestor is registered for the test
    #[error("no ingestor registered for test {test} (build {build})")]
    UnknownTest {
        /// Build the payload belongs to.
        build: i64,
        /// Unregistered test name.
        test: String,
    },
}

impl IngestError {
    /// Build a malformed-payload diagnostic from a decode failure.
    pub fn malformed(build: i64, test: &str, raw: &[u8], source: serde_json::Error) -> Self {
        IngestError::MalformedPayload {
            build,
            test: test.to_string(),
            payload: String::from_utf8_lossy(raw).into_owned(),
            source,
        }
    }

    /// Build number the diagnostic refers to.
    pub fn build(&self) -> i64 {
        match self {
            IngestError::MalformedPayload { build, .. } | IngestError::UnknownTest { build, .. } => {
                *build
            }
        }
    }

    /// Test name the diagnostic refers to.
    pub fn test(&self) -> &str {
        match self {
            IngestError::MalformedPayload { test, .. } | IngestError::UnknownTest { test, .. } => {
                test
            }
        }
    }
}

/// Result of a single ingestion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Payload was merged; `items` measurement items were appended.
    Merged {
        /// Number of items appended to the build.
        items: usize,
    },
    /// Payload version differs from the version pinned for the test.
    VersionMismatch {
        /// Version pinned for the test.
        expected: String,
        /// Version carried by the payload.
        found: String,
    },
    /// Payload could not be decoded and was reported.
    Malformed,
    /// No ingestor is registered for the test; reported.
    Unrouted,
}

impl IngestOutcome {
    /// Whether the payload contributed to the accumulator.
    pub fn is_merged(&self) -> bool {
        matches!(self, IngestOutcome::Merged { .. })
    }
}
