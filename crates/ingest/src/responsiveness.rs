// Copyright 2025 Perfdash Ingest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Responsiveness payload ingestion.
//!
//! A responsiveness payload is a [`PerfData`] envelope: a version tag and
//! measurement items ready to be stored, apart from the `Count` label which
//! is dropped before the items reach the history.

use crate::diagnostics::DiagnosticSink;
use crate::error::{IngestError, IngestOutcome};
use perfdash_core::measurement::COUNT_LABEL;
use perfdash_core::{PerfData, TestToBuildData};
use tracing::debug;

/// Decode a responsiveness payload and append its items under `(test, build)`.
///
/// Decode failures are reported to `sink` and leave `history` untouched. A
/// payload whose version differs from the version pinned for `test` is
/// discarded whole.
pub fn ingest_responsiveness(
    raw: &[u8],
    build: i64,
    job: &str,
    test: &str,
    history: &mut TestToBuildData,
    sink: &mut dyn DiagnosticSink,
) -> IngestOutcome {
    let perf: PerfData = match serde_json::from_slice(raw) {
        Ok(perf) => perf,
        Err(err) => {
            sink.report(&IngestError::malformed(build, test, raw, err));
            return IngestOutcome::Malformed;
        }
    };

    let record = history.entry_or_insert(test, job, &perf.version);
    if !record.accepts(&perf.version) {
        debug!(
            test,
            build,
            expected = %record.version,
            found = %perf.version,
            "Discarding responsiveness payload with mismatched version"
        );
        return IngestOutcome::VersionMismatch {
            expected: record.version.clone(),
            found: perf.version,
        };
    }

    let build_id = build.to_string();
    let items = perf.data_items.len();
    record.extend(
        &build_id,
        perf.data_items.into_iter().map(|mut item| {
            item.strip_label(COUNT_LABEL);
            item
        }),
    );

    debug!(test, build, items, "Ingested responsiveness payload");
    IngestOutcome::Merged { items }
}
