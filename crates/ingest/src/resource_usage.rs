// Copyright 2025 Perfdash Ingest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resource-usage payload ingestion.
//!
//! The resource gatherer reports, for every percentile, one CPU/memory sample
//! per container. Samples are regrouped by canonical pod name and folded into
//! two measurement items per pod: CPU in cores and memory in MiB, each with
//! one series point per percentile.

use crate::diagnostics::DiagnosticSink;
use crate::error::{IngestError, IngestOutcome};
use perfdash_core::measurement::{null_as_default, POD_NAME_LABEL, RESOURCE_LABEL};
use perfdash_core::{canonicalize, MeasurementItem, TestToBuildData};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Version pinned for tests fed by resource-usage payloads, which carry none.
pub const RESOURCE_USAGE_VERSION: &str = "v1";

/// Unit of synthesized CPU items.
pub const CPU_UNIT: &str = "cores";

/// Unit of synthesized memory items.
pub const MEMORY_UNIT: &str = "MiB";

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// One container sample at one percentile.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ResourceSample {
    /// Container name, `pod/container`.
    #[serde(rename = "Name", default, deserialize_with = "null_as_default")]
    pub name: String,
    /// CPU usage in cores.
    #[serde(rename = "Cpu", default, deserialize_with = "null_as_default")]
    pub cpu: f64,
    /// Memory usage in bytes.
    #[serde(rename = "Mem", default, deserialize_with = "null_as_default")]
    pub memory_bytes: i64,
}

/// Percentile label to the samples recorded at that percentile.
///
/// A `null` sample list counts as empty.
pub type ResourceUsagePercentiles = BTreeMap<String, Option<Vec<ResourceSample>>>;

#[derive(Debug, Clone, Copy)]
struct EntityUsage {
    cpu: f64,
    memory_bytes: f64,
}

type UsageAtPercentiles = BTreeMap<String, EntityUsage>;

/// Decode a resource-usage payload and append two items per pod under `(test, build)`.
///
/// Decode failures are reported to `sink` and leave `history` untouched. A
/// test already pinned to a version other than [`RESOURCE_USAGE_VERSION`]
/// does not accept the payload.
pub fn ingest_resource_usage(
    raw: &[u8],
    build: i64,
    job: &str,
    test: &str,
    history: &mut TestToBuildData,
    sink: &mut dyn DiagnosticSink,
) -> IngestOutcome {
    let percentiles: ResourceUsagePercentiles = match serde_json::from_slice(raw) {
        Ok(percentiles) => percentiles,
        Err(err) => {
            sink.report(&IngestError::malformed(build, test, raw, err));
            return IngestOutcome::Malformed;
        }
    };

    let record = history.entry_or_insert(test, job, RESOURCE_USAGE_VERSION);
    if !record.accepts(RESOURCE_USAGE_VERSION) {
        debug!(
            test,
            build,
            expected = %record.version,
            found = RESOURCE_USAGE_VERSION,
            "Discarding resource usage payload with mismatched version"
        );
        return IngestOutcome::VersionMismatch {
            expected: record.version.clone(),
            found: RESOURCE_USAGE_VERSION.to_string(),
        };
    }

    let items = synthesize_items(group_by_pod(percentiles));
    let count = items.len();
    record.extend(&build.to_string(), items);

    debug!(test, build, items = count, "Ingested resource usage payload");
    IngestOutcome::Merged { items: count }
}

// Later samples for the same (pod, percentile) overwrite earlier ones.
// TODO: decide whether duplicates should keep the maximum usage instead.
fn group_by_pod(percentiles: ResourceUsagePercentiles) -> BTreeMap<String, UsageAtPercentiles> {
    let mut usage: BTreeMap<String, UsageAtPercentiles> = BTreeMap::new();
    for (percentile, samples) in percentiles {
        for sample in samples.unwrap_or_default() {
            let pod = canonicalize(&sample.name);
            let entry = EntityUsage {
                cpu: sample.cpu,
                memory_bytes: sample.memory_bytes as f64,
            };
            let at_percentiles = usage.entry(pod).or_default();
            if at_percentiles.insert(percentile.clone(), entry).is_some() {
                debug!(
                    name = %sample.name,
                    percentile = %percentile,
                    "Overwriting earlier sample for the same pod and percentile"
                );
            }
        }
    }
    usage
}

fn synthesize_items(usage: BTreeMap<String, UsageAtPercentiles>) -> Vec<MeasurementItem> {
    let mut items = Vec::with_capacity(usage.len() * 2);
    for (pod, at_percentiles) in usage {
        let mut cpu = MeasurementItem::new(CPU_UNIT)
            .with_label(POD_NAME_LABEL, pod.as_str())
            .with_label(RESOURCE_LABEL, "CPU");
        let mut memory = MeasurementItem::new(MEMORY_UNIT)
            .with_label(POD_NAME_LABEL, pod)
            .with_label(RESOURCE_LABEL, "memory");
        for (percentile, sample) in at_percentiles {
            cpu.series.insert(percentile.clone(), sample.cpu);
            memory
                .series
                .insert(percentile, sample.memory_bytes / BYTES_PER_MIB);
        }
        items.push(cpu);
        items.push(memory);
    }
    items
}
