// Copyright 2025 Perfdash Ingest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-test, per-build measurement history.
//!
//! [`TestToBuildData`] is the accumulator both ingestors write into and the
//! dashboard renderer reads from. Each test owns one [`BuildRecord`] whose
//! `version` is pinned by the first payload seen for that test.
//!
//! The version guard itself is not enforced here: [`BuildRecord::accepts`]
//! only answers the question, and each ingestor decides to discard a payload.

use crate::measurement::MeasurementItem;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

/// History of one test across builds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildRecord {
    /// CI job that produces this test.
    pub job: String,
    /// Schema version every item of this test conforms to.
    pub version: String,
    /// Build id to the items collected for that build, in insertion order.
    #[serde(default)]
    pub builds: BTreeMap<String, Vec<MeasurementItem>>,
}

impl BuildRecord {
    /// Create a record with no builds.
    pub fn new(job: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            version: version.into(),
            builds: BTreeMap::new(),
        }
    }

    /// Whether a payload of `version` may be merged into this record.
    pub fn accepts(&self, version: &str) -> bool {
        self.version == version
    }

    /// Append one item to a build.
    pub fn append(&mut self, build: &str, item: MeasurementItem) {
        self.builds.entry(build.to_string()).or_default().push(item);
    }

    /// Append several items to a build, keeping their order.
    ///
    /// No build entry is created when `items` is empty.
    pub fn extend(&mut self, build: &str, items: impl IntoIterator<Item = MeasurementItem>) {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            return;
        }
        self.builds.entry(build.to_string()).or_default().extend(items);
    }

    /// Items collected for a build; empty if the build is unknown.
    pub fn items(&self, build: &str) -> &[MeasurementItem] {
        self.builds.get(build).map(Vec::as_slice).unwrap_or_default()
    }

    /// Build ids in numeric order. Non-numeric ids sort last, lexicographically.
    pub fn build_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.builds.keys().map(String::as_str).collect();
        ids.sort_by(|a, b| compare_build_ids(a, b));
        ids
    }

    /// Number of builds with at least one entry.
    pub fn build_count(&self) -> usize {
        self.builds.len()
    }

    /// Total number of items across all builds.
    pub fn item_count(&self) -> usize {
        self.builds.values().map(Vec::len).sum()
    }

    /// Keep only the last `n` builds in [`build_ids`](Self::build_ids) order.
    pub fn retain_latest(&mut self, n: usize) {
        let stale: Vec<String> = {
            let ids = self.build_ids();
            let cut = ids.len().saturating_sub(n);
            ids[..cut].iter().map(|id| id.to_string()).collect()
        };
        for id in stale {
            self.builds.remove(&id);
        }
    }
}

fn compare_build_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Accumulated history keyed by test name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestToBuildData {
    tests: BTreeMap<String, BuildRecord>,
}

impl TestToBuildData {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for `test`, creating it with `job` and `version` if absent.
    ///
    /// An existing record is returned untouched, whatever its job and version.
    pub fn entry_or_insert(&mut self, test: &str, job: &str, version: &str) -> &mut BuildRecord {
        self.tests
            .entry(test.to_string())
            .or_insert_with(|| BuildRecord::new(job, version))
    }

    /// Get the record for a test.
    pub fn get(&self, test: &str) -> Option<&BuildRecord> {
        self.tests.get(test)
    }

    /// Get the record for a test mutably.
    pub fn get_mut(&mut self, test: &str) -> Option<&mut BuildRecord> {
        self.tests.get_mut(test)
    }

    /// Whether a record exists for a test.
    pub fn contains(&self, test: &str) -> bool {
        self.tests.contains_key(test)
    }

    /// Number of tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether no test has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Iterate over tests and their records in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BuildRecord)> {
        self.tests.iter().map(|(test, record)| (test.as_str(), record))
    }

    /// Test names in order.
    pub fn test_names(&self) -> impl Iterator<Item = &str> {
        self.tests.keys().map(String::as_str)
    }

    /// Fold another accumulator into this one.
    ///
    /// Tests unknown here are moved over whole. For known tests, builds are
    /// appended only if both records carry the same version. Returns the
    /// number of tests whose contribution was dropped.
    pub fn merge(&mut self, other: TestToBuildData) -> usize {
        let mut dropped = 0;
        for (test, record) in other.tests {
            match self.tests.entry(test) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(mut slot) => {
                    if !slot.get().accepts(&record.version) {
                        debug!(
                            test = %slot.key(),
                            expected = %slot.get().version,
                            found = %record.version,
                            "Dropping merged history with mismatched version"
                        );
                        dropped += 1;
                        continue;
                    }
                    let existing = slot.get_mut();
                    for (build, items) in record.builds {
                        existing.builds.entry(build).or_default().extend(items);
                    }
                }
            }
        }
        dropped
    }

    /// Keep only the last `n` builds of every test.
    pub fn retain_latest(&mut self, n: usize) {
        for record in self.tests.values_mut() {
            record.retain_latest(n);
        }
    }
}
