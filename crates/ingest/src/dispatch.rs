// Copyright 2025 Perfdash Ingest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Routing payloads to the ingestor that understands them.
//!
//! Each test is produced by one CI job and publishes its results in one
//! payload shape. An [`Ingestor`] holds those [`TestDescription`]s and picks
//! the right parser for a payload by test name or by artifact file name.

use crate::config::IngestConfig;
use crate::diagnostics::DiagnosticSink;
use crate::error::{IngestError, IngestOutcome};
use crate::resource_usage::ingest_resource_usage;
use crate::responsiveness::ingest_responsiveness;
use perfdash_core::TestToBuildData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Payload shape a test publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// Versioned list of measurement items.
    Responsiveness,
    /// Percentile to per-container CPU and memory samples.
    ResourceUsage,
}

/// Where a test's results come from and how to parse them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDescription {
    /// Test name, the accumulator key.
    pub name: String,
    /// CI job producing the test.
    pub job: String,
    /// File-name prefix of the artifacts carrying this test's payloads.
    #[serde(default)]
    pub artifact_prefix: Option<String>,
    /// Parser for the payloads.
    pub kind: PayloadKind,
}

impl TestDescription {
    /// Describe a test without an artifact prefix.
    pub fn new(name: impl Into<String>, job: impl Into<String>, kind: PayloadKind) -> Self {
        Self {
            name: name.into(),
            job: job.into(),
            artifact_prefix: None,
            kind,
        }
    }

    /// Set the artifact file-name prefix.
    pub fn with_artifact_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.artifact_prefix = Some(prefix.into());
        self
    }
}

/// Routes payloads to the responsiveness or resource-usage ingestor.
#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    descriptions: BTreeMap<String, TestDescription>,
}

impl Ingestor {
    /// Register descriptions; a later description replaces an earlier one with the same name.
    pub fn new(descriptions: impl IntoIterator<Item = TestDescription>) -> Self {
        Self {
            descriptions: descriptions
                .into_iter()
                .map(|description| (description.name.clone(), description))
                .collect(),
        }
    }

    /// Build from the tests listed in a configuration.
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.tests.iter().cloned())
    }

    /// Description registered for a test.
    pub fn describe(&self, test: &str) -> Option<&TestDescription> {
        self.descriptions.get(test)
    }

    /// Description whose artifact prefix is the longest prefix of `file_name`.
    pub fn route_artifact(&self, file_name: &str) -> Option<&TestDescription> {
        self.descriptions
            .values()
            .filter_map(|description| {
                description
                    .artifact_prefix
                    .as_deref()
                    .filter(|prefix| file_name.starts_with(prefix))
                    .map(|prefix| (prefix.len(), description))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, description)| description)
    }

    /// Ingest a payload for a registered test.
    ///
    /// Payloads for unregistered tests are reported to `sink` and dropped.
    pub fn ingest(
        &self,
        test: &str,
        build: i64,
        raw: &[u8],
        history: &mut TestToBuildData,
        sink: &mut dyn DiagnosticSink,
    ) -> IngestOutcome {
        let Some(description) = self.describe(test) else {
            sink.report(&IngestError::UnknownTest {
                build,
                test: test.to_string(),
            });
            return IngestOutcome::Unrouted;
        };

        match description.kind {
            PayloadKind::Responsiveness => {
                ingest_responsiveness(raw, build, &description.job, test, history, sink)
            }
            PayloadKind::ResourceUsage => {
                ingest_resource_usage(raw, build, &description.job, test, history, sink)
            }
        }
    }

    /// Number of registered tests.
    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    /// Whether no test is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}
