// Copyright 2025 Perfdash Ingest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Batch ingestion across builds, payload shapes and worker accumulators.

use perfdash_ingest::{
    canonicalize, ingest_resource_usage, ingest_responsiveness, CollectingSink, IngestConfig,
    IngestOutcome, Ingestor, TestToBuildData, WriterSink,
};
use std::collections::HashMap;

const CONFIG: &str = r#"
    [[tests]]
    name = "density_latency"
    job = "ci-perf-density"
    artifact_prefix = "PodStartupLatency"
    kind = "responsiveness"

    [[tests]]
    name = "density_resources"
    job = "ci-perf-density"
    artifact_prefix = "ResourceUsageSummary"
    kind = "resource_usage"
"#;

fn latency_payload(version: &str, value: f64) -> String {
    format!(
        r#"{{"version":"{version}","dataItems":[
            {{"data":{{"Perc50":{value},"Perc99":{}}},"unit":"ms","labels":{{"Metric":"pod_startup","Count":"300"}}}}
        ]}}"#,
        value * 2.0
    )
}

const USAGE: &str = r#"{
    "Perc50": [
        {"Name": "kube-proxy-abc123/kube-proxy", "Cpu": 0.02, "Mem": 20971520},
        {"Name": "coredns-7d4f8b9c6-x2kzq/coredns", "Cpu": 0.01, "Mem": 10485760}
    ],
    "Perc99": [
        {"Name": "kube-proxy-abc123/kube-proxy", "Cpu": 0.08, "Mem": 31457280},
        {"Name": "coredns-7d4f8b9c6-x2kzq/coredns", "Cpu": 0.05, "Mem": 12582912}
    ]
}"#;

fn ingestor() -> Ingestor {
    let config = IngestConfig::from_sources(CONFIG, Some(HashMap::new())).unwrap();
    Ingestor::from_config(&config)
}

#[test]
fn test_batch_survives_bad_payloads() {
    let ingestor = ingestor();
    let mut history = TestToBuildData::new();
    let mut sink = CollectingSink::new();

    let batch: Vec<(&str, i64, String)> = vec![
        ("density_latency", 100, latency_payload("v1", 1.0)),
        ("density_resources", 100, USAGE.to_string()),
        ("density_latency", 101, "{\"version\": \"v1\", \"dataItems\": [".to_string()),
        ("density_latency", 102, latency_payload("v2", 9.0)),
        ("density_latency", 103, latency_payload("v1", 3.0)),
        ("unregistered", 103, latency_payload("v1", 3.0)),
        ("density_resources", 103, "[]".to_string()),
        ("density_resources", 104, USAGE.to_string()),
    ];

    let outcomes: Vec<IngestOutcome> = batch
        .iter()
        .map(|(test, build, raw)| {
            ingestor.ingest(test, *build, raw.as_bytes(), &mut history, &mut sink)
        })
        .collect();

    assert_eq!(
        outcomes,
        vec![
            IngestOutcome::Merged { items: 1 },
            IngestOutcome::Merged { items: 4 },
            IngestOutcome::Malformed,
            IngestOutcome::VersionMismatch {
                expected: "v1".to_string(),
                found: "v2".to_string(),
            },
            IngestOutcome::Merged { items: 1 },
            IngestOutcome::Unrouted,
            IngestOutcome::Malformed,
            IngestOutcome::Merged { items: 4 },
        ]
    );

    assert_eq!(sink.len(), 3);
    assert!(sink.lines()[0].starts_with("error parsing JSON in build 101: "));
    assert!(sink.lines()[1].contains("unregistered"));
    assert!(sink.lines()[2].starts_with("error parsing JSON in build 103: "));

    let latency = history.get("density_latency").unwrap();
    assert_eq!(latency.job, "ci-perf-density");
    assert_eq!(latency.build_ids(), vec!["100", "103"]);
    for item in latency.builds.values().flatten() {
        assert_eq!(item.label("Count"), None);
        assert_eq!(item.label("Metric"), Some("pod_startup"));
    }
    assert_eq!(latency.items("103")[0].series.get("Perc99"), Some(&6.0));

    let resources = history.get("density_resources").unwrap();
    assert_eq!(resources.version, "v1");
    assert_eq!(resources.build_ids(), vec!["100", "104"]);
    let pods: Vec<&str> = resources
        .items("100")
        .iter()
        .filter_map(|item| item.label("PodName"))
        .collect();
    assert_eq!(
        pods,
        vec![
            "coredns/coredns",
            "coredns/coredns",
            "kube-proxy/kube-proxy",
            "kube-proxy/kube-proxy",
        ]
    );

    let proxy_memory = resources
        .items("104")
        .iter()
        .find(|item| item.label("PodName") == Some("kube-proxy/kube-proxy") && item.unit == "MiB")
        .unwrap();
    assert_eq!(proxy_memory.series.get("Perc50"), Some(&20.0));
    assert_eq!(proxy_memory.series.get("Perc99"), Some(&30.0));
}

#[test]
fn test_direct_ingestors_end_to_end() {
    let mut history = TestToBuildData::new();
    let mut sink = WriterSink::new(Vec::new());

    let raw = br#"{"version":"v1","dataItems":[{"data":{"Perc50":1.2},"unit":"ms","labels":{"Count":"5","Name":"x"}}]}"#;
    ingest_responsiveness(raw, 42, "job", "T", &mut history, &mut sink);

    let raw = br#"{"Perc50":[{"Name":"pod-abc123","Cpu":0.5,"Mem":104857600}]}"#;
    ingest_resource_usage(raw, 42, "job", "R", &mut history, &mut sink);

    assert!(sink.into_inner().is_empty());

    let json = serde_json::to_value(&history).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "R": {
                "job": "job",
                "version": "v1",
                "builds": {"42": [
                    {"data": {"Perc50": 0.5}, "unit": "cores", "labels": {"PodName": "pod", "Resource": "CPU"}},
                    {"data": {"Perc50": 100.0}, "unit": "MiB", "labels": {"PodName": "pod", "Resource": "memory"}}
                ]}
            },
            "T": {
                "job": "job",
                "version": "v1",
                "builds": {"42": [
                    {"data": {"Perc50": 1.2}, "unit": "ms", "labels": {"Name": "x"}}
                ]}
            }
        })
    );
}

#[test]
fn test_worker_accumulators_merge() {
    let ingestor = ingestor();
    let mut sink = CollectingSink::new();

    let mut first = TestToBuildData::new();
    let mut second = TestToBuildData::new();
    for build in 1..=3 {
        let raw = latency_payload("v1", build as f64);
        ingestor.ingest("density_latency", build, raw.as_bytes(), &mut first, &mut sink);
    }
    for build in 4..=6 {
        let raw = latency_payload("v1", build as f64);
        ingestor.ingest("density_latency", build, raw.as_bytes(), &mut second, &mut sink);
        ingestor.ingest("density_resources", build, USAGE.as_bytes(), &mut second, &mut sink);
    }

    assert_eq!(first.merge(second), 0);
    assert!(sink.is_empty());

    let latency = first.get("density_latency").unwrap();
    assert_eq!(latency.build_ids(), vec!["1", "2", "3", "4", "5", "6"]);

    first.retain_latest(2);
    assert_eq!(first.get("density_latency").unwrap().build_ids(), vec!["5", "6"]);
    assert_eq!(first.get("density_resources").unwrap().build_ids(), vec!["5", "6"]);
}

#[test]
fn test_artifact_routing() {
    let ingestor = ingestor();
    let routed = ingestor.route_artifact("ResourceUsageSummary_density_2024-01-01T00:00:00Z.json");
    assert_eq!(routed.map(|d| d.name.as_str()), Some("density_resources"));
    assert_eq!(canonicalize("kube-proxy-abc123/kube-proxy"), "kube-proxy/kube-proxy");
}
