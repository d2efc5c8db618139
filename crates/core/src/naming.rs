// Copyright 2025 Perfdash Ingest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pod name canonicalization.
//!
//! Replicas of one workload differ only by generated tokens appended to a
//! shared base name (`coredns-7d4f8b9c6-x2kzq`, `etcd-0`, `pod-abc123`).
//! Resource-gatherer sample names additionally carry the container after a
//! slash (`coredns-7d4f8b9c6-x2kzq/coredns`), so the generated tokens are an
//! infix of the full name. [`canonicalize`] strips them to recover the
//! logical entity.

use once_cell::sync::Lazy;
use regex::Regex;

/// Ordinals and tokens drawn from the Kubernetes generated-name alphabet.
static GENERATED_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9]+|[bcdfghjklmnpqrstvwxz2456789]{5,10})$")
        .expect("generated token pattern is valid")
});

/// API and release versions such as `v1`, `v2beta1`; never generated.
static VERSION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v[0-9]+(?:(?:alpha|beta)[0-9]+)?$").expect("version token pattern is valid")
});

/// Strip disambiguation infixes from an entity name.
///
/// Total and idempotent: names without generated tokens come back unchanged,
/// and the first `-`-separated token of the pod segment is always kept.
pub fn canonicalize(name: &str) -> String {
    match name.split_once('/') {
        Some((pod, container)) => format!("{}/{}", strip_generated_suffixes(pod), container),
        None => strip_generated_suffixes(name).to_string(),
    }
}

fn strip_generated_suffixes(pod: &str) -> &str {
    let mut base = pod;
    while let Some((head, tail)) = base.rsplit_once('-') {
        if head.is_empty() || !is_generated(tail) {
            break;
        }
        base = head;
    }
    base
}

fn is_generated(token: &str) -> bool {
    !VERSION_TOKEN.is_match(token) && (GENERATED_TOKEN.is_match(token) || is_hash_like(token))
}

// Lowercase alphanumeric, mixing letters and digits: `abc123`, `7f3e9a`.
fn is_hash_like(token: &str) -> bool {
    (5..=16).contains(&token.len())
        && token
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && token.chars().any(|c| c.is_ascii_digit())
        && token.chars().any(|c| c.is_ascii_lowercase())
}
