// crates/batch-gate-core/tests/commitment.rs
// ============================================================================
// Module: Commitment Tests
// Description: Tests for callback seeds, commitments, and the call wire format.
// Purpose: Ensure commitments are deterministic and bind both target and bundle.
// Dependencies: batch-gate-core, serde_json, sha2
// ============================================================================
//! ## Overview
//! Seeds are hashes of the canonical JSON of a bundle; commitments hash the
//! target identity together with a seed. These tests pin the encoding.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::HashSet;

use batch_gate_core::Address;
use batch_gate_core::Amount;
use batch_gate_core::BatchRequest;
use batch_gate_core::CallDescriptor;
use batch_gate_core::DEFAULT_HASH_ALGORITHM;
use batch_gate_core::HashAlgorithm;
use batch_gate_core::HashDigest;
use batch_gate_core::ReentryCommitment;
use batch_gate_core::callback_seed;
use serde_json::json;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Verifies a seed is the SHA-256 of the sorted-key JSON with string amounts and base64 payloads.
#[test]
fn callback_seed_hashes_canonical_json() {
    let calls = vec![CallDescriptor::new("z").with_value(Amount::new(7)).with_payload(vec![1_u8, 2])];
    let canonical = r#"[{"expected_callback":null,"payload":"AQI=","suppress_failure":false,"target":"z","value":"7"}]"#;
    let expected = format!("{:x}", Sha256::digest(canonical.as_bytes()));

    let seed = callback_seed(HashAlgorithm::Sha256, &calls).unwrap();

    assert_eq!(seed.as_str(), expected);
    assert_eq!(seed.algorithm, HashAlgorithm::Sha256);
    assert_eq!(seed.to_string().len(), 64);
}

/// Verifies digests and commitments work as hash-set keys.
#[test]
fn digests_and_commitments_are_hashable() {
    let seed = callback_seed(DEFAULT_HASH_ALGORITHM, &[CallDescriptor::new("z")]).unwrap();
    let same_seed = callback_seed(DEFAULT_HASH_ALGORITHM, &[CallDescriptor::new("z")]).unwrap();
    let seeds: HashSet<HashDigest> = [seed.clone(), same_seed].into_iter().collect();
    assert_eq!(seeds.len(), 1);

    let commitments: HashSet<ReentryCommitment> = ["x", "y", "x"]
        .into_iter()
        .map(|target| {
            ReentryCommitment::derive(DEFAULT_HASH_ALGORITHM, &Address::new(target), &seed).unwrap()
        })
        .collect();
    assert_eq!(commitments.len(), 2);
}

// ============================================================================
// SECTION: Seeds
// ============================================================================

/// Verifies equal bundles yield equal seeds.
#[test]
fn callback_seed_is_deterministic() {
    let first = vec![CallDescriptor::new("z"), CallDescriptor::new("w").suppressing_failure()];
    let second = first.clone();
    assert_eq!(
        callback_seed(DEFAULT_HASH_ALGORITHM, &first).unwrap(),
        callback_seed(DEFAULT_HASH_ALGORITHM, &second).unwrap()
    );
}

/// Verifies every descriptor field and the call order feed the seed.
#[test]
fn callback_seed_covers_every_field() {
    let base = vec![CallDescriptor::new("z"), CallDescriptor::new("w")];
    let variants = vec![
        vec![CallDescriptor::new("w"), CallDescriptor::new("z")],
        vec![CallDescriptor::new("z")],
        vec![CallDescriptor::new("z").with_value(Amount::new(1)), CallDescriptor::new("w")],
        vec![CallDescriptor::new("z").with_payload(vec![0_u8]), CallDescriptor::new("w")],
        vec![CallDescriptor::new("z").suppressing_failure(), CallDescriptor::new("w")],
        vec![
            CallDescriptor::new("z")
                .expecting_callback(callback_seed(DEFAULT_HASH_ALGORITHM, &base).unwrap()),
            CallDescriptor::new("w"),
        ],
    ];
    let base_seed = callback_seed(DEFAULT_HASH_ALGORITHM, &base).unwrap();
    for variant in variants {
        assert_ne!(callback_seed(DEFAULT_HASH_ALGORITHM, &variant).unwrap(), base_seed);
    }
}

// ============================================================================
// SECTION: Commitments
// ============================================================================

/// Verifies the commitment changes with either the target or the seed.
#[test]
fn commitment_binds_target_and_seed() {
    let seed = callback_seed(DEFAULT_HASH_ALGORITHM, &[CallDescriptor::new("z")]).unwrap();
    let other_seed = callback_seed(DEFAULT_HASH_ALGORITHM, &[CallDescriptor::new("w")]).unwrap();
    let x = Address::new("x");
    let y = Address::new("y");

    let base = ReentryCommitment::derive(DEFAULT_HASH_ALGORITHM, &x, &seed).unwrap();
    assert_eq!(base, ReentryCommitment::derive(DEFAULT_HASH_ALGORITHM, &x, &seed).unwrap());
    assert_ne!(base, ReentryCommitment::derive(DEFAULT_HASH_ALGORITHM, &y, &seed).unwrap());
    assert_ne!(base, ReentryCommitment::derive(DEFAULT_HASH_ALGORITHM, &x, &other_seed).unwrap());
    assert_ne!(base.digest(), &seed);
}

/// Verifies the commitment displays as its hex digest.
#[test]
fn commitment_displays_hex_digest() {
    let seed = callback_seed(DEFAULT_HASH_ALGORITHM, &[CallDescriptor::new("z")]).unwrap();
    let commitment = ReentryCommitment::derive(DEFAULT_HASH_ALGORITHM, &Address::new("x"), &seed).unwrap();
    let rendered = commitment.to_string();
    assert_eq!(rendered.len(), 64);
    assert!(rendered.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

// ============================================================================
// SECTION: Wire Format
// ============================================================================

/// Verifies requests decode with defaults, base64 payloads, and string amounts.
#[test]
fn batch_request_decodes_from_json() {
    let request: BatchRequest = serde_json::from_value(json!({
        "caller": "alice",
        "value": "340282366920938463463374607431768211455",
        "calls": [
            { "target": "x", "payload": "3q0=", "suppress_failure": true },
            { "target": "y" }
        ]
    }))
    .unwrap();

    assert_eq!(request.caller, Address::new("alice"));
    assert_eq!(request.value, Amount::new(u128::MAX));
    assert_eq!(request.calls[0].payload.as_bytes(), &[0xde, 0xad]);
    assert!(request.calls[0].suppress_failure);
    assert_eq!(request.calls[1], CallDescriptor::new("y"));
}

/// Verifies malformed payloads and amounts are rejected.
#[test]
fn batch_request_rejects_malformed_fields() {
    let bad_payload = serde_json::from_value::<CallDescriptor>(json!({
        "target": "x",
        "payload": "not base64!"
    }));
    assert!(bad_payload.is_err());

    let bad_amount = serde_json::from_value::<CallDescriptor>(json!({
        "target": "x",
        "value": "-1"
    }));
    assert!(bad_amount.is_err());
}
