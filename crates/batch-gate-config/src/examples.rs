// crates/batch-gate-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for Batch Gate configuration. The output is static and
//! kept in sync with the defaults in [`crate::config`].

/// Returns a canonical example `batch-gate.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[engine]
hash_algorithm = "sha256"
max_calls_per_bundle = 256
max_payload_bytes = 1048576
max_reentry_depth = 8

[audit]
sink = "file"
path = "batch-gate-audit.jsonl"
"#,
    )
}
