// crates/batch-gate-config/src/config.rs
// ============================================================================
// Module: Batch Gate Configuration
// Description: Configuration loading and validation for Batch Gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: batch-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed; unknown keys are rejected.
//! The validated model converts into a [`BatchEngineConfig`] and an audit sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use batch_gate_core::BatchEngine;
use batch_gate_core::BatchEngineConfig;
use batch_gate_core::HashAlgorithm;
use batch_gate_core::runtime::BatchAuditSink;
use batch_gate_core::runtime::DEFAULT_MAX_CALLS_PER_BUNDLE;
use batch_gate_core::runtime::DEFAULT_MAX_PAYLOAD_BYTES;
use batch_gate_core::runtime::DEFAULT_MAX_REENTRY_DEPTH;
use batch_gate_core::runtime::FileAuditSink;
use batch_gate_core::runtime::NoopAuditSink;
use batch_gate_core::runtime::StderrAuditSink;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "batch-gate.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "BATCH_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum configurable calls per bundle.
pub const MAX_CALLS_PER_BUNDLE_LIMIT: usize = 4096;
/// Maximum configurable payload size in bytes.
pub const MAX_PAYLOAD_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Maximum configurable reentry depth.
pub const MAX_REENTRY_DEPTH_LIMIT: usize = 64;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Batch Gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchGateConfig {
    /// Engine limits and hashing.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl BatchGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Returns the engine configuration described by this config.
    #[must_use]
    pub const fn engine_config(&self) -> BatchEngineConfig {
        BatchEngineConfig {
            hash_algorithm: self.engine.hash_algorithm,
            max_calls_per_bundle: self.engine.max_calls_per_bundle,
            max_payload_bytes: self.engine.max_payload_bytes,
            max_reentry_depth: self.engine.max_reentry_depth,
        }
    }

    /// Builds the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the audit sink cannot be opened.
    pub fn build_audit_sink(&self) -> Result<Arc<dyn BatchAuditSink>, ConfigError> {
        self.audit.build_sink()
    }

    /// Builds an engine wired to the configured limits and audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the audit sink cannot be opened.
    pub fn build_engine(&self) -> Result<BatchEngine, ConfigError> {
        Ok(BatchEngine::with_audit_sink(self.engine_config(), self.build_audit_sink()?))
    }
}

/// Engine limits and hashing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Hash algorithm for callback seeds and commitments.
    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: HashAlgorithm,
    /// Maximum calls accepted in one bundle.
    #[serde(default = "default_max_calls_per_bundle")]
    pub max_calls_per_bundle: usize,
    /// Maximum payload size for one call in bytes.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// Maximum reentry nesting depth.
    #[serde(default = "default_max_reentry_depth")]
    pub max_reentry_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: default_hash_algorithm(),
            max_calls_per_bundle: default_max_calls_per_bundle(),
            max_payload_bytes: default_max_payload_bytes(),
            max_reentry_depth: default_max_reentry_depth(),
        }
    }
}

impl EngineConfig {
    /// Validates engine limits.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_range(
            "engine.max_calls_per_bundle",
            self.max_calls_per_bundle,
            MAX_CALLS_PER_BUNDLE_LIMIT,
        )?;
        validate_range("engine.max_payload_bytes", self.max_payload_bytes, MAX_PAYLOAD_BYTES_LIMIT)?;
        validate_range("engine.max_reentry_depth", self.max_reentry_depth, MAX_REENTRY_DEPTH_LIMIT)
    }
}

/// Audit sink kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard audit events.
    #[default]
    None,
    /// Write JSON lines to stderr.
    Stderr,
    /// Append JSON lines to a file.
    File,
}

/// Audit configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Selected sink.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file path (file sink only).
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates sink selection against the path setting.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for file sink".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (AuditSinkKind::None | AuditSinkKind::Stderr, Some(_)) => Err(ConfigError::Invalid(
                "audit.path is only valid for file sink".to_string(),
            )),
            (AuditSinkKind::None | AuditSinkKind::Stderr, None) => Ok(()),
        }
    }

    /// Opens the configured sink.
    fn build_sink(&self) -> Result<Arc<dyn BatchAuditSink>, ConfigError> {
        match self.sink {
            AuditSinkKind::None => Ok(Arc::new(NoopAuditSink)),
            AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
            AuditSinkKind::File => {
                let path = self.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("audit.path is required for file sink".to_string())
                })?;
                let sink = FileAuditSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
        }
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default hash algorithm.
const fn default_hash_algorithm() -> HashAlgorithm {
    HashAlgorithm::Sha256
}

/// Default calls per bundle.
const fn default_max_calls_per_bundle() -> usize {
    DEFAULT_MAX_CALLS_PER_BUNDLE
}

/// Default payload size limit.
const fn default_max_payload_bytes() -> usize {
    DEFAULT_MAX_PAYLOAD_BYTES
}

/// Default reentry depth.
const fn default_max_reentry_depth() -> usize {
    DEFAULT_MAX_REENTRY_DEPTH
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates that a limit lies within `1..=max`.
fn validate_range(field: &str, value: usize, max: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(format!("{field} must be greater than zero")));
    }
    if value > max {
        return Err(ConfigError::Invalid(format!("{field} exceeds max {max}")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
