#![warn(missing_docs)]
//! # spimf-contract-tests
//!
//! Loads the frozen JSON schemas and fixtures under the workspace
//! `contracts/` directory so wire shapes produced by the client can be checked
//! against them.

use std::path::PathBuf;

use jsonschema::JSONSchema;
use serde_json::Value;

/// Absolute path of the workspace `contracts/` directory.
pub fn contracts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../contracts")
}

/// Reads a JSON document relative to `contracts/`.
///
/// # Errors
/// Returns a description when the file is unreadable or not JSON.
pub fn load_json(relative: &str) -> Result<Value, String> {
    let path = contracts_dir().join(relative);
    let raw = std::fs::read_to_string(&path)
        .map_err(|error| format!("cannot read {}: {error}", path.display()))?;
    serde_json::from_str(&raw).map_err(|error| format!("invalid JSON in {}: {error}", path.display()))
}

/// Compiles the schema stored at `contracts/<schema_name>`.
///
/// # Errors
/// Returns a description when the schema cannot be loaded or compiled.
pub fn compile_validator(schema_name: &str) -> Result<JSONSchema, String> {
    let schema = load_json(schema_name)?;
    JSONSchema::compile(&schema).map_err(|error| format!("schema {schema_name}: {error}"))
}

/// Every validation error for `instance`, rendered as text.
pub fn validation_errors(validator: &JSONSchema, instance: &Value) -> Vec<String> {
    match validator.validate(instance) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|error| format!("{}: {error}", error.instance_path))
            .collect(),
    }
}
