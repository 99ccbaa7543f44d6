//! # RuntimeConfig Test Suite

use crate::config::{DEFAULT_MAX_DEPTH, RuntimeConfig};

#[test]
fn test_config_defaults() {
  let config = RuntimeConfig::default();
  assert!(config.name.is_empty());
  assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
  assert!(!config.trace_ticks);
  assert_eq!(RuntimeConfig::new(), config);
}

#[test]
fn test_config_builder_setters() {
  let config = RuntimeConfig::new()
    .with_name("arm")
    .with_max_depth(32)
    .with_trace_ticks(true);
  assert_eq!(config.name, "arm");
  assert_eq!(config.max_depth, 32);
  assert!(config.trace_ticks);
}

#[test]
fn test_config_json_partial() {
  let config = RuntimeConfig::from_json(r#"{ "trace_ticks": true }"#).unwrap();
  assert!(config.trace_ticks);
  assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
}

#[test]
fn test_config_json_round_trip() {
  let config = RuntimeConfig::new().with_name("loop").with_max_depth(8);
  let json = config.to_json().unwrap();
  assert_eq!(RuntimeConfig::from_json(&json).unwrap(), config);
}

#[test]
fn test_config_json_rejects_bad_types() {
  assert!(RuntimeConfig::from_json(r#"{ "max_depth": "deep" }"#).is_err());
}
