//! Runtime configuration.
//!
//! [`RuntimeConfig`] is plain data: build it with the `with_*` setters or load
//! it from JSON. Missing fields take their defaults.
//!
//! ```rust
//! use blockweave::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_json(r#"{ "name": "arm", "max_depth": 64 }"#).unwrap();
//! assert_eq!(config.max_depth, 64);
//! assert!(!config.trace_ticks);
//! ```

use serde::{Deserialize, Serialize};

/// Default bound on the resolution stack.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Settings for a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
  /// Name used in logs and errors. Empty means "use the graph's name".
  pub name: String,
  /// Maximum number of nodes on the resolution stack at once.
  pub max_depth: usize,
  /// Emit a `debug!` summary after every tick.
  pub trace_ticks: bool,
}

impl RuntimeConfig {
  /// Creates a config with default values.
  pub fn new() -> Self {
    Self::default()
  }

  /// Parses a config from JSON.
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(json)
  }

  /// Serializes the config to JSON.
  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(self)
  }

  /// Sets the runtime name.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  /// Sets the maximum resolution depth.
  pub fn with_max_depth(mut self, max_depth: usize) -> Self {
    self.max_depth = max_depth;
    self
  }

  /// Enables or disables per-tick summaries.
  pub fn with_trace_ticks(mut self, trace_ticks: bool) -> Self {
    self.trace_ticks = trace_ticks;
    self
  }
}

impl Default for RuntimeConfig {
  fn default() -> Self {
    Self {
      name: String::new(),
      max_depth: DEFAULT_MAX_DEPTH,
      trace_ticks: false,
    }
  }
}
