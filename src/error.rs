//! # Error Handling
//!
//! Error types for building and running block graphs.
//!
//! ## Overview
//!
//! Two error kinds matter to the engine:
//!
//! - **[`ConfigError`]**: raised while a graph is being wired or validated. A
//!   failing [`GraphBuilder::build`](crate::GraphBuilder::build) never returns a
//!   graph; fix the wiring and rebuild.
//! - **[`RuntimeError`]**: raised while a tick is being resolved. A cycle with
//!   no `OutputsFirst` node in it is a graph design bug and aborts the tick.
//!
//! Node hooks report their own failures as a [`NodeError`]. The runtime tags
//! the boxed error with the failing node's name and hands it back unchanged
//! through [`RuntimeError::Node`].
//!
//! ## Example
//!
//! ```rust
//! use blockweave::{ConfigError, GraphBuilder, nodes::{ConstantNode, MonitorNode}};
//!
//! let mut builder = GraphBuilder::new("example");
//! let a = builder.add_node(ConstantNode::new(1_i32));
//! let b = builder.add_node(ConstantNode::new(2_i32));
//! let (monitor, _handle) = MonitorNode::<i32>::new();
//! let m = builder.add_node(monitor);
//!
//! builder.connect(m.input(), a.output()).unwrap();
//! let err = builder.connect(m.input(), b.output()).unwrap_err();
//! assert!(matches!(err, ConfigError::AlreadyConnected { .. }));
//! ```

use thiserror::Error;

/// Error type returned by node hooks (`initialize`, `compute`, `emit`, `update`, `teardown`).
pub type NodeError = Box<dyn std::error::Error + Send + Sync>;

/// Error raised while wiring or validating a graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  /// The input already has a source; an input accepts at most one connection.
  #[error("input '{input}' is already connected to '{existing}'")]
  AlreadyConnected {
    /// The input that was connected twice.
    input: String,
    /// The output it is already connected to.
    existing: String,
  },
  /// A port references a node that was not registered with this builder.
  #[error("node {node} is not registered with graph '{graph}'")]
  UnknownNode {
    /// Debug rendering of the foreign node id.
    node: String,
    /// Name of the graph the port was offered to.
    graph: String,
  },
  /// The port index is beyond the node's declared port count.
  #[error("node '{node}' has no {direction} port {index} (it declares {count})")]
  PortOutOfRange {
    /// Name of the node.
    node: String,
    /// `"input"` or `"output"`.
    direction: &'static str,
    /// Requested port index.
    index: usize,
    /// Number of ports the node declares in that direction.
    count: usize,
  },
  /// The port reference's value type differs from the type the node declares.
  #[error("port '{port}' carries {declared}, not {requested}")]
  PortTypeMismatch {
    /// Qualified port name.
    port: String,
    /// Type declared by the node.
    declared: &'static str,
    /// Type used by the port reference.
    requested: &'static str,
  },
  /// A required input was left unconnected when the graph was built.
  #[error("node '{node}' has unconnected required input '{input}'")]
  MissingRequiredInput {
    /// Name of the node.
    node: String,
    /// Name of the input port.
    input: String,
  },
  /// A node's own `validate` hook rejected the finished graph.
  #[error("node '{node}' failed validation: {message}")]
  Validation {
    /// Name of the node.
    node: String,
    /// Reason given by the node.
    message: String,
  },
}

/// Error raised while running a tick.
#[derive(Error, Debug)]
pub enum RuntimeError {
  /// `tick` was called before `start`.
  #[error("runtime '{0}' has not been started")]
  NotStarted(String),
  /// The runtime was stopped; no further ticks are valid.
  #[error("runtime '{0}' has been stopped")]
  Stopped(String),
  /// A node was demanded again while it was still being resolved.
  #[error("cycle through node '{node}' without an OutputsFirst node: {}", path.join(" -> "))]
  Cycle {
    /// The node that was re-entered.
    node: String,
    /// Resolution path from the first visit of `node` back to itself.
    path: Vec<String>,
  },
  /// The resolution stack grew past the configured maximum depth.
  #[error("resolution depth {depth} exceeded at node '{node}'")]
  DepthExceeded {
    /// The node that would have been pushed past the limit.
    node: String,
    /// The configured maximum depth.
    depth: usize,
  },
  /// A node hook failed. The node's error is kept as the source.
  #[error("node '{node}' failed: {source}")]
  Node {
    /// Name of the failing node.
    node: String,
    /// The node's own error.
    #[source]
    source: NodeError,
  },
}

impl RuntimeError {
  /// Returns `true` for the cycle error.
  pub fn is_cycle(&self) -> bool {
    matches!(self, RuntimeError::Cycle { .. })
  }

  /// Walks through nested [`RuntimeError::Node`] wrappers (composites inside
  /// composites) and returns the innermost runtime error.
  pub fn innermost(&self) -> &RuntimeError {
    let mut current = self;
    while let RuntimeError::Node { source, .. } = current {
      match source.downcast_ref::<RuntimeError>() {
        Some(inner) => current = inner,
        None => break,
      }
    }
    current
  }
}

/// Error raised when a node reads a typed value from its inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
  /// The input index is beyond the node's input count.
  #[error("input {index} out of range ({count} inputs)")]
  OutOfRange {
    /// Requested index.
    index: usize,
    /// Number of inputs.
    count: usize,
  },
  /// The input has no value this tick.
  #[error("input '{port}' has no value")]
  Missing {
    /// Input port name.
    port: String,
  },
  /// The input holds a value of another type.
  #[error("input '{port}' does not hold a {expected}")]
  TypeMismatch {
    /// Input port name.
    port: String,
    /// Type the node asked for.
    expected: &'static str,
  },
}
