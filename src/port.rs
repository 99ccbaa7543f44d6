//! # Ports
//!
//! Identity and typing for the slots a node exposes.
//!
//! - [`NodeId`] is an opaque arena index issued by a
//!   [`GraphBuilder`](crate::GraphBuilder), tagged with the builder's [`GraphId`]
//!   so ids from one graph are rejected by another.
//! - [`InputKey`] / [`OutputKey`] are the untyped `(node, index)` pairs the
//!   engine keys its bookkeeping on.
//! - [`InputPort<T>`] / [`OutputPort<T>`] wrap those keys with a value type, so
//!   `connect(input, output)` only compiles when both ends agree on `T`.
//! - [`PortSpec`] is how a node declares a port: name, value type and, for
//!   inputs, whether a connection is required.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// Marker for types that can travel along a connection.
pub trait PortType: Any + Send + Sync {}

impl<T: Any + Send + Sync> PortType for T {}

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one builder and of the graph it builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphId(u64);

impl GraphId {
  pub(crate) fn next() -> Self {
    GraphId(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
  }
}

/// Identity of a node inside one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
  graph: GraphId,
  index: usize,
}

impl NodeId {
  pub(crate) fn new(graph: GraphId, index: usize) -> Self {
    Self { graph, index }
  }

  /// The graph this node belongs to.
  pub fn graph(&self) -> GraphId {
    self.graph
  }

  /// Position of the node in registration order.
  pub fn index(&self) -> usize {
    self.index
  }
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}.{}", self.graph.0, self.index)
  }
}

/// Untyped reference to an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputKey {
  /// Node owning the port.
  pub node: NodeId,
  /// Port index on that node.
  pub index: usize,
}

/// Untyped reference to an output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputKey {
  /// Node owning the port.
  pub node: NodeId,
  /// Port index on that node.
  pub index: usize,
}

/// Typed reference to an input port carrying `T`.
pub struct InputPort<T> {
  key: InputKey,
  _marker: PhantomData<fn() -> T>,
}

/// Typed reference to an output port carrying `T`.
pub struct OutputPort<T> {
  key: OutputKey,
  _marker: PhantomData<fn() -> T>,
}

impl<T> InputPort<T> {
  pub(crate) fn new(node: NodeId, index: usize) -> Self {
    Self {
      key: InputKey { node, index },
      _marker: PhantomData,
    }
  }

  /// The untyped key of this port.
  pub fn key(&self) -> InputKey {
    self.key
  }
}

impl<T> OutputPort<T> {
  pub(crate) fn new(node: NodeId, index: usize) -> Self {
    Self {
      key: OutputKey { node, index },
      _marker: PhantomData,
    }
  }

  /// The untyped key of this port.
  pub fn key(&self) -> OutputKey {
    self.key
  }
}

// Manual impls: deriving would demand `T: Clone` / `T: Debug`.
impl<T> Clone for InputPort<T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for InputPort<T> {}

impl<T> Clone for OutputPort<T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for OutputPort<T> {}

impl<T> fmt::Debug for InputPort<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "InputPort<{}>({}, {})", type_name::<T>(), self.key.node, self.key.index)
  }
}

impl<T> fmt::Debug for OutputPort<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "OutputPort<{}>({}, {})", type_name::<T>(), self.key.node, self.key.index)
  }
}

/// Declaration of one port on a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
  name: String,
  type_id: TypeId,
  type_name: &'static str,
  required: bool,
}

impl PortSpec {
  /// Declares a port named `name` carrying `T`.
  pub fn new<T: PortType>(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      type_id: TypeId::of::<T>(),
      type_name: type_name::<T>(),
      required: false,
    }
  }

  /// Marks an input port as required: building a graph that leaves it
  /// unconnected fails.
  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }

  /// The port name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// The `TypeId` of the carried value.
  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  /// The type name of the carried value, for diagnostics.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  /// Whether the input must be connected.
  pub fn is_required(&self) -> bool {
    self.required
  }
}
