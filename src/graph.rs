//! # Graph
//!
//! The immutable, validated result of [`GraphBuilder::build`](crate::GraphBuilder::build):
//! an arena of nodes plus a map from every connected input to its single
//! source output.
//!
//! A `Graph` offers no mutation. It is the only view a node receives in its
//! `validate` hook, and the structure a [`Runtime`](crate::Runtime) resolves
//! against.
//!
//! ## Invariants
//!
//! - Every connection's endpoints are nodes of this graph.
//! - An input has at most one source; an output may feed any number of inputs.
//! - Connections never change once the graph exists.

use crate::node::{Node, ProcessingMode};
use crate::port::{GraphId, InputKey, InputPort, NodeId, OutputKey, OutputPort, PortSpec};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A registered node with the declarations captured when it was added.
pub(crate) struct NodeEntry {
  pub(crate) node: Box<dyn Node>,
  pub(crate) name: String,
  pub(crate) mode: ProcessingMode,
  pub(crate) inputs: Arc<[PortSpec]>,
  pub(crate) outputs: Arc<[PortSpec]>,
  pub(crate) deferred: Vec<bool>,
}

impl NodeEntry {
  pub(crate) fn new(node: Box<dyn Node>) -> Self {
    let mode = node.mode();
    let deferred = (0..node.outputs().len())
      .map(|index| mode.is_outputs_first() && node.is_deferred_output(index))
      .collect();
    Self {
      name: node.name().to_string(),
      mode,
      inputs: node.inputs().iter().cloned().collect(),
      outputs: node.outputs().iter().cloned().collect(),
      deferred,
      node,
    }
  }
}

/// An immutable graph of nodes and connections.
pub struct Graph {
  id: GraphId,
  name: String,
  pub(crate) nodes: Vec<NodeEntry>,
  connections: BTreeMap<InputKey, OutputKey>,
}

impl Graph {
  pub(crate) fn new(
    id: GraphId,
    name: String,
    nodes: Vec<NodeEntry>,
    connections: BTreeMap<InputKey, OutputKey>,
  ) -> Self {
    Self {
      id,
      name,
      nodes,
      connections,
    }
  }

  /// The graph's identity.
  pub fn id(&self) -> GraphId {
    self.id
  }

  /// The graph's name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Number of nodes.
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  /// Returns `true` for a graph without nodes.
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Ids of all nodes, in registration order.
  pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
    (0..self.nodes.len()).map(move |index| NodeId::new(self.id, index))
  }

  /// Whether `id` names a node of this graph.
  pub fn contains(&self, id: NodeId) -> bool {
    id.graph() == self.id && id.index() < self.nodes.len()
  }

  /// The node named by `id`.
  pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
    self.entry(id).map(|entry| entry.node.as_ref())
  }

  /// The name of the node named by `id`.
  pub fn node_name(&self, id: NodeId) -> Option<&str> {
    self.entry(id).map(|entry| entry.name.as_str())
  }

  /// The processing mode captured when the node was added.
  pub fn mode(&self, id: NodeId) -> Option<ProcessingMode> {
    self.entry(id).map(|entry| entry.mode)
  }

  /// Whether `output` is only written once its node has seen this tick's inputs.
  pub fn is_deferred_output(&self, output: OutputKey) -> bool {
    self
      .entry(output.node)
      .and_then(|entry| entry.deferred.get(output.index).copied())
      .unwrap_or(false)
  }

  /// Declared input ports of a node.
  pub fn input_specs(&self, id: NodeId) -> Option<&[PortSpec]> {
    self.entry(id).map(|entry| &entry.inputs[..])
  }

  /// Declared output ports of a node.
  pub fn output_specs(&self, id: NodeId) -> Option<&[PortSpec]> {
    self.entry(id).map(|entry| &entry.outputs[..])
  }

  /// The output feeding `input`, if it is connected.
  pub fn source_of<T>(&self, input: InputPort<T>) -> Option<OutputPort<T>> {
    self
      .source_of_key(input.key())
      .map(|output| OutputPort::new(output.node, output.index))
  }

  /// Untyped form of [`Graph::source_of`].
  pub fn source_of_key(&self, input: InputKey) -> Option<OutputKey> {
    self.connections.get(&input).copied()
  }

  /// Every input fed by `output`, in key order.
  pub fn consumers_of(&self, output: OutputKey) -> Vec<InputKey> {
    self
      .connections
      .iter()
      .filter(|(_, source)| **source == output)
      .map(|(input, _)| *input)
      .collect()
  }

  /// All connections as `(input, source output)` pairs, in key order.
  pub fn connections(&self) -> impl Iterator<Item = (InputKey, OutputKey)> + '_ {
    self.connections.iter().map(|(input, output)| (*input, *output))
  }

  /// `node.port` rendering of an input, for diagnostics.
  pub fn describe_input(&self, input: InputKey) -> String {
    match self.entry(input.node) {
      Some(entry) => describe(&entry.name, entry.inputs.get(input.index), input.index),
      None => format!("{}.in{}", input.node, input.index),
    }
  }

  /// `node.port` rendering of an output, for diagnostics.
  pub fn describe_output(&self, output: OutputKey) -> String {
    match self.entry(output.node) {
      Some(entry) => describe(&entry.name, entry.outputs.get(output.index), output.index),
      None => format!("{}.out{}", output.node, output.index),
    }
  }

  pub(crate) fn entry(&self, id: NodeId) -> Option<&NodeEntry> {
    if id.graph() != self.id {
      return None;
    }
    self.nodes.get(id.index())
  }
}

pub(crate) fn describe(node: &str, spec: Option<&PortSpec>, index: usize) -> String {
  match spec {
    Some(spec) => format!("{}.{}", node, spec.name()),
    None => format!("{}.#{}", node, index),
  }
}

impl std::fmt::Debug for Graph {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Graph")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("nodes", &self.nodes.iter().map(|e| e.name.as_str()).collect::<Vec<_>>())
      .field("connections", &self.connections.len())
      .finish()
  }
}
