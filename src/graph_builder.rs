//! # GraphBuilder
//!
//! Mutable staging area for a [`Graph`]. The builder owns every node and
//! connection until [`GraphBuilder::build`] consumes it, so nothing can be
//! connected after a graph exists.
//!
//! ## Example
//!
//! ```rust
//! use blockweave::GraphBuilder;
//! use blockweave::nodes::{ConstantNode, MapNode, MonitorNode};
//!
//! let mut builder = GraphBuilder::new("double");
//! let source = builder.add_node(ConstantNode::new(21_i64));
//! let double = builder.add_node(MapNode::new(|x: &i64| x * 2));
//! let (monitor, seen) = MonitorNode::<i64>::new();
//! let monitor = builder.add_node(monitor);
//!
//! builder.connect(double.input(), source.output())?;
//! builder.connect(monitor.input(), double.output())?;
//! let graph = builder.build()?;
//! assert_eq!(graph.len(), 3);
//! # let _ = seen;
//! # Ok::<(), blockweave::ConfigError>(())
//! ```

use crate::error::ConfigError;
use crate::graph::{Graph, NodeEntry, describe};
use crate::node::{Node, NodeHandle};
use crate::port::{GraphId, InputKey, InputPort, NodeId, OutputKey, OutputPort, PortSpec, PortType};
use std::any::{TypeId, type_name};
use std::collections::BTreeMap;
use tracing::trace;

/// Builder for a [`Graph`].
pub struct GraphBuilder {
  id: GraphId,
  name: String,
  nodes: Vec<NodeEntry>,
  connections: BTreeMap<InputKey, OutputKey>,
}

impl GraphBuilder {
  /// Creates an empty builder for a graph called `name`.
  pub fn new(name: impl Into<String>) -> Self {
    let name = name.into();
    let id = GraphId::next();
    trace!("GraphBuilder::new(name={}, id={:?})", name, id);
    Self {
      id,
      name,
      nodes: Vec::new(),
      connections: BTreeMap::new(),
    }
  }

  /// The identity the built graph will carry.
  pub fn id(&self) -> GraphId {
    self.id
  }

  /// The graph name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Number of registered nodes.
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  /// Returns `true` when no node has been registered.
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Registers a node and returns its handle.
  pub fn add_node<N: Node + 'static>(&mut self, node: N) -> NodeHandle<N> {
    NodeHandle::new(self.push(Box::new(node)))
  }

  /// Registers an already boxed node.
  pub fn add_boxed(&mut self, node: Box<dyn Node>) -> NodeHandle<dyn Node> {
    NodeHandle::new(self.push(node))
  }

  fn push(&mut self, node: Box<dyn Node>) -> NodeId {
    let id = NodeId::new(self.id, self.nodes.len());
    let entry = NodeEntry::new(node);
    trace!(
      "GraphBuilder::add_node(graph={}, node={}, id={}, inputs={}, outputs={}, mode={:?})",
      self.name,
      entry.name,
      id,
      entry.inputs.len(),
      entry.outputs.len(),
      entry.mode
    );
    self.nodes.push(entry);
    id
  }

  /// Connects `input` to its source `output`.
  ///
  /// # Errors
  ///
  /// - [`ConfigError::UnknownNode`] if either node was not registered here
  /// - [`ConfigError::PortOutOfRange`] if either index is not declared
  /// - [`ConfigError::PortTypeMismatch`] if `T` differs from a declared type
  /// - [`ConfigError::AlreadyConnected`] if `input` already has a source
  pub fn connect<T: PortType>(
    &mut self,
    input: InputPort<T>,
    output: OutputPort<T>,
  ) -> Result<(), ConfigError> {
    let input = input.key();
    let output = output.key();
    let input_spec = self.spec(input.node, input.index, "input")?;
    check_type::<T>(input_spec, &self.nodes[input.node.index()].name)?;
    let output_spec = self.spec(output.node, output.index, "output")?;
    check_type::<T>(output_spec, &self.nodes[output.node.index()].name)?;

    if let Some(existing) = self.connections.get(&input) {
      return Err(ConfigError::AlreadyConnected {
        input: self.describe_input(input),
        existing: self.describe_output(*existing),
      });
    }
    trace!(
      "GraphBuilder::connect(graph={}, input={}, output={})",
      self.name,
      self.describe_input(input),
      self.describe_output(output)
    );
    self.connections.insert(input, output);
    Ok(())
  }

  /// Checks that `output` names a declared port of type `T` on a node of this builder.
  pub fn check_output<T: PortType>(&self, output: OutputPort<T>) -> Result<(), ConfigError> {
    let key = output.key();
    let spec = self.spec(key.node, key.index, "output")?;
    check_type::<T>(spec, &self.nodes[key.node.index()].name)
  }

  /// Whether `input` already has a source.
  pub fn is_connected(&self, input: InputKey) -> bool {
    self.connections.contains_key(&input)
  }

  /// Freezes the connections and validates every node against the finished graph.
  ///
  /// Required inputs are checked first, then each node's own
  /// [`Node::validate`] hook runs once, in registration order. The first
  /// failure is returned and no graph is produced.
  pub fn build(self) -> Result<Graph, ConfigError> {
    trace!(
      "GraphBuilder::build(graph={}, nodes={}, connections={})",
      self.name,
      self.nodes.len(),
      self.connections.len()
    );
    let graph = Graph::new(self.id, self.name, self.nodes, self.connections);
    for id in graph.nodes() {
      if let Some(entry) = graph.entry(id) {
        for (index, spec) in entry.inputs.iter().enumerate() {
          if spec.is_required() && graph.source_of_key(InputKey { node: id, index }).is_none() {
            return Err(ConfigError::MissingRequiredInput {
              node: entry.name.clone(),
              input: spec.name().to_string(),
            });
          }
        }
        entry.node.validate(id, &graph)?;
      }
    }
    Ok(graph)
  }

  fn spec(&self, node: NodeId, index: usize, direction: &'static str) -> Result<&PortSpec, ConfigError> {
    if node.graph() != self.id || node.index() >= self.nodes.len() {
      return Err(ConfigError::UnknownNode {
        node: node.to_string(),
        graph: self.name.clone(),
      });
    }
    let entry = &self.nodes[node.index()];
    let specs = if direction == "input" {
      &entry.inputs
    } else {
      &entry.outputs
    };
    specs.get(index).ok_or_else(|| ConfigError::PortOutOfRange {
      node: entry.name.clone(),
      direction,
      index,
      count: specs.len(),
    })
  }

  fn describe_input(&self, input: InputKey) -> String {
    let entry = &self.nodes[input.node.index()];
    describe(&entry.name, entry.inputs.get(input.index), input.index)
  }

  fn describe_output(&self, output: OutputKey) -> String {
    let entry = &self.nodes[output.node.index()];
    describe(&entry.name, entry.outputs.get(output.index), output.index)
  }
}

fn check_type<T: PortType>(spec: &PortSpec, node: &str) -> Result<(), ConfigError> {
  if spec.type_id() == TypeId::of::<T>() {
    Ok(())
  } else {
    Err(ConfigError::PortTypeMismatch {
      port: format!("{}.{}", node, spec.name()),
      declared: spec.type_name(),
      requested: type_name::<T>(),
    })
  }
}
