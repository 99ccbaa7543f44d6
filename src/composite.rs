//! # Composite Nodes
//!
//! A [`Composite`] wraps a whole graph and behaves as one node in an outer
//! graph, so a wired-up sub-chain can be reused like a primitive block.
//!
//! The boundary is declared on a [`CompositeBuilder`]:
//!
//! - [`CompositeBuilder::input`] registers a placeholder node inside the inner
//!   graph. Each tick it outputs whatever the outer graph resolved for the
//!   composite's matching input.
//! - [`CompositeBuilder::output`] exposes an inner output as one of the
//!   composite's outputs.
//!
//! Every outer tick runs the matching tick of the inner [`Runtime`]: the
//! placeholders are filled, the inner graph is resolved with the exposed
//! outputs demanded, and the exposed values become the composite's outputs.
//! The inner nodes see the outer [`Tick`] unchanged. `initialize` restarts the
//! inner runtime, so the composite's persistent state is exactly the state of
//! its inner nodes.
//!
//! ## Order
//!
//! An exposed output whose inner resolution never reaches a placeholder (it
//! comes from an inner `OutputsFirst` node, or only from such outputs) does not
//! need this tick's composite inputs. When a composite with inputs has at
//! least one such output it is `OutputsFirst`:
//!
//! - `emit` begins the inner tick and resolves only the input-free outputs;
//! - `update` fills the placeholders, finishes the inner tick (including the
//!   inner deferred updates) and writes the remaining outputs as deferred
//!   outputs.
//!
//! A feedback loop may then pass through the composite exactly where it passes
//! through the inner `OutputsFirst` node. Otherwise the composite is
//! `InputsFirst` and runs the whole inner tick in `compute`.
//! [`CompositeBuilder::order`] overrides the choice.
//!
//! Inner failures (including inner cycles) surface as the composite's own node
//! error; [`RuntimeError::innermost`](crate::RuntimeError::innermost) digs the
//! original out.
//!
//! ## Example
//!
//! ```rust
//! use blockweave::{CompositeBuilder, GraphBuilder, Runtime};
//! use blockweave::nodes::{ConstantNode, MapNode, MonitorNode};
//! use std::time::Duration;
//!
//! // inner graph: x -> x + 1 -> * 10
//! let mut inner = CompositeBuilder::new("affine");
//! let x = inner.input::<i32>("x");
//! let add = inner.graph().add_node(MapNode::new(|v: &i32| v + 1));
//! let mul = inner.graph().add_node(MapNode::new(|v: &i32| v * 10));
//! inner.graph().connect(add.input(), x)?;
//! inner.graph().connect(mul.input(), add.output())?;
//! inner.output("y", mul.output())?;
//! let affine = inner.build()?;
//!
//! let mut outer = GraphBuilder::new("outer");
//! let source = outer.add_node(ConstantNode::new(4_i32));
//! let affine = outer.add_node(affine);
//! let (monitor, seen) = MonitorNode::<i32>::new();
//! let monitor = outer.add_node(monitor);
//! outer.connect(affine.input_at::<i32>(0), source.output())?;
//! outer.connect(monitor.input(), affine.output_at::<i32>(0))?;
//!
//! let mut runtime = Runtime::new(outer.build()?);
//! runtime.start()?;
//! runtime.tick(Duration::from_millis(10))?;
//! assert_eq!(seen.latest().as_deref(), Some(&50));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::config::RuntimeConfig;
use crate::error::{ConfigError, NodeError};
use crate::graph_builder::GraphBuilder;
use crate::graph::Graph;
use crate::node::{Demand, Node, Order, ProcessingMode, Tick};
use crate::port::{InputKey, NodeId, OutputKey, OutputPort, PortSpec, PortType};
use crate::runtime::{Runtime, RuntimeState};
use crate::value::{Inputs, Outputs, PortValue};
use std::sync::{Arc, Mutex};
use tracing::trace;

type BoundarySlot = Arc<Mutex<Option<PortValue>>>;

fn lock_slot(slot: &BoundarySlot) -> Result<std::sync::MutexGuard<'_, Option<PortValue>>, NodeError> {
  slot.lock().map_err(|_| "composite boundary slot poisoned".into())
}

/// Placeholder standing in for one composite input inside the inner graph.
struct BoundaryInput {
  name: String,
  outputs: Vec<PortSpec>,
  slot: BoundarySlot,
}

impl Node for BoundaryInput {
  fn name(&self) -> &str {
    &self.name
  }

  fn inputs(&self) -> &[PortSpec] {
    &[]
  }

  fn outputs(&self) -> &[PortSpec] {
    &self.outputs
  }

  fn compute(&mut self, _tick: &Tick, _inputs: &Inputs, outputs: &mut Outputs) -> Result<(), NodeError> {
    if let Some(value) = lock_slot(&self.slot)?.as_ref() {
      outputs.forward(0, Arc::clone(value))?;
    }
    Ok(())
  }
}

/// Builder for a [`Composite`].
pub struct CompositeBuilder {
  name: String,
  builder: GraphBuilder,
  inputs: Vec<PortSpec>,
  slots: Vec<BoundarySlot>,
  outputs: Vec<PortSpec>,
  exposed: Vec<OutputKey>,
  placeholders: Vec<NodeId>,
  demand: Option<Demand>,
  order: Option<Order>,
  config: RuntimeConfig,
}

impl CompositeBuilder {
  /// Creates a builder for a composite called `name`.
  pub fn new(name: impl Into<String>) -> Self {
    let name = name.into();
    trace!("CompositeBuilder::new(name={})", name);
    Self {
      builder: GraphBuilder::new(name.clone()),
      name,
      inputs: Vec::new(),
      slots: Vec::new(),
      outputs: Vec::new(),
      exposed: Vec::new(),
      placeholders: Vec::new(),
      demand: None,
      order: None,
      config: RuntimeConfig::default(),
    }
  }

  /// The inner graph under construction.
  pub fn graph(&mut self) -> &mut GraphBuilder {
    &mut self.builder
  }

  /// Declares the next composite input and returns the inner output that
  /// carries its value each tick.
  pub fn input<T: PortType>(&mut self, name: impl Into<String>) -> OutputPort<T> {
    self.add_input(PortSpec::new::<T>(name))
  }

  /// Like [`CompositeBuilder::input`], but the outer graph must connect it.
  pub fn required_input<T: PortType>(&mut self, name: impl Into<String>) -> OutputPort<T> {
    self.add_input(PortSpec::new::<T>(name).required())
  }

  fn add_input<T: PortType>(&mut self, spec: PortSpec) -> OutputPort<T> {
    let slot: BoundarySlot = Arc::new(Mutex::new(None));
    let placeholder = BoundaryInput {
      name: format!("{}.{}", self.name, spec.name()),
      outputs: vec![PortSpec::new::<T>("out")],
      slot: Arc::clone(&slot),
    };
    trace!(
      "CompositeBuilder::input(composite={}, index={}, name={})",
      self.name,
      self.inputs.len(),
      spec.name()
    );
    self.inputs.push(spec);
    self.slots.push(slot);
    let placeholder = self.builder.add_node(placeholder);
    self.placeholders.push(placeholder.id());
    placeholder.output_at::<T>(0)
  }

  /// Exposes the inner `source` as the next composite output, named `name`.
  pub fn output<T: PortType>(&mut self, name: impl Into<String>, source: OutputPort<T>) -> Result<(), ConfigError> {
    self.builder.check_output(source)?;
    let spec = PortSpec::new::<T>(name);
    trace!(
      "CompositeBuilder::output(composite={}, index={}, name={})",
      self.name,
      self.outputs.len(),
      spec.name()
    );
    self.outputs.push(spec);
    self.exposed.push(source.key());
    Ok(())
  }

  /// Overrides the composite's demand axis. By default it is `Always` when
  /// any inner node is `Always`, else `Lazy`.
  pub fn demand(mut self, demand: Demand) -> Self {
    self.demand = Some(demand);
    self
  }

  /// Overrides the composite's order axis. `OutputsFirst` defers every exposed
  /// output that needs this tick's inputs to `update`.
  pub fn order(mut self, order: Order) -> Self {
    self.order = Some(order);
    self
  }

  /// Configuration for the inner runtime.
  pub fn config(mut self, config: RuntimeConfig) -> Self {
    self.config = config;
    self
  }

  /// Builds and validates the inner graph.
  pub fn build(self) -> Result<Composite, ConfigError> {
    let graph = self.builder.build()?;
    let demand = self.demand.unwrap_or_else(|| {
      let any_always = graph
        .nodes()
        .any(|id| graph.mode(id).is_some_and(|mode| mode.is_always()));
      if any_always { Demand::Always } else { Demand::Lazy }
    });
    let needs_inputs: Vec<bool> = self
      .exposed
      .iter()
      .map(|output| reaches_boundary(&graph, *output, &self.placeholders))
      .collect();
    let order = self.order.unwrap_or_else(|| {
      if !self.inputs.is_empty() && needs_inputs.iter().any(|needs| !needs) {
        Order::OutputsFirst
      } else {
        Order::InputsFirst
      }
    });
    let deferred = match order {
      Order::OutputsFirst => needs_inputs,
      Order::InputsFirst => vec![false; self.exposed.len()],
    };
    trace!(
      "CompositeBuilder::build(composite={}, order={:?}, deferred={:?})",
      self.name,
      order,
      deferred
    );
    let config = if self.config.name.is_empty() {
      self.config.with_name(self.name.clone())
    } else {
      self.config
    };
    Ok(Composite {
      name: self.name,
      inputs: self.inputs,
      outputs: self.outputs,
      slots: self.slots,
      exposed: self.exposed,
      deferred,
      mode: ProcessingMode::new(demand, order),
      seeding: false,
      runtime: Runtime::with_config(graph, config),
    })
  }
}

/// Whether resolving `output` inside `graph` resolves one of `placeholders`.
fn reaches_boundary(graph: &Graph, output: OutputKey, placeholders: &[NodeId]) -> bool {
  let mut visited = vec![false; graph.len()];
  reaches(graph, output, placeholders, &mut visited)
}

fn reaches(graph: &Graph, output: OutputKey, placeholders: &[NodeId], visited: &mut [bool]) -> bool {
  let node = output.node;
  if placeholders.contains(&node) {
    return true;
  }
  let Some(mode) = graph.mode(node) else {
    return false;
  };
  if mode.is_outputs_first() && !graph.is_deferred_output(output) {
    return false;
  }
  // a revisit is either explored already or a cycle the runtime reports
  if std::mem::replace(&mut visited[node.index()], true) {
    return false;
  }
  let inputs = graph.input_specs(node).map_or(0, <[PortSpec]>::len);
  (0..inputs).any(|index| {
    graph
      .source_of_key(InputKey { node, index })
      .is_some_and(|source| reaches(graph, source, placeholders, visited))
  })
}

/// A node implemented by running an inner graph.
pub struct Composite {
  name: String,
  inputs: Vec<PortSpec>,
  outputs: Vec<PortSpec>,
  slots: Vec<BoundarySlot>,
  exposed: Vec<OutputKey>,
  deferred: Vec<bool>,
  mode: ProcessingMode,
  /// Set by `initialize`; the next `emit` is the outer runtime seeding.
  seeding: bool,
  runtime: Runtime,
}

impl Composite {
  /// The inner runtime, for inspection.
  pub fn runtime(&self) -> &Runtime {
    &self.runtime
  }

  /// Whether exposed output `index` is written by `update` rather than `emit`.
  pub fn is_deferred(&self, index: usize) -> bool {
    self.deferred.get(index).copied().unwrap_or(false)
  }

  fn clear_slots(&self) -> Result<(), NodeError> {
    for slot in &self.slots {
      *lock_slot(slot)? = None;
    }
    Ok(())
  }

  fn fill_slots(&self, inputs: &Inputs) -> Result<(), NodeError> {
    for (index, slot) in self.slots.iter().enumerate() {
      *lock_slot(slot)? = inputs.value(index).cloned();
    }
    Ok(())
  }

  /// Exposed outputs whose deferral is `deferred`.
  fn exposed_where(&self, deferred: bool) -> Vec<OutputKey> {
    self
      .exposed
      .iter()
      .zip(&self.deferred)
      .filter(|(_, is_deferred)| **is_deferred == deferred)
      .map(|(key, _)| *key)
      .collect()
  }

  fn write_exposed(&self, deferred: bool, outputs: &mut Outputs) -> Result<(), NodeError> {
    for (index, key) in self.exposed.iter().enumerate() {
      if self.deferred[index] != deferred {
        continue;
      }
      if let Some(value) = self.runtime.value_key(*key) {
        outputs.forward(index, Arc::clone(value))?;
      }
    }
    Ok(())
  }
}

impl Node for Composite {
  fn name(&self) -> &str {
    &self.name
  }

  fn inputs(&self) -> &[PortSpec] {
    &self.inputs
  }

  fn outputs(&self) -> &[PortSpec] {
    &self.outputs
  }

  fn mode(&self) -> ProcessingMode {
    self.mode
  }

  fn is_deferred_output(&self, index: usize) -> bool {
    self.is_deferred(index)
  }

  fn initialize(&mut self) -> Result<(), NodeError> {
    self.clear_slots()?;
    self.runtime.start()?;
    self.seeding = self.mode.is_outputs_first();
    Ok(())
  }

  fn compute(&mut self, tick: &Tick, inputs: &Inputs, outputs: &mut Outputs) -> Result<(), NodeError> {
    self.fill_slots(inputs)?;
    let result = self.runtime.run_tick(*tick, &self.exposed);
    self.clear_slots()?;
    result?;
    self.write_exposed(false, outputs)
  }

  fn emit(&mut self, tick: &Tick, outputs: &mut Outputs) -> Result<(), NodeError> {
    // the inner start already seeded the inner OutputsFirst nodes
    if std::mem::take(&mut self.seeding) {
      return self.write_exposed(false, outputs);
    }
    self.clear_slots()?;
    self.runtime.begin_tick(*tick)?;
    let emitted = self.exposed_where(false);
    self.runtime.resolve_outputs(&emitted)?;
    self.write_exposed(false, outputs)
  }

  fn update_deferred(&mut self, _tick: &Tick, inputs: &Inputs, outputs: &mut Outputs) -> Result<(), NodeError> {
    self.fill_slots(inputs)?;
    let settled = self.exposed_where(true);
    let result = self.runtime.finish_tick(&settled);
    self.clear_slots()?;
    result?;
    self.write_exposed(true, outputs)
  }

  fn teardown(&mut self) -> Result<(), NodeError> {
    if self.runtime.state() != RuntimeState::Stopped {
      self.runtime.stop()?;
    }
    Ok(())
  }
}
