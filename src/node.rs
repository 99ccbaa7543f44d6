//! # Node Authoring
//!
//! Every block in a graph implements [`Node`]. A node declares a fixed list of
//! input and output [`PortSpec`]s, a [`ProcessingMode`], and the hooks the
//! runtime calls on it.
//!
//! ## Processing Mode
//!
//! Two independent axes:
//!
//! - [`Demand::Always`] nodes are computed every tick whether or not anything
//!   reads them (monitors, shutdown sinks). [`Demand::Lazy`] nodes are computed
//!   only when a consumer demands one of their outputs.
//! - [`Order::InputsFirst`] nodes see this tick's resolved inputs in
//!   [`Node::compute`]. [`Order::OutputsFirst`] nodes produce this tick's outputs
//!   from stored state in [`Node::emit`] and only later see this tick's inputs in
//!   [`Node::update`]. This is the only legal way to close a feedback loop.
//!
//! An `OutputsFirst` node may also declare some outputs as deferred with
//! [`Node::is_deferred_output`]. Those are left unset by `emit` and written by
//! [`Node::update_deferred`] once this tick's inputs are known. A consumer of a
//! deferred output waits for that update.
//!
//! ## Hooks
//!
//! | Hook | When |
//! |---|---|
//! | `validate` | once, when the graph is built |
//! | `initialize` | on every `Runtime::start` |
//! | `compute` | `InputsFirst` nodes, at most once per tick |
//! | `emit` | `OutputsFirst` nodes, at most once per tick (plus once when seeding at start) |
//! | `update` | `OutputsFirst` nodes that emitted, after the tick's main pass, or as soon as a deferred output is demanded |
//! | `teardown` | once, on `Runtime::stop` |
//!
//! ## Example
//!
//! ```rust
//! use blockweave::{Inputs, Node, NodeError, Outputs, PortSpec, Tick};
//!
//! /// Doubles its input.
//! struct Double {
//!   inputs: Vec<PortSpec>,
//!   outputs: Vec<PortSpec>,
//! }
//!
//! impl Node for Double {
//!   fn name(&self) -> &str {
//!     "double"
//!   }
//!
//!   fn inputs(&self) -> &[PortSpec] {
//!     &self.inputs
//!   }
//!
//!   fn outputs(&self) -> &[PortSpec] {
//!     &self.outputs
//!   }
//!
//!   fn compute(&mut self, _tick: &Tick, inputs: &Inputs, outputs: &mut Outputs) -> Result<(), NodeError> {
//!     if let Some(x) = inputs.get::<f64>(0)? {
//!       outputs.set(0, x * 2.0)?;
//!     }
//!     Ok(())
//!   }
//! }
//! ```

use crate::error::{ConfigError, NodeError};
use crate::graph::Graph;
use crate::port::{InputPort, NodeId, OutputPort, PortSpec, PortType};
use crate::value::{Inputs, Outputs};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

/// Demand axis of a [`ProcessingMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Demand {
  /// Computed every tick, whether or not any consumer reads it.
  Always,
  /// Computed only when some consumer demands one of its outputs.
  Lazy,
}

/// Order axis of a [`ProcessingMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
  /// All connected inputs are resolved before the node computes.
  InputsFirst,
  /// Outputs come from stored state; inputs are consumed afterwards.
  OutputsFirst,
}

/// When and how the runtime resolves a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessingMode {
  /// Demand axis.
  pub demand: Demand,
  /// Order axis.
  pub order: Order,
}

impl ProcessingMode {
  /// Computed on demand, inputs first. The default.
  pub const LAZY: Self = Self::new(Demand::Lazy, Order::InputsFirst);
  /// Computed every tick, inputs first.
  pub const ALWAYS: Self = Self::new(Demand::Always, Order::InputsFirst);
  /// Emits on demand from stored state.
  pub const LAZY_OUTPUTS_FIRST: Self = Self::new(Demand::Lazy, Order::OutputsFirst);
  /// Emits every tick from stored state.
  pub const ALWAYS_OUTPUTS_FIRST: Self = Self::new(Demand::Always, Order::OutputsFirst);

  /// Combines the two axes.
  pub const fn new(demand: Demand, order: Order) -> Self {
    Self { demand, order }
  }

  /// Whether the node is visited by every tick's top-level pass.
  pub fn is_always(&self) -> bool {
    self.demand == Demand::Always
  }

  /// Whether the node emits before consuming its inputs.
  pub fn is_outputs_first(&self) -> bool {
    self.order == Order::OutputsFirst
  }
}

impl Default for ProcessingMode {
  fn default() -> Self {
    Self::LAZY
  }
}

/// Timing information for the tick being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick {
  /// Zero-based tick index since the last `start`.
  pub index: u64,
  /// Time elapsed since the previous tick, as reported by the loop driver.
  pub elapsed: Duration,
  /// Sum of all `elapsed` values since the last `start`, including this one.
  pub since_start: Duration,
}

impl Tick {
  /// `elapsed` in seconds.
  pub fn dt(&self) -> f64 {
    self.elapsed.as_secs_f64()
  }
}

/// A unit of computation in a graph.
///
/// Implementors keep their persistent state in `self`. The runtime never reads
/// it; it only hands the node back to its own hooks.
pub trait Node: Send {
  /// Name used in diagnostics.
  fn name(&self) -> &str;

  /// Declared input ports, in index order. Must not change after the node is added.
  fn inputs(&self) -> &[PortSpec];

  /// Declared output ports, in index order. Must not change after the node is added.
  fn outputs(&self) -> &[PortSpec];

  /// Processing mode. Read once when the node is added to a builder.
  fn mode(&self) -> ProcessingMode {
    ProcessingMode::LAZY
  }

  /// Resets persistent state. Called on every `Runtime::start`.
  fn initialize(&mut self) -> Result<(), NodeError> {
    Ok(())
  }

  /// Produces this tick's outputs from this tick's inputs (`InputsFirst` nodes).
  fn compute(&mut self, _tick: &Tick, _inputs: &Inputs, _outputs: &mut Outputs) -> Result<(), NodeError> {
    Ok(())
  }

  /// Produces this tick's outputs from state stored by earlier ticks
  /// (`OutputsFirst` nodes). Must not change state that a second call would observe.
  fn emit(&mut self, _tick: &Tick, _outputs: &mut Outputs) -> Result<(), NodeError> {
    Ok(())
  }

  /// Consumes this tick's inputs to prepare the next tick's outputs
  /// (`OutputsFirst` nodes).
  fn update(&mut self, _tick: &Tick, _inputs: &Inputs) -> Result<(), NodeError> {
    Ok(())
  }

  /// Whether output `index` is written by [`Node::update_deferred`] rather
  /// than by `emit`. Only consulted for `OutputsFirst` nodes, once, when the
  /// node is added.
  fn is_deferred_output(&self, _index: usize) -> bool {
    false
  }

  /// The hook the runtime actually calls after `emit`. Writes this tick's
  /// deferred outputs; other outputs written here are ignored.
  fn update_deferred(&mut self, tick: &Tick, inputs: &Inputs, _outputs: &mut Outputs) -> Result<(), NodeError> {
    self.update(tick, inputs)
  }

  /// Checks the node's wiring in the finished graph. Called exactly once, by
  /// `GraphBuilder::build`, after required inputs have been checked.
  fn validate(&self, _id: NodeId, _graph: &Graph) -> Result<(), ConfigError> {
    Ok(())
  }

  /// Releases resources. Called once, by `Runtime::stop`.
  fn teardown(&mut self) -> Result<(), NodeError> {
    Ok(())
  }

  /// Whether output 0 of this node is a shutdown request the runtime should read.
  fn signals_shutdown(&self) -> bool {
    false
  }
}

/// Returned by [`GraphBuilder::add_node`](crate::GraphBuilder::add_node); names
/// a registered node and hands out references to its ports.
pub struct NodeHandle<N: ?Sized> {
  id: NodeId,
  _marker: PhantomData<fn() -> Box<N>>,
}

impl<N: ?Sized> NodeHandle<N> {
  pub(crate) fn new(id: NodeId) -> Self {
    Self {
      id,
      _marker: PhantomData,
    }
  }

  /// The node's identity.
  pub fn id(&self) -> NodeId {
    self.id
  }

  /// Typed reference to input `index`. The type is checked against the node's
  /// declaration when the port is connected.
  pub fn input_at<T: PortType>(&self, index: usize) -> InputPort<T> {
    InputPort::new(self.id, index)
  }

  /// Typed reference to output `index`. The type is checked against the node's
  /// declaration when the port is connected.
  pub fn output_at<T: PortType>(&self, index: usize) -> OutputPort<T> {
    OutputPort::new(self.id, index)
  }

  /// Forgets the concrete node type.
  pub fn erase(&self) -> NodeHandle<dyn Node> {
    NodeHandle::new(self.id)
  }
}

impl<N: ?Sized> Clone for NodeHandle<N> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<N: ?Sized> Copy for NodeHandle<N> {}

impl<N: ?Sized> fmt::Debug for NodeHandle<N> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("NodeHandle").field(&self.id).finish()
  }
}
