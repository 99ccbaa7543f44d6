//! # Delay Node
//!
//! One input, one output, `OutputsFirst`. Emits the value its input had on the
//! previous tick; on the first tick after `start` it emits the configured
//! initial value.
//!
//! ## Ports
//!
//! - **Input 0**: `"in"` - value to hold for the next tick
//! - **Output 0**: `"out"` - value held from the previous tick
//!
//! A delay is the canonical way to close a feedback loop: its output is known
//! before anything upstream of its input has been resolved.
//!
//! An absent input is held as an absent output. A lazy delay that is not
//! demanded in a tick does not sample its input in that tick; use
//! [`DelayNode::always`] for a delay that samples every tick.

use crate::error::NodeError;
use crate::node::{Demand, Node, NodeHandle, Order, ProcessingMode, Tick};
use crate::nodes::common::BaseNode;
use crate::port::{InputPort, OutputPort, PortSpec, PortType};
use crate::value::{Inputs, Outputs, PortValue};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// A one-tick delay.
pub struct DelayNode<T> {
  base: BaseNode,
  demand: Demand,
  initial: Option<PortValue>,
  held: Option<PortValue>,
  _marker: PhantomData<fn() -> T>,
}

impl<T: PortType> DelayNode<T> {
  /// Creates a delay whose first output is `initial`.
  pub fn new(initial: T) -> Self {
    Self::with_initial(Some(Arc::new(initial)))
  }

  /// Creates a delay whose first output is absent.
  pub fn empty() -> Self {
    Self::with_initial(None)
  }

  fn with_initial(initial: Option<PortValue>) -> Self {
    Self {
      base: BaseNode::new(
        "delay",
        vec![PortSpec::new::<T>("in")],
        vec![PortSpec::new::<T>("out")],
      ),
      demand: Demand::Lazy,
      held: initial.clone(),
      initial,
      _marker: PhantomData,
    }
  }

  /// Renames the node.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.base.set_name(name);
    self
  }

  /// Makes the delay sample its input every tick, demanded or not.
  pub fn always(mut self) -> Self {
    self.demand = Demand::Always;
    self
  }
}

impl<T: PortType> Node for DelayNode<T> {
  fn name(&self) -> &str {
    self.base.name()
  }

  fn inputs(&self) -> &[PortSpec] {
    self.base.inputs()
  }

  fn outputs(&self) -> &[PortSpec] {
    self.base.outputs()
  }

  fn mode(&self) -> ProcessingMode {
    ProcessingMode::new(self.demand, Order::OutputsFirst)
  }

  fn initialize(&mut self) -> Result<(), NodeError> {
    self.held = self.initial.clone();
    Ok(())
  }

  fn emit(&mut self, _tick: &Tick, outputs: &mut Outputs) -> Result<(), NodeError> {
    if let Some(value) = &self.held {
      outputs.forward(0, Arc::clone(value))?;
    }
    Ok(())
  }

  fn update(&mut self, tick: &Tick, inputs: &Inputs) -> Result<(), NodeError> {
    trace!(
      "DelayNode::update(name={}, tick={}, present={})",
      self.base.name(),
      tick.index,
      inputs.is_present(0)
    );
    self.held = inputs.value(0).cloned();
    Ok(())
  }
}

impl<T: PortType> NodeHandle<DelayNode<T>> {
  /// The value to hold.
  pub fn input(&self) -> InputPort<T> {
    self.input_at(0)
  }

  /// The value held from the previous tick.
  pub fn output(&self) -> OutputPort<T> {
    self.output_at(0)
  }
}
