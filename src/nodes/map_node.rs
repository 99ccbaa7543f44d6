//! # Map Node
//!
//! A lazy transform that applies a closure to its single input.
//!
//! ## Ports
//!
//! - **Input 0**: `"in"` - value to transform
//! - **Output 0**: `"out"` - transformed value
//!
//! An absent input leaves the output absent; the closure is not called.

use crate::error::NodeError;
use crate::node::{Node, NodeHandle, Tick};
use crate::nodes::common::BaseNode;
use crate::port::{InputPort, OutputPort, PortSpec, PortType};
use crate::value::{Inputs, Outputs};
use std::marker::PhantomData;

/// A node that maps `I` to `O` with a closure.
pub struct MapNode<I, O, F> {
  base: BaseNode,
  function: F,
  _marker: PhantomData<fn(&I) -> O>,
}

impl<I, O, F> MapNode<I, O, F>
where
  I: PortType,
  O: PortType,
  F: FnMut(&I) -> O + Send,
{
  /// Creates a map node named `"map"`.
  pub fn new(function: F) -> Self {
    Self {
      base: BaseNode::new(
        "map",
        vec![PortSpec::new::<I>("in")],
        vec![PortSpec::new::<O>("out")],
      ),
      function,
      _marker: PhantomData,
    }
  }

  /// Renames the node.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.base.set_name(name);
    self
  }
}

impl<I, O, F> Node for MapNode<I, O, F>
where
  I: PortType,
  O: PortType,
  F: FnMut(&I) -> O + Send,
{
  fn name(&self) -> &str {
    self.base.name()
  }

  fn inputs(&self) -> &[PortSpec] {
    self.base.inputs()
  }

  fn outputs(&self) -> &[PortSpec] {
    self.base.outputs()
  }

  fn compute(&mut self, _tick: &Tick, inputs: &Inputs, outputs: &mut Outputs) -> Result<(), NodeError> {
    if let Some(value) = inputs.get::<I>(0)? {
      outputs.set(0, (self.function)(value))?;
    }
    Ok(())
  }
}

impl<I: PortType, O: PortType, F> NodeHandle<MapNode<I, O, F>> {
  /// The value to transform.
  pub fn input(&self) -> InputPort<I> {
    self.input_at(0)
  }

  /// The transformed value.
  pub fn output(&self) -> OutputPort<O> {
    self.output_at(0)
  }
}
