//! # Combine Node
//!
//! A lazy binary operator: `out = f(a, b)`.
//!
//! ## Ports
//!
//! - **Input 0**: `"a"`
//! - **Input 1**: `"b"`
//! - **Output 0**: `"out"` - present only when both inputs are present

use crate::error::NodeError;
use crate::node::{Node, NodeHandle, Tick};
use crate::nodes::common::BaseNode;
use crate::port::{InputPort, OutputPort, PortSpec, PortType};
use crate::value::{Inputs, Outputs};
use std::marker::PhantomData;

/// A node that combines two inputs with a closure.
pub struct CombineNode<A, B, O, F> {
  base: BaseNode,
  function: F,
  _marker: PhantomData<fn(&A, &B) -> O>,
}

impl<A, B, O, F> CombineNode<A, B, O, F>
where
  A: PortType,
  B: PortType,
  O: PortType,
  F: FnMut(&A, &B) -> O + Send,
{
  /// Creates a combine node named `"combine"`.
  pub fn new(function: F) -> Self {
    Self {
      base: BaseNode::new(
        "combine",
        vec![PortSpec::new::<A>("a"), PortSpec::new::<B>("b")],
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

impl<A, B, O, F> Node for CombineNode<A, B, O, F>
where
  A: PortType,
  B: PortType,
  O: PortType,
  F: FnMut(&A, &B) -> O + Send,
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
    if let (Some(a), Some(b)) = (inputs.get::<A>(0)?, inputs.get::<B>(1)?) {
      outputs.set(0, (self.function)(a, b))?;
    }
    Ok(())
  }
}

impl<A: PortType, B: PortType, O: PortType, F> NodeHandle<CombineNode<A, B, O, F>> {
  /// Left operand.
  pub fn a(&self) -> InputPort<A> {
    self.input_at(0)
  }

  /// Right operand.
  pub fn b(&self) -> InputPort<B> {
    self.input_at(1)
  }

  /// The combined value.
  pub fn output(&self) -> OutputPort<O> {
    self.output_at(0)
  }
}
