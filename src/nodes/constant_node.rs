//! # Constant Node
//!
//! Zero inputs, one output. Outputs the same value every tick it is demanded.
//!
//! ## Ports
//!
//! - **Output 0**: `"out"` - the constant value
//!
//! Lazy and side-effect free: reading it twice in a tick or not at all changes nothing.

use crate::error::NodeError;
use crate::node::{Node, NodeHandle, Tick};
use crate::nodes::common::BaseNode;
use crate::port::{OutputPort, PortSpec, PortType};
use crate::value::{Inputs, Outputs};
use std::sync::Arc;

/// A node whose output never changes.
pub struct ConstantNode<T> {
  base: BaseNode,
  value: Arc<T>,
}

impl<T: PortType> ConstantNode<T> {
  /// Creates a constant node named `"constant"`.
  pub fn new(value: T) -> Self {
    Self {
      base: BaseNode::new("constant", Vec::new(), vec![PortSpec::new::<T>("out")]),
      value: Arc::new(value),
    }
  }

  /// Renames the node.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.base.set_name(name);
    self
  }

  /// The constant value.
  pub fn value(&self) -> &T {
    &self.value
  }
}

impl<T: PortType> Node for ConstantNode<T> {
  fn name(&self) -> &str {
    self.base.name()
  }

  fn inputs(&self) -> &[PortSpec] {
    self.base.inputs()
  }

  fn outputs(&self) -> &[PortSpec] {
    self.base.outputs()
  }

  fn compute(&mut self, _tick: &Tick, _inputs: &Inputs, outputs: &mut Outputs) -> Result<(), NodeError> {
    outputs.set_shared(0, Arc::clone(&self.value))?;
    Ok(())
  }
}

impl<T: PortType> NodeHandle<ConstantNode<T>> {
  /// The constant output.
  pub fn output(&self) -> OutputPort<T> {
    self.output_at(0)
  }
}
