//! # External Input Node
//!
//! Zero inputs, one output. Outputs whatever value the outside world last
//! stored through its [`InputHandle`], e.g. a sensor reading written by a
//! hardware bridge between ticks.
//!
//! ## Ports
//!
//! - **Output 0**: `"out"` - the current external value, absent while none is set
//!
//! The engine only reads the value. Writing it while a tick is in progress is
//! the caller's race to avoid.

use crate::error::NodeError;
use crate::node::{Node, NodeHandle, Tick};
use crate::nodes::common::{BaseNode, lock_handle, lock_shared};
use crate::port::{OutputPort, PortSpec, PortType};
use crate::value::{Inputs, Outputs};
use std::sync::{Arc, Mutex};

type Shared<T> = Arc<Mutex<Option<Arc<T>>>>;

/// Writer side of an [`ExternalInputNode`].
pub struct InputHandle<T> {
  value: Shared<T>,
}

impl<T> Clone for InputHandle<T> {
  fn clone(&self) -> Self {
    Self {
      value: Arc::clone(&self.value),
    }
  }
}

impl<T: PortType> InputHandle<T> {
  /// Replaces the external value.
  pub fn set(&self, value: T) {
    *lock_handle(&self.value) = Some(Arc::new(value));
  }

  /// Removes the external value; the node's output becomes absent.
  pub fn clear(&self) {
    *lock_handle(&self.value) = None;
  }

  /// The current external value.
  pub fn get(&self) -> Option<Arc<T>> {
    lock_handle(&self.value).clone()
  }
}

/// A node reading a value owned by the outside world.
pub struct ExternalInputNode<T> {
  base: BaseNode,
  value: Shared<T>,
}

impl<T: PortType> ExternalInputNode<T> {
  /// Creates the node holding `initial`, and its handle.
  pub fn new(initial: T) -> (Self, InputHandle<T>) {
    Self::with_value(Some(Arc::new(initial)))
  }

  /// Creates the node without a value, and its handle.
  pub fn empty() -> (Self, InputHandle<T>) {
    Self::with_value(None)
  }

  fn with_value(value: Option<Arc<T>>) -> (Self, InputHandle<T>) {
    let value = Arc::new(Mutex::new(value));
    let node = Self {
      base: BaseNode::new("external_input", Vec::new(), vec![PortSpec::new::<T>("out")]),
      value: Arc::clone(&value),
    };
    (node, InputHandle { value })
  }

  /// Renames the node.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.base.set_name(name);
    self
  }
}

impl<T: PortType> Node for ExternalInputNode<T> {
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
    if let Some(value) = lock_shared(self.base.name(), &self.value)?.as_ref() {
      outputs.set_shared(0, Arc::clone(value))?;
    }
    Ok(())
  }
}

impl<T: PortType> NodeHandle<ExternalInputNode<T>> {
  /// The external value output.
  pub fn output(&self) -> OutputPort<T> {
    self.output_at(0)
  }
}
