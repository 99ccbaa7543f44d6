//! # Recorder Node
//!
//! One input, no outputs, `Always`. Appends one entry per tick to a history a
//! [`RecorderHandle`] can read: `Some(value)` when the input was present,
//! `None` when it was absent, so entry `n` always belongs to tick `n`.
//!
//! ## Ports
//!
//! - **Input 0**: `"in"` - value to record
//!
//! With a capacity set, only the most recent `capacity` entries are kept.

use crate::error::NodeError;
use crate::node::{Node, NodeHandle, ProcessingMode, Tick};
use crate::nodes::common::{BaseNode, lock_handle, lock_shared};
use crate::port::{InputPort, PortSpec, PortType};
use crate::value::{Inputs, Outputs};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type History<T> = Arc<Mutex<VecDeque<Option<Arc<T>>>>>;

/// Reader side of a [`RecorderNode`].
pub struct RecorderHandle<T> {
  history: History<T>,
}

impl<T> Clone for RecorderHandle<T> {
  fn clone(&self) -> Self {
    Self {
      history: Arc::clone(&self.history),
    }
  }
}

impl<T: PortType> RecorderHandle<T> {
  /// Every retained entry, oldest first.
  pub fn history(&self) -> Vec<Option<Arc<T>>> {
    lock_handle(&self.history).iter().cloned().collect()
  }

  /// The present values only, oldest first.
  pub fn values(&self) -> Vec<Arc<T>> {
    lock_handle(&self.history).iter().flatten().cloned().collect()
  }

  /// Number of retained entries.
  pub fn len(&self) -> usize {
    lock_handle(&self.history).len()
  }

  /// Returns `true` when nothing has been recorded.
  pub fn is_empty(&self) -> bool {
    lock_handle(&self.history).is_empty()
  }
}

impl<T: PortType + Clone> RecorderHandle<T> {
  /// Copies of the present values, oldest first.
  pub fn cloned_values(&self) -> Vec<T> {
    lock_handle(&self.history)
      .iter()
      .flatten()
      .map(|value| T::clone(value))
      .collect()
  }
}

/// A sink that records the history of its input.
pub struct RecorderNode<T> {
  base: BaseNode,
  capacity: Option<usize>,
  history: History<T>,
}

impl<T: PortType> RecorderNode<T> {
  /// Creates an unbounded recorder and its handle.
  pub fn new() -> (Self, RecorderHandle<T>) {
    let history = Arc::new(Mutex::new(VecDeque::new()));
    let node = Self {
      base: BaseNode::new("recorder", vec![PortSpec::new::<T>("in")], Vec::new()),
      capacity: None,
      history: Arc::clone(&history),
    };
    (node, RecorderHandle { history })
  }

  /// Keeps only the most recent `capacity` entries.
  pub fn with_capacity(mut self, capacity: usize) -> Self {
    self.capacity = Some(capacity);
    self
  }

  /// Renames the node.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.base.set_name(name);
    self
  }
}

impl<T: PortType> Node for RecorderNode<T> {
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
    ProcessingMode::ALWAYS
  }

  fn initialize(&mut self) -> Result<(), NodeError> {
    lock_shared(self.base.name(), &self.history)?.clear();
    Ok(())
  }

  fn compute(&mut self, _tick: &Tick, inputs: &Inputs, _outputs: &mut Outputs) -> Result<(), NodeError> {
    let value = inputs.shared::<T>(0)?;
    let mut history = lock_shared(self.base.name(), &self.history)?;
    history.push_back(value);
    if let Some(capacity) = self.capacity {
      while history.len() > capacity {
        history.pop_front();
      }
    }
    Ok(())
  }
}

impl<T: PortType> NodeHandle<RecorderNode<T>> {
  /// The recorded input.
  pub fn input(&self) -> InputPort<T> {
    self.input_at(0)
  }
}
