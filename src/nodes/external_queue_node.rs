//! # External Queue Node
//!
//! Zero inputs, one output. Each tick it is demanded, it dequeues one item
//! pushed through its [`QueueHandle`].
//!
//! ## Ports
//!
//! - **Output 0**: `"out"` - `Some(item)`, or `None` once the queue is exhausted
//!
//! The node is lazy: a tick that never demands it leaves the queue untouched,
//! and a tick that demands it several times still dequeues only once.

use crate::error::NodeError;
use crate::node::{Node, NodeHandle, Tick};
use crate::nodes::common::{BaseNode, lock_handle, lock_shared};
use crate::port::{OutputPort, PortSpec, PortType};
use crate::value::{Inputs, Outputs};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Producer side of an [`ExternalQueueNode`].
pub struct QueueHandle<T> {
  queue: Arc<Mutex<VecDeque<T>>>,
}

impl<T> Clone for QueueHandle<T> {
  fn clone(&self) -> Self {
    Self {
      queue: Arc::clone(&self.queue),
    }
  }
}

impl<T: PortType> QueueHandle<T> {
  /// Appends one item.
  pub fn push(&self, item: T) {
    lock_handle(&self.queue).push_back(item);
  }

  /// Appends every item of `items`, in order.
  pub fn extend(&self, items: impl IntoIterator<Item = T>) {
    lock_handle(&self.queue).extend(items);
  }

  /// Number of items not yet dequeued.
  pub fn len(&self) -> usize {
    lock_handle(&self.queue).len()
  }

  /// Returns `true` when every item has been dequeued.
  pub fn is_empty(&self) -> bool {
    lock_handle(&self.queue).is_empty()
  }

  /// Drops every pending item.
  pub fn clear(&self) {
    lock_handle(&self.queue).clear();
  }
}

/// A node dequeuing one externally supplied item per tick.
pub struct ExternalQueueNode<T> {
  base: BaseNode,
  queue: Arc<Mutex<VecDeque<T>>>,
}

impl<T: PortType> ExternalQueueNode<T> {
  /// Creates an empty queue node and its handle.
  pub fn new() -> (Self, QueueHandle<T>) {
    let queue = Arc::new(Mutex::new(VecDeque::new()));
    let node = Self {
      base: BaseNode::new("external_queue", Vec::new(), vec![PortSpec::new::<Option<T>>("out")]),
      queue: Arc::clone(&queue),
    };
    (node, QueueHandle { queue })
  }

  /// Renames the node.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.base.set_name(name);
    self
  }
}

impl<T: PortType> Node for ExternalQueueNode<T> {
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
    let item = lock_shared(self.base.name(), &self.queue)?.pop_front();
    outputs.set(0, item)?;
    Ok(())
  }
}

impl<T: PortType> NodeHandle<ExternalQueueNode<T>> {
  /// The dequeued item, `None` once exhausted.
  pub fn output(&self) -> OutputPort<Option<T>> {
    self.output_at(0)
  }
}
