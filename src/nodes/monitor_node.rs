//! # Monitor Node
//!
//! One input, no outputs, `Always`. Keeps the most recent value it has seen
//! where a [`MonitorHandle`] can read it. A monitor is a pure observer: it
//! never feeds anything back into its graph, and because it is `Always` it
//! pulls its input every tick without anything downstream demanding it.
//!
//! ## Ports
//!
//! - **Input 0**: `"in"` - value to observe

use crate::error::NodeError;
use crate::node::{Node, NodeHandle, ProcessingMode, Tick};
use crate::nodes::common::{BaseNode, lock_handle, lock_shared};
use crate::port::{InputPort, PortSpec, PortType};
use crate::value::{Inputs, Outputs};
use std::sync::{Arc, Mutex};
use tracing::trace;

struct Observed<T> {
  latest: Option<Arc<T>>,
  tick: Option<u64>,
  samples: u64,
}

impl<T> Default for Observed<T> {
  fn default() -> Self {
    Self {
      latest: None,
      tick: None,
      samples: 0,
    }
  }
}

/// Reader side of a [`MonitorNode`].
pub struct MonitorHandle<T> {
  observed: Arc<Mutex<Observed<T>>>,
}

impl<T> Clone for MonitorHandle<T> {
  fn clone(&self) -> Self {
    Self {
      observed: Arc::clone(&self.observed),
    }
  }
}

impl<T: PortType> MonitorHandle<T> {
  /// The most recent value seen since the last `start`.
  pub fn latest(&self) -> Option<Arc<T>> {
    lock_handle(&self.observed).latest.clone()
  }

  /// Index of the tick that produced [`MonitorHandle::latest`].
  pub fn latest_tick(&self) -> Option<u64> {
    lock_handle(&self.observed).tick
  }

  /// Number of ticks in which a value was present.
  pub fn samples(&self) -> u64 {
    lock_handle(&self.observed).samples
  }
}

/// A sink that remembers the latest value of its input.
pub struct MonitorNode<T> {
  base: BaseNode,
  observed: Arc<Mutex<Observed<T>>>,
}

impl<T: PortType> MonitorNode<T> {
  /// Creates a monitor and its handle.
  pub fn new() -> (Self, MonitorHandle<T>) {
    let observed = Arc::new(Mutex::new(Observed::default()));
    let node = Self {
      base: BaseNode::new("monitor", vec![PortSpec::new::<T>("in")], Vec::new()),
      observed: Arc::clone(&observed),
    };
    (node, MonitorHandle { observed })
  }

  /// Renames the node.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.base.set_name(name);
    self
  }
}

impl<T: PortType> Node for MonitorNode<T> {
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
    *lock_shared(self.base.name(), &self.observed)? = Observed::default();
    Ok(())
  }

  fn compute(&mut self, tick: &Tick, inputs: &Inputs, _outputs: &mut Outputs) -> Result<(), NodeError> {
    if let Some(value) = inputs.shared::<T>(0)? {
      trace!("MonitorNode::compute(name={}, tick={})", self.base.name(), tick.index);
      let mut observed = lock_shared(self.base.name(), &self.observed)?;
      observed.latest = Some(value);
      observed.tick = Some(tick.index);
      observed.samples += 1;
    }
    Ok(())
  }
}

impl<T: PortType> NodeHandle<MonitorNode<T>> {
  /// The observed input.
  pub fn input(&self) -> InputPort<T> {
    self.input_at(0)
  }
}
