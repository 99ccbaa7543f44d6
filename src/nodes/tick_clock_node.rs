//! # Tick Clock Node
//!
//! Exposes the loop timing as values, so graphs can integrate over time.
//!
//! ## Ports
//!
//! - **Output 0**: `"dt"` - seconds since the previous tick (`f64`)
//! - **Output 1**: `"time"` - seconds since `start`, including this tick (`f64`)

use crate::error::NodeError;
use crate::node::{Node, NodeHandle, Tick};
use crate::nodes::common::BaseNode;
use crate::port::{OutputPort, PortSpec};
use crate::value::{Inputs, Outputs};

/// Source of per-tick timing.
pub struct TickClockNode {
  base: BaseNode,
}

impl TickClockNode {
  /// Creates a clock named `"clock"`.
  pub fn new() -> Self {
    Self {
      base: BaseNode::new(
        "clock",
        Vec::new(),
        vec![PortSpec::new::<f64>("dt"), PortSpec::new::<f64>("time")],
      ),
    }
  }

  /// Renames the node.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.base.set_name(name);
    self
  }
}

impl Default for TickClockNode {
  fn default() -> Self {
    Self::new()
  }
}

impl Node for TickClockNode {
  fn name(&self) -> &str {
    self.base.name()
  }

  fn inputs(&self) -> &[PortSpec] {
    self.base.inputs()
  }

  fn outputs(&self) -> &[PortSpec] {
    self.base.outputs()
  }

  fn compute(&mut self, tick: &Tick, _inputs: &Inputs, outputs: &mut Outputs) -> Result<(), NodeError> {
    outputs.set(0, tick.dt())?;
    outputs.set(1, tick.since_start.as_secs_f64())?;
    Ok(())
  }
}

impl NodeHandle<TickClockNode> {
  /// Seconds since the previous tick.
  pub fn dt(&self) -> OutputPort<f64> {
    self.output_at(0)
  }

  /// Seconds since start.
  pub fn time(&self) -> OutputPort<f64> {
    self.output_at(1)
  }
}
