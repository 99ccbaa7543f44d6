//! # Shutdown Node
//!
//! One required boolean input, `Always`. When its input resolves to `true`,
//! [`Runtime::tick`](crate::Runtime::tick) returns `true` for that tick and the
//! loop driver is expected to stop.
//!
//! ## Ports
//!
//! - **Input 0**: `"stop"` - shutdown request (required)
//! - **Output 0**: `"requested"` - the request as seen this tick; read by the runtime
//!
//! An absent input counts as `false`.

use crate::error::NodeError;
use crate::node::{Node, NodeHandle, ProcessingMode, Tick};
use crate::nodes::common::BaseNode;
use crate::port::{InputPort, OutputPort, PortSpec};
use crate::value::{Inputs, Outputs};
use tracing::debug;

/// A sink whose `true` input ends the control loop.
pub struct ShutdownNode {
  base: BaseNode,
}

impl ShutdownNode {
  /// Creates a shutdown sink.
  pub fn new() -> Self {
    Self {
      base: BaseNode::new(
        "shutdown",
        vec![PortSpec::new::<bool>("stop").required()],
        vec![PortSpec::new::<bool>("requested")],
      ),
    }
  }

  /// Renames the node.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.base.set_name(name);
    self
  }
}

impl Default for ShutdownNode {
  fn default() -> Self {
    Self::new()
  }
}

impl Node for ShutdownNode {
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

  fn compute(&mut self, tick: &Tick, inputs: &Inputs, outputs: &mut Outputs) -> Result<(), NodeError> {
    let requested = inputs.get::<bool>(0)?.copied().unwrap_or(false);
    if requested {
      debug!("ShutdownNode::compute(name={}, tick={}) requested", self.base.name(), tick.index);
    }
    outputs.set(0, requested)?;
    Ok(())
  }

  fn signals_shutdown(&self) -> bool {
    true
  }
}

impl NodeHandle<ShutdownNode> {
  /// The shutdown request.
  pub fn input(&self) -> InputPort<bool> {
    self.input_at(0)
  }

  /// The request as seen this tick.
  pub fn output(&self) -> OutputPort<bool> {
    self.output_at(0)
  }
}
