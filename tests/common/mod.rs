//! Shared test nodes and helpers for the integration suites.

#![allow(dead_code)]

use blockweave::{Inputs, Node, NodeError, Outputs, PortSpec, ProcessingMode, Tick};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Installs a `RUST_LOG`-driven subscriber once per test binary.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

/// Renders its inputs into every output: output `i` is
/// `"{name}{i}[{inputs}]"`. Absent inputs render as `null`.
///
/// With `OutputsFirst` order it instead emits `"{name}{i}-"` until its first
/// update, then `"{name}{i}[{labels}]"` where each label is the part of the
/// input before its first `[`.
pub struct LabelNode {
  name: String,
  mode: ProcessingMode,
  inputs: Vec<PortSpec>,
  outputs: Vec<PortSpec>,
  seen: Option<Vec<String>>,
}

impl LabelNode {
  pub fn new(name: &str, inputs: usize, outputs: usize, mode: ProcessingMode) -> Self {
    Self {
      name: name.to_string(),
      mode,
      inputs: (0..inputs).map(|i| PortSpec::new::<String>(format!("in{}", i))).collect(),
      outputs: (0..outputs).map(|i| PortSpec::new::<String>(format!("out{}", i))).collect(),
      seen: None,
    }
  }

  fn render(inputs: &Inputs, label_only: bool) -> Result<Vec<String>, NodeError> {
    let mut rendered = Vec::with_capacity(inputs.len());
    for index in 0..inputs.len() {
      let text = match inputs.get::<String>(index)? {
        Some(text) if label_only => text.split('[').next().unwrap_or_default().to_string(),
        Some(text) => text.clone(),
        None => "null".to_string(),
      };
      rendered.push(text);
    }
    Ok(rendered)
  }
}

impl Node for LabelNode {
  fn name(&self) -> &str {
    &self.name
  }

  fn inputs(&self) -> &[PortSpec] {
    &self.inputs
  }

  fn outputs(&self) -> &[PortSpec] {
    &self.outputs
  }

  fn mode(&self) -> ProcessingMode {
    self.mode
  }

  fn initialize(&mut self) -> Result<(), NodeError> {
    self.seen = None;
    Ok(())
  }

  fn compute(&mut self, _tick: &Tick, inputs: &Inputs, outputs: &mut Outputs) -> Result<(), NodeError> {
    let joined = Self::render(inputs, false)?.join(", ");
    for index in 0..self.outputs.len() {
      outputs.set(index, format!("{}{}[{}]", self.name, index, joined))?;
    }
    Ok(())
  }

  fn emit(&mut self, _tick: &Tick, outputs: &mut Outputs) -> Result<(), NodeError> {
    for index in 0..self.outputs.len() {
      let text = match &self.seen {
        None => format!("{}{}-", self.name, index),
        Some(labels) => format!("{}{}[{}]", self.name, index, labels.join(", ")),
      };
      outputs.set(index, text)?;
    }
    Ok(())
  }

  fn update(&mut self, _tick: &Tick, inputs: &Inputs) -> Result<(), NodeError> {
    self.seen = Some(Self::render(inputs, true)?);
    Ok(())
  }
}

/// Outputs a constant `i32` and counts how often it is computed.
pub struct CountingNode {
  value: i32,
  outputs: Vec<PortSpec>,
  calls: Arc<AtomicUsize>,
}

impl CountingNode {
  pub fn new(value: i32) -> (Self, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let node = Self {
      value,
      outputs: vec![PortSpec::new::<i32>("out")],
      calls: Arc::clone(&calls),
    };
    (node, calls)
  }
}

impl Node for CountingNode {
  fn name(&self) -> &str {
    "counting"
  }

  fn inputs(&self) -> &[PortSpec] {
    &[]
  }

  fn outputs(&self) -> &[PortSpec] {
    &self.outputs
  }

  fn compute(&mut self, _tick: &Tick, _inputs: &Inputs, outputs: &mut Outputs) -> Result<(), NodeError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    outputs.set(0, self.value)?;
    Ok(())
  }
}
