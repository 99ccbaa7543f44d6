//! # Common Node Utilities
//!
//! Shared helpers for the built-in nodes.

use crate::error::NodeError;
use crate::port::PortSpec;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Name and port declarations shared by every built-in node.
#[derive(Debug, Clone)]
pub struct BaseNode {
  /// Node name used in diagnostics.
  pub name: String,
  /// Input declarations, in index order.
  pub inputs: Vec<PortSpec>,
  /// Output declarations, in index order.
  pub outputs: Vec<PortSpec>,
}

impl BaseNode {
  /// Creates a new BaseNode with the given name and port declarations.
  pub fn new(name: impl Into<String>, inputs: Vec<PortSpec>, outputs: Vec<PortSpec>) -> Self {
    Self {
      name: name.into(),
      inputs,
      outputs,
    }
  }

  /// Returns the node's name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Sets the node's name.
  pub fn set_name(&mut self, name: impl Into<String>) {
    self.name = name.into();
  }

  /// Returns the input declarations.
  pub fn inputs(&self) -> &[PortSpec] {
    &self.inputs
  }

  /// Returns the output declarations.
  pub fn outputs(&self) -> &[PortSpec] {
    &self.outputs
  }
}

/// Locks state shared with a handle, turning poisoning into a node error.
pub(crate) fn lock_shared<'a, T>(node: &str, mutex: &'a Mutex<T>) -> Result<MutexGuard<'a, T>, NodeError> {
  mutex
    .lock()
    .map_err(|_| format!("state shared by node '{}' is poisoned", node).into())
}

/// Locks state from the handle side. Handles never fail; a poisoned lock
/// still holds the last written value.
pub(crate) fn lock_handle<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
