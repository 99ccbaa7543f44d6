//! # Port Values
//!
//! Values travel between nodes as [`PortValue`], an `Arc<dyn Any + Send + Sync>`.
//! Fan-out shares one allocation: each consumer gets an `Arc::clone`.
//!
//! Nodes never see the raw cache. The runtime hands a node its resolved
//! [`Inputs`] and an empty [`Outputs`] to fill; both check indices and value
//! types against the node's declared [`PortSpec`]s.

use crate::error::ValueError;
use crate::port::{PortSpec, PortType};
use std::any::{Any, type_name};
use std::sync::Arc;

/// A value flowing along a connection.
pub type PortValue = Arc<dyn Any + Send + Sync>;

/// Wraps a value for transport.
pub fn port_value<T: PortType>(value: T) -> PortValue {
  Arc::new(value)
}

/// The resolved inputs of one node for the current tick.
///
/// An input is absent when it is unconnected, or when its source left the
/// output unset this tick.
#[derive(Clone)]
pub struct Inputs {
  specs: Arc<[PortSpec]>,
  values: Vec<Option<PortValue>>,
}

impl Inputs {
  pub(crate) fn new(specs: Arc<[PortSpec]>, values: Vec<Option<PortValue>>) -> Self {
    debug_assert_eq!(specs.len(), values.len());
    Self { specs, values }
  }

  /// Builds inputs from raw values, for exercising a node outside a runtime.
  pub fn from_values(specs: &[PortSpec], values: Vec<Option<PortValue>>) -> Self {
    let mut values = values;
    values.resize(specs.len(), None);
    Self::new(specs.iter().cloned().collect(), values)
  }

  /// Number of inputs.
  pub fn len(&self) -> usize {
    self.values.len()
  }

  /// Returns `true` for a node without inputs.
  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Whether input `index` has a value this tick.
  pub fn is_present(&self, index: usize) -> bool {
    matches!(self.values.get(index), Some(Some(_)))
  }

  /// The untyped value of input `index`, if present.
  pub fn value(&self, index: usize) -> Option<&PortValue> {
    self.values.get(index).and_then(Option::as_ref)
  }

  /// The value of input `index` as a `T`, or `None` when absent.
  pub fn get<T: PortType>(&self, index: usize) -> Result<Option<&T>, ValueError> {
    let slot = self.slot(index)?;
    match slot {
      None => Ok(None),
      Some(value) => value
        .downcast_ref::<T>()
        .map(Some)
        .ok_or_else(|| self.mismatch::<T>(index)),
    }
  }

  /// The value of input `index` as a `T`; absence is an error.
  pub fn require<T: PortType>(&self, index: usize) -> Result<&T, ValueError> {
    self.get::<T>(index)?.ok_or_else(|| ValueError::Missing {
      port: self.specs[index].name().to_string(),
    })
  }

  /// The shared value of input `index`, without copying the payload.
  pub fn shared<T: PortType>(&self, index: usize) -> Result<Option<Arc<T>>, ValueError> {
    match self.slot(index)? {
      None => Ok(None),
      Some(value) => Arc::clone(value)
        .downcast::<T>()
        .map(Some)
        .map_err(|_| self.mismatch::<T>(index)),
    }
  }

  /// Consumes the inputs and returns the raw values.
  pub fn into_values(self) -> Vec<Option<PortValue>> {
    self.values
  }

  fn slot(&self, index: usize) -> Result<Option<&PortValue>, ValueError> {
    self
      .values
      .get(index)
      .map(Option::as_ref)
      .ok_or(ValueError::OutOfRange {
        index,
        count: self.values.len(),
      })
  }

  fn mismatch<T>(&self, index: usize) -> ValueError {
    ValueError::TypeMismatch {
      port: self.specs[index].name().to_string(),
      expected: type_name::<T>(),
    }
  }
}

/// The outputs a node produces in one call.
#[derive(Clone)]
pub struct Outputs {
  specs: Arc<[PortSpec]>,
  values: Vec<Option<PortValue>>,
}

impl Outputs {
  pub(crate) fn new(specs: Arc<[PortSpec]>) -> Self {
    let values = vec![None; specs.len()];
    Self { specs, values }
  }

  /// Empty outputs for the given declarations, for exercising a node outside a runtime.
  pub fn for_specs(specs: &[PortSpec]) -> Self {
    Self::new(specs.iter().cloned().collect())
  }

  /// Number of outputs.
  pub fn len(&self) -> usize {
    self.values.len()
  }

  /// Returns `true` for a node without outputs.
  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Sets output `index` to `value`.
  pub fn set<T: PortType>(&mut self, index: usize, value: T) -> Result<(), ValueError> {
    self.forward(index, Arc::new(value))
  }

  /// Sets output `index` to an already shared value.
  pub fn set_shared<T: PortType>(&mut self, index: usize, value: Arc<T>) -> Result<(), ValueError> {
    self.forward(index, value)
  }

  /// Sets output `index` to an untyped value, checking it against the declared type.
  pub fn forward(&mut self, index: usize, value: PortValue) -> Result<(), ValueError> {
    let count = self.values.len();
    let spec = self
      .specs
      .get(index)
      .ok_or(ValueError::OutOfRange { index, count })?;
    if (*value).type_id() != spec.type_id() {
      return Err(ValueError::TypeMismatch {
        port: spec.name().to_string(),
        expected: spec.type_name(),
      });
    }
    self.values[index] = Some(value);
    Ok(())
  }

  /// Clears output `index`, leaving it absent this tick.
  pub fn clear(&mut self, index: usize) {
    if let Some(slot) = self.values.get_mut(index) {
      *slot = None;
    }
  }

  /// The value of output `index`, if set.
  pub fn value(&self, index: usize) -> Option<&PortValue> {
    self.values.get(index).and_then(Option::as_ref)
  }

  /// Typed view of output `index`, if set and of type `T`.
  pub fn get<T: PortType>(&self, index: usize) -> Option<&T> {
    self.value(index).and_then(|v| v.downcast_ref::<T>())
  }

  pub(crate) fn into_values(self) -> Vec<Option<PortValue>> {
    self.values
  }
}
