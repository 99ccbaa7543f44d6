//! # Delay Node Test Suite
//!
//! Covers the emit/update split directly, and the delay closing a loop inside
//! a runtime.

use crate::graph_builder::GraphBuilder;
use crate::node::{Demand, Node, Order, Tick};
use crate::nodes::combine_node::CombineNode;
use crate::nodes::constant_node::ConstantNode;
use crate::nodes::delay_node::DelayNode;
use crate::nodes::recorder_node::RecorderNode;
use crate::runtime::Runtime;
use crate::value::{Inputs, Outputs, port_value};
use std::time::Duration;

fn emit<T: crate::port::PortType + Clone>(node: &mut DelayNode<T>) -> Option<T> {
  let mut outputs = Outputs::for_specs(node.outputs());
  node.emit(&Tick::default(), &mut outputs).unwrap();
  outputs.get::<T>(0).cloned()
}

fn update<T: crate::port::PortType>(node: &mut DelayNode<T>, value: Option<T>) {
  let inputs = Inputs::from_values(node.inputs(), vec![value.map(port_value)]);
  node.update(&Tick::default(), &inputs).unwrap();
}

// ============================================================================
// Direct hook tests
// ============================================================================

#[test]
fn test_delay_node_creation() {
  let node = DelayNode::new(0_i32);
  assert_eq!(node.name(), "delay");
  assert_eq!(node.inputs().len(), 1);
  assert_eq!(node.outputs().len(), 1);
  assert_eq!(node.mode().order, Order::OutputsFirst);
  assert_eq!(node.mode().demand, Demand::Lazy);
  assert_eq!(DelayNode::new(0_i32).always().mode().demand, Demand::Always);
}

#[test]
fn test_delay_node_emits_initial_then_previous_input() {
  let mut node = DelayNode::new(10_i32);
  node.initialize().unwrap();
  assert_eq!(emit(&mut node), Some(10));
  // emit does not consume state
  assert_eq!(emit(&mut node), Some(10));

  update(&mut node, Some(11));
  assert_eq!(emit(&mut node), Some(11));
  update(&mut node, Some(12));
  assert_eq!(emit(&mut node), Some(12));
}

#[test]
fn test_delay_node_holds_absent_input() {
  let mut node = DelayNode::new(1_i32);
  node.initialize().unwrap();
  update(&mut node, None);
  assert_eq!(emit(&mut node), None);
}

#[test]
fn test_delay_node_empty_initial() {
  let mut node = DelayNode::<String>::empty();
  node.initialize().unwrap();
  assert_eq!(emit(&mut node), None);
  update(&mut node, Some("x".to_string()));
  assert_eq!(emit(&mut node).as_deref(), Some("x"));
}

#[test]
fn test_delay_node_initialize_resets_state() {
  let mut node = DelayNode::new(0_i32);
  node.initialize().unwrap();
  update(&mut node, Some(5));
  node.initialize().unwrap();
  assert_eq!(emit(&mut node), Some(0));
}

// ============================================================================
// Runtime tests
// ============================================================================

#[test]
fn test_delay_node_accumulator_loop() {
  // sum(t) = sum(t-1) + 2
  let mut builder = GraphBuilder::new("accumulator");
  let step = builder.add_node(ConstantNode::new(2_i32));
  let previous = builder.add_node(DelayNode::new(0_i32));
  let sum = builder.add_node(CombineNode::new(|a: &i32, b: &i32| a + b));
  let (recorder, history) = RecorderNode::<i32>::new();
  let recorder = builder.add_node(recorder);
  builder.connect(sum.a(), previous.output()).unwrap();
  builder.connect(sum.b(), step.output()).unwrap();
  builder.connect(previous.input(), sum.output()).unwrap();
  builder.connect(recorder.input(), sum.output()).unwrap();

  let mut runtime = Runtime::new(builder.build().unwrap());
  runtime.start().unwrap();
  for _ in 0..4 {
    runtime.tick(Duration::from_millis(10)).unwrap();
  }
  assert_eq!(history.cloned_values(), vec![2, 4, 6, 8]);
}

#[test]
fn test_lazy_delay_not_demanded_keeps_state() {
  let mut builder = GraphBuilder::new("idle_delay");
  let source = builder.add_node(ConstantNode::new(9_i32));
  let delay = builder.add_node(DelayNode::new(1_i32));
  builder.connect(delay.input(), source.output()).unwrap();

  let mut runtime = Runtime::new(builder.build().unwrap());
  runtime.start().unwrap();
  runtime.tick(Duration::from_millis(1)).unwrap();
  assert_eq!(runtime.stats().updated, 0);
  assert_eq!(runtime.value(delay.output()), None);
}

#[test]
fn test_always_delay_samples_every_tick() {
  let mut builder = GraphBuilder::new("sampling_delay");
  let source = builder.add_node(ConstantNode::new(9_i32));
  let delay = builder.add_node(DelayNode::new(1_i32).always());
  builder.connect(delay.input(), source.output()).unwrap();

  let mut runtime = Runtime::new(builder.build().unwrap());
  runtime.start().unwrap();
  runtime.tick(Duration::from_millis(1)).unwrap();
  assert_eq!(runtime.value(delay.output()), Some(&1));
  assert_eq!(runtime.stats().updated, 1);
  runtime.tick(Duration::from_millis(1)).unwrap();
  assert_eq!(runtime.value(delay.output()), Some(&9));
}
