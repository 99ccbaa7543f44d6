//! # Map Node Test Suite

use crate::node::{Node, Tick};
use crate::nodes::map_node::MapNode;
use crate::value::{Inputs, Outputs, port_value};

#[test]
fn test_map_node_creation() {
  let node = MapNode::new(|v: &i32| v.to_string()).with_name("fmt");
  assert_eq!(node.name(), "fmt");
  assert_eq!(node.inputs()[0].name(), "in");
  assert_eq!(node.outputs()[0].name(), "out");
}

#[test]
fn test_map_node_transforms_present_input() {
  let mut node = MapNode::new(|v: &i32| v * 3);
  let inputs = Inputs::from_values(node.inputs(), vec![Some(port_value(4_i32))]);
  let mut outputs = Outputs::for_specs(node.outputs());
  node.compute(&Tick::default(), &inputs, &mut outputs).unwrap();
  assert_eq!(outputs.get::<i32>(0), Some(&12));
}

#[test]
fn test_map_node_absent_input_gives_absent_output() {
  let mut calls = 0;
  {
    let mut node = MapNode::new(|v: &i32| {
      calls += 1;
      *v
    });
    let inputs = Inputs::from_values(node.inputs(), vec![None]);
    let mut outputs = Outputs::for_specs(node.outputs());
    node.compute(&Tick::default(), &inputs, &mut outputs).unwrap();
    assert!(outputs.value(0).is_none());
  }
  assert_eq!(calls, 0);
}

#[test]
fn test_map_node_rejects_wrong_input_type() {
  let mut node = MapNode::new(|v: &i32| *v);
  let inputs = Inputs::from_values(node.inputs(), vec![Some(port_value("text"))]);
  let mut outputs = Outputs::for_specs(node.outputs());
  let err = node.compute(&Tick::default(), &inputs, &mut outputs).unwrap_err();
  assert_eq!(err.to_string(), format!("input 'in' does not hold a {}", std::any::type_name::<i32>()));
}
