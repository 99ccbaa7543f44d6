//! # Composite Test Suite
//!
//! A composite must be indistinguishable from the flat graph it wraps.

use crate::composite::CompositeBuilder;
use crate::error::{ConfigError, NodeError, RuntimeError};
use crate::graph_builder::GraphBuilder;
use crate::node::{Demand, Node, Order, ProcessingMode, Tick};
use crate::nodes::{
  CombineNode, ConstantNode, DelayNode, ExternalInputNode, ExternalQueueNode, MapNode, MonitorNode,
  RecorderNode, TickClockNode,
};
use crate::port::PortSpec;
use crate::runtime::Runtime;
use crate::value::{Inputs, Outputs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Running sum: `y(t) = y(t-1) + x(t)`.
fn integrator() -> crate::composite::Composite {
  let mut inner = CompositeBuilder::new("integrator");
  let x = inner.input::<i32>("x");
  let state = inner.graph().add_node(DelayNode::new(0_i32));
  let sum = inner.graph().add_node(CombineNode::new(|a: &i32, b: &i32| a + b));
  inner.graph().connect(sum.a(), state.output()).unwrap();
  inner.graph().connect(sum.b(), x).unwrap();
  inner.graph().connect(state.input(), sum.output()).unwrap();
  inner.output("y", sum.output()).unwrap();
  inner.build().unwrap()
}

/// Counts teardowns.
struct Teardown {
  count: Arc<AtomicUsize>,
}

impl Node for Teardown {
  fn name(&self) -> &str {
    "teardown"
  }

  fn inputs(&self) -> &[PortSpec] {
    &[]
  }

  fn outputs(&self) -> &[PortSpec] {
    &[]
  }

  fn teardown(&mut self) -> Result<(), NodeError> {
    self.count.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

/// `Always` node that fails its tick while `armed` is set.
struct Tripwire {
  armed: Arc<AtomicBool>,
}

impl Node for Tripwire {
  fn name(&self) -> &str {
    "tripwire"
  }

  fn inputs(&self) -> &[PortSpec] {
    &[]
  }

  fn outputs(&self) -> &[PortSpec] {
    &[]
  }

  fn mode(&self) -> ProcessingMode {
    ProcessingMode::ALWAYS
  }

  fn compute(&mut self, _tick: &Tick, _inputs: &Inputs, _outputs: &mut Outputs) -> Result<(), NodeError> {
    if self.armed.load(Ordering::SeqCst) {
      return Err("tripped".into());
    }
    Ok(())
  }
}

/// `b -> C -> Delay`, exposing C as `c` and the delay as `d`.
fn hold_composite() -> CompositeBuilder {
  let mut inner = CompositeBuilder::new("cd");
  let x = inner.input::<i32>("b");
  let c = inner.graph().add_node(MapNode::new(|v: &i32| v - 3).with_name("C"));
  let delay = inner.graph().add_node(DelayNode::new(5_i32).with_name("Delay"));
  inner.graph().connect(c.input(), x).unwrap();
  inner.graph().connect(delay.input(), c.output()).unwrap();
  inner.output("c", c.output()).unwrap();
  inner.output("d", delay.output()).unwrap();
  inner
}

fn ms(millis: u64) -> Duration {
  Duration::from_millis(millis)
}

#[test]
fn test_composite_matches_flat_graph() {
  // flat: x -> +1 -> *10
  let (flat_in, flat_set) = ExternalInputNode::new(1_i32);
  let mut flat = GraphBuilder::new("flat");
  let flat_in = flat.add_node(flat_in);
  let add = flat.add_node(MapNode::new(|v: &i32| v + 1));
  let mul = flat.add_node(MapNode::new(|v: &i32| v * 10));
  let (flat_rec, flat_seen) = RecorderNode::<i32>::new();
  let flat_rec = flat.add_node(flat_rec);
  flat.connect(add.input(), flat_in.output()).unwrap();
  flat.connect(mul.input(), add.output()).unwrap();
  flat.connect(flat_rec.input(), mul.output()).unwrap();

  // wrapped: the same chain inside a composite
  let mut inner = CompositeBuilder::new("affine");
  let x = inner.input::<i32>("x");
  let add = inner.graph().add_node(MapNode::new(|v: &i32| v + 1));
  let mul = inner.graph().add_node(MapNode::new(|v: &i32| v * 10));
  inner.graph().connect(add.input(), x).unwrap();
  inner.graph().connect(mul.input(), add.output()).unwrap();
  inner.output("y", mul.output()).unwrap();
  let affine = inner.build().unwrap();
  assert_eq!(affine.mode(), ProcessingMode::LAZY);

  let (wrapped_in, wrapped_set) = ExternalInputNode::new(1_i32);
  let mut wrapped = GraphBuilder::new("wrapped");
  let wrapped_in = wrapped.add_node(wrapped_in);
  let affine = wrapped.add_node(affine);
  let (wrapped_rec, wrapped_seen) = RecorderNode::<i32>::new();
  let wrapped_rec = wrapped.add_node(wrapped_rec);
  wrapped.connect(affine.input_at(0), wrapped_in.output()).unwrap();
  wrapped.connect(wrapped_rec.input(), affine.output_at::<i32>(0)).unwrap();

  let mut flat = Runtime::new(flat.build().unwrap());
  let mut wrapped = Runtime::new(wrapped.build().unwrap());
  flat.start().unwrap();
  wrapped.start().unwrap();
  for value in [1, 2, 5] {
    flat_set.set(value);
    wrapped_set.set(value);
    flat.tick(ms(1)).unwrap();
    wrapped.tick(ms(1)).unwrap();
  }
  flat_set.clear();
  wrapped_set.clear();
  flat.tick(ms(1)).unwrap();
  wrapped.tick(ms(1)).unwrap();

  assert_eq!(flat_seen.history(), wrapped_seen.history());
  assert_eq!(wrapped_seen.cloned_values(), vec![20, 30, 60]);
}

#[test]
fn test_composite_keeps_inner_state_between_ticks() {
  let mut outer = GraphBuilder::new("outer");
  let one = outer.add_node(ConstantNode::new(1_i32));
  let integrator = outer.add_node(integrator());
  let (monitor, seen) = MonitorNode::<i32>::new();
  let monitor = outer.add_node(monitor);
  outer.connect(integrator.input_at(0), one.output()).unwrap();
  outer.connect(monitor.input(), integrator.output_at::<i32>(0)).unwrap();

  let mut runtime = Runtime::new(outer.build().unwrap());
  runtime.start().unwrap();
  for expected in 1..=3 {
    runtime.tick(ms(1)).unwrap();
    assert_eq!(seen.latest().as_deref(), Some(&expected));
  }

  // restarting the outer runtime restarts the inner one
  runtime.start().unwrap();
  runtime.tick(ms(1)).unwrap();
  assert_eq!(seen.latest().as_deref(), Some(&1));
}

#[test]
fn test_composite_demand_follows_inner_nodes() {
  let mut lazy = CompositeBuilder::new("lazy");
  let c = lazy.graph().add_node(ConstantNode::new(1_i32));
  lazy.output("c", c.output()).unwrap();
  assert_eq!(lazy.build().unwrap().mode().demand, Demand::Lazy);

  let mut always = CompositeBuilder::new("always");
  let x = always.input::<i32>("x");
  let (monitor, _seen) = MonitorNode::<i32>::new();
  let monitor = always.graph().add_node(monitor);
  always.graph().connect(monitor.input(), x).unwrap();
  let composite = always.build().unwrap();
  assert_eq!(composite.mode().demand, Demand::Always);
  assert_eq!(composite.mode().order, Order::InputsFirst);

  let mut forced = CompositeBuilder::new("forced");
  let c = forced.graph().add_node(ConstantNode::new(1_i32));
  forced.output("c", c.output()).unwrap();
  let forced = forced.demand(Demand::Always).build().unwrap();
  assert!(forced.mode().is_always());
}

#[test]
fn test_lazy_composite_not_demanded_is_not_run() {
  let (queue, items) = ExternalQueueNode::<i32>::new();
  items.extend([1, 2, 3]);
  let mut inner = CompositeBuilder::new("drain");
  let queue = inner.graph().add_node(queue);
  inner.output("item", queue.output()).unwrap();
  let drain = inner.build().unwrap();

  let mut outer = GraphBuilder::new("outer");
  outer.add_node(drain);
  let mut runtime = Runtime::new(outer.build().unwrap());
  runtime.start().unwrap();
  runtime.tick(ms(1)).unwrap();
  assert_eq!(items.len(), 3);
}

#[test]
fn test_composite_ports_and_required_inputs() {
  let mut inner = CompositeBuilder::new("gain");
  let x = inner.required_input::<f64>("x");
  let gain = inner.graph().add_node(MapNode::new(|v: &f64| v * 2.0));
  inner.graph().connect(gain.input(), x).unwrap();
  inner.output("y", gain.output()).unwrap();
  let gain = inner.build().unwrap();
  assert_eq!(gain.name(), "gain");
  assert_eq!(gain.inputs()[0].name(), "x");
  assert!(gain.inputs()[0].is_required());
  assert_eq!(gain.outputs()[0].name(), "y");
  assert_eq!(gain.runtime().graph().len(), 2);

  let mut outer = GraphBuilder::new("outer");
  outer.add_node(gain);
  let err = outer.build().unwrap_err();
  assert_eq!(
    err,
    ConfigError::MissingRequiredInput {
      node: "gain".to_string(),
      input: "x".to_string(),
    }
  );
}

#[test]
fn test_composite_output_must_be_inner_port() {
  let mut elsewhere = GraphBuilder::new("elsewhere");
  let foreign = elsewhere.add_node(ConstantNode::new(1_i32));
  let mut inner = CompositeBuilder::new("bad");
  let err = inner.output("y", foreign.output()).unwrap_err();
  assert!(matches!(err, ConfigError::UnknownNode { .. }));
}

#[test]
fn test_inner_cycle_surfaces_through_nested_composites() {
  let mut inner = CompositeBuilder::new("inner");
  let a = inner.graph().add_node(MapNode::new(|v: &i32| *v).with_name("a"));
  let b = inner.graph().add_node(MapNode::new(|v: &i32| *v).with_name("b"));
  inner.graph().connect(a.input(), b.output()).unwrap();
  inner.graph().connect(b.input(), a.output()).unwrap();
  inner.output("y", a.output()).unwrap();
  let inner = inner.build().unwrap();

  let mut middle = CompositeBuilder::new("middle");
  let wrapped = middle.graph().add_node(inner);
  middle.output("y", wrapped.output_at::<i32>(0)).unwrap();
  let middle = middle.build().unwrap();

  let mut outer = GraphBuilder::new("outer");
  let middle = outer.add_node(middle);
  let (monitor, _seen) = MonitorNode::<i32>::new();
  let monitor = outer.add_node(monitor);
  outer.connect(monitor.input(), middle.output_at::<i32>(0)).unwrap();

  let mut runtime = Runtime::new(outer.build().unwrap());
  runtime.start().unwrap();
  let err = runtime.tick(ms(1)).unwrap_err();
  assert!(matches!(err, RuntimeError::Node { ref node, .. } if node == "middle"));
  assert!(!err.is_cycle());
  match err.innermost() {
    RuntimeError::Cycle { path, .. } => assert_eq!(path, &vec!["a", "b", "a"]),
    other => panic!("unexpected innermost error: {}", other),
  }
}

#[test]
fn test_composite_teardown_stops_inner_runtime() {
  let count = Arc::new(AtomicUsize::new(0));
  let mut inner = CompositeBuilder::new("resource");
  inner.graph().add_node(Teardown {
    count: Arc::clone(&count),
  });
  let resource = inner.build().unwrap();

  let mut outer = GraphBuilder::new("outer");
  outer.add_node(resource);
  let mut runtime = Runtime::new(outer.build().unwrap());
  runtime.start().unwrap();
  runtime.tick(ms(1)).unwrap();
  runtime.stop().unwrap();
  assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_composite_with_input_free_output_is_outputs_first() {
  let cd = hold_composite().build().unwrap();
  assert_eq!(cd.mode(), ProcessingMode::LAZY_OUTPUTS_FIRST);
  assert!(cd.is_deferred(0));
  assert!(!cd.is_deferred(1));

  let forced = hold_composite().order(Order::InputsFirst).build().unwrap();
  assert_eq!(forced.mode(), ProcessingMode::LAZY);
  assert!(!forced.is_deferred(0));
  assert!(!forced.is_deferred(1));
}

#[test]
fn test_outputs_first_composite_is_seeded_by_start() {
  let mut outer = GraphBuilder::new("outer");
  let source = outer.add_node(ConstantNode::new(10_i32));
  let cd = outer.add_node(hold_composite().build().unwrap());
  outer.connect(cd.input_at(0), source.output()).unwrap();
  let mut runtime = Runtime::new(outer.build().unwrap());
  runtime.start().unwrap();
  assert_eq!(runtime.value(cd.output_at::<i32>(1)), Some(&5));
  assert_eq!(runtime.value(cd.output_at::<i32>(0)), None);
}

#[test]
fn test_only_input_free_output_demanded_still_updates_inner_state() {
  let mut outer = GraphBuilder::new("outer");
  let source = outer.add_node(ConstantNode::new(10_i32));
  let cd = outer.add_node(hold_composite().build().unwrap());
  let (monitor, seen) = MonitorNode::<i32>::new();
  let monitor = outer.add_node(monitor);
  outer.connect(cd.input_at(0), source.output()).unwrap();
  outer.connect(monitor.input(), cd.output_at::<i32>(1)).unwrap();

  let mut runtime = Runtime::new(outer.build().unwrap());
  runtime.start().unwrap();
  runtime.tick(ms(1)).unwrap();
  assert_eq!(seen.latest().as_deref(), Some(&5));
  runtime.tick(ms(1)).unwrap();
  assert_eq!(seen.latest().as_deref(), Some(&7));
  assert_eq!(runtime.stats().emitted, 1);
  assert_eq!(runtime.stats().updated, 1);
}

#[test]
fn test_loop_through_deferred_output_is_a_cycle() {
  let mut outer = GraphBuilder::new("outer");
  let cd = outer.add_node(hold_composite().build().unwrap());
  let back = outer.add_node(MapNode::new(|v: &i32| *v).with_name("back"));
  let (monitor, seen) = MonitorNode::<i32>::new();
  let monitor = outer.add_node(monitor);
  outer.connect(back.input(), cd.output_at::<i32>(0)).unwrap();
  outer.connect(cd.input_at(0), back.output()).unwrap();
  outer.connect(monitor.input(), cd.output_at::<i32>(0)).unwrap();

  let mut runtime = Runtime::new(outer.build().unwrap());
  runtime.start().unwrap();
  match runtime.tick(ms(1)).unwrap_err() {
    RuntimeError::Cycle { node, path } => {
      assert_eq!(node, "cd");
      assert_eq!(path, vec!["cd", "back", "cd"]);
    }
    other => panic!("unexpected error: {}", other),
  }
  assert!(seen.latest().is_none());
}

#[test]
fn test_inner_nodes_see_the_outer_tick() {
  let armed = Arc::new(AtomicBool::new(false));
  let mut inner = CompositeBuilder::new("timed");
  let clock = inner.graph().add_node(TickClockNode::new());
  inner.output("time", clock.time()).unwrap();
  let timed = inner.build().unwrap();

  let mut outer = GraphBuilder::new("outer");
  outer.add_node(Tripwire {
    armed: Arc::clone(&armed),
  });
  let clock = outer.add_node(TickClockNode::new());
  let timed = outer.add_node(timed);
  let (flat, flat_seen) = MonitorNode::<f64>::new();
  let (wrapped, wrapped_seen) = MonitorNode::<f64>::new();
  let flat = outer.add_node(flat);
  let wrapped = outer.add_node(wrapped);
  outer.connect(flat.input(), clock.time()).unwrap();
  outer.connect(wrapped.input(), timed.output_at::<f64>(0)).unwrap();

  let mut runtime = Runtime::new(outer.build().unwrap());
  runtime.start().unwrap();
  runtime.tick(ms(10)).unwrap();
  armed.store(true, Ordering::SeqCst);
  assert!(runtime.tick(ms(10)).is_err());
  armed.store(false, Ordering::SeqCst);
  runtime.tick(ms(10)).unwrap();

  assert_eq!(flat_seen.latest_tick(), Some(2));
  assert_eq!(wrapped_seen.latest_tick(), Some(2));
  let flat_time = flat_seen.latest().map(|t| t.to_bits());
  assert!(flat_time.is_some());
  assert_eq!(flat_time, wrapped_seen.latest().map(|t| t.to_bits()));
}
