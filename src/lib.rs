//! # Blockweave
//!
//! Tick-driven dataflow blocks for control loops, in pure Rust.
//!
//! A program is a graph of [`Node`]s wired output-to-input. Once per control
//! period the loop driver calls [`Runtime::tick`], and the runtime resolves
//! exactly the nodes that tick needs:
//!
//! - `Always` nodes (monitors, shutdown sinks) are resolved every tick and pull
//!   their inputs on demand.
//! - `Lazy` nodes are resolved only when something reads them, and at most once
//!   per tick.
//! - `OutputsFirst` nodes (such as [`nodes::DelayNode`]) produce their outputs
//!   from last tick's state, which is what lets a feedback loop resolve.
//!
//! ## Key Features
//!
//! - **Typed wiring**: ports carry their value type and mismatched connections
//!   are rejected while building
//! - **Composites**: a whole graph can stand in as one node
//! - **Deterministic**: one thread, no suspension points inside a tick
//! - **Cycle detection**: loops without an `OutputsFirst` node fail with the
//!   offending path
//!
//! ## Quick Start
//!
//! ```rust
//! use blockweave::nodes::{CombineNode, ConstantNode, DelayNode, MonitorNode};
//! use blockweave::{GraphBuilder, Runtime};
//! use std::time::Duration;
//!
//! // counter: x(t) = x(t-1) + 1
//! let mut builder = GraphBuilder::new("counter");
//! let one = builder.add_node(ConstantNode::new(1_i64));
//! let state = builder.add_node(DelayNode::new(0_i64));
//! let next = builder.add_node(CombineNode::new(|a: &i64, b: &i64| a + b));
//! let (monitor, seen) = MonitorNode::<i64>::new();
//! let monitor = builder.add_node(monitor);
//! builder.connect(next.a(), state.output())?;
//! builder.connect(next.b(), one.output())?;
//! builder.connect(state.input(), next.output())?;
//! builder.connect(monitor.input(), next.output())?;
//!
//! let mut runtime = Runtime::new(builder.build()?);
//! runtime.start()?;
//! for _ in 0..3 {
//!   runtime.tick(Duration::from_millis(10))?;
//! }
//! assert_eq!(seen.latest().as_deref(), Some(&3));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Documentation enforcement - treat missing docs as errors
#![deny(missing_docs)]

/// Composite nodes: a graph running as one node.
pub mod composite;
/// Runtime configuration.
pub mod config;
/// Periodic async loop driver.
pub mod driver;
/// Error types.
pub mod error;
/// Frozen, validated graphs.
pub mod graph;
/// Graph builder.
pub mod graph_builder;
/// Core node trait and processing modes.
pub mod node;
/// Collection of built-in nodes.
pub mod nodes;
/// Ports, port declarations and node identity.
pub mod port;
/// Tick resolution.
pub mod runtime;
/// Port values and the per-call input/output views.
pub mod value;

pub use composite::{Composite, CompositeBuilder};
pub use config::RuntimeConfig;
pub use error::{ConfigError, NodeError, RuntimeError, ValueError};
pub use graph::Graph;
pub use graph_builder::GraphBuilder;
pub use node::{Demand, Node, NodeHandle, Order, ProcessingMode, Tick};
pub use port::{GraphId, InputKey, InputPort, NodeId, OutputKey, OutputPort, PortSpec, PortType};
pub use runtime::{Runtime, RuntimeState, TickStats};
pub use value::{Inputs, Outputs, PortValue, port_value};

#[cfg(test)]
mod composite_test;
#[cfg(test)]
mod config_test;
