//! # Standard Node Library
//!
//! Reusable blocks for building control graphs. Every node here is built on
//! [`common::BaseNode`] and exposes typed port accessors on its
//! [`NodeHandle`](crate::NodeHandle).
//!
//! ## Node Categories
//!
//! - **Sources** (0 inputs): [`ConstantNode`], [`ExternalInputNode`],
//!   [`ExternalQueueNode`], [`TickClockNode`]
//! - **Transforms**: [`MapNode`], [`CombineNode`]
//! - **State**: [`DelayNode`], the one built-in `OutputsFirst` node
//! - **Sinks** (`Always`): [`MonitorNode`], [`RecorderNode`], [`ShutdownNode`]
//!
//! Source nodes that take values from outside the graph hand out a cloneable
//! handle next to the node. Handles may be used from another thread between
//! ticks.

pub mod common;

pub mod combine_node;
pub mod constant_node;
pub mod delay_node;
pub mod external_input_node;
pub mod external_queue_node;
pub mod map_node;
pub mod monitor_node;
pub mod recorder_node;
pub mod shutdown_node;
pub mod tick_clock_node;

pub use combine_node::CombineNode;
pub use constant_node::ConstantNode;
pub use delay_node::DelayNode;
pub use external_input_node::{ExternalInputNode, InputHandle};
pub use external_queue_node::{ExternalQueueNode, QueueHandle};
pub use map_node::MapNode;
pub use monitor_node::{MonitorHandle, MonitorNode};
pub use recorder_node::{RecorderHandle, RecorderNode};
pub use shutdown_node::ShutdownNode;
pub use tick_clock_node::TickClockNode;

#[cfg(test)]
mod delay_node_test;
#[cfg(test)]
mod map_node_test;
