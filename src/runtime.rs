//! # Runtime
//!
//! Owns a [`Graph`] and resolves it tick by tick.
//!
//! ## Lifecycle
//!
//! - [`Runtime::start`] initializes every node, clears the caches and seeds the
//!   cache with what every `OutputsFirst` node emits from its initial state.
//!   Nothing is computed while seeding, so `InputsFirst` outputs (including
//!   those of `Always` nodes) stay absent until tick 0 resolves them.
//! - [`Runtime::tick`] resolves one tick and reports whether a shutdown sink
//!   asked to stop.
//! - [`Runtime::stop`] tears every node down. No tick is valid afterwards.
//!
//! ## Resolution
//!
//! A tick starts with an empty cache and visits every `Always` node in
//! registration order. Resolving a node:
//!
//! 1. returns at once if the node was already resolved this tick;
//! 2. fails with [`RuntimeError::Cycle`] if the node is on the resolution stack;
//! 3. pushes the node;
//! 4. `OutputsFirst`: calls `emit`, caches the outputs and queues the node for
//!    its deferred `update`;
//! 5. `InputsFirst`: resolves the source of every connected input, then calls
//!    `compute` and caches the outputs;
//! 6. pops the node.
//!
//! After the top-level pass the queued updates run in order, each with a fresh
//! stack. An update resolves the node's inputs (which may resolve further
//! nodes and queue further updates) and hands them to `update`, preparing the
//! next tick's `emit`. Demanding a deferred output runs its node's update on
//! the spot instead, with the node on the stack, so a loop back into that
//! node through the deferred output is a cycle. Because an `OutputsFirst` node's outputs are cached
//! before its inputs are looked at, any loop through one resolves; a loop
//! without one re-enters a node on the stack and fails.
//!
//! Every node runs `compute` or `emit` at most once per tick, and `update` at
//! most once per tick.
//!
//! ## Errors
//!
//! A failing tick is abandoned where it stands. Nodes that already computed or
//! updated keep their new state; the next tick starts from a clean cache.

use crate::config::RuntimeConfig;
use crate::error::{NodeError, RuntimeError};
use crate::graph::Graph;
use crate::node::Tick;
use crate::port::{InputKey, OutputKey, OutputPort, PortType};
use crate::value::{Inputs, Outputs, PortValue};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Lifecycle state of a [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
  /// Built but not started.
  Idle,
  /// Started; ticks are valid.
  Running,
  /// Stopped; nothing is valid any more.
  Stopped,
}

/// Counters for the last resolved tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickStats {
  /// `compute` calls.
  pub computed: usize,
  /// `emit` calls.
  pub emitted: usize,
  /// `update` calls.
  pub updated: usize,
}

/// Executes a [`Graph`].
pub struct Runtime {
  name: String,
  config: RuntimeConfig,
  graph: Graph,
  state: RuntimeState,
  /// `sources[node][input]` = `(source node, source output)`.
  sources: Vec<Vec<Option<(usize, usize)>>>,
  always: Vec<usize>,
  shutdown: Vec<usize>,
  cache: Vec<Vec<Option<PortValue>>>,
  resolved: Vec<bool>,
  on_stack: Vec<bool>,
  stack: Vec<usize>,
  queued: Vec<bool>,
  updated: Vec<bool>,
  pending: VecDeque<usize>,
  current: Tick,
  next_index: u64,
  stats: TickStats,
}

impl Runtime {
  /// Creates a runtime with the default configuration.
  pub fn new(graph: Graph) -> Self {
    Self::with_config(graph, RuntimeConfig::default())
  }

  /// Creates a runtime with `config`.
  pub fn with_config(graph: Graph, config: RuntimeConfig) -> Self {
    let name = if config.name.is_empty() {
      graph.name().to_string()
    } else {
      config.name.clone()
    };
    let len = graph.len();
    let mut sources = Vec::with_capacity(len);
    let mut always = Vec::new();
    let mut shutdown = Vec::new();
    for id in graph.nodes() {
      let index = id.index();
      let entry = &graph.nodes[index];
      let node_sources = (0..entry.inputs.len())
        .map(|input| {
          graph
            .source_of_key(InputKey { node: id, index: input })
            .map(|output| (output.node.index(), output.index))
        })
        .collect();
      sources.push(node_sources);
      if entry.mode.is_always() {
        always.push(index);
      }
      if entry.node.signals_shutdown() && !entry.outputs.is_empty() {
        shutdown.push(index);
      }
    }
    let cache = graph.nodes.iter().map(|entry| vec![None; entry.outputs.len()]).collect();
    trace!(
      "Runtime::with_config(name={}, nodes={}, always={}, shutdown_sinks={})",
      name,
      len,
      always.len(),
      shutdown.len()
    );
    Self {
      name,
      config,
      graph,
      state: RuntimeState::Idle,
      sources,
      always,
      shutdown,
      cache,
      resolved: vec![false; len],
      on_stack: vec![false; len],
      stack: Vec::new(),
      queued: vec![false; len],
      updated: vec![false; len],
      pending: VecDeque::new(),
      current: Tick::default(),
      next_index: 0,
      stats: TickStats::default(),
    }
  }

  /// The runtime's name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// The configuration in use.
  pub fn config(&self) -> &RuntimeConfig {
    &self.config
  }

  /// The graph being executed.
  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Current lifecycle state.
  pub fn state(&self) -> RuntimeState {
    self.state
  }

  /// Number of ticks begun since the last `start`.
  pub fn tick_count(&self) -> u64 {
    self.next_index
  }

  /// Timing of the last tick begun.
  pub fn last_tick(&self) -> Tick {
    self.current
  }

  /// Counters for the last tick.
  pub fn stats(&self) -> TickStats {
    self.stats
  }

  /// Initializes every node, clears all caches and seeds the outputs of
  /// `OutputsFirst` nodes. No `compute` runs here: the outputs of
  /// `InputsFirst` nodes, `Always` ones included, are absent until the first
  /// tick. May be called again to restart from scratch.
  pub fn start(&mut self) -> Result<(), RuntimeError> {
    if self.state == RuntimeState::Stopped {
      return Err(RuntimeError::Stopped(self.name.clone()));
    }
    debug!("Runtime::start(name={})", self.name);
    for entry in &mut self.graph.nodes {
      entry
        .node
        .initialize()
        .map_err(|source| node_failure(&entry.name, source))?;
    }
    self.clear_tick();
    self.current = Tick::default();
    self.next_index = 0;
    self.state = RuntimeState::Running;

    for index in 0..self.graph.nodes.len() {
      if self.graph.nodes[index].mode.is_outputs_first() {
        let outputs = self.call_emit(index)?;
        self.cache[index] = outputs;
      }
    }
    Ok(())
  }

  /// Resolves one tick. Returns `true` if a shutdown sink resolved to `true`.
  pub fn tick(&mut self, elapsed: Duration) -> Result<bool, RuntimeError> {
    let tick = Tick {
      index: self.next_index,
      elapsed,
      since_start: self.current.since_start + elapsed,
    };
    self.run_tick(tick, &[])?;
    let mut stop = false;
    for &index in &self.shutdown {
      let requested = self.cache[index][0]
        .as_ref()
        .and_then(|value| value.downcast_ref::<bool>())
        .copied()
        .unwrap_or(false);
      if requested {
        debug!(
          "Runtime::tick(name={}, tick={}) shutdown requested by '{}'",
          self.name, self.current.index, self.graph.nodes[index].name
        );
        stop = true;
      }
    }
    Ok(stop)
  }

  /// [`Runtime::tick`] with the elapsed time in nanoseconds.
  pub fn tick_nanos(&mut self, elapsed_nanos: u64) -> Result<bool, RuntimeError> {
    self.tick(Duration::from_nanos(elapsed_nanos))
  }

  /// Tears every node down. Every node's `teardown` runs even if an earlier
  /// one fails; the first failure is returned.
  pub fn stop(&mut self) -> Result<(), RuntimeError> {
    if self.state == RuntimeState::Stopped {
      return Err(RuntimeError::Stopped(self.name.clone()));
    }
    debug!("Runtime::stop(name={}, ticks={})", self.name, self.next_index);
    self.state = RuntimeState::Stopped;
    self.clear_tick();
    let mut first = None;
    for entry in &mut self.graph.nodes {
      if let Err(source) = entry.node.teardown() {
        warn!("teardown of '{}' failed: {}", entry.name, source);
        first.get_or_insert_with(|| node_failure(&entry.name, source));
      }
    }
    first.map_or(Ok(()), Err)
  }

  /// The cached value of `output` for the last tick, if it was produced.
  pub fn value<T: PortType>(&self, output: OutputPort<T>) -> Option<&T> {
    self
      .value_key(output.key())
      .and_then(|value| value.downcast_ref::<T>())
  }

  /// The shared cached value of `output` for the last tick.
  pub fn shared<T: PortType>(&self, output: OutputPort<T>) -> Option<Arc<T>> {
    self
      .value_key(output.key())
      .and_then(|value| Arc::clone(value).downcast::<T>().ok())
  }

  /// Untyped form of [`Runtime::value`].
  pub fn value_key(&self, output: OutputKey) -> Option<&PortValue> {
    if !self.graph.contains(output.node) {
      return None;
    }
    self.cache[output.node.index()]
      .get(output.index)
      .and_then(Option::as_ref)
  }

  /// Resolves `tick`, additionally demanding `demanded`.
  pub(crate) fn run_tick(&mut self, tick: Tick, demanded: &[OutputKey]) -> Result<(), RuntimeError> {
    self.begin_tick(tick)?;
    self.finish_tick(demanded)
  }

  /// Clears the per-tick state and makes `tick` current. Nothing is resolved.
  pub(crate) fn begin_tick(&mut self, tick: Tick) -> Result<(), RuntimeError> {
    match self.state {
      RuntimeState::Running => {}
      RuntimeState::Idle => return Err(RuntimeError::NotStarted(self.name.clone())),
      RuntimeState::Stopped => return Err(RuntimeError::Stopped(self.name.clone())),
    }
    self.clear_tick();
    self.current = tick;
    self.next_index = tick.index + 1;
    trace!("Runtime::begin_tick(name={}, tick={})", self.name, tick.index);
    Ok(())
  }

  /// Resolves `outputs` within the current tick without running the
  /// top-level pass or the queued updates.
  pub(crate) fn resolve_outputs(&mut self, outputs: &[OutputKey]) -> Result<(), RuntimeError> {
    for output in outputs {
      if self.graph.contains(output.node) {
        self.demand(output.node.index(), output.index)?;
      }
    }
    Ok(())
  }

  /// Completes the current tick: every `Always` node, then `demanded`, then
  /// the queued updates.
  pub(crate) fn finish_tick(&mut self, demanded: &[OutputKey]) -> Result<(), RuntimeError> {
    for i in 0..self.always.len() {
      let index = self.always[i];
      self.resolve(index)?;
    }
    self.resolve_outputs(demanded)?;
    while let Some(index) = self.pending.pop_front() {
      self.update_now(index)?;
    }

    if self.config.trace_ticks {
      debug!(
        "tick {} of '{}': computed={} emitted={} updated={}",
        self.current.index, self.name, self.stats.computed, self.stats.emitted, self.stats.updated
      );
    }
    Ok(())
  }

  fn clear_tick(&mut self) {
    for outputs in &mut self.cache {
      outputs.iter_mut().for_each(|slot| *slot = None);
    }
    self.resolved.iter_mut().for_each(|flag| *flag = false);
    self.on_stack.iter_mut().for_each(|flag| *flag = false);
    self.queued.iter_mut().for_each(|flag| *flag = false);
    self.updated.iter_mut().for_each(|flag| *flag = false);
    self.stack.clear();
    self.pending.clear();
    self.stats = TickStats::default();
  }

  fn resolve(&mut self, index: usize) -> Result<(), RuntimeError> {
    if self.resolved[index] {
      return Ok(());
    }
    self.enter(index)?;
    let result = if self.graph.nodes[index].mode.is_outputs_first() {
      self.resolve_outputs_first(index)
    } else {
      self.resolve_inputs_first(index)
    };
    self.leave(index);
    result
  }

  fn enter(&mut self, index: usize) -> Result<(), RuntimeError> {
    if self.on_stack[index] {
      let start = self.stack.iter().position(|&i| i == index).unwrap_or(0);
      let path: Vec<String> = self.stack[start..]
        .iter()
        .chain(std::iter::once(&index))
        .map(|&i| self.graph.nodes[i].name.clone())
        .collect();
      let node = self.graph.nodes[index].name.clone();
      warn!("cycle in '{}': {}", self.name, path.join(" -> "));
      return Err(RuntimeError::Cycle { node, path });
    }
    if self.stack.len() >= self.config.max_depth {
      let node = self.graph.nodes[index].name.clone();
      warn!("resolution depth {} exceeded in '{}' at '{}'", self.config.max_depth, self.name, node);
      return Err(RuntimeError::DepthExceeded {
        node,
        depth: self.config.max_depth,
      });
    }
    self.on_stack[index] = true;
    self.stack.push(index);
    Ok(())
  }

  fn leave(&mut self, index: usize) {
    self.on_stack[index] = false;
    if self.stack.last() == Some(&index) {
      self.stack.pop();
    }
  }

  fn resolve_outputs_first(&mut self, index: usize) -> Result<(), RuntimeError> {
    let outputs = self.call_emit(index)?;
    self.cache[index] = outputs;
    self.resolved[index] = true;
    self.stats.emitted += 1;
    if !self.queued[index] {
      self.queued[index] = true;
      self.pending.push_back(index);
    }
    Ok(())
  }

  fn resolve_inputs_first(&mut self, index: usize) -> Result<(), RuntimeError> {
    let inputs = self.gather(index)?;
    let entry = &mut self.graph.nodes[index];
    let mut outputs = Outputs::new(Arc::clone(&entry.outputs));
    if let Err(source) = entry.node.compute(&self.current, &inputs, &mut outputs) {
      warn!("compute of '{}' failed: {}", entry.name, source);
      return Err(node_failure(&entry.name, source));
    }
    self.cache[index] = outputs.into_values();
    self.resolved[index] = true;
    self.stats.computed += 1;
    Ok(())
  }

  /// Resolves output `output` of node `index`, running the node's update
  /// first when the output is deferred.
  fn demand(&mut self, index: usize, output: usize) -> Result<(), RuntimeError> {
    self.resolve(index)?;
    if self.graph.nodes[index].deferred.get(output).copied().unwrap_or(false) {
      self.update_now(index)?;
    }
    Ok(())
  }

  fn update_now(&mut self, index: usize) -> Result<(), RuntimeError> {
    if self.updated[index] {
      return Ok(());
    }
    self.enter(index)?;
    let result = self.run_update(index);
    self.leave(index);
    result
  }

  fn run_update(&mut self, index: usize) -> Result<(), RuntimeError> {
    let inputs = self.gather(index)?;
    let entry = &mut self.graph.nodes[index];
    let mut outputs = Outputs::new(Arc::clone(&entry.outputs));
    if let Err(source) = entry.node.update_deferred(&self.current, &inputs, &mut outputs) {
      warn!("update of '{}' failed: {}", entry.name, source);
      return Err(node_failure(&entry.name, source));
    }
    for (output, value) in outputs.into_values().into_iter().enumerate() {
      if entry.deferred[output] {
        self.cache[index][output] = value;
      }
    }
    self.updated[index] = true;
    self.stats.updated += 1;
    Ok(())
  }

  fn call_emit(&mut self, index: usize) -> Result<Vec<Option<PortValue>>, RuntimeError> {
    let entry = &mut self.graph.nodes[index];
    let mut outputs = Outputs::new(Arc::clone(&entry.outputs));
    if let Err(source) = entry.node.emit(&self.current, &mut outputs) {
      warn!("emit of '{}' failed: {}", entry.name, source);
      return Err(node_failure(&entry.name, source));
    }
    Ok(outputs.into_values())
  }

  /// Resolves the source of every connected input of `index`. Unconnected
  /// inputs are absent.
  fn gather(&mut self, index: usize) -> Result<Inputs, RuntimeError> {
    let count = self.sources[index].len();
    let mut values = Vec::with_capacity(count);
    for input in 0..count {
      match self.sources[index][input] {
        Some((node, output)) => {
          self.demand(node, output)?;
          values.push(self.cache[node][output].clone());
        }
        None => values.push(None),
      }
    }
    Ok(Inputs::new(Arc::clone(&self.graph.nodes[index].inputs), values))
  }
}

fn node_failure(node: &str, source: NodeError) -> RuntimeError {
  RuntimeError::Node {
    node: node.to_string(),
    source,
  }
}

impl std::fmt::Debug for Runtime {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Runtime")
      .field("name", &self.name)
      .field("state", &self.state)
      .field("ticks", &self.next_index)
      .field("graph", &self.graph)
      .finish()
  }
}
