//! # Loop Driver
//!
//! Calls [`Runtime::tick`] on a fixed period using Tokio's timer, measuring the
//! real elapsed time between ticks.
//!
//! [`LoopDriver::run`] starts the runtime, ticks until a shutdown sink fires or
//! the tick limit is reached, then stops the runtime. A failing tick still
//! stops the runtime before its error is returned.
//!
//! ```rust,no_run
//! use blockweave::driver::LoopDriver;
//! use blockweave::nodes::{ConstantNode, ShutdownNode};
//! use blockweave::{GraphBuilder, Runtime};
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = GraphBuilder::new("once");
//! let stop = builder.add_node(ConstantNode::new(true));
//! let sink = builder.add_node(ShutdownNode::new());
//! builder.connect(sink.input(), stop.output())?;
//!
//! let mut runtime = Runtime::new(builder.build()?);
//! let report = LoopDriver::new(Duration::from_millis(5)).run(&mut runtime).await?;
//! assert!(report.shutdown);
//! # Ok(())
//! # }
//! ```

use crate::error::RuntimeError;
use crate::runtime::Runtime;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Outcome of [`LoopDriver::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverReport {
  /// Ticks resolved.
  pub ticks: u64,
  /// Whether the loop ended because a shutdown sink fired.
  pub shutdown: bool,
  /// Wall time between start and the last tick.
  pub elapsed: Duration,
}

/// Periodic driver for a [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopDriver {
  period: Duration,
  max_ticks: Option<u64>,
}

impl LoopDriver {
  /// Ticks every `period`, with no tick limit.
  pub fn new(period: Duration) -> Self {
    Self {
      period,
      max_ticks: None,
    }
  }

  /// Stops after `max_ticks` ticks even if no shutdown sink fires.
  pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
    self.max_ticks = Some(max_ticks);
    self
  }

  /// The tick period.
  pub fn period(&self) -> Duration {
    self.period
  }

  /// The tick limit, if any.
  pub fn max_ticks(&self) -> Option<u64> {
    self.max_ticks
  }

  /// Starts `runtime`, drives it until shutdown or the tick limit, and stops it.
  pub async fn run(&self, runtime: &mut Runtime) -> Result<DriverReport, RuntimeError> {
    info!(
      "LoopDriver::run(runtime={}, period={:?}, max_ticks={:?})",
      runtime.name(),
      self.period,
      self.max_ticks
    );
    runtime.start()?;

    let mut interval = tokio::time::interval(self.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started: Instant = interval.tick().await;
    let mut last = started;
    let mut report = DriverReport {
      ticks: 0,
      shutdown: false,
      elapsed: Duration::ZERO,
    };

    while self.max_ticks.is_none_or(|max| report.ticks < max) {
      let now = interval.tick().await;
      let elapsed = now.duration_since(last);
      last = now;
      match runtime.tick(elapsed) {
        Ok(shutdown) => {
          report.ticks += 1;
          report.elapsed = now.duration_since(started);
          if shutdown {
            report.shutdown = true;
            break;
          }
        }
        Err(error) => {
          warn!("LoopDriver::run(runtime={}) tick failed: {}", runtime.name(), error);
          if let Err(stop_error) = runtime.stop() {
            warn!("LoopDriver::run(runtime={}) stop failed: {}", runtime.name(), stop_error);
          }
          return Err(error);
        }
      }
    }

    debug!(
      "LoopDriver::run(runtime={}) finished: ticks={}, shutdown={}",
      runtime.name(),
      report.ticks,
      report.shutdown
    );
    runtime.stop()?;
    Ok(report)
  }
}
