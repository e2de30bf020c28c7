use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::config::{ConfigError, StreamConfig};
use crate::sampler;
use crate::scheduler::{Scheduler, TickFn, TimerHandle};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    #[error("invalid noise level: {0}")]
    Noise(String),
    #[error("sample at x={x} is not finite ({y})")]
    NonFinite { x: f64, y: f64 },
}

/// Generator position. `y_last` only matters for the random walk.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StreamCursor {
    pub x_current: f64,
    pub y_last: f64,
}

pub struct DataStream {
    config: Arc<StreamConfig>,
    cursor: StreamCursor,
    interval: Duration,
    timer: Option<TimerHandle>,
    rng: StdRng,
}

impl DataStream {
    pub fn new(config: StreamConfig, interval: Duration) -> Result<Self, ConfigError> {
        Self::with_rng(config, interval, StdRng::from_entropy())
    }

    pub fn with_rng(
        config: StreamConfig,
        interval: Duration,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!("DataStream initialized with config: {config}");
        Ok(Self {
            config: Arc::new(config),
            cursor: StreamCursor::default(),
            interval,
            timer: None,
            rng,
        })
    }

    pub fn config(&self) -> &Arc<StreamConfig> {
        &self.config
    }

    /// Swaps in a new configuration if it validates; otherwise the current
    /// one stays active.
    pub fn set_config(&mut self, config: StreamConfig) -> Result<(), ConfigError> {
        config.validate()?;
        info!("DataStream config updated: {config}");
        self.config = Arc::new(config);
        Ok(())
    }

    pub fn cursor(&self) -> StreamCursor {
        self.cursor
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Takes effect on the next `start`.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Registers `on_tick` with the scheduler. Returns false if already running.
    pub fn start<C, S>(&mut self, scheduler: &mut S, on_tick: TickFn<C>) -> bool
    where
        S: Scheduler<C> + ?Sized,
    {
        if self.timer.is_some() {
            return false;
        }
        self.timer = Some(scheduler.register_periodic(self.interval, on_tick));
        debug!("DataStream started (interval={} ms)", self.interval.as_millis());
        true
    }

    /// Returns false if it was not running.
    pub fn stop<C, S>(&mut self, scheduler: &mut S) -> bool
    where
        S: Scheduler<C> + ?Sized,
    {
        match self.timer.take() {
            Some(handle) => {
                scheduler.cancel(handle);
                debug!("DataStream stopped");
                true
            }
            None => false,
        }
    }

    /// Forgets the timer after its callback cancelled itself.
    pub fn halt(&mut self) {
        if self.timer.take().is_some() {
            debug!("DataStream halted");
        }
    }

    pub fn reset(&mut self) {
        self.cursor = StreamCursor::default();
        debug!("DataStream reset");
    }

    /// Produces the point at the current cursor, then advances x by `x_step`.
    /// A failed tick leaves the cursor where it was.
    pub fn tick(&mut self) -> Result<(f64, f64), StreamError> {
        let config = Arc::clone(&self.config);
        let before = self.cursor;
        let x = before.x_current;
        let y = match sampler::sample(&mut self.cursor, &config, &mut self.rng) {
            Ok(y) if y.is_finite() => y,
            Ok(y) => {
                self.cursor = before;
                return Err(StreamError::NonFinite { x, y });
            }
            Err(err) => {
                self.cursor = before;
                return Err(err);
            }
        };
        self.cursor.x_current += config.x_step;
        Ok((x, y))
    }
}
