use std::time::Duration;

use log::{error, info, warn};

use crate::config::{ConfigError, StreamConfig};
use crate::dataset::Dataset;
use crate::scheduler::{Scheduler, TickFlow, TickFn};
use crate::stream::{DataStream, StreamError};

/// Everything the dashboard shows: the generator, the dataset it fills and
/// whether collection is running.
pub struct AppState {
    stream: DataStream,
    dataset: Dataset,
    running: bool,
    last_fault: Option<StreamError>,
}

impl AppState {
    pub fn new(config: StreamConfig, interval: Duration) -> Result<Self, ConfigError> {
        Ok(Self::from_stream(DataStream::new(config, interval)?))
    }

    pub fn from_stream(stream: DataStream) -> Self {
        let dataset = Dataset::new(stream.config().max_points);
        Self {
            stream,
            dataset,
            running: false,
            last_fault: None,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        self.stream.config()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    pub fn stream(&self) -> &DataStream {
        &self.stream
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_fault(&self) -> Option<&StreamError> {
        self.last_fault.as_ref()
    }

    pub fn start<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler<AppState> + ?Sized,
    {
        self.last_fault = None;
        if self.stream.start(scheduler, tick_callback()) {
            info!("Data stream started");
        }
        self.running = true;
    }

    pub fn resume<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler<AppState> + ?Sized,
    {
        self.start(scheduler);
    }

    pub fn pause<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler<AppState> + ?Sized,
    {
        if self.stream.stop::<AppState, _>(scheduler) {
            info!("Data stream paused");
        }
        self.running = false;
    }

    /// Stops collection, drops every point and rewinds the cursor.
    pub fn clear<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler<AppState> + ?Sized,
    {
        self.pause(scheduler);
        self.dataset.clear();
        self.stream.reset();
        info!("Dataset cleared");
    }

    pub fn apply_config(&mut self, config: StreamConfig) -> Result<(), ConfigError> {
        let max_points = config.max_points;
        if let Err(err) = self.stream.set_config(config) {
            error!("Configuration validation failed: {err}");
            return Err(err);
        }
        self.dataset.set_max_points(max_points);
        info!("Configuration applied: {}", self.stream.config());
        Ok(())
    }

    pub fn reset_config(&mut self) {
        if let Err(err) = self.apply_config(StreamConfig::defaults()) {
            // Defaults always validate.
            warn!("Default configuration rejected: {err}");
            return;
        }
        info!("Configuration reset to defaults");
    }

    pub fn set_interval<S>(&mut self, interval: Duration, scheduler: &mut S)
    where
        S: Scheduler<AppState> + ?Sized,
    {
        self.stream.set_interval(interval);
        if self.stream.is_active() {
            self.stream.stop::<AppState, _>(scheduler);
            self.stream.start(scheduler, tick_callback());
        }
    }

    /// Replaces the dataset with loaded points and leaves the stream paused.
    pub fn load_points<S, I>(&mut self, points: I, scheduler: &mut S)
    where
        S: Scheduler<AppState> + ?Sized,
        I: IntoIterator<Item = (f64, f64)>,
    {
        self.clear(scheduler);
        for (x, y) in points {
            self.dataset.add_point(x, y);
        }
        info!("Loaded {} points into dataset", self.dataset.point_count());
    }

    /// Timer callback. A failing tick stops the stream instead of
    /// propagating.
    pub fn tick(&mut self) -> TickFlow {
        match self.stream.tick() {
            Ok((x, y)) => {
                self.dataset.add_point(x, y);
                TickFlow::Continue
            }
            Err(err) => {
                error!("Data stream tick failed, stopping: {err}");
                self.stream.halt();
                self.running = false;
                self.last_fault = Some(err);
                TickFlow::Cancel
            }
        }
    }
}

fn tick_callback() -> TickFn<AppState> {
    Box::new(AppState::tick)
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", self.stream.config())
            .field("dataset_points", &self.dataset.point_count())
            .field("running", &self.running)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::config::Waveform;
    use crate::scheduler::FrameClock;
    use crate::stream::DEFAULT_INTERVAL;

    const STEP: Duration = DEFAULT_INTERVAL;

    fn state(config: StreamConfig) -> AppState {
        let stream = DataStream::with_rng(config, DEFAULT_INTERVAL, StdRng::seed_from_u64(11))
            .expect("valid config");
        AppState::from_stream(stream)
    }

    fn run(clock: &mut FrameClock<AppState>, state: &mut AppState, t0: Instant, ticks: u32) {
        for i in 1..=ticks {
            clock.advance(t0 + STEP * i, state);
        }
    }

    #[test]
    fn ticks_fill_dataset_while_running() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0);
        let mut app = state(StreamConfig::default());

        app.start(&mut clock);
        assert!(app.is_running());
        run(&mut clock, &mut app, t0, 5);
        assert_eq!(app.dataset().point_count(), 5);
        assert_eq!(app.dataset().x_values()[0], 0.0);

        app.pause(&mut clock);
        assert!(!app.is_running());
        clock.advance(t0 + STEP * 20, &mut app);
        assert_eq!(app.dataset().point_count(), 5);
    }

    #[test]
    fn resume_continues_from_cursor() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0);
        let mut app = state(StreamConfig::default());

        app.start(&mut clock);
        run(&mut clock, &mut app, t0, 3);
        app.pause(&mut clock);
        app.resume(&mut clock);
        app.resume(&mut clock);
        assert_eq!(clock.active_timers(), 1);
        clock.advance(t0 + STEP * 4, &mut app);

        let (x, _) = app.dataset().last_point().expect("point");
        assert!((x - 0.15).abs() < 1e-12);
    }

    #[test]
    fn clear_resets_everything() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0);
        let mut app = state(StreamConfig::default());

        app.start(&mut clock);
        run(&mut clock, &mut app, t0, 4);
        app.clear(&mut clock);

        assert!(app.dataset().is_empty());
        assert!(!app.is_running());
        assert_eq!(app.stream().cursor().x_current, 0.0);
        assert_eq!(clock.active_timers(), 0);
    }

    #[test]
    fn buffer_never_exceeds_max_points() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0);
        let mut app = state(StreamConfig {
            max_points: 10,
            ..StreamConfig::default()
        });

        app.start(&mut clock);
        run(&mut clock, &mut app, t0, 30);
        assert_eq!(app.dataset().point_count(), 10);
        let first = app.dataset().x_values()[0];
        assert!((first - 20.0 * 0.05).abs() < 1e-9);
    }

    #[test]
    fn invalid_config_is_rejected_wholesale() {
        let mut app = state(StreamConfig::default());
        let bad = StreamConfig {
            amplitude: 3.0,
            max_points: 5,
            ..StreamConfig::default()
        };
        assert_eq!(app.apply_config(bad), Err(ConfigError::MaxPoints));
        assert_eq!(app.config(), &StreamConfig::default());
        assert_eq!(app.dataset().max_points(), 5000);
    }

    #[test]
    fn applied_config_resizes_dataset() {
        let mut app = state(StreamConfig::default());
        for i in 0..100 {
            app.dataset_mut().add_point(i as f64, 0.0);
        }
        let smaller = StreamConfig {
            max_points: 40,
            waveform: Waveform::Square,
            ..StreamConfig::default()
        };
        app.apply_config(smaller).unwrap();
        assert_eq!(app.dataset().point_count(), 40);
        assert_eq!(app.config().waveform, Waveform::Square);

        app.reset_config();
        assert_eq!(app.config(), &StreamConfig::default());
        assert_eq!(app.dataset().max_points(), 5000);
    }

    #[test]
    fn load_points_replaces_and_pauses() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0);
        let mut app = state(StreamConfig::default());
        app.start(&mut clock);
        run(&mut clock, &mut app, t0, 3);

        app.load_points(vec![(0.1, 1.1), (0.2, 2.2)], &mut clock);
        assert!(!app.is_running());
        assert_eq!(app.dataset().points().collect::<Vec<_>>(), vec![(0.1, 1.1), (0.2, 2.2)]);
        assert_eq!(clock.active_timers(), 0);
    }

    #[test]
    fn faulting_tick_stops_stream() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0);
        let mut app = state(StreamConfig {
            amplitude: 1e308,
            noise: 1e308,
            waveform: Waveform::Square,
            ..StreamConfig::default()
        });

        app.start(&mut clock);
        run(&mut clock, &mut app, t0, 1_000);
        assert!(!app.is_running());
        assert!(!app.stream().is_active());
        assert!(matches!(app.last_fault(), Some(StreamError::NonFinite { .. })));
        assert_eq!(clock.active_timers(), 0);

        // Restart clears the fault.
        app.apply_config(StreamConfig::default()).unwrap();
        app.start(&mut clock);
        assert!(app.last_fault().is_none());
        assert_eq!(clock.active_timers(), 1);
    }

    #[test]
    fn random_walk_overflow_stops_stream() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0);
        let mut app = state(StreamConfig {
            amplitude: f64::INFINITY,
            noise: 0.0,
            waveform: Waveform::RandomWalk,
            ..StreamConfig::default()
        });

        app.start(&mut clock);
        run(&mut clock, &mut app, t0, 3);
        assert!(!app.is_running());
        assert!(app.dataset().is_empty());
        assert!(matches!(app.last_fault(), Some(StreamError::NonFinite { .. })));
        assert_eq!(clock.active_timers(), 0);
    }

    #[test]
    fn interval_change_rearms_running_timer() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0);
        let mut app = state(StreamConfig::default());
        app.start(&mut clock);
        app.set_interval(Duration::from_millis(20), &mut clock);
        assert_eq!(clock.active_timers(), 1);
        assert_eq!(clock.next_deadline(), Some(t0 + Duration::from_millis(20)));
    }
}
