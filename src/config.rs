use std::fmt;

use thiserror::Error;

pub const MIN_MAX_POINTS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    RandomWalk,
    /// Identifier that did not match any known waveform, kept for diagnostics.
    Unrecognized(String),
}

impl Waveform {
    pub const ALL: [Waveform; 3] = [Waveform::Sine, Waveform::Square, Waveform::RandomWalk];

    pub fn label(&self) -> &str {
        match self {
            Waveform::Sine => "Sine",
            Waveform::Square => "Square",
            Waveform::RandomWalk => "Random walk",
            Waveform::Unrecognized(key) => key,
        }
    }

    pub fn as_key(&self) -> &str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::RandomWalk => "randomwalk",
            Waveform::Unrecognized(key) => key,
        }
    }

    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "sine" => Waveform::Sine,
            "square" => Waveform::Square,
            "randomwalk" => Waveform::RandomWalk,
            _ => Waveform::Unrecognized(key.trim().to_string()),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Waveform::Unrecognized(_))
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Amplitude must be positive.")]
    Amplitude,
    #[error("Frequency must be non-negative.")]
    Frequency,
    #[error("Noise must be non-negative.")]
    Noise,
    #[error("X-step must be positive.")]
    XStep,
    #[error("Waveform must be one of sine, square, randomwalk (got '{0}').")]
    Waveform(String),
    #[error("Max points must be at least 10.")]
    MaxPoints,
}

/// Parameters of the simulated stream. Applied as a whole and never edited
/// in place once a stream holds it.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamConfig {
    pub amplitude: f64,
    pub frequency: f64,
    pub noise: f64,
    pub x_step: f64,
    pub waveform: Waveform,
    pub max_points: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            frequency: 0.5,
            noise: 0.05,
            x_step: 0.05,
            waveform: Waveform::Sine,
            max_points: 5000,
        }
    }
}

impl StreamConfig {
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Checks every field in declaration order and reports the first failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Negated comparisons so NaN fails too.
        if !(self.amplitude > 0.0) {
            return Err(ConfigError::Amplitude);
        }
        if !(self.frequency >= 0.0) {
            return Err(ConfigError::Frequency);
        }
        if !(self.noise >= 0.0) {
            return Err(ConfigError::Noise);
        }
        if !(self.x_step > 0.0) {
            return Err(ConfigError::XStep);
        }
        if !self.waveform.is_recognized() {
            return Err(ConfigError::Waveform(self.waveform.as_key().to_string()));
        }
        if self.max_points < MIN_MAX_POINTS {
            return Err(ConfigError::MaxPoints);
        }
        Ok(())
    }
}

impl fmt::Display for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} amplitude={} frequency={}Hz noise={} x_step={} max_points={}",
            self.waveform, self.amplitude, self.frequency, self.noise, self.x_step, self.max_points
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(config: StreamConfig) -> String {
        config
            .validate()
            .expect_err("config should be rejected")
            .to_string()
            .to_lowercase()
    }

    #[test]
    fn defaults_are_valid() {
        let config = StreamConfig::defaults();
        assert_eq!(config.amplitude, 1.0);
        assert_eq!(config.frequency, 0.5);
        assert_eq!(config.noise, 0.05);
        assert_eq!(config.x_step, 0.05);
        assert_eq!(config.waveform, Waveform::Sine);
        assert_eq!(config.max_points, 5000);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_amplitude() {
        for amplitude in [0.0, -1.0, f64::NAN] {
            let config = StreamConfig {
                amplitude,
                ..StreamConfig::default()
            };
            assert!(reason(config).contains("positive"));
        }
    }

    #[test]
    fn rejects_negative_frequency_noise_and_step() {
        let frequency = StreamConfig {
            frequency: -0.5,
            ..StreamConfig::default()
        };
        assert_eq!(frequency.validate(), Err(ConfigError::Frequency));

        let noise = StreamConfig {
            noise: -0.1,
            ..StreamConfig::default()
        };
        assert_eq!(noise.validate(), Err(ConfigError::Noise));

        let step = StreamConfig {
            x_step: 0.0,
            ..StreamConfig::default()
        };
        assert!(reason(step).contains("positive"));
    }

    #[test]
    fn zero_frequency_and_noise_are_allowed() {
        let config = StreamConfig {
            frequency: 0.0,
            noise: 0.0,
            ..StreamConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_unknown_waveform() {
        let config = StreamConfig {
            waveform: Waveform::from_key("triangle"),
            ..StreamConfig::default()
        };
        assert!(reason(config).contains("waveform"));
    }

    #[test]
    fn rejects_small_buffer() {
        let config = StreamConfig {
            max_points: 9,
            ..StreamConfig::default()
        };
        assert!(reason(config).contains("max points"));

        let config = StreamConfig {
            max_points: MIN_MAX_POINTS,
            ..StreamConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn reports_first_failure_only() {
        let config = StreamConfig {
            amplitude: -1.0,
            frequency: -1.0,
            max_points: 0,
            ..StreamConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Amplitude));
    }

    #[test]
    fn waveform_keys_round_trip() {
        for waveform in Waveform::ALL {
            assert_eq!(Waveform::from_key(waveform.as_key()), waveform);
        }
        assert_eq!(Waveform::from_key(" Square "), Waveform::Square);
        assert!(!Waveform::from_key("saw").is_recognized());
    }
}
