use std::f64::consts::TAU;

use log::warn;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::{StreamConfig, Waveform};
use crate::stream::{StreamCursor, StreamError};

pub fn sine(x: f64, amplitude: f64, frequency: f64) -> f64 {
    amplitude * (TAU * frequency * x).sin()
}

/// `+amplitude` for the first half of each period, `-amplitude` for the second.
/// A zero frequency falls back to a period of 1.0.
pub fn square(x: f64, amplitude: f64, frequency: f64) -> f64 {
    let period = if frequency > 0.0 { 1.0 / frequency } else { 1.0 };
    let phase = x.rem_euclid(period) / period;
    if phase < 0.5 { amplitude } else { -amplitude }
}

/// Moves `y_last` by a uniform step in `[-amplitude, amplitude]` and returns it.
/// The unit draw is scaled afterwards, so huge amplitudes overflow to a
/// non-finite value instead of an invalid range.
pub fn random_walk_step<R: Rng + ?Sized>(y_last: &mut f64, amplitude: f64, rng: &mut R) -> f64 {
    if amplitude > 0.0 {
        *y_last += amplitude * rng.gen_range(-1.0..=1.0);
    }
    *y_last
}

pub fn gaussian_noise<R: Rng + ?Sized>(std_dev: f64, rng: &mut R) -> Result<f64, StreamError> {
    if std_dev == 0.0 {
        return Ok(0.0);
    }
    let normal = Normal::new(0.0, std_dev).map_err(|err| StreamError::Noise(err.to_string()))?;
    Ok(normal.sample(rng))
}

/// One noisy sample at the cursor position. Only the random walk touches the
/// cursor, through `y_last`.
pub fn sample<R: Rng + ?Sized>(
    cursor: &mut StreamCursor,
    config: &StreamConfig,
    rng: &mut R,
) -> Result<f64, StreamError> {
    let base = match &config.waveform {
        Waveform::Sine => sine(cursor.x_current, config.amplitude, config.frequency),
        Waveform::Square => square(cursor.x_current, config.amplitude, config.frequency),
        Waveform::RandomWalk => random_walk_step(&mut cursor.y_last, config.amplitude, rng),
        Waveform::Unrecognized(key) => {
            warn!("Unknown waveform type: {key}");
            0.0
        }
    };
    Ok(base + gaussian_noise(config.noise, rng)?)
}
