//! Channel samplers
//!
//! A sampler produces one [`ChannelReading`] per tick. The engine depends only on
//! the [`ChannelSampler`] trait, so a hardware driver can replace the synthetic
//! generator without touching anything downstream.

use crate::types::{ChannelReading, ForceSample, SensorSample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Trait for per-tick channel sources
pub trait ChannelSampler: Send {
    /// Produce this tick's reading, or `None` when nothing is available
    fn sample(&mut self) -> Option<ChannelReading>;
}

impl<S: ChannelSampler + ?Sized> ChannelSampler for Box<S> {
    fn sample(&mut self) -> Option<ChannelReading> {
        (**self).sample()
    }
}

/// Synthetic angular-rate and force generator.
///
/// Each axis follows its own periodic signal with additive uniform noise so the
/// three axes stay visibly decorrelated:
///
/// ```text
/// x = sin(t / 1000) * 30 + U(0, 20)
/// y = cos(t / 1000) * 25 + U(0, 15)
/// z = sin(t /  800) * 20 + U(0, 10)
/// force = 50 + U(0, 40)
/// ```
///
/// `t` is the generator's elapsed time in milliseconds, advanced by one tick
/// period per call.
pub struct SyntheticSampler {
    rng: StdRng,
    elapsed_ms: u64,
    tick_period_ms: u64,
}

impl SyntheticSampler {
    /// Create a generator seeded from OS entropy
    pub fn new(tick_period_ms: u64) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            elapsed_ms: 0,
            tick_period_ms,
        }
    }

    /// Create a deterministic generator
    pub fn with_seed(tick_period_ms: u64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            elapsed_ms: 0,
            tick_period_ms,
        }
    }

    fn angular_rate_at(&mut self, t: f64) -> SensorSample {
        SensorSample {
            x: (t / 1000.0).sin() * 30.0 + self.rng.random::<f64>() * 20.0,
            y: (t / 1000.0).cos() * 25.0 + self.rng.random::<f64>() * 15.0,
            z: (t / 800.0).sin() * 20.0 + self.rng.random::<f64>() * 10.0,
        }
    }

    fn force(&mut self) -> ForceSample {
        ForceSample(50.0 + self.rng.random::<f64>() * 40.0)
    }
}

impl ChannelSampler for SyntheticSampler {
    fn sample(&mut self) -> Option<ChannelReading> {
        self.elapsed_ms += self.tick_period_ms;
        let t = self.elapsed_ms as f64;
        let angular_rate = self.angular_rate_at(t);
        let force = self.force();
        Some(ChannelReading::new(angular_rate, force))
    }
}

/// Sampler that plays back a fixed sequence of readings.
///
/// A `None` entry stands for a tick with no sample. Once the queue is exhausted
/// every further call returns `None`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSampler {
    readings: VecDeque<Option<ChannelReading>>,
}

impl ScriptedSampler {
    pub fn new(readings: impl IntoIterator<Item = Option<ChannelReading>>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.readings.len()
    }
}

impl ChannelSampler for ScriptedSampler {
    fn sample(&mut self) -> Option<ChannelReading> {
        self.readings.pop_front().flatten()
    }
}
