//! Streaming Q-test over a bounded sliding window
//!
//! Values arrive one at a time. Each new value is tested against the most
//! recent `buffer_samples` accepted values; values flagged as outliers are
//! dropped from the window so they do not widen the range for later tests.

use crate::config::DetectionConfig;
use crate::dixon::{dixon_test, MAX_SAMPLE_SIZE, MIN_SAMPLE_SIZE};
use crate::error::{OutlierError, Result};
use std::collections::VecDeque;

/// Largest window with tabulated critical values in common use
pub const DEFAULT_BUFFER_SAMPLES: usize = 27;

/// Sliding-window Dixon detector
#[derive(Debug, Clone)]
pub struct WindowedDixon {
    window: VecDeque<f64>,
    buffer_samples: usize,
    confidence_level: u32,
    left: bool,
    right: bool,
}

impl WindowedDixon {
    /// Create a detector testing both tails at 95% confidence
    ///
    /// # Arguments
    /// * `buffer_samples` - Window capacity, 3..=30
    pub fn new(buffer_samples: usize) -> Result<Self> {
        Self::from_config(buffer_samples, &DetectionConfig::default())
    }

    /// Create a detector using the tails and confidence level of `config`
    pub fn from_config(buffer_samples: usize, config: &DetectionConfig) -> Result<Self> {
        if !(MIN_SAMPLE_SIZE..=MAX_SAMPLE_SIZE).contains(&buffer_samples) {
            return Err(OutlierError::InvalidConfig(format!(
                "buffer_samples must be in [{}, {}], got {}",
                MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE, buffer_samples
            )));
        }
        config.validate()?;
        Ok(Self {
            window: VecDeque::with_capacity(buffer_samples + 1),
            buffer_samples,
            confidence_level: config.confidence_level,
            left: config.left,
            right: config.right,
        })
    }

    /// Push a value and report whether it is an outlier against the window
    ///
    /// Non-finite values are never outliers and are not added to the window.
    pub fn is_outlier(&mut self, value: f64) -> Result<bool> {
        if !value.is_finite() {
            return Ok(false);
        }

        self.window.push_back(value);
        if self.window.len() > self.buffer_samples {
            self.window.pop_front();
        }
        if self.window.len() < MIN_SAMPLE_SIZE {
            return Ok(false);
        }

        let data: Vec<f64> = self.window.iter().copied().collect();
        let outcome = dixon_test(&data, self.left, self.right, self.confidence_level)?;

        if outcome.is_flagged(data.len() - 1) {
            self.window.pop_back();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Values currently held, oldest first
    pub fn window(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn buffer_samples(&self) -> usize {
        self.buffer_samples
    }

    /// Forget every buffered value
    pub fn reset(&mut self) {
        self.window.clear();
    }
}
