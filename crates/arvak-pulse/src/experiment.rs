//! Experiment configuration attached to a schedule.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::channel::Channel;
use crate::error::{PulseError, PulseResult};
use crate::schedule::Schedule;

/// User overrides of local oscillator frequencies, keyed by channel.
///
/// Only drive channels (qubit LOs) and measure channels (measurement LOs)
/// carry an LO. Serialized as a map from channel name to frequency, and
/// deserialization applies the same checks as [`LoConfig::set`]:
///
/// ```
/// use arvak_pulse::{Channel, LoConfig};
///
/// let config: LoConfig = serde_json::from_str(r#"{"d1": 5.1e9, "m0": 6.9e9}"#).unwrap();
/// assert_eq!(config.get(Channel::Drive(1)), Some(5.1e9));
/// assert_eq!(
///     config.qubit_lo_freqs(&[4.9e9, 5.0e9]).unwrap(),
///     vec![4.9e9, 5.1e9],
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Channel, f64>", into = "BTreeMap<Channel, f64>")]
pub struct LoConfig {
    overrides: BTreeMap<Channel, f64>,
}

impl TryFrom<BTreeMap<Channel, f64>> for LoConfig {
    type Error = PulseError;

    fn try_from(overrides: BTreeMap<Channel, f64>) -> PulseResult<Self> {
        let mut config = Self::new();
        for (channel, frequency) in overrides {
            config.set(channel, frequency)?;
        }
        Ok(config)
    }
}

impl From<LoConfig> for BTreeMap<Channel, f64> {
    fn from(config: LoConfig) -> Self {
        config.overrides
    }
}

impl LoConfig {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override, returning the updated config.
    pub fn with(mut self, channel: Channel, frequency: f64) -> PulseResult<Self> {
        self.set(channel, frequency)?;
        Ok(self)
    }

    /// Add or replace an override.
    pub fn set(&mut self, channel: Channel, frequency: f64) -> PulseResult<()> {
        if !matches!(channel, Channel::Drive(_) | Channel::Measure(_)) {
            return Err(PulseError::InvalidChannel(format!(
                "{channel} has no local oscillator"
            )));
        }
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(PulseError::InvalidParameter(format!(
                "LO frequency of {channel} must be positive, got {frequency}"
            )));
        }
        self.overrides.insert(channel, frequency);
        Ok(())
    }

    /// Override for `channel`, if any.
    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.overrides.get(&channel).copied()
    }

    /// Check if no override is set.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Qubit LO frequencies: `defaults` with drive overrides applied.
    pub fn qubit_lo_freqs(&self, defaults: &[f64]) -> PulseResult<Vec<f64>> {
        self.replaced(defaults, |c| matches!(c, Channel::Drive(_)))
    }

    /// Measurement LO frequencies: `defaults` with measure overrides applied.
    pub fn meas_lo_freqs(&self, defaults: &[f64]) -> PulseResult<Vec<f64>> {
        self.replaced(defaults, |c| matches!(c, Channel::Measure(_)))
    }

    fn replaced(&self, defaults: &[f64], select: impl Fn(&Channel) -> bool) -> PulseResult<Vec<f64>> {
        let mut frequencies = defaults.to_vec();
        for (channel, &frequency) in self.overrides.iter().filter(|(c, _)| select(c)) {
            let len = frequencies.len();
            let slot = usize::try_from(channel.index())
                .ok()
                .and_then(|i| frequencies.get_mut(i))
                .ok_or_else(|| PulseError::LoIndexOutOfRange {
                    channel: channel.to_string(),
                    len,
                })?;
            *slot = frequency;
        }
        Ok(frequencies)
    }
}

/// A schedule bundled with its experiment configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredSchedule {
    schedule: Schedule,
    lo_config: LoConfig,
    name: Option<String>,
}

impl ConfiguredSchedule {
    /// Wrap `schedule` without overrides.
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            lo_config: LoConfig::default(),
            name: None,
        }
    }

    /// Attach LO overrides.
    #[must_use]
    pub fn with_lo_config(mut self, lo_config: LoConfig) -> Self {
        self.lo_config = lo_config;
        self
    }

    /// Name the experiment.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The schedule.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// The LO overrides.
    pub fn lo_config(&self) -> &LoConfig {
        &self.lo_config
    }

    /// Experiment name, falling back to the schedule's.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().or_else(|| self.schedule.name())
    }
}
