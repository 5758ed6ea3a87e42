//! Pulse commands: what an instruction does on its channels.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{PulseError, PulseResult};
use crate::parametric::ParametricPulse;

/// An arbitrary waveform given sample by sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePulse {
    name: String,
    samples: Vec<Complex64>,
}

impl SamplePulse {
    /// Create a sample pulse with a generated unique name.
    pub fn new(samples: impl Into<Vec<Complex64>>) -> PulseResult<Self> {
        let name = format!("pulse_object_{}", Uuid::new_v4().simple());
        Self::named(name, samples)
    }

    /// Create a sample pulse with the given name.
    pub fn named(name: impl Into<String>, samples: impl Into<Vec<Complex64>>) -> PulseResult<Self> {
        let samples: Vec<Complex64> = samples.into();
        if u32::try_from(samples.len()).is_err() {
            return Err(PulseError::InvalidParameter(format!(
                "sample pulse with {} samples exceeds the maximum duration",
                samples.len()
            )));
        }
        Ok(Self {
            name: name.into(),
            samples,
        })
    }

    /// Name of the pulse.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The samples.
    pub fn samples(&self) -> &[Complex64] {
        &self.samples
    }

    /// Number of samples.
    pub fn duration(&self) -> u32 {
        // Bounded at construction.
        u32::try_from(self.samples.len()).unwrap_or(u32::MAX)
    }
}

/// Measurement acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acquire {
    duration: u32,
    discriminator: Option<String>,
    kernel: Option<String>,
}

impl Acquire {
    /// Acquire for `duration` samples with the backend defaults.
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            discriminator: None,
            kernel: None,
        }
    }

    /// Select a discriminator by name.
    #[must_use]
    pub fn with_discriminator(mut self, name: impl Into<String>) -> Self {
        self.discriminator = Some(name.into());
        self
    }

    /// Select an integration kernel by name.
    #[must_use]
    pub fn with_kernel(mut self, name: impl Into<String>) -> Self {
        self.kernel = Some(name.into());
        self
    }

    /// Acquisition length.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Discriminator name, if any.
    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator.as_deref()
    }

    /// Kernel name, if any.
    pub fn kernel(&self) -> Option<&str> {
        self.kernel.as_deref()
    }
}

/// What an instruction does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Play a sampled waveform.
    Sample(SamplePulse),
    /// Play an analytic waveform.
    Parametric(ParametricPulse),
    /// Shift the channel's frame by `phase` radians. Instantaneous.
    FrameChange { phase: f64 },
    /// Hold the output at `value` until the next command. Instantaneous.
    PersistentValue { value: Complex64 },
    /// Acquire measurement data.
    Acquire(Acquire),
    /// Ask a simulator to record its state. Uses no channel.
    Snapshot { label: String, snap_type: String },
}

impl Command {
    /// Number of samples the command occupies its channels for.
    pub fn duration(&self) -> u32 {
        match self {
            Command::Sample(pulse) => pulse.duration(),
            Command::Parametric(pulse) => pulse.duration(),
            Command::Acquire(acquire) => acquire.duration(),
            Command::FrameChange { .. }
            | Command::PersistentValue { .. }
            | Command::Snapshot { .. } => 0,
        }
    }

    /// Short name of the command.
    pub fn name(&self) -> &str {
        match self {
            Command::Sample(pulse) => pulse.name(),
            Command::Parametric(pulse) => pulse.name().unwrap_or(pulse.pulse_type()),
            Command::FrameChange { .. } => "fc",
            Command::PersistentValue { .. } => "pv",
            Command::Acquire(_) => "acquire",
            Command::Snapshot { label, .. } => label,
        }
    }
}

impl From<SamplePulse> for Command {
    fn from(pulse: SamplePulse) -> Self {
        Command::Sample(pulse)
    }
}

impl From<ParametricPulse> for Command {
    fn from(pulse: ParametricPulse) -> Self {
        Command::Parametric(pulse)
    }
}

impl From<Acquire> for Command {
    fn from(acquire: Acquire) -> Self {
        Command::Acquire(acquire)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Sample(pulse) => {
                write!(f, "SamplePulse({}, duration={})", pulse.name(), pulse.duration())
            }
            Command::Parametric(pulse) => write!(f, "{pulse}"),
            Command::FrameChange { phase } => write!(f, "FrameChange(phase={phase:.3})"),
            Command::PersistentValue { value } => write!(f, "PersistentValue(value={value})"),
            Command::Acquire(acquire) => write!(f, "Acquire(duration={})", acquire.duration()),
            Command::Snapshot { label, snap_type } => {
                write!(f, "Snapshot({label}, type={snap_type})")
            }
        }
    }
}
