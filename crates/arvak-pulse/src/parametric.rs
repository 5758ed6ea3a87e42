//! Analytic pulse shapes described by named parameters.
//!
//! A [`ParametricPulse`] records its shape and parameter values and checks
//! the shape's constraints when it is built. Parameters are looked up by
//! name through [`ParametricPulse::parameter`], in the fixed order
//! `duration`, `amp`, then the shape parameters.
//!
//! ```
//! use arvak_pulse::{ParameterValue, ParametricPulse};
//! use num_complex::Complex64;
//!
//! let pulse = ParametricPulse::gaussian(160, Complex64::new(0.2, 0.0), 40.0).unwrap();
//! assert_eq!(pulse.parameter("sigma").unwrap(), ParameterValue::Real(40.0));
//! assert!(pulse.parameter("beta").is_err());
//! ```

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PulseError, PulseResult};

/// Shape of a parametric pulse together with its shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PulseShape {
    /// Lifted Gaussian centred in the pulse window.
    Gaussian { sigma: f64 },
    /// Flat top of length `width` with Gaussian rise and fall.
    GaussianSquare { sigma: f64, width: f64 },
    /// Gaussian with a derivative correction scaled by `beta`.
    Drag { sigma: f64, beta: f64 },
    /// Flat pulse at `amp`.
    Constant,
}

impl PulseShape {
    /// Name of the shape.
    pub fn pulse_type(&self) -> &'static str {
        match self {
            PulseShape::Gaussian { .. } => "Gaussian",
            PulseShape::GaussianSquare { .. } => "GaussianSquare",
            PulseShape::Drag { .. } => "Drag",
            PulseShape::Constant => "Constant",
        }
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        match *self {
            PulseShape::Gaussian { sigma } => vec![("sigma", sigma)],
            PulseShape::GaussianSquare { sigma, width } => vec![("sigma", sigma), ("width", width)],
            PulseShape::Drag { sigma, beta } => vec![("sigma", sigma), ("beta", beta)],
            PulseShape::Constant => Vec::new(),
        }
    }
}

/// How the flat top of a Gaussian-square pulse is specified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GaussianSquareWidth {
    /// Length of the flat top.
    Width(f64),
    /// Length of each flank in units of sigma; the width is what remains.
    RisefallSigmaRatio(f64),
}

/// A parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    /// The pulse length in samples.
    Duration(u32),
    /// The complex amplitude.
    Amplitude(Complex64),
    /// A real shape parameter.
    Real(f64),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Duration(d) => write!(f, "{d}"),
            ParameterValue::Amplitude(a) => write!(f, "{a}"),
            ParameterValue::Real(v) => write!(f, "{v}"),
        }
    }
}

/// A pulse defined by its shape and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametricPulse {
    shape: PulseShape,
    duration: u32,
    amp: Complex64,
    name: Option<String>,
    limit_amplitude: bool,
}

impl ParametricPulse {
    /// Create a pulse, enforcing `|amp| <= 1`.
    pub fn new(shape: PulseShape, duration: u32, amp: Complex64) -> PulseResult<Self> {
        Self::build(shape, duration, amp, true)
    }

    /// Create a pulse without the amplitude limit.
    pub fn without_amplitude_limit(
        shape: PulseShape,
        duration: u32,
        amp: Complex64,
    ) -> PulseResult<Self> {
        Self::build(shape, duration, amp, false)
    }

    /// Gaussian pulse.
    pub fn gaussian(duration: u32, amp: Complex64, sigma: f64) -> PulseResult<Self> {
        Self::new(PulseShape::Gaussian { sigma }, duration, amp)
    }

    /// Gaussian-square pulse.
    pub fn gaussian_square(
        duration: u32,
        amp: Complex64,
        sigma: f64,
        flat_top: GaussianSquareWidth,
    ) -> PulseResult<Self> {
        let width = match flat_top {
            GaussianSquareWidth::Width(width) => width,
            GaussianSquareWidth::RisefallSigmaRatio(ratio) => {
                f64::from(duration) - 2.0 * ratio * sigma
            }
        };
        Self::new(PulseShape::GaussianSquare { sigma, width }, duration, amp)
    }

    /// DRAG pulse.
    pub fn drag(duration: u32, amp: Complex64, sigma: f64, beta: f64) -> PulseResult<Self> {
        Self::new(PulseShape::Drag { sigma, beta }, duration, amp)
    }

    /// Constant pulse.
    pub fn constant(duration: u32, amp: Complex64) -> PulseResult<Self> {
        Self::new(PulseShape::Constant, duration, amp)
    }

    /// Attach a name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn build(
        shape: PulseShape,
        duration: u32,
        amp: Complex64,
        limit_amplitude: bool,
    ) -> PulseResult<Self> {
        let pulse = Self {
            shape,
            duration,
            amp,
            name: None,
            limit_amplitude,
        };
        pulse.validate()?;
        Ok(pulse)
    }

    fn validate(&self) -> PulseResult<()> {
        if !self.amp.is_finite() || self.shape.parameters().iter().any(|(_, v)| !v.is_finite()) {
            return Err(PulseError::InvalidParameter(format!(
                "parameters of {} must be finite: {}",
                self.pulse_type(),
                self.parameter_repr()
            )));
        }

        let violated = match self.shape {
            PulseShape::Gaussian { sigma } | PulseShape::Drag { sigma, .. } => {
                (sigma <= 0.0).then_some("sigma > 0")
            }
            PulseShape::GaussianSquare { sigma, width } => {
                if sigma <= 0.0 {
                    Some("sigma > 0")
                } else if width < 0.0 {
                    Some("width >= 0")
                } else if width > f64::from(self.duration) {
                    Some("duration >= width")
                } else {
                    None
                }
            }
            PulseShape::Constant => None,
        };
        if let Some(constraint) = violated {
            return Err(PulseError::InvalidParameter(format!(
                "Assigned parameters {} violate following constraint: {constraint}",
                self.parameter_repr()
            )));
        }

        if self.limit_amplitude && self.amp.norm() > 1.0 {
            return Err(PulseError::AmplitudeLimit {
                parameters: self.parameter_repr(),
            });
        }
        Ok(())
    }

    /// Name of the shape.
    pub fn pulse_type(&self) -> &'static str {
        self.shape.pulse_type()
    }

    /// The shape and its parameters.
    pub fn shape(&self) -> &PulseShape {
        &self.shape
    }

    /// Pulse length in samples.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Complex amplitude.
    pub fn amp(&self) -> Complex64 {
        self.amp
    }

    /// Optional name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether `|amp| <= 1` is enforced.
    pub fn limit_amplitude(&self) -> bool {
        self.limit_amplitude
    }

    /// All parameters in order: `duration`, `amp`, then the shape's.
    pub fn parameters(&self) -> Vec<(&'static str, ParameterValue)> {
        let mut params = vec![
            ("duration", ParameterValue::Duration(self.duration)),
            ("amp", ParameterValue::Amplitude(self.amp)),
        ];
        params.extend(
            self.shape
                .parameters()
                .into_iter()
                .map(|(name, value)| (name, ParameterValue::Real(value))),
        );
        params
    }

    /// Look up a parameter by name.
    pub fn parameter(&self, name: &str) -> PulseResult<ParameterValue> {
        self.parameters()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
            .ok_or_else(|| PulseError::UnknownParameter {
                pulse_type: self.pulse_type().to_string(),
                name: name.to_string(),
            })
    }

    /// Flank length of a Gaussian-square pulse in units of sigma.
    pub fn risefall_sigma_ratio(&self) -> Option<f64> {
        match self.shape {
            PulseShape::GaussianSquare { sigma, width } => {
                Some((f64::from(self.duration) - width) / (2.0 * sigma))
            }
            _ => None,
        }
    }

    fn parameter_repr(&self) -> String {
        self.parameters()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ParametricPulse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}", self.pulse_type(), self.parameter_repr())?;
        if let Some(name) = &self.name {
            write!(f, ", name='{name}'")?;
        }
        write!(f, ")")
    }
}
