//! Physical channels that pulse instructions are played on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::command::Command;
use crate::error::PulseError;

/// A logical resource on which time windows are committed.
///
/// Channels print and parse as a prefix plus index (`d0`, `u3`, `m1`,
/// `a0`, `s2`, `c2`), which is also their serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Channel {
    /// Qubit drive line.
    Drive(u32),
    /// Control line for cross-resonance style drives.
    Control(u32),
    /// Measurement stimulus line.
    Measure(u32),
    /// Acquisition of a qubit's readout signal.
    Acquire(u32),
    /// Classical memory slot receiving acquisition results.
    MemorySlot(u32),
    /// Classical register slot for fast feedback.
    RegisterSlot(u32),
}

impl Channel {
    /// Index of the channel within its kind.
    pub fn index(&self) -> u32 {
        match *self {
            Channel::Drive(i)
            | Channel::Control(i)
            | Channel::Measure(i)
            | Channel::Acquire(i)
            | Channel::MemorySlot(i)
            | Channel::RegisterSlot(i) => i,
        }
    }

    /// Short name prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            Channel::Drive(_) => "d",
            Channel::Control(_) => "u",
            Channel::Measure(_) => "m",
            Channel::Acquire(_) => "a",
            Channel::MemorySlot(_) => "s",
            Channel::RegisterSlot(_) => "c",
        }
    }

    /// Check whether waveforms are emitted on this channel.
    pub fn is_output(&self) -> bool {
        matches!(
            self,
            Channel::Drive(_) | Channel::Control(_) | Channel::Measure(_)
        )
    }

    /// Check whether `command` can be placed on this channel.
    ///
    /// Output channels take waveforms and frame updates; acquisition
    /// channels and classical slots take acquisitions only.
    pub fn supports(&self, command: &Command) -> bool {
        if self.is_output() {
            matches!(
                command,
                Command::Sample(_)
                    | Command::Parametric(_)
                    | Command::FrameChange { .. }
                    | Command::PersistentValue { .. }
            )
        } else {
            matches!(command, Command::Acquire(_))
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix(), self.index())
    }
}

impl FromStr for Channel {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PulseError::InvalidChannel(s.to_string());
        let mut chars = s.chars();
        let prefix = chars.next().ok_or_else(invalid)?;
        let index: u32 = chars.as_str().parse().map_err(|_| invalid())?;

        match prefix {
            'd' => Ok(Channel::Drive(index)),
            'u' => Ok(Channel::Control(index)),
            'm' => Ok(Channel::Measure(index)),
            'a' => Ok(Channel::Acquire(index)),
            's' => Ok(Channel::MemorySlot(index)),
            'c' => Ok(Channel::RegisterSlot(index)),
            _ => Err(invalid()),
        }
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.to_string()
    }
}

impl TryFrom<String> for Channel {
    type Error = PulseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
