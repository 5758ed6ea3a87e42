//! Error types for pulse scheduling.

use thiserror::Error;

use crate::interval::Interval;

/// Errors that can occur while building or placing pulse schedules.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PulseError {
    /// Two timeslots on the same channel overlap.
    #[error("Cannot create occupancy from overlapping timeslots: {first} and {second}")]
    OverlappingTimeslots { first: Interval, second: Interval },

    /// Occupancies only move forward in time.
    #[error("Cannot shift occupancy by negative time: {time}")]
    NegativeShift { time: i64 },

    /// A time computation left the representable range.
    #[error("Time {time} is out of the representable range")]
    TimeOverflow { time: i64 },

    /// The component overlaps something already placed.
    #[error("Fail to insert {component} at {time} due to overlap")]
    InsertConflict { component: String, time: i64 },

    /// The component could not be placed after the last instruction.
    #[error("Fail to append {component} due to overlap")]
    AppendConflict { component: String },

    /// A schedule was inserted into itself.
    #[error("Cannot insert self to avoid infinite recursion")]
    SelfInsertion,

    /// Schedules of schedules are not supported.
    #[error("This version doesn't support schedule of schedules")]
    NestedSchedule,

    /// The command cannot be played on the channel.
    #[error("{command} is not supported on {channel}")]
    UnsupportedCommand { command: String, channel: String },

    /// Register slots given for an acquisition do not match its qubits.
    #[error("#reg_slots must be equal to #qubits ({reg_slots} != {qubits})")]
    RegisterSlotMismatch { qubits: usize, reg_slots: usize },

    /// A channel name could not be parsed.
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    /// The pulse has no parameter with that name.
    #[error("'{name}' is not a parameter of {pulse_type}")]
    UnknownParameter { pulse_type: String, name: String },

    /// Pulse parameters violate a constraint of the pulse shape.
    #[error("Invalid pulse parameter: {0}")]
    InvalidParameter(String),

    /// The pulse amplitude exceeds 1.0 while the limit is enabled.
    #[error(
        "Maximum pulse amplitude norm exceeds 1.0 with assigned parameters {parameters}. \
         This can be overruled by disabling the amplitude limit."
    )]
    AmplitudeLimit { parameters: String },

    /// An LO override addresses a channel beyond the default table.
    #[error("LO override for {channel} is out of range for {len} default frequencies")]
    LoIndexOutOfRange { channel: String, len: usize },
}

/// Result type for pulse scheduling operations.
pub type PulseResult<T> = Result<T, PulseError>;
