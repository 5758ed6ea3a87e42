//! Instructions: a command bound to the channels it occupies.

use num_complex::Complex64;
use std::fmt;

use crate::channel::Channel;
use crate::command::{Acquire, Command};
use crate::error::{PulseError, PulseResult};
use crate::interval::{Interval, Timeslot};
use crate::occupancy::Occupancy;

/// Anything that can be placed in a schedule.
pub trait Schedulable {
    /// Time from the component's begin to its end.
    fn duration(&self) -> i64;

    /// Timeslots the component occupies, relative to its own begin time.
    fn occupancy(&self) -> &Occupancy;
}

/// A command placed on a set of channels at a relative begin time.
#[derive(Debug, Clone)]
pub struct Instruction {
    command: Command,
    channels: Vec<Channel>,
    begin_time: i64,
    occupancy: Occupancy,
}

impl Instruction {
    /// Bind `command` to `channels`, starting at time 0.
    ///
    /// Every channel must support the command, and one instruction cannot
    /// occupy a channel twice.
    pub fn new(command: Command, channels: Vec<Channel>) -> PulseResult<Self> {
        if let Some(channel) = channels.iter().find(|c| !c.supports(&command)) {
            return Err(PulseError::UnsupportedCommand {
                command: command.to_string(),
                channel: channel.to_string(),
            });
        }

        let window = Interval::new(0, command.duration());
        let occupancy = Occupancy::new(channels.iter().map(|&c| Timeslot::new(window, c)))?;

        Ok(Self {
            command,
            channels,
            begin_time: 0,
            occupancy,
        })
    }

    /// Play a waveform on an output channel.
    pub fn play(pulse: impl Into<Command>, channel: Channel) -> PulseResult<Self> {
        Self::new(pulse.into(), vec![channel])
    }

    /// Shift the frame of an output channel.
    pub fn frame_change(phase: f64, channel: Channel) -> PulseResult<Self> {
        Self::new(Command::FrameChange { phase }, vec![channel])
    }

    /// Hold an output channel at `value`.
    pub fn persistent_value(value: Complex64, channel: Channel) -> PulseResult<Self> {
        Self::new(Command::PersistentValue { value }, vec![channel])
    }

    /// Acquire `qubits` into `mem_slots` and, optionally, `reg_slots`.
    ///
    /// When register slots are given there must be one per qubit.
    pub fn acquire(
        acquire: Acquire,
        qubits: &[u32],
        mem_slots: &[u32],
        reg_slots: &[u32],
    ) -> PulseResult<Self> {
        if !reg_slots.is_empty() && reg_slots.len() != qubits.len() {
            return Err(PulseError::RegisterSlotMismatch {
                qubits: qubits.len(),
                reg_slots: reg_slots.len(),
            });
        }

        let channels = qubits
            .iter()
            .map(|&q| Channel::Acquire(q))
            .chain(mem_slots.iter().map(|&m| Channel::MemorySlot(m)))
            .chain(reg_slots.iter().map(|&r| Channel::RegisterSlot(r)))
            .collect();
        Self::new(Command::Acquire(acquire), channels)
    }

    /// A simulator snapshot; occupies no channel.
    pub fn snapshot(label: impl Into<String>, snap_type: impl Into<String>) -> PulseResult<Self> {
        Self::new(
            Command::Snapshot {
                label: label.into(),
                snap_type: snap_type.into(),
            },
            Vec::new(),
        )
    }

    /// The command.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Channels, in the order given.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Begin time relative to the parent schedule.
    pub fn begin_time(&self) -> i64 {
        self.begin_time
    }

    /// End time relative to the parent schedule.
    pub fn end_time(&self) -> i64 {
        self.begin_time
            .saturating_add(i64::from(self.command.duration()))
    }

    /// The same instruction starting `time` later.
    ///
    /// Fails if the begin or end time leaves the `i64` range.
    pub fn shifted(&self, time: i64) -> PulseResult<Self> {
        let begin_time = self
            .begin_time
            .checked_add(time)
            .filter(|begin| begin.checked_add(i64::from(self.command.duration())).is_some())
            .ok_or(PulseError::TimeOverflow { time })?;
        Ok(Self {
            begin_time,
            ..self.clone()
        })
    }

    /// Like [`Instruction::shifted`], saturating instead of failing.
    pub(crate) fn saturating_shifted(&self, time: i64) -> Self {
        Self {
            begin_time: self.begin_time.saturating_add(time),
            ..self.clone()
        }
    }
}

impl Schedulable for Instruction {
    fn duration(&self) -> i64 {
        i64::from(self.command.duration())
    }

    fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:4}: {}", self.begin_time, self.command)?;
        if !self.channels.is_empty() {
            let channels: Vec<String> = self.channels.iter().map(ToString::to_string).collect();
            write!(f, " -> {}", channels.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SamplePulse;

    #[test]
    fn test_play_occupies_channel() {
        let pulse = SamplePulse::named("p", vec![Complex64::new(0.1, 0.0); 20]).unwrap();
        let instr = Instruction::play(pulse, Channel::Drive(0)).unwrap();

        assert_eq!(instr.duration(), 20);
        assert_eq!(
            instr.occupancy().intervals(&Channel::Drive(0)),
            [Interval::new(0, 20)]
        );
        assert_eq!(instr.to_string(), "   0: SamplePulse(p, duration=20) -> d0");
    }

    #[test]
    fn test_unsupported_channel() {
        let err = Instruction::frame_change(0.5, Channel::MemorySlot(0)).unwrap_err();
        assert_eq!(err.to_string(), "FrameChange(phase=0.500) is not supported on s0");
    }

    #[test]
    fn test_acquire_channels() {
        let instr = Instruction::acquire(Acquire::new(10), &[0, 1], &[0, 1], &[2, 3]).unwrap();
        assert_eq!(
            instr.channels(),
            [
                Channel::Acquire(0),
                Channel::Acquire(1),
                Channel::MemorySlot(0),
                Channel::MemorySlot(1),
                Channel::RegisterSlot(2),
                Channel::RegisterSlot(3),
            ]
        );
        assert_eq!(instr.occupancy().len(), 6);
    }

    #[test]
    fn test_acquire_register_slot_mismatch() {
        let err = Instruction::acquire(Acquire::new(10), &[0, 1], &[0, 1], &[0]).unwrap_err();
        assert!(matches!(
            err,
            PulseError::RegisterSlotMismatch {
                qubits: 2,
                reg_slots: 1
            }
        ));
    }

    #[test]
    fn test_duplicate_channel_rejected() {
        let err = Instruction::acquire(Acquire::new(10), &[0, 0], &[0, 1], &[]).unwrap_err();
        assert!(matches!(err, PulseError::OverlappingTimeslots { .. }));
    }

    #[test]
    fn test_snapshot_has_no_channels() {
        let instr = Instruction::snapshot("label", "statevector").unwrap();
        assert!(instr.occupancy().is_empty());
        assert_eq!(instr.duration(), 0);
    }

    #[test]
    fn test_shifted() {
        let instr = Instruction::frame_change(0.5, Channel::Drive(0))
            .unwrap()
            .shifted(30)
            .unwrap();
        assert_eq!(instr.begin_time(), 30);
        assert_eq!(instr.end_time(), 30);
        // Occupancy stays relative to the instruction itself.
        assert_eq!(instr.occupancy().end_time(), Some(0));
    }

    #[test]
    fn test_shift_overflow() {
        let pulse = SamplePulse::named("p", vec![Complex64::new(0.1, 0.0); 20]).unwrap();
        let instr = Instruction::play(pulse, Channel::Drive(0))
            .unwrap()
            .shifted(10)
            .unwrap();

        let err = instr.shifted(i64::MAX).unwrap_err();
        assert!(matches!(err, PulseError::TimeOverflow { time: i64::MAX }));
        // The begin fits but the end would not.
        assert!(instr.shifted(i64::MAX - 15).is_err());
        assert_eq!(instr.shifted(i64::MAX - 30).unwrap().end_time(), i64::MAX);
    }
}
