//! Arvak Pulse Scheduling
//!
//! This crate places pulse instructions on physical channels in time and
//! guarantees that no two commitments on one channel overlap.
//!
//! # Overview
//!
//! - [`Interval`] / [`Timeslot`]: half-open time windows, optionally bound
//!   to a channel
//! - [`Occupancy`]: an immutable set of timeslots with the no-overlap
//!   invariant, plus the admission check used before every placement
//! - [`Instruction`]: a [`Command`] bound to its [`Channel`]s
//! - [`Schedule`]: the placement tree; every insert or append is checked
//!   against the committed occupancy and either fully succeeds or leaves
//!   the schedule untouched
//!
//! # Architecture
//!
//! ```text
//! Command (SamplePulse / ParametricPulse / FrameChange / Acquire / ...)
//!       │
//!       ▼
//! ┌─────────────┐
//! │ Instruction │ ── Occupancy (local frame)
//! └─────────────┘
//!       │  insert(t) / append
//!       ▼
//! ┌─────────────┐
//! │  Schedule   │ ◄── is_mergeable_with → merged
//! └─────────────┘
//!       │
//!       ▼
//! ConfiguredSchedule (+ LoConfig)
//! ```
//!
//! # Example: Building a Schedule
//!
//! ```rust
//! use arvak_pulse::{Acquire, Channel, Instruction, ParametricPulse, Schedule};
//! use num_complex::Complex64;
//!
//! let x90 = ParametricPulse::gaussian(160, Complex64::new(0.25, 0.0), 40.0).unwrap();
//!
//! let schedule = Schedule::named("measure_after_x90")
//!     .insert(0, Instruction::play(x90, Channel::Drive(0)).unwrap())
//!     .unwrap()
//!     .append(Instruction::acquire(Acquire::new(400), &[0], &[0], &[]).unwrap())
//!     .unwrap();
//!
//! assert_eq!(schedule.end_time(), 560);
//! for instr in schedule.flat_instruction_sequence() {
//!     println!("{instr}");
//! }
//! ```

pub mod channel;
pub mod command;
pub mod error;
pub mod experiment;
pub mod instruction;
pub mod interval;
pub mod occupancy;
pub mod parametric;
pub mod schedule;

pub use channel::Channel;
pub use command::{Acquire, Command, SamplePulse};
pub use error::{PulseError, PulseResult};
pub use experiment::{ConfiguredSchedule, LoConfig};
pub use instruction::{Instruction, Schedulable};
pub use interval::{Interval, Timeslot};
pub use occupancy::Occupancy;
pub use parametric::{GaussianSquareWidth, ParameterValue, ParametricPulse, PulseShape};
pub use schedule::{Schedule, ScheduleComponent, ScheduleId};
