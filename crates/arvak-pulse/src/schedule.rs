//! Schedules: instructions placed in time.
//!
//! A [`Schedule`] is the root of a placement tree. Every child keeps its
//! begin time relative to the schedule's origin; the absolute begin time of
//! a leaf is the schedule's begin time plus the child's own. The aggregate
//! [`Occupancy`] is kept in the same local frame and is the admission check
//! for every placement: a component is placed only if none of its
//! timeslots overlaps a committed one, otherwise nothing changes.
//!
//! ```
//! use arvak_pulse::{Channel, Instruction, Schedule, SamplePulse};
//! use num_complex::Complex64;
//!
//! let pulse = SamplePulse::named("x90", vec![Complex64::new(0.1, 0.0); 10]).unwrap();
//! let x90 = Instruction::play(pulse, Channel::Drive(0)).unwrap();
//!
//! let schedule = Schedule::named("rabi")
//!     .insert(0, x90.clone())
//!     .unwrap()
//!     .append(x90)
//!     .unwrap();
//! assert_eq!(schedule.end_time(), 20);
//! ```
//!
//! Schedules nested inside schedules are not supported: inserting a
//! schedule that has children fails with [`PulseError::NestedSchedule`].

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{PulseError, PulseResult};
use crate::instruction::{Instruction, Schedulable};
use crate::occupancy::Occupancy;

/// Identity of a schedule lineage.
///
/// A schedule and every schedule derived from it (by insertion, appending,
/// shifting or cloning) share an id. Placing a schedule into a member of
/// its own lineage is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(pub Uuid);

impl ScheduleId {
    /// Create a new random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScheduleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something that can be placed into a schedule.
#[derive(Debug, Clone)]
pub enum ScheduleComponent {
    /// A single instruction.
    Instruction(Instruction),
    /// A whole schedule.
    Schedule(Schedule),
}

impl Schedulable for ScheduleComponent {
    fn duration(&self) -> i64 {
        match self {
            ScheduleComponent::Instruction(instr) => instr.duration(),
            ScheduleComponent::Schedule(schedule) => schedule.duration(),
        }
    }

    fn occupancy(&self) -> &Occupancy {
        match self {
            ScheduleComponent::Instruction(instr) => instr.occupancy(),
            ScheduleComponent::Schedule(schedule) => schedule.occupancy(),
        }
    }
}

impl From<Instruction> for ScheduleComponent {
    fn from(instr: Instruction) -> Self {
        ScheduleComponent::Instruction(instr)
    }
}

impl From<Schedule> for ScheduleComponent {
    fn from(schedule: Schedule) -> Self {
        ScheduleComponent::Schedule(schedule)
    }
}

impl fmt::Display for ScheduleComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleComponent::Instruction(instr) => write!(f, "{instr}"),
            ScheduleComponent::Schedule(schedule) => {
                write!(f, "Schedule({})", schedule.name().unwrap_or("unnamed"))
            }
        }
    }
}

/// A placement tree of instructions.
#[derive(Debug, Clone)]
pub struct Schedule {
    id: ScheduleId,
    name: Option<String>,
    begin_time: i64,
    occupancy: Occupancy,
    children: Vec<Instruction>,
}

impl Schedule {
    /// Create an empty, unnamed schedule at time 0.
    pub fn new() -> Self {
        Self {
            id: ScheduleId::new(),
            name: None,
            begin_time: 0,
            occupancy: Occupancy::empty(),
            children: Vec::new(),
        }
    }

    /// Create an empty schedule with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    /// Set the begin time relative to a parent.
    ///
    /// Fails if the absolute end of a child would leave the `i64` range.
    pub fn with_begin_time(mut self, begin_time: i64) -> PulseResult<Self> {
        if begin_time.checked_add(self.extent()).is_none() {
            return Err(PulseError::TimeOverflow { time: begin_time });
        }
        self.begin_time = begin_time;
        Ok(self)
    }

    /// Lineage id.
    pub fn id(&self) -> ScheduleId {
        self.id
    }

    /// Name of the schedule.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Begin time relative to the parent.
    pub fn begin_time(&self) -> i64 {
        self.begin_time
    }

    /// Latest end over all children, or the begin time if there are none.
    pub fn end_time(&self) -> i64 {
        self.begin_time.saturating_add(self.local_end())
    }

    /// Time from begin to end.
    pub fn duration(&self) -> i64 {
        self.local_end()
    }

    /// Committed timeslots, relative to this schedule's origin.
    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    /// Placed instructions in insertion order, with begin times relative to
    /// this schedule's origin.
    pub fn children(&self) -> &[Instruction] {
        &self.children
    }

    /// Check if nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn local_end(&self) -> i64 {
        self.occupancy.end_time().unwrap_or(0)
    }

    /// Latest child end, including children that occupy no channel.
    fn extent(&self) -> i64 {
        self.children
            .iter()
            .map(Instruction::end_time)
            .max()
            .unwrap_or(0)
    }

    /// A new schedule with `component` placed at `time`.
    pub fn insert(&self, time: i64, component: impl Into<ScheduleComponent>) -> PulseResult<Self> {
        let mut schedule = self.clone();
        schedule.insert_in_place(time, component)?;
        Ok(schedule)
    }

    /// Place `component` at `time`.
    ///
    /// On failure the schedule is left unchanged.
    pub fn insert_in_place(
        &mut self,
        time: i64,
        component: impl Into<ScheduleComponent>,
    ) -> PulseResult<()> {
        let instr = match component.into() {
            ScheduleComponent::Instruction(instr) => instr,
            ScheduleComponent::Schedule(schedule) => return self.check_schedule(&schedule),
        };

        let offset = instr
            .begin_time()
            .checked_add(time)
            .ok_or(PulseError::TimeOverflow { time })?;
        let placed = instr.occupancy().shifted(offset)?;
        if !self.occupancy.is_mergeable_with(&placed) {
            warn!("Fail to insert {} at {} due to timing overlap", instr, time);
            return Err(PulseError::InsertConflict {
                component: instr.to_string(),
                time,
            });
        }

        // Absolute times of every child must stay representable.
        let child = instr.shifted(time)?;
        if self.begin_time.checked_add(child.end_time()).is_none() {
            return Err(PulseError::TimeOverflow { time });
        }

        debug!("Inserting {} at {}", instr.command(), time);
        self.occupancy = self.occupancy.merged_unchecked(&placed);
        self.children.push(child);
        Ok(())
    }

    /// A new schedule with `component` placed right after the last
    /// committed instant.
    pub fn append(&self, component: impl Into<ScheduleComponent>) -> PulseResult<Self> {
        let mut schedule = self.clone();
        schedule.append_in_place(component)?;
        Ok(schedule)
    }

    /// Place `component` right after the last committed instant.
    pub fn append_in_place(&mut self, component: impl Into<ScheduleComponent>) -> PulseResult<()> {
        let component = component.into();
        let description = component.to_string();
        match self.insert_in_place(self.local_end(), component) {
            Err(PulseError::InsertConflict { .. }) => {
                warn!("Fail to append {} due to timing overlap", description);
                Err(PulseError::AppendConflict {
                    component: description,
                })
            }
            other => other,
        }
    }

    /// Union with `other`: its contents inserted at time 0.
    pub fn union(&self, other: impl Into<ScheduleComponent>) -> PulseResult<Self> {
        self.insert(0, other)
    }

    /// The same schedule starting `time` later.
    ///
    /// Negative shifts are rejected, and so are shifts that move a child
    /// past the end of the `i64` range.
    pub fn shifted(&self, time: i64) -> PulseResult<Self> {
        if time < 0 {
            return Err(PulseError::NegativeShift { time });
        }
        let begin_time = self
            .begin_time
            .checked_add(time)
            .filter(|begin| begin.checked_add(self.extent()).is_some())
            .ok_or(PulseError::TimeOverflow { time })?;
        Ok(Self {
            begin_time,
            ..self.clone()
        })
    }

    /// All instructions with absolute begin times, in insertion order.
    pub fn flat_instruction_sequence(&self) -> Vec<Instruction> {
        self.children
            .iter()
            .map(|instr| instr.saturating_shifted(self.begin_time))
            .collect()
    }

    fn check_schedule(&self, schedule: &Schedule) -> PulseResult<()> {
        if schedule.id == self.id {
            return Err(PulseError::SelfInsertion);
        }
        if !schedule.is_empty() {
            return Err(PulseError::NestedSchedule);
        }
        debug!("Inserting empty schedule is a no-op");
        Ok(())
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

impl Schedulable for Schedule {
    fn duration(&self) -> i64 {
        Schedule::duration(self)
    }

    fn occupancy(&self) -> &Occupancy {
        Schedule::occupancy(self)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{child}")?;
        }
        Ok(())
    }
}
