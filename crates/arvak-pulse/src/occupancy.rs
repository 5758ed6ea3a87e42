//! Timeslot occupancy: which time windows are committed on which channel.
//!
//! An [`Occupancy`] is immutable. Merging and shifting build new values,
//! and the timeslot list is shared between clones, so holding on to an
//! older occupancy (for example in a schedule that was derived from) costs
//! nothing extra.
//!
//! The single invariant is that no two timeslots on the same channel
//! overlap. Construction enforces it, and so does [`Occupancy::merged`].
//! Callers that have already checked [`Occupancy::is_mergeable_with`] can
//! skip the second check with [`Occupancy::merged_unchecked`].

use rustc_hash::FxHashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::channel::Channel;
use crate::error::{PulseError, PulseResult};
use crate::interval::{Interval, Timeslot};

type Table<C> = FxHashMap<C, Vec<Interval>>;

/// Committed timeslots, indexed by channel.
#[derive(Debug, Clone)]
pub struct Occupancy<C = Channel> {
    timeslots: Arc<[Timeslot<C>]>,
    table: Arc<Table<C>>,
}

impl<C: Eq + Hash + Clone> Occupancy<C> {
    /// Create an occupancy, failing if two timeslots on one channel overlap.
    ///
    /// ```
    /// use arvak_pulse::{Interval, Occupancy, Timeslot};
    ///
    /// let clash = Occupancy::new([
    ///     Timeslot::new(Interval::new(0, 10), "x"),
    ///     Timeslot::new(Interval::new(5, 10), "x"),
    /// ]);
    /// assert!(clash.is_err());
    ///
    /// let parallel = Occupancy::new([
    ///     Timeslot::new(Interval::new(0, 10), "x"),
    ///     Timeslot::new(Interval::new(0, 10), "y"),
    /// ]);
    /// assert!(parallel.is_ok());
    /// ```
    pub fn new(timeslots: impl IntoIterator<Item = Timeslot<C>>) -> PulseResult<Self> {
        let timeslots: Arc<[Timeslot<C>]> = timeslots.into_iter().collect();
        let mut table: Table<C> = FxHashMap::default();

        for slot in timeslots.iter() {
            if !slot.interval().is_in_range() {
                return Err(PulseError::TimeOverflow {
                    time: slot.interval().begin(),
                });
            }
            let intervals = table.entry(slot.channel().clone()).or_default();
            if let Some(existing) = intervals.iter().find(|i| i.has_overlap(&slot.interval())) {
                return Err(PulseError::OverlappingTimeslots {
                    first: *existing,
                    second: slot.interval(),
                });
            }
            intervals.push(slot.interval());
        }

        Ok(Self {
            timeslots,
            table: Arc::new(table),
        })
    }

    /// An occupancy without any timeslot.
    pub fn empty() -> Self {
        Self {
            timeslots: Arc::from(Vec::new()),
            table: Arc::new(FxHashMap::default()),
        }
    }

    /// All timeslots, in insertion order.
    pub fn timeslots(&self) -> &[Timeslot<C>] {
        &self.timeslots
    }

    /// Channels with at least one timeslot, in arbitrary order.
    pub fn channels(&self) -> impl Iterator<Item = &C> {
        self.table.keys()
    }

    /// Intervals committed on `channel`.
    pub fn intervals(&self, channel: &C) -> &[Interval] {
        self.table.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of timeslots.
    pub fn len(&self) -> usize {
        self.timeslots.len()
    }

    /// Check if no timeslot is committed.
    pub fn is_empty(&self) -> bool {
        self.timeslots.is_empty()
    }

    /// Latest end over all timeslots, `None` when empty.
    pub fn end_time(&self) -> Option<i64> {
        self.timeslots.iter().map(|slot| slot.interval().end()).max()
    }

    /// Check whether `other` can be merged without creating an overlap.
    pub fn is_mergeable_with(&self, other: &Occupancy<C>) -> bool {
        other.timeslots.iter().all(|slot| {
            self.intervals(slot.channel())
                .iter()
                .all(|interval| !interval.has_overlap(&slot.interval()))
        })
    }

    /// Union of both timeslot sets, validated like [`Occupancy::new`].
    pub fn merged(&self, other: &Occupancy<C>) -> PulseResult<Self> {
        Self::new(self.timeslots.iter().chain(other.timeslots.iter()).cloned())
    }

    /// Union of both timeslot sets without re-validation.
    ///
    /// The caller must have established `self.is_mergeable_with(other)`;
    /// otherwise the result holds overlapping timeslots. Debug builds
    /// assert the precondition.
    pub fn merged_unchecked(&self, other: &Occupancy<C>) -> Self {
        debug_assert!(self.is_mergeable_with(other));

        let timeslots: Arc<[Timeslot<C>]> = self
            .timeslots
            .iter()
            .chain(other.timeslots.iter())
            .cloned()
            .collect();
        let mut table = (*self.table).clone();
        for slot in other.timeslots.iter() {
            table
                .entry(slot.channel().clone())
                .or_default()
                .push(slot.interval());
        }

        Self {
            timeslots,
            table: Arc::new(table),
        }
    }

    /// Every timeslot moved forward by `time`.
    ///
    /// Shifting preserves the invariant, so the result is not re-validated.
    /// Negative shifts are rejected, and so are shifts that move a timeslot
    /// past the end of the `i64` range.
    pub fn shifted(&self, time: i64) -> PulseResult<Self> {
        if time < 0 {
            return Err(PulseError::NegativeShift { time });
        }
        if time == 0 {
            return Ok(self.clone());
        }

        let overflow = || PulseError::TimeOverflow { time };
        let timeslots: Arc<[Timeslot<C>]> = self
            .timeslots
            .iter()
            .map(|slot| slot.shifted(time).ok_or_else(overflow))
            .collect::<PulseResult<_>>()?;
        let table: Table<C> = self
            .table
            .iter()
            .map(|(channel, intervals)| {
                let moved = intervals
                    .iter()
                    .map(|i| i.shifted(time).ok_or_else(overflow))
                    .collect::<PulseResult<Vec<Interval>>>()?;
                Ok((channel.clone(), moved))
            })
            .collect::<PulseResult<_>>()?;

        Ok(Self {
            timeslots,
            table: Arc::new(table),
        })
    }
}

impl<C: Eq + Hash + Clone> Default for Occupancy<C> {
    fn default() -> Self {
        Self::empty()
    }
}
