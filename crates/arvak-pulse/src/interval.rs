//! Time intervals and timeslots.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::channel::Channel;

/// A half-open time interval `[begin, begin + duration)`.
///
/// Zero-length intervals are allowed and represent instantaneous events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    begin: i64,
    duration: u32,
}

impl Interval {
    /// Create an interval starting at `begin`.
    pub const fn new(begin: i64, duration: u32) -> Self {
        Self { begin, duration }
    }

    /// First instant covered.
    pub const fn begin(&self) -> i64 {
        self.begin
    }

    /// First instant after the interval.
    ///
    /// Saturates at `i64::MAX`; occupancies reject intervals whose end
    /// does not fit.
    pub const fn end(&self) -> i64 {
        self.begin.saturating_add(self.duration as i64)
    }

    /// Check whether the end is representable.
    pub const fn is_in_range(&self) -> bool {
        self.begin.checked_add(self.duration as i64).is_some()
    }

    /// Length of the interval.
    pub const fn duration(&self) -> u32 {
        self.duration
    }

    /// Check whether the two intervals share an instant.
    ///
    /// Intervals that only touch do not overlap:
    ///
    /// ```
    /// use arvak_pulse::Interval;
    ///
    /// assert!(!Interval::new(0, 10).has_overlap(&Interval::new(10, 5)));
    /// assert!(Interval::new(0, 10).has_overlap(&Interval::new(9, 5)));
    /// ```
    pub const fn has_overlap(&self, other: &Interval) -> bool {
        self.begin < other.end() && other.begin < self.end()
    }

    /// The same interval moved by `time`, or `None` if either bound
    /// leaves the `i64` range.
    #[must_use]
    pub const fn shifted(&self, time: i64) -> Option<Self> {
        let Some(begin) = self.begin.checked_add(time) else {
            return None;
        };
        let moved = Self {
            begin,
            duration: self.duration,
        };
        if moved.is_in_range() { Some(moved) } else { None }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end())
    }
}

/// An interval committed on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timeslot<C = Channel> {
    interval: Interval,
    channel: C,
}

impl<C> Timeslot<C> {
    /// Create a timeslot.
    pub fn new(interval: Interval, channel: C) -> Self {
        Self { interval, channel }
    }

    /// The committed interval.
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// The channel the interval is committed on.
    pub fn channel(&self) -> &C {
        &self.channel
    }
}

impl<C: Clone> Timeslot<C> {
    /// The same timeslot moved by `time`, or `None` on overflow.
    #[must_use]
    pub fn shifted(&self, time: i64) -> Option<Self> {
        Some(Self {
            interval: self.interval.shifted(time)?,
            channel: self.channel.clone(),
        })
    }
}

impl<C: fmt::Display> fmt::Display for Timeslot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.interval, self.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_bounds() {
        let interval = Interval::new(3, 7);
        assert_eq!(interval.begin(), 3);
        assert_eq!(interval.end(), 10);
        assert_eq!(interval.duration(), 7);
        assert_eq!(interval.to_string(), "[3, 10)");
    }

    #[test]
    fn test_interval_overlap_half_open() {
        let a = Interval::new(0, 10);
        assert!(!a.has_overlap(&Interval::new(10, 5)));
        assert!(!Interval::new(10, 5).has_overlap(&a));
        assert!(a.has_overlap(&Interval::new(9, 5)));
        assert!(a.has_overlap(&Interval::new(-5, 6)));
        assert!(!a.has_overlap(&Interval::new(-5, 5)));
    }

    #[test]
    fn test_zero_length_interval() {
        let event = Interval::new(5, 0);
        assert!(event.has_overlap(&Interval::new(0, 10)));
        assert!(!event.has_overlap(&Interval::new(5, 10)));
        assert!(!event.has_overlap(&Interval::new(5, 0)));
    }

    #[test]
    fn test_shift_allows_any_sign() {
        assert_eq!(Interval::new(5, 2).shifted(-7), Some(Interval::new(-2, 2)));
        assert_eq!(Interval::new(5, 2).shifted(3).map(|i| i.end()), Some(10));
    }

    #[test]
    fn test_shift_out_of_range() {
        assert_eq!(Interval::new(1, 10).shifted(i64::MAX), None);
        assert_eq!(Interval::new(-1, 0).shifted(i64::MIN), None);
        // The begin fits but the end does not.
        assert_eq!(Interval::new(0, 10).shifted(i64::MAX - 5), None);
        assert_eq!(
            Interval::new(0, 10).shifted(i64::MAX - 10),
            Some(Interval::new(i64::MAX - 10, 10))
        );
    }

    #[test]
    fn test_end_saturates() {
        let interval = Interval::new(i64::MAX - 1, 5);
        assert!(!interval.is_in_range());
        assert_eq!(interval.end(), i64::MAX);
    }

    #[test]
    fn test_timeslot_display() {
        let slot = Timeslot::new(Interval::new(0, 4), Channel::Drive(1));
        assert_eq!(slot.to_string(), "[0, 4)@d1");
        assert_eq!(slot.shifted(2).map(|s| s.interval()), Some(Interval::new(2, 4)));
    }
}
