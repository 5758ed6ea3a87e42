//! Placement tests for schedules built from real commands.

use arvak_pulse::{
    Acquire, Channel, ConfiguredSchedule, Instruction, Interval, LoConfig, Occupancy,
    ParametricPulse, PulseError, SamplePulse, Schedulable, Schedule, Timeslot,
};
use num_complex::Complex64;

fn sample(name: &str, duration: usize) -> SamplePulse {
    SamplePulse::named(name, vec![Complex64::new(0.1, 0.0); duration]).unwrap()
}

fn play(name: &str, duration: usize, channel: Channel) -> Instruction {
    Instruction::play(sample(name, duration), channel).unwrap()
}

#[test]
fn test_overlap_then_adjacent_placement() {
    let schedule = Schedule::new()
        .insert(0, play("a", 10, Channel::Drive(0)))
        .unwrap();

    let err = schedule
        .insert(5, play("b", 10, Channel::Drive(0)))
        .unwrap_err();
    assert!(matches!(err, PulseError::InsertConflict { time: 5, .. }));
    assert_eq!(
        err.to_string(),
        "Fail to insert    0: SamplePulse(b, duration=10) -> d0 at 5 due to overlap"
    );

    let schedule = schedule
        .insert(10, play("b", 10, Channel::Drive(0)))
        .unwrap();
    assert_eq!(schedule.end_time(), 20);
    assert_eq!(
        schedule.occupancy().intervals(&Channel::Drive(0)),
        [Interval::new(0, 10), Interval::new(10, 10)]
    );
}

#[test]
fn test_parallel_channels_do_not_conflict() {
    let schedule = Schedule::new()
        .insert(0, play("a", 10, Channel::Drive(0)))
        .unwrap()
        .insert(0, play("b", 10, Channel::Drive(1)))
        .unwrap()
        .insert(0, play("c", 10, Channel::Control(0)))
        .unwrap();

    assert_eq!(schedule.children().len(), 3);
    assert_eq!(schedule.end_time(), 10);
}

#[test]
fn test_measurement_schedule() {
    let x90 = ParametricPulse::gaussian(160, Complex64::new(0.25, 0.0), 40.0)
        .unwrap()
        .with_name("x90");
    let stimulus = ParametricPulse::gaussian_square(
        1200,
        Complex64::new(0.1, 0.0),
        64.0,
        arvak_pulse::GaussianSquareWidth::Width(1000.0),
    )
    .unwrap();

    let mut schedule = Schedule::named("measure");
    schedule
        .insert_in_place(0, Instruction::play(x90, Channel::Drive(0)).unwrap())
        .unwrap();
    schedule
        .append_in_place(Instruction::play(stimulus, Channel::Measure(0)).unwrap())
        .unwrap();
    schedule
        .insert_in_place(
            160,
            Instruction::acquire(
                Acquire::new(1200).with_discriminator("linear"),
                &[0, 1],
                &[0, 1],
                &[],
            )
            .unwrap(),
        )
        .unwrap();

    assert_eq!(schedule.end_time(), 1360);
    assert_eq!(
        schedule.occupancy().intervals(&Channel::MemorySlot(1)),
        [Interval::new(160, 1200)]
    );

    // A second acquisition on the same memory slot must wait.
    let err = schedule
        .insert_in_place(
            500,
            Instruction::acquire(Acquire::new(100), &[2], &[1], &[]).unwrap(),
        )
        .unwrap_err();
    assert!(matches!(err, PulseError::InsertConflict { .. }));
    assert_eq!(schedule.children().len(), 3);
}

#[test]
fn test_append_conflict_reported_as_append() {
    // An instantaneous command at the end keeps the end time unchanged,
    // so appending it again lands on the same instant without overlap.
    let mut schedule = Schedule::new();
    schedule
        .append_in_place(play("a", 10, Channel::Drive(0)))
        .unwrap();
    schedule
        .append_in_place(Instruction::frame_change(0.5, Channel::Drive(0)).unwrap())
        .unwrap();
    schedule
        .append_in_place(Instruction::frame_change(0.5, Channel::Drive(0)).unwrap())
        .unwrap();
    assert_eq!(schedule.end_time(), 10);

    let late = play("late", 5, Channel::Drive(1));
    let schedule = schedule.insert(20, late).unwrap();
    assert_eq!(schedule.end_time(), 25);

    // A pre-shifted instruction reaches back into committed time.
    let reaching = play("r", 10, Channel::Drive(1)).shifted(-10).unwrap();
    let err = schedule.append(reaching).unwrap_err();
    assert!(matches!(err, PulseError::AppendConflict { .. }));
}

#[test]
fn test_shifted_schedule_flattens_to_absolute_times() {
    let schedule = Schedule::new()
        .insert(0, play("a", 10, Channel::Drive(0)))
        .unwrap()
        .append(play("b", 20, Channel::Drive(0)))
        .unwrap()
        .shifted(50)
        .unwrap();

    let begins: Vec<i64> = schedule
        .flat_instruction_sequence()
        .iter()
        .map(Instruction::begin_time)
        .collect();
    assert_eq!(begins, [50, 60]);
    assert_eq!(schedule.end_time(), 80);
    assert_eq!(Schedulable::duration(&schedule), 30);
}

#[test]
fn test_occupancy_shift_rejects_negative_time() {
    let occupancy = Occupancy::new([Timeslot::new(Interval::new(0, 4), Channel::Drive(0))]).unwrap();
    assert!(matches!(
        occupancy.shifted(-1),
        Err(PulseError::NegativeShift { time: -1 })
    ));
    assert_eq!(
        occupancy.shifted(6).unwrap().intervals(&Channel::Drive(0)),
        [Interval::new(6, 4)]
    );
}

#[test]
fn test_overflowing_placement_rejected() {
    let occupancy = Occupancy::new([Timeslot::new(Interval::new(1, 10), Channel::Drive(0))]).unwrap();
    assert!(matches!(
        occupancy.shifted(i64::MAX),
        Err(PulseError::TimeOverflow { .. })
    ));

    let fc = |channel| Instruction::frame_change(0.5, channel).unwrap();
    let schedule = Schedule::new()
        .insert(0, fc(Channel::Drive(1)))
        .unwrap()
        .shifted(10)
        .unwrap();
    assert!(matches!(
        schedule.insert(i64::MAX, fc(Channel::Drive(0))),
        Err(PulseError::TimeOverflow { time: i64::MAX })
    ));
    let flat = schedule.flat_instruction_sequence();
    assert_eq!(flat.len(), 1);
    assert_eq!(flat[0].begin_time(), 10);
}

#[test]
fn test_configured_schedule() {
    let schedule = Schedule::named("spectroscopy")
        .insert(0, play("tone", 100, Channel::Drive(0)))
        .unwrap();
    let lo = LoConfig::new().with(Channel::Drive(0), 4.95e9).unwrap();
    let configured = ConfiguredSchedule::new(schedule).with_lo_config(lo);

    assert_eq!(configured.name(), Some("spectroscopy"));
    assert_eq!(
        configured.lo_config().qubit_lo_freqs(&[5.0e9, 5.1e9]).unwrap(),
        [4.95e9, 5.1e9]
    );
    assert_eq!(configured.schedule().end_time(), 100);
}
