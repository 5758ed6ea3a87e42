//! Pulse schedules for the scheduling demo.

use arvak_pulse::{
    Acquire, Channel, ConfiguredSchedule, GaussianSquareWidth, Instruction, LoConfig,
    ParametricPulse, Schedule,
};
use num_complex::Complex64;
use tracing::info;

use crate::error::TranspilerResult;

/// Duration of the single-qubit rotation, in samples.
pub const X90_DURATION: u32 = 160;
/// Duration of the readout stimulus and acquisition window, in samples.
pub const MEASURE_DURATION: u32 = 1200;

/// The rotation played on every drive channel.
pub fn x90(amplitude: f64) -> TranspilerResult<ParametricPulse> {
    let pulse = ParametricPulse::drag(X90_DURATION, Complex64::new(amplitude, 0.0), 40.0, 0.2)?
        .with_name("x90");
    Ok(pulse)
}

/// Readout stimulus for one measure channel.
pub fn stimulus() -> TranspilerResult<ParametricPulse> {
    let pulse = ParametricPulse::gaussian_square(
        MEASURE_DURATION,
        Complex64::new(0.15, 0.0),
        64.0,
        GaussianSquareWidth::RisefallSigmaRatio(2.0),
    )?
    .with_name("m_stimulus");
    Ok(pulse)
}

/// Play an X90 on every qubit in parallel, then measure all of them.
pub fn rotate_and_measure(num_qubits: u32, amplitude: f64) -> TranspilerResult<Schedule> {
    let mut rotation = Schedule::named("rotation");
    for q in 0..num_qubits {
        rotation.insert_in_place(0, Instruction::play(x90(amplitude)?, Channel::Drive(q))?)?;
        rotation.append_in_place(Instruction::frame_change(
            std::f64::consts::FRAC_PI_2,
            Channel::Drive(q),
        )?)?;
    }

    let qubits: Vec<u32> = (0..num_qubits).collect();
    let readout_start = rotation.end_time();
    let mut schedule = rotation;
    for &q in &qubits {
        schedule.insert_in_place(
            readout_start,
            Instruction::play(stimulus()?, Channel::Measure(q))?,
        )?;
    }
    schedule.insert_in_place(
        readout_start,
        Instruction::acquire(
            Acquire::new(MEASURE_DURATION).with_discriminator("linear"),
            &qubits,
            &qubits,
            &[],
        )?,
    )?;
    Ok(schedule)
}

/// Sweep the rotation amplitude over `steps` experiments.
///
/// Each experiment carries its own LO configuration; the drive LO of
/// qubit 0 is detuned when `detuning` is given.
pub fn amplitude_sweep(
    num_qubits: u32,
    steps: u32,
    drive_lo: f64,
    detuning: Option<f64>,
) -> TranspilerResult<Vec<ConfiguredSchedule>> {
    let mut lo_config = LoConfig::new();
    if let Some(detuning) = detuning {
        lo_config.set(Channel::Drive(0), drive_lo + detuning)?;
    }

    let mut experiments = Vec::new();
    for step in 0..steps {
        let amplitude = f64::from(step + 1) / f64::from(steps.max(1)) * 0.5;
        let schedule = rotate_and_measure(num_qubits, amplitude)?;
        info!(
            "Built experiment {} with amplitude {:.3}, duration {}",
            step,
            amplitude,
            schedule.duration()
        );
        experiments.push(
            ConfiguredSchedule::new(schedule)
                .with_lo_config(lo_config.clone())
                .with_name(format!("amp_sweep_{step}")),
        );
    }
    Ok(experiments)
}
