//! Pulse Scheduling Demo
//!
//! Builds an amplitude sweep of rotate-and-measure schedules and shows
//! how placement conflicts are reported.

use clap::Parser;

use arvak_demos::pulses::{amplitude_sweep, rotate_and_measure, x90};
use arvak_demos::{init_logging, print_header, print_info, print_result, print_section, print_success};
use arvak_pulse::{Channel, Instruction};

#[derive(Parser, Debug)]
#[command(name = "demo-schedule")]
#[command(about = "Demonstrate the pulse scheduling engine")]
struct Args {
    /// Number of qubits
    #[arg(short = 'n', long, default_value = "2")]
    qubits: u32,

    /// Number of sweep steps
    #[arg(short, long, env = "ARVAK_TARGET_STEPS", default_value = "4")]
    steps: u32,

    /// Default drive LO frequency in Hz
    #[arg(long, default_value = "5.0e9")]
    drive_lo: f64,

    /// Detune the drive LO of qubit 0 by this many Hz
    #[arg(long)]
    detuning: Option<f64>,

    /// Print every instruction of the first experiment
    #[arg(long)]
    show_instructions: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    print_header("Pulse Scheduling Demo");

    print_section("Sweep Setup");
    print_result("Qubits", args.qubits);
    print_result("Steps", args.steps);
    print_result("Drive LO", format!("{:.4} GHz", args.drive_lo / 1e9));
    if let Some(detuning) = args.detuning {
        print_result("Qubit 0 detuning", format!("{:+.3} MHz", detuning / 1e6));
    }

    print_section("Experiments");
    let experiments = amplitude_sweep(args.qubits, args.steps, args.drive_lo, args.detuning)?;
    let defaults = vec![args.drive_lo; args.qubits as usize];
    for experiment in &experiments {
        let schedule = experiment.schedule();
        let los = experiment.lo_config().qubit_lo_freqs(&defaults)?;
        print_result(
            experiment.name().unwrap_or("unnamed"),
            format!(
                "{} instructions, duration {}, qubit LOs {:?}",
                schedule.children().len(),
                schedule.duration(),
                los
            ),
        );
    }

    if args.show_instructions {
        if let Some(first) = experiments.first() {
            print_section("Instructions");
            println!("{}", first.schedule());
        }
    }

    print_section("Admission Control");
    let schedule = rotate_and_measure(args.qubits.max(1), 0.25)?;
    let clash = Instruction::play(x90(0.25)?, Channel::Drive(0))?;
    match schedule.insert(80, clash.clone()) {
        Ok(_) => print_info("Unexpectedly placed an overlapping pulse"),
        Err(e) => print_result("Insert at 80 on d0", e),
    }
    let placed = schedule.append(clash)?;
    print_result(
        "Append on d0",
        format!(
            "placed at {}, schedule now ends at {}",
            placed.end_time() - i64::from(arvak_demos::pulses::X90_DURATION),
            placed.end_time()
        ),
    );

    println!();
    print_success("Schedule demo complete!");
    Ok(())
}
