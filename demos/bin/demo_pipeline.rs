//! Pass Pipeline Demo
//!
//! Runs the toy transpiler on a gate program and reports every pass.

use anyhow::Context;
use clap::Parser;

use arvak_demos::gates::{GateList, transpiler};
use arvak_demos::{init_logging, print_header, print_info, print_result, print_section, print_success};
use arvak_passmanager::{ControllerOptions, PropertySet};

#[derive(Parser, Debug)]
#[command(name = "demo-pipeline")]
#[command(about = "Demonstrate the pass pipeline engine")]
struct Args {
    /// Gate program, statements separated by ';'
    #[arg(short, long, default_value = "h 0; x 1; x 1; h 0; cx 0 1; cx 0 1; t 2")]
    program: String,

    /// Number of qubits in the register
    #[arg(short = 'n', long, default_value = "3")]
    qubits: u32,

    /// Optimization level (0 = validate and count only)
    #[arg(short = 'O', long, default_value = "1")]
    optimization_level: u8,

    /// Maximum do-while iterations before giving up
    #[arg(long, env = "ARVAK_MAX_ITERATION", default_value = "1000")]
    max_iteration: usize,

    /// Controller options as JSON; overrides --max-iteration
    #[arg(long)]
    options: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    print_header("Pass Pipeline Demo");

    let options = match &args.options {
        Some(json) => ControllerOptions::from_json(json).context("invalid --options")?,
        None => ControllerOptions::default().with_max_iteration(args.max_iteration),
    };

    print_section("Input");
    let ir = GateList::parse(args.qubits, &args.program)?;
    print_result("Qubits", ir.num_qubits);
    print_result("Gates", ir.len());
    print_result("Program", &ir);

    print_section("Pipeline");
    let mut pm = transpiler(args.optimization_level, options)?;
    print_result("Optimization level", args.optimization_level);
    print_result("Max iteration", options.max_iteration);
    print_result("Top-level tasks", pm.len());

    print_section("Execution");
    let mut properties = PropertySet::new();
    let output = pm.run_with_callback(ir, &mut properties, |info| {
        println!(
            "  {:>3}. {:<20} {:>3} gates  {:.2?}",
            info.count,
            info.task.name(),
            info.ir.len(),
            info.elapsed
        );
    })?;

    print_section("Result");
    print_result("Program", &output);
    print_result("Gates", output.len());
    print_result("Passes executed", pm.count());
    if let Some(counts) = properties.get("count_ops") {
        print_result("Operation counts", counts);
    }

    println!();
    print_success("Pipeline demo complete!");
    print_info("Try -O 0 to skip the optimization loop, or --max-iteration 1 to hit the ceiling.");
    Ok(())
}
