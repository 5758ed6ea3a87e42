//! Arvak Demo Suite
//!
//! This crate drives both Arvak engines end to end:
//!
//! - **Pass pipeline**: a toy gate-list transpiler whose optimization loop
//!   runs under a `condition` and a `do_while` flow controller
//! - **Pulse scheduling**: parallel rotations followed by a readout, swept
//!   over amplitudes with per-experiment LO configuration
//!
//! Engine errors surface as [`TranspilerError`], whose messages are the
//! engine's own.

pub mod error;
pub mod gates;
pub mod pulses;

pub use error::{TranspilerError, TranspilerResult};

use console::style;
use tracing_subscriber::EnvFilter;

/// Install the log subscriber for a `-v` count.
pub fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}
