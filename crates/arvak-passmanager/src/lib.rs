//! Arvak Pass Pipeline Engine
//!
//! This crate provides the execution machinery behind compilation
//! pipelines: composable flow controllers, a registry that builds nested
//! controllers from named conditions, and a runner that drives the
//! resulting tree against an opaque intermediate representation.
//!
//! # Overview
//!
//! A pipeline is a tree of [`Task`]s. Leaves are passes that analyse or
//! transform the IR; inner nodes are [`Controller`]s that decide which of
//! their children run:
//! 1. **Linear**: every child once, in order
//! 2. **Conditional**: every child once, if a predicate holds
//! 3. **Do-while**: all children repeatedly, until a predicate fails
//!
//! Tasks communicate only through the [`PropertySet`]. Predicates read it
//! at the moment they are evaluated, so a controller always reacts to the
//! writes of the passes that ran before it.
//!
//! # Architecture
//!
//! ```text
//!  tasks + FlowConditions
//!           │
//!           ▼
//! ┌───────────────────┐
//! │ ControllerFactory │ ◄── registry: "condition", "do_while", ...
//! └───────────────────┘
//!           │
//!           ▼
//! ┌───────────────────┐
//! │    PassManager    │ ── E: From<PassManagerError>
//! └───────────────────┘
//!           │
//!           ▼
//! ┌───────────────────┐
//! │      Runner       │ ◄── PropertySet, callback
//! └───────────────────┘
//!           │
//!           ├── LinearController
//!           ├── ConditionalController
//!           └── DoWhileController
//!           │
//!           ▼
//!       Output IR
//! ```
//!
//! # Example: Iterating to a Fixed Point
//!
//! ```rust
//! use arvak_passmanager::{FlowConditions, FnPass, PassManager, PropertySet};
//!
//! // Halve the value until it stops changing.
//! let halve = FnPass::transformation("halve", |ir: u64, props| {
//!     props.set("changed", ir / 2 != ir);
//!     Ok(ir / 2)
//! });
//!
//! let mut pm = PassManager::<u64>::new();
//! pm.append(
//!     vec![halve.shared()],
//!     FlowConditions::new().with("do_while", |props| {
//!         props.get_as::<bool>("changed").ok().flatten().unwrap_or(false)
//!     }),
//! )
//! .unwrap();
//!
//! let mut props = PropertySet::new();
//! assert_eq!(pm.run(40, &mut props).unwrap(), 0);
//! assert_eq!(pm.count(), 7);
//! ```
//!
//! # Custom Tasks
//!
//! Implement the [`Task`] trait for passes that carry configuration:
//!
//! ```rust
//! use arvak_passmanager::{PassKind, PassResult, PropertySet, Task};
//!
//! struct Scale(u32);
//!
//! impl Task<Vec<u32>> for Scale {
//!     fn name(&self) -> &str { "scale" }
//!     fn kind(&self) -> PassKind { PassKind::Transformation }
//!
//!     fn run(&self, ir: Vec<u32>, _props: &mut PropertySet) -> PassResult<Vec<u32>> {
//!         Ok(ir.into_iter().map(|v| v * self.0).collect())
//!     }
//! }
//! ```

pub mod controller;
pub mod error;
pub mod factory;
pub mod manager;
pub mod property;
pub mod runner;
pub mod task;

pub use controller::{
    BoxTaskStream, ConditionalController, Controller, ControllerBuilder, ControllerOptions,
    DEFAULT_MAX_ITERATION, DoWhileController, LinearController, Predicate, SharedController,
    TaskStream, predicate,
};
pub use error::{PassManagerError, PassResult};
pub use factory::{ControllerConstructor, ControllerFactory, FlowConditions, NestingOrder, TaskSet};
pub use manager::PassManager;
pub use property::PropertySet;
pub use runner::{Callback, CallbackInfo, RunState, Runner};
pub use task::{FnPass, PassKind, SharedTask, Task, TaskId};
