//! Flow controllers: tasks that decide which of their child tasks run.
//!
//! A controller owns a fixed, ordered list of child tasks and turns it into
//! a lazily produced stream of tasks to execute. Because a controller is
//! itself a [`Task`], controllers nest freely:
//!
//! ```text
//! DoWhileController(fixed_point == false)
//!   └── ConditionalController(optimization_level > 0)
//!         └── LinearController
//!               ├── CountOps        (analysis)
//!               ├── CancelPairs     (transformation)
//!               └── FixedPoint      (analysis)
//! ```
//!
//! The stream is pull-based: the runner asks [`TaskStream::next_task`] for
//! the next task and hands over the current [`PropertySet`] on every pull.
//! Predicates therefore always see the writes of the tasks that ran before
//! them, and an unbounded do-while loop is never materialized.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::error::{PassManagerError, PassResult};
use crate::property::PropertySet;
use crate::runner::Runner;
use crate::task::{PassKind, SharedTask, Task};

/// Default ceiling for do-while iterations.
pub const DEFAULT_MAX_ITERATION: usize = 1000;

/// A condition evaluated against the current property set.
pub type Predicate = Arc<dyn Fn(&PropertySet) -> bool + Send + Sync>;

/// Wrap a closure as a [`Predicate`].
pub fn predicate<F>(f: F) -> Predicate
where
    F: Fn(&PropertySet) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Configuration shared by the controllers of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerOptions {
    /// Upper bound on do-while repetitions before the loop is declared
    /// non-convergent.
    pub max_iteration: usize,
}

impl ControllerOptions {
    /// Set the iteration ceiling.
    #[must_use]
    pub fn with_max_iteration(mut self, max_iteration: usize) -> Self {
        self.max_iteration = max_iteration;
        self
    }

    /// Parse options from JSON. Missing fields take their defaults.
    ///
    /// ```
    /// use arvak_passmanager::ControllerOptions;
    ///
    /// let options = ControllerOptions::from_json(r#"{"max_iteration": 25}"#).unwrap();
    /// assert_eq!(options.max_iteration, 25);
    /// assert_eq!(ControllerOptions::from_json("{}").unwrap(), ControllerOptions::default());
    /// ```
    pub fn from_json(json: &str) -> PassResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| PassManagerError::InvalidConfiguration(e.to_string()))
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            max_iteration: DEFAULT_MAX_ITERATION,
        }
    }
}

/// Pull-based source of tasks produced by a controller.
pub trait TaskStream<IR> {
    /// Produce the next task to execute, or `None` once the controller is
    /// done. `properties` is the state as of this pull.
    fn next_task(&mut self, properties: &PropertySet) -> PassResult<Option<SharedTask<IR>>>;
}

/// A boxed task stream borrowing from its controller.
pub type BoxTaskStream<'a, IR> = Box<dyn TaskStream<IR> + 'a>;

/// A task that schedules an ordered sequence of child tasks.
pub trait Controller<IR>: Task<IR> {
    /// The child tasks, in declaration order.
    fn tasks(&self) -> &[SharedTask<IR>];

    /// The options this controller was built with.
    fn options(&self) -> &ControllerOptions;

    /// Start a fresh pass over the children.
    ///
    /// Every call re-reads `properties`; nothing is cached between calls.
    fn iter_tasks<'a>(&'a self, properties: &PropertySet) -> BoxTaskStream<'a, IR>;

    /// Convert a shared controller into a shared task so it can be nested.
    fn into_task(self: Arc<Self>) -> SharedTask<IR>;
}

/// A controller shared between its parent and its builder.
pub type SharedController<IR> = Arc<dyn Controller<IR>>;

/// Yields every task of a slice once, in order.
struct SequenceStream<'a, IR> {
    tasks: std::slice::Iter<'a, SharedTask<IR>>,
}

impl<'a, IR> SequenceStream<'a, IR> {
    fn new(tasks: &'a [SharedTask<IR>]) -> Self {
        Self {
            tasks: tasks.iter(),
        }
    }
}

impl<IR> TaskStream<IR> for SequenceStream<'_, IR> {
    fn next_task(&mut self, _properties: &PropertySet) -> PassResult<Option<SharedTask<IR>>> {
        Ok(self.tasks.next().cloned())
    }
}

/// Repeats the children until the predicate turns false.
struct DoWhileStream<'a, IR> {
    tasks: &'a [SharedTask<IR>],
    predicate: &'a Predicate,
    max_iteration: usize,
    iteration: usize,
    position: usize,
    finished: bool,
}

impl<IR> TaskStream<IR> for DoWhileStream<'_, IR> {
    fn next_task(&mut self, properties: &PropertySet) -> PassResult<Option<SharedTask<IR>>> {
        if self.finished {
            return Ok(None);
        }
        if self.max_iteration == 0 {
            self.finished = true;
            return Err(PassManagerError::MaxIterationReached { max_iteration: 0 });
        }

        loop {
            if let Some(task) = self.tasks.get(self.position) {
                self.position += 1;
                return Ok(Some(Arc::clone(task)));
            }

            self.iteration += 1;
            self.position = 0;
            let repeat = (self.predicate)(properties);
            trace!(iteration = self.iteration, repeat, "do-while condition evaluated");

            if !repeat {
                self.finished = true;
                return Ok(None);
            }
            if self.iteration >= self.max_iteration {
                self.finished = true;
                return Err(PassManagerError::MaxIterationReached {
                    max_iteration: self.max_iteration,
                });
            }
        }
    }
}

fn append_tasks<IR>(
    name: &str,
    tasks: &mut Vec<SharedTask<IR>>,
    new_tasks: impl IntoIterator<Item = SharedTask<IR>>,
) {
    warn!(
        controller = name,
        "Appending to a constructed controller is deprecated; \
         provide all tasks at construction time"
    );
    tasks.extend(new_tasks);
}

/// A controller that runs its tasks one after the other.
pub struct LinearController<IR> {
    tasks: Vec<SharedTask<IR>>,
    options: ControllerOptions,
}

impl<IR: 'static> LinearController<IR> {
    /// Create a linear controller over `tasks`.
    pub fn new(
        tasks: impl IntoIterator<Item = SharedTask<IR>>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            tasks: tasks.into_iter().collect(),
            options,
        }
    }

    /// Add tasks after construction.
    #[deprecated(
        since = "0.1.0",
        note = "All tasks must be provided at construction time; use `ControllerBuilder`"
    )]
    pub fn append(&mut self, tasks: impl IntoIterator<Item = SharedTask<IR>>) {
        append_tasks("linear", &mut self.tasks, tasks);
    }
}

impl<IR: 'static> Task<IR> for LinearController<IR> {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn kind(&self) -> PassKind {
        PassKind::Flow
    }

    fn run(&self, ir: IR, properties: &mut PropertySet) -> PassResult<IR> {
        Runner::new().execute(self, ir, properties)
    }

    fn as_controller(&self) -> Option<&dyn Controller<IR>> {
        Some(self)
    }
}

impl<IR: 'static> Controller<IR> for LinearController<IR> {
    fn tasks(&self) -> &[SharedTask<IR>] {
        &self.tasks
    }

    fn options(&self) -> &ControllerOptions {
        &self.options
    }

    fn iter_tasks<'a>(&'a self, _properties: &PropertySet) -> BoxTaskStream<'a, IR> {
        Box::new(SequenceStream::new(&self.tasks))
    }

    fn into_task(self: Arc<Self>) -> SharedTask<IR> {
        self
    }
}

/// A controller that runs its tasks once when the condition holds.
pub struct ConditionalController<IR> {
    tasks: Vec<SharedTask<IR>>,
    condition: Predicate,
    options: ControllerOptions,
}

impl<IR: 'static> ConditionalController<IR> {
    /// Create a conditional controller over `tasks`.
    pub fn new(
        tasks: impl IntoIterator<Item = SharedTask<IR>>,
        condition: Predicate,
        options: ControllerOptions,
    ) -> Self {
        Self {
            tasks: tasks.into_iter().collect(),
            condition,
            options,
        }
    }

    /// Add tasks after construction.
    #[deprecated(
        since = "0.1.0",
        note = "All tasks must be provided at construction time; use `ControllerBuilder`"
    )]
    pub fn append(&mut self, tasks: impl IntoIterator<Item = SharedTask<IR>>) {
        append_tasks("condition", &mut self.tasks, tasks);
    }
}

impl<IR: 'static> Task<IR> for ConditionalController<IR> {
    fn name(&self) -> &'static str {
        "condition"
    }

    fn kind(&self) -> PassKind {
        PassKind::Flow
    }

    fn run(&self, ir: IR, properties: &mut PropertySet) -> PassResult<IR> {
        Runner::new().execute(self, ir, properties)
    }

    fn as_controller(&self) -> Option<&dyn Controller<IR>> {
        Some(self)
    }
}

impl<IR: 'static> Controller<IR> for ConditionalController<IR> {
    fn tasks(&self) -> &[SharedTask<IR>] {
        &self.tasks
    }

    fn options(&self) -> &ControllerOptions {
        &self.options
    }

    fn iter_tasks<'a>(&'a self, properties: &PropertySet) -> BoxTaskStream<'a, IR> {
        let met = (self.condition)(properties);
        trace!(met, "condition evaluated");
        let tasks: &'a [SharedTask<IR>] = if met { &self.tasks } else { &[] };
        Box::new(SequenceStream::new(tasks))
    }

    fn into_task(self: Arc<Self>) -> SharedTask<IR> {
        self
    }
}

/// A controller that repeats its tasks while the condition holds.
///
/// The children always run at least once. The condition is checked after
/// each full pass; after `max_iteration` passes with the condition still
/// true the stream fails with [`PassManagerError::MaxIterationReached`].
pub struct DoWhileController<IR> {
    tasks: Vec<SharedTask<IR>>,
    do_while: Predicate,
    options: ControllerOptions,
}

impl<IR: 'static> DoWhileController<IR> {
    /// Create a do-while controller over `tasks`.
    pub fn new(
        tasks: impl IntoIterator<Item = SharedTask<IR>>,
        do_while: Predicate,
        options: ControllerOptions,
    ) -> Self {
        Self {
            tasks: tasks.into_iter().collect(),
            do_while,
            options,
        }
    }

    /// Add tasks after construction.
    #[deprecated(
        since = "0.1.0",
        note = "All tasks must be provided at construction time; use `ControllerBuilder`"
    )]
    pub fn append(&mut self, tasks: impl IntoIterator<Item = SharedTask<IR>>) {
        append_tasks("do_while", &mut self.tasks, tasks);
    }
}

impl<IR: 'static> Task<IR> for DoWhileController<IR> {
    fn name(&self) -> &'static str {
        "do_while"
    }

    fn kind(&self) -> PassKind {
        PassKind::Flow
    }

    fn run(&self, ir: IR, properties: &mut PropertySet) -> PassResult<IR> {
        Runner::new().execute(self, ir, properties)
    }

    fn as_controller(&self) -> Option<&dyn Controller<IR>> {
        Some(self)
    }
}

impl<IR: 'static> Controller<IR> for DoWhileController<IR> {
    fn tasks(&self) -> &[SharedTask<IR>] {
        &self.tasks
    }

    fn options(&self) -> &ControllerOptions {
        &self.options
    }

    fn iter_tasks<'a>(&'a self, _properties: &PropertySet) -> BoxTaskStream<'a, IR> {
        Box::new(DoWhileStream {
            tasks: &self.tasks,
            predicate: &self.do_while,
            max_iteration: self.options.max_iteration,
            iteration: 0,
            position: 0,
            finished: false,
        })
    }

    fn into_task(self: Arc<Self>) -> SharedTask<IR> {
        self
    }
}

macro_rules! impl_controller_debug {
    ($($ty:ident),*) => {$(
        impl<IR> fmt::Debug for $ty<IR> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("tasks", &self.tasks.iter().map(|t| t.name()).collect::<Vec<_>>())
                    .field("options", &self.options)
                    .finish_non_exhaustive()
            }
        }
    )*};
}

impl_controller_debug!(LinearController, ConditionalController, DoWhileController);

/// Collects tasks and options, then produces an immutable controller.
///
/// ```
/// use arvak_passmanager::{ControllerBuilder, Controller, FnPass, predicate};
///
/// let controller = ControllerBuilder::<Vec<u8>>::new()
///     .task(FnPass::analysis("noop", |_: &Vec<u8>, _| Ok(())))
///     .max_iteration(10)
///     .do_while(predicate(|props| props.get("converged").is_none()));
///
/// assert_eq!(controller.tasks().len(), 1);
/// assert_eq!(controller.options().max_iteration, 10);
/// ```
pub struct ControllerBuilder<IR> {
    tasks: Vec<SharedTask<IR>>,
    options: ControllerOptions,
}

impl<IR: 'static> ControllerBuilder<IR> {
    /// Create an empty builder with default options.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            options: ControllerOptions::default(),
        }
    }

    /// Add a task.
    #[must_use]
    pub fn task(mut self, task: impl Task<IR> + 'static) -> Self {
        self.tasks.push(Arc::new(task));
        self
    }

    /// Add an already shared task.
    #[must_use]
    pub fn shared(mut self, task: SharedTask<IR>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Add several shared tasks.
    #[must_use]
    pub fn tasks(mut self, tasks: impl IntoIterator<Item = SharedTask<IR>>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    /// Replace the options.
    #[must_use]
    pub fn options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the do-while iteration ceiling.
    #[must_use]
    pub fn max_iteration(mut self, max_iteration: usize) -> Self {
        self.options.max_iteration = max_iteration;
        self
    }

    /// Finish as a [`LinearController`].
    pub fn linear(self) -> LinearController<IR> {
        LinearController::new(self.tasks, self.options)
    }

    /// Finish as a [`ConditionalController`].
    pub fn conditional(self, condition: Predicate) -> ConditionalController<IR> {
        ConditionalController::new(self.tasks, condition, self.options)
    }

    /// Finish as a [`DoWhileController`].
    pub fn do_while(self, do_while: Predicate) -> DoWhileController<IR> {
        DoWhileController::new(self.tasks, do_while, self.options)
    }
}

impl<IR: 'static> Default for ControllerBuilder<IR> {
    fn default() -> Self {
        Self::new()
    }
}
