//! Runner: drives a controller tree against one IR value.

use rustc_hash::FxHashSet;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use crate::controller::Controller;
use crate::error::PassResult;
use crate::property::PropertySet;
use crate::task::{PassKind, Task, TaskId};

/// What the runner reports to the callback after each leaf task.
pub struct CallbackInfo<'a, IR> {
    /// The task that just ran.
    pub task: &'a dyn Task<IR>,
    /// The IR as returned by the task.
    pub ir: &'a IR,
    /// Wall-clock time spent inside the task.
    pub elapsed: Duration,
    /// The property set after the task ran.
    pub properties: &'a PropertySet,
    /// Number of leaf tasks executed so far, this one included.
    pub count: usize,
}

/// Observer invoked after every leaf task.
pub type Callback<'cb, IR> = Box<dyn FnMut(&CallbackInfo<'_, IR>) + 'cb>;

/// Bookkeeping of one run.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    count: usize,
    completed: FxHashSet<TaskId>,
}

impl RunState {
    /// Number of leaf tasks executed.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of tasks that ran and have not been invalidated since.
    pub fn valid_passes(&self) -> usize {
        self.completed.len()
    }

    /// Check whether `task` ran and has not been invalidated since.
    pub fn is_valid<IR>(&self, task: &dyn Task<IR>) -> bool {
        self.completed.contains(&TaskId::of(task))
    }

    fn record(&mut self, id: TaskId, kind: PassKind) {
        self.count += 1;
        // A transformation may change anything earlier analyses computed.
        if kind == PassKind::Transformation {
            self.completed.clear();
        }
        self.completed.insert(id);
    }
}

/// Executes a controller tree depth-first.
///
/// Nested controllers are descended into; every other task is run with the
/// current IR and its return value replaces the IR. Errors from tasks and
/// controllers propagate unchanged.
pub struct Runner<'cb, IR> {
    callback: Option<Callback<'cb, IR>>,
    legacy_skip: bool,
    state: RunState,
}

impl<'cb, IR> Runner<'cb, IR> {
    /// Create a runner without a callback.
    pub fn new() -> Self {
        Self {
            callback: None,
            legacy_skip: false,
            state: RunState::default(),
        }
    }

    /// Observe every leaf task execution.
    #[must_use]
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&CallbackInfo<'_, IR>) + 'cb,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Skip analysis tasks that already ran and were not invalidated by a
    /// transformation since.
    #[must_use]
    pub fn with_legacy_skip(mut self, enabled: bool) -> Self {
        self.legacy_skip = enabled;
        self
    }

    /// State accumulated so far.
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Consume the runner, keeping its state.
    pub fn into_state(self) -> RunState {
        self.state
    }

    /// Run `root` to completion against `ir`.
    #[instrument(skip_all, fields(root = root.name()))]
    pub fn execute(
        &mut self,
        root: &dyn Controller<IR>,
        ir: IR,
        properties: &mut PropertySet,
    ) -> PassResult<IR> {
        info!("Running pipeline with {} top-level tasks", root.tasks().len());

        let ir = self.drive(root, ir, properties)?;

        info!(
            "Pipeline completed, {} tasks executed, {} valid",
            self.state.count(),
            self.state.valid_passes()
        );
        Ok(ir)
    }

    fn drive(
        &mut self,
        controller: &dyn Controller<IR>,
        mut ir: IR,
        properties: &mut PropertySet,
    ) -> PassResult<IR> {
        let mut stream = controller.iter_tasks(properties);
        while let Some(task) = stream.next_task(properties)? {
            ir = match task.as_controller() {
                Some(inner) => {
                    debug!("Entering controller: {}", inner.name());
                    self.drive(inner, ir, properties)?
                }
                None => self.run_leaf(task.as_ref(), ir, properties)?,
            };
        }
        Ok(ir)
    }

    fn run_leaf(
        &mut self,
        task: &dyn Task<IR>,
        ir: IR,
        properties: &mut PropertySet,
    ) -> PassResult<IR> {
        let id = TaskId::of(task);
        let kind = task.kind();

        if self.legacy_skip && kind == PassKind::Analysis && self.state.completed.contains(&id) {
            debug!("Skipping still-valid analysis: {}", task.name());
            return Ok(ir);
        }

        debug!("Running task: {}", task.name());
        let start = Instant::now();
        let ir = task.run(ir, properties)?;
        let elapsed = start.elapsed();

        self.state.record(id, kind);
        debug!("Task {} completed in {:.2?}", task.name(), elapsed);

        if let Some(callback) = self.callback.as_mut() {
            callback(&CallbackInfo {
                task,
                ir: &ir,
                elapsed,
                properties,
                count: self.state.count,
            });
        }

        Ok(ir)
    }
}

impl<IR> Default for Runner<'_, IR> {
    fn default() -> Self {
        Self::new()
    }
}

impl<IR> fmt::Debug for Runner<'_, IR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("has_callback", &self.callback.is_some())
            .field("legacy_skip", &self.legacy_skip)
            .field("state", &self.state)
            .finish()
    }
}
