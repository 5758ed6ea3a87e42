//! Running pass manager: owns a pipeline and executes it.

use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, instrument};

use crate::controller::{ControllerOptions, LinearController, SharedController};
use crate::error::{PassManagerError, PassResult};
use crate::factory::{ControllerFactory, FlowConditions, TaskSet};
use crate::property::PropertySet;
use crate::runner::{CallbackInfo, RunState, Runner};
use crate::task::SharedTask;

/// Manages and executes a pass pipeline.
///
/// The manager is generic over the error kind it reports. Callers that
/// want their own error type plug it in through `E`; every public method
/// converts engine errors with `E::from`, so a `From` impl that keeps the
/// message is all the translation needed.
pub struct PassManager<IR, E = PassManagerError> {
    /// Top-level tasks, run in order.
    tasks: Vec<SharedTask<IR>>,
    options: ControllerOptions,
    factory: ControllerFactory<IR>,
    legacy_skip: bool,
    /// State of the most recent run.
    state: RunState,
    _error: PhantomData<fn() -> E>,
}

impl<IR: 'static, E: From<PassManagerError>> PassManager<IR, E> {
    /// Create an empty pass manager with default options and the built-in
    /// flow controllers.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            options: ControllerOptions::default(),
            factory: ControllerFactory::new(),
            legacy_skip: false,
            state: RunState::default(),
            _error: PhantomData,
        }
    }

    /// Set the options used for controllers built by [`append`](Self::append).
    #[must_use]
    pub fn with_options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a custom controller registry.
    #[must_use]
    pub fn with_factory(mut self, factory: ControllerFactory<IR>) -> Self {
        self.factory = factory;
        self
    }

    /// Skip still-valid analysis passes.
    #[must_use]
    pub fn with_legacy_skip(mut self, enabled: bool) -> Self {
        self.legacy_skip = enabled;
        self
    }

    /// The controller registry, for registering custom aliases.
    pub fn factory_mut(&mut self) -> &mut ControllerFactory<IR> {
        &mut self.factory
    }

    /// Append tasks to the pipeline under the given flow conditions.
    ///
    /// Without conditions a flat task list is appended as is; otherwise the
    /// tasks are wrapped by the registered controllers first.
    pub fn append(
        &mut self,
        tasks: impl Into<TaskSet<IR>>,
        conditions: FlowConditions,
    ) -> Result<(), E> {
        self.normalize(tasks.into(), conditions).map_err(E::from)
    }

    /// Append a prebuilt controller.
    pub fn append_controller(&mut self, controller: SharedController<IR>) {
        debug!("Appending controller: {}", controller.name());
        self.tasks.push(controller.into_task());
    }

    /// Run the pipeline on `ir`.
    #[instrument(skip(self, ir, properties))]
    pub fn run(&mut self, ir: IR, properties: &mut PropertySet) -> Result<IR, E> {
        let root = self.root();
        let mut runner = Runner::new().with_legacy_skip(self.legacy_skip);
        let result = runner.execute(&root, ir, properties);
        self.state = runner.into_state();
        result.map_err(E::from)
    }

    /// Run the pipeline, invoking `callback` after every executed pass.
    pub fn run_with_callback<F>(
        &mut self,
        ir: IR,
        properties: &mut PropertySet,
        callback: F,
    ) -> Result<IR, E>
    where
        F: FnMut(&CallbackInfo<'_, IR>),
    {
        let root = self.root();
        let mut runner = Runner::new()
            .with_legacy_skip(self.legacy_skip)
            .with_callback(callback);
        let result = runner.execute(&root, ir, properties);
        self.state = runner.into_state();
        result.map_err(E::from)
    }

    /// Number of passes executed by the last run.
    pub fn count(&self) -> usize {
        self.state.count()
    }

    /// Number of passes still valid at the end of the last run.
    pub fn valid_passes(&self) -> usize {
        self.state.valid_passes()
    }

    /// State of the last run.
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Top-level tasks.
    pub fn tasks(&self) -> &[SharedTask<IR>] {
        &self.tasks
    }

    /// Get the number of top-level tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if the manager has no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn normalize(&mut self, tasks: TaskSet<IR>, conditions: FlowConditions) -> PassResult<()> {
        match tasks {
            TaskSet::Tasks(tasks) if conditions.is_empty() => {
                debug!("Appending {} tasks", tasks.len());
                self.tasks.extend(tasks);
            }
            tasks => {
                let controller = self.factory.build(tasks, self.options, conditions)?;
                self.append_controller(controller);
            }
        }
        Ok(())
    }

    fn root(&self) -> LinearController<IR> {
        LinearController::new(self.tasks.iter().cloned(), self.options)
    }
}

impl<IR: 'static, E: From<PassManagerError>> Default for PassManager<IR, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<IR, E> fmt::Debug for PassManager<IR, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassManager")
            .field("tasks", &self.tasks.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("options", &self.options)
            .field("factory", &self.factory)
            .field("legacy_skip", &self.legacy_skip)
            .finish_non_exhaustive()
    }
}
