//! Task trait and types for pipeline elements.

use std::fmt;
use std::sync::Arc;

use crate::controller::Controller;
use crate::error::PassResult;
use crate::property::PropertySet;

/// The kind of pipeline task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Analysis task that reads the IR and writes only to the `PropertySet`.
    Analysis,
    /// Transformation task that produces a new IR.
    Transformation,
    /// Flow controller that schedules other tasks.
    Flow,
}

/// A unit of work run by the pipeline.
///
/// Tasks are the fundamental unit of a pass pipeline. The IR is opaque to
/// the engine: a task receives it by value and hands back the (possibly
/// new) value. Analysis tasks return the IR untouched and communicate
/// through the [`PropertySet`].
///
/// A task is stateless across invocations apart from whatever it was
/// configured with at construction.
pub trait Task<IR>: Send + Sync {
    /// Get the name of this task.
    fn name(&self) -> &str;

    /// Get the kind of this task.
    fn kind(&self) -> PassKind;

    /// Run the task on the given IR.
    fn run(&self, ir: IR, properties: &mut PropertySet) -> PassResult<IR>;

    /// View this task as a flow controller, if it is one.
    ///
    /// The runner uses this to descend into nested controllers instead of
    /// treating them as opaque leaves.
    fn as_controller(&self) -> Option<&dyn Controller<IR>> {
        None
    }
}

/// A task shared between the controllers that schedule it.
pub type SharedTask<IR> = Arc<dyn Task<IR>>;

/// Identity of a task instance.
///
/// Two handles to the same allocation share an identity; two separately
/// constructed tasks never do, even when they are configured identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(usize);

impl TaskId {
    /// Identity of the given task.
    pub fn of<IR>(task: &dyn Task<IR>) -> Self {
        Self(std::ptr::from_ref(task).cast::<()>() as usize)
    }
}

type TaskFn<IR> = dyn Fn(IR, &mut PropertySet) -> PassResult<IR> + Send + Sync;

/// A task backed by a closure.
///
/// Convenient for small passes, tests and glue code where a dedicated
/// type would be noise.
pub struct FnPass<IR> {
    name: String,
    kind: PassKind,
    run: Box<TaskFn<IR>>,
}

impl<IR: 'static> FnPass<IR> {
    /// Create an analysis task; the IR is passed through unchanged.
    pub fn analysis<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&IR, &mut PropertySet) -> PassResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: PassKind::Analysis,
            run: Box::new(move |ir: IR, properties: &mut PropertySet| {
                f(&ir, properties)?;
                Ok(ir)
            }),
        }
    }

    /// Create a transformation task.
    pub fn transformation<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(IR, &mut PropertySet) -> PassResult<IR> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: PassKind::Transformation,
            run: Box::new(f),
        }
    }

    /// Wrap this task for sharing between controllers.
    pub fn shared(self) -> SharedTask<IR> {
        Arc::new(self)
    }
}

impl<IR> Task<IR> for FnPass<IR> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> PassKind {
        self.kind
    }

    fn run(&self, ir: IR, properties: &mut PropertySet) -> PassResult<IR> {
        (self.run)(ir, properties)
    }
}

impl<IR> fmt::Debug for FnPass<IR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPass")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestPass;

    impl Task<u32> for TestPass {
        fn name(&self) -> &'static str {
            "test"
        }

        fn kind(&self) -> PassKind {
            PassKind::Transformation
        }

        fn run(&self, ir: u32, _properties: &mut PropertySet) -> PassResult<u32> {
            Ok(ir + 1)
        }
    }

    #[test]
    fn test_pass_kind() {
        let pass = TestPass;
        assert_eq!(pass.kind(), PassKind::Transformation);
        assert_eq!(pass.name(), "test");
        assert!(pass.as_controller().is_none());
    }

    #[test]
    fn test_fn_pass_analysis_keeps_ir() {
        let pass = FnPass::analysis("size", |ir: &Vec<u8>, props| {
            props.set("size", ir.len());
            Ok(())
        });
        let mut props = PropertySet::new();
        let ir = pass.run(vec![1, 2, 3], &mut props).unwrap();

        assert_eq!(ir, vec![1, 2, 3]);
        assert_eq!(props.get_as::<usize>("size").unwrap(), Some(3));
        assert_eq!(pass.kind(), PassKind::Analysis);
    }

    #[test]
    fn test_task_identity() {
        let a: SharedTask<u32> = Arc::new(TestPass);
        let b: SharedTask<u32> = Arc::new(TestPass);
        let a2 = Arc::clone(&a);

        assert_eq!(TaskId::of(a.as_ref()), TaskId::of(a2.as_ref()));
        assert_ne!(TaskId::of(a.as_ref()), TaskId::of(b.as_ref()));
    }
}
