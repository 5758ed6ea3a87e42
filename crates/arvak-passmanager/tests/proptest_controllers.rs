//! Property-based tests for flow controller scheduling.

use arvak_passmanager::{
    ConditionalController, Controller, ControllerOptions, DoWhileController, FnPass,
    LinearController, PassManagerError, PropertySet, SharedTask, Task, TaskStream, predicate,
};
use proptest::prelude::*;

fn named(name: String) -> SharedTask<()> {
    FnPass::analysis(name, |_: &(), _| Ok(())).shared()
}

/// Drain a controller's stream into task names.
fn drain(
    controller: &dyn Controller<()>,
    properties: &PropertySet,
) -> Result<Vec<String>, PassManagerError> {
    let mut stream = controller.iter_tasks(properties);
    let mut names = Vec::new();
    while let Some(task) = stream.next_task(properties)? {
        names.push(task.name().to_string());
    }
    Ok(names)
}

proptest! {
    /// A linear controller yields its input exactly once, in order, on
    /// every call.
    #[test]
    fn test_linear_yields_input_sequence(names in prop::collection::vec("[a-z]{1,8}", 0..20)) {
        let controller = LinearController::new(
            names.iter().cloned().map(named),
            ControllerOptions::default(),
        );
        let props = PropertySet::new();

        prop_assert_eq!(&drain(&controller, &props).unwrap(), &names);
        prop_assert_eq!(&drain(&controller, &props).unwrap(), &names);
    }

    /// A conditional controller yields its tasks iff the predicate holds at
    /// call time.
    #[test]
    fn test_conditional_follows_predicate(
        names in prop::collection::vec("[a-z]{1,8}", 1..10),
        flags in prop::collection::vec(any::<bool>(), 1..6),
    ) {
        let controller = ConditionalController::new(
            names.iter().cloned().map(named),
            predicate(|props| props.get_as::<bool>("run").ok().flatten().unwrap_or(false)),
            ControllerOptions::default(),
        );

        let mut props = PropertySet::new();
        for flag in flags {
            props.set("run", flag);
            let yielded = drain(&controller, &props).unwrap();
            if flag {
                prop_assert_eq!(&yielded, &names);
            } else {
                prop_assert!(yielded.is_empty());
            }
        }
    }

    /// An always-true do-while yields exactly `max_iteration` full passes
    /// before failing.
    #[test]
    fn test_do_while_ceiling(len in 1_usize..6, max_iteration in 1_usize..30) {
        let controller = DoWhileController::new(
            (0..len).map(|i| named(format!("t{i}"))),
            predicate(|_| true),
            ControllerOptions::default().with_max_iteration(max_iteration),
        );
        let props = PropertySet::new();

        let mut stream = controller.iter_tasks(&props);
        let mut yielded = 0;
        let err = loop {
            match stream.next_task(&props) {
                Ok(Some(_)) => yielded += 1,
                Ok(None) => break None,
                Err(e) => break Some(e),
            }
        };

        prop_assert_eq!(yielded, len * max_iteration);
        let is_ceiling = matches!(
            err,
            Some(PassManagerError::MaxIterationReached { max_iteration: m }) if m == max_iteration
        );
        prop_assert!(is_ceiling);
    }
}
