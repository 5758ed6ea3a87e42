//! End-to-end pipeline tests: runner order, factory precedence and error
//! reporting through the pass manager.

use std::sync::{Arc, Mutex};

use arvak_passmanager::{
    ConditionalController, Controller, ControllerFactory, ControllerOptions, FlowConditions,
    FnPass, LinearController, NestingOrder, PassKind, PassManager, PassManagerError, PassResult,
    PropertySet, Runner, SharedTask, Task, predicate,
};

type Trace = Vec<String>;

/// Records its own name in the IR.
struct Record(&'static str);

impl Task<Trace> for Record {
    fn name(&self) -> &str {
        self.0
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, mut ir: Trace, _properties: &mut PropertySet) -> PassResult<Trace> {
        ir.push(self.0.to_string());
        Ok(ir)
    }
}

fn record(name: &'static str) -> SharedTask<Trace> {
    Arc::new(Record(name))
}

#[test]
fn test_runner_executes_conditional_in_declared_order() {
    let seen_by_predicate = Arc::new(Mutex::new(None));
    let seen = Arc::clone(&seen_by_predicate);

    // TaskA also writes a property the predicate must observe.
    let task_a: SharedTask<Trace> = FnPass::transformation("TaskA", |mut ir: Trace, props| {
        props.set("visited_a", true);
        ir.push("TaskA".to_string());
        Ok(ir)
    })
    .shared();
    let conditional: SharedTask<Trace> = Arc::new(ConditionalController::new(
        [record("TaskB")],
        predicate(move |props| {
            *seen.lock().unwrap() = Some(props.contains_key("visited_a"));
            props.get_as::<i64>("x").ok().flatten() == Some(1)
        }),
        ControllerOptions::default(),
    ));
    let root = LinearController::new(
        [task_a, conditional, record("TaskA2")],
        ControllerOptions::default(),
    );

    let mut props = PropertySet::new().with("x", 1);
    let ir = Runner::new().execute(&root, Vec::new(), &mut props).unwrap();

    assert_eq!(ir, ["TaskA", "TaskB", "TaskA2"]);
    assert_eq!(*seen_by_predicate.lock().unwrap(), Some(true));
}

#[test]
fn test_runner_skips_conditional_when_predicate_false() {
    let conditional: SharedTask<Trace> = Arc::new(ConditionalController::new(
        [record("TaskB")],
        predicate(|props| props.get_as::<i64>("x").ok().flatten() == Some(1)),
        ControllerOptions::default(),
    ));
    let root = LinearController::new(
        [record("TaskA"), conditional, record("TaskA2")],
        ControllerOptions::default(),
    );

    let mut props = PropertySet::new().with("x", 2);
    let ir = Runner::new().execute(&root, Vec::new(), &mut props).unwrap();
    assert_eq!(ir, ["TaskA", "TaskA2"]);
}

#[test]
fn test_factory_last_registered_is_outermost() {
    let factory = ControllerFactory::<Trace>::new();
    assert_eq!(factory.hierarchy(), ["condition", "do_while"]);

    let root = factory
        .build(
            vec![record("TaskA")],
            ControllerOptions::default(),
            FlowConditions::new()
                .with("do_while", |_| false)
                .with("condition", |_| true),
        )
        .unwrap();

    assert_eq!(root.name(), "do_while");
    let inner = root.tasks()[0].as_controller().unwrap();
    assert_eq!(inner.name(), "condition");
    let base = inner.tasks()[0].as_controller().unwrap();
    assert_eq!(base.name(), "linear");
    assert_eq!(base.tasks()[0].name(), "TaskA");
}

#[test]
fn test_factory_first_outermost_order() {
    let mut factory = ControllerFactory::<Trace>::new();
    factory.set_nesting_order(NestingOrder::FirstOutermost);

    let root = factory
        .build(
            vec![record("TaskA")],
            ControllerOptions::default(),
            FlowConditions::new()
                .with("condition", |_| true)
                .with("do_while", |_| false),
        )
        .unwrap();

    assert_eq!(root.name(), "condition");
    assert_eq!(root.tasks()[0].name(), "do_while");
}

#[test]
fn test_factory_explicit_hierarchy() {
    let mut factory = ControllerFactory::<Trace>::new();
    factory.set_hierarchy(["do_while", "condition"]).unwrap();

    let root = factory
        .build(
            vec![record("TaskA")],
            ControllerOptions::default(),
            FlowConditions::new()
                .with("condition", |_| true)
                .with("do_while", |_| false),
        )
        .unwrap();
    assert_eq!(root.name(), "condition");
}

#[test]
fn test_factory_custom_alias() {
    let mut factory = ControllerFactory::<Trace>::new();
    // "unless" runs its children when the predicate is false.
    factory.register("unless", |tasks, condition, options| {
        Arc::new(ConditionalController::new(
            tasks,
            predicate(move |props| !condition(props)),
            options,
        ))
    });
    assert_eq!(factory.hierarchy(), ["condition", "do_while", "unless"]);

    let root = factory
        .build(
            vec![record("TaskA")],
            ControllerOptions::default(),
            FlowConditions::new().with("unless", |props| props.contains_key("skip")),
        )
        .unwrap();

    let mut props = PropertySet::new();
    let ir = Runner::new().execute(root.as_ref(), Vec::new(), &mut props).unwrap();
    assert_eq!(ir, ["TaskA"]);

    let mut props = PropertySet::new().with("skip", true);
    let ir = Runner::new().execute(root.as_ref(), Vec::new(), &mut props).unwrap();
    assert!(ir.is_empty());
}

#[test]
fn test_unregister_unknown_alias_leaves_registry() {
    let mut factory = ControllerFactory::<Trace>::new();
    let err = factory.unregister("repeat").unwrap_err();

    assert!(matches!(err, PassManagerError::ControllerNotFound(ref a) if a == "repeat"));
    assert_eq!(factory.hierarchy(), ["condition", "do_while"]);
}

#[test]
fn test_pass_manager_do_while_converges() {
    let bump: SharedTask<Trace> = FnPass::transformation("bump", |mut ir: Trace, props| {
        let n = props.get_as::<u32>("n")?.unwrap_or(0) + 1;
        props.set("n", n);
        ir.push(format!("bump{n}"));
        Ok(ir)
    })
    .shared();

    let mut pm = PassManager::<Trace>::new();
    pm.append(
        vec![bump],
        FlowConditions::new().with("do_while", |props| {
            props.get_as::<u32>("n").ok().flatten() < Some(3)
        }),
    )
    .unwrap();

    let mut props = PropertySet::new();
    let ir = pm.run(Vec::new(), &mut props).unwrap();
    assert_eq!(ir, ["bump1", "bump2", "bump3"]);
    assert_eq!(pm.count(), 3);
}

#[test]
fn test_pass_manager_reports_max_iteration() {
    let mut pm =
        PassManager::<Trace>::new().with_options(ControllerOptions::default().with_max_iteration(5));
    pm.append(
        vec![record("spin")],
        FlowConditions::new().with("do_while", |_| true),
    )
    .unwrap();

    let err = pm.run(Vec::new(), &mut PropertySet::new()).unwrap_err();
    assert!(matches!(
        err,
        PassManagerError::MaxIterationReached { max_iteration: 5 }
    ));
    assert_eq!(err.to_string(), "Maximum iteration reached. max_iteration=5");
    assert_eq!(pm.count(), 5);
}

#[test]
fn test_pass_manager_missing_predicate() {
    let mut pm = PassManager::<Trace>::new();
    let err = pm
        .append(
            vec![record("TaskA")],
            FlowConditions::new().with_optional("do_while", None),
        )
        .unwrap_err();

    assert!(matches!(err, PassManagerError::MissingPredicate { .. }));
    assert!(pm.is_empty());
}

#[test]
fn test_callback_receives_each_pass() {
    let mut pm = PassManager::<Trace>::new();
    pm.append(vec![record("a"), record("b")], FlowConditions::new())
        .unwrap();

    let mut names = Vec::new();
    let mut props = PropertySet::new();
    pm.run_with_callback(Vec::new(), &mut props, |info| {
        names.push(format!("{}#{}", info.task.name(), info.count));
    })
    .unwrap();

    assert_eq!(names, ["a#1", "b#2"]);
}

#[test]
fn test_nested_controller_run_directly() {
    // A controller is a task: running it on its own drives its children.
    let inner = LinearController::new([record("x"), record("y")], ControllerOptions::default());
    let ir = inner.run(Vec::new(), &mut PropertySet::new()).unwrap();
    assert_eq!(ir, ["x", "y"]);
}
