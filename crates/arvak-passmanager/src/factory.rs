//! Controller factory: builds nested controllers from named flow conditions.
//!
//! Pipelines are usually described as "these passes, run under these
//! conditions". The factory turns such a description into a controller
//! tree. Each flow condition is keyed by an alias (`"condition"`,
//! `"do_while"`, or any alias registered by the caller); the registry maps
//! aliases to controller constructors and keeps an explicit priority order
//! that decides which controller wraps which.
//!
//! ```
//! use arvak_passmanager::{
//!     Controller, ControllerFactory, ControllerOptions, FlowConditions, FnPass, Task,
//! };
//!
//! let factory = ControllerFactory::<Vec<u8>>::new();
//! let root = factory
//!     .build(
//!         vec![FnPass::analysis("noop", |_: &Vec<u8>, _| Ok(())).shared()],
//!         ControllerOptions::default(),
//!         FlowConditions::new()
//!             .with("condition", |props| props.contains_key("enabled"))
//!             .with("do_while", |props| props.get("fixed_point").is_none()),
//!     )
//!     .unwrap();
//!
//! // "do_while" is registered after "condition", so it ends up outermost.
//! assert_eq!(root.name(), "do_while");
//! assert_eq!(root.tasks()[0].name(), "condition");
//! ```
//!
//! The registry is a plain value owned by whoever builds pipelines. It is
//! not synchronized; share it behind a lock if several threads register
//! aliases.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::controller::{
    ConditionalController, ControllerOptions, DoWhileController, LinearController, Predicate,
    SharedController,
};
use crate::error::{PassManagerError, PassResult};
use crate::property::PropertySet;
use crate::task::SharedTask;

/// Builds a controller around its single child.
pub type ControllerConstructor<IR> =
    Arc<dyn Fn(Vec<SharedTask<IR>>, Predicate, ControllerOptions) -> SharedController<IR> + Send + Sync>;

/// How the priority list maps to nesting depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NestingOrder {
    /// The alias registered last wraps all others.
    #[default]
    LastOutermost,
    /// The alias registered first wraps all others.
    FirstOutermost,
}

/// Named flow conditions handed to [`ControllerFactory::build`].
///
/// A condition may be recorded without a predicate (for example when the
/// predicate is looked up from configuration and was not found); building
/// with such an entry fails.
#[derive(Clone, Default)]
pub struct FlowConditions {
    entries: Vec<(String, Option<Predicate>)>,
}

impl FlowConditions {
    /// No conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition from a closure.
    #[must_use]
    pub fn with<F>(self, alias: impl Into<String>, f: F) -> Self
    where
        F: Fn(&PropertySet) -> bool + Send + Sync + 'static,
    {
        self.with_optional(alias, Some(Arc::new(f)))
    }

    /// Add a condition that may lack its predicate.
    #[must_use]
    pub fn with_optional(mut self, alias: impl Into<String>, predicate: Option<Predicate>) -> Self {
        let alias = alias.into();
        match self.entries.iter_mut().find(|(a, _)| *a == alias) {
            Some(entry) => entry.1 = predicate,
            None => self.entries.push((alias, predicate)),
        }
        self
    }

    /// Check if no condition is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aliases in insertion order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(a, _)| a.as_str())
    }

    fn get(&self, alias: &str) -> Option<&Predicate> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .and_then(|(_, p)| p.as_ref())
    }
}

impl fmt::Debug for FlowConditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(a, p)| (a, p.is_some())))
            .finish()
    }
}

/// Input to [`ControllerFactory::build`]: a prebuilt controller or a flat
/// task list.
pub enum TaskSet<IR> {
    /// Used as is; the factory only wraps it.
    Controller(SharedController<IR>),
    /// Wrapped in a [`LinearController`] first.
    Tasks(Vec<SharedTask<IR>>),
}

impl<IR> From<Vec<SharedTask<IR>>> for TaskSet<IR> {
    fn from(tasks: Vec<SharedTask<IR>>) -> Self {
        Self::Tasks(tasks)
    }
}

impl<IR> From<SharedController<IR>> for TaskSet<IR> {
    fn from(controller: SharedController<IR>) -> Self {
        Self::Controller(controller)
    }
}

/// Registry of flow controller aliases.
pub struct ControllerFactory<IR> {
    registered: FxHashMap<String, ControllerConstructor<IR>>,
    hierarchy: Vec<String>,
    nesting: NestingOrder,
}

impl<IR: 'static> ControllerFactory<IR> {
    /// Create a registry with the built-in `condition` and `do_while`
    /// aliases, in that order.
    pub fn new() -> Self {
        let mut factory = Self::empty();
        factory.register("condition", |tasks, condition, options| {
            Arc::new(ConditionalController::new(tasks, condition, options))
        });
        factory.register("do_while", |tasks, do_while, options| {
            Arc::new(DoWhileController::new(tasks, do_while, options))
        });
        factory
    }

    /// Create a registry without any alias.
    pub fn empty() -> Self {
        Self {
            registered: FxHashMap::default(),
            hierarchy: Vec::new(),
            nesting: NestingOrder::default(),
        }
    }

    /// Register (or replace) the constructor for `alias`.
    ///
    /// A new alias is appended to the priority order; replacing an existing
    /// alias keeps its position.
    pub fn register<F>(&mut self, alias: impl Into<String>, constructor: F)
    where
        F: Fn(Vec<SharedTask<IR>>, Predicate, ControllerOptions) -> SharedController<IR>
            + Send
            + Sync
            + 'static,
    {
        let alias = alias.into();
        if !self.hierarchy.contains(&alias) {
            self.hierarchy.push(alias.clone());
        }
        debug!("Registered flow controller: {}", alias);
        self.registered.insert(alias, Arc::new(constructor));
    }

    /// Remove `alias` from the registry and from the priority order.
    pub fn unregister(&mut self, alias: &str) -> PassResult<()> {
        let position = self
            .hierarchy
            .iter()
            .position(|a| a == alias)
            .ok_or_else(|| PassManagerError::ControllerNotFound(alias.to_string()))?;
        self.hierarchy.remove(position);
        self.registered.remove(alias);
        debug!("Unregistered flow controller: {}", alias);
        Ok(())
    }

    /// Check if `alias` is registered.
    pub fn is_registered(&self, alias: &str) -> bool {
        self.registered.contains_key(alias)
    }

    /// The priority order, in registration order.
    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    /// Pin the priority order explicitly.
    ///
    /// `order` must name every registered alias exactly once.
    pub fn set_hierarchy<S: Into<String>>(
        &mut self,
        order: impl IntoIterator<Item = S>,
    ) -> PassResult<()> {
        let order: Vec<String> = order.into_iter().map(Into::into).collect();
        let mut sorted_new = order.clone();
        sorted_new.sort();
        let mut sorted_old = self.hierarchy.clone();
        sorted_old.sort();
        if sorted_new != sorted_old {
            return Err(PassManagerError::InvalidConfiguration(format!(
                "hierarchy {order:?} is not a permutation of the registered aliases {:?}",
                self.hierarchy
            )));
        }
        self.hierarchy = order;
        Ok(())
    }

    /// How the priority order maps to nesting.
    pub fn nesting_order(&self) -> NestingOrder {
        self.nesting
    }

    /// Choose how the priority order maps to nesting.
    pub fn set_nesting_order(&mut self, nesting: NestingOrder) {
        self.nesting = nesting;
    }

    /// Build a controller tree.
    ///
    /// A flat task list is first wrapped in a [`LinearController`]; a
    /// prebuilt controller is taken as is. Then, walking the priority order
    /// from innermost to outermost, every alias present in `conditions`
    /// wraps the tree built so far.
    pub fn build(
        &self,
        tasks: impl Into<TaskSet<IR>>,
        options: ControllerOptions,
        conditions: FlowConditions,
    ) -> PassResult<SharedController<IR>> {
        for (alias, predicate) in &conditions.entries {
            if predicate.is_none() {
                return Err(PassManagerError::MissingPredicate {
                    alias: alias.clone(),
                });
            }
            if !self.registered.contains_key(alias) {
                return Err(PassManagerError::UnknownController(alias.clone()));
            }
        }

        let mut instance: SharedController<IR> = match tasks.into() {
            TaskSet::Controller(controller) => controller,
            TaskSet::Tasks(tasks) => Arc::new(LinearController::new(tasks, options)),
        };

        for alias in self.innermost_first() {
            let (Some(predicate), Some(constructor)) =
                (conditions.get(alias), self.registered.get(alias))
            else {
                continue;
            };
            debug!("Wrapping pipeline in '{}' controller", alias);
            instance = constructor(vec![instance.into_task()], Arc::clone(predicate), options);
        }

        Ok(instance)
    }

    fn innermost_first(&self) -> Box<dyn Iterator<Item = &String> + '_> {
        match self.nesting {
            NestingOrder::LastOutermost => Box::new(self.hierarchy.iter()),
            NestingOrder::FirstOutermost => Box::new(self.hierarchy.iter().rev()),
        }
    }
}

impl<IR: 'static> Default for ControllerFactory<IR> {
    fn default() -> Self {
        Self::new()
    }
}

impl<IR> fmt::Debug for ControllerFactory<IR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerFactory")
            .field("hierarchy", &self.hierarchy)
            .field("nesting", &self.nesting)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::FnPass;

    fn tasks() -> Vec<SharedTask<()>> {
        vec![FnPass::analysis("noop", |_: &(), _| Ok(())).shared()]
    }

    #[test]
    fn test_builtin_hierarchy() {
        let factory = ControllerFactory::<()>::new();
        assert_eq!(factory.hierarchy(), ["condition", "do_while"]);
        assert!(factory.is_registered("condition"));
    }

    #[test]
    fn test_no_conditions_builds_linear() {
        let factory = ControllerFactory::<()>::new();
        let root = factory
            .build(tasks(), ControllerOptions::default(), FlowConditions::new())
            .unwrap();
        assert_eq!(root.name(), "linear");
        assert_eq!(root.tasks().len(), 1);
    }

    #[test]
    fn test_missing_predicate_rejected() {
        let factory = ControllerFactory::<()>::new();
        let Err(err) = factory.build(
            tasks(),
            ControllerOptions::default(),
            FlowConditions::new().with_optional("condition", None),
        ) else {
            panic!("a condition without predicate must be rejected");
        };
        assert!(matches!(err, PassManagerError::MissingPredicate { ref alias } if alias == "condition"));
        assert!(err.to_string().contains("The controller needs a callable"));
    }

    #[test]
    fn test_unknown_alias_rejected() {
        let factory = ControllerFactory::<()>::new();
        let Err(err) = factory.build(
            tasks(),
            ControllerOptions::default(),
            FlowConditions::new().with("repeat_until", |_| true),
        ) else {
            panic!("an unregistered alias must be rejected");
        };
        assert!(matches!(err, PassManagerError::UnknownController(ref a) if a == "repeat_until"));
    }

    #[test]
    fn test_prebuilt_controller_passes_through() {
        let factory = ControllerFactory::<()>::new();
        let prebuilt: SharedController<()> =
            Arc::new(LinearController::new(tasks(), ControllerOptions::default()));
        let root = factory
            .build(
                Arc::clone(&prebuilt),
                ControllerOptions::default().with_max_iteration(5),
                FlowConditions::new(),
            )
            .unwrap();
        assert!(Arc::ptr_eq(&root, &prebuilt));
        assert_eq!(root.options().max_iteration, 1000);
    }

    #[test]
    fn test_unregister() {
        let mut factory = ControllerFactory::<()>::new();
        factory.unregister("condition").unwrap();
        assert_eq!(factory.hierarchy(), ["do_while"]);
        assert!(!factory.is_registered("condition"));

        let err = factory.unregister("condition").unwrap_err();
        assert_eq!(err.to_string(), "Flow controller not found: condition");
        assert_eq!(factory.hierarchy(), ["do_while"]);
    }

    #[test]
    fn test_register_existing_keeps_position() {
        let mut factory = ControllerFactory::<()>::new();
        factory.register("condition", |tasks, condition, options| {
            Arc::new(ConditionalController::new(tasks, condition, options))
        });
        assert_eq!(factory.hierarchy(), ["condition", "do_while"]);
    }

    #[test]
    fn test_set_hierarchy_requires_permutation() {
        let mut factory = ControllerFactory::<()>::new();
        assert!(factory.set_hierarchy(["do_while"]).is_err());
        factory.set_hierarchy(["do_while", "condition"]).unwrap();
        assert_eq!(factory.hierarchy(), ["do_while", "condition"]);
    }
}
