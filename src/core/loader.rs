//! Deferred command construction

use crate::core::command::Command;
use crate::error::{ConsoleError, Result};
use indexmap::IndexMap;
use tracing::debug;

/// A source of commands that are only built when first requested
pub trait CommandLoader {
    /// Whether the loader can build `name`
    fn has(&self, name: &str) -> bool;

    /// Build the command registered as `name`
    fn get(&self, name: &str) -> Result<Command>;

    /// Every name the loader can build
    fn names(&self) -> Vec<String>;
}

type Factory = Box<dyn Fn() -> Result<Command>>;

/// Loader backed by one factory function per command name
#[derive(Default)]
pub struct FactoryCommandLoader {
    factories: IndexMap<String, Factory>,
}

impl FactoryCommandLoader {
    /// Create a new loader with no factories
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous one
    #[must_use]
    pub fn with_factory<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Command> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }
}

impl CommandLoader for FactoryCommandLoader {
    fn has(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    fn get(&self, name: &str) -> Result<Command> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ConsoleError::command_not_found(name, Vec::new()))?;
        debug!("Loading command: {}", name);
        factory()
    }

    fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_factory_runs_only_on_get() {
        let built = Rc::new(Cell::new(0));
        let counter = Rc::clone(&built);
        let loader = FactoryCommandLoader::new().with_factory("db seed", move || {
            counter.set(counter.get() + 1);
            Ok(Command::from_fn("db seed", |_| Ok(0)))
        });

        assert!(loader.has("db seed"));
        assert_eq!(loader.names(), vec!["db seed"]);
        assert_eq!(built.get(), 0);

        let command = loader.get("db seed").unwrap();
        assert_eq!(command.name(), "db seed");
        assert_eq!(built.get(), 1);
    }

    #[test]
    fn test_unknown_name() {
        let loader = FactoryCommandLoader::new();
        assert!(!loader.has("nope"));
        assert!(matches!(
            loader.get("nope"),
            Err(ConsoleError::CommandNotFound { .. })
        ));
    }
}
