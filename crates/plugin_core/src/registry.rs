use std::collections::{hash_map::Entry, HashMap};

use shared::domain::ContextId;

use crate::{action::ActionInstance, error::CoreError};

#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: HashMap<ContextId, ActionInstance>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `instance`. A context that is already live is
    /// rejected and the existing instance is left untouched.
    pub fn register(&mut self, instance: ActionInstance) -> Result<&mut ActionInstance, CoreError> {
        match self.actions.entry(instance.context().clone()) {
            Entry::Occupied(entry) => Err(CoreError::DuplicateIdentifier(entry.key().clone())),
            Entry::Vacant(entry) => Ok(entry.insert(instance)),
        }
    }

    pub fn unregister(&mut self, context: &ContextId) -> Option<ActionInstance> {
        self.actions.remove(context)
    }

    pub fn lookup(&self, context: &ContextId) -> Option<&ActionInstance> {
        self.actions.get(context)
    }

    pub(crate) fn lookup_mut(&mut self, context: &ContextId) -> Option<&mut ActionInstance> {
        self.actions.get_mut(context)
    }

    pub fn contains(&self, context: &ContextId) -> bool {
        self.actions.contains_key(context)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionInstance> {
        self.actions.values()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
