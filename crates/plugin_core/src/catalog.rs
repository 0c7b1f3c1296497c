use std::collections::HashMap;

use tracing::debug;

use crate::{action::ActionInstance, observer::ActionObserver};

type Factory = Box<dyn FnMut(&ActionInstance) -> Box<dyn ActionObserver>>;

/// Maps action UUIDs (as declared in the plugin manifest) to observer factories.
///
/// The router asks the catalog for an observer each time an instance appears.
#[derive(Default)]
pub struct ActionCatalog {
    factories: HashMap<String, Factory>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, O>(&mut self, action_uuid: impl Into<String>, mut factory: F) -> &mut Self
    where
        F: FnMut(&ActionInstance) -> O + 'static,
        O: ActionObserver + 'static,
    {
        self.factories.insert(
            action_uuid.into(),
            Box::new(move |action: &ActionInstance| {
                Box::new(factory(action)) as Box<dyn ActionObserver>
            }),
        );
        self
    }

    pub fn with<F, O>(mut self, action_uuid: impl Into<String>, factory: F) -> Self
    where
        F: FnMut(&ActionInstance) -> O + 'static,
        O: ActionObserver + 'static,
    {
        self.register(action_uuid, factory);
        self
    }

    pub fn contains(&self, action_uuid: &str) -> bool {
        self.factories.contains_key(action_uuid)
    }

    pub(crate) fn instantiate(&mut self, action: &ActionInstance) -> Option<Box<dyn ActionObserver>> {
        let Some(factory) = self.factories.get_mut(action.action_uuid()) else {
            debug!(
                action = action.action_uuid(),
                context = %action.context(),
                "no observer registered for action"
            );
            return None;
        };
        Some(factory(action))
    }
}
