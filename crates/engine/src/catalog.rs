//! Action lookup for template assembly.
//!
//! The catalog never fetches anything. Job and role action lists come from
//! whoever loaded them (the server's data service, a test) and are indexed
//! by id here, together with the few global actions every job can slot.

use crossbars_protocol::Action;
use std::collections::HashMap;

/// Actions available regardless of job: sprint, return, teleport.
const GLOBAL_ACTIONS: &[(u32, &str, &str)] = &[
    (3, "Sprint", "/i/000000/000104.png"),
    (6, "Return", "/i/000000/000111.png"),
    (7, "Teleport", "/i/000000/000112.png"),
];

#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    by_id: HashMap<u32, Action>,
}

impl ActionCatalog {
    /// Indexes the globals, then role actions, then job actions. Job
    /// actions win on duplicate ids.
    pub fn new(actions: &[Action], role_actions: &[Action]) -> Self {
        let mut by_id = HashMap::new();
        for (id, name, icon) in GLOBAL_ACTIONS {
            by_id.insert(
                *id,
                Action {
                    id: *id,
                    name: (*name).to_string(),
                    icon: (*icon).to_string(),
                    level: None,
                    role: None,
                },
            );
        }
        for action in role_actions.iter().chain(actions.iter()) {
            by_id.insert(action.id, action.clone());
        }
        Self { by_id }
    }

    pub fn resolve(&self, id: u32) -> Option<&Action> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
