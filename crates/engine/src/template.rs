//! Template assembly: resolving a decoded assignment set against an action
//! catalog into the bar structures the planner renders.

use crate::catalog::ActionCatalog;
use crate::codec::SlotAssignments;
use crossbars_protocol::{Layout, LayoutTemplates, SlotEntry};

/// Resolves every assignment against the catalog. Ids the catalog does not
/// know render as empty slots but keep their raw id, so re-encoding after a
/// job or mode switch loses nothing.
pub fn assemble(assignments: &SlotAssignments, catalog: &ActionCatalog) -> LayoutTemplates {
    let entries = assignments
        .slots
        .iter()
        .map(|assignment| SlotEntry {
            slot: assignment.slot,
            action_id: assignment.action_id,
            action: assignment
                .action_id
                .and_then(|id| catalog.resolve(id).cloned()),
        })
        .collect();
    LayoutTemplates::from_entries(assignments.layout, entries)
}

/// All-empty template pair for a descriptor: the shape a planner shows
/// before any encoded data exists.
pub fn build_default(layout: Layout) -> LayoutTemplates {
    assemble(&SlotAssignments::empty(layout), &ActionCatalog::default())
}
