//! Resolved bar templates, the shape the planner page renders.

use crate::layout::{Layout, CROSS_HALF_SLOTS, EXTRA_CROSS_SLOTS, HOTBAR_SLOTS};
use crate::{Action, Slot};
use serde::{Deserialize, Serialize};

/// One rendered slot. `action_id` is the raw assigned id, kept even when
/// the current catalog cannot resolve it; `action` is the resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotEntry {
    pub slot: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotbarRow {
    pub bar: u8,
    pub slots: Vec<SlotEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossHotbarSet {
    pub bar: u8,
    pub left: Vec<SlotEntry>,
    pub right: Vec<SlotEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraCrossBar {
    pub bar: u8,
    pub slots: Vec<SlotEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotbarTemplate {
    pub bars: Vec<HotbarRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossHotbarTemplate {
    pub sets: Vec<CrossHotbarSet>,
    #[serde(default)]
    pub extra: Vec<ExtraCrossBar>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutTemplates {
    pub hotbar: HotbarTemplate,
    pub chotbar: CrossHotbarTemplate,
}

impl LayoutTemplates {
    /// Groups per-slot entries into bars. Entries must be in canonical
    /// order; callers normally pass exactly `layout.slot_count()` of them.
    pub fn from_entries(layout: Layout, entries: Vec<SlotEntry>) -> Self {
        let mut entries = entries.into_iter();

        let mut hotbar = HotbarTemplate::default();
        for bar in 0..layout.hotbar_rows() {
            hotbar.bars.push(HotbarRow {
                bar,
                slots: entries.by_ref().take(HOTBAR_SLOTS as usize).collect(),
            });
        }

        let mut chotbar = CrossHotbarTemplate::default();
        for bar in 0..layout.cross_sets() {
            let left = entries.by_ref().take(CROSS_HALF_SLOTS as usize).collect();
            let right = entries.by_ref().take(CROSS_HALF_SLOTS as usize).collect();
            chotbar.sets.push(CrossHotbarSet { bar, left, right });
        }
        for bar in 0..layout.extra_cross_bars() {
            chotbar.extra.push(ExtraCrossBar {
                bar,
                slots: entries.by_ref().take(EXTRA_CROSS_SLOTS as usize).collect(),
            });
        }

        Self { hotbar, chotbar }
    }

    /// All entries back in canonical order.
    pub fn entries(&self) -> impl Iterator<Item = &SlotEntry> {
        let rows = self.hotbar.bars.iter().flat_map(|bar| bar.slots.iter());
        let sets = self
            .chotbar
            .sets
            .iter()
            .flat_map(|set| set.left.iter().chain(set.right.iter()));
        let extra = self.chotbar.extra.iter().flat_map(|bar| bar.slots.iter());
        rows.chain(sets).chain(extra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BarKind;

    fn empty_entries(layout: Layout) -> Vec<SlotEntry> {
        layout
            .slots()
            .map(|slot| SlotEntry {
                slot,
                action_id: None,
                action: None,
            })
            .collect()
    }

    #[test]
    fn hybrid_groups_into_rows_then_one_set() {
        let templates = LayoutTemplates::from_entries(Layout::Hybrid, empty_entries(Layout::Hybrid));
        assert_eq!(templates.hotbar.bars.len(), 8);
        assert!(templates.hotbar.bars.iter().all(|b| b.slots.len() == 12));
        assert_eq!(templates.chotbar.sets.len(), 1);
        assert_eq!(templates.chotbar.sets[0].left.len(), 8);
        assert_eq!(templates.chotbar.sets[0].right.len(), 8);
        assert!(templates.chotbar.extra.is_empty());
    }

    #[test]
    fn dual_cross_groups_expanded_bars() {
        let templates =
            LayoutTemplates::from_entries(Layout::DualCross, empty_entries(Layout::DualCross));
        assert!(templates.hotbar.bars.is_empty());
        assert_eq!(templates.chotbar.sets.len(), 8);
        assert_eq!(templates.chotbar.extra.len(), 2);
        assert!(templates.chotbar.extra.iter().all(|b| b.slots.len() == 16));
    }

    #[test]
    fn entries_round_trips_the_canonical_order() {
        for layout in [Layout::CrossHotbars, Layout::Hotbars, Layout::Hybrid] {
            let templates = LayoutTemplates::from_entries(layout, empty_entries(layout));
            let slots: Vec<Slot> = templates.entries().map(|e| e.slot).collect();
            let expected: Vec<Slot> = layout.slots().collect();
            assert_eq!(slots, expected);
        }
    }

    #[test]
    fn first_cross_entry_follows_last_row() {
        let templates = LayoutTemplates::from_entries(Layout::Hybrid, empty_entries(Layout::Hybrid));
        let last_row_slot = templates.hotbar.bars[7].slots[11].slot;
        assert_eq!(last_row_slot.kind, BarKind::Hotbar);
        assert_eq!(templates.chotbar.sets[0].left[0].slot.kind, BarKind::CrossLeft);
    }
}
