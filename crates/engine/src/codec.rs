//! The slot codec: between the compact URL form ([`EncodedSlots`]) and a
//! structured per-slot assignment list.
//!
//! Two grammars are accepted on decode. The current one is a comma
//! separated token list in canonical slot order: a decimal action id fills
//! one slot, `-` skips one empty slot, `-N` skips N of them, and trailing
//! empties are never written. The deprecated grammar (the old `s` URL
//! parameter) is a JSON array of `number | null`, optionally nested one
//! level into per-bar arrays; it is recognized by its leading `[` and
//! normalized away on the next encode.
//!
//! Decoding never fails. Input that parses under neither grammar yields an
//! all-empty assignment list, so a mangled share link still opens a usable
//! planner instead of an error page.

use crossbars_protocol::{EncodedSlots, Layout, Slot};
use std::collections::BTreeMap;

/// Hard ceiling on positions a single encoded string may address. Well
/// beyond any descriptor; longer inputs are treated as malformed.
const MAX_ENCODED_POSITIONS: usize = 4096;

/// One decoded slot: its identity plus the raw assigned action id, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAssignment {
    pub slot: Slot,
    pub action_id: Option<u32>,
}

/// A full decoded assignment set for one layout descriptor.
///
/// `slots` always holds exactly `layout.slot_count()` entries in canonical
/// order. Entries found past that count (a link minted under a larger
/// descriptor) are kept in `overflow` keyed by their original position, so
/// re-encoding loses nothing even though they are never rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAssignments {
    pub layout: Layout,
    pub slots: Vec<SlotAssignment>,
    pub overflow: BTreeMap<usize, u32>,
}

impl SlotAssignments {
    /// All-empty assignment set for `layout`.
    pub fn empty(layout: Layout) -> Self {
        let slots = layout
            .slots()
            .map(|slot| SlotAssignment {
                slot,
                action_id: None,
            })
            .collect();
        Self {
            layout,
            slots,
            overflow: BTreeMap::new(),
        }
    }

    /// Raw action id at a canonical position, if filled.
    pub fn get(&self, position: usize) -> Option<u32> {
        self.slots.get(position).and_then(|a| a.action_id)
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|a| a.action_id.is_some()).count()
    }
}

enum Grammar<'a> {
    Current(&'a str),
    Legacy(&'a str),
}

impl<'a> Grammar<'a> {
    /// The legacy form is JSON and always opens with `[`; no token in the
    /// current grammar can start that way.
    fn classify(raw: &'a str) -> Self {
        if raw.trim_start().starts_with('[') {
            Self::Legacy(raw)
        } else {
            Self::Current(raw)
        }
    }
}

/// Decodes `encoded` against `layout`. Absent or blank input, or input that
/// parses under neither grammar, yields [`SlotAssignments::empty`].
pub fn decode(encoded: Option<&EncodedSlots>, layout: Layout) -> SlotAssignments {
    let mut out = SlotAssignments::empty(layout);
    let raw = match encoded {
        Some(e) if !e.as_str().trim().is_empty() => e.as_str(),
        _ => return out,
    };

    let ids = match Grammar::classify(raw) {
        Grammar::Current(s) => parse_current(s),
        Grammar::Legacy(s) => parse_legacy(s),
    };
    let Some(ids) = ids else {
        tracing::debug!(len = raw.len(), "unparseable encoded slots, treating as empty");
        return out;
    };

    for (position, id) in ids.into_iter().enumerate() {
        if position < out.slots.len() {
            out.slots[position].action_id = id;
        } else if let Some(id) = id {
            out.overflow.insert(position, id);
        }
    }
    out
}

/// Encodes an assignment set back to the current grammar. Deterministic:
/// equal inputs produce byte-identical output.
pub fn encode(assignments: &SlotAssignments) -> EncodedSlots {
    // Lay canonical slots and overflow out positionally, then trim the
    // empty tail and collapse interior empty runs.
    let mut ids: Vec<Option<u32>> = assignments.slots.iter().map(|a| a.action_id).collect();
    for (&position, &id) in &assignments.overflow {
        if ids.len() <= position {
            ids.resize(position + 1, None);
        }
        ids[position] = Some(id);
    }
    while matches!(ids.last(), Some(None)) {
        ids.pop();
    }

    let mut tokens: Vec<String> = Vec::new();
    let mut empty_run = 0usize;
    for id in ids {
        match id {
            Some(id) => {
                push_empty_run(&mut tokens, empty_run);
                empty_run = 0;
                tokens.push(id.to_string());
            }
            None => empty_run += 1,
        }
    }
    // The trimmed list ends on a filled slot, so no run is pending here.
    EncodedSlots::new(tokens.join(","))
}

/// Reassigns a single slot and re-encodes, leaving every other slot exactly
/// as it was. `action_id: None` clears the slot. A slot the layout does not
/// contain changes nothing (beyond normalizing legacy input).
pub fn set_one(
    encoded: Option<&EncodedSlots>,
    layout: Layout,
    slot: Slot,
    action_id: Option<u32>,
) -> EncodedSlots {
    let mut assignments = decode(encoded, layout);
    match slot.position(layout) {
        Some(position) => assignments.slots[position].action_id = action_id,
        None => {
            tracing::debug!(%slot, ?layout, "slot outside layout, assignments unchanged");
        }
    }
    encode(&assignments)
}

fn push_empty_run(tokens: &mut Vec<String>, run: usize) {
    match run {
        0 => {}
        1 => tokens.push("-".to_string()),
        n => tokens.push(format!("-{n}")),
    }
}

/// Current grammar. `None` means malformed as a whole; individual ids are
/// never guessed at.
fn parse_current(raw: &str) -> Option<Vec<Option<u32>>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(Vec::new());
    }

    let mut ids: Vec<Option<u32>> = Vec::new();
    for token in raw.split(',') {
        if let Some(run) = token.strip_prefix('-') {
            let count = if run.is_empty() {
                1
            } else {
                if !run.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                run.parse::<usize>().ok().filter(|n| *n >= 1)?
            };
            if ids.len().saturating_add(count) > MAX_ENCODED_POSITIONS {
                return None;
            }
            ids.extend(std::iter::repeat(None).take(count));
        } else {
            // Strict decimal: no sign, no whitespace, no exponents.
            if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            ids.push(Some(token.parse::<u32>().ok()?));
            if ids.len() > MAX_ENCODED_POSITIONS {
                return None;
            }
        }
    }
    Some(ids)
}

/// Legacy grammar: a JSON array of `number | null`, flat or nested one
/// level into per-bar arrays. Nesting is flattened; bar boundaries carry no
/// information the canonical order does not already have.
fn parse_legacy(raw: &str) -> Option<Vec<Option<u32>>> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let top = value.as_array()?;

    let mut ids: Vec<Option<u32>> = Vec::new();
    for element in top {
        match element {
            serde_json::Value::Array(bar) => {
                for cell in bar {
                    ids.push(legacy_cell(cell)?);
                    if ids.len() > MAX_ENCODED_POSITIONS {
                        return None;
                    }
                }
            }
            other => {
                ids.push(legacy_cell(other)?);
                if ids.len() > MAX_ENCODED_POSITIONS {
                    return None;
                }
            }
        }
    }
    Some(ids)
}

fn legacy_cell(value: &serde_json::Value) -> Option<Option<u32>> {
    match value {
        serde_json::Value::Null => Some(None),
        serde_json::Value::Number(n) => {
            let id = n.as_u64().and_then(|n| u32::try_from(n).ok())?;
            Some(Some(id))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbars_protocol::BarKind;

    fn enc(raw: &str) -> EncodedSlots {
        EncodedSlots::new(raw)
    }

    #[test]
    fn blank_input_decodes_to_all_empty() {
        for input in [None, Some(enc("")), Some(enc("   "))] {
            let decoded = decode(input.as_ref(), Layout::Hybrid);
            assert_eq!(decoded.slots.len(), 112);
            assert_eq!(decoded.filled(), 0);
            assert!(decoded.overflow.is_empty());
        }
    }

    #[test]
    fn decode_places_ids_in_canonical_order() {
        let decoded = decode(Some(&enc("3,-2,9")), Layout::Hotbars);
        assert_eq!(decoded.get(0), Some(3));
        assert_eq!(decoded.get(1), None);
        assert_eq!(decoded.get(2), None);
        assert_eq!(decoded.get(3), Some(9));
        assert_eq!(decoded.filled(), 2);
    }

    #[test]
    fn hybrid_cross_slots_sit_after_the_rows() {
        // Position 96 is the first left-half slot of the single cross set.
        let mut assignments = SlotAssignments::empty(Layout::Hybrid);
        assignments.slots[96].action_id = Some(7531);
        let encoded = encode(&assignments);
        assert_eq!(encoded.as_str(), "-96,7531");

        let decoded = decode(Some(&encoded), Layout::Hybrid);
        assert_eq!(decoded.get(96), Some(7531));
        assert_eq!(decoded.slots[96].slot.kind, BarKind::CrossLeft);
    }

    #[test]
    fn encode_trims_trailing_empties() {
        let mut assignments = SlotAssignments::empty(Layout::Hotbars);
        assignments.slots[0].action_id = Some(120);
        assignments.slots[5].action_id = Some(121);
        // Slots 6..120 stay empty and must not appear in the string.
        assert_eq!(encode(&assignments).as_str(), "120,-4,121");
    }

    #[test]
    fn encode_writes_single_dash_for_single_gap() {
        let mut assignments = SlotAssignments::empty(Layout::Hotbars);
        assignments.slots[0].action_id = Some(1);
        assignments.slots[2].action_id = Some(2);
        assert_eq!(encode(&assignments).as_str(), "1,-,2");
    }

    #[test]
    fn all_empty_encodes_to_empty_string() {
        let assignments = SlotAssignments::empty(Layout::CrossHotbars);
        assert_eq!(encode(&assignments).as_str(), "");
    }

    #[test]
    fn round_trip_is_identity_on_canonical_strings() {
        for raw in ["", "3", "3,-2,9", "-,5", "-96,7531", "42,-2,43,-11,44"] {
            let decoded = decode(Some(&enc(raw)), Layout::Hotbars);
            assert_eq!(encode(&decoded).as_str(), raw, "round trip of {raw:?}");
        }
    }

    #[test]
    fn decode_then_encode_normalizes_noncanonical_forms() {
        // "-1" and "-" mean the same thing; trailing empties get dropped.
        for (raw, normalized) in [("-1,5", "-,5"), ("5,-3", "5"), ("5,-,-,6", "5,-2,6")] {
            let decoded = decode(Some(&enc(raw)), Layout::Hotbars);
            assert_eq!(encode(&decoded).as_str(), normalized);
        }
    }

    #[test]
    fn encode_is_deterministic() {
        let decoded = decode(Some(&enc("17,-5,9,-,3")), Layout::CrossHotbars);
        assert_eq!(encode(&decoded), encode(&decoded.clone()));
    }

    #[test]
    fn legacy_flat_array_decodes_like_the_current_grammar() {
        let legacy = decode(Some(&enc("[9,null,null,20]")), Layout::Hotbars);
        let current = decode(Some(&enc("9,-2,20")), Layout::Hotbars);
        assert_eq!(legacy, current);
    }

    #[test]
    fn legacy_nested_arrays_flatten_across_bars() {
        // Two 12-slot bars; the first id of the second bar lands at 12.
        let nested = enc("[[1,null,null,null,null,null,null,null,null,null,null,null],[2]]");
        let decoded = decode(Some(&nested), Layout::Hotbars);
        assert_eq!(decoded.get(0), Some(1));
        assert_eq!(decoded.get(12), Some(2));
        assert_eq!(decoded.filled(), 2);
    }

    #[test]
    fn legacy_input_normalizes_to_current_grammar() {
        let decoded = decode(Some(&enc("[9,null,null,20]")), Layout::Hotbars);
        assert_eq!(encode(&decoded).as_str(), "9,-2,20");
    }

    #[test]
    fn malformed_input_decodes_to_all_empty() {
        let cases = [
            "abc",
            "1,,2",
            "1, 2",
            "+5",
            "1.5",
            "1e3",
            "--",
            "-0",
            "-x",
            "5,-2x",
            "[1,\"x\"]",
            "[1.5]",
            "[-3]",
            "[[1],[2,[3]]]",
            "[1,null",
            "{\"0\":1}",
            "-999999999999",
        ];
        for raw in cases {
            let decoded = decode(Some(&enc(raw)), Layout::Hotbars);
            assert_eq!(decoded.filled(), 0, "input {raw:?} should decode empty");
            assert!(decoded.overflow.is_empty());
            assert_eq!(decoded.slots.len(), 120);
        }
    }

    #[test]
    fn oversized_ids_are_malformed_not_truncated() {
        let too_big = format!("{}", u64::from(u32::MAX) + 1);
        let decoded = decode(Some(&enc(&too_big)), Layout::Hotbars);
        assert_eq!(decoded.filled(), 0);
    }

    #[test]
    fn overflow_positions_survive_a_round_trip() {
        // Minted under DualCross (160 slots), opened under Hybrid (112).
        let mut minted = SlotAssignments::empty(Layout::DualCross);
        minted.slots[130].action_id = Some(29054);
        let encoded = encode(&minted);

        let reopened = decode(Some(&encoded), Layout::Hybrid);
        assert_eq!(reopened.slots.len(), 112);
        assert_eq!(reopened.filled(), 0);
        assert_eq!(reopened.overflow.get(&130), Some(&29054));

        // Nothing lost: re-encoding under the smaller layout reproduces the
        // original string.
        assert_eq!(encode(&reopened), encoded);
    }

    #[test]
    fn overflow_empties_are_dropped_silently() {
        // 130 ids worth of span, but only position 0 is filled; under
        // Hybrid the trailing empties past 112 do not become overflow.
        let decoded = decode(Some(&enc("5,-129")), Layout::Hybrid);
        assert_eq!(decoded.get(0), Some(5));
        assert!(decoded.overflow.is_empty());
        assert_eq!(encode(&decoded).as_str(), "5");
    }

    #[test]
    fn set_one_changes_exactly_one_slot() {
        // Hybrid: slot 5 in row 1, slot 40 in row 4.
        let slot5 = Layout::Hybrid.slot_at(5).unwrap();
        let slot40 = Layout::Hybrid.slot_at(40).unwrap();

        let a = set_one(None, Layout::Hybrid, slot5, Some(101));
        let b = set_one(Some(&a), Layout::Hybrid, slot40, Some(202));
        let decoded = decode(Some(&b), Layout::Hybrid);
        assert_eq!(decoded.get(5), Some(101));
        assert_eq!(decoded.get(40), Some(202));

        // Clearing 5 leaves 40 alone.
        let c = set_one(Some(&b), Layout::Hybrid, slot5, None);
        let decoded = decode(Some(&c), Layout::Hybrid);
        assert_eq!(decoded.get(5), None);
        assert_eq!(decoded.get(40), Some(202));
    }

    #[test]
    fn set_one_normalizes_legacy_input() {
        let slot1 = Layout::Hotbars.slot_at(1).unwrap();
        let updated = set_one(Some(&enc("[9,null,20]")), Layout::Hotbars, slot1, Some(7));
        assert_eq!(updated.as_str(), "9,7,20");
    }

    #[test]
    fn set_one_outside_layout_is_a_no_op() {
        let foreign = Slot {
            kind: BarKind::ExtraCross,
            bar: 0,
            index: 0,
        };
        let updated = set_one(Some(&enc("3,-2,9")), Layout::Hotbars, foreign, Some(1));
        assert_eq!(updated.as_str(), "3,-2,9");
    }

    #[test]
    fn set_one_keeps_overflow_intact() {
        let mut minted = SlotAssignments::empty(Layout::DualCross);
        minted.slots[140].action_id = Some(555);
        let encoded = encode(&minted);

        let slot0 = Layout::Hybrid.slot_at(0).unwrap();
        let updated = set_one(Some(&encoded), Layout::Hybrid, slot0, Some(1));
        let decoded = decode(Some(&updated), Layout::Hybrid);
        assert_eq!(decoded.get(0), Some(1));
        assert_eq!(decoded.overflow.get(&140), Some(&555));
    }
}
