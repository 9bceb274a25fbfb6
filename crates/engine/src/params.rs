//! URL query overrides applied to view data before decoding.

use crossbars_protocol::{EncodedSlots, Layout, ViewData};
use std::collections::HashMap;

/// Applies the recognized override keys to a copy of `view_data`.
///
/// `s1` carries the current encoding and always wins. `s` is the deprecated
/// legacy parameter and applies only when `s1` is absent. `l` selects the
/// layout descriptor by code. Unknown keys are ignored, and an `l` that is
/// not an integer leaves the stored layout alone.
pub fn merge_params_to_view(params: &HashMap<String, String>, view_data: &ViewData) -> ViewData {
    let mut merged = view_data.clone();

    if let Some(s1) = params.get("s1") {
        merged.encoded_slots = Some(EncodedSlots::new(s1.clone()));
    } else if let Some(s) = params.get("s") {
        merged.encoded_slots = Some(EncodedSlots::new(s.clone()));
    }

    if let Some(l) = params.get("l") {
        if let Ok(code) = l.parse::<i64>() {
            merged.layout = Layout::from_code(code);
        }
    }

    merged
}
