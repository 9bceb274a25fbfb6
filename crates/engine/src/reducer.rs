//! The layout state machine: a pure reducer over [`AppState`].
//!
//! [`reduce`] is total over the typed action set. [`dispatch`] is the wire
//! entry point: it parses a `{ "type": ..., "payload": ... }` value and
//! refuses unknown or malformed actions outright instead of ignoring them,
//! so a typo in a caller surfaces as an error, not a silently dropped
//! transition.

use crate::catalog::ActionCatalog;
use crate::codec::{decode, set_one};
use crate::params::merge_params_to_view;
use crate::template::{assemble, build_default};
use anyhow::Context;
use crossbars_protocol::{
    AppAction, AppState, Layout, StatePatch, ViewAction, ViewData,
};

/// Blank planner state: default view data plus the full default template
/// shapes (all keyboard rows, all cross sets), ready for a LOAD_VIEW_DATA.
pub fn initial_state() -> AppState {
    AppState {
        hotbar: build_default(Layout::Hotbars).hotbar,
        chotbar: build_default(Layout::CrossHotbars).chotbar,
        ..AppState::default()
    }
}

/// Applies one transition. Never mutates `state` and never fails; every
/// typed action has a defined result.
pub fn reduce(state: &AppState, action: AppAction) -> AppState {
    match action {
        AppAction::LoadViewData {
            view_data,
            selected_job,
            actions,
            role_actions,
            view_action,
            url_params,
        } => {
            let Some(view_data) = view_data else {
                return state.clone();
            };
            let read_only = view_action == ViewAction::Show;
            let view_data = merge_params_to_view(&url_params, &view_data);

            let catalog = ActionCatalog::new(&actions, &role_actions);
            let assignments = decode(view_data.encoded_slots.as_ref(), view_data.layout);
            let templates = assemble(&assignments, &catalog);

            AppState {
                selected_job: selected_job.or_else(|| state.selected_job.clone()),
                actions,
                role_actions,
                view_action,
                hotbar: templates.hotbar,
                chotbar: templates.chotbar,
                view_data,
                read_only,
                ..state.clone()
            }
        }

        AppAction::SlotActions {
            view_data: payload_view,
            url_params,
        } => {
            let view_data = merge_params_to_view(&url_params, &state.view_data);
            let mut next = AppState {
                view_data,
                ..state.clone()
            };

            // Only a payload carrying encoded data triggers a rebuild; the
            // catalogs already in state are used to resolve it.
            let has_encoding = payload_view
                .as_ref()
                .and_then(|v| v.encoded_slots.as_ref())
                .is_some_and(|e| !e.is_empty());
            if has_encoding {
                let payload_view = payload_view.unwrap_or_default();
                let catalog = ActionCatalog::new(&state.actions, &state.role_actions);
                let assignments =
                    decode(payload_view.encoded_slots.as_ref(), payload_view.layout);
                let templates = assemble(&assignments, &catalog);
                next.hotbar = templates.hotbar;
                next.chotbar = templates.chotbar;
            }
            next
        }

        AppAction::SlotAction { slot, action_id } => {
            let encoded = set_one(
                state.view_data.encoded_slots.as_ref(),
                state.view_data.layout,
                slot,
                action_id,
            );
            let mut next = state.clone();
            next.view_data.encoded_slots = Some(encoded);
            next
        }

        AppAction::ToggleTitles => {
            let mut next = state.clone();
            next.show_titles = !next.show_titles;
            next
        }

        AppAction::ToggleLvls => {
            let mut next = state.clone();
            next.show_all_lvl = !next.show_all_lvl;
            next
        }

        AppAction::ToggleDetails => {
            let mut next = state.clone();
            next.show_details = !next.show_details;
            next
        }

        AppAction::EditLayout => AppState {
            read_only: false,
            view_action: ViewAction::Edit,
            ..state.clone()
        },

        AppAction::PublishLayout | AppAction::CancelEdits => AppState {
            read_only: true,
            view_action: ViewAction::Show,
            ..state.clone()
        },

        AppAction::UpdateView(patch) => AppState {
            read_only: true,
            view_data: state.view_data.apply(&patch),
            view_action: ViewAction::Show,
            ..state.clone()
        },

        AppAction::Initialize => AppState {
            view_data: ViewData::default(),
            hotbar: build_default(Layout::Hotbars).hotbar,
            chotbar: build_default(Layout::CrossHotbars).chotbar,
            ..state.clone()
        },

        AppAction::LoadJobActions {
            actions,
            role_actions,
        } => AppState {
            actions,
            role_actions,
            ..state.clone()
        },

        AppAction::ViewList => AppState {
            view_data: ViewData::default(),
            view_action: ViewAction::List,
            ..state.clone()
        },

        AppAction::SetState(patch) => apply_state_patch(state, patch),
    }
}

/// Wire entry point: one JSON action in, the next state out. Unknown
/// `type` tags and malformed payloads are hard errors.
pub fn dispatch(state: &AppState, action: serde_json::Value) -> anyhow::Result<AppState> {
    let kind = action
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("<missing>")
        .to_string();
    let action: AppAction = serde_json::from_value(action)
        .with_context(|| format!("unhandled action type: {kind}"))?;
    Ok(reduce(state, action))
}

fn apply_state_patch(state: &AppState, patch: StatePatch) -> AppState {
    let mut next = state.clone();
    if let Some(jobs) = patch.jobs {
        next.jobs = jobs;
    }
    if let Some(selected_job) = patch.selected_job {
        next.selected_job = Some(selected_job);
    }
    if let Some(actions) = patch.actions {
        next.actions = actions;
    }
    if let Some(role_actions) = patch.role_actions {
        next.role_actions = role_actions;
    }
    if let Some(view_data) = patch.view_data {
        next.view_data = view_data;
    }
    if let Some(view_action) = patch.view_action {
        next.view_action = view_action;
    }
    if let Some(read_only) = patch.read_only {
        next.read_only = read_only;
    }
    if let Some(show_titles) = patch.show_titles {
        next.show_titles = show_titles;
    }
    if let Some(show_all_lvl) = patch.show_all_lvl {
        next.show_all_lvl = show_all_lvl;
    }
    if let Some(show_details) = patch.show_details {
        next.show_details = show_details;
    }
    next
}
