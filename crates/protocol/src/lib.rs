use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod layout;
pub mod template;

pub use layout::{BarKind, EncodedSlots, Layout, Slot};
pub use template::{
    CrossHotbarSet, CrossHotbarTemplate, ExtraCrossBar, HotbarRow, HotbarTemplate, LayoutTemplates,
    SlotEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Tank,
    Healer,
    Melee,
    PhysicalRanged,
    MagicalRanged,
}

/// A slottable game action. `role` is set on role actions only; job actions
/// leave it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: u32,
    pub abbr: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub disabled: bool,
}

/// What the planner page is currently doing with a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewAction {
    New,
    Show,
    Edit,
    List,
}

impl Default for ViewAction {
    fn default() -> Self {
        Self::New
    }
}

/// The layout being viewed or edited, persisted fields only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub is_pvp: bool,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_slots: Option<EncodedSlots>,
}

impl ViewData {
    /// Shallow merge: fields present in `patch` replace the current value,
    /// everything else is kept.
    pub fn apply(&self, patch: &ViewDataPatch) -> ViewData {
        let mut next = self.clone();
        if let Some(id) = patch.id {
            next.id = Some(id);
        }
        if let Some(title) = &patch.title {
            next.title = Some(title.clone());
        }
        if let Some(description) = &patch.description {
            next.description = Some(description.clone());
        }
        if let Some(job_id) = &patch.job_id {
            next.job_id = Some(job_id.clone());
        }
        if let Some(is_pvp) = patch.is_pvp {
            next.is_pvp = is_pvp;
        }
        if let Some(layout) = patch.layout {
            next.layout = layout;
        }
        if let Some(encoded_slots) = &patch.encoded_slots {
            next.encoded_slots = Some(encoded_slots.clone());
        }
        next
    }
}

/// Partial [`ViewData`]: only the fields to change are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pvp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_slots: Option<EncodedSlots>,
}

/// Full planner state. The reducer in `crossbars-engine` is the only thing
/// that should produce new values of this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_job: Option<Job>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub role_actions: Vec<Action>,
    #[serde(default)]
    pub hotbar: HotbarTemplate,
    #[serde(default)]
    pub chotbar: CrossHotbarTemplate,
    #[serde(default)]
    pub view_data: ViewData,
    #[serde(default)]
    pub view_action: ViewAction,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub show_titles: bool,
    #[serde(default)]
    pub show_all_lvl: bool,
    #[serde(default)]
    pub show_details: bool,
}

/// Partial [`AppState`] for the SET_STATE escape hatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<Vec<Job>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_job: Option<Job>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_actions: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_data: Option<ViewData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_action: Option<ViewAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_titles: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_all_lvl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_details: Option<bool>,
}

/// Every transition the planner state machine accepts, in its wire shape:
/// `{ "type": "...", "payload": ... }`.
///
/// The tag set is closed. Anything else must be rejected by the caller, not
/// silently ignored; `crossbars_engine::dispatch` does exactly that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppAction {
    #[serde(rename_all = "camelCase")]
    LoadViewData {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view_data: Option<ViewData>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected_job: Option<Job>,
        #[serde(default)]
        actions: Vec<Action>,
        #[serde(default)]
        role_actions: Vec<Action>,
        #[serde(default)]
        view_action: ViewAction,
        #[serde(default)]
        url_params: HashMap<String, String>,
    },
    #[serde(rename_all = "camelCase")]
    SlotActions {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view_data: Option<ViewData>,
        #[serde(default)]
        url_params: HashMap<String, String>,
    },
    #[serde(rename_all = "camelCase")]
    SlotAction {
        slot: Slot,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action_id: Option<u32>,
    },
    ToggleTitles,
    ToggleLvls,
    ToggleDetails,
    EditLayout,
    PublishLayout,
    CancelEdits,
    UpdateView(ViewDataPatch),
    Initialize,
    #[serde(rename = "LOAD_JOBACTIONS", rename_all = "camelCase")]
    LoadJobActions {
        #[serde(default)]
        actions: Vec<Action>,
        #[serde(default)]
        role_actions: Vec<Action>,
    },
    ViewList,
    SetState(StatePatch),
}

/// A stored, shareable layout as it travels over the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub is_pvp: bool,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub encoded_slots: EncodedSlots,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub hearts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl LayoutRecord {
    /// View of the record as planner view data. Empty strings become absent
    /// fields so the page can tell "untitled" from "titled with nothing".
    pub fn view_data(&self) -> ViewData {
        ViewData {
            id: self.id,
            title: (!self.title.is_empty()).then(|| self.title.clone()),
            description: (!self.description.is_empty()).then(|| self.description.clone()),
            job_id: Some(self.job_id.clone()),
            is_pvp: self.is_pvp,
            layout: self.layout,
            encoded_slots: Some(self.encoded_slots.clone()),
        }
    }
}
