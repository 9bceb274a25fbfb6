//! Engine for the crossbars planner: the slot codec, template assembler,
//! view-parameter merger, the layout state machine, and the SQLite layout
//! store.
//!
//! Everything except [`store`] is a pure function over `crossbars-protocol`
//! values. The store is the only module that touches the filesystem.

pub mod catalog;
pub mod codec;
pub mod params;
pub mod reducer;
pub mod store;
pub mod template;

pub use catalog::ActionCatalog;
pub use codec::{decode, encode, set_one, SlotAssignment, SlotAssignments};
pub use params::merge_params_to_view;
pub use reducer::{dispatch, initial_state, reduce};
pub use store::Store;
pub use template::{assemble, build_default};
