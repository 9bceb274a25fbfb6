//! Umbrella crate for crossbars.
//!
//! This crate is intentionally small: it re-exports the engine and protocol crates
//! so downstream code can depend on a single crate name (`crossbars`).

pub use crossbars_engine as engine;
pub use crossbars_protocol as protocol;
