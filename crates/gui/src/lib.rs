//! Debug GUI: property adapters and the control panel.
//!
//! # Invariants
//! - Widgets never hold references into the scene between frames; every
//!   read and write goes through a [`ControlTarget`] resolved on the spot.
//! - `camera.far >= camera.near + min_dif` after any near/far edit.

pub mod bindings;
pub mod panel;

pub use bindings::{ColorBinding, MinMaxBinding};
pub use panel::{Axis, Control, ControlPanel, ControlTarget};
