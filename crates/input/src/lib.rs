//! Pointer input and orbit camera controls.
//!
//! Raw window events are turned into [`Action`]s by a [`PointerTracker`];
//! [`OrbitControls`] consumes actions and moves a camera around its target.
//!
//! # Invariants
//! - Orbit controls never change the camera's projection parameters.
//! - The polar angle stays strictly inside `(0, pi)`, so the view never flips.

pub mod action;
pub mod orbit;

pub use action::{Action, PointerButton, PointerTracker};
pub use orbit::OrbitControls;
