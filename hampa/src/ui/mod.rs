//! UI module for the Ruang Hampa TUI

pub mod layout;
pub mod render;
pub mod theme;
pub mod widgets;

pub use render::{FocusedPanel, Overlay};
