//! TUI widgets for Ruang Hampa

pub mod choices;
pub mod narrative;
pub mod side_panel;
pub mod status_bar;

pub use choices::ChoiceListWidget;
pub use narrative::NarrativeWidget;
pub use side_panel::SidePanelWidget;
pub use status_bar::{HotkeyBarWidget, ToastWidget};
