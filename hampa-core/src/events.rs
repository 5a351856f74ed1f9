//! What the engine did and what the player should be told about it.
//!
//! [`Effect`]s are the state changes applied by a choice, in order.
//! [`Notification`]s are transient messages for the presentation layer.

use crate::state::LogbookEntry;
use crate::story::{Character, Keepsake};
use serde::{Deserialize, Serialize};

/// A single state change applied by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// A logbook entry was appended.
    ChoiceLogged(LogbookEntry),

    /// Mental energy changed by an additive delta.
    EnergyChanged { old: i32, new: i32, delta: i32 },

    /// A relationship score changed.
    RelationshipChanged {
        character: Character,
        old: i32,
        new: i32,
        delta: i32,
    },

    /// The current node changed. `fallback` is set when the requested
    /// target did not resolve and the start node was used instead.
    NodeEntered { node_id: String, fallback: bool },

    /// The entered node replaced mental energy with an absolute value.
    EnergyOverridden { old: i32, new: i32 },

    /// A keepsake was collected for the first time.
    KeepsakeCollected(Keepsake),
}

impl Effect {
    /// One-line description, used for debug logs and the headless transcript.
    pub fn describe(&self) -> String {
        match self {
            Effect::ChoiceLogged(entry) => format!("Logged \"{}\"", entry.choice),
            Effect::EnergyChanged { old, new, delta } => {
                format!("Energy {old} -> {new} ({delta:+})")
            }
            Effect::RelationshipChanged {
                character,
                old,
                new,
                delta,
            } => format!("{character} {old} -> {new} ({delta:+})"),
            Effect::NodeEntered { node_id, fallback } => {
                if *fallback {
                    format!("Entered {node_id} (fallback)")
                } else {
                    format!("Entered {node_id}")
                }
            }
            Effect::EnergyOverridden { old, new } => format!("Energy set {old} -> {new}"),
            Effect::KeepsakeCollected(keepsake) => format!("Collected {}", keepsake.name),
        }
    }
}

/// A transient, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    KeepsakeDiscovered(Keepsake),
    Interaction { name: String, description: String },
    ImageFailed { key: String },
    SaveSucceeded,
    SaveFailed { reason: String },
    LoadSucceeded,
    LoadFailed { reason: String },
    SettingsSaved,
}

impl Notification {
    /// Text shown to the player.
    pub fn message(&self) -> String {
        match self {
            Notification::KeepsakeDiscovered(keepsake) => {
                format!("Kenang-kenangan ditemukan: {}", keepsake.name)
            }
            Notification::Interaction { name, description } => format!("{name}: {description}"),
            Notification::ImageFailed { .. } => "Gambar gagal dimuat.".to_string(),
            Notification::SaveSucceeded => "Permainan disimpan.".to_string(),
            Notification::SaveFailed { .. } => {
                "Gagal menyimpan permainan. Kemajuan tetap ada selama sesi ini.".to_string()
            }
            Notification::LoadSucceeded => "Permainan dimuat.".to_string(),
            Notification::LoadFailed { .. } => "Gagal memuat permainan.".to_string(),
            Notification::SettingsSaved => "Pengaturan disimpan.".to_string(),
        }
    }

    /// Warnings are styled differently from informational toasts.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notification::ImageFailed { .. }
                | Notification::SaveFailed { .. }
                | Notification::LoadFailed { .. }
        )
    }
}
