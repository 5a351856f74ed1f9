//! Progression state: where the player is and what they have accumulated.
//!
//! This is the unit of persistence. Field names are the durable save layout
//! and must stay stable.

use crate::story::{Character, Keepsake, START_NODE};
use serde::{Deserialize, Serialize};

/// Lower bound for mental energy and relationship scores.
pub const METER_MIN: i32 = 0;
/// Upper bound for mental energy and relationship scores.
pub const METER_MAX: i32 = 100;

pub const DEFAULT_MENTAL_ENERGY: i32 = 50;
pub const DEFAULT_RELATIONSHIP: i32 = 50;

/// Milliseconds per revealed character. Higher is slower.
pub const DEFAULT_TYPING_SPEED: u32 = 30;
pub const TYPING_SPEED_MIN: u32 = 1;
pub const TYPING_SPEED_MAX: u32 = 100;

/// Clamp a meter value into [`METER_MIN`, `METER_MAX`].
pub fn clamp_meter(value: i32) -> i32 {
    value.clamp(METER_MIN, METER_MAX)
}

/// Clamp a typing speed into [`TYPING_SPEED_MIN`, `TYPING_SPEED_MAX`].
pub fn clamp_typing_speed(speed: i64) -> u32 {
    // Bounds are small positive constants, the cast cannot truncate.
    speed.clamp(TYPING_SPEED_MIN as i64, TYPING_SPEED_MAX as i64) as u32
}

fn default_typing_speed() -> u32 {
    DEFAULT_TYPING_SPEED
}

/// Relationship scores toward the three family members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationships {
    pub bapak: i32,
    pub ibu: i32,
    pub surya: i32,
}

impl Default for Relationships {
    fn default() -> Self {
        Self {
            bapak: DEFAULT_RELATIONSHIP,
            ibu: DEFAULT_RELATIONSHIP,
            surya: DEFAULT_RELATIONSHIP,
        }
    }
}

impl Relationships {
    pub fn get(&self, character: Character) -> i32 {
        match character {
            Character::Bapak => self.bapak,
            Character::Ibu => self.ibu,
            Character::Surya => self.surya,
        }
    }

    fn slot_mut(&mut self, character: Character) -> &mut i32 {
        match character {
            Character::Bapak => &mut self.bapak,
            Character::Ibu => &mut self.ibu,
            Character::Surya => &mut self.surya,
        }
    }

    /// Add `delta` to one score, clamped. Returns `(old, new)`.
    pub fn adjust(&mut self, character: Character, delta: i32) -> (i32, i32) {
        let slot = self.slot_mut(character);
        let old = *slot;
        *slot = clamp_meter(old.saturating_add(delta));
        (old, *slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Character, i32)> + '_ {
        Character::all().into_iter().map(|c| (c, self.get(c)))
    }
}

/// One choice the player made, in the order made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogbookEntry {
    /// Node the choice was made from.
    pub node_id: String,
    /// The choice text.
    pub choice: String,
    /// RFC 3339 UTC timestamp.
    pub timestamp: String,
}

/// Everything that survives a save/load round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionState {
    pub current_node_id: String,

    pub mental_energy: i32,

    pub relationships: Relationships,

    /// Collected keepsakes, unique by name, in discovery order.
    #[serde(rename = "mementos")]
    pub keepsakes: Vec<Keepsake>,

    /// Append-only choice history.
    #[serde(rename = "logbookHistory")]
    pub logbook: Vec<LogbookEntry>,

    #[serde(default = "default_typing_speed")]
    pub typing_speed: u32,

    #[serde(default)]
    pub has_seen_intro: bool,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self::fresh(START_NODE, DEFAULT_TYPING_SPEED)
    }
}

impl ProgressionState {
    /// A new game at `start`, carrying the given typing speed preference.
    pub fn fresh(start: impl Into<String>, typing_speed: u32) -> Self {
        Self {
            current_node_id: start.into(),
            mental_energy: DEFAULT_MENTAL_ENERGY,
            relationships: Relationships::default(),
            keepsakes: Vec::new(),
            logbook: Vec::new(),
            typing_speed: clamp_typing_speed(typing_speed.into()),
            has_seen_intro: false,
        }
    }

    /// Add `delta` to mental energy, clamped. Returns `(old, new)`.
    pub fn adjust_energy(&mut self, delta: i32) -> (i32, i32) {
        let old = self.mental_energy;
        self.mental_energy = clamp_meter(old.saturating_add(delta));
        (old, self.mental_energy)
    }

    /// Replace mental energy with an absolute value, clamped. Returns `(old, new)`.
    pub fn set_energy(&mut self, value: i32) -> (i32, i32) {
        let old = self.mental_energy;
        self.mental_energy = clamp_meter(value);
        (old, self.mental_energy)
    }

    pub fn has_keepsake(&self, name: &str) -> bool {
        self.keepsakes.iter().any(|k| k.name == name)
    }

    /// Set-insert by name. Returns true if the keepsake was new.
    pub fn collect_keepsake(&mut self, keepsake: &Keepsake) -> bool {
        if self.has_keepsake(&keepsake.name) {
            return false;
        }
        self.keepsakes.push(keepsake.clone());
        true
    }

    pub fn log_choice(&mut self, entry: LogbookEntry) {
        self.logbook.push(entry);
    }

    /// First keepsake name that appears more than once, if any.
    pub fn duplicate_keepsake(&self) -> Option<&str> {
        self.keepsakes
            .iter()
            .enumerate()
            .find(|(i, k)| self.keepsakes[..*i].iter().any(|seen| seen.name == k.name))
            .map(|(_, k)| k.name.as_str())
    }

    /// First numeric field outside its allowed range, if any.
    pub fn out_of_range_field(&self) -> Option<(&'static str, i64)> {
        let meters = [
            ("mentalEnergy", self.mental_energy),
            ("relationships.bapak", self.relationships.bapak),
            ("relationships.ibu", self.relationships.ibu),
            ("relationships.surya", self.relationships.surya),
        ];

        if let Some((field, value)) = meters
            .into_iter()
            .find(|(_, v)| !(METER_MIN..=METER_MAX).contains(v))
        {
            return Some((field, value.into()));
        }

        if !(TYPING_SPEED_MIN..=TYPING_SPEED_MAX).contains(&self.typing_speed) {
            return Some(("typingSpeed", self.typing_speed.into()));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_defaults() {
        let state = ProgressionState::default();
        assert_eq!(state.current_node_id, "START");
        assert_eq!(state.mental_energy, 50);
        assert_eq!(state.relationships, Relationships::default());
        assert_eq!(state.relationships.ibu, 50);
        assert!(state.keepsakes.is_empty());
        assert!(state.logbook.is_empty());
        assert_eq!(state.typing_speed, DEFAULT_TYPING_SPEED);
        assert!(!state.has_seen_intro);
    }

    #[test]
    fn test_duplicate_keepsake_found() {
        let mut state = ProgressionState::default();
        state.keepsakes.push(Keepsake::new("Foto keluarga", "..."));
        state.keepsakes.push(Keepsake::new("Pesan dari Surya", "..."));
        assert_eq!(state.duplicate_keepsake(), None);

        state.keepsakes.push(Keepsake::new("Pesan dari Surya", "lagi"));
        assert_eq!(state.duplicate_keepsake(), Some("Pesan dari Surya"));
    }

    #[test]
    fn test_energy_clamped_both_ways() {
        let mut state = ProgressionState::default();
        state.mental_energy = 10;
        assert_eq!(state.adjust_energy(-20), (10, 0));
        assert_eq!(state.adjust_energy(500), (0, 100));
        assert_eq!(state.set_energy(-3), (100, 0));
        assert_eq!(state.set_energy(75), (0, 75));
    }

    #[test]
    fn test_energy_adjust_saturates() {
        let mut state = ProgressionState::default();
        assert_eq!(state.adjust_energy(i32::MAX).1, 100);
        assert_eq!(state.adjust_energy(i32::MIN).1, 0);
    }

    #[test]
    fn test_relationship_adjust_clamped() {
        let mut relationships = Relationships::default();
        assert_eq!(relationships.adjust(Character::Bapak, -15), (50, 35));
        assert_eq!(relationships.adjust(Character::Bapak, -100), (35, 0));
        assert_eq!(relationships.adjust(Character::Ibu, 80), (50, 100));
        assert_eq!(relationships.get(Character::Surya), 50);
    }

    #[test]
    fn test_keepsakes_unique_by_name() {
        let mut state = ProgressionState::default();
        let message = Keepsake::new("Pesan dari Surya", "A reminder.");
        assert!(state.collect_keepsake(&message));
        assert!(!state.collect_keepsake(&message));

        // Same name, different text is still a duplicate.
        let reworded = Keepsake::new("Pesan dari Surya", "Reworded.");
        assert!(!state.collect_keepsake(&reworded));
        assert_eq!(state.keepsakes.len(), 1);
    }

    #[test]
    fn test_typing_speed_clamp() {
        assert_eq!(clamp_typing_speed(0), 1);
        assert_eq!(clamp_typing_speed(-40), 1);
        assert_eq!(clamp_typing_speed(55), 55);
        assert_eq!(clamp_typing_speed(1000), 100);
    }

    #[test]
    fn test_durable_field_names() {
        let mut state = ProgressionState::default();
        state.log_choice(LogbookEntry {
            node_id: "START".to_string(),
            choice: "Cek ponsel.".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        });
        state.collect_keepsake(&Keepsake::new("Pesan dari Surya", "A reminder."));

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["currentNodeId"], "START");
        assert_eq!(value["mentalEnergy"], 50);
        assert_eq!(value["relationships"]["surya"], 50);
        assert_eq!(value["mementos"][0]["name"], "Pesan dari Surya");
        assert_eq!(value["logbookHistory"][0]["nodeId"], "START");
        assert_eq!(value["logbookHistory"][0]["choice"], "Cek ponsel.");
        assert_eq!(value["typingSpeed"], 30);
        assert_eq!(value["hasSeenIntro"], false);
    }

    #[test]
    fn test_out_of_range_detection() {
        let mut state = ProgressionState::default();
        assert_eq!(state.out_of_range_field(), None);

        state.relationships.ibu = 140;
        assert_eq!(state.out_of_range_field(), Some(("relationships.ibu", 140)));

        state.relationships.ibu = 50;
        state.typing_speed = 0;
        assert_eq!(state.out_of_range_field(), Some(("typingSpeed", 0)));
    }
}
