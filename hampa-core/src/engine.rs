//! The narrative engine: applies choices to progression state and persists it.
//!
//! The engine is an explicit value owned by the application. It reads the
//! story graph, owns the single [`ProgressionState`], and writes records
//! through a [`StorageProvider`]. Every operation runs to completion before
//! returning; persistence failures are reported, never fatal.

use crate::events::{Effect, Notification};
use crate::persist::{
    read_progression, read_record, write_record, LoadError, PersistError, StorageError,
    StorageProvider, SAVE_KEY, SETTINGS_KEY,
};
use crate::settings::{ConfigError, EngineConfig, Settings};
use crate::state::{clamp_typing_speed, LogbookEntry, ProgressionState, Relationships};
use crate::story::{InteractableObject, Keepsake, StoryChoice, StoryGraph, StoryNode};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as _;
use std::sync::Arc;

/// Shown once before the first node of a new player's game.
pub const INTRO_TEXT: &str = "Selamat datang di Ruang Hampa.

Ini adalah sebuah simulasi naratif yang mengeksplorasi pengalaman hidup dengan depresi dalam konteks keluarga Indonesia.

Game ini mengandung tema sensitif termasuk kesehatan mental, konflik keluarga, dan kesulitan emosional.

Pilihanmu akan membentuk cerita. Tidak ada jawaban benar atau salah, hanya pengalaman yang berbeda.

Mohon bermain dengan bijak.";

/// Source of logbook timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Result of applying a choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOutcome {
    /// Node the player is now at.
    pub node_id: String,

    /// State changes applied, in order.
    pub effects: Vec<Effect>,

    /// Messages for the presentation layer.
    pub notifications: Vec<Notification>,

    /// Whether the new node is an ending.
    pub is_ending: bool,
}

impl ChoiceOutcome {
    /// Keepsakes collected by this choice.
    pub fn new_keepsakes(&self) -> impl Iterator<Item = &Keepsake> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::KeepsakeCollected(keepsake) => Some(keepsake),
            _ => None,
        })
    }

    /// Whether the requested target was missing and the start node was used.
    pub fn fell_back(&self) -> bool {
        self.effects
            .iter()
            .any(|effect| matches!(effect, Effect::NodeEntered { fallback: true, .. }))
    }
}

/// The narrative engine.
pub struct Engine {
    story: Arc<StoryGraph>,
    storage: Arc<dyn StorageProvider>,
    clock: Arc<dyn Clock>,
    settings: Settings,
    state: ProgressionState,
}

impl Engine {
    /// Create a new engine at the start of the story with default settings.
    pub fn new(story: Arc<StoryGraph>, storage: Arc<dyn StorageProvider>) -> Self {
        let settings = Settings::default();
        let state = ProgressionState::fresh(story.start_id(), settings.typing_speed);
        tracing::info!(nodes = story.len(), "Engine initialized");

        Self {
            story,
            storage,
            clock: Arc::new(SystemClock),
            settings,
            state,
        }
    }

    /// Build an engine from configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let story = Arc::new(config.story()?);
        let storage = config.storage()?;
        Ok(Self::new(story, storage))
    }

    /// Use a custom clock for logbook timestamps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// A copy of the progression state.
    pub fn state(&self) -> ProgressionState {
        self.state.clone()
    }

    pub fn current_node_id(&self) -> &str {
        &self.state.current_node_id
    }

    /// The current node, or the start node if the current key does not resolve.
    pub fn current_node(&self) -> &StoryNode {
        let (_, node, _) = self.story.resolve_or_start(&self.state.current_node_id);
        node
    }

    /// Whether the current node is an ending.
    pub fn is_ending(&self) -> bool {
        self.current_node().is_terminal()
    }

    pub fn intro_text(&self) -> &'static str {
        INTRO_TEXT
    }

    pub fn mental_energy(&self) -> i32 {
        self.state.mental_energy
    }

    pub fn relationships(&self) -> Relationships {
        self.state.relationships
    }

    pub fn mementos(&self) -> &[Keepsake] {
        &self.state.keepsakes
    }

    pub fn logbook_history(&self) -> &[LogbookEntry] {
        &self.state.logbook
    }

    pub fn typing_speed(&self) -> u32 {
        self.state.typing_speed
    }

    pub fn has_seen_intro(&self) -> bool {
        self.state.has_seen_intro
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn story(&self) -> &StoryGraph {
        &self.story
    }

    // ========================================================================
    // Progression
    // ========================================================================

    /// Apply a choice made at the current node.
    ///
    /// The logbook entry is written first, so it records the node the choice
    /// was made from. A node's absolute energy replaces any delta applied by
    /// the choice. The state is saved afterwards; a failed save is reported in
    /// the outcome and the in-memory change stands.
    pub fn apply_choice(&mut self, choice: &StoryChoice) -> ChoiceOutcome {
        tracing::info!(
            from = %self.state.current_node_id,
            to = %choice.next_node_id,
            choice = %choice.text,
            "Player chose"
        );

        let mut effects = Vec::new();
        let mut notifications = Vec::new();

        let entry = LogbookEntry {
            node_id: self.state.current_node_id.clone(),
            choice: choice.text.clone(),
            timestamp: self.timestamp(),
        };
        self.state.log_choice(entry.clone());
        effects.push(Effect::ChoiceLogged(entry));

        if let Some(delta) = choice.mental_energy_change {
            let (old, new) = self.state.adjust_energy(delta);
            tracing::debug!(old, new, delta, "Mental energy changed");
            effects.push(Effect::EnergyChanged { old, new, delta });
        }

        if let Some(change) = &choice.relationship_change {
            let (old, new) = self
                .state
                .relationships
                .adjust(change.character, change.change);
            tracing::debug!(character = %change.character, old, new, "Relationship changed");
            effects.push(Effect::RelationshipChanged {
                character: change.character,
                old,
                new,
                delta: change.change,
            });
        }

        let (node_id, node, fallback) = self.story.resolve_or_start(&choice.next_node_id);
        let node_id = node_id.to_string();
        let override_energy = node.mental_energy;
        let keepsake = node.keepsake.clone();
        let is_ending = node.is_terminal();

        self.state.current_node_id = node_id.clone();
        effects.push(Effect::NodeEntered {
            node_id: node_id.clone(),
            fallback,
        });

        if let Some(value) = override_energy {
            let (old, new) = self.state.set_energy(value);
            tracing::debug!(old, new, "Mental energy set by node");
            effects.push(Effect::EnergyOverridden { old, new });
        }

        if let Some(keepsake) = keepsake {
            if self.state.collect_keepsake(&keepsake) {
                tracing::info!(keepsake = %keepsake.name, "New keepsake discovered");
                notifications.push(Notification::KeepsakeDiscovered(keepsake.clone()));
                effects.push(Effect::KeepsakeCollected(keepsake));
            }
        }

        if let Err(e) = self.save_game() {
            notifications.push(Notification::SaveFailed {
                reason: e.to_string(),
            });
        }

        ChoiceOutcome {
            node_id,
            effects,
            notifications,
            is_ending,
        }
    }

    /// Interact with an object in the current scene.
    ///
    /// Interaction does not change state; it yields the object's description.
    pub fn interact_with_object(&self, object: &InteractableObject) -> Notification {
        tracing::info!(
            node = %self.state.current_node_id,
            object = %object.name,
            "Interacting with object"
        );
        Notification::Interaction {
            name: object.name.clone(),
            description: object.description.clone(),
        }
    }

    /// One-way flag flip; persisted by the next save.
    pub fn mark_intro_as_seen(&mut self) {
        tracing::debug!("Marking intro as seen");
        self.state.has_seen_intro = true;
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Set the typing speed, clamped to [1, 100], and persist it immediately.
    ///
    /// The value is written to both the settings record and the progression
    /// record. The in-memory change stands even if a write fails.
    pub fn set_typing_speed(&mut self, speed: i64) -> Result<u32, PersistError> {
        let speed = clamp_typing_speed(speed);
        self.state.typing_speed = speed;
        self.settings.typing_speed = speed;
        tracing::info!(speed, "Typing speed set");

        self.save_settings()?;
        self.save_game()?;
        Ok(speed)
    }

    /// Read the settings record, falling back to defaults.
    ///
    /// Call before [`load_game`](Self::load_game): a loaded game's own typing
    /// speed then takes precedence.
    pub fn load_settings(&mut self) -> Settings {
        let settings = match read_record::<Settings>(self.storage.as_ref(), SETTINGS_KEY) {
            Ok(Some(settings)) => settings.clamped(),
            Ok(None) => Settings::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            }
        };

        self.settings = settings;
        self.state.typing_speed = settings.typing_speed;
        tracing::debug!(typing_speed = settings.typing_speed, "Settings loaded");
        settings
    }

    pub fn save_settings(&self) -> Result<(), PersistError> {
        write_record(self.storage.as_ref(), SETTINGS_KEY, &self.settings).map_err(|e| {
            tracing::warn!(error = %e, "Failed to save settings");
            e
        })
    }

    // ========================================================================
    // Save / Load
    // ========================================================================

    /// Write the progression state under the save key.
    pub fn save_game(&self) -> Result<(), PersistError> {
        match write_record(self.storage.as_ref(), SAVE_KEY, &self.state) {
            Ok(()) => {
                tracing::debug!(node = %self.state.current_node_id, "Game saved");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save game, continuing in memory");
                Err(e)
            }
        }
    }

    /// Replace the in-memory state with the saved one.
    ///
    /// On any failure the in-memory state is left exactly as it was.
    pub fn load_game(&mut self) -> Result<(), LoadError> {
        let story = &self.story;
        match read_progression(self.storage.as_ref(), |id| story.contains(id)) {
            Ok(state) => {
                tracing::info!(
                    node = %state.current_node_id,
                    energy = state.mental_energy,
                    "Game loaded"
                );
                self.settings.typing_speed = state.typing_speed;
                self.state = state;
                Ok(())
            }
            Err(LoadError::NotFound) => {
                tracing::info!("No saved game found");
                Err(LoadError::NotFound)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Invalid save data");
                Err(e)
            }
        }
    }

    /// Whether a progression record exists. Does not read it.
    pub fn has_saved_game(&self) -> bool {
        self.storage.contains(SAVE_KEY)
    }

    /// Reset to a fresh game and save it.
    pub fn start_new_game(&mut self) -> Result<(), PersistError> {
        tracing::info!("Starting new game");
        self.state = self.fresh_state();
        self.save_game()
    }

    /// Remove the saved game and reset in memory without saving.
    ///
    /// A later [`load_game`](Self::load_game) finds nothing.
    pub fn reset_game(&mut self) -> Result<(), StorageError> {
        tracing::info!("Resetting game");
        self.state = self.fresh_state();
        self.storage.remove(SAVE_KEY).map_err(|e| {
            tracing::warn!(error = %e, "Failed to remove saved game");
            e
        })
    }

    // ========================================================================
    // Debug
    // ========================================================================

    /// Multi-line dump of the state, also emitted at debug level.
    pub fn debug_state(&self) -> String {
        let state = &self.state;
        let mut out = String::new();
        let _ = writeln!(out, "Current Node: {}", state.current_node_id);
        let _ = writeln!(out, "Mental Energy: {}", state.mental_energy);
        let _ = writeln!(
            out,
            "Relationships: bapak={} ibu={} surya={}",
            state.relationships.bapak, state.relationships.ibu, state.relationships.surya
        );
        let _ = writeln!(out, "Mementos: {}", state.keepsakes.len());
        let _ = writeln!(out, "Logbook Entries: {}", state.logbook.len());
        let _ = writeln!(out, "Typing Speed: {}", state.typing_speed);
        let _ = write!(out, "Has Seen Intro: {}", state.has_seen_intro);

        tracing::debug!("Debug state\n{out}");
        out
    }

    fn fresh_state(&self) -> ProgressionState {
        ProgressionState::fresh(self.story.start_id(), self.settings.typing_speed)
    }

    fn timestamp(&self) -> String {
        self.clock
            .now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
