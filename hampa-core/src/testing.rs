//! Testing utilities for the narrative engine.
//!
//! This module provides tools for integration testing:
//! - `UnavailableStorage` and `FixedClock` collaborators
//! - `sample_graph` for a small, fully known story
//! - `TestHarness` for scripted play-throughs
//! - Assertion helpers for verifying engine state

use crate::engine::{ChoiceOutcome, Clock, Engine};
use crate::persist::{MemoryStorage, StorageError, StorageProvider};
use crate::story::{
    Character, InteractableObject, Keepsake, StoryChoice, StoryGraph, StoryNode,
};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// A storage backend that refuses every operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStorage;

impl StorageProvider for UnavailableStorage {
    fn save(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn contains(&self, _key: &str) -> bool {
        false
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    /// 2024-03-01T07:30:00Z
    fn default() -> Self {
        Self(
            Utc.with_ymd_and_hms(2024, 3, 1, 7, 30, 0)
                .single()
                .unwrap_or_default(),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A four-node story with one of everything.
///
/// ```text
/// START --"Bicara dengan Ibu."--> KITCHEN --"Tidur lagi." (-10)--> END
///   |                               \--"Kembali."--> START
///   \--"Cek ponsel."--> PHONE (energy 45, keepsake) --"Matikan ponsel."--> END
///                          \--"Kembali ke kamar."--> START
/// ```
pub fn sample_graph() -> StoryGraph {
    let mut nodes = HashMap::new();

    nodes.insert(
        "START".to_string(),
        StoryNode::new("Pagi yang sunyi.\nCahaya masuk dari jendela.", "Kamar Banyu")
            .with_image("BANYU_ROOM_MORNING")
            .with_object(InteractableObject::new(
                "Jam Dinding",
                "Jarumnya berdetak pelan.",
            ))
            .with_choice(StoryChoice::new("Bicara dengan Ibu.", "KITCHEN"))
            .with_choice(StoryChoice::new("Cek ponsel.", "PHONE")),
    );

    nodes.insert(
        "KITCHEN".to_string(),
        StoryNode::new("Ibu sedang memasak.", "Dapur")
            .with_choice(
                StoryChoice::new("Kembali.", "START")
                    .with_relationship_change(Character::Ibu, -5),
            )
            .with_choice(StoryChoice::new("Tidur lagi.", "END").with_energy_change(-10)),
    );

    nodes.insert(
        "PHONE".to_string(),
        StoryNode::new("Ada pesan dari Surya.", "Kamar Banyu")
            .with_mental_energy(45)
            .with_keepsake(Keepsake::new("Pesan dari Surya", "Sebuah pengingat."))
            .with_choice(StoryChoice::new("Kembali ke kamar.", "START"))
            .with_choice(StoryChoice::new("Matikan ponsel.", "END")),
    );

    nodes.insert(
        "END".to_string(),
        StoryNode::new("Hari berakhir.", "Kamar Banyu"),
    );

    match StoryGraph::new(nodes) {
        Ok(graph) => graph,
        Err(e) => panic!("sample graph is invalid: {e}"),
    }
}

/// Test harness for scripted play-throughs.
pub struct TestHarness {
    /// The engine under test.
    pub engine: Engine,
    /// Storage shared with the engine.
    pub storage: MemoryStorage,
}

impl TestHarness {
    /// Create a harness over the sample graph.
    pub fn new() -> Self {
        Self::with_story(sample_graph())
    }

    /// Create a harness over the bundled story.
    pub fn builtin() -> Self {
        match StoryGraph::builtin() {
            Ok(story) => Self::with_story(story),
            Err(e) => panic!("bundled story is invalid: {e}"),
        }
    }

    /// Create a harness over any story.
    pub fn with_story(story: StoryGraph) -> Self {
        let storage = MemoryStorage::new();
        let engine = Engine::new(Arc::new(story), Arc::new(storage.clone()))
            .with_clock(FixedClock::default());
        Self { engine, storage }
    }

    /// Another engine over the same story and storage, as after a restart.
    pub fn restart(&self) -> Engine {
        Engine::new(
            Arc::new(self.engine.story().clone()),
            Arc::new(self.storage.clone()),
        )
        .with_clock(FixedClock::default())
    }

    /// Make the current node's choice whose text matches.
    pub fn choose(&mut self, text: &str) -> ChoiceOutcome {
        let choice = self
            .engine
            .current_node()
            .choices
            .iter()
            .find(|choice| choice.text == text)
            .cloned();

        match choice {
            Some(choice) => self.engine.apply_choice(&choice),
            None => panic!(
                "No choice \"{text}\" at node {}",
                self.engine.current_node_id()
            ),
        }
    }

    /// Make the current node's choice at `index`.
    pub fn choose_index(&mut self, index: usize) -> ChoiceOutcome {
        let choice = self.engine.current_node().choices.get(index).cloned();
        match choice {
            Some(choice) => self.engine.apply_choice(&choice),
            None => panic!(
                "No choice {index} at node {}",
                self.engine.current_node_id()
            ),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the engine is at a node.
pub fn assert_at(harness: &TestHarness, node_id: &str) {
    assert_eq!(
        harness.engine.current_node_id(),
        node_id,
        "Expected to be at {node_id}"
    );
}

/// Assert the mental energy value.
pub fn assert_energy(harness: &TestHarness, energy: i32) {
    assert_eq!(
        harness.engine.mental_energy(),
        energy,
        "Expected mental energy {energy}"
    );
}

/// Assert a keepsake has been collected exactly once.
pub fn assert_has_keepsake(harness: &TestHarness, name: &str) {
    let count = harness
        .engine
        .mementos()
        .iter()
        .filter(|k| k.name == name)
        .count();
    assert_eq!(count, 1, "Expected exactly one keepsake named '{name}'");
}

/// Assert every meter is within [0, 100].
pub fn assert_meters_in_bounds(engine: &Engine) {
    let state = engine.state();
    assert!(
        (0..=100).contains(&state.mental_energy),
        "Mental energy out of bounds: {}",
        state.mental_energy
    );
    for (character, value) in state.relationships.iter() {
        assert!(
            (0..=100).contains(&value),
            "{character} relationship out of bounds: {value}"
        );
    }
}
