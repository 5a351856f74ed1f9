//! QA tests for choice resolution and progression invariants.
//!
//! These tests drive the engine through the bundled story and the small
//! sample graph, checking meters, keepsakes, the logbook and endings.
//! Run with: `cargo test -p hampa-core --test qa_progression -- --nocapture`

use hampa_core::events::{Effect, Notification};
use hampa_core::persist::{write_record, SAVE_KEY};
use hampa_core::state::ProgressionState;
use hampa_core::story::{Character, StoryChoice, StoryGraph, StoryNode};
use hampa_core::testing::{
    assert_at, assert_energy, assert_has_keepsake, assert_meters_in_bounds, TestHarness,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, VecDeque};

/// Seed the save record with `state` and load it into the harness engine.
fn load_state(harness: &mut TestHarness, state: &ProgressionState) {
    write_record(&harness.storage, SAVE_KEY, state).expect("Failed to seed save");
    harness.engine.load_game().expect("Failed to load seeded save");
}

/// Shortest list of choice texts leading from START to `target`.
fn path_to(story: &StoryGraph, target: &str) -> Vec<String> {
    let mut parents: HashMap<String, (String, String)> = HashMap::new();
    let mut queue = VecDeque::from([story.start_id().to_string()]);

    while let Some(id) = queue.pop_front() {
        if id == target {
            break;
        }
        let node = story.resolve(&id).expect("Queued node must exist");
        for choice in &node.choices {
            if !parents.contains_key(&choice.next_node_id) && choice.next_node_id != "START" {
                parents.insert(
                    choice.next_node_id.clone(),
                    (id.clone(), choice.text.clone()),
                );
                queue.push_back(choice.next_node_id.clone());
            }
        }
    }

    let mut path = Vec::new();
    let mut current = target.to_string();
    while let Some((parent, text)) = parents.get(&current) {
        path.push(text.clone());
        current = parent.clone();
    }
    path.reverse();
    path
}

// =============================================================================
// TEST 1: Checking the phone from a fresh game
// =============================================================================

#[test]
fn test_check_phone_from_fresh_game() {
    println!("\n=== TEST: Check Phone From Fresh Game ===\n");

    let mut harness = TestHarness::builtin();
    let outcome = harness
        .engine
        .apply_choice(&StoryChoice::new("Cek ponsel.", "CHECK_PHONE"));

    println!("Effects:");
    for effect in &outcome.effects {
        println!("  {}", effect.describe());
    }

    assert_at(&harness, "CHECK_PHONE");
    assert_energy(&harness, 45);
    assert_has_keepsake(&harness, "Pesan dari Surya");
    assert_eq!(harness.engine.mementos().len(), 1);

    let log = harness.engine.logbook_history();
    assert_eq!(log.len(), 1, "Exactly one logbook entry");
    assert_eq!(log[0].choice, "Cek ponsel.");
    assert_eq!(log[0].node_id, "START");

    let found: Vec<&str> = outcome.new_keepsakes().map(|k| k.name.as_str()).collect();
    assert_eq!(found, vec!["Pesan dari Surya"]);
    assert!(matches!(
        outcome.notifications.as_slice(),
        [Notification::KeepsakeDiscovered(_)]
    ));
}

// =============================================================================
// TEST 2: Energy clamps at zero
// =============================================================================

#[test]
fn test_energy_clamps_at_zero() {
    println!("\n=== TEST: Energy Clamps At Zero ===\n");

    let mut harness = TestHarness::new();
    let mut state = ProgressionState::default();
    state.mental_energy = 10;
    load_state(&mut harness, &state);
    assert_energy(&harness, 10);

    // KITCHEN has no absolute energy.
    let outcome = harness
        .engine
        .apply_choice(&StoryChoice::new("Menyerah.", "KITCHEN").with_energy_change(-20));

    assert_energy(&harness, 0);
    assert!(outcome.effects.contains(&Effect::EnergyChanged {
        old: 10,
        new: 0,
        delta: -20
    }));
    assert!(!outcome
        .effects
        .iter()
        .any(|e| matches!(e, Effect::EnergyOverridden { .. })));
}

// =============================================================================
// TEST 3: Relationships clamp at both ends
// =============================================================================

#[test]
fn test_relationships_clamp() {
    println!("\n=== TEST: Relationships Clamp ===\n");

    let mut harness = TestHarness::new();
    harness.engine.apply_choice(
        &StoryChoice::new("Marah.", "KITCHEN").with_relationship_change(Character::Bapak, -500),
    );
    harness.engine.apply_choice(
        &StoryChoice::new("Peluk.", "KITCHEN").with_relationship_change(Character::Surya, 500),
    );

    let relationships = harness.engine.relationships();
    assert_eq!(relationships.bapak, 0);
    assert_eq!(relationships.surya, 100);
    assert_eq!(relationships.ibu, 50);
}

// =============================================================================
// TEST 4: Meters stay in bounds over random play
// =============================================================================

#[test]
fn test_meters_in_bounds_over_random_walks() {
    println!("\n=== TEST: Meters In Bounds Over Random Walks ===\n");

    let mut rng = StdRng::seed_from_u64(0x4841_4d50);
    let mut harness = TestHarness::builtin();
    let mut endings_reached = 0;

    for _ in 0..2_000 {
        if harness.engine.is_ending() {
            endings_reached += 1;
            harness.engine.start_new_game().expect("Failed to start new game");
            continue;
        }

        let node = harness.engine.current_node();
        let index = rng.gen_range(0..node.choices.len());

        // Exaggerate the deltas so clamping is exercised often.
        let mut choice = node.choices[index].clone();
        if rng.gen_bool(0.5) {
            choice.mental_energy_change = Some(rng.gen_range(-150..=150));
        }
        if rng.gen_bool(0.5) {
            let character = Character::all()[rng.gen_range(0..3)];
            choice = choice.with_relationship_change(character, rng.gen_range(-150..=150));
        }

        harness.engine.apply_choice(&choice);
        assert_meters_in_bounds(&harness.engine);
    }

    println!("Endings reached: {endings_reached}");
    assert!(endings_reached > 0, "Random play should reach endings");
}

// =============================================================================
// TEST 5: Revisiting a keepsake node
// =============================================================================

#[test]
fn test_revisited_keepsake_collected_once() {
    println!("\n=== TEST: Revisited Keepsake Collected Once ===\n");

    let mut harness = TestHarness::new();
    let first = harness.choose("Cek ponsel.");
    harness.choose("Kembali ke kamar.");
    let second = harness.choose("Cek ponsel.");

    assert_eq!(first.new_keepsakes().count(), 1);
    assert_eq!(second.new_keepsakes().count(), 0);
    assert!(second.notifications.is_empty());
    assert_has_keepsake(&harness, "Pesan dari Surya");
    assert_eq!(harness.engine.mementos().len(), 1);
}

// =============================================================================
// TEST 6: Terminal detection
// =============================================================================

#[test]
fn test_terminal_detection() {
    println!("\n=== TEST: Terminal Detection ===\n");

    let story = StoryGraph::builtin().expect("Bundled story must load");
    assert_eq!(
        story.endings(),
        vec!["ALTERNATE_ENDING", "BAD_ENDING", "GOOD_ENDING"]
    );

    for id in story.node_ids() {
        let node = story.resolve(id).expect("Listed node must resolve");
        assert_eq!(node.is_terminal(), node.choices.is_empty(), "Node {id}");
    }

    // Content does not matter, only the choice list.
    let rich = StoryNode::new("Semua selesai.", "Jembatan")
        .with_image("JEMBATAN_MALAM")
        .with_mental_energy(10)
        .with_object(hampa_core::story::InteractableObject::new("Pagar", "Dingin."));
    assert!(rich.is_terminal());
    let open = rich.with_choice(StoryChoice::new("Pulang.", "START"));
    assert!(!open.is_terminal());
}

// =============================================================================
// TEST 7: Every ending is reachable
// =============================================================================

#[test]
fn test_every_ending_reachable() {
    println!("\n=== TEST: Every Ending Reachable ===\n");

    let story = StoryGraph::builtin().expect("Bundled story must load");

    for ending in story.endings() {
        let path = path_to(&story, ending);
        println!("{ending}: {} choices", path.len());
        assert!(!path.is_empty(), "No path to {ending}");

        let mut harness = TestHarness::builtin();
        for text in &path {
            harness.choose(text);
            assert_meters_in_bounds(&harness.engine);
        }

        assert_at(&harness, ending);
        assert!(harness.engine.is_ending());
        assert_eq!(harness.engine.logbook_history().len(), path.len());
    }
}

// =============================================================================
// TEST 8: The bad ending path drains energy
// =============================================================================

#[test]
fn test_bad_ending_path() {
    println!("\n=== TEST: Bad Ending Path ===\n");

    let mut harness = TestHarness::builtin();
    harness.choose("Bangun dari tempat tidur.");
    harness.choose("Menuju dapur.");
    harness.choose("Duduk di meja makan tanpa bicara.");
    assert_eq!(harness.engine.relationships().ibu, 45);

    harness.choose("Setelah sarapan, apa yang harus kulakukan?");
    harness.choose("Pergi ke kampus.");
    assert_energy(&harness, 35);
    harness.choose("Pulang setelah kelas selesai.");
    harness.choose("Tetap di kamar sampai dipanggil.");
    assert_at(&harness, "DINNER_TABLE");
    assert_energy(&harness, 20);

    harness.choose("Tetap diam dan mendengarkan.");
    assert_energy(&harness, 10);
    harness.choose("Malam ini terasa sangat panjang.");
    assert_energy(&harness, 5);
    assert_eq!(harness.engine.relationships().bapak, 40);

    harness.choose("Semuanya terasa gelap.");
    assert_energy(&harness, 0);
    let outcome = harness.choose("Aku hanya ingin semuanya berhenti.");
    assert!(outcome.is_ending);
    assert_at(&harness, "BAD_ENDING");
    assert_eq!(harness.engine.logbook_history().len(), 11);
}

// =============================================================================
// TEST 9: Logbook is append-only and ordered
// =============================================================================

#[test]
fn test_logbook_append_only() {
    println!("\n=== TEST: Logbook Append Only ===\n");

    let mut harness = TestHarness::new();
    let texts = ["Bicara dengan Ibu.", "Kembali.", "Cek ponsel.", "Kembali ke kamar."];
    for (i, text) in texts.iter().enumerate() {
        harness.choose(text);
        let log = harness.engine.logbook_history();
        assert_eq!(log.len(), i + 1);
        assert_eq!(log[i].choice, *text);
    }

    let origins: Vec<&str> = harness
        .engine
        .logbook_history()
        .iter()
        .map(|e| e.node_id.as_str())
        .collect();
    assert_eq!(origins, vec!["START", "KITCHEN", "START", "PHONE"]);
}

// =============================================================================
// TEST 10: A dangling target falls back to the start node
// =============================================================================

#[test]
fn test_dangling_target_fallback() {
    println!("\n=== TEST: Dangling Target Fallback ===\n");

    let mut harness = TestHarness::builtin();
    harness.choose("Cek ponsel.");

    let outcome = harness
        .engine
        .apply_choice(&StoryChoice::new("Ke mana?", "NONEXISTENT_NODE"));

    assert!(outcome.fell_back());
    assert_at(&harness, "START");
    // START sets energy 50 on arrival.
    assert_energy(&harness, 50);
    assert_eq!(harness.engine.logbook_history().len(), 2);
    assert!(!outcome.is_ending);
}
