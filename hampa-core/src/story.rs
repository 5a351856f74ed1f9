//! Story graph types and loading.
//!
//! The story is static structured data: a JSON object keyed by node id. A
//! graph is validated as it is built, so every choice target is known to
//! resolve before an [`Engine`](crate::engine::Engine) ever sees it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Node id every new game starts at, and the fallback for unresolvable keys.
pub const START_NODE: &str = "START";

/// The bundled story, compiled into the crate.
const BUILTIN_STORY: &str = include_str!("../data/story.json");

/// Errors from loading or validating a story graph.
#[derive(Debug, Error)]
pub enum StoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Story has no start node \"{0}\"")]
    MissingStart(String),

    #[error("Story has dangling choice targets: {0}")]
    DanglingTargets(DanglingTargets),
}

// ============================================================================
// Story Content Types
// ============================================================================

/// The three family members the player has a relationship score with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Character {
    /// Father.
    Bapak,
    /// Mother.
    Ibu,
    /// Older brother.
    Surya,
}

impl Character {
    pub fn name(&self) -> &'static str {
        match self {
            Character::Bapak => "Bapak",
            Character::Ibu => "Ibu",
            Character::Surya => "Surya",
        }
    }

    /// Family role, for display next to the name.
    pub fn role(&self) -> &'static str {
        match self {
            Character::Bapak => "Father",
            Character::Ibu => "Mother",
            Character::Surya => "Older brother",
        }
    }

    pub fn all() -> [Character; 3] {
        [Character::Bapak, Character::Ibu, Character::Surya]
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A signed adjustment to one relationship score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipChange {
    pub character: Character,
    pub change: i32,
}

/// A player-selectable transition to another node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryChoice {
    /// Text shown on the choice button and written to the logbook.
    pub text: String,

    /// Key of the node this choice leads to.
    pub next_node_id: String,

    /// Added to mental energy before the target node is entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mental_energy_change: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_change: Option<RelationshipChange>,
}

impl StoryChoice {
    pub fn new(text: impl Into<String>, next_node_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next_node_id: next_node_id.into(),
            mental_energy_change: None,
            relationship_change: None,
        }
    }

    pub fn with_energy_change(mut self, change: i32) -> Self {
        self.mental_energy_change = Some(change);
        self
    }

    pub fn with_relationship_change(mut self, character: Character, change: i32) -> Self {
        self.relationship_change = Some(RelationshipChange { character, change });
        self
    }
}

/// Something in the scene the player can look at. Looking never changes state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractableObject {
    pub name: String,
    pub description: String,
}

impl InteractableObject {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A collectible memento, unique by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Keepsake {
    pub name: String,
    pub description: String,
}

impl Keepsake {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Node prose: either one block split on line breaks, or explicit paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prose {
    Block(String),
    Paragraphs(Vec<String>),
}

impl Prose {
    /// Non-blank paragraphs, trimmed, in order.
    pub fn paragraphs(&self) -> Vec<&str> {
        let raw: Vec<&str> = match self {
            Prose::Block(text) => text.split('\n').collect(),
            Prose::Paragraphs(paragraphs) => paragraphs.iter().map(String::as_str).collect(),
        };

        raw.into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

impl Default for Prose {
    fn default() -> Self {
        Prose::Block(String::new())
    }
}

impl From<&str> for Prose {
    fn from(text: &str) -> Self {
        Prose::Block(text.to_string())
    }
}

/// A single narrative beat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryNode {
    pub story: Prose,

    pub location: String,

    /// Key into the image asset registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Absolute energy set on arrival; replaces any delta from the choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mental_energy: Option<i32>,

    #[serde(default)]
    pub interactable_objects: Vec<InteractableObject>,

    #[serde(rename = "actions", default)]
    pub choices: Vec<StoryChoice>,

    #[serde(rename = "newMemento", default, skip_serializing_if = "Option::is_none")]
    pub keepsake: Option<Keepsake>,
}

impl StoryNode {
    pub fn new(story: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            story: Prose::Block(story.into()),
            location: location.into(),
            image: None,
            mental_energy: None,
            interactable_objects: Vec::new(),
            choices: Vec::new(),
            keepsake: None,
        }
    }

    pub fn with_image(mut self, key: impl Into<String>) -> Self {
        self.image = Some(key.into());
        self
    }

    pub fn with_mental_energy(mut self, energy: i32) -> Self {
        self.mental_energy = Some(energy);
        self
    }

    pub fn with_object(mut self, object: InteractableObject) -> Self {
        self.interactable_objects.push(object);
        self
    }

    pub fn with_choice(mut self, choice: StoryChoice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_keepsake(mut self, keepsake: Keepsake) -> Self {
        self.keepsake = Some(keepsake);
        self
    }

    /// A node is an ending iff it offers no choices.
    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn paragraphs(&self) -> Vec<&str> {
        self.story.paragraphs()
    }
}

// ============================================================================
// Validation
// ============================================================================

/// A choice whose target node does not exist.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DanglingTarget {
    /// Node the choice belongs to.
    pub from: String,
    /// The choice text.
    pub choice: String,
    /// The missing target key.
    pub target: String,
}

impl fmt::Display for DanglingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --[{}]--> {}", self.from, self.choice, self.target)
    }
}

/// Every dangling target found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingTargets(pub Vec<DanglingTarget>);

impl fmt::Display for DanglingTargets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listed: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", listed.join("; "))
    }
}

/// Walk every choice and collect the ones pointing at missing nodes.
fn find_dangling(nodes: &HashMap<String, StoryNode>) -> Vec<DanglingTarget> {
    let mut dangling: Vec<DanglingTarget> = nodes
        .iter()
        .flat_map(|(id, node)| {
            node.choices
                .iter()
                .filter(|choice| !nodes.contains_key(&choice.next_node_id))
                .map(move |choice| DanglingTarget {
                    from: id.clone(),
                    choice: choice.text.clone(),
                    target: choice.next_node_id.clone(),
                })
        })
        .collect();

    dangling.sort();
    dangling
}

// ============================================================================
// Story Graph
// ============================================================================

/// Immutable mapping from node id to node definition.
#[derive(Debug, Clone)]
pub struct StoryGraph {
    nodes: HashMap<String, StoryNode>,
    start: String,
}

impl StoryGraph {
    /// Build a graph rooted at [`START_NODE`], validating it.
    pub fn new(nodes: HashMap<String, StoryNode>) -> Result<Self, StoryError> {
        Self::with_start(nodes, START_NODE)
    }

    /// Build a graph with a custom start node, validating it.
    pub fn with_start(
        nodes: HashMap<String, StoryNode>,
        start: impl Into<String>,
    ) -> Result<Self, StoryError> {
        let start = start.into();

        if !nodes.contains_key(&start) {
            return Err(StoryError::MissingStart(start));
        }

        let dangling = find_dangling(&nodes);
        if !dangling.is_empty() {
            return Err(StoryError::DanglingTargets(DanglingTargets(dangling)));
        }

        tracing::debug!(nodes = nodes.len(), start = %start, "Story graph validated");
        Ok(Self { nodes, start })
    }

    /// Parse and validate a story from JSON.
    pub fn from_json(json: &str) -> Result<Self, StoryError> {
        let nodes: HashMap<String, StoryNode> = serde_json::from_str(json)?;
        Self::new(nodes)
    }

    /// Load and validate a story from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// The bundled story.
    pub fn builtin() -> Result<Self, StoryError> {
        Self::from_json(BUILTIN_STORY)
    }

    pub fn start_id(&self) -> &str {
        &self.start
    }

    pub fn start_node(&self) -> &StoryNode {
        // Presence of the start node is checked at construction.
        &self.nodes[&self.start]
    }

    pub fn resolve(&self, key: &str) -> Option<&StoryNode> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// Resolve a key, substituting the start node when it is unknown.
    ///
    /// Returns the id actually resolved and whether the fallback was used.
    pub fn resolve_or_start<'a>(&'a self, key: &'a str) -> (&'a str, &'a StoryNode, bool) {
        match self.nodes.get(key) {
            Some(node) => (key, node, false),
            None => {
                tracing::error!(
                    node = key,
                    fallback = %self.start,
                    "Story node not found, falling back to start node"
                );
                (self.start.as_str(), self.start_node(), true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids, sorted.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Ids of terminal nodes, sorted.
    pub fn endings(&self) -> Vec<&str> {
        let mut endings: Vec<&str> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.is_terminal())
            .map(|(id, _)| id.as_str())
            .collect();
        endings.sort_unstable();
        endings
    }

    /// Every image key referenced by some node.
    pub fn image_keys(&self) -> BTreeSet<&str> {
        self.nodes
            .values()
            .filter_map(|node| node.image.as_deref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_map(entries: Vec<(&str, StoryNode)>) -> HashMap<String, StoryNode> {
        entries
            .into_iter()
            .map(|(id, node)| (id.to_string(), node))
            .collect()
    }

    #[test]
    fn test_builtin_story_validates() {
        let story = StoryGraph::builtin().expect("bundled story should validate");
        assert_eq!(story.start_id(), START_NODE);
        assert_eq!(story.len(), 24);
        assert_eq!(story.start_node().choices.len(), 3);
    }

    #[test]
    fn test_builtin_endings() {
        let story = StoryGraph::builtin().unwrap();
        assert_eq!(
            story.endings(),
            vec!["ALTERNATE_ENDING", "BAD_ENDING", "GOOD_ENDING"]
        );
    }

    #[test]
    fn test_builtin_check_phone_node() {
        let story = StoryGraph::builtin().unwrap();
        let node = story.resolve("CHECK_PHONE").unwrap();
        assert_eq!(node.mental_energy, Some(45));
        assert_eq!(node.keepsake.as_ref().unwrap().name, "Pesan dari Surya");
        assert_eq!(node.image.as_deref(), Some("PHONE_SCREEN"));
    }

    #[test]
    fn test_block_prose_splits_on_line_breaks() {
        let story = StoryGraph::builtin().unwrap();
        let paragraphs = story.start_node().paragraphs();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[1].starts_with("Ponselmu"));
    }

    #[test]
    fn test_paragraph_prose_drops_blank_entries() {
        let prose: Prose = serde_json::from_str(r#"["  One. ", "", "Two."]"#).unwrap();
        assert_eq!(prose.paragraphs(), vec!["One.", "Two."]);

        let block = Prose::from("First\n\n   \nSecond\n");
        assert_eq!(block.paragraphs(), vec!["First", "Second"]);
    }

    #[test]
    fn test_terminal_iff_no_choices() {
        let ending = StoryNode::new("The end.", "Nowhere").with_object(InteractableObject::new(
            "Window",
            "Still grey.",
        ));
        assert!(ending.is_terminal());

        let beat = StoryNode::new("Go on.", "Here").with_choice(StoryChoice::new("Next", "START"));
        assert!(!beat.is_terminal());
    }

    #[test]
    fn test_missing_start_rejected() {
        let nodes = node_map(vec![("ELSEWHERE", StoryNode::new("Hi", "Room"))]);
        let err = StoryGraph::new(nodes).unwrap_err();
        assert!(matches!(err, StoryError::MissingStart(ref s) if s == START_NODE));
    }

    #[test]
    fn test_all_dangling_targets_reported_at_once() {
        let nodes = node_map(vec![
            (
                "START",
                StoryNode::new("Begin", "Room")
                    .with_choice(StoryChoice::new("Left", "LEFT"))
                    .with_choice(StoryChoice::new("Typo", "AFTER_BREAKFAS T_CHOICE")),
            ),
            (
                "LEFT",
                StoryNode::new("Left", "Hall").with_choice(StoryChoice::new("Onward", "MISSING")),
            ),
        ]);

        let err = StoryGraph::new(nodes).unwrap_err();
        let StoryError::DanglingTargets(DanglingTargets(dangling)) = err else {
            panic!("expected dangling targets");
        };

        assert_eq!(dangling.len(), 2);
        assert_eq!(dangling[0].from, "LEFT");
        assert_eq!(dangling[0].target, "MISSING");
        assert_eq!(dangling[1].from, "START");
        assert_eq!(dangling[1].target, "AFTER_BREAKFAS T_CHOICE");
    }

    #[test]
    fn test_resolve_or_start_falls_back() {
        let story = StoryGraph::builtin().unwrap();

        let (id, _, fallback) = story.resolve_or_start("KITCHEN");
        assert_eq!(id, "KITCHEN");
        assert!(!fallback);

        let (id, node, fallback) = story.resolve_or_start("NONEXISTENT_NODE");
        assert_eq!(id, START_NODE);
        assert!(fallback);
        assert_eq!(node, story.start_node());
    }

    #[test]
    fn test_choice_deserializes_optional_effects() {
        let json = r#"{
            "text": "Menjawab dengan marah.",
            "nextNodeId": "GET_ANGRY",
            "relationshipChange": {"character": "Bapak", "change": -15}
        }"#;
        let choice: StoryChoice = serde_json::from_str(json).unwrap();
        assert_eq!(choice.mental_energy_change, None);
        assert_eq!(
            choice.relationship_change,
            Some(RelationshipChange {
                character: Character::Bapak,
                change: -15
            })
        );
    }

    #[test]
    fn test_image_keys_collected() {
        let story = StoryGraph::builtin().unwrap();
        let keys = story.image_keys();
        assert!(keys.contains("KAMPUS"));
        assert!(keys.contains("TERMINAL_BUS"));
        assert_eq!(keys.len(), 8);
    }
}
