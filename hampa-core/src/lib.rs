//! Branching narrative engine for Ruang Hampa.
//!
//! This crate provides:
//! - A validated story graph loaded from JSON
//! - Progression state with bounded meters, keepsakes and a logbook
//! - An engine that applies choices and reports their effects
//! - Save/load through a pluggable storage provider
//! - A cancelable typewriter reveal scheduler
//!
//! # Quick Start
//!
//! ```ignore
//! use hampa_core::{Engine, EngineConfig};
//!
//! let config = EngineConfig::from_env();
//! let mut engine = Engine::from_config(&config)?;
//! engine.load_settings();
//! if engine.load_game().is_err() {
//!     engine.start_new_game()?;
//! }
//!
//! let choice = engine.current_node().choices[0].clone();
//! let outcome = engine.apply_choice(&choice);
//! println!("Now at {}", outcome.node_id);
//! ```

pub mod assets;
pub mod engine;
pub mod events;
pub mod headless;
pub mod persist;
pub mod reveal;
pub mod settings;
pub mod state;
pub mod story;
pub mod testing;

// Primary public API
pub use engine::{ChoiceOutcome, Clock, Engine, SystemClock, INTRO_TEXT};
pub use events::{Effect, Notification};
pub use headless::{HeadlessError, HeadlessGame};
pub use persist::{FileStorage, LoadError, MemoryStorage, PersistError, StorageProvider};
pub use reveal::{RevealOutcome, Typewriter};
pub use settings::{ConfigError, EngineConfig, Settings};
pub use state::{LogbookEntry, ProgressionState, Relationships};
pub use story::{Character, StoryChoice, StoryGraph, StoryNode, START_NODE};
pub use testing::TestHarness;
