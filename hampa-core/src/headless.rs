//! Headless game interface for programmatic use.
//!
//! This module provides a line-driven interface for playing without a TUI.
//! It's designed for:
//! - Scripted play-throughs and automated tests
//! - Piping a story into other tools
//!
//! # Example
//!
//! ```ignore
//! use hampa_core::headless::HeadlessGame;
//! use hampa_core::settings::EngineConfig;
//!
//! let config = EngineConfig::new().with_memory_storage(true);
//! let mut game = HeadlessGame::from_config(&config)?;
//! println!("{}", game.begin().text);
//!
//! let response = game.send("1")?;
//! println!("{}", response.text);
//! ```

use crate::engine::Engine;
use crate::events::{Effect, Notification};
use crate::persist::LoadError;
use crate::settings::{ConfigError, EngineConfig};
use std::fmt::Write as _;
use thiserror::Error;

/// Errors from headless input.
#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("Unknown command: {0} (try #help)")]
    UnknownCommand(String),

    #[error("No choice {index}; pick 1-{available}")]
    InvalidChoice { index: usize, available: usize },

    #[error("No object {index}; pick 1-{available}")]
    InvalidObject { index: usize, available: usize },

    #[error("{0} needs a number")]
    MissingArgument(&'static str),

    #[error("This is an ending. Use #new to play again.")]
    StoryEnded,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Make a choice, 1-based.
    Choose(usize),
    Look,
    Objects,
    /// Interact with an object, 1-based.
    Interact(usize),
    Journal,
    Status,
    Save,
    Load,
    New,
    Reset,
    Speed(i64),
    Help,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Result<Self, HeadlessError> {
        let input = input.trim();

        if let Ok(index) = input.parse::<usize>() {
            return Ok(Command::Choose(index));
        }

        let mut parts = input.split_whitespace();
        let head = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        let number = |name: &'static str| -> Result<i64, HeadlessError> {
            arg.and_then(|a| a.parse().ok())
                .ok_or(HeadlessError::MissingArgument(name))
        };

        match head.as_str() {
            "#look" | "#l" => Ok(Command::Look),
            "#objects" | "#o" => Ok(Command::Objects),
            "#interact" | "#i" => {
                let index = number("#interact")?;
                Ok(Command::Interact(usize::try_from(index).unwrap_or(0)))
            }
            "#journal" | "#j" => Ok(Command::Journal),
            "#status" | "#s" => Ok(Command::Status),
            "#save" => Ok(Command::Save),
            "#load" => Ok(Command::Load),
            "#new" => Ok(Command::New),
            "#reset" => Ok(Command::Reset),
            "#speed" => Ok(Command::Speed(number("#speed")?)),
            "#help" | "#h" | "?" => Ok(Command::Help),
            "#quit" | "#q" => Ok(Command::Quit),
            _ => Err(HeadlessError::UnknownCommand(input.to_string())),
        }
    }
}

/// What the game answered to one line of input.
#[derive(Debug, Clone, Default)]
pub struct GameResponse {
    /// Text to show.
    pub text: String,
    /// Transient messages raised while handling the input.
    pub notifications: Vec<Notification>,
    /// Whether the current node is an ending.
    pub is_ending: bool,
    /// Whether the player asked to quit.
    pub quit: bool,
}

/// An entry in the game transcript.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    /// Player input.
    pub input: String,
    /// Game response text.
    pub response: String,
    /// Turn number.
    pub turn: usize,
}

pub const HELP_TEXT: &str = "\
Ketik nomor pilihan untuk melanjutkan cerita.
  #look            tampilkan adegan lagi
  #objects         daftar benda di sekitar
  #interact <n>    periksa benda ke-n
  #journal         jurnal pilihan dan kenang-kenangan
  #status          energi mental dan hubungan
  #save / #load    simpan atau muat permainan
  #new             mulai permainan baru
  #reset           hapus simpanan dan mulai ulang
  #speed <n>       kecepatan ketik (1-100 ms per huruf)
  #quit            keluar";

/// A headless game that can be controlled programmatically.
pub struct HeadlessGame {
    engine: Engine,
    /// Transcript of all exchanges.
    transcript: Vec<TranscriptEntry>,
}

impl HeadlessGame {
    /// Wrap an existing engine.
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            transcript: Vec::new(),
        }
    }

    /// Build an engine from configuration and wrap it.
    pub fn from_config(config: &EngineConfig) -> Result<Self, HeadlessError> {
        Ok(Self::new(Engine::from_config(config)?))
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Load settings then any saved game, and return the opening text.
    ///
    /// Shows the introduction to a player who has not seen it yet.
    pub fn begin(&mut self) -> GameResponse {
        self.engine.load_settings();

        let mut notifications = Vec::new();
        match self.engine.load_game() {
            Ok(()) => notifications.push(Notification::LoadSucceeded),
            Err(LoadError::NotFound) => {}
            Err(e) => notifications.push(Notification::LoadFailed {
                reason: e.to_string(),
            }),
        }

        let mut text = String::new();
        if !self.engine.has_seen_intro() {
            let _ = writeln!(text, "{}\n", self.engine.intro_text());
            self.engine.mark_intro_as_seen();
            if let Err(e) = self.engine.save_game() {
                notifications.push(Notification::SaveFailed {
                    reason: e.to_string(),
                });
            }
        }
        text.push_str(&render_node(&self.engine));

        GameResponse {
            text,
            notifications,
            is_ending: self.engine.is_ending(),
            quit: false,
        }
    }

    /// Handle one line of input.
    pub fn send(&mut self, input: &str) -> Result<GameResponse, HeadlessError> {
        let command = Command::parse(input)?;
        let response = self.execute(command)?;

        self.transcript.push(TranscriptEntry {
            input: input.trim().to_string(),
            response: response.text.clone(),
            turn: self.transcript.len() + 1,
        });

        Ok(response)
    }

    /// Run a parsed command.
    pub fn execute(&mut self, command: Command) -> Result<GameResponse, HeadlessError> {
        let mut notifications = Vec::new();
        let mut quit = false;

        let text = match command {
            Command::Choose(index) => {
                let node = self.engine.current_node();
                if node.is_terminal() {
                    return Err(HeadlessError::StoryEnded);
                }
                let available = node.choices.len();
                let choice = index
                    .checked_sub(1)
                    .and_then(|i| node.choices.get(i))
                    .cloned()
                    .ok_or(HeadlessError::InvalidChoice { index, available })?;

                let outcome = self.engine.apply_choice(&choice);
                notifications.extend(outcome.notifications.iter().cloned());

                let mut text = String::new();
                for effect in &outcome.effects {
                    if let Some(line) = effect_line(effect) {
                        let _ = writeln!(text, "{line}");
                    }
                }
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&render_node(&self.engine));
                text
            }
            Command::Look => render_node(&self.engine),
            Command::Objects => render_objects(&self.engine),
            Command::Interact(index) => {
                let objects = &self.engine.current_node().interactable_objects;
                let available = objects.len();
                let object = index
                    .checked_sub(1)
                    .and_then(|i| objects.get(i))
                    .ok_or(HeadlessError::InvalidObject { index, available })?;

                let note = self.engine.interact_with_object(object);
                let text = note.message();
                notifications.push(note);
                text
            }
            Command::Journal => render_journal(&self.engine),
            Command::Status => render_status(&self.engine),
            Command::Save => {
                let note = match self.engine.save_game() {
                    Ok(()) => Notification::SaveSucceeded,
                    Err(e) => Notification::SaveFailed {
                        reason: e.to_string(),
                    },
                };
                let text = note.message();
                notifications.push(note);
                text
            }
            Command::Load => match self.engine.load_game() {
                Ok(()) => {
                    notifications.push(Notification::LoadSucceeded);
                    render_node(&self.engine)
                }
                Err(e) => {
                    let note = Notification::LoadFailed {
                        reason: e.to_string(),
                    };
                    let text = note.message();
                    notifications.push(note);
                    text
                }
            },
            Command::New => {
                if let Err(e) = self.engine.start_new_game() {
                    notifications.push(Notification::SaveFailed {
                        reason: e.to_string(),
                    });
                }
                render_node(&self.engine)
            }
            Command::Reset => {
                if let Err(e) = self.engine.reset_game() {
                    tracing::warn!(error = %e, "Reset could not remove the saved game");
                }
                render_node(&self.engine)
            }
            Command::Speed(speed) => match self.engine.set_typing_speed(speed) {
                Ok(speed) => {
                    notifications.push(Notification::SettingsSaved);
                    format!("Kecepatan ketik: {speed} ms per huruf.")
                }
                Err(e) => {
                    notifications.push(Notification::SaveFailed {
                        reason: e.to_string(),
                    });
                    format!(
                        "Kecepatan ketik: {} ms per huruf (tidak tersimpan).",
                        self.engine.typing_speed()
                    )
                }
            },
            Command::Help => HELP_TEXT.to_string(),
            Command::Quit => {
                quit = true;
                "Sampai jumpa.".to_string()
            }
        };

        Ok(GameResponse {
            text,
            notifications,
            is_ending: self.engine.is_ending(),
            quit,
        })
    }
}

/// Effects worth telling a text player about.
fn effect_line(effect: &Effect) -> Option<String> {
    match effect {
        Effect::EnergyChanged { new, delta, .. } => {
            Some(format!("Energi mental {delta:+} (sekarang {new})"))
        }
        Effect::EnergyOverridden { new, .. } => Some(format!("Energi mental menjadi {new}")),
        Effect::RelationshipChanged {
            character,
            new,
            delta,
            ..
        } => Some(format!("Hubungan dengan {character} {delta:+} (sekarang {new})")),
        Effect::KeepsakeCollected(keepsake) => {
            Some(format!("Kenang-kenangan ditemukan: {}", keepsake.name))
        }
        Effect::ChoiceLogged(_) | Effect::NodeEntered { .. } => None,
    }
}

/// The current scene: location, prose, objects and numbered choices.
pub fn render_node(engine: &Engine) -> String {
    let node = engine.current_node();
    let mut out = String::new();

    let _ = writeln!(out, "== {} ==", node.location);
    for paragraph in node.paragraphs() {
        let _ = writeln!(out, "\n{paragraph}");
    }

    if !node.interactable_objects.is_empty() {
        let names: Vec<&str> = node
            .interactable_objects
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        let _ = writeln!(out, "\nBenda: {}", names.join(", "));
    }

    if node.is_terminal() {
        let _ = write!(out, "\n-- TAMAT --\nKetik #new untuk bermain lagi.");
    } else {
        out.push('\n');
        for (i, choice) in node.choices.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, choice.text);
        }
        out.pop();
    }

    out
}

/// Meters and keepsake count on one line.
pub fn render_status(engine: &Engine) -> String {
    let relationships = engine
        .relationships()
        .iter()
        .map(|(character, value)| format!("{character} {value}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Energi mental: {} | {} | Kenang-kenangan: {}",
        engine.mental_energy(),
        relationships,
        engine.mementos().len()
    )
}

fn render_objects(engine: &Engine) -> String {
    let objects = &engine.current_node().interactable_objects;
    if objects.is_empty() {
        return "Tidak ada yang menarik di sini.".to_string();
    }

    objects
        .iter()
        .enumerate()
        .map(|(i, o)| format!("{}. {}", i + 1, o.name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_journal(engine: &Engine) -> String {
    let mut out = String::from("Jurnal\n");

    if engine.logbook_history().is_empty() {
        out.push_str("  (belum ada pilihan)\n");
    }
    for entry in engine.logbook_history() {
        let _ = writeln!(out, "  [{}] {}", entry.node_id, entry.choice);
    }

    out.push_str("\nKenang-kenangan\n");
    if engine.mementos().is_empty() {
        out.push_str("  (belum ada)");
    }
    let lines: Vec<String> = engine
        .mementos()
        .iter()
        .map(|k| format!("  {}: {}", k.name, k.description))
        .collect();
    out.push_str(&lines.join("\n"));

    out
}
