//! Application state for the Ruang Hampa TUI

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use hampa_core::assets::{
    spawn_validation, AssetValidator, ImageCheck, ImageRequests, PreloadReport,
};
use hampa_core::settings::Settings;
use hampa_core::{Engine, LoadError, Notification, Typewriter};
use tokio::sync::mpsc;

use crate::ui::theme::GameTheme;
use crate::ui::{FocusedPanel, Overlay};

/// How long a toast stays on screen.
const TOAST_LIFETIME: Duration = Duration::from_secs(4);
/// The intro is revealed at a fixed pace regardless of settings.
const INTRO_DELAY: Duration = Duration::from_millis(20);
/// Pause after the intro finishes before the story begins.
const INTRO_HOLD: Duration = Duration::from_millis(600);

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    MainMenu,
    Intro,
    Playing,
}

/// Main menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    NewGame,
    Continue,
    Quit,
}

impl MenuItem {
    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::NewGame => "Mulai Permainan Baru",
            MenuItem::Continue => "Lanjutkan Permainan",
            MenuItem::Quit => "Keluar",
        }
    }
}

/// State of the current scene image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneImage {
    None,
    Loading(String),
    Ready(PathBuf),
    Failed(String),
}

/// A transient message
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub is_error: bool,
    created: Instant,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
            created: Instant::now(),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created) >= TOAST_LIFETIME
    }
}

impl From<Notification> for Toast {
    fn from(notification: Notification) -> Self {
        Self {
            message: notification.message(),
            is_error: notification.is_error(),
            created: Instant::now(),
        }
    }
}

/// Main application state
pub struct App {
    /// The narrative engine
    pub engine: Engine,

    /// Typewriter for the story panel and intro
    typewriter: Typewriter,

    phase: Phase,
    overlay: Option<Overlay>,
    pub focused_panel: FocusedPanel,

    menu_selected: usize,
    selected_choice: usize,
    selected_object: usize,

    /// When the intro reveal was first seen finished
    intro_done_at: Option<Instant>,

    /// Typing speed being edited in the settings overlay
    pending_speed: u32,

    toasts: VecDeque<Toast>,
    status_message: Option<String>,

    validator: AssetValidator,
    image_requests: ImageRequests,
    image_tx: mpsc::UnboundedSender<ImageCheck>,
    image_rx: mpsc::UnboundedReceiver<ImageCheck>,
    preload_rx: Option<mpsc::UnboundedReceiver<PreloadReport>>,
    image: SceneImage,

    /// Color theme
    pub theme: GameTheme,

    /// Set when the player asked to quit
    pub should_quit: bool,
}

impl App {
    /// Create the app and start preloading images in the background.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(engine: Engine, validator: AssetValidator) -> Self {
        let (image_tx, image_rx) = mpsc::unbounded_channel();

        let (preload_tx, preload_rx) = mpsc::unbounded_channel();
        let preloader = validator.clone();
        tokio::spawn(async move {
            let report = preloader.preload_all().await;
            let _ = preload_tx.send(report);
        });

        let pending_speed = engine.typing_speed();

        Self {
            engine,
            typewriter: Typewriter::new(),
            phase: Phase::MainMenu,
            overlay: None,
            focused_panel: FocusedPanel::default(),
            menu_selected: 0,
            selected_choice: 0,
            selected_object: 0,
            intro_done_at: None,
            pending_speed,
            toasts: VecDeque::new(),
            status_message: None,
            validator,
            image_requests: ImageRequests::new(),
            image_tx,
            image_rx,
            preload_rx: Some(preload_rx),
            image: SceneImage::None,
            theme: GameTheme::default(),
            should_quit: false,
        }
    }

    // =========================================================================
    // Main menu
    // =========================================================================

    /// Menu entries; continuing is offered only when a save exists.
    pub fn menu_items(&self) -> Vec<MenuItem> {
        let mut items = vec![MenuItem::NewGame];
        if self.engine.has_saved_game() {
            items.push(MenuItem::Continue);
        }
        items.push(MenuItem::Quit);
        items
    }

    pub fn menu_selected(&self) -> usize {
        self.menu_selected
    }

    pub fn menu_move(&mut self, delta: isize) {
        let count = self.menu_items().len();
        self.menu_selected = step(self.menu_selected, delta, count);
    }

    pub fn menu_activate(&mut self) {
        let items = self.menu_items();
        match items.get(self.menu_selected) {
            Some(MenuItem::NewGame) => self.begin_new_game(),
            Some(MenuItem::Continue) => self.continue_game(),
            Some(MenuItem::Quit) => self.should_quit = true,
            None => {}
        }
    }

    /// Start a fresh game, showing the intro if it has not been seen.
    pub fn begin_new_game(&mut self) {
        // The fresh state clears the intro flag; a player who has seen it keeps it
        let seen_intro = self.engine.has_seen_intro();
        let mut saved = self.engine.start_new_game();
        if seen_intro {
            self.engine.mark_intro_as_seen();
            saved = saved.and_then(|()| self.engine.save_game());
        }
        if let Err(e) = saved {
            self.push_notification(Notification::SaveFailed {
                reason: e.to_string(),
            });
        }

        if seen_intro {
            self.show_current_node();
        } else {
            self.phase = Phase::Intro;
            self.intro_done_at = None;
            self.typewriter.start(self.engine.intro_text(), INTRO_DELAY);
        }
    }

    pub fn continue_game(&mut self) {
        match self.engine.load_game() {
            Ok(()) => {
                self.pending_speed = self.engine.typing_speed();
                self.show_current_node();
                self.push_notification(Notification::LoadSucceeded);
            }
            Err(e) => {
                if !matches!(e, LoadError::NotFound) {
                    tracing::warn!(error = %e, "Continue failed");
                }
                self.push_notification(Notification::LoadFailed {
                    reason: e.to_string(),
                });
            }
        }
    }

    // =========================================================================
    // Intro
    // =========================================================================

    /// Skip the intro reveal, or leave the intro once it is fully shown.
    pub fn advance_intro(&mut self) {
        if self.typewriter.is_active() {
            self.typewriter.skip();
        } else {
            self.finish_intro();
        }
    }

    fn finish_intro(&mut self) {
        self.engine.mark_intro_as_seen();
        if let Err(e) = self.engine.save_game() {
            self.push_notification(Notification::SaveFailed {
                reason: e.to_string(),
            });
        }
        self.show_current_node();
    }

    // =========================================================================
    // Playing
    // =========================================================================

    /// Reveal the current node and request its image.
    fn show_current_node(&mut self) {
        self.phase = Phase::Playing;
        self.selected_choice = 0;
        self.selected_object = 0;
        self.focused_panel = FocusedPanel::Choices;

        let node = self.engine.current_node();
        let text = node.paragraphs().join("\n\n");
        let image_key = node.image.clone();

        self.request_image(image_key);
        let delay = Settings::new(i64::from(self.engine.typing_speed())).reveal_delay();
        self.typewriter.start(text, delay);
    }

    /// Issue a new image request, superseding any in flight.
    fn request_image(&mut self, key: Option<String>) {
        let request_id = self.image_requests.issue();
        match key {
            Some(key) => {
                self.image = SceneImage::Loading(key.clone());
                spawn_validation(
                    self.validator.clone(),
                    request_id,
                    key,
                    self.image_tx.clone(),
                );
            }
            None => self.image = SceneImage::None,
        }
    }

    /// Pick the choice at `index` on the current node.
    pub fn choose(&mut self, index: usize) {
        let Some(choice) = self.engine.current_node().choices.get(index).cloned() else {
            return;
        };

        let outcome = self.engine.apply_choice(&choice);
        for notification in outcome.notifications {
            self.push_notification(notification);
        }
        self.show_current_node();
    }

    /// Examine the object at `index` in the current scene.
    pub fn interact(&mut self, index: usize) {
        let Some(object) = self
            .engine
            .current_node()
            .interactable_objects
            .get(index)
            .cloned()
        else {
            return;
        };

        let notification = self.engine.interact_with_object(&object);
        self.push_notification(notification);
    }

    /// Activate whatever is selected in the focused list.
    ///
    /// The first press while text is still appearing only completes it.
    pub fn activate(&mut self) {
        if self.typewriter.is_active() {
            self.typewriter.skip();
            return;
        }
        if self.engine.is_ending() {
            self.return_to_menu();
            return;
        }
        match self.focused_panel {
            FocusedPanel::Choices => self.choose(self.selected_choice),
            FocusedPanel::Objects => self.interact(self.selected_object),
        }
    }

    pub fn skip_reveal(&mut self) {
        self.typewriter.skip();
    }

    pub fn move_selection(&mut self, delta: isize) {
        let node = self.engine.current_node();
        match self.focused_panel {
            FocusedPanel::Choices => {
                self.selected_choice = step(self.selected_choice, delta, node.choices.len());
            }
            FocusedPanel::Objects => {
                self.selected_object =
                    step(self.selected_object, delta, node.interactable_objects.len());
            }
        }
    }

    /// Switch between the objects and choices lists.
    pub fn cycle_focus(&mut self) {
        let has_objects = !self.engine.current_node().interactable_objects.is_empty();
        self.focused_panel = match self.focused_panel {
            FocusedPanel::Choices if has_objects => FocusedPanel::Objects,
            _ => FocusedPanel::Choices,
        };
    }

    pub fn save(&mut self) {
        match self.engine.save_game() {
            Ok(()) => self.push_notification(Notification::SaveSucceeded),
            Err(e) => self.push_notification(Notification::SaveFailed {
                reason: e.to_string(),
            }),
        }
    }

    fn return_to_menu(&mut self) {
        self.typewriter.cancel();
        self.typewriter.buffer().clear();
        self.image_requests.issue();
        self.image = SceneImage::None;
        self.overlay = None;
        self.menu_selected = 0;
        self.phase = Phase::MainMenu;
    }

    // =========================================================================
    // Overlays
    // =========================================================================

    pub fn toggle_help(&mut self) {
        self.toggle_overlay(Overlay::Help);
    }

    pub fn toggle_journal(&mut self) {
        self.toggle_overlay(Overlay::Journal);
    }

    pub fn open_settings(&mut self) {
        self.pending_speed = self.engine.typing_speed();
        self.overlay = Some(Overlay::Settings);
    }

    fn toggle_overlay(&mut self, overlay: Overlay) {
        if self.overlay == Some(overlay) {
            self.overlay = None;
        } else {
            self.overlay = Some(overlay);
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = match self.overlay {
            Some(Overlay::ConfirmReset) => Some(Overlay::Settings),
            _ => None,
        };
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn adjust_pending_speed(&mut self, delta: i64) {
        self.pending_speed = Settings::new(i64::from(self.pending_speed) + delta).typing_speed;
    }

    /// Persist the speed chosen in the settings overlay.
    pub fn apply_settings(&mut self) {
        match self.engine.set_typing_speed(i64::from(self.pending_speed)) {
            Ok(_) => self.push_notification(Notification::SettingsSaved),
            Err(e) => self.push_notification(Notification::SaveFailed {
                reason: e.to_string(),
            }),
        }
        self.overlay = None;
    }

    pub fn request_reset(&mut self) {
        self.overlay = Some(Overlay::ConfirmReset);
    }

    /// Delete the saved game and go back to the main menu.
    pub fn confirm_reset(&mut self) {
        match self.engine.reset_game() {
            Ok(()) => self.push_toast(Toast::info("Permainan telah direset.")),
            Err(e) => self.push_notification(Notification::SaveFailed {
                reason: e.to_string(),
            }),
        }
        self.return_to_menu();
    }

    // =========================================================================
    // Toasts and status
    // =========================================================================

    pub fn push_notification(&mut self, notification: Notification) {
        tracing::info!(
            error = notification.is_error(),
            message = %notification.message(),
            "Notification"
        );
        self.push_toast(notification.into());
    }

    fn push_toast(&mut self, toast: Toast) {
        self.toasts.push_back(toast);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Drain background results and expire timed state.
    pub fn tick(&mut self) {
        while let Ok(check) = self.image_rx.try_recv() {
            let Some(check) = self.image_requests.accept(check) else {
                continue;
            };
            match check.path {
                Some(path) => self.image = SceneImage::Ready(path),
                None => {
                    self.image = SceneImage::Failed(check.key.clone());
                    self.push_notification(Notification::ImageFailed { key: check.key });
                }
            }
        }

        if let Some(rx) = &mut self.preload_rx {
            if let Ok(report) = rx.try_recv() {
                self.set_status(format!("Gambar: {}/{}", report.loaded, report.total));
                self.preload_rx = None;
            }
        }

        let now = Instant::now();
        while self.toasts.front().is_some_and(|t| t.is_expired(now)) {
            self.toasts.pop_front();
        }

        if self.phase == Phase::Intro && self.overlay.is_none() && !self.typewriter.is_active() {
            let done_at = *self.intro_done_at.get_or_insert(now);
            if now.duration_since(done_at) >= INTRO_HOLD {
                self.finish_intro();
            }
        }
    }

    // =========================================================================
    // Getters for private fields
    // =========================================================================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }

    pub fn revealed_text(&self) -> String {
        self.typewriter.text()
    }

    pub fn is_revealing(&self) -> bool {
        self.typewriter.is_active()
    }

    pub fn selected_choice(&self) -> usize {
        self.selected_choice
    }

    pub fn selected_object(&self) -> usize {
        self.selected_object
    }

    pub fn pending_speed(&self) -> u32 {
        self.pending_speed
    }

    pub fn toasts(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn image(&self) -> &SceneImage {
        &self.image
    }
}

/// Move `current` by `delta` within `0..count`, wrapping.
fn step(current: usize, delta: isize, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    (current as isize + delta).rem_euclid(count as isize) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use hampa_core::assets::AssetRegistry;
    use hampa_core::persist::{read_progression, MemoryStorage, StorageProvider};
    use hampa_core::testing::{sample_graph, FixedClock};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_app(storage: MemoryStorage, assets: &TempDir) -> App {
        let engine = Engine::new(Arc::new(sample_graph()), Arc::new(storage))
            .with_clock(FixedClock::default());
        let validator = AssetValidator::new(AssetRegistry::builtin(), assets.path());
        App::new(engine, validator)
    }

    #[test]
    fn test_step_wraps() {
        assert_eq!(step(0, -1, 3), 2);
        assert_eq!(step(2, 1, 3), 0);
        assert_eq!(step(1, 1, 3), 2);
        assert_eq!(step(5, 1, 0), 0);
    }

    #[tokio::test]
    async fn test_menu_offers_continue_only_with_save() {
        let assets = TempDir::new().expect("Failed to create temp directory");
        let storage = MemoryStorage::new();
        let app = test_app(storage.clone(), &assets);
        assert_eq!(app.menu_items(), vec![MenuItem::NewGame, MenuItem::Quit]);

        storage.insert_raw(hampa_core::persist::SAVE_KEY, "{}");
        assert_eq!(
            app.menu_items(),
            vec![MenuItem::NewGame, MenuItem::Continue, MenuItem::Quit]
        );
    }

    #[tokio::test]
    async fn test_new_game_shows_intro_then_story() {
        let assets = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(MemoryStorage::new(), &assets);

        app.begin_new_game();
        assert_eq!(app.phase(), Phase::Intro);

        app.advance_intro(); // completes the reveal
        assert_eq!(app.revealed_text(), hampa_core::INTRO_TEXT);
        app.advance_intro(); // leaves the intro
        assert_eq!(app.phase(), Phase::Playing);
        assert!(app.engine.has_seen_intro());
    }

    #[tokio::test]
    async fn test_second_new_game_skips_seen_intro() {
        let assets = TempDir::new().expect("Failed to create temp directory");
        let storage = MemoryStorage::new();
        let mut app = test_app(storage.clone(), &assets);
        app.begin_new_game();
        app.advance_intro();
        app.advance_intro();
        app.choose(1);
        app.return_to_menu();

        app.begin_new_game();
        assert_eq!(app.phase(), Phase::Playing);
        assert_eq!(app.engine.current_node_id(), "START");
        assert!(app.engine.has_seen_intro());

        let saved = read_progression(&storage, |_| true).expect("Failed to read save");
        assert!(saved.has_seen_intro);
        assert_eq!(saved.current_node_id, "START");
    }

    #[tokio::test]
    async fn test_choose_moves_and_toasts_keepsake() {
        let assets = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(MemoryStorage::new(), &assets);
        app.begin_new_game();
        app.advance_intro();
        app.advance_intro();

        app.choose(1);
        assert_eq!(app.engine.current_node_id(), "PHONE");
        assert!(app
            .toasts()
            .any(|t| t.message.contains("Pesan dari Surya") && !t.is_error));
    }

    #[tokio::test]
    async fn test_first_activate_only_skips_reveal() {
        let assets = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(MemoryStorage::new(), &assets);
        app.begin_new_game();
        app.advance_intro();
        app.advance_intro();
        assert!(app.is_revealing());

        app.activate();
        assert_eq!(app.engine.current_node_id(), "START");
        assert!(!app.is_revealing());

        app.activate();
        assert_eq!(app.engine.current_node_id(), "KITCHEN");
    }

    #[tokio::test]
    async fn test_settings_overlay_clamps_and_persists() {
        let assets = TempDir::new().expect("Failed to create temp directory");
        let storage = MemoryStorage::new();
        let mut app = test_app(storage.clone(), &assets);

        app.open_settings();
        app.adjust_pending_speed(500);
        assert_eq!(app.pending_speed(), 100);
        app.apply_settings();

        assert!(!app.has_overlay());
        assert_eq!(app.engine.typing_speed(), 100);
        assert!(storage.contains(hampa_core::persist::SETTINGS_KEY));
    }

    #[tokio::test]
    async fn test_reset_returns_to_menu_without_save() {
        let assets = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(MemoryStorage::new(), &assets);
        app.begin_new_game();
        assert!(app.engine.has_saved_game());

        app.open_settings();
        app.request_reset();
        assert_eq!(app.overlay(), Some(Overlay::ConfirmReset));
        app.confirm_reset();

        assert_eq!(app.phase(), Phase::MainMenu);
        assert!(!app.engine.has_saved_game());
        assert_eq!(app.menu_items(), vec![MenuItem::NewGame, MenuItem::Quit]);
    }

    #[tokio::test]
    async fn test_stale_image_check_is_dropped() {
        let assets = TempDir::new().expect("Failed to create temp directory");
        let mut app = test_app(MemoryStorage::new(), &assets);

        app.request_image(Some("BANYU_ROOM_MORNING".to_string()));
        let stale = app.image_requests.latest();
        app.request_image(None);

        app.image_tx
            .send(ImageCheck {
                request_id: stale,
                key: "BANYU_ROOM_MORNING".to_string(),
                path: None,
            })
            .expect("Receiver is alive");
        // Let the spawned validation finish too; it is also stale.
        tokio::task::yield_now().await;
        app.tick();

        assert_eq!(app.image(), &SceneImage::None);
        assert!(!app.toasts().any(|t| t.is_error));
    }
}
