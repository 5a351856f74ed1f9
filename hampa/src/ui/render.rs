//! Render orchestration for the Ruang Hampa TUI

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Phase, Toast};
use crate::ui::layout::{centered_rect_fixed, AppLayout};
use crate::ui::widgets::narrative::strip_markup;
use crate::ui::widgets::{
    ChoiceListWidget, HotkeyBarWidget, NarrativeWidget, SidePanelWidget, ToastWidget,
};

/// Which list receives selection keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusedPanel {
    #[default]
    Choices,
    Objects,
}

/// Overlay types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Help,
    Journal,
    Settings,
    ConfirmReset,
}

const TOAST_WIDTH: u16 = 40;

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    match app.phase() {
        Phase::MainMenu => render_main_menu(frame, app, area),
        Phase::Intro => render_intro(frame, app, area),
        Phase::Playing => render_game(frame, app, area),
    }

    if let Some(overlay) = app.overlay() {
        render_overlay(frame, app, overlay, area);
    }

    if app.phase() != Phase::Playing {
        let width = TOAST_WIDTH.min(area.width);
        let toast_area = Rect {
            x: area.x + area.width - width,
            y: area.y,
            width,
            height: area.height,
        };
        render_toasts(frame, app, toast_area);
    }
}

fn render_toasts(frame: &mut Frame, app: &App, area: Rect) {
    let toasts: Vec<&Toast> = app.toasts().collect();
    frame.render_widget(ToastWidget::new(&toasts, &app.theme), area);
}

/// Render the title screen
fn render_main_menu(frame: &mut Frame, app: &App, area: Rect) {
    let items = app.menu_items();
    let height = items.len() as u16 + 8;
    let popup_area = centered_rect_fixed(60, height, area);

    let mut lines = vec![
        Line::from(Span::styled("RUANG HAMPA", app.theme.location_style())),
        Line::from(Span::styled(
            "Sebuah simulasi naratif tentang depresi dan dinamika keluarga",
            app.theme.system_style(),
        )),
        Line::from(""),
    ];
    for (i, item) in items.iter().enumerate() {
        let selected = i == app.menu_selected();
        let marker = if selected { "> " } else { "  " };
        lines.push(Line::from(Span::styled(
            format!("{marker}{}", item.label()),
            app.theme.item_style(selected),
        )));
    }

    let menu = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.border_style(true)),
        );
    frame.render_widget(menu, popup_area);

    render_hotkeys(
        frame,
        app,
        bottom_line(area),
        &[("↑/↓", "pilih"), ("Enter", "mulai"), ("q", "keluar")],
    );
}

/// Render the intro reveal
fn render_intro(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(70, 12, area);
    let text = strip_markup(&app.revealed_text());

    let intro = Paragraph::new(Span::styled(text, app.theme.story_style()))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(intro, popup_area);

    render_hotkeys(frame, app, bottom_line(area), &[("Enter", "lanjut")]);
}

/// Render the scene: story, lists, side panel and hotkeys
fn render_game(frame: &mut Frame, app: &App, area: Rect) {
    let engine = &app.engine;
    let node = engine.current_node();
    let layout = AppLayout::calculate(area, node.interactable_objects.len(), node.choices.len());

    // Title bar
    let title = Line::from(vec![
        Span::styled(" RUANG HAMPA ", app.theme.title_style()),
        Span::styled(format!("| {}", node.location), app.theme.system_style()),
    ]);
    frame.render_widget(Paragraph::new(title), layout.title_area);

    // Story panel
    let revealed = app.revealed_text();
    let narrative = NarrativeWidget::new(&revealed, &node.location, &app.theme)
        .revealing(app.is_revealing());
    frame.render_widget(narrative, layout.story_area);

    // Objects
    if let Some(objects_area) = layout.objects_area {
        let names = node
            .interactable_objects
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        let objects = ChoiceListWidget::new("Lihat Sekitar", names, &app.theme)
            .selected(app.selected_object())
            .focused(app.focused_panel == FocusedPanel::Objects);
        frame.render_widget(objects, objects_area);
    }

    // Choices, or the ending prompt
    if engine.is_ending() {
        let ending = Paragraph::new(vec![Line::from(Span::styled(
            "TAMAT. Tekan Enter untuk kembali ke menu utama.",
            app.theme.location_style(),
        ))])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.border_style(true)),
        );
        frame.render_widget(ending, layout.choices_area);
    } else {
        let texts = node.choices.iter().map(|c| c.text.as_str()).collect();
        let choices = ChoiceListWidget::new("Pilihan", texts, &app.theme)
            .numbered(true)
            .selected(app.selected_choice())
            .focused(app.focused_panel == FocusedPanel::Choices);
        frame.render_widget(choices, layout.choices_area);
    }

    // Side panel
    let side = SidePanelWidget::new(
        engine.mental_energy(),
        engine.relationships(),
        engine.mementos(),
        app.image(),
        &app.theme,
    );
    frame.render_widget(side, layout.sidebar_area);

    render_toasts(frame, app, layout.toast_area);

    render_hotkeys(
        frame,
        app,
        layout.hotkey_bar,
        &[
            ("1-9", "pilih"),
            ("Tab", "fokus"),
            ("Spasi", "lewati"),
            ("l", "jurnal"),
            ("s", "pengaturan"),
            ("?", "bantuan"),
            ("q", "keluar"),
        ],
    );
}

fn render_hotkeys(frame: &mut Frame, app: &App, area: Rect, hotkeys: &[(&str, &str)]) {
    let bar = HotkeyBarWidget::new(hotkeys, &app.theme).status(app.status_message());
    frame.render_widget(bar, area);
}

fn bottom_line(area: Rect) -> Rect {
    Rect {
        y: area.y + area.height.saturating_sub(1),
        height: area.height.min(1),
        ..area
    }
}

// =============================================================================
// Overlays
// =============================================================================

fn render_overlay(frame: &mut Frame, app: &App, overlay: Overlay, area: Rect) {
    match overlay {
        Overlay::Help => render_help_overlay(frame, app, area),
        Overlay::Journal => render_journal_overlay(frame, app, area),
        Overlay::Settings => render_settings_overlay(frame, app, area),
        Overlay::ConfirmReset => render_confirm_reset_overlay(frame, app, area),
    }
}

fn overlay_block<'a>(title: &'a str, app: &App) -> Block<'a> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true))
}

fn heading(text: &str) -> Line<'_> {
    Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::UNDERLINED),
    ))
}

fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(52, 18, area);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        heading("Cerita:"),
        Line::from("  1-9           Pilih pilihan bernomor"),
        Line::from("  ↑/↓ atau j/k  Pindah pilihan"),
        Line::from("  Tab           Pindah antara benda dan pilihan"),
        Line::from("  Enter         Pilih, atau tampilkan seluruh teks"),
        Line::from("  Spasi         Tampilkan seluruh teks"),
        Line::from(""),
        heading("Lainnya:"),
        Line::from("  l             Jurnal"),
        Line::from("  s             Pengaturan"),
        Line::from("  w             Simpan permainan"),
        Line::from("  ?             Bantuan ini"),
        Line::from("  q / Ctrl+C    Keluar"),
        Line::from(""),
        Line::from(Span::styled("Tekan Esc untuk menutup", app.theme.system_style())),
    ];

    let help = Paragraph::new(help_text).block(overlay_block("Bantuan", app));
    frame.render_widget(help, popup_area);
}

fn render_journal_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(70, 24, area);
    frame.render_widget(Clear, popup_area);

    let engine = &app.engine;
    let mut lines = vec![heading("Kenang-kenangan")];
    if engine.mementos().is_empty() {
        lines.push(Line::from(Span::styled(
            "  Belum ada kenang-kenangan.",
            app.theme.system_style(),
        )));
    }
    for keepsake in engine.mementos() {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}", keepsake.name), app.theme.keepsake_style()),
            Span::raw(format!(": {}", keepsake.description)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(heading("Catatan Pilihan"));
    if engine.logbook_history().is_empty() {
        lines.push(Line::from(Span::styled(
            "  Belum ada pilihan.",
            app.theme.system_style(),
        )));
    }
    // Newest first.
    for entry in engine.logbook_history().iter().rev() {
        let time = entry.timestamp.get(11..16).unwrap_or(&entry.timestamp);
        lines.push(Line::from(vec![
            Span::styled(format!("  {time} "), app.theme.system_style()),
            Span::raw(entry.choice.as_str()),
        ]));
    }

    let journal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(overlay_block("Jurnal", app));
    frame.render_widget(journal, popup_area);
}

fn render_settings_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(50, 10, area);
    frame.render_widget(Clear, popup_area);

    let lines = vec![
        heading("Kecepatan ketik"),
        Line::from(vec![
            Span::raw("  < "),
            Span::styled(
                format!("{} ms per huruf", app.pending_speed()),
                app.theme.item_style(true),
            ),
            Span::raw(" >"),
        ]),
        Line::from(Span::styled(
            "  Angka lebih besar berarti lebih lambat.",
            app.theme.system_style(),
        )),
        Line::from(""),
        Line::from("  ←/→ ubah   Enter simpan   r mulai ulang"),
        Line::from(Span::styled("  Esc tutup", app.theme.system_style())),
    ];

    let settings = Paragraph::new(lines).block(overlay_block("Pengaturan", app));
    frame.render_widget(settings, popup_area);
}

fn render_confirm_reset_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(50, 8, area);
    frame.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from("Apakah Anda yakin ingin memulai lagi?"),
        Line::from("Semua progres yang tersimpan akan dihapus secara permanen."),
        Line::from(""),
        Line::from(Span::styled("y ya   n batal", app.theme.title_style())),
    ];

    let confirm = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(overlay_block("Mulai Ulang", app).border_style(app.theme.toast_style(true)));
    frame.render_widget(confirm, popup_area);
}
