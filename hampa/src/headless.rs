//! Headless mode for Ruang Hampa.
//!
//! A line-oriented interface for scripting and automated play. Story text goes
//! to stdout; logs go to stderr.

use anyhow::Result;
use hampa_core::headless::{GameResponse, HELP_TEXT};
use hampa_core::{EngineConfig, HeadlessGame};
use std::io::{self, BufRead, Write};

/// Run the game over stdin/stdout until `#quit` or end of input.
pub fn run_headless(config: &EngineConfig) -> Result<()> {
    let mut game = HeadlessGame::from_config(config)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    writeln!(stdout, "=== Ruang Hampa (headless) ===")?;
    writeln!(stdout, "Ketik #help untuk daftar perintah.")?;
    writeln!(stdout)?;

    let opening = game.begin();
    print_response(&mut stdout, &opening)?;

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "Error reading input");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match game.send(line) {
            Ok(response) => {
                print_response(&mut stdout, &response)?;
                if response.quit {
                    break;
                }
            }
            Err(e) => {
                writeln!(stdout, "[ERROR] {e}")?;
                if line.starts_with('#') {
                    writeln!(stdout, "{HELP_TEXT}")?;
                }
                writeln!(stdout)?;
            }
        }
        stdout.flush()?;
    }

    tracing::info!(turns = game.transcript().len(), "Headless session ended");
    Ok(())
}

fn print_response(out: &mut impl Write, response: &GameResponse) -> io::Result<()> {
    for notification in &response.notifications {
        let tag = if notification.is_error() {
            "ERROR"
        } else {
            "INFO"
        };
        writeln!(out, "[{tag}] {}", notification.message())?;
    }
    if !response.text.is_empty() {
        writeln!(out, "{}", response.text)?;
    }
    writeln!(out)?;
    out.flush()
}
