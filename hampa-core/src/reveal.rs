//! Typewriter reveal: text appended to a display buffer one step at a time.
//!
//! A step is one character, or one whole `<...>` markup tag. Reveals are
//! cancelled through a [`CancellationToken`] checked at every step, and the
//! check happens under the buffer lock, so once a token is cancelled its
//! reveal can never write again.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How a reveal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Every step was appended.
    Completed,
    /// The reveal was cancelled, skipped or superseded.
    Cancelled,
}

/// Split text into reveal steps: single characters or whole `<...>` tags.
///
/// A `<` with no closing `>` is an ordinary character.
pub fn segments(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let len = if c == '<' {
            rest.find('>').map(|end| end + 1).unwrap_or(1)
        } else {
            c.len_utf8()
        };
        let (segment, tail) = rest.split_at(len);
        out.push(segment);
        rest = tail;
    }

    out
}

/// Shared text a reveal writes into and a renderer reads from.
#[derive(Debug, Clone, Default)]
pub struct DisplayBuffer {
    text: Arc<Mutex<String>>,
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of the current text.
    pub fn text(&self) -> String {
        self.text.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.text.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.lock().is_empty()
    }

    pub fn clear(&self) {
        self.text.lock().clear();
    }

    /// Replace the whole text.
    pub fn set(&self, text: &str) {
        let mut guard = self.text.lock();
        guard.clear();
        guard.push_str(text);
    }

    /// Append `segment` unless `token` is cancelled. Returns whether it was appended.
    pub fn append_if_live(&self, segment: &str, token: &CancellationToken) -> bool {
        let mut guard = self.text.lock();
        if token.is_cancelled() {
            return false;
        }
        guard.push_str(segment);
        true
    }
}

/// Reveal `text` into `buffer`, waiting `delay` between steps.
///
/// Steps are appended strictly in source order. Cancellation is checked at
/// every step and interrupts the wait; it never raises an error.
pub async fn reveal(
    text: &str,
    delay: Duration,
    buffer: &DisplayBuffer,
    token: &CancellationToken,
) -> RevealOutcome {
    let mut steps = segments(text).into_iter().peekable();

    while let Some(segment) = steps.next() {
        if !buffer.append_if_live(segment, token) {
            return RevealOutcome::Cancelled;
        }

        if steps.peek().is_some() {
            tokio::select! {
                _ = token.cancelled() => return RevealOutcome::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    RevealOutcome::Completed
}

/// Handle to a spawned reveal.
#[derive(Debug)]
pub struct RevealHandle {
    token: CancellationToken,
    task: JoinHandle<RevealOutcome>,
}

impl RevealHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the reveal to end.
    pub async fn finished(self) -> RevealOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Reveal task failed");
                RevealOutcome::Cancelled
            }
        }
    }
}

#[derive(Debug)]
struct ActiveReveal {
    text: String,
    token: CancellationToken,
    done: Arc<AtomicBool>,
}

/// One display target with at most one reveal running.
#[derive(Debug, Default)]
pub struct Typewriter {
    buffer: DisplayBuffer,
    active: Option<ActiveReveal>,
}

impl Typewriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &DisplayBuffer {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Full text of the current or most recent reveal.
    pub fn target(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.text.as_str())
    }

    /// Start revealing `text`, cancelling any reveal already running.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(&mut self, text: impl Into<String>, delay: Duration) -> RevealHandle {
        self.cancel();
        self.buffer.clear();

        let text = text.into();
        let token = CancellationToken::new();
        let done = Arc::new(AtomicBool::new(false));

        let task = {
            let text = text.clone();
            let buffer = self.buffer.clone();
            let token = token.clone();
            let done = done.clone();
            tokio::spawn(async move {
                let outcome = reveal(&text, delay, &buffer, &token).await;
                done.store(true, Ordering::Release);
                outcome
            })
        };

        self.active = Some(ActiveReveal {
            text,
            token: token.clone(),
            done,
        });

        RevealHandle { token, task }
    }

    /// Finish the current reveal immediately, showing its whole text.
    pub fn skip(&mut self) {
        if let Some(active) = &self.active {
            active.token.cancel();
            self.buffer.set(&active.text);
            active.done.store(true, Ordering::Release);
        }
    }

    /// Stop the current reveal where it is.
    pub fn cancel(&mut self) {
        if let Some(active) = &self.active {
            active.token.cancel();
        }
    }

    /// Whether a reveal is still appending.
    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(|active| {
            !active.token.is_cancelled() && !active.done.load(Ordering::Acquire)
        })
    }
}

impl Drop for Typewriter {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const TICK: Duration = Duration::from_millis(10);

    #[test]
    fn test_segments_characters() {
        assert_eq!(segments("abc"), vec!["a", "b", "c"]);
        assert_eq!(segments("hé!"), vec!["h", "é", "!"]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn test_segments_keep_tags_whole() {
        assert_eq!(segments("a<b>c</b>"), vec!["a", "<b>", "c", "</b>"]);
        assert_eq!(segments("1 < 2"), vec!["1", " ", "<", " ", "2"]);
    }

    #[test]
    fn test_append_respects_token() {
        let buffer = DisplayBuffer::new();
        let token = CancellationToken::new();
        assert!(buffer.append_if_live("a", &token));
        token.cancel();
        assert!(!buffer.append_if_live("b", &token));
        assert_eq!(buffer.text(), "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_completes_in_order() {
        let buffer = DisplayBuffer::new();
        let token = CancellationToken::new();

        let outcome = reveal("Halo", TICK, &buffer, &token).await;

        assert_eq!(outcome, RevealOutcome::Completed);
        assert_eq!(buffer.text(), "Halo");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_appends_tag_atomically() {
        let buffer = DisplayBuffer::new();
        let token = CancellationToken::new();

        let task = {
            let buffer = buffer.clone();
            let token = token.clone();
            tokio::spawn(async move { reveal("<i>ab</i>", TICK, &buffer, &token).await })
        };

        sleep(Duration::from_millis(5)).await;
        assert_eq!(buffer.text(), "<i>");

        sleep(TICK).await;
        assert_eq!(buffer.text(), "<i>a");

        assert_eq!(task.await.unwrap(), RevealOutcome::Completed);
        assert_eq!(buffer.text(), "<i>ab</i>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_appending() {
        let mut typewriter = Typewriter::new();
        let handle = typewriter.start("Selamat pagi", TICK);

        sleep(Duration::from_millis(25)).await;
        typewriter.cancel();
        let shown = typewriter.text();

        assert_eq!(handle.finished().await, RevealOutcome::Cancelled);
        sleep(Duration::from_millis(200)).await;

        assert_eq!(typewriter.text(), shown);
        assert_eq!(shown, "Sel");
        assert!(!typewriter.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_fills_whole_text() {
        let mut typewriter = Typewriter::new();
        let handle = typewriter.start("Ibu sedang memasak.", TICK);

        sleep(Duration::from_millis(15)).await;
        assert!(typewriter.is_active());
        typewriter.skip();

        assert_eq!(typewriter.text(), "Ibu sedang memasak.");
        assert!(!typewriter.is_active());
        assert_eq!(handle.finished().await, RevealOutcome::Cancelled);
        assert_eq!(typewriter.text(), "Ibu sedang memasak.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_reveal_supersedes_old() {
        let mut typewriter = Typewriter::new();
        let first = typewriter.start("the first text is long", TICK);

        sleep(Duration::from_millis(25)).await;
        let second = typewriter.start("second", TICK);

        assert_eq!(first.finished().await, RevealOutcome::Cancelled);
        assert_eq!(second.finished().await, RevealOutcome::Completed);
        assert_eq!(typewriter.text(), "second");
        assert_eq!(typewriter.target(), Some("second"));
        assert!(!typewriter.is_active());
    }
}
