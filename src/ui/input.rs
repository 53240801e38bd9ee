/// Keyboard input collector.
///
/// Every frame drains crossterm's event queue and sorts it into:
///   - fresh presses, for one-shot commands (Enter, Esc, F-keys)
///   - typed characters, in order, for the answer box and dialog prompts
///
/// Repeats count as typing but never as a fresh press, so holding Enter
/// cannot skip through a chain of alerts.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub struct InputState {
    /// Keys whose Press event arrived during the last `drain_events()`.
    fresh_presses: Vec<KeyCode>,

    /// Printable characters typed during the last drain, oldest first.
    typed: Vec<char>,

    /// Raw key events collected during drain, for modifier checks.
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            fresh_presses: Vec::with_capacity(8),
            typed: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key);
            }
        }
    }

    fn clear(&mut self) {
        self.fresh_presses.clear();
        self.typed.clear();
        self.raw_events.clear();
    }

    fn record(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        if key.kind == KeyEventKind::Release {
            return;
        }
        if key.kind == KeyEventKind::Press {
            self.fresh_presses.push(key.code);
        }
        if let KeyCode::Char(c) = key.code {
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
                self.typed.push(c);
            }
        }
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
