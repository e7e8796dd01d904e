/// Keyboard state and the key → FrameInput mapping.
///
/// Held keys drive walking; fresh presses become one-shot `Command`s.
///
///   Arrows / hjkl   →  walk (held)
///   a               →  toggle info overlay
///   Esc             →  pause
///   f               →  fullscreen (hide HUD)
///   q               →  quit
///   0-3             →  jump to scene
///
/// Terminals that report key release (keyboard enhancement) release keys
/// immediately; others expire a key after `HOLD_TIMEOUT` without repeats.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::entity::{Command, DirSet, FrameInput};
use super::gamepad::GamepadState;

/// Without release events, a key counts as held this long after its last
/// press or repeat.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const DOWN_KEYS: [KeyCode; 2] = [KeyCode::Down, KeyCode::Char('j')];
const UP_KEYS: [KeyCode; 2] = [KeyCode::Up, KeyCode::Char('k')];
const LEFT_KEYS: [KeyCode; 2] = [KeyCode::Left, KeyCode::Char('h')];
const RIGHT_KEYS: [KeyCode; 2] = [KeyCode::Right, KeyCode::Char('l')];

pub struct InputState {
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    pub raw_events: Vec<KeyEvent>,
    /// Set once keyboard enhancement is confirmed.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain pending terminal events without blocking. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    /// Merge keyboard and gamepad into this frame's input.
    pub fn frame_input(&self, gp: &GamepadState) -> FrameInput {
        let dirs = DirSet {
            down: self.any_held(&DOWN_KEYS) || gp.down_held(),
            up: self.any_held(&UP_KEYS) || gp.up_held(),
            left: self.any_held(&LEFT_KEYS) || gp.left_held(),
            right: self.any_held(&RIGHT_KEYS) || gp.right_held(),
        };

        let mut commands: Vec<Command> = self.fresh_presses.iter()
            .filter_map(|&code| command_for(code))
            .collect();
        if gp.action_pressed() { commands.push(Command::Action); }
        if gp.pause_pressed() { commands.push(Command::Pause); }
        if gp.quit_pressed() { commands.push(Command::Quit); }

        FrameInput { dirs, commands }
    }
}

/// One-shot command bound to a key, if any.
pub fn command_for(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Esc => Some(Command::Pause),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(Command::Action),
        KeyCode::Char('f') | KeyCode::Char('F') => Some(Command::ToggleFullscreen),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
        KeyCode::Char(c @ '0'..='3') => Some(Command::SelectScene(c as u8 - b'0')),
        _ => None,
    }
}
