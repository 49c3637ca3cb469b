use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use log::{error, info};

use crate::constants::KEY_HOLD_WINDOW_MS;
use crate::session::TickInput;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameKey {
    TurnLeft,
    TurnRight,
    Thrust,
    Fire,
}

impl GameKey {
    pub fn from_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Left | KeyCode::Char('a') => Some(GameKey::TurnLeft),
            KeyCode::Right | KeyCode::Char('d') => Some(GameKey::TurnRight),
            KeyCode::Up | KeyCode::Char('w') => Some(GameKey::Thrust),
            KeyCode::Char(' ') => Some(GameKey::Fire),
            _ => None,
        }
    }
}

/// What the loop should do with a raw terminal event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputAction {
    Quit,
    Confirm,
    ToggleMute,
    Key(KeyEvent),
    Resize(u16, u16),
    Ignore,
}

pub fn translate(event: Event) -> InputAction {
    match event {
        Event::Key(key_event) => {
            let pressed = key_event.kind == KeyEventKind::Press;
            match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc if pressed => InputAction::Quit,
                KeyCode::Char('c') if pressed && key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                    InputAction::Quit
                }
                KeyCode::Enter if pressed => InputAction::Confirm,
                KeyCode::Char('m') if pressed => InputAction::ToggleMute,
                _ => InputAction::Key(key_event),
            }
        }
        Event::Mouse(mouse_event) => match mouse_event.kind {
            MouseEventKind::Down(_) => InputAction::Confirm,
            _ => InputAction::Ignore,
        },
        Event::Resize(width, height) => InputAction::Resize(width, height),
        _ => InputAction::Ignore,
    }
}

/// Turns terminal key events into held/not-held key states.
///
/// Terminals with the keyboard enhancement protocol report releases, so a key
/// stays held until released. Others only send presses and auto-repeats, so a
/// key counts as held for a short window after the last one.
pub struct KeyStates {
    last_pressed: HashMap<GameKey, Instant>,
    reports_release: bool,
    hold_window: Duration,
}

impl Default for KeyStates {
    fn default() -> Self {
        Self::new(Duration::from_millis(KEY_HOLD_WINDOW_MS))
    }
}

impl KeyStates {
    pub fn new(hold_window: Duration) -> Self {
        KeyStates { last_pressed: HashMap::new(), reports_release: false, hold_window }
    }

    pub fn handle(&mut self, key_event: &KeyEvent, now: Instant) {
        let Some(key) = GameKey::from_code(key_event.code) else {
            return;
        };
        match key_event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                self.last_pressed.insert(key, now);
            }
            KeyEventKind::Release => {
                if !self.reports_release {
                    info!("Terminal reports key releases");
                }
                self.reports_release = true;
                self.last_pressed.remove(&key);
            }
        }
    }

    pub fn is_held(&self, key: GameKey, now: Instant) -> bool {
        match self.last_pressed.get(&key) {
            Some(_) if self.reports_release => true,
            Some(pressed_at) => now.duration_since(*pressed_at) <= self.hold_window,
            None => false,
        }
    }

    pub fn sample(&self, now: Instant) -> TickInput {
        TickInput {
            turn_left: self.is_held(GameKey::TurnLeft, now),
            turn_right: self.is_held(GameKey::TurnRight, now),
            thrust: self.is_held(GameKey::Thrust, now),
            fire: self.is_held(GameKey::Fire, now),
        }
    }
}

// --- SimulatedInput for debugging ---
pub struct SimulatedInput {
    events: HashMap<u64, Vec<Event>>,
}

impl SimulatedInput {
    pub fn new(events: HashMap<u64, Vec<Event>>) -> Self {
        SimulatedInput { events }
    }

    /// A short scripted session: start, thrust, turn, shoot, quit.
    pub fn demo_script() -> Self {
        let press = |code: KeyCode| Event::Key(KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press));
        let release = |code: KeyCode| Event::Key(KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release));

        let mut events: HashMap<u64, Vec<Event>> = HashMap::new();
        events.insert(1, vec![press(KeyCode::Enter)]);
        events.insert(3, vec![press(KeyCode::Up)]);
        events.insert(8, vec![press(KeyCode::Char(' '))]);
        events.insert(12, vec![press(KeyCode::Left)]);
        events.insert(18, vec![release(KeyCode::Left), release(KeyCode::Char(' '))]);
        events.insert(25, vec![release(KeyCode::Up), press(KeyCode::Right)]);
        events.insert(34, vec![release(KeyCode::Right), press(KeyCode::Char(' '))]);
        events.insert(40, vec![release(KeyCode::Char(' '))]);
        events.insert(120, vec![press(KeyCode::Char('q'))]); // Quit after 120 frames
        SimulatedInput::new(events)
    }

    pub fn next_event(&mut self, frame_count: u64) -> Option<Event> {
        let queued = self.events.get_mut(&frame_count)?;
        let event = if queued.is_empty() { None } else { Some(queued.remove(0)) };
        if queued.is_empty() {
            self.events.remove(&frame_count);
        }
        event
    }
}

pub enum InputSource {
    Terminal,
    Simulated(SimulatedInput),
}

impl InputSource {
    /// Waits up to `timeout` for the next event.
    pub fn next_event(&mut self, timeout: Duration, frame_count: u64) -> io::Result<Option<Event>> {
        match self {
            InputSource::Terminal => {
                if event::poll(timeout).map_err(|e| { error!("Failed to poll event: {}", e); e })? {
                    Ok(Some(event::read().map_err(|e| { error!("Failed to read event: {}", e); e })?))
                } else {
                    Ok(None)
                }
            }
            InputSource::Simulated(sim_input) => match sim_input.next_event(frame_count) {
                Some(event) => Ok(Some(event)),
                None => {
                    std::thread::sleep(timeout);
                    Ok(None)
                }
            },
        }
    }
}
