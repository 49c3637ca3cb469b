use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::event::Event;
use log::{error, info};

use crate::audio::AudioManager;
use crate::config::GameConfig;
use crate::rendering::{draw_session, GameGrid, OutputTarget};
use crate::session::{GameState, Session};
use crate::terminal_io::{translate, InputAction, InputSource, KeyStates};

pub struct Game {
    pub stdout_target: OutputTarget,
    config: GameConfig,
    session: Session,
    audio: AudioManager,
    game_grid: GameGrid,
    input: InputSource,
    key_states: KeyStates,
    frame_count: u64,
}

impl Game {
    pub fn new(
        config: GameConfig,
        terminal_width: u16,
        terminal_height: u16,
        stdout_target: OutputTarget,
        input: InputSource,
    ) -> Self {
        Game {
            session: Session::new(&config),
            audio: AudioManager::new(config.muted),
            game_grid: GameGrid::new(terminal_width, terminal_height, config.width, config.height),
            stdout_target,
            config,
            input,
            key_states: KeyStates::default(),
            frame_count: 0,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[cfg(test)]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Runs until quit or until the frame limit is reached.
    pub fn run(&mut self) -> io::Result<()> {
        let tick_period = Duration::from_secs_f64(1.0 / self.config.tick_rate.max(1) as f64);
        let mut next_tick = Instant::now() + tick_period;
        let mut running = true;

        self.game_grid.clear_screen_manual(&mut self.stdout_target)?;
        self.render()?;

        while running && self.config.max_frames.is_none_or(|max| self.frame_count < max) {
            // Sleep in the event wait until input arrives or the next deadline is due
            let deadline = match self.session.next_deadline() {
                Some(timer) => timer.min(next_tick),
                None => next_tick,
            };
            let timeout = deadline.saturating_duration_since(Instant::now());
            if let Some(event) = self.input.next_event(timeout, self.frame_count)? {
                running = self.handle_event(event, Instant::now())?;
            }

            let now = Instant::now();
            self.session.poll_timers(&mut self.audio, now);

            if now >= next_tick {
                self.on_tick(now)?;
                next_tick += tick_period;
                if next_tick < now {
                    // Fell behind; drop the missed ticks rather than bursting through them
                    next_tick = now + tick_period;
                }
            }
        }

        info!(
            "Game loop ended after {} frames. State: {:?}, score: {}, last sound: {:?}",
            self.frame_count, self.session.state, self.session.score, self.audio.last_effect()
        );
        Ok(())
    }

    /// Returns false when the player asked to quit.
    fn handle_event(&mut self, event: Event, now: Instant) -> io::Result<bool> {
        match translate(event) {
            InputAction::Quit => {
                info!("Quit requested. Exiting game loop.");
                return Ok(false);
            }
            InputAction::Confirm => {
                if self.session.handle_confirm(&mut self.audio, now) {
                    self.key_states = KeyStates::default();
                }
            }
            InputAction::ToggleMute => {
                let muted = !self.audio.is_muted();
                self.audio.set_muted(muted);
            }
            InputAction::Key(key_event) => self.key_states.handle(&key_event, now),
            InputAction::Resize(width, height) => {
                self.game_grid.resize(width, height);
                self.game_grid.clear_screen_manual(&mut self.stdout_target)?;
                info!("Terminal resized to {}x{}", width, height);
            }
            InputAction::Ignore => {}
        }
        Ok(true)
    }

    fn on_tick(&mut self, now: Instant) -> io::Result<()> {
        if self.session.state != GameState::Welcome {
            let input = self.key_states.sample(now);
            self.session.tick(&input, &mut self.audio, now);
        }
        self.render()?;
        self.frame_count += 1;
        Ok(())
    }

    fn render(&mut self) -> io::Result<()> {
        draw_session(&mut self.game_grid, &self.session);
        self.game_grid
            .render(&mut self.stdout_target)
            .map_err(|e| { error!("Failed to render game grid: {}", e); e })?;

        if let OutputTarget::ScreenBuffer(sb) = &self.stdout_target {
            // Once a second is plenty for the log
            if self.frame_count % self.config.tick_rate.max(1) as u64 == 0 {
                sb.print_to_log();
            }
        }

        self.stdout_target
            .flush()
            .map_err(|e| { error!("Failed to flush stdout after rendering: {}", e); e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::ScreenBuffer;
    use crate::terminal_io::SimulatedInput;
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
    use std::collections::HashMap;

    fn simulated_game(events: HashMap<u64, Vec<Event>>, frames: u64) -> Game {
        let config = GameConfig {
            seed: Some(5),
            debug: true,
            max_frames: Some(frames),
            muted: true,
            tick_rate: 200,
            ..GameConfig::default()
        };
        Game::new(
            config,
            40,
            12,
            OutputTarget::ScreenBuffer(ScreenBuffer::new(40, 12)),
            InputSource::Simulated(SimulatedInput::new(events)),
        )
    }

    #[test]
    fn test_welcome_until_confirm() {
        let mut game = simulated_game(HashMap::new(), 3);
        game.run().unwrap();
        assert_eq!(game.frame_count(), 3);
        assert_eq!(game.session().state, GameState::Welcome);
    }

    #[test]
    fn test_confirm_and_fire() {
        let mut events = HashMap::new();
        events.insert(0, vec![Event::Key(KeyCode::Enter.into())]);
        events.insert(
            1,
            vec![Event::Key(KeyEvent::new_with_kind(KeyCode::Char(' '), KeyModifiers::NONE, KeyEventKind::Press))],
        );
        let mut game = simulated_game(events, 2);
        game.run().unwrap();

        assert_eq!(game.session().state, GameState::Playing);
        // Fresh rocks spawn well clear of the nose, so the missile is still in flight
        assert_eq!(game.session().ship.active_missiles.len(), 1);
        assert_eq!(game.session().score, 0);
    }

    #[test]
    fn test_quit_stops_loop() {
        let mut events = HashMap::new();
        events.insert(1, vec![Event::Key(KeyCode::Char('q').into())]);
        let mut game = simulated_game(events, 50);
        game.run().unwrap();
        assert_eq!(game.frame_count(), 1);
    }

    #[test]
    fn test_mute_key_toggles_audio() {
        let mut events = HashMap::new();
        events.insert(0, vec![Event::Key(KeyCode::Char('m').into())]);
        events.insert(2, vec![Event::Key(KeyCode::Char('m').into())]);
        let mut game = simulated_game(events, 2);
        assert!(game.audio.is_muted());
        game.run().unwrap();
        // Only the first toggle is reached within two frames
        assert!(!game.audio.is_muted());
    }
}
