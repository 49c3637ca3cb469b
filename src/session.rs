//! Game session and its state machine.
//!
//! A `Session` owns every entity in play together with the score, the lives
//! and the timers that drive delayed transitions. All time-dependent methods
//! take `now` explicitly; the event loop is the only place that reads the clock.

use std::time::{Duration, Instant};

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio::{AudioManager, SoundEffect};
use crate::config::GameConfig;
use crate::constants::*;
use crate::entities::{Rock, RockSize, Ship};
use crate::physics;
use crate::types::Vector2D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Title screen, nothing simulated
    Welcome,
    /// Game over screen has finished, waiting for confirm to start over
    Starting,
    Playing,
    /// Ship destroyed, waiting for the death sound to finish
    Dying,
    GameOver,
}

/// Logical inputs sampled once per tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub turn_left: bool,
    pub turn_right: bool,
    pub thrust: bool,
    pub fire: bool,
}

/// Deadline that fires once and then disarms itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OneShotTimer {
    fires_at: Option<Instant>,
}

impl OneShotTimer {
    pub fn arm(&mut self, fires_at: Instant) {
        self.fires_at = Some(fires_at);
    }

    pub fn disarm(&mut self) {
        self.fires_at = None;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.fires_at.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.fires_at
    }

    /// Returns true exactly once when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.fires_at {
            Some(deadline) if now >= deadline => {
                self.disarm();
                true
            }
            _ => false,
        }
    }
}

pub struct Session {
    pub state: GameState,
    pub score: u32,
    pub lives: u32,
    pub ship: Ship,
    pub rocks: Vec<Rock>,
    pub min_rock_distance: f64,
    /// Playing ticks since the last escalation
    pub counter: u64,
    pub start_timer: OneShotTimer,
    pub restart_timer: OneShotTimer,
    last_fire: Option<Instant>,
    width: f64,
    height: f64,
    escalation_interval: u64,
    rng: StdRng,
}

impl Session {
    pub fn new(config: &GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Session {
            state: GameState::Welcome,
            score: 0,
            lives: INITIAL_LIVES,
            ship: Ship::new(config.width / 2.0, config.height / 2.0),
            rocks: Vec::new(),
            min_rock_distance: INITIAL_MIN_ROCK_DISTANCE,
            counter: 0,
            start_timer: OneShotTimer::default(),
            restart_timer: OneShotTimer::default(),
            last_fire: None,
            width: config.width,
            height: config.height,
            escalation_interval: config.escalation_interval(),
            rng,
        }
    }

    pub fn center(&self) -> Vector2D {
        Vector2D::new(self.width / 2.0, self.height / 2.0)
    }

    /// Radius of the circle circumscribing the screen
    pub fn bounds_radius(&self) -> f64 {
        ((self.width / 2.0).powi(2) + (self.height / 2.0).powi(2)).sqrt()
    }

    pub fn escalation_interval(&self) -> u64 {
        self.escalation_interval
    }

    /// Full reset: fresh ship, score, lives and rocks.
    pub fn do_init(&mut self, audio: &mut AudioManager, now: Instant) {
        self.rocks.clear();
        self.min_rock_distance = INITIAL_MIN_ROCK_DISTANCE;
        self.start(audio);
        self.spawn_initial_rocks();
        self.lives = INITIAL_LIVES;
        self.score = 0;
        self.counter = 0;
        self.last_fire = None;
        self.start_timer.disarm();
        self.restart_timer.disarm();
        info!("New game started at {:?}", now);
    }

    /// Puts a fresh ship in the middle of the screen and resumes play.
    fn start(&mut self, audio: &mut AudioManager) {
        self.ship = Ship::new(self.width / 2.0, self.height / 2.0);
        audio.play_music();
        self.state = GameState::Playing;
    }

    fn spawn_initial_rocks(&mut self) {
        for _ in 0..INITIAL_ROCKS {
            self.make_rock(RockSize::Big, None);
        }
    }

    /// Adds a rock, at `position` or at a random spot away from the ship.
    pub fn make_rock(&mut self, size: RockSize, position: Option<Vector2D>) {
        let rock = self.new_rock(size, position);
        self.rocks.push(rock);
    }

    pub(crate) fn new_rock(&mut self, size: RockSize, position: Option<Vector2D>) -> Rock {
        let position = match position {
            Some(position) => position,
            None => self.random_rock_position(),
        };
        Rock::new(position, size, &mut self.rng)
    }

    fn random_rock_position(&mut self) -> Vector2D {
        let width = self.width as i64;
        let height = self.height as i64;
        let (x_range, y_range) = if width > 2 * SPAWN_MARGIN && height > 2 * SPAWN_MARGIN {
            (SPAWN_MARGIN..=width - SPAWN_MARGIN, SPAWN_MARGIN..=height - SPAWN_MARGIN)
        } else {
            (0..=width, 0..=height)
        };

        let mut position = Vector2D::new(
            self.rng.gen_range(x_range) as f64,
            self.rng.gen_range(y_range) as f64,
        );

        let mut attempts = 0;
        while position.distance(self.ship.position) < self.min_rock_distance {
            if attempts == SPAWN_MAX_ATTEMPTS {
                warn!(
                    "No spawn point {} away from the ship after {} attempts, using ({}, {})",
                    self.min_rock_distance, attempts, position.x, position.y
                );
                break;
            }
            position = Vector2D::new(
                self.rng.gen_range(0..=width) as f64,
                self.rng.gen_range(0..=height) as f64,
            );
            attempts += 1;
        }
        position
    }

    /// Fires if the cooldown has elapsed. Returns whether a missile left the ship.
    pub fn try_fire(&mut self, audio: &mut AudioManager, now: Instant) -> bool {
        let cooldown = Duration::from_secs_f64(FIRE_COOLDOWN_SECS);
        if let Some(last) = self.last_fire {
            if now.duration_since(last) < cooldown {
                return false;
            }
        }
        self.ship.fire();
        audio.play(SoundEffect::Fire);
        self.last_fire = Some(now);
        true
    }

    pub fn die(&mut self, audio: &mut AudioManager, now: Instant) {
        audio.stop_music();
        self.lives = self.lives.saturating_sub(1);
        self.counter = 0;
        self.state = GameState::Dying;
        audio.play(SoundEffect::Die);
        let delay = audio.duration(SoundEffect::Die) + Duration::from_secs_f64(TRANSITION_PADDING_SECS);
        self.start_timer.arm(now + delay);
        info!("Ship destroyed. Lives left: {}, score: {}", self.lives, self.score);
    }

    fn game_over(&mut self, audio: &mut AudioManager, now: Instant) {
        audio.stop_music();
        self.state = GameState::GameOver;
        audio.play(SoundEffect::GameOver);
        let delay = audio.duration(SoundEffect::GameOver) + Duration::from_secs_f64(TRANSITION_PADDING_SECS);
        self.restart_timer.arm(now + delay);
        info!("Game over. Final score: {}", self.score);
    }

    /// Click or Enter. Only starts a game from the welcome or starting screens.
    pub fn handle_confirm(&mut self, audio: &mut AudioManager, now: Instant) -> bool {
        match self.state {
            GameState::Welcome | GameState::Starting => {
                self.do_init(audio, now);
                true
            }
            _ => false,
        }
    }

    /// The death delay has elapsed: respawn, or end the game when out of lives.
    pub fn on_start_timer(&mut self, audio: &mut AudioManager, now: Instant) {
        self.start_timer.disarm();
        if self.lives < 1 {
            self.game_over(audio, now);
        } else {
            self.start(audio);
            self.rocks.clear();
            self.spawn_initial_rocks();
            info!("Respawned with {} lives", self.lives);
        }
    }

    pub fn on_restart_timer(&mut self) {
        self.restart_timer.disarm();
        self.state = GameState::Starting;
        info!("Waiting for a new game");
    }

    /// Fires every due timer. Returns true if any transition happened.
    pub fn poll_timers(&mut self, audio: &mut AudioManager, now: Instant) -> bool {
        let mut fired = false;
        if self.start_timer.poll(now) {
            self.on_start_timer(audio, now);
            fired = true;
        }
        if self.restart_timer.poll(now) {
            self.on_restart_timer();
            fired = true;
        }
        fired
    }

    /// Earliest armed timer deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.start_timer.deadline(), self.restart_timer.deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// One fixed simulation step.
    pub fn tick(&mut self, input: &TickInput, audio: &mut AudioManager, now: Instant) {
        if self.state == GameState::Welcome {
            return;
        }

        // Starting has no deadline, so missiles fired there would pile up unmoved
        let can_fire = matches!(self.state, GameState::Playing | GameState::Dying | GameState::GameOver);
        if input.fire && can_fire {
            self.try_fire(audio, now);
        }

        if self.state != GameState::Playing {
            return;
        }

        if input.turn_right {
            self.ship.rotate(-SHIP_TURN_DEGREES);
        }
        if input.turn_left {
            self.ship.rotate(SHIP_TURN_DEGREES);
        }
        self.ship.update_throttle(input.thrust);

        if !self.ship.active_missiles.is_empty() {
            physics::missiles_physics(self);
        }
        if !self.rocks.is_empty() {
            physics::rocks_physics(self, audio, now);
        }

        // A collision this tick ends the ship's movement
        if self.state == GameState::Playing {
            self.ship.move_forward();
            physics::escalate(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(&GameConfig { seed: Some(1234), ..GameConfig::default() })
    }

    fn playing(audio: &mut AudioManager, now: Instant) -> Session {
        let mut session = session();
        assert!(session.handle_confirm(audio, now));
        session
    }

    #[test]
    fn test_one_shot_timer_fires_once() {
        let now = Instant::now();
        let mut timer = OneShotTimer::default();
        assert!(!timer.poll(now));

        timer.arm(now + Duration::from_millis(500));
        assert!(timer.is_armed());
        assert!(!timer.poll(now + Duration::from_millis(499)));
        assert!(timer.poll(now + Duration::from_millis(500)));
        assert!(!timer.is_armed());
        assert!(!timer.poll(now + Duration::from_secs(10)));
    }

    #[test]
    fn test_welcome_confirm_starts_game() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = session();
        assert_eq!(session.state, GameState::Welcome);

        assert!(session.handle_confirm(&mut audio, now));
        assert_eq!(session.state, GameState::Playing);
        assert_eq!(session.lives, 3);
        assert_eq!(session.score, 0);
        assert_eq!(session.rocks.len(), INITIAL_ROCKS);
        assert!(session.rocks.iter().all(|r| r.size == RockSize::Big));
        assert!(audio.is_music_playing());

        // Confirm while playing is ignored
        assert!(!session.handle_confirm(&mut audio, now));
    }

    #[test]
    fn test_initial_rocks_keep_their_distance() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        for seed in 0..20 {
            let mut session = Session::new(&GameConfig { seed: Some(seed), ..GameConfig::default() });
            session.handle_confirm(&mut audio, now);
            for rock in &session.rocks {
                assert!(rock.position.distance(session.ship.position) >= INITIAL_MIN_ROCK_DISTANCE);
            }
        }
    }

    #[test]
    fn test_welcome_tick_does_nothing() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = session();
        let input = TickInput { fire: true, thrust: true, turn_left: true, turn_right: false };
        session.tick(&input, &mut audio, now);
        assert!(session.ship.active_missiles.is_empty());
        assert_eq!(session.ship.speed, 0);
        assert_eq!(session.ship.angle, 0.0);
    }

    #[test]
    fn test_fire_cooldown() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = playing(&mut audio, now);

        assert!(session.try_fire(&mut audio, now));
        assert!(!session.try_fire(&mut audio, now + Duration::from_millis(100)));
        assert_eq!(session.ship.active_missiles.len(), 1);
        assert_eq!(audio.last_effect(), Some(SoundEffect::Fire));

        assert!(session.try_fire(&mut audio, now + Duration::from_millis(150)));
        assert_eq!(session.ship.active_missiles.len(), 2);
    }

    #[test]
    fn test_turn_keys_are_independent() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = playing(&mut audio, now);
        session.rocks.clear();

        session.tick(&TickInput { turn_left: true, ..Default::default() }, &mut audio, now);
        assert_eq!(session.ship.angle, 10.0);
        session.tick(&TickInput { turn_right: true, ..Default::default() }, &mut audio, now);
        session.tick(&TickInput { turn_right: true, ..Default::default() }, &mut audio, now);
        assert_eq!(session.ship.angle, 350.0);
        session.tick(&TickInput { turn_left: true, turn_right: true, ..Default::default() }, &mut audio, now);
        assert_eq!(session.ship.angle, 350.0);
    }

    #[test]
    fn test_throttle_tick_moves_ship_with_new_speed() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = playing(&mut audio, now);
        session.rocks.clear();

        session.tick(&TickInput { thrust: true, ..Default::default() }, &mut audio, now);
        assert_eq!(session.ship.speed, 1);
        assert!((session.ship.position.x - 400.0).abs() < 1e-9);
        assert!((session.ship.position.y - 299.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_tick_only_moves_ship() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = playing(&mut audio, now);
        session.rocks.clear();
        session.ship.speed = 5;
        session.score = 70;

        session.tick(&TickInput::default(), &mut audio, now);
        assert_eq!(session.state, GameState::Playing);
        assert_eq!(session.score, 70);
        assert_eq!(session.lives, 3);
        assert!(session.rocks.is_empty());
        assert!(session.ship.active_missiles.is_empty());
        assert_eq!(session.ship.speed, 4);
        assert!((session.ship.position.y - 296.0).abs() < 1e-9);
    }

    #[test]
    fn test_death_then_respawn() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = playing(&mut audio, now);
        session.counter = 42;

        session.die(&mut audio, now);
        assert_eq!(session.state, GameState::Dying);
        assert_eq!(session.lives, 2);
        assert_eq!(session.counter, 0);
        assert!(!audio.is_music_playing());
        assert_eq!(audio.last_effect(), Some(SoundEffect::Die));

        // Nothing moves while dying
        session.ship.speed = 3;
        let position = session.ship.position;
        session.tick(&TickInput { thrust: true, ..Default::default() }, &mut audio, now);
        assert_eq!(session.ship.position, position);

        let deadline = session.next_deadline().unwrap();
        assert_eq!(deadline, now + Duration::from_secs_f64(DIE_SOUND_SECS + 1.0));
        assert!(!session.poll_timers(&mut audio, deadline - Duration::from_millis(1)));
        assert!(session.poll_timers(&mut audio, deadline));
        assert_eq!(session.state, GameState::Playing);
        assert_eq!(session.lives, 2);
        assert_eq!(session.rocks.len(), INITIAL_ROCKS);
        assert_eq!(session.ship.position, session.center());
        assert!(audio.is_music_playing());
        assert!(!session.poll_timers(&mut audio, deadline + Duration::from_secs(5)));
    }

    #[test]
    fn test_last_life_goes_to_game_over_then_starting() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = playing(&mut audio, now);
        session.lives = 1;
        session.score = 440;

        session.die(&mut audio, now);
        assert_eq!(session.lives, 0);
        let death_deadline = session.next_deadline().unwrap();
        session.poll_timers(&mut audio, death_deadline);
        assert_eq!(session.state, GameState::GameOver);
        assert_eq!(audio.last_effect(), Some(SoundEffect::GameOver));

        let over_deadline = session.next_deadline().unwrap();
        assert_eq!(
            over_deadline,
            death_deadline + Duration::from_secs_f64(GAME_OVER_SOUND_SECS + 1.0)
        );
        session.poll_timers(&mut audio, over_deadline);
        assert_eq!(session.state, GameState::Starting);
        assert_eq!(session.next_deadline(), None);
        assert_eq!(session.score, 440);

        assert!(session.handle_confirm(&mut audio, over_deadline));
        assert_eq!(session.state, GameState::Playing);
        assert_eq!(session.lives, 3);
        assert_eq!(session.score, 0);
    }

    #[test]
    fn test_lives_never_negative() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = playing(&mut audio, now);
        session.lives = 0;
        session.die(&mut audio, now);
        assert_eq!(session.lives, 0);
    }

    #[test]
    fn test_can_fire_while_dying_but_missiles_hold_still() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = playing(&mut audio, now);
        session.die(&mut audio, now);

        session.tick(&TickInput { fire: true, ..Default::default() }, &mut audio, now);
        assert_eq!(session.ship.active_missiles.len(), 1);
        let position = session.ship.active_missiles[0].position;
        session.tick(&TickInput::default(), &mut audio, now + Duration::from_millis(33));
        assert_eq!(session.ship.active_missiles[0].position, position);
    }

    #[test]
    fn test_no_missiles_pile_up_while_starting() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = session();
        session.state = GameState::Starting;

        let fire = TickInput { fire: true, ..Default::default() };
        for i in 0..2000 {
            session.tick(&fire, &mut audio, now + Duration::from_millis(200 * i));
        }
        assert!(session.ship.active_missiles.is_empty());
        assert_eq!(session.state, GameState::Starting);
    }

    #[test]
    fn test_missiles_stay_bounded_through_dying_and_game_over() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = playing(&mut audio, now);
        session.lives = 1;
        session.rocks.clear();
        session.die(&mut audio, now);

        let fire = TickInput { fire: true, ..Default::default() };
        let mut t = now;
        while session.state != GameState::Starting {
            session.tick(&fire, &mut audio, t);
            t += Duration::from_millis(33);
            session.poll_timers(&mut audio, t);
        }
        let in_flight = session.ship.active_missiles.len();
        let timed_secs = DIE_SOUND_SECS + GAME_OVER_SOUND_SECS + 2.0 * TRANSITION_PADDING_SECS;
        assert!(in_flight as f64 <= timed_secs / FIRE_COOLDOWN_SECS + 1.0);

        for _ in 0..500 {
            session.tick(&fire, &mut audio, t);
            t += Duration::from_millis(33);
        }
        assert_eq!(session.ship.active_missiles.len(), in_flight);
    }

    #[test]
    fn test_spawn_gives_up_when_no_spot_is_far_enough() {
        let now = Instant::now();
        let mut audio = AudioManager::new(true);
        let mut session = playing(&mut audio, now);
        session.rocks.clear();
        // Farther than any point on the screen can be from the ship
        session.min_rock_distance = 10.0 * session.bounds_radius();

        session.make_rock(RockSize::Big, None);
        assert_eq!(session.rocks.len(), 1);
        let position = session.rocks[0].position;
        assert!((0.0..=WORLD_WIDTH).contains(&position.x));
        assert!((0.0..=WORLD_HEIGHT).contains(&position.y));
    }
}
