// --- World Constants ---
pub const WORLD_WIDTH: f64 = 800.0;
pub const WORLD_HEIGHT: f64 = 600.0;
pub const TICK_RATE: u32 = 30; // Ticks per second

// --- Ship ---
pub const SHIP_TURN_DEGREES: f64 = 10.0;
pub const SHIP_MAX_SPEED: u32 = 20;
pub const SHIP_WIDTH: f64 = 50.0;
pub const SHIP_HEIGHT: f64 = 50.0;
pub const FIRE_COOLDOWN_SECS: f64 = 0.15;

// --- Missiles and rocks ---
pub const MISSILE_SPEED: f64 = 15.0;
pub const ROCK_SPEED: f64 = 4.0;
pub const SPLIT_OFFSET: f64 = 10.0;

pub const SCORE_BIG_ROCK: u32 = 20;
pub const SCORE_NORMAL_ROCK: u32 = 50;
pub const SCORE_SMALL_ROCK: u32 = 100;

// --- Spawning ---
pub const INITIAL_ROCKS: usize = 4;
pub const REPLACEMENT_ROCK_LIMIT: usize = 10; // Respawn only below this count
pub const ESCALATION_ROCK_LIMIT: usize = 15;
pub const ESCALATION_INTERVAL_SECS: u64 = 20;
pub const INITIAL_MIN_ROCK_DISTANCE: f64 = 350.0;
pub const MIN_ROCK_DISTANCE_FLOOR: f64 = 200.0;
pub const MIN_ROCK_DISTANCE_STEP: f64 = 50.0;
pub const SPAWN_MARGIN: i64 = 200;
pub const SPAWN_MAX_ATTEMPTS: u32 = 100;

// --- Session ---
pub const INITIAL_LIVES: u32 = 3;
pub const TRANSITION_PADDING_SECS: f64 = 1.0; // Added to sound length before a delayed transition

// --- Audio ---
pub const SOUNDTRACK_VOLUME: f32 = 0.3;
pub const SOUNDTRACK_FADE_IN_MS: u64 = 1000;
pub const DIE_SOUND_SECS: f64 = 1.6;
pub const GAME_OVER_SOUND_SECS: f64 = 3.2;
pub const FIRE_SOUND_SECS: f64 = 0.3;
pub const SOUNDTRACK_SECS: f64 = 62.0;

// --- Terminal ---
pub const KEY_HOLD_WINDOW_MS: u64 = 120; // Without release events a key counts as held this long after its last press
pub const DEBUG_COLUMNS: u16 = 80;
pub const DEBUG_ROWS: u16 = 24;
pub const LOG_FILE: &str = "dead-shot.log";
