use std::str::FromStr;

use crate::constants::*;
use crate::error::{GameError, Result};

pub const USAGE: &str = "usage: dead-shot [--debug [COLS ROWS [FRAMES]]] [--seed N] [--frames N] [--mute]";

/// Runtime configuration. World size and tick rate default to the arcade
/// values; everything else comes from the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub width: f64,
    pub height: f64,
    pub tick_rate: u32,
    pub seed: Option<u64>,
    /// Render into an in-memory buffer and replay scripted input instead of using the terminal.
    pub debug: bool,
    pub debug_columns: u16,
    pub debug_rows: u16,
    pub max_frames: Option<u64>,
    pub muted: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            tick_rate: TICK_RATE,
            seed: None,
            debug: false,
            debug_columns: DEBUG_COLUMNS,
            debug_rows: DEBUG_ROWS,
            max_frames: None,
            muted: false,
        }
    }
}

impl GameConfig {
    /// Parses process arguments, excluding the program name.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut config = GameConfig::default();
        let mut i = 0;

        while i < args.len() {
            match args[i].as_str() {
                "--debug" => {
                    config.debug = true;
                    // Optional positional COLS ROWS [FRAMES]
                    let positional: Vec<&String> = args[i + 1..]
                        .iter()
                        .take_while(|a| !a.starts_with("--"))
                        .take(3)
                        .collect();
                    match positional.len() {
                        0 => {}
                        1 => return Err(invalid(positional[0], "--debug needs both COLS and ROWS")),
                        _ => {
                            config.debug_columns = parse_arg(positional[0])?;
                            config.debug_rows = parse_arg(positional[1])?;
                            if let Some(frames) = positional.get(2) {
                                config.max_frames = Some(parse_arg(frames)?);
                            }
                        }
                    }
                    i += positional.len();
                }
                "--seed" => {
                    config.seed = Some(parse_arg(value_after(&args, i)?)?);
                    i += 1;
                }
                "--frames" => {
                    config.max_frames = Some(parse_arg(value_after(&args, i)?)?);
                    i += 1;
                }
                "--mute" => config.muted = true,
                other => return Err(invalid(other, USAGE)),
            }
            i += 1;
        }

        if config.debug_columns == 0 || config.debug_rows == 0 {
            return Err(invalid("--debug", "screen must be at least 1x1"));
        }
        Ok(config)
    }

    /// Ticks between two difficulty escalations.
    pub fn escalation_interval(&self) -> u64 {
        ESCALATION_INTERVAL_SECS * self.tick_rate as u64
    }
}

fn value_after(args: &[String], i: usize) -> Result<&String> {
    args.get(i + 1).ok_or_else(|| invalid(&args[i], "missing value"))
}

fn parse_arg<T: FromStr>(raw: &str) -> Result<T> {
    raw.parse::<T>().map_err(|_| invalid(raw, "not a valid number"))
}

fn invalid(arg: &str, reason: &str) -> GameError {
    GameError::InvalidArgument { arg: arg.to_string(), reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::from_args(Vec::<String>::new()).unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.width, 800.0);
        assert_eq!(config.height, 600.0);
        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.escalation_interval(), 600);
    }

    #[test]
    fn test_debug_with_dimensions_and_frames() {
        let config = GameConfig::from_args(["--debug", "100", "30", "90", "--seed", "42"]).unwrap();
        assert!(config.debug);
        assert_eq!(config.debug_columns, 100);
        assert_eq!(config.debug_rows, 30);
        assert_eq!(config.max_frames, Some(90));
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_bare_debug_flag() {
        let config = GameConfig::from_args(["--debug", "--mute"]).unwrap();
        assert!(config.debug);
        assert!(config.muted);
        assert_eq!(config.debug_columns, DEBUG_COLUMNS);
        assert_eq!(config.max_frames, None);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            GameConfig::from_args(["--seed", "abc"]),
            Err(GameError::InvalidArgument { .. })
        ));
        assert!(GameConfig::from_args(["--frames"]).is_err());
        assert!(GameConfig::from_args(["--debug", "80"]).is_err());
        assert!(GameConfig::from_args(["--debug", "0", "10"]).is_err());
        assert!(GameConfig::from_args(["--fast"]).is_err());
    }
}
