mod audio;
mod config;
mod constants;
mod entities;
mod error;
mod game;
mod physics;
mod rendering;
mod session;
mod terminal_io;
mod types;

use std::env;
use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, Show},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, size, supports_keyboard_enhancement},
};
use log::{error, info, warn};

use crate::config::GameConfig;
use crate::constants::LOG_FILE;
use crate::error::{GameError, Result};
use crate::game::Game;
use crate::rendering::{OutputTarget, ScreenBuffer};
use crate::terminal_io::{InputSource, SimulatedInput};

/// Puts the terminal into game mode and restores it when dropped, even if
/// the game loop bails out with an error.
struct TerminalGuard {
    keyboard_enhanced: bool,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        info!("Attempting to enable raw mode.");
        enable_raw_mode().map_err(|e| { error!("Failed to enable raw mode: {}", e); e })?;
        // From here on an early return drops the guard and restores the terminal
        let mut guard = TerminalGuard { keyboard_enhanced: false };
        let mut stdout = io::stdout();
        execute!(stdout, Hide, EnableMouseCapture).map_err(|e| { error!("Failed to hide cursor: {}", e); e })?;

        // Release events make held keys exact; without them KeyStates falls back to a hold window
        match supports_keyboard_enhancement() {
            Ok(true) => {
                execute!(
                    stdout,
                    PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
                )
                .map_err(|e| { error!("Failed to enable keyboard enhancement: {}", e); e })?;
                guard.keyboard_enhanced = true;
            }
            Ok(false) => {}
            Err(e) => warn!("Could not query keyboard enhancement support: {}", e),
        }
        info!("Raw mode enabled. Keyboard enhancement: {}", guard.keyboard_enhanced);
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        if self.keyboard_enhanced {
            if let Err(e) = execute!(stdout, PopKeyboardEnhancementFlags) {
                error!("Failed to restore keyboard flags: {}", e);
            }
        }
        if let Err(e) = execute!(stdout, DisableMouseCapture, Show) {
            error!("Failed to show cursor on exit: {}", e);
        }
        if let Err(e) = disable_raw_mode() {
            error!("Failed to disable raw mode on exit: {}", e);
        }
        let _ = stdout.flush();
    }
}

fn run() -> Result<()> {
    simple_logging::log_to_file(LOG_FILE, log::LevelFilter::Info)
        .map_err(|e| GameError::Logging(e.to_string()))?;
    info!("Starting Dead Shot.");

    let config = GameConfig::from_args(env::args().skip(1))?;

    if config.debug {
        info!(
            "Debug mode enabled. Resolution {}x{}, frame limit {:?}",
            config.debug_columns, config.debug_rows, config.max_frames
        );
        let stdout_target = OutputTarget::ScreenBuffer(ScreenBuffer::new(config.debug_columns, config.debug_rows));
        let input = InputSource::Simulated(SimulatedInput::demo_script());
        let (columns, rows) = (config.debug_columns, config.debug_rows);
        let mut game = Game::new(config, columns, rows, stdout_target, input);
        game.run()?;
        return Ok(());
    }

    let (terminal_width, terminal_height) = size().map_err(|e| { error!("Failed to get terminal size: {}", e); e })?;
    info!("Terminal size: {}x{}", terminal_width, terminal_height);

    let _guard = TerminalGuard::enter()?;
    let mut game = Game::new(
        config,
        terminal_width,
        terminal_height,
        OutputTarget::Stdout(io::stdout()),
        InputSource::Terminal,
    );
    game.run()?;
    info!("Exiting application.");
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("{}", e);
        eprintln!("dead-shot: {}", e);
        std::process::exit(1);
    }
}
