//! Sound board for the game.
//!
//! The terminal has no mixer, so every cue goes to the log. Durations are
//! still reported because delayed state transitions are timed from them.

use std::time::Duration;

use log::{debug, info};

use crate::constants::*;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Looping background music
    Soundtrack,
    /// Missile launched
    Fire,
    /// Ship destroyed
    Die,
    /// Out of lives
    GameOver,
}

impl SoundEffect {
    pub fn file_name(self) -> &'static str {
        match self {
            SoundEffect::Soundtrack => "soundtrack.wav",
            SoundEffect::Fire => "fire.wav",
            SoundEffect::Die => "die.wav",
            SoundEffect::GameOver => "game_over.wav",
        }
    }
}

pub struct AudioManager {
    muted: bool,
    music_playing: bool,
    music_volume: f32,
    last_effect: Option<SoundEffect>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(false)
    }
}

impl AudioManager {
    pub fn new(muted: bool) -> Self {
        Self {
            muted,
            music_playing: false,
            music_volume: SOUNDTRACK_VOLUME,
            last_effect: None,
        }
    }

    #[cfg(test)]
    pub fn is_music_playing(&self) -> bool {
        self.music_playing
    }

    pub fn last_effect(&self) -> Option<SoundEffect> {
        self.last_effect
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Mute/unmute all audio. The soundtrack keeps its looping state.
    pub fn set_muted(&mut self, muted: bool) {
        if self.muted != muted {
            info!("Audio {}", if muted { "muted" } else { "unmuted" });
        }
        self.muted = muted;
    }

    /// Play a one-shot effect
    pub fn play(&mut self, effect: SoundEffect) {
        self.last_effect = Some(effect);
        if !self.muted {
            debug!("Playing {}", effect.file_name());
        }
    }

    /// Start the soundtrack looping, fading in from silence
    pub fn play_music(&mut self) {
        self.music_playing = true;
        if !self.muted {
            info!(
                "Soundtrack {} looping at volume {} ({}ms fade-in)",
                SoundEffect::Soundtrack.file_name(),
                self.music_volume,
                SOUNDTRACK_FADE_IN_MS
            );
        }
    }

    /// Stopping music that is not playing is a no-op
    pub fn stop_music(&mut self) {
        if self.music_playing {
            self.music_playing = false;
            if !self.muted {
                info!("Soundtrack stopped");
            }
        }
    }

    pub fn duration(&self, effect: SoundEffect) -> Duration {
        let secs = match effect {
            SoundEffect::Soundtrack => SOUNDTRACK_SECS,
            SoundEffect::Fire => FIRE_SOUND_SECS,
            SoundEffect::Die => DIE_SOUND_SECS,
            SoundEffect::GameOver => GAME_OVER_SOUND_SECS,
        };
        Duration::from_secs_f64(secs)
    }
}
