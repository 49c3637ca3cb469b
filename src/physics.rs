//! Collision and spawn resolution for one tick.

use std::time::Instant;

use log::{debug, info};

use crate::audio::AudioManager;
use crate::constants::*;
use crate::entities::{Rock, RockSize};
use crate::session::{GameState, Session};
use crate::types::Vector2D;

/// Moves every missile and resolves missile/rock hits.
///
/// A missile consumes the first live rock it touches and a rock is destroyed
/// at most once, even when several missiles reach it on the same tick.
/// Fragments join the field after the pass.
pub fn missiles_physics(session: &mut Session) {
    let center = session.center();
    let bounds = session.bounds_radius();
    let rocks = &session.rocks;
    let mut destroyed = vec![false; rocks.len()];
    let mut hits: Vec<usize> = Vec::new();

    session.ship.active_missiles.retain_mut(|missile| {
        missile.move_forward();

        let hit = rocks.iter().enumerate().position(|(i, rock)| {
            !destroyed[i] && missile.position.distance(rock.position) < rock.size.hit_radius()
        });
        if let Some(index) = hit {
            destroyed[index] = true;
            hits.push(index);
            return false;
        }

        // Missiles that left the screen will never hit anything
        missile.position.distance(center) <= bounds
    });

    if hits.is_empty() {
        return;
    }

    let mut fragments: Vec<Rock> = Vec::new();
    for (removed, &index) in hits.iter().enumerate() {
        let position = session.rocks[index].position;
        let size = session.rocks[index].size;
        session.score += size.score();
        debug!("Missile hit {:?} rock at ({:.1}, {:.1}). Score: {}", size, position.x, position.y, session.score);

        match size.fragment() {
            Some(fragment) => {
                for offset in [SPLIT_OFFSET, -SPLIT_OFFSET] {
                    let at = Vector2D::new(position.x + offset, position.y);
                    fragments.push(session.new_rock(fragment, Some(at)));
                }
            }
            None => {
                let live = session.rocks.len() - (removed + 1) + fragments.len();
                if live < REPLACEMENT_ROCK_LIMIT {
                    fragments.push(session.new_rock(RockSize::Big, None));
                }
            }
        }
    }

    let mut index = 0;
    session.rocks.retain(|_| {
        let keep = !destroyed[index];
        index += 1;
        keep
    });
    session.rocks.extend(fragments);
}

/// Moves every rock, kills the ship on contact and recycles rocks that
/// drifted off screen.
pub fn rocks_physics(session: &mut Session, audio: &mut AudioManager, now: Instant) {
    let center = session.center();
    let bounds = session.bounds_radius();
    let ship_position = session.ship.position;
    let was_playing = session.state == GameState::Playing;
    let mut collided = false;
    let mut lost: Vec<RockSize> = Vec::new();

    let count_before = session.rocks.len();
    session.rocks.retain_mut(|rock| {
        rock.move_forward();

        // Only the first contact counts; the ship is already gone after that
        if was_playing && !collided && rock.position.distance(ship_position) < rock.size.death_distance() {
            collided = true;
            return true;
        }

        if rock.position.distance(center) > bounds {
            lost.push(rock.size);
            return false;
        }
        true
    });

    let mut respawned = 0;
    for (removed, size) in lost.into_iter().enumerate() {
        let live = count_before - (removed + 1) + respawned;
        if live < REPLACEMENT_ROCK_LIMIT {
            session.make_rock(size, None);
            respawned += 1;
        }
    }

    if collided {
        session.die(audio, now);
    }
}

/// Counts playing ticks and raises the difficulty once per interval.
pub fn escalate(session: &mut Session) {
    session.counter += 1;
    if session.counter < session.escalation_interval() {
        return;
    }

    if session.rocks.len() < ESCALATION_ROCK_LIMIT {
        session.make_rock(RockSize::Big, None);
    }
    if session.min_rock_distance > MIN_ROCK_DISTANCE_FLOOR {
        session.min_rock_distance = (session.min_rock_distance - MIN_ROCK_DISTANCE_STEP).max(MIN_ROCK_DISTANCE_FLOOR);
    }
    session.counter = 0;
    info!(
        "Difficulty raised. Rocks: {}, minimum spawn distance: {}",
        session.rocks.len(),
        session.min_rock_distance
    );
}
