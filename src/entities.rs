use crate::constants::*;
use crate::rendering::GameGrid;
use crate::types::{heading_direction, wrap_degrees, Vector2D};
use log::debug;
use rand::Rng;

// --- Ship ---
pub struct Ship {
    pub position: Vector2D,
    pub angle: f64, // Degrees, 0 = up, counter-clockwise positive
    pub speed: u32,
    pub is_throttle_on: bool,
    pub active_missiles: Vec<Missile>,
}

impl Ship {
    pub fn new(x: f64, y: f64) -> Self {
        Ship {
            position: Vector2D::new(x, y),
            angle: 0.0,
            speed: 0,
            is_throttle_on: false,
            active_missiles: Vec::new(),
        }
    }

    /// Derived fresh from the heading on every call.
    pub fn direction(&self) -> Vector2D {
        heading_direction(self.angle)
    }

    pub fn rotate(&mut self, delta: f64) {
        self.angle = wrap_degrees(self.angle + delta);
    }

    pub fn update_throttle(&mut self, held: bool) {
        if held {
            self.is_throttle_on = true;
            if self.speed < SHIP_MAX_SPEED {
                self.speed += 1;
            }
        } else {
            self.is_throttle_on = false;
            self.speed = self.speed.saturating_sub(1);
        }
    }

    pub fn move_forward(&mut self) {
        self.position = self.position.add(self.direction().scale(self.speed as f64));
    }

    /// Launches a missile from the nose of the ship. Cooldown is the caller's business.
    pub fn fire(&mut self) {
        let direction = self.direction();
        let nose = Vector2D::new(
            self.position.x + direction.x * SHIP_WIDTH,
            self.position.y + direction.y * SHIP_HEIGHT / 2.0,
        );
        self.active_missiles.push(Missile::new(nose, self.angle));
        debug!("Missile fired at ({:.1}, {:.1}), angle {}", nose.x, nose.y, self.angle);
    }

    pub fn get_heading_char(angle: f64) -> char {
        // Eight octants centred on the cardinal and diagonal headings
        let octant = ((wrap_degrees(angle) + 22.5) / 45.0).floor() as u32 % 8;
        match octant {
            0 => '^',
            1 => '\u{005C}', // Up-left
            2 => '<',
            3 => '/', // Down-left
            4 => 'v',
            5 => '\u{005C}', // Down-right
            6 => '>',
            _ => '/', // Up-right
        }
    }

    pub fn draw(&self, game_grid: &mut GameGrid) {
        if let Some((x, y)) = game_grid.world_to_cell(self.position) {
            game_grid.set_char(x, y, Ship::get_heading_char(self.angle));
        }

        if self.is_throttle_on {
            // Exhaust one cell behind the nose
            let behind = self.direction().scale(-game_grid.cell_size().0.max(game_grid.cell_size().1));
            if let Some((x, y)) = game_grid.world_to_cell(self.position.add(behind)) {
                game_grid.set_char(x, y, '~');
            }
        }

        for missile in &self.active_missiles {
            missile.draw(game_grid);
        }
    }
}

// --- Missile ---
pub struct Missile {
    pub position: Vector2D,
    pub angle: f64,
    pub speed: f64,
}

impl Missile {
    pub fn new(position: Vector2D, angle: f64) -> Self {
        Missile { position, angle, speed: MISSILE_SPEED }
    }

    pub fn move_forward(&mut self) {
        self.position = self.position.add(heading_direction(self.angle).scale(self.speed));
    }

    pub fn draw(&self, game_grid: &mut GameGrid) {
        if let Some((x, y)) = game_grid.world_to_cell(self.position) {
            game_grid.set_char(x, y, '*');
        }
    }
}

// --- Rocks ---
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RockSize {
    Big,
    Normal,
    Small,
}

impl RockSize {
    /// Missile-to-rock distance below which the rock is destroyed.
    pub fn hit_radius(self) -> f64 {
        match self {
            RockSize::Big => 80.0,
            RockSize::Normal => 55.0,
            RockSize::Small => 30.0,
        }
    }

    /// Ship-to-rock distance below which the ship dies.
    pub fn death_distance(self) -> f64 {
        match self {
            RockSize::Big => 90.0,
            RockSize::Normal => 65.0,
            RockSize::Small => 40.0,
        }
    }

    pub fn score(self) -> u32 {
        match self {
            RockSize::Big => SCORE_BIG_ROCK,
            RockSize::Normal => SCORE_NORMAL_ROCK,
            RockSize::Small => SCORE_SMALL_ROCK,
        }
    }

    /// Size of the two fragments left behind, if the rock splits at all.
    pub fn fragment(self) -> Option<RockSize> {
        match self {
            RockSize::Big => Some(RockSize::Normal),
            RockSize::Normal => Some(RockSize::Small),
            RockSize::Small => None,
        }
    }

    pub fn display_char(self) -> char {
        match self {
            RockSize::Big => '@',
            RockSize::Normal => 'O',
            RockSize::Small => 'o',
        }
    }

    fn draw_radius(self) -> f64 {
        match self {
            RockSize::Big => 40.0,
            RockSize::Normal => 27.0,
            RockSize::Small => 14.0,
        }
    }
}

pub struct Rock {
    pub position: Vector2D,
    pub size: RockSize,
    pub speed: f64,
    pub direction: Vector2D,
}

impl Rock {
    pub fn new(position: Vector2D, size: RockSize, rng: &mut impl Rng) -> Self {
        // Each axis gets its own sign and magnitude; the vector is left unnormalized
        let mut axis = || {
            let magnitude = rng.gen_range(0.0..1.0);
            if rng.gen_bool(0.5) { -magnitude } else { magnitude }
        };
        let direction = Vector2D::new(axis(), axis());

        Rock { position, size, speed: ROCK_SPEED, direction }
    }

    pub fn move_forward(&mut self) {
        self.position = self.position.add(self.direction.scale(self.speed));
    }

    pub fn draw(&self, game_grid: &mut GameGrid) {
        let radius = self.size.draw_radius();
        let top_left = Vector2D::new(self.position.x - radius, self.position.y - radius);
        let bottom_right = Vector2D::new(self.position.x + radius, self.position.y + radius);
        let (cell_w, cell_h) = game_grid.cell_size();

        let (min_x, min_y) = game_grid.world_to_cell_clamped(top_left);
        let (max_x, max_y) = game_grid.world_to_cell_clamped(bottom_right);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let cell_center = Vector2D::new((x as f64 + 0.5) * cell_w, (y as f64 + 0.5) * cell_h);
                if cell_center.distance(self.position) <= radius {
                    game_grid.set_char(x, y, self.size.display_char());
                }
            }
        }

        // Small rocks can fall between cell centres
        if let Some((x, y)) = game_grid.world_to_cell(self.position) {
            game_grid.set_char(x, y, self.size.display_char());
        }
    }
}
