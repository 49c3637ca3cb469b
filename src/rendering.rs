use std::io::{self, Write};
use log::info;
use crossterm::{
    cursor::MoveTo,
    execute,
};

use crate::session::{GameState, Session};
use crate::types::Vector2D;

const WELCOME_TITLE: &str = ">>  DEAD SHOT  <<";
const WELCOME_PROMPT: &str = "[Click anywhere/press Enter] to begin!";
const GAME_OVER_TEXT: &str = "GAME OVER";
const LIFE_CHAR: char = 'A';

// --- ScreenBuffer for simulated rendering ---
pub struct ScreenBuffer {
    pub buffer: Vec<Vec<char>>,
    pub width: u16,
    pub height: u16,
    pub cursor_x: u16,
    pub cursor_y: u16,
}

impl ScreenBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        ScreenBuffer {
            buffer: vec![vec![' '; width as usize]; height as usize],
            width,
            height,
            cursor_x: 0,
            cursor_y: 0,
        }
    }

    pub fn move_to(&mut self, x: u16, y: u16) {
        self.cursor_x = x;
        self.cursor_y = y;
    }

    pub fn write_char(&mut self, c: char) {
        if self.cursor_y < self.height && self.cursor_x < self.width {
            self.buffer[self.cursor_y as usize][self.cursor_x as usize] = c;
        }
    }

    pub fn write_str(&mut self, s: &str) {
        for c in s.chars() {
            self.write_char(c);
            self.cursor_x = self.cursor_x.saturating_add(1);
        }
    }

    pub fn clear(&mut self) {
        self.buffer = vec![vec![' '; self.width as usize]; self.height as usize];
        self.cursor_x = 0;
        self.cursor_y = 0;
    }

    #[cfg(test)]
    pub fn row(&self, y: u16) -> String {
        self.buffer.get(y as usize).map(|row| row.iter().collect()).unwrap_or_default()
    }

    pub fn print_to_log(&self) {
        info!("--- Screen Buffer ---");
        for row in &self.buffer {
            info!("{}", row.iter().collect::<String>());
        }
        info!("---------------------");
    }
}

impl Write for ScreenBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.write_str(&s);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// --- OutputTarget enum to handle stdout or ScreenBuffer ---
pub enum OutputTarget {
    Stdout(io::Stdout),
    ScreenBuffer(ScreenBuffer),
}

impl OutputTarget {
    pub fn execute_move_to(&mut self, command: MoveTo) -> io::Result<()> {
        match self {
            OutputTarget::Stdout(s) => execute!(s, command),
            OutputTarget::ScreenBuffer(sb) => {
                sb.move_to(command.0, command.1);
                Ok(())
            },
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputTarget::Stdout(s) => s.write(buf),
            OutputTarget::ScreenBuffer(sb) => sb.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputTarget::Stdout(s) => s.flush(),
            OutputTarget::ScreenBuffer(sb) => sb.flush(),
        }
    }
}

// --- GameGrid: the world projected onto terminal cells ---
pub struct GameGrid {
    pub grid: Vec<Vec<char>>,
    pub width: u16,
    pub height: u16,
    world_width: f64,
    world_height: f64,
}

impl GameGrid {
    pub fn new(width: u16, height: u16, world_width: f64, world_height: f64) -> Self {
        GameGrid {
            grid: vec![vec![' '; width as usize]; height as usize],
            width,
            height,
            world_width,
            world_height,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.clear();
    }

    /// World units covered by one cell, horizontally and vertically.
    pub fn cell_size(&self) -> (f64, f64) {
        (
            self.world_width / self.width.max(1) as f64,
            self.world_height / self.height.max(1) as f64,
        )
    }

    /// Cell containing `position`, or `None` when it lies off screen.
    pub fn world_to_cell(&self, position: Vector2D) -> Option<(u16, u16)> {
        if position.x < 0.0 || position.y < 0.0 || position.x >= self.world_width || position.y >= self.world_height {
            return None;
        }
        let (cell_w, cell_h) = self.cell_size();
        let x = (position.x / cell_w).floor() as u16;
        let y = (position.y / cell_h).floor() as u16;
        (x < self.width && y < self.height).then_some((x, y))
    }

    pub fn world_to_cell_clamped(&self, position: Vector2D) -> (u16, u16) {
        let (cell_w, cell_h) = self.cell_size();
        let max_x = self.width.saturating_sub(1) as f64;
        let max_y = self.height.saturating_sub(1) as f64;
        (
            (position.x / cell_w).floor().clamp(0.0, max_x) as u16,
            (position.y / cell_h).floor().clamp(0.0, max_y) as u16,
        )
    }

    pub fn set_char(&mut self, x: u16, y: u16, c: char) {
        if y < self.height && x < self.width {
            self.grid[y as usize][x as usize] = c;
        }
    }

    pub fn put_str(&mut self, x: u16, y: u16, text: &str) {
        for (i, c) in text.chars().enumerate() {
            self.set_char(x.saturating_add(i as u16), y, c);
        }
    }

    pub fn put_centered(&mut self, y: u16, text: &str) {
        let x = (self.width / 2).saturating_sub(text.chars().count() as u16 / 2);
        self.put_str(x, y, text);
    }

    pub fn clear(&mut self) {
        self.grid = vec![vec![' '; self.width as usize]; self.height as usize];
    }

    pub fn row(&self, y: u16) -> String {
        self.grid.get(y as usize).map(|row| row.iter().collect()).unwrap_or_default()
    }

    pub fn render(&self, stdout: &mut OutputTarget) -> io::Result<()> {
        if let OutputTarget::ScreenBuffer(sb) = stdout {
            sb.clear();
        }
        for y in 0..self.height {
            stdout.execute_move_to(MoveTo(0, y))?;
            write!(stdout, "{}", self.row(y))?;
        }
        Ok(())
    }

    pub fn clear_screen_manual(&self, stdout: &mut OutputTarget) -> io::Result<()> {
        for y in 0..self.height {
            stdout.execute_move_to(MoveTo(0, y))?;
            write!(stdout, "{}", " ".repeat(self.width as usize))?;
        }
        stdout.execute_move_to(MoveTo(0, 0))?;
        Ok(())
    }
}

/// Composes the whole frame for the current session state.
pub fn draw_session(game_grid: &mut GameGrid, session: &Session) {
    game_grid.clear();

    if session.state == GameState::Welcome {
        let middle = game_grid.height / 2;
        game_grid.put_centered(middle.saturating_sub(2), WELCOME_TITLE);
        game_grid.put_centered(middle.saturating_add(1), WELCOME_PROMPT);
        return;
    }

    session.ship.draw(game_grid);
    for rock in &session.rocks {
        rock.draw(game_grid);
    }

    // HUD goes on top of the playfield
    let score = session.score.to_string();
    let score_x = game_grid.width.saturating_sub(score.len() as u16 + 1);
    game_grid.put_str(score_x, 0, &score);

    let lives: String = std::iter::repeat_n(LIFE_CHAR, session.lives as usize).collect();
    game_grid.put_str(1, 0, &lives);

    if matches!(session.state, GameState::GameOver | GameState::Starting) {
        game_grid.put_centered(game_grid.height / 2, GAME_OVER_TEXT);
    }
}
