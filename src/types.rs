#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub fn new(x: f64, y: f64) -> Self {
        Vector2D { x, y }
    }

    pub fn scale(&self, scalar: f64) -> Self {
        Vector2D::new(self.x * scalar, self.y * scalar)
    }

    pub fn add(&self, other: Vector2D) -> Self {
        Vector2D::new(self.x + other.x, self.y + other.y)
    }

    pub fn distance(&self, other: Vector2D) -> f64 {
        distance(*self, other)
    }
}

pub fn distance(p: Vector2D, q: Vector2D) -> f64 {
    ((p.x - q.x).powi(2) + (p.y - q.y).powi(2)).sqrt()
}

/// Unit direction for a heading in degrees. 0 points up the screen and
/// positive angles turn counter-clockwise.
pub fn heading_direction(angle_degrees: f64) -> Vector2D {
    let radians = angle_degrees.to_radians();
    Vector2D::new((-radians).sin(), -radians.cos())
}

/// Wraps a heading into [0, 360).
pub fn wrap_degrees(angle: f64) -> f64 {
    angle.rem_euclid(360.0)
}
