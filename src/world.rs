use glam::{vec2, Vec2};

/// Edges of the water column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    Left,
    Right,
    Surface,
    Bottom,
}

impl Boundary {
    /// Unit vector pointing from this edge into the water.
    pub fn inward_normal(self) -> Vec2 {
        match self {
            Boundary::Left => Vec2::X,
            Boundary::Right => Vec2::NEG_X,
            Boundary::Surface => Vec2::Y,
            Boundary::Bottom => Vec2::NEG_Y,
        }
    }
}

/// Bounded 2D water column: x is horizontal, y is depth (0 = surface).
#[derive(Clone, Debug, PartialEq)]
pub struct World {
    pub width: f32,
    pub depth: f32,
}

impl World {
    pub fn new(width: f32, depth: f32) -> Self {
        Self { width, depth }
    }

    pub fn center(&self) -> Vec2 {
        vec2(self.width * 0.5, self.depth * 0.5)
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x <= self.width && pos.y >= 0.0 && pos.y <= self.depth
    }

    /// Clamp a position into the water column.
    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        vec2(pos.x.clamp(0.0, self.width), pos.y.clamp(0.0, self.depth))
    }

    /// Clamp keeping `margin` units away from every edge.
    pub fn clamp_inset(&self, pos: Vec2, margin: f32) -> Vec2 {
        let mx = margin.min(self.width * 0.5);
        let my = margin.min(self.depth * 0.5);
        vec2(
            pos.x.clamp(mx, self.width - mx),
            pos.y.clamp(my, self.depth - my),
        )
    }

    pub fn delta(&self, from: Vec2, to: Vec2) -> Vec2 {
        to - from
    }

    pub fn distance_sq(&self, a: Vec2, b: Vec2) -> f32 {
        self.delta(a, b).length_squared()
    }

    pub fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        self.delta(a, b).length()
    }

    /// Closest edge to `pos` and the distance to it. Ties resolve in
    /// Left, Right, Surface, Bottom order.
    pub fn nearest_boundary(&self, pos: Vec2) -> (Boundary, f32) {
        let candidates = [
            (Boundary::Left, pos.x),
            (Boundary::Right, self.width - pos.x),
            (Boundary::Surface, pos.y),
            (Boundary::Bottom, self.depth - pos.y),
        ];
        let mut best = candidates[0];
        for c in &candidates[1..] {
            if c.1 < best.1 {
                best = *c;
            }
        }
        best
    }
}
