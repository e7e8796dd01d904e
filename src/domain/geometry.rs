/// Pixel-space geometry: points, axis-aligned rectangles, overlap tests.
///
/// Rectangles use integer pixel coordinates with half-open extents:
/// a rect covers `[min_x, max_x) × [min_y, max_y)`. Float positions are
/// truncated toward zero when a rect is built from them, so every hitbox in
/// the game snaps to whole pixels the same way.

use rand::Rng;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    /// Build from two corners. Swapped corners are canonicalised.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Rect {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Build from float corners, truncating toward zero.
    pub fn from_f64(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Rect::new(x0 as i32, y0 as i32, x1 as i32, y1 as i32)
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
}

/// True iff both rects are non-empty and share a region of non-zero area.
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    !a.is_empty()
        && !b.is_empty()
        && a.min_x < b.max_x
        && b.min_x < a.max_x
        && a.min_y < b.max_y
        && b.min_y < a.max_y
}

/// Coarse proximity: both axes differ by at most `radius`.
pub fn near(p1: Point, p2: Point, radius: f64) -> bool {
    (p1.x - p2.x).abs() <= radius && (p1.y - p2.y).abs() <= radius
}

/// Integer-valued point in `[0, max_x) × [0, max_y)`.
pub fn random_point<R: Rng + ?Sized>(rng: &mut R, max_x: u32, max_y: u32) -> Point {
    let x = rng.gen_range(0..max_x.max(1));
    let y = rng.gen_range(0..max_y.max(1));
    Point::new(x as f64, y as f64)
}
