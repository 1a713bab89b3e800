use super::geometry::{Point, Slope};

// Accumulator trait for flood fill
//------------------------------------------------------------------------------

pub trait Accumulator {
    fn accumulate(&mut self, row: Row);
}

impl<F> Accumulator for F
where
    F: FnMut(Row),
{
    fn accumulate(&mut self, row: Row) {
        self(row)
    }
}

// Region row
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Row {
    pub left: u32,
    pub right: u32,
    pub y: u32,
}

impl Row {
    fn ends(&self) -> [Point; 2] {
        let y = self.y as i32;
        [Point::new(self.left as i32, y), Point::new(self.right as i32, y)]
    }
}

// Area of a region in pixels
//------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Area(pub u32);

impl Accumulator for Area {
    fn accumulate(&mut self, row: Row) {
        self.0 += row.right - row.left + 1;
    }
}

// Corner finders
// Only the end points of each row are candidates, since corners of a convex region always lie on
// its left or right boundary.
//------------------------------------------------------------------------------

// Point of the region farthest from a reference point
pub struct FarthestPoint {
    refp: Point,
    score: i64,
    pub best: Point,
}

impl FarthestPoint {
    pub fn new(refp: Point) -> Self {
        Self { refp, score: -1, best: refp }
    }
}

impl Accumulator for FarthestPoint {
    fn accumulate(&mut self, row: Row) {
        for p in row.ends() {
            let d = p.dist_sq(&self.refp);
            if d > self.score {
                self.score = d;
                self.best = p;
            }
        }
    }
}

// Four extreme points of a region along an axis and its perpendicular. Given a reference direction
// pointing at the first corner, the rest are found clockwise.
pub struct QuadCorners {
    dir: Slope,
    scores: [i64; 4],
    pub corners: [Point; 4],
}

impl QuadCorners {
    pub fn new(seed: Point, dir: Slope) -> Self {
        let (up, right) = Self::project(&dir, &seed);
        Self { dir, scores: [up, right, -up, -right], corners: [seed; 4] }
    }

    fn project(dir: &Slope, p: &Point) -> (i64, i64) {
        let (x, y, dx, dy) = (p.x as i64, p.y as i64, dir.dx as i64, dir.dy as i64);
        (x * dx + y * dy, x * -dy + y * dx)
    }
}

impl Accumulator for QuadCorners {
    fn accumulate(&mut self, row: Row) {
        for p in row.ends() {
            let (up, right) = Self::project(&self.dir, &p);
            let scores = [up, right, -up, -right];
            for (i, s) in scores.into_iter().enumerate() {
                if s > self.scores[i] {
                    self.scores[i] = s;
                    self.corners[i] = p;
                }
            }
        }
    }
}

// Point of the region lying farthest to the left of a directed line
pub struct LeftmostToLine {
    dir: Slope,
    score: i64,
    pub best: Point,
}

impl LeftmostToLine {
    pub fn new(seed: Point, dir: Slope) -> Self {
        let score = dir.side(&Point::default(), &seed);
        Self { dir, score, best: seed }
    }
}

impl Accumulator for LeftmostToLine {
    fn accumulate(&mut self, row: Row) {
        for p in row.ends() {
            let d = self.dir.side(&Point::default(), &p);
            if d < self.score {
                self.score = d;
                self.best = p;
            }
        }
    }
}
