use std::marker::PhantomData;

// Point
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn dist_sq(&self, other: &Point) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

impl From<(u32, u32)> for Point {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x: x as i32, y: y as i32 }
    }
}

// Slope
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct Slope {
    pub dx: i32,
    pub dy: i32,
}

impl Slope {
    pub fn new(from: &Point, to: &Point) -> Self {
        Self { dx: to.x - from.x, dy: to.y - from.y }
    }

    // Signed distance of p from the line through origin along this slope, scaled by its length.
    // Negative values lie to the left when y grows downwards.
    pub fn side(&self, origin: &Point, p: &Point) -> i64 {
        (p.x - origin.x) as i64 * -(self.dy as i64) + (p.y - origin.y) as i64 * self.dx as i64
    }
}

// Line represented as Ax + By + C = 0
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Line {
    a: i64,
    b: i64,
    c: i64,
}

impl Line {
    pub fn new(s: &Point, e: &Point) -> Self {
        let (sx, sy, ex, ey) = (s.x as i64, s.y as i64, e.x as i64, e.y as i64);
        let a = -(ey - sy);
        let b = ex - sx;
        let c = sx * ey - sy * ex;
        Self { a, b, c }
    }

    pub fn intersection(&self, other: &Line) -> Option<Point> {
        let den = self.a * other.b - self.b * other.a;
        if den == 0 {
            return None;
        }
        let x = (self.b * other.c - self.c * other.b) / den;
        let y = (self.c * other.a - self.a * other.c) / den;

        Some(Point { x: i32::try_from(x).ok()?, y: i32::try_from(y).ok()? })
    }
}


// Bresenham line scan algorithm
// Yields every point from start to end, both inclusive
//------------------------------------------------------------------------------

pub trait Axis {}

pub struct X;
impl Axis for X {}

pub struct Y;
impl Axis for Y {}

#[derive(Debug, Clone)]
pub struct BresenhamLine<A: Axis> {
    cur: Point,
    end: Point,
    m: Slope,
    // (xi, yi) unit increment
    inc: (i32, i32),
    err: i32,
    done: bool,
    phantom: PhantomData<A>,
}

impl<A: Axis> BresenhamLine<A> {
    pub fn new(from: &Point, to: &Point) -> Self {
        let dx = (to.x - from.x).abs();
        let dy = (to.y - from.y).abs();
        let m = Slope { dx: 2 * dx, dy: 2 * dy };

        let xi = if to.x > from.x { 1 } else { -1 };
        let yi = if to.y > from.y { 1 } else { -1 };

        let err = if dy < dx { 2 * dy - dx } else { 2 * dx - dy };

        Self { cur: *from, end: *to, m, inc: (xi, yi), err, done: false, phantom: PhantomData }
    }
}

impl Iterator for BresenhamLine<X> {
    type Item = Point;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let res = self.cur;
        if self.cur.x == self.end.x {
            self.done = true;
            return Some(res);
        }

        if self.err > 0 {
            self.cur.y += self.inc.1;
            self.err -= self.m.dx;
        }
        self.err += self.m.dy;
        self.cur.x += self.inc.0;

        Some(res)
    }
}

impl Iterator for BresenhamLine<Y> {
    type Item = Point;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let res = self.cur;
        if self.cur.y == self.end.y {
            self.done = true;
            return Some(res);
        }

        if self.err > 0 {
            self.cur.x += self.inc.0;
            self.err -= self.m.dy;
        }
        self.err += self.m.dx;
        self.cur.y += self.inc.1;

        Some(res)
    }
}
