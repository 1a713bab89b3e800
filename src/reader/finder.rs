use tracing::trace;

use crate::common::metadata::Color;

use super::{
    binarize::BinaryImage,
    utils::{
        accumulate::{FarthestPoint, QuadCorners},
        geometry::{Point, Slope},
        homography::Homography,
    },
};

// Line scanner to detect finder line
//------------------------------------------------------------------------------

// **   ******   **  <- Finder line
// ^    ^        ^
// left |        right
//      stone
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct LineScanner {
    // Lengths of the last five completed runs
    buffer: [u32; 5],
    run_len: u32,
    prev: Option<Color>,
    // Count of color changes
    flips: u32,
}

impl LineScanner {
    fn new() -> Self {
        Self { buffer: [0; 5], run_len: 0, prev: None, flips: 0 }
    }

    // Returns the last five runs when a dark run has just ended and they are in the 1:1:3:1:1
    // ratio. The caller's position is then the first pixel after the right edge of the ring.
    fn advance(&mut self, color: Color) -> Option<[u32; 5]> {
        let mut res = None;

        if self.prev.is_some_and(|p| p != color) {
            self.buffer.rotate_left(1);
            self.buffer[4] = self.run_len;
            self.run_len = 0;
            self.flips += 1;

            if color == Color::Light && self.flips >= 5 && self.is_finder_line() {
                res = Some(self.buffer);
            }
        }

        self.run_len += 1;
        self.prev = Some(color);
        res
    }

    fn is_finder_line(&self) -> bool {
        const RATIO: [i64; 5] = [1, 1, 3, 1, 1];

        let b = self.buffer.map(i64::from);
        let avg = (b[0] + b[1] + b[3] + b[4]) / 4;
        let tol = avg * 3 / 4;

        RATIO.iter().zip(b).all(|(r, rl)| r * avg - tol <= rl && rl <= r * avg + tol)
    }
}


// Capstone
// Finder pattern seen as a dark ring region enclosing a separate dark stone region
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Capstone {
    pub ring: usize,
    pub stone: usize,
    // Outer corners of the ring, clockwise
    pub corners: [Point; 4],
    pub center: Point,
    // Maps the 7x7 module square of the finder onto the image
    pub h: Homography,
}

impl Capstone {
    fn new(ring: usize, stone: usize, corners: [Point; 4]) -> Option<Self> {
        let h = Homography::from_rect(&corners, 7.0, 7.0).ok()?;
        let center = h.map(3.5, 3.5).ok()?;
        Some(Self { ring, stone, corners, center, h })
    }

    // Rotates corners so the first one is the farthest to the left of the directed line
    fn rotate(&mut self, origin: &Point, dir: &Slope) -> Option<()> {
        let mut best = 0;
        let mut best_score = i64::MAX;
        for (i, c) in self.corners.iter().enumerate() {
            let score = dir.side(origin, c);
            if score < best_score {
                best = i;
                best_score = score;
            }
        }

        self.corners.rotate_left(best);
        self.h = Homography::from_rect(&self.corners, 7.0, 7.0).ok()?;
        Some(())
    }
}

// Locate finders
//------------------------------------------------------------------------------

/// Scans every row for 1:1:3:1:1 runs and returns the validated capstones
pub fn locate_capstones(img: &mut BinaryImage) -> Vec<Capstone> {
    let mut capstones = Vec::new();

    for y in 0..img.h {
        let mut scanner = LineScanner::new();
        for x in 0..img.w {
            let color = img.get(x, y).map_or(Color::Light, Color::from);
            if let Some(runs) = scanner.advance(color) {
                capstones.extend(test_capstone(img, x, y, &runs));
            }
        }

        // Handles finders touching the right edge of the image
        if let Some(runs) = scanner.advance(Color::Light) {
            capstones.extend(test_capstone(img, img.w, y, &runs));
        }
    }

    trace!(count = capstones.len(), "Located capstones");
    capstones
}

// Checks multiple conditions to ensure the finder is valid
// 1. Left and right ends of the line belong to the same ring region
// 2. Ring and stone regions aren't connected
// 3. Neither region was already claimed by another finder
// 4. Area of stone region is roughly 37.5% of ring region
fn test_capstone(img: &mut BinaryImage, x: u32, y: u32, runs: &[u32; 5]) -> Option<Capstone> {
    let ring_right_x = x - runs[4];
    let stone_x = ring_right_x - runs[3] - runs[2];
    let ring_left_x = stone_x - runs[1] - runs[0];
    let y_i = y as i32;

    let ring_right = img.region_at(&Point::new(ring_right_x as i32, y_i))?;
    let stone = img.region_at(&Point::new(stone_x as i32, y_i))?;
    let ring = img.region_at(&Point::new(ring_left_x as i32, y_i))?;

    if ring != ring_right || ring == stone {
        return None;
    }

    let (ring_reg, stone_reg) = (img.region(ring), img.region(stone));
    if ring_reg.is_finder || stone_reg.is_finder {
        return None;
    }

    let ratio = stone_reg.area * 100 / ring_reg.area;
    if !(10..=70).contains(&ratio) {
        return None;
    }

    img.region_mut(ring).is_finder = true;
    img.region_mut(stone).is_finder = true;

    let stone_seed = Point::from(img.region(stone).seed);
    let corners = find_region_corners(img, ring, stone_seed);
    Capstone::new(ring, stone, corners)
}

// The ring corner farthest from the stone fixes the orientation; the remaining corners are the
// extreme points along that direction and its perpendicular.
fn find_region_corners(img: &mut BinaryImage, id: usize, refp: Point) -> [Point; 4] {
    let far = img.walk_region(id, FarthestPoint::new(refp));
    let dir = Slope::new(&refp, &far.best);
    let seed = Point::from(img.region(id).seed);
    img.walk_region(id, QuadCorners::new(seed, dir)).corners
}

#[cfg(test)]
mod finder_tests {
    use image::{DynamicImage, GrayImage, Rgba};

    use super::locate_capstones;
    use crate::{
        builder::QRBuilder,
        common::{
            mask::MaskPattern,
            metadata::{ECLevel, Version},
        },
        reader::{binarize::BinaryImage, utils::geometry::Point},
    };

    pub(crate) fn qr_image(data: &str, ver: usize, module_sz: u32) -> GrayImage {
        let qr = QRBuilder::new(data.as_bytes())
            .version(Version::new(ver).unwrap())
            .ec_level(ECLevel::L)
            .mask(MaskPattern::new(1))
            .build()
            .unwrap();
        let img = qr.render(module_sz, 4, Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 255]));
        DynamicImage::ImageRgba8(img).to_luma8()
    }

    #[test]
    fn test_locate_finder() {
        let img = qr_image("Hello, world!🌎", 4, 10);
        let mut bin = BinaryImage::prepare(&img);
        let caps = locate_capstones(&mut bin);

        let centres = [Point::new(75, 75), Point::new(335, 75), Point::new(75, 335)];
        for exp in centres {
            let found = caps
                .iter()
                .any(|c| (c.center.x - exp.x).abs() <= 1 && (c.center.y - exp.y).abs() <= 1);
            assert!(found, "No capstone centred at {exp:?}");
        }

        let tl = caps.iter().find(|c| c.center.dist_sq(&Point::new(75, 75)) <= 2).unwrap();
        let mut corners = tl.corners.to_vec();
        corners.sort_by_key(|p| (p.y, p.x));
        assert_eq!(
            corners,
            [Point::new(40, 40), Point::new(109, 40), Point::new(40, 109), Point::new(109, 109)]
        );
    }

    #[test]
    fn test_no_finder_in_blank_image() {
        let img = GrayImage::from_pixel(200, 200, image::Luma([255]));
        let mut bin = BinaryImage::prepare(&img);
        assert!(locate_capstones(&mut bin).is_empty());
    }
}

// Groups finders in 3, which form potential symbols
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FinderGroup {
    // [BL, TL, TR], each rotated so its first corner is the top left one w.r.t. the symbol
    pub finders: [Capstone; 3],
    // Direction of the hypotenuse from the bottom left to the top right finder
    pub hyp: Slope,
}

impl FinderGroup {
    // b is the corner finder. a and c are swapped if needed so that a-b-c runs clockwise.
    fn new(a: &Capstone, b: &Capstone, c: &Capstone) -> Option<Self> {
        let (mut a, b, mut c) = (a.clone(), b.clone(), c.clone());
        let origin = a.center;
        let mut hyp = Slope::new(&a.center, &c.center);

        if hyp.side(&origin, &b.center) > 0 {
            std::mem::swap(&mut a, &mut c);
            hyp = Slope { dx: -hyp.dx, dy: -hyp.dy };
        }

        let mut finders = [a, b, c];
        for f in finders.iter_mut() {
            f.rotate(&origin, &hyp)?;
        }

        Some(Self { finders, hyp })
    }
}

// Below diagram shows the capstones of a group
// ****************************              ****************************
// ****************************              ****************************
// ****                   *****              *****                   ****
// ****    ************   *****              *****   ************    ****
// ****    *****TL*****   *****  ---- u --->  *****   *****TR*****    ****
// ****    ************   *****              *****   ************    ****
// ****                   *****              *****                   ****
// ****************************              ****************************
// ****************************              ****************************
//              |
//              v
// ****************************
// ****************************
// ****                   *****
// ****    ************   *****
// ****    *****BL*****   *****
// ****    ************   *****
// ****                   *****
// ****************************
// ****************************
//
// Other capstones are unmapped into the grid space of capstone i. Those lying close to its u axis
// or v axis are neighbour candidates. The pair whose distances are the most alike wins.
pub fn group_finders(
    capstones: &[Capstone],
    i: usize,
    grouped: &[bool],
) -> Option<([usize; 3], FinderGroup)> {
    let c1 = &capstones[i];
    let mut hlist = Vec::new();
    let mut vlist = Vec::new();

    for (j, c2) in capstones.iter().enumerate() {
        if i == j || grouped[j] {
            continue;
        }

        let (u, v) = c1.h.unmap(&c2.center);
        let (u, v) = ((u - 3.5).abs(), (v - 3.5).abs());

        if u < 0.2 * v {
            hlist.push((j, v));
        }
        if v < 0.2 * u {
            vlist.push((j, u));
        }
    }

    let mut best: Option<(usize, usize, f64)> = None;
    for &(hj, hd) in hlist.iter() {
        for &(vj, vd) in vlist.iter() {
            let score = (1.0 - hd / vd).abs();
            if score > 2.5 {
                continue;
            }
            if best.map_or(true, |(_, _, s)| score < s) {
                best = Some((hj, vj, score));
            }
        }
    }

    let (h, v, _) = best?;
    let group = FinderGroup::new(&capstones[h], c1, &capstones[v])?;
    Some(([h, i, v], group))
}

#[cfg(test)]
mod group_finders_tests {
    use super::{finder_tests::qr_image, group_finders, locate_capstones};
    use crate::reader::{binarize::BinaryImage, utils::geometry::Point};

    fn near(p: &Point, x: i32, y: i32) -> bool {
        (p.x - x).abs() <= 1 && (p.y - y).abs() <= 1
    }

    #[test]
    fn test_group_finder() {
        let img = qr_image("Hello, world!🌎", 4, 10);
        let mut bin = BinaryImage::prepare(&img);
        let caps = locate_capstones(&mut bin);
        let grouped = vec![false; caps.len()];

        let tl = caps.iter().position(|c| near(&c.center, 75, 75)).unwrap();
        let (_, group) = group_finders(&caps, tl, &grouped).expect("No group found");
        let [bl, tl, tr] = &group.finders;

        assert!(near(&bl.center, 75, 335));
        assert!(near(&tl.center, 75, 75));
        assert!(near(&tr.center, 335, 75));

        // First corner of every finder is its top left one
        assert_eq!(tl.corners[0], Point::new(40, 40));
        assert_eq!(tr.corners[0], Point::new(300, 40));
        assert_eq!(bl.corners[0], Point::new(40, 300));
        assert_eq!(bl.corners[1], Point::new(109, 300));
        assert_eq!(tr.corners[3], Point::new(300, 109));
    }

    #[test]
    fn test_group_rotated_symbol() {
        let img = image::imageops::rotate90(&qr_image("rotated", 2, 8));
        let mut bin = BinaryImage::prepare(&img);
        let caps = locate_capstones(&mut bin);
        let grouped = vec![false; caps.len()];

        // Clockwise rotation moves the symbol's top left finder to the top right of the image
        let half = img.width() as i32 / 2;
        let found = (0..caps.len()).filter_map(|i| group_finders(&caps, i, &grouped)).any(|(_, g)| {
            let [bl, tl, tr] = g.finders.map(|f| f.center);
            bl.x < half && bl.y < half && tl.x > half && tl.y < half && tr.x > half && tr.y > half
        });
        assert!(found, "Rotated symbol not grouped");
    }
}
