use std::cmp;

use image::GrayImage;

use crate::common::metadata::Color;

use super::utils::{
    accumulate::{Accumulator, Area, Row},
    geometry::Point,
};

// Pixel
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Pixel {
    Unvisited(Color),
    // Contains id of associated region
    Visited(usize, Color),
    // Temporary tag while a labelled region is walked
    Marked(usize, Color),
}

impl From<Pixel> for Color {
    fn from(p: Pixel) -> Self {
        match p {
            Pixel::Unvisited(c) | Pixel::Visited(_, c) | Pixel::Marked(_, c) => c,
        }
    }
}

// Region
//------------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Region {
    pub seed: (u32, u32),
    pub area: u32,
    // Already claimed as ring or stone of a finder
    pub is_finder: bool,
}

// Adaptive threshold
// Each row is scanned in both directions, alternating the direction between rows, keeping an
// exponentially decaying moving average over a window of w/8 pixels. A pixel is dark when it is at
// most 95% of the mean of both averages at its position.
//------------------------------------------------------------------------------

const THRESHOLD_BIAS: u64 = 5;

fn threshold(img: &GrayImage) -> Vec<Pixel> {
    let (w, h) = img.dimensions();
    let win = cmp::max(w / 8, 1) as u64;
    let den = 200 * win;
    let mut u_avg = 0u64;
    let mut v_avg = 0u64;
    let mut row_avg = vec![0u64; w as usize];
    let mut buffer = Vec::with_capacity((w * h) as usize);

    for y in 0..h {
        row_avg.fill(0);
        for x in 0..w {
            let (u, v) = if y & 1 == 0 { (x, w - 1 - x) } else { (w - 1 - x, x) };
            let (pu, pv) = (img.get_pixel(u, y)[0] as u64, img.get_pixel(v, y)[0] as u64);

            u_avg = u_avg * (win - 1) / win + pu;
            v_avg = v_avg * (win - 1) / win + pv;
            row_avg[u as usize] += u_avg;
            row_avg[v as usize] += v_avg;
        }

        for x in 0..w {
            let p = img.get_pixel(x, y)[0] as u64;
            // Equality counts as dark so that pure black survives a zero threshold
            let dark = p * den <= row_avg[x as usize] * (100 - THRESHOLD_BIAS);
            buffer.push(Pixel::Unvisited(Color::from(dark)));
        }
    }

    buffer
}

// Image type for reader
//------------------------------------------------------------------------------

#[derive(Debug)]
pub struct BinaryImage {
    buffer: Vec<Pixel>,
    regions: Vec<Region>,
    pub w: u32,
    pub h: u32,
}

impl BinaryImage {
    /// Performs adaptive binarization on a luma image
    pub fn prepare(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let buffer = threshold(img);
        Self { buffer, regions: Vec::new(), w, h }
    }

    #[cfg(test)]
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.w, self.h, |x, y| {
            let c = Color::from(self.buffer[(y * self.w + x) as usize]);
            image::Luma([c.select(0, 255)])
        })
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.w + x) as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.w || y >= self.h {
            return None;
        }
        Some(self.buffer[self.index(x, y)])
    }

    fn set(&mut self, x: u32, y: u32, px: Pixel) {
        let idx = self.index(x, y);
        self.buffer[idx] = px;
    }

    // Color at a point, or None if it lies outside the image
    pub fn color_at(&self, pt: &Point) -> Option<Color> {
        let x = u32::try_from(pt.x).ok()?;
        let y = u32::try_from(pt.y).ok()?;
        self.get(x, y).map(Color::from)
    }

    pub fn region(&self, id: usize) -> &Region {
        &self.regions[id]
    }

    pub fn region_mut(&mut self, id: usize) -> &mut Region {
        &mut self.regions[id]
    }

    /// Id of the dark region containing the point. Regions are labelled lazily on first access.
    /// Light pixels and points outside the image have no region.
    pub fn region_at(&mut self, pt: &Point) -> Option<usize> {
        let x = u32::try_from(pt.x).ok()?;
        let y = u32::try_from(pt.y).ok()?;

        match self.get(x, y)? {
            Pixel::Visited(id, _) | Pixel::Marked(id, _) => Some(id),
            Pixel::Unvisited(Color::Light) => None,
            Pixel::Unvisited(color) => {
                let id = self.regions.len();
                let area = self.fill_and_accumulate((x, y), Pixel::Visited(id, color), Area(0));
                self.regions.push(Region { seed: (x, y), area: area.0, is_finder: false });
                Some(id)
            }
        }
    }

    /// Feeds every row of a labelled region to the accumulator, leaving the labels intact
    pub fn walk_region<A: Accumulator>(&mut self, id: usize, acc: A) -> A {
        let seed = self.regions[id].seed;
        let color = match self.get(seed.0, seed.1) {
            Some(Pixel::Visited(rid, c)) if rid == id => c,
            _ => return acc,
        };

        let acc = self.fill_and_accumulate(seed, Pixel::Marked(id, color), acc);
        let _ = self.fill_and_accumulate(seed, Pixel::Visited(id, color), |_: Row| ());
        acc
    }

    /// Fills the 4-connected area around src having the same pixel value with target. Every
    /// filled horizontal span is reported to the accumulator exactly once.
    pub fn fill_and_accumulate<A: Accumulator>(
        &mut self,
        src: (u32, u32),
        target: Pixel,
        mut acc: A,
    ) -> A {
        let from = match self.get(src.0, src.1) {
            Some(px) if px != target => px,
            _ => return acc,
        };

        let (w, h) = (self.w, self.h);
        let mut stack = vec![src];

        while let Some((x, y)) = stack.pop() {
            // Seed may have been filled through another span since it was pushed
            if self.buffer[self.index(x, y)] != from {
                continue;
            }

            let mut left = x;
            while left > 0 && self.buffer[self.index(left - 1, y)] == from {
                left -= 1;
            }
            let mut right = x;
            while right + 1 < w && self.buffer[self.index(right + 1, y)] == from {
                right += 1;
            }

            for i in left..=right {
                self.set(i, y, target);
            }
            acc.accumulate(Row { left, right, y });

            let above = y.checked_sub(1);
            let below = if y + 1 < h { Some(y + 1) } else { None };
            for ny in [above, below].into_iter().flatten() {
                let mut in_run = false;
                for i in left..=right {
                    let matches = self.buffer[self.index(i, ny)] == from;
                    if matches && !in_run {
                        stack.push((i, ny));
                    }
                    in_run = matches;
                }
            }
        }

        acc
    }
}
