use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use tracing::{debug, instrument};

use crate::{
    common::error::{QRError, QRResult},
    reader::{detect_qr, symbol::Symbol, utils::geometry::Point},
};

const ANNOTATION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

// Scan result
//------------------------------------------------------------------------------

/// Outcome of scanning an image.
///
/// `corners` is set once a symbol is located, i.e. its format info could be read, even if the
/// payload itself could not be decoded. `image` is then an RGB copy of the input with the
/// symbol outlined; otherwise it is the input untouched.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub text: Option<String>,
    /// Outer corners clockwise from the top left of the symbol
    pub corners: Option<[Point; 4]>,
    pub image: DynamicImage,
}

impl ScanResult {
    pub fn is_located(&self) -> bool {
        self.corners.is_some()
    }
}

// Scan
//------------------------------------------------------------------------------

/// Decodes an encoded image (PNG, JPEG, ...) and scans it for a QR code.
///
/// Finding no symbol is not an error; only undecodable input is.
#[instrument(skip_all, fields(len = bytes.len()))]
pub fn scan(bytes: &[u8]) -> QRResult<ScanResult> {
    let img = image::load_from_memory(bytes).map_err(QRError::InvalidImage)?;
    Ok(scan_image(&img))
}

/// Scans an already decoded image. The first symbol that decodes wins; failing that, the first
/// located symbol is outlined without text.
#[instrument(skip_all, fields(w = img.width(), h = img.height()))]
pub fn scan_image(img: &DynamicImage) -> ScanResult {
    let symbols = detect_qr(&img.to_luma8());

    let mut best: Option<(&Symbol, Option<String>)> = None;
    for symbol in symbols.iter() {
        match symbol.decode() {
            Ok(text) => {
                best = Some((symbol, Some(text)));
                break;
            }
            Err(e) => {
                debug!(error = %e, "Located symbol could not be decoded");
                best.get_or_insert((symbol, None));
            }
        }
    }

    let Some((symbol, text)) = best else {
        debug!("No symbol found");
        return ScanResult { text: None, corners: None, image: img.clone() };
    };

    let corners = symbol.corners();
    let mut canvas = img.to_rgb8();
    annotate(&mut canvas, &corners);
    debug!(decoded = text.is_some(), ?corners, "Symbol annotated");

    ScanResult { text, corners: Some(corners), image: DynamicImage::ImageRgb8(canvas) }
}

// Closed polyline through the corners, 3 pixels wide
fn annotate(canvas: &mut RgbImage, corners: &[Point; 4]) {
    for (i, a) in corners.iter().enumerate() {
        let b = corners[(i + 1) % 4];
        for dy in -1..=1 {
            for dx in -1..=1 {
                let start = ((a.x + dx) as f32, (a.y + dy) as f32);
                let end = ((b.x + dx) as f32, (b.y + dy) as f32);
                draw_line_segment_mut(canvas, start, end, ANNOTATION_COLOR);
            }
        }
    }
}
