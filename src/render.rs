use std::io::Cursor;

use image::{
    imageops::{self, FilterType},
    ImageFormat, RgbaImage,
};
use tracing::{debug, instrument};

use crate::{
    builder::{QRBuilder, QR},
    common::{
        error::{QRError, QRResult},
        metadata::ECLevel,
    },
    config::GenerateOptions,
};

// Generate
//------------------------------------------------------------------------------

/// Encodes `payload` at error correction level H into a square RGBA image of
/// `opts.output_size` pixels, with the optional logo pasted in the centre.
///
/// The smallest version that holds the payload is chosen. Payloads beyond the
/// capacity of a version 40 symbol fail with [`QRError::EncodingTooLarge`].
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use qrkit::{generate, GenerateOptions};
///
/// let img = generate("STUDENT PROFILE\nPRN: 12345", &GenerateOptions::default())?;
/// assert_eq!(img.dimensions(), (600, 600));
/// # Ok(())
/// # }
/// ```
#[instrument(skip_all, fields(len = payload.len(), size = opts.output_size))]
pub fn generate(payload: &str, opts: &GenerateOptions) -> QRResult<RgbaImage> {
    opts.validate()?;

    let qr = QRBuilder::new(payload.as_bytes()).ec_level(ECLevel::H).build()?;
    let img = rasterize(&qr, opts);
    let mut img = resize(img, opts.output_size);

    if let Some(logo) = &opts.logo {
        overlay_logo(&mut img, logo)?;
    }

    Ok(img)
}

pub fn rasterize(qr: &QR, opts: &GenerateOptions) -> RgbaImage {
    let (fg, bg) = (opts.foreground.to_rgba(), opts.background.to_rgba());
    qr.render(opts.box_size, opts.border, fg, bg)
}

// Nearest neighbour keeps module edges crisp
pub fn resize(img: RgbaImage, size: u32) -> RgbaImage {
    if img.dimensions() == (size, size) {
        return img;
    }
    debug!(from = img.width(), to = size, "Resizing symbol");
    imageops::resize(&img, size, size, FilterType::Nearest)
}

// Logo
//------------------------------------------------------------------------------

/// Decodes `logo`, scales it to a quarter of the canvas side and pastes the
/// disc inscribed in it at the centre of `canvas`. Pixels outside the disc are
/// left untouched.
pub fn overlay_logo(canvas: &mut RgbaImage, logo: &[u8]) -> QRResult<()> {
    let logo = image::load_from_memory(logo).map_err(QRError::InvalidLogoImage)?.to_rgba8();

    let size = canvas.width().min(canvas.height());
    let logo_sz = size / 4;
    if logo_sz == 0 {
        return Ok(());
    }
    let logo = imageops::resize(&logo, logo_sz, logo_sz, FilterType::Lanczos3);
    let (off_x, off_y) = ((canvas.width() - logo_sz) / 2, (canvas.height() - logo_sz) / 2);
    debug!(logo_sz, off_x, off_y, "Pasting logo");

    for (x, y, px) in logo.enumerate_pixels() {
        if in_circle(x, y, logo_sz) {
            canvas.put_pixel(off_x + x, off_y + y, *px);
        }
    }

    Ok(())
}

// Whether the centre of pixel (x, y) lies in the disc inscribed in a side x side square
pub(crate) fn in_circle(x: u32, y: u32, side: u32) -> bool {
    let r = side as f32 / 2.0;
    let dx = x as f32 + 0.5 - r;
    let dy = y as f32 + 0.5 - r;
    dx * dx + dy * dy <= r * r
}

// Png
//------------------------------------------------------------------------------

pub fn encode_png(img: &RgbaImage) -> QRResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).map_err(QRError::Png)?;
    Ok(buf.into_inner())
}
