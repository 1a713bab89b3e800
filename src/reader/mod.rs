pub mod binarize;
pub mod finder;
pub mod symbol;
pub mod utils;

use image::GrayImage;
use tracing::{debug, instrument, trace};

use crate::common::{
    bitstream::BitStream,
    codec::decode,
    ec::Block,
    error::{QRError, QRResult},
};
use binarize::BinaryImage;
use finder::{group_finders, locate_capstones};
use symbol::{Symbol, SymbolLocation};

// Detection
//------------------------------------------------------------------------------

/// Finds every symbol in the image whose format info could be read. Finders are only consumed by
/// a group once its symbol has been located, so a spurious group doesn't hide a real one.
#[instrument(skip_all, fields(w = img.width(), h = img.height()))]
pub fn detect_qr(img: &GrayImage) -> Vec<Symbol> {
    let mut bin = BinaryImage::prepare(img);
    let capstones = locate_capstones(&mut bin);
    let mut grouped = vec![false; capstones.len()];
    let mut symbols = Vec::new();

    for i in 0..capstones.len() {
        if grouped[i] {
            continue;
        }
        let Some((ids, group)) = group_finders(&capstones, i, &grouped) else { continue };
        let Some(loc) = SymbolLocation::locate(&mut bin, &group) else { continue };

        match Symbol::read(&bin, &loc) {
            Ok(symbol) => {
                trace!(version = *symbol.version(), corners = ?symbol.corners(), "Symbol located");
                ids.iter().for_each(|&id| grouped[id] = true);
                symbols.push(symbol);
            }
            Err(e) => trace!(error = %e, "Discarding finder group"),
        }
    }

    debug!(capstones = capstones.len(), symbols = symbols.len(), "Detection finished");
    symbols
}

// Decoding
//------------------------------------------------------------------------------

impl Symbol {
    pub fn decode(&self) -> QRResult<String> {
        let (ver, ecl) = (self.version(), self.ec_level());
        let payload = self.extract_payload();

        let blk_info = ver.data_codewords_per_block(ecl);
        let ec_len = ver.ecc_per_block(ecl);
        let mut blocks = deinterleave(payload.data(), blk_info, ec_len);

        let mut enc = BitStream::new(ver.data_bit_capacity(ecl));
        for b in blocks.iter_mut() {
            enc.extend(b.rectify()?);
        }

        let msg = decode(&mut enc, ver)?;
        debug!(version = *ver, ec_level = ?ecl, mask = *self.mask(), len = msg.len(), "Symbol decoded");
        Ok(msg)
    }
}

// Inverse of interleaving. Short blocks come first and long blocks carry one extra data codeword.
fn deinterleave(
    data: &[u8],
    blk_info: (usize, usize, usize, usize),
    ec_len: usize,
) -> Vec<Block> {
    // b1s = block1_size, b1c = block1_count
    let (b1s, b1c, b2s, b2c) = blk_info;

    let total_blks = b1c + b2c;
    let spl = b1s * total_blks;
    let data_sz = b1s * b1c + b2s * b2c;

    let mut dilvd = vec![Vec::with_capacity(b2s.max(b1s) + ec_len); total_blks];

    // Deinterleaving data
    data[..spl]
        .chunks(total_blks)
        .for_each(|ch| ch.iter().enumerate().for_each(|(i, v)| dilvd[i].push(*v)));
    if b2c > 0 {
        data[spl..data_sz]
            .chunks(b2c)
            .for_each(|ch| ch.iter().enumerate().for_each(|(i, v)| dilvd[b1c + i].push(*v)));
    }

    // Deinterleaving ecc
    data[data_sz..data_sz + ec_len * total_blks]
        .chunks(total_blks)
        .for_each(|ch| ch.iter().enumerate().for_each(|(i, v)| dilvd[i].push(*v)));

    dilvd.iter().map(|b| Block::with_encoded(b, b.len() - ec_len)).collect()
}

// Reader
//------------------------------------------------------------------------------

pub struct QRReader;

impl QRReader {
    /// Decodes the first readable symbol in the image
    pub fn read(img: &GrayImage) -> QRResult<String> {
        let mut first_err = None;
        for symbol in detect_qr(img) {
            match symbol.decode() {
                Ok(msg) => return Ok(msg),
                Err(e) => {
                    debug!(error = %e, "Failed to decode symbol");
                    first_err.get_or_insert(e);
                }
            }
        }
        Err(first_err.unwrap_or(QRError::SymbolNotFound))
    }
}
