use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    common::error::QRResult,
    config::GenerateOptions,
    render::{encode_png, generate},
};

// Batch entry
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    #[serde(default)]
    pub name: Option<String>,
    pub content: String,
}

impl BatchEntry {
    pub fn new(content: impl Into<String>) -> Self {
        Self { name: None, content: content.into() }
    }

    pub fn named(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self { name: Some(name.into()), content: content.into() }
    }

    // `index` is the position of the entry in the input, starting at 0
    pub fn file_name(&self, index: usize) -> String {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => format!("qr_{name}.png"),
            None => format!("qr_{}.png", index + 1),
        }
    }
}

// Batch output
//------------------------------------------------------------------------------

#[derive(Debug)]
pub struct BatchItem<T> {
    pub file_name: String,
    pub result: QRResult<T>,
}

// Bulk generation
//------------------------------------------------------------------------------

/// Generates a code per entry in parallel. Entries with empty content are skipped; every other
/// entry gets its own result, in input order.
#[instrument(skip_all, fields(entries = entries.len()))]
pub fn generate_batch(entries: &[BatchEntry], opts: &GenerateOptions) -> Vec<BatchItem<RgbaImage>> {
    let items = entries
        .par_iter()
        .enumerate()
        .filter(|(_, e)| !e.content.is_empty())
        .map(|(i, e)| BatchItem { file_name: e.file_name(i), result: generate(&e.content, opts) })
        .collect::<Vec<_>>();

    debug!(generated = items.iter().filter(|it| it.result.is_ok()).count(), "Batch finished");
    items
}

/// Same as [`generate_batch`] with every image encoded as PNG
pub fn generate_batch_png(entries: &[BatchEntry], opts: &GenerateOptions) -> Vec<BatchItem<Vec<u8>>> {
    generate_batch(entries, opts)
        .into_par_iter()
        .map(|BatchItem { file_name, result }| BatchItem {
            file_name,
            result: result.and_then(|img| encode_png(&img)),
        })
        .collect()
}

#[cfg(test)]
mod batch_tests {
    use super::{generate_batch, generate_batch_png, BatchEntry};
    use crate::{common::error::QRError, config::GenerateOptions};

    #[test]
    fn test_file_names() {
        assert_eq!(BatchEntry::named("alice", "x").file_name(0), "qr_alice.png");
        assert_eq!(BatchEntry::new("x").file_name(4), "qr_5.png");
        assert_eq!(BatchEntry::named("", "x").file_name(1), "qr_2.png");
    }

    #[test]
    fn test_batch_skips_empty_and_keeps_order() {
        let entries = [
            BatchEntry::named("a", "first"),
            BatchEntry::new(""),
            BatchEntry::new("third"),
            BatchEntry::named("big", "x".repeat(3000)),
        ];
        let mut opts = GenerateOptions::default();
        opts.output_size(120);

        let items = generate_batch(&entries, &opts);
        let names = items.iter().map(|it| it.file_name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["qr_a.png", "qr_3.png", "qr_big.png"]);

        assert_eq!(items[0].result.as_ref().unwrap().dimensions(), (120, 120));
        assert!(items[1].result.is_ok());
        assert!(matches!(items[2].result, Err(QRError::EncodingTooLarge { .. })));
    }

    #[test]
    fn test_batch_png() {
        let entries = [BatchEntry::new("one"), BatchEntry::new("two")];
        let mut opts = GenerateOptions::default();
        opts.output_size(64);

        let items = generate_batch_png(&entries, &opts);
        assert_eq!(items.len(), 2);
        for it in items {
            assert_eq!(&it.result.unwrap()[..4], b"\x89PNG");
        }
    }

    #[test]
    fn test_batch_empty_input() {
        assert!(generate_batch(&[], &GenerateOptions::default()).is_empty());
    }
}
