use std::collections::HashMap;
use std::time::Instant;

use image::DynamicImage;
use rand::{distr::Alphanumeric, Rng};

use qrkit::{generate, generate_batch, scan_image, BatchEntry, GenerateOptions};

mod utils;
use utils::*;

const PER_BUCKET: usize = 32;

fn random_payload(rng: &mut impl Rng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

// Times generation and the scan back per payload length, sequentially and as one batch
fn benchmark() {
    let mut rng = rand::rng();
    let opts = GenerateOptions::default();
    let mut results = HashMap::<String, HashMap<String, u128>>::new();

    for len in [16, 64, 256, 1024] {
        let payloads = (0..PER_BUCKET).map(|_| random_payload(&mut rng, len)).collect::<Vec<_>>();
        let mut gen_times = Vec::with_capacity(PER_BUCKET);
        let mut scan_times = Vec::with_capacity(PER_BUCKET);
        let mut decoded = 0;

        for p in payloads.iter() {
            let start = Instant::now();
            let img = generate(p, &opts).unwrap();
            gen_times.push(start.elapsed().as_micros());

            let start = Instant::now();
            let res = scan_image(&DynamicImage::ImageRgba8(img));
            scan_times.push(start.elapsed().as_micros());
            if res.text.as_deref() == Some(p.as_str()) {
                decoded += 1;
            }
        }

        let entries = payloads.into_iter().map(BatchEntry::new).collect::<Vec<_>>();
        let start = Instant::now();
        let generated = generate_batch(&entries, &opts).iter().filter(|it| it.result.is_ok()).count();
        let batch_time = start.elapsed().as_micros();

        let row = results.entry(len.to_string()).or_default();
        row.insert("decoded".to_string(), decoded);
        row.insert("batch_ok".to_string(), generated as u128);
        row.insert("gen_median".to_string(), median(&mut gen_times));
        row.insert("scan_median".to_string(), median(&mut scan_times));
        row.insert("batch_time".to_string(), batch_time);
        row.insert("seq_time".to_string(), gen_times.iter().sum());
    }

    let rows = ["16", "64", "256", "1024"];
    let cols = ["Length", "decoded", "batch_ok", "gen_median", "scan_median", "seq_time", "batch_time"];

    println!("\nResult ({PER_BUCKET} payloads per length, times in µs):");
    print_table(&results, &rows, &cols);
}

fn main() {
    let start = Instant::now();
    benchmark();
    println!("Time elapsed: {:?}", start.elapsed());
}
