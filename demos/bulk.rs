use std::{error::Error, fs, path::Path};

use qrkit::{generate_batch_png, BatchEntry, GenerateOptions};
use tracing_subscriber::EnvFilter;

// cargo run --example bulk -- entries.json out_dir
//
// entries.json holds `[{"name": "alice", "content": "..."}, ...]`
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut args = std::env::args().skip(1);
    let input = args.next().ok_or("usage: bulk <entries.json> [out_dir]")?;
    let out_dir = args.next().unwrap_or_else(|| "qr_codes".to_string());

    let entries: Vec<BatchEntry> = serde_json::from_str(&fs::read_to_string(input)?)?;
    fs::create_dir_all(&out_dir)?;

    let mut saved = 0;
    for item in generate_batch_png(&entries, &GenerateOptions::default()) {
        match item.result {
            Ok(png) => {
                fs::write(Path::new(&out_dir).join(&item.file_name), png)?;
                saved += 1;
            }
            Err(e) => eprintln!("Skipping {}: {e}", item.file_name),
        }
    }

    println!("Saved {saved} of {} QR codes to: {out_dir}", entries.len());
    Ok(())
}
