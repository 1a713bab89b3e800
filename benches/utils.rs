use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::path::Path;

pub fn is_image_file(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_file()
        && entry
            .path()
            .extension()
            .map(|e| matches!(e.to_str(), Some("png" | "jpg" | "jpeg" | "bmp")))
            .unwrap_or(false)
}

pub fn get_parent(path: &Path) -> String {
    path.parent().and_then(|p| p.file_name()).and_then(|s| s.to_str()).unwrap().to_string()
}

// Expected text sits next to the image with a .txt extension
pub fn parse_expected_text(path: &Path) -> Option<String> {
    let exp = std::fs::read_to_string(path).ok()?;
    Some(exp.trim_end_matches(['\r', '\n']).replace("\r\n", "\n"))
}

pub fn median(runtimes: &mut [u128]) -> u128 {
    if runtimes.is_empty() {
        return 0;
    }
    runtimes.sort_unstable();
    let mid = runtimes.len() / 2;
    if runtimes.len() % 2 == 1 {
        runtimes[mid]
    } else {
        (runtimes[mid - 1] + runtimes[mid]) / 2
    }
}

pub fn average(runtimes: &[u128]) -> u128 {
    if runtimes.is_empty() {
        return 0;
    }
    runtimes.iter().sum::<u128>() / runtimes.len() as u128
}

pub fn print_table<N>(result: &HashMap<String, HashMap<String, N>>, rows: &[&str], columns: &[&str])
where
    N: Display + Debug + Default,
{
    let cell_w = 15;
    let df = N::default();
    let divider = "-".repeat(columns.len() * (cell_w + 2) + 1);

    println!("{divider}");
    let mut header = String::from("| ");
    for c in columns {
        header.push_str(&format!("{c:<cell_w$}| "));
    }
    println!("{header}");
    println!("{divider}");

    for hr in rows {
        let Some(r) = result.get(*hr) else { continue };
        let mut row = format!("| {hr:<cell_w$}| ");

        for c in columns.iter().skip(1) {
            let cell = r.get(*c).unwrap_or(&df);
            row.push_str(&format!("{:<cell_w$.2}| ", cell));
        }

        println!("{row}");
    }

    println!("{divider}");
}

#[allow(dead_code)]
fn main() {}
