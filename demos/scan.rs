use std::error::Error;

use qrkit::scan;
use tracing_subscriber::EnvFilter;

// cargo run --example scan -- photo.jpg
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).ok_or("usage: scan <image>")?;
    let res = scan(&std::fs::read(&path)?)?;

    match (&res.text, &res.corners) {
        (Some(text), _) => println!("Decoded message from {path}:\n{text}"),
        (None, Some(corners)) => println!("QR code found in {path} at {corners:?} but could not be decoded"),
        (None, None) => println!("No QR code found in the image: {path}"),
    }

    if res.is_located() {
        res.image.save("annotated.png")?;
        println!("Annotated image saved to: annotated.png");
    }
    Ok(())
}
