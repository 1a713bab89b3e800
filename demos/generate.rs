use std::error::Error;

use qrkit::{
    generate,
    payload::{StudentProfile, Template},
    GenerateOptions, Paint,
};
use tracing_subscriber::EnvFilter;

// cargo run --example generate -- [logo.png]
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let profile = StudentProfile {
        prn: "12345".into(),
        name: "Jane Doe".into(),
        department: "Computer Science".into(),
        year: "2024-25".into(),
        ..Default::default()
    };
    let payload = profile.render(Some(&chrono::Local::now().naive_local()))?;

    let mut opts = GenerateOptions::default();
    opts.foreground("navy".parse::<Paint>()?).output_size(600);
    if let Some(path) = std::env::args().nth(1) {
        opts.logo(std::fs::read(path)?);
    }

    let img = generate(&payload, &opts)?;
    img.save("student_qr.png")?;

    println!("QR code saved to: student_qr.png");
    Ok(())
}
