//! # qrkit
//!
//! Generate styled QR codes, optionally with a circular logo in the centre, and find and decode
//! QR codes in photographs.
//!
//! ## Features
//!
//! - **Generation**: Error correction level H with the smallest version that fits the payload,
//!   custom colors, fixed output size and an optional round logo overlay
//! - **Scanning**: Adaptive binarization, finder detection, perspective correction and
//!   Reed-Solomon decoding, with the detected symbol outlined on the returned image
//! - **Payload templates**: Student, business, menu, payment and analytics layouts
//! - **Bulk generation**: Parallel generation of many codes with per entry results
//!
//! ## Quick Start
//!
//! ### Generating a QR Code
//!
//! ```rust
//! use qrkit::{encode_png, generate, GenerateOptions, Paint};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut opts = GenerateOptions::default();
//! opts.foreground("navy".parse::<Paint>()?).output_size(300);
//!
//! let img = generate("https://example.com", &opts)?;
//! assert_eq!(img.dimensions(), (300, 300));
//! let png = encode_png(&img)?;
//! # let _ = png;
//! # Ok(())
//! # }
//! ```
//!
//! ### Scanning a QR Code
//!
//! ```rust
//! use qrkit::{encode_png, generate, scan, GenerateOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let png = encode_png(&generate("Hello, world!", &GenerateOptions::default())?)?;
//!
//! let res = scan(&png)?;
//! assert_eq!(res.text.as_deref(), Some("Hello, world!"));
//! assert!(res.is_located());
//! # Ok(())
//! # }
//! ```
//!
//! ### Payload Templates
//!
//! ```rust
//! use qrkit::payload::{StudentProfile, Template};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let student = StudentProfile {
//!     prn: "12345".into(),
//!     name: "Jane Doe".into(),
//!     department: "Physics".into(),
//!     year: "2".into(),
//!     ..Default::default()
//! };
//! let text = student.render(None)?;
//! assert!(text.starts_with("STUDENT PROFILE\nPRN: 12345"));
//! # Ok(())
//! # }
//! ```
//!
//! ### Lower Level Access
//!
//! ```rust
//! use qrkit::{ECLevel, MaskPattern, QRBuilder, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let qr = QRBuilder::new(b"Hello, world!")
//!     .version(Version::new(2)?)   // Smallest fitting version if not provided
//!     .ec_level(ECLevel::M)        // Defaults to ECLevel::H
//!     .mask(MaskPattern::new(3))   // Lowest penalty mask if not provided
//!     .build()?;
//! assert_eq!(qr.width(), 25);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Correction Levels
//! - **L (Low)**: ~7% error correction
//! - **M (Medium)**: ~15% error correction
//! - **Q (Quartile)**: ~25% error correction
//! - **H (High)**: ~30% error correction, used by [`generate`] so a logo can cover modules

#![allow(
    clippy::items_after_test_module,
    clippy::suspicious_arithmetic_impl,
    clippy::suspicious_op_assign_impl
)]

pub mod batch;
pub mod builder;
pub(crate) mod common;
pub mod config;
pub mod payload;
pub mod reader;
pub mod render;
pub mod scan;

pub use batch::{generate_batch, generate_batch_png, BatchEntry, BatchItem};
pub use builder::{Module, QRBuilder, QR};
pub use common::error::{QRError, QRResult};
pub use common::mask::MaskPattern;
pub use common::metadata::{Color, ECLevel, Version};
pub use config::{GenerateOptions, Paint};
pub use reader::{detect_qr, utils::geometry::Point, QRReader};
pub use render::{encode_png, generate};
pub use scan::{scan, scan_image, ScanResult};
