mod decoder;
mod encoder;
mod types;

pub use decoder::decode;
pub use encoder::{encode, encode_with_version};
pub use types::Mode;

// Codec proptesting
//------------------------------------------------------------------------------
