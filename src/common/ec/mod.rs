mod block;
mod decoder;
mod encoder;
mod galois;

pub use block::Block;
pub use decoder::rectify_info;
pub use encoder::blockify;

pub const MAX_BLOCK_SIZE: usize = 256;

pub const MAX_EC_SIZE: usize = 64;
