pub mod accumulate;
pub mod geometry;
pub mod homography;
