pub mod curve_fit;
pub mod geometry;
pub mod stats;
