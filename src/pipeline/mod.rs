pub mod geo;
pub mod interpolate;
pub mod load;
pub mod rasterize;
pub mod render;
