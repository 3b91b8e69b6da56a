pub mod segmentation;
pub mod denoise;
pub mod extraction;
pub mod selection;
pub mod hull;

pub use segmentation::*;
pub use denoise::*;
pub use extraction::*;
pub use selection::*;
pub use hull::HullBuilder;
