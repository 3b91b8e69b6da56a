pub mod geojson;
pub mod raster;
pub mod world_file;

pub use raster::{encode_image, load_raster};
pub use world_file::{find_world_file, read_world_file, write_world_file};
