pub mod pipeline;

pub use pipeline::{load_data_dir, read_json, Pipeline};
