mod handler;
mod model;

pub use handler::map_config;
pub use model::MapConfig;
