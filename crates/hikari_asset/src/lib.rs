mod asset;
mod config;
mod db;
mod error;
mod events;
mod handle;
mod hot_reload;
mod io;
mod load;
mod manager;
mod pipeline;
mod record;
mod registry;
mod status;

#[cfg(test)]
mod test_utils;

pub use asset::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use handle::*;
pub use io::*;
pub use load::*;
pub use manager::*;
pub use record::AssetInfo;
pub use registry::*;
pub use status::*;

pub use hikari_handle::AssetId;
pub use hikari_path::PathError;
