pub mod center;
pub mod codec;
pub mod paths;
pub mod settings;

pub use center::MapCenter;
pub use codec::Document;
pub use paths::{ConfigPaths, ensure_dir, resolve_config_path};
pub use settings::{GpsMode, Layer, RepositoryType, Settings, StatusLocation};
