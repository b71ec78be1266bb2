//! Persistence for the GMapCatcher configuration file.
//!
//! [`MapConf`] owns the application's [`Settings`] and keeps them in sync with
//! `~/.GMapCatcher/gmapcatcher.conf`.

pub mod config;
pub mod error;
pub mod store;

pub use config::Settings;
pub use error::{AppError, AppResult};
pub use store::MapConf;
