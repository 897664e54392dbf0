pub mod config;
pub mod error;
pub mod evidence;
pub mod report;
pub mod severity;
pub mod types;

pub use config::Config;
pub use error::FloodWatchError;
pub use evidence::*;
pub use report::*;
pub use severity::*;
pub use types::*;
