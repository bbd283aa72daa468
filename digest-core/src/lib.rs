pub mod config;
pub mod error;
pub mod error_utils;
pub mod judgment;
pub mod types;

pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use judgment::*;
pub use types::*;
