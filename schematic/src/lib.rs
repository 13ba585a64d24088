mod config;
pub use config::Config;

mod error;
pub use error::{Error, ExportError, ImportError, Result, StoreError, TargetError};

pub mod export;
pub mod frontend;
pub mod import;
pub mod ratelimiter;
pub mod store;
pub mod target;
