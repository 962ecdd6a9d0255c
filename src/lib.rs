pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod format;
pub mod session;
pub mod suggest;

#[cfg(test)]
mod test_utils;

pub use error::{CheetahError, Result};
