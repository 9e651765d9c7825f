pub mod boundary;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod git;
pub mod lens;
pub mod plan;
pub mod platform;
pub mod snapshot;
pub mod template;
pub mod ui;
pub mod version;

pub use error::{BumpError, Result};
