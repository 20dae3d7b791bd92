#[macro_use]
extern crate log;

pub mod batch;
pub mod config;
pub mod ehentai;
pub mod error;
pub mod fetch;
pub mod xpath;

pub use crate::config::Config;
pub use crate::ehentai::{EhApi, Gallery};
pub use crate::error::{Error, Result};
