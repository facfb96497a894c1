#[macro_use] extern crate serde_derive;

pub mod common;
pub mod console;
pub mod engine;
pub mod error;
pub mod focus;
pub mod pagination;
pub mod pool;
pub mod registry;
#[cfg(feature = "rtsp")]
pub mod rtsp;
pub mod session;
pub mod settings;
pub mod viewer;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
