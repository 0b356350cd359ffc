pub mod cluster;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod filter;
pub mod heat;
pub mod kpi;
pub mod loader;
pub mod models;
pub mod panel;
pub mod popup;
pub mod spatial;
pub mod state;
pub mod surface;
pub mod view_mode;

#[cfg(test)]
mod testing;

pub use controller::MapController;
pub use error::{MapError, Result};
