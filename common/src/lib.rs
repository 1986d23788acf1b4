pub mod dtos;
pub mod download;
pub mod generation;
pub mod metrics;
pub mod models;
pub mod persistence;
pub mod render;
pub mod util;
