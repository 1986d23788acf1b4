mod common;
pub use common::*;

pub mod s3;
pub mod tempfiles;
