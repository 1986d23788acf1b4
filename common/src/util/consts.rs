pub const NAME: &str = "whisperwynd";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SERVICE_NAME: &str = "Image Generator";
