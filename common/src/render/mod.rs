mod libre;
pub use libre::*;

#[async_trait::async_trait]
pub trait IPdfRenderer: Send + Sync {
    /// Renders an HTML document to PDF bytes. Relative links resolve against `base_url`.
    async fn render(&self, html: &str, base_url: &str) -> Result<Vec<u8>, &'static str>;
}
