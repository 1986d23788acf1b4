use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::Duration,
};

use tracing::info;
use wait_timeout::ChildExt;

use crate::persistence::tempfiles::TempJobFileProvider;

use super::IPdfRenderer;

pub const LIBRE: &str = "/usr/bin/soffice";

/// Renders through a headless LibreOffice process per document.
pub struct LibreOfficeRenderer {
    pub binary: PathBuf,
    pub timeout: Duration,
}

/// Inserts a `<base>` element so relative image and stylesheet links resolve
/// against the caller's host.
pub fn with_base(html: &str, base_url: &str) -> String {
    let lower = html.to_ascii_lowercase();
    if base_url.is_empty() || lower.contains("<base ") {
        return html.to_string();
    }
    let base = format!("<base href=\"{}\">", base_url.replace('"', "&quot;"));
    let head_end = lower
        .match_indices("<head")
        .map(|(start, _)| start)
        .find(|start| matches!(lower.as_bytes().get(start + 5), Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n')))
        .and_then(|start| lower[start..].find('>').map(|end| start + end + 1));
    match head_end {
        Some(position) => format!("{}{}{}", &html[..position], base, &html[position..]),
        None => format!("{}{}", base, html),
    }
}

fn convert(binary: &Path, source: &Path, out_dir: &Path, timeout: Duration) -> Result<PathBuf, &'static str> {
    let result_path = out_dir.join(source.file_name().ok_or("Missing source name")?).with_extension("pdf");
    let mut child = Command::new(binary)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg(source.as_os_str())
        .arg("--outdir")
        .arg(out_dir.as_os_str())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|_| "Could not start libre")?;

    let status_code = match child.wait_timeout(timeout).map_err(|_| "Could not wait on libre")? {
        Some(status) => status.code(),
        None => {
            child.kill().map_err(|_| "Could not kill libre")?;
            child.wait().map_err(|_| "Could not wait for libre")?;
            return Err("Rendering timed out");
        }
    };
    match status_code {
        Some(0) => Ok(result_path),
        code => {
            info!("Libre failed with '{:?}'", code);
            Err("Could not render html")
        }
    }
}

impl LibreOfficeRenderer {
    async fn render_in(&self, files: &TempJobFileProvider, html: &str, base_url: &str) -> Result<Vec<u8>, &'static str> {
        let source = files.get_named_path("document.html");
        tokio::fs::write(&source, with_base(html, base_url)).await.map_err(|_| "Could not write html")?;
        let out_dir = files.get_path();
        tokio::fs::create_dir_all(&out_dir).await.map_err(|_| "Could not create output directory")?;

        let binary = self.binary.clone();
        let timeout = self.timeout;
        let result_path = tokio::task::spawn_blocking(move || convert(&binary, &source, &out_dir, timeout))
            .await
            .map_err(|_| "Rendering task failed")??;
        let bytes = tokio::fs::read(&result_path).await.map_err(|_| "Could not read rendered pdf")?;
        if !bytes.starts_with(b"%PDF") {
            return Err("Renderer did not produce a pdf");
        }
        info!("Rendered pdf is {} KiB", bytes.len() / 1024);
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl IPdfRenderer for LibreOfficeRenderer {
    async fn render(&self, html: &str, base_url: &str) -> Result<Vec<u8>, &'static str> {
        let files = TempJobFileProvider::build("render").await?;
        let result = self.render_in(&files, html, base_url).await;
        files.clean_up().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_goes_into_head() {
        let html = "<html><HEAD><title>t</title></HEAD><body/></html>";
        assert_eq!(with_base(html, "http://host/"), "<html><HEAD><base href=\"http://host/\"><title>t</title></HEAD><body/></html>");
    }

    #[test]
    fn base_is_prepended_without_head() {
        assert_eq!(with_base("<h1>Hi</h1>", "http://host/"), "<base href=\"http://host/\"><h1>Hi</h1>");
        assert_eq!(with_base("<header>x</header>", "http://h/"), "<base href=\"http://h/\"><header>x</header>");
    }

    #[test]
    fn existing_base_is_kept() {
        let html = "<head><base href=\"http://other/\"></head>";
        assert_eq!(with_base(html, "http://host/"), html);
        assert_eq!(with_base("<p/>", ""), "<p/>");
    }

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let renderer = LibreOfficeRenderer {
            binary: PathBuf::from("/nonexistent/soffice"),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(renderer.render("<p/>", "http://host/").await, Err("Could not start libre"));
    }
}
