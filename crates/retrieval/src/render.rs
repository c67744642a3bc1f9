//! Terminal rendering of image thumbnails.

use ask_core::{AppError, AppResult};
use std::io::Write;
use std::time::Duration;

/// Shows an image to the user.
#[async_trait::async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn render(&self, image_url: &str) -> AppResult<()>;
}

/// Downloads a thumbnail to a temporary file and hands its path to a
/// terminal image viewer such as `chafa`.
pub struct TerminalImageRenderer {
    command: Vec<String>,
    timeout: Option<Duration>,
    client: reqwest::Client,
}

impl TerminalImageRenderer {
    pub fn new(command: Vec<String>) -> AppResult<Self> {
        if command.is_empty() {
            return Err(AppError::Config("Image renderer command is empty".to_string()));
        }
        Ok(Self {
            command,
            timeout: None,
            client: reqwest::Client::new(),
        })
    }

    /// Bound the download by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn download(&self, image_url: &str) -> AppResult<Vec<u8>> {
        let pending = async {
            let response = self
                .client
                .get(image_url)
                .send()
                .await
                .map_err(|e| AppError::Fetch(format!("Failed to download {}: {}", image_url, e)))?;

            if !response.status().is_success() {
                return Err(AppError::Fetch(format!(
                    "Image download failed ({}): {}",
                    response.status(),
                    image_url
                )));
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| AppError::Fetch(format!("Failed to read {}: {}", image_url, e)))
        };

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, pending).await.map_err(|_| {
                AppError::Fetch(format!("Image download timed out after {:?}", timeout))
            })?,
            None => pending.await,
        }
    }

    async fn show_file(&self, path: &std::path::Path) -> AppResult<()> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| AppError::Config("Image renderer command is empty".to_string()))?;

        let status = tokio::process::Command::new(program)
            .args(args)
            .arg(path)
            .stdin(std::process::Stdio::null())
            .status()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    AppError::Config(format!("Image renderer '{}' was not found on PATH", program))
                }
                _ => AppError::Io(e),
            })?;

        if !status.success() {
            return Err(AppError::Other(format!("Image renderer exited with {}", status)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ImageRenderer for TerminalImageRenderer {
    async fn render(&self, image_url: &str) -> AppResult<()> {
        tracing::debug!("Rendering thumbnail {}", image_url);

        let bytes = self.download(image_url).await?;

        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&bytes)?;
        file.flush()?;

        // The temporary file is removed when `file` drops
        self.show_file(file.path()).await
    }
}
