//! Page retrieval through an external HTML-to-text converter.

use ask_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Marker appended to text cut at the word limit.
pub const TRUNCATION_MARKER: &str = " ...";

/// Placeholder replaced by the page URL in a converter command line.
const URL_PLACEHOLDER: &str = "{url}";

/// Retrieves a page as plain text.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> AppResult<String>;
}

/// Fetches pages by running a converter such as `lynx -dump -nolist <url>`
/// and keeping at most `word_limit` words of its output.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    program: PathBuf,
    args: Vec<String>,
    word_limit: usize,
    timeout: Option<Duration>,
}

impl ContentFetcher {
    /// Create a fetcher for the given converter command line.
    ///
    /// The program is resolved on `PATH` here, so a missing converter is
    /// reported before any page is requested.
    pub fn new(command: &[String], word_limit: usize) -> AppResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| AppError::Config("Converter command is empty".to_string()))?;

        let program = resolve_program(program).ok_or_else(|| {
            AppError::Config(format!(
                "HTML-to-text converter '{}' was not found on PATH",
                program
            ))
        })?;

        tracing::debug!("Using page converter {:?}", program);

        Ok(Self {
            program,
            args: args.to_vec(),
            word_limit,
            timeout: None,
        })
    }

    /// Bound each conversion by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn command_args(&self, url: &str) -> Vec<String> {
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(URL_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(URL_PLACEHOLDER, url)
                } else {
                    arg.clone()
                }
            })
            .collect();

        if !substituted {
            args.push(url.to_string());
        }
        args
    }
}

#[async_trait::async_trait]
impl PageFetcher for ContentFetcher {
    async fn fetch(&self, url: &str) -> AppResult<String> {
        tracing::debug!("Fetching {}", url);

        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(self.command_args(url))
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);

        let pending = command.output();
        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, pending).await.map_err(|_| {
                AppError::Fetch(format!("Fetching {} timed out after {:?}", url, timeout))
            })?,
            None => pending.await,
        }
        .map_err(|e| AppError::Fetch(format!("Failed to run converter for {}: {}", url, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Fetch(format!(
                "Converter exited with {} for {}: {}",
                output.status,
                url,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(truncate_words(&text, self.word_limit))
    }
}

/// Keep at most `limit` whitespace-separated words of `text`.
///
/// Text within the limit is returned unchanged. Longer text is rejoined
/// with single spaces and gets [`TRUNCATION_MARKER`] appended.
pub fn truncate_words(text: &str, limit: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(limit).collect();

    if words.next().is_none() {
        return text.to_string();
    }

    let mut truncated = kept.join(" ");
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|full| is_executable(full))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_truncate_within_limit_is_unchanged() {
        assert_eq!(truncate_words("one  two\nthree", 3), "one  two\nthree");
        assert_eq!(truncate_words("", 3), "");
    }

    #[test]
    fn test_truncate_over_limit_appends_marker() {
        assert_eq!(truncate_words("a b c d e", 3), "a b c ...");
        assert_eq!(truncate_words("a\n\nb   c", 2), "a b ...");
    }

    #[test]
    fn test_missing_converter_is_config_error() {
        let err =
            ContentFetcher::new(&cmd(&["definitely-not-a-real-converter-xyz"]), 10).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_empty_command_is_config_error() {
        assert!(matches!(ContentFetcher::new(&[], 10), Err(AppError::Config(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_url_appended_or_substituted() {
        let fetcher = ContentFetcher::new(&cmd(&["sh", "-dump"]), 10).unwrap();
        assert_eq!(fetcher.command_args("https://x.example"), cmd(&["-dump", "https://x.example"]));

        let fetcher = ContentFetcher::new(&cmd(&["sh", "--url={url}", "-q"]), 10).unwrap();
        assert_eq!(
            fetcher.command_args("https://x.example"),
            cmd(&["--url=https://x.example", "-q"])
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fetch_runs_converter_and_truncates() {
        let fetcher =
            ContentFetcher::new(&cmd(&["sh", "-c", "echo one two three four $0", "{url}"]), 3)
                .unwrap();

        let text = fetcher.fetch("five").await.unwrap();
        assert_eq!(text, "one two three ...");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fetch_failure_is_fetch_error() {
        let fetcher =
            ContentFetcher::new(&cmd(&["sh", "-c", "echo boom >&2; exit 3", "{url}"]), 3).unwrap();

        let err = fetcher.fetch("https://x.example").await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(msg) if msg.contains("boom")));
    }
}
