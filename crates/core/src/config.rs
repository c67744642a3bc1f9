//! Configuration management for the ask pipeline.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - A YAML config file (`--config`, `ASK_CONFIG`, or `<config dir>/ask/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources override earlier ones.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Main application configuration.
///
/// One instance is built by the top-level caller and passed by reference
/// to every pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider ("openai" or "ollama")
    pub provider: String,

    /// Model used for the user-facing answer
    pub model: String,

    /// Low-cost model used for classification and query rewriting
    pub fast_model: String,

    /// Optional provider base URL override
    pub endpoint: Option<String>,

    /// API key for the LLM provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature for the answer call
    pub temperature: f32,

    /// Maximum tokens generated for the answer call
    pub max_tokens: u32,

    /// Caller-level timeout applied to every remote round-trip
    pub request_timeout_secs: u64,

    /// Search provider settings
    pub search: SearchSettings,

    /// Page fetching settings
    pub fetch: FetchSettings,

    /// Chunk ranking settings
    pub ranking: RankingSettings,

    /// Thumbnail rendering settings
    pub render: RenderSettings,

    /// Optional directory with prompt overrides (`<id>.yml`)
    pub prompts_dir: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchSettings {
    /// SearXNG base URL
    pub endpoint: String,

    /// Maximum text results requested per query
    pub text_results: usize,

    /// Maximum image results requested per query
    pub image_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8888".to_string(),
            text_results: 8,
            image_results: 3,
        }
    }
}

/// Page fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FetchSettings {
    /// HTML-to-text converter command line; the URL is appended, or
    /// substituted for a `{url}` argument when one is present
    pub converter: Vec<String>,

    /// Maximum words kept from a converted page
    pub word_limit: usize,

    /// Number of results fetched and ranked at the same time
    pub concurrency: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            converter: vec!["lynx".to_string(), "-dump".to_string(), "-nolist".to_string()],
            word_limit: 1000,
            concurrency: 1,
        }
    }
}

/// Chunk ranking settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingSettings {
    /// Chunk size in characters
    pub chunk_size: usize,

    /// Embedding provider: "trigram", "ollama" or "fastembed"
    pub embedding_provider: String,

    /// Embedding model identifier (provider-specific)
    pub embedding_model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Embedding provider base URL (used by "ollama")
    pub embedding_endpoint: Option<String>,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 8000,
            embedding_provider: "fastembed".to_string(),
            embedding_model: "all-minilm-l6-v2".to_string(),
            dimensions: 384,
            embedding_endpoint: None,
        }
    }
}

/// Thumbnail rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderSettings {
    /// Terminal image renderer command line; the image path is appended
    pub command: Vec<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            command: vec!["chafa".to_string(), "--size=60x30".to_string()],
        }
    }
}

/// Full configuration file structure. Every field is optional so a file
/// only needs to mention what it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    llm: Option<LlmSection>,
    search: Option<SearchSection>,
    fetch: Option<FetchSection>,
    ranking: Option<RankingSection>,
    render: Option<RenderSection>,
    prompts: Option<PromptsSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    fast_model: Option<String>,
    endpoint: Option<String>,
    api_key_env: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSection {
    endpoint: Option<String>,
    text_results: Option<usize>,
    image_results: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchSection {
    converter: Option<Vec<String>>,
    word_limit: Option<usize>,
    concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankingSection {
    chunk_size: Option<usize>,
    embedding_provider: Option<String>,
    embedding_model: Option<String>,
    dimensions: Option<usize>,
    embedding_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RenderSection {
    command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PromptsSection {
    dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            fast_model: "gpt-4o-mini".to_string(),
            endpoint: None,
            api_key: None,
            temperature: 0.7,
            max_tokens: 1024,
            request_timeout_secs: 60,
            search: SearchSettings::default(),
            fetch: FetchSettings::default(),
            ranking: RankingSettings::default(),
            render: RenderSettings::default(),
            prompts_dir: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and the environment.
    ///
    /// Environment variables:
    /// - `ASK_CONFIG`: Path to config file
    /// - `ASK_PROVIDER`: LLM provider
    /// - `ASK_MODEL`: Answer model
    /// - `ASK_FAST_MODEL`: Classifier/rewriter model
    /// - `ASK_ENDPOINT`: Provider base URL
    /// - `ASK_API_KEY`, then `OPENAI_API_KEY`: API key
    /// - `ASK_SEARXNG_URL`: Search provider base URL
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use ask_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Model: {}", config.model);
    /// ```
    pub fn load(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        config.config_file =
            config_file.or_else(|| std::env::var("ASK_CONFIG").ok().map(PathBuf::from));

        let explicit = config.config_file.is_some();
        let config_path = config.config_file.clone().or_else(default_config_path);

        let mut api_key_env = None;
        if let Some(path) = config_path {
            if path.exists() {
                api_key_env = config.merge_yaml(&path)?;
            } else if explicit {
                return Err(AppError::Config(format!(
                    "Config file does not exist: {:?}",
                    path
                )));
            }
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("ASK_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("ASK_MODEL") {
            config.model = model;
        }

        if let Ok(fast_model) = std::env::var("ASK_FAST_MODEL") {
            config.fast_model = fast_model;
        }

        if let Ok(endpoint) = std::env::var("ASK_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }

        if let Ok(searxng) = std::env::var("ASK_SEARXNG_URL") {
            config.search.endpoint = searxng;
        }

        config.api_key = std::env::var("ASK_API_KEY")
            .ok()
            .or_else(|| api_key_env.and_then(|var| std::env::var(var).ok()))
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    ///
    /// Returns the name of the environment variable holding the API key, if
    /// the file names one.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<Option<String>> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merging config file {:?}", path);

        Ok(self.apply_file(file))
    }

    fn apply_file(&mut self, file: ConfigFile) -> Option<String> {
        let mut api_key_env = None;

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                self.provider = provider;
            }
            if let Some(model) = llm.model {
                self.model = model;
            }
            if let Some(fast_model) = llm.fast_model {
                self.fast_model = fast_model;
            }
            if llm.endpoint.is_some() {
                self.endpoint = llm.endpoint;
            }
            if let Some(temperature) = llm.temperature {
                self.temperature = temperature;
            }
            if let Some(max_tokens) = llm.max_tokens {
                self.max_tokens = max_tokens;
            }
            if let Some(timeout) = llm.timeout {
                self.request_timeout_secs = timeout;
            }
            api_key_env = llm.api_key_env;
        }

        if let Some(search) = file.search {
            if let Some(endpoint) = search.endpoint {
                self.search.endpoint = endpoint;
            }
            if let Some(n) = search.text_results {
                self.search.text_results = n;
            }
            if let Some(n) = search.image_results {
                self.search.image_results = n;
            }
        }

        if let Some(fetch) = file.fetch {
            if let Some(converter) = fetch.converter {
                self.fetch.converter = converter;
            }
            if let Some(limit) = fetch.word_limit {
                self.fetch.word_limit = limit;
            }
            if let Some(concurrency) = fetch.concurrency {
                self.fetch.concurrency = concurrency;
            }
        }

        if let Some(ranking) = file.ranking {
            if let Some(size) = ranking.chunk_size {
                self.ranking.chunk_size = size;
            }
            if let Some(provider) = ranking.embedding_provider {
                self.ranking.embedding_provider = provider;
            }
            if let Some(model) = ranking.embedding_model {
                self.ranking.embedding_model = model;
            }
            if let Some(dimensions) = ranking.dimensions {
                self.ranking.dimensions = dimensions;
            }
            if ranking.embedding_endpoint.is_some() {
                self.ranking.embedding_endpoint = ranking.embedding_endpoint;
            }
        }

        if let Some(command) = file.render.and_then(|r| r.command) {
            self.render.command = command;
        }

        if let Some(dir) = file.prompts.and_then(|p| p.dir) {
            self.prompts_dir = Some(PathBuf::from(dir));
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        api_key_env
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the file and the environment.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate configuration before any remote call is made.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.provider == "openai" && self.api_key.is_none() {
            return Err(AppError::Config(
                "API key not found. Set ASK_API_KEY or OPENAI_API_KEY".to_string(),
            ));
        }

        if self.fetch.word_limit == 0 {
            return Err(AppError::Config("fetch.wordLimit must be positive".to_string()));
        }

        if self.ranking.chunk_size == 0 {
            return Err(AppError::Config("ranking.chunkSize must be positive".to_string()));
        }

        if self.search.text_results == 0 || self.search.image_results == 0 {
            return Err(AppError::Config(
                "search result counts must be positive".to_string(),
            ));
        }

        if self.fetch.converter.is_empty() {
            return Err(AppError::Config("fetch.converter cannot be empty".to_string()));
        }

        if self.render.command.is_empty() {
            return Err(AppError::Config("render.command cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// `<config dir>/ask/config.yaml`, when the platform has a config dir.
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ask").join("config.yaml"))
}
