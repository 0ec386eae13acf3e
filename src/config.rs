use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use repo_context_core::models::{HISTORY_TURNS, MAX_CONTENT_CHARS, MAX_FILES};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitHubConfig {
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_github_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_github_timeout_secs(),
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_user_agent() -> String {
    concat!("repo-context/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_github_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrawlConfig {
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Directory names never descended into.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_content_chars: default_max_content_chars(),
            skip_dirs: default_skip_dirs(),
        }
    }
}

fn default_max_files() -> usize {
    MAX_FILES
}
fn default_max_content_chars() -> usize {
    MAX_CONTENT_CHARS
}
fn default_skip_dirs() -> Vec<String> {
    [
        "node_modules",
        "vendor",
        "dist",
        "build",
        ".git",
        "__pycache__",
        "venv",
        "env",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    #[serde(default = "default_chat_readme_chars")]
    pub chat_readme_chars: usize,
    #[serde(default = "default_analysis_readme_chars")]
    pub analysis_readme_chars: usize,
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
    #[serde(default = "default_activity_limit")]
    pub commit_limit: usize,
    #[serde(default = "default_activity_limit")]
    pub pull_request_limit: usize,
    #[serde(default = "default_listing_limit")]
    pub pr_files_limit: usize,
    #[serde(default = "default_listing_limit")]
    pub fallback_entries: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            chat_readme_chars: default_chat_readme_chars(),
            analysis_readme_chars: default_analysis_readme_chars(),
            history_turns: default_history_turns(),
            commit_limit: default_activity_limit(),
            pull_request_limit: default_activity_limit(),
            pr_files_limit: default_listing_limit(),
            fallback_entries: default_listing_limit(),
        }
    }
}

fn default_chat_readme_chars() -> usize {
    1000
}
fn default_analysis_readme_chars() -> usize {
    2000
}
fn default_history_turns() -> usize {
    HISTORY_TURNS
}
fn default_activity_limit() -> usize {
    5
}
fn default_listing_limit() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_model_api_url")]
    pub api_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_url: default_model_api_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_model_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_model_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_model_timeout_secs() -> u64 {
    60
}

impl ModelConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate a TOML configuration string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate crawl
    if config.crawl.max_files == 0 {
        anyhow::bail!("crawl.max_files must be > 0");
    }
    if config.crawl.max_content_chars == 0 {
        anyhow::bail!("crawl.max_content_chars must be > 0");
    }

    // Validate context
    let context = &config.context;
    for (name, value) in [
        ("chat_readme_chars", context.chat_readme_chars),
        ("analysis_readme_chars", context.analysis_readme_chars),
        ("history_turns", context.history_turns),
        ("commit_limit", context.commit_limit),
        ("pull_request_limit", context.pull_request_limit),
        ("pr_files_limit", context.pr_files_limit),
        ("fallback_entries", context.fallback_entries),
    ] {
        if value == 0 {
            anyhow::bail!("context.{} must be > 0", name);
        }
    }

    if config.github.api_url.trim().is_empty() {
        anyhow::bail!("github.api_url must not be empty");
    }
    if config.github.timeout_secs == 0 {
        anyhow::bail!("github.timeout_secs must be > 0");
    }
    if config.model.timeout_secs == 0 {
        anyhow::bail!("model.timeout_secs must be > 0");
    }

    match config.model.provider.as_str() {
        "disabled" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown model provider: '{}'. Must be disabled or gemini.",
            other
        ),
    }

    Ok(config)
}
