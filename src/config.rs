//! Configuration parsing.
//!
//! LibraAI reads a TOML file (default `./config/libra.toml`). Every section
//! is optional and falls back to the defaults below. API keys and passwords
//! are never stored in the file, only the names of the environment variables
//! holding them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::LibraryService;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub loans: LoansConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("books.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoansConfig {
    #[serde(default = "default_loan_days")]
    pub loan_days: i64,
    #[serde(default = "default_renewal_window_days")]
    pub renewal_window_days: i64,
    #[serde(default = "default_renewal_days")]
    pub renewal_days: i64,
}

impl Default for LoansConfig {
    fn default() -> Self {
        Self {
            loan_days: default_loan_days(),
            renewal_window_days: default_renewal_window_days(),
            renewal_days: default_renewal_days(),
        }
    }
}

fn default_loan_days() -> i64 {
    14
}
fn default_renewal_window_days() -> i64 {
    3
}
fn default_renewal_days() -> i64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    /// Minimum fuzzy score (0-100) a keyword must reach to count as a match.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_services")]
    pub entries: Vec<LibraryService>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            entries: default_services(),
        }
    }
}

fn default_threshold() -> f64 {
    80.0
}

fn default_services() -> Vec<LibraryService> {
    vec![
        LibraryService {
            name: "eLibrary registration".to_string(),
            url: "https://archives.daffodilvarsity.edu.bd/login".to_string(),
            description: "Register for the DIU eLibrary through the official website to get started."
                .to_string(),
            keywords: vec![
                "library".to_string(),
                "register".to_string(),
                "registration".to_string(),
                "sign up".to_string(),
                "elibrary".to_string(),
                "login".to_string(),
            ],
        },
        LibraryService {
            name: "Research archive".to_string(),
            url: "https://archives.daffodilvarsity.edu.bd/".to_string(),
            description: "Browse theses, journals and research papers held in the institutional archive."
                .to_string(),
            keywords: vec![
                "archive".to_string(),
                "thesis".to_string(),
                "journal".to_string(),
                "research paper".to_string(),
            ],
        },
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: None,
            base_url: None,
            api_key_env: None,
            temperature: default_temperature(),
            system_prompt: None,
            max_retries: 0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_llm_provider() -> String {
    "disabled".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_timeout_secs() -> u64 {
    30
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    /// Model identifier, falling back to the provider's preset.
    pub fn model_or_default(&self) -> Option<String> {
        self.model.clone().or_else(|| {
            match self.provider.as_str() {
                "groq" => Some("llama-3.3-70b-versatile"),
                "openai" => Some("gpt-4o-mini"),
                _ => None,
            }
            .map(str::to_string)
        })
    }

    pub fn base_url_or_default(&self) -> Option<String> {
        self.base_url.clone().or_else(|| {
            match self.provider.as_str() {
                "groq" => Some("https://api.groq.com/openai/v1"),
                "openai" => Some("https://api.openai.com/v1"),
                "openrouter" => Some("https://openrouter.ai/api/v1"),
                _ => None,
            }
            .map(str::to_string)
        })
    }

    pub fn api_key_env_or_default(&self) -> Option<String> {
        self.api_key_env.clone().or_else(|| {
            match self.provider.as_str() {
                "groq" => Some("GROQ_API_KEY"),
                "openai" => Some("OPENAI_API_KEY"),
                "openrouter" => Some("OPENROUTER_API_KEY"),
                _ => None,
            }
            .map(str::to_string)
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    /// Name of the environment variable holding the SMTP password.
    #[serde(default = "default_password_env")]
    pub password_env: String,
    /// Sender address; defaults to `username`.
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_password_env() -> String {
    "LIBRA_SMTP_PASSWORD".to_string()
}
fn default_smtp_timeout_secs() -> u64 {
    20
}

impl SmtpConfig {
    pub fn sender(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: Option<String>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate loans
    if config.loans.loan_days < 1 {
        anyhow::bail!("loans.loan_days must be >= 1");
    }
    if config.loans.renewal_days < 1 {
        anyhow::bail!("loans.renewal_days must be >= 1");
    }
    if config.loans.renewal_window_days < 0 {
        anyhow::bail!("loans.renewal_window_days must be >= 0");
    }

    // Validate services
    if !(0.0..=100.0).contains(&config.services.threshold) {
        anyhow::bail!("services.threshold must be in [0, 100]");
    }
    for service in &config.services.entries {
        if service.keywords.iter().all(|k| k.trim().is_empty()) {
            anyhow::bail!("service '{}' must have at least one keyword", service.name);
        }
    }

    // Validate llm
    match config.llm.provider.as_str() {
        "disabled" | "groq" | "openai" | "openrouter" | "custom" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be disabled, groq, openai, openrouter, or custom.",
            other
        ),
    }
    if !(0.0..=2.0).contains(&config.llm.temperature) {
        anyhow::bail!("llm.temperature must be in [0.0, 2.0]");
    }
    if config.llm.is_enabled() {
        if config.llm.model_or_default().is_none() {
            anyhow::bail!(
                "llm.model must be specified when provider is '{}'",
                config.llm.provider
            );
        }
        if config.llm.base_url_or_default().is_none() {
            anyhow::bail!(
                "llm.base_url must be specified when provider is '{}'",
                config.llm.provider
            );
        }
    }

    // Validate smtp
    if let Some(smtp) = &config.smtp {
        if smtp.username.trim().is_empty() {
            anyhow::bail!("smtp.username must not be empty");
        }
    }

    Ok(())
}
