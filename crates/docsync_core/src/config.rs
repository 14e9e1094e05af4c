use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILENAME: &str = "docsync.toml";
pub const DEFAULT_BUILD_DIR: &str = "build";
pub const DEFAULT_BASE_URL: &str = "https://docs.mollie.com/";
pub const DEFAULT_EXCLUDED_FRAGMENTS: &[&str] = &["/reference/v1/", "/reference/reseller-api/"];
pub const DEFAULT_APP_ID: &str = "YIM0JABEYY";
pub const DEFAULT_INDEX_NAME: &str = "docs";
pub const DEFAULT_BATCH_SIZE: usize = 1_000;
pub const DEFAULT_TASK_POLL_MS: u64 = 500;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct DocsyncConfig {
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub algolia: AlgoliaSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SiteSection {
    pub build_dir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub exclude: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct AlgoliaSection {
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub index: Option<String>,
    pub host: Option<String>,
    pub batch_size: Option<usize>,
    pub task_poll_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
}

/// Values given on the command line; they win over env and config file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub build_dir: Option<PathBuf>,
    pub index_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub build_dir: PathBuf,
    pub base_url: String,
    pub excluded_fragments: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AlgoliaSettings {
    pub app_id: String,
    pub api_key: Option<String>,
    pub index_name: String,
    pub host: Option<String>,
    pub batch_size: usize,
    pub task_poll_ms: u64,
    pub timeout_ms: u64,
}

impl AlgoliaSettings {
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => bail!("ALGOLIA_API_KEY is not set (env, .env, or [algolia].api_key)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub site: SiteSettings,
    pub algolia: AlgoliaSettings,
}

impl Settings {
    /// Resolve every setting: override > env > config file > default.
    pub fn resolve(config: &DocsyncConfig, overrides: &SettingsOverrides) -> Result<Self> {
        Self::resolve_with(config, overrides, |key| env::var(key).ok())
    }

    /// Same as [`Settings::resolve`] with environment lookups going through `env`.
    pub fn resolve_with<F>(
        config: &DocsyncConfig,
        overrides: &SettingsOverrides,
        env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let build_dir = overrides
            .build_dir
            .clone()
            .or_else(|| env_string(&env, "DOCSYNC_BUILD_DIR").map(PathBuf::from))
            .or_else(|| config.site.build_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR));
        let base_url = env_string(&env, "DOCSYNC_BASE_URL")
            .or_else(|| config.site.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let excluded_fragments = config.site.exclude.clone().unwrap_or_else(|| {
            DEFAULT_EXCLUDED_FRAGMENTS
                .iter()
                .map(|fragment| fragment.to_string())
                .collect()
        });

        let batch_size = env_parsed(&env, "ALGOLIA_BATCH_SIZE")?
            .or(config.algolia.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            bail!("algolia batch size must be at least 1");
        }

        let algolia = AlgoliaSettings {
            app_id: env_string(&env, "ALGOLIA_APP_ID")
                .or_else(|| config.algolia.app_id.clone())
                .unwrap_or_else(|| DEFAULT_APP_ID.to_string()),
            api_key: env_string(&env, "ALGOLIA_API_KEY")
                .or_else(|| config.algolia.api_key.clone()),
            index_name: overrides
                .index_name
                .clone()
                .or_else(|| env_string(&env, "ALGOLIA_INDEX_NAME"))
                .or_else(|| config.algolia.index.clone())
                .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
            host: env_string(&env, "ALGOLIA_HOST").or_else(|| config.algolia.host.clone()),
            batch_size,
            task_poll_ms: env_parsed(&env, "ALGOLIA_TASK_POLL_MS")?
                .or(config.algolia.task_poll_ms)
                .unwrap_or(DEFAULT_TASK_POLL_MS),
            timeout_ms: env_parsed(&env, "ALGOLIA_HTTP_TIMEOUT_MS")?
                .or(config.algolia.timeout_ms)
                .unwrap_or(DEFAULT_TIMEOUT_MS),
        };

        Ok(Self {
            site: SiteSettings {
                build_dir,
                base_url,
                excluded_fragments,
            },
            algolia,
        })
    }

    pub fn diagnostics(&self) -> String {
        format!(
            "build_dir={}\nbase_url={}\nexclude={}\nalgolia.app_id={}\nalgolia.index={}\nalgolia.host={}\nalgolia.api_key={}\nalgolia.batch_size={}\nalgolia.task_poll_ms={}\nalgolia.timeout_ms={}",
            self.site.build_dir.display(),
            self.site.base_url,
            self.site.excluded_fragments.join(","),
            self.algolia.app_id,
            self.algolia.index_name,
            self.algolia.host.as_deref().unwrap_or("<default>"),
            if self.algolia.api_key.is_some() {
                "<set>"
            } else {
                "<missing>"
            },
            self.algolia.batch_size,
            self.algolia.task_poll_ms,
            self.algolia.timeout_ms,
        )
    }
}

/// Load and parse the TOML config. Returns default if the file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<DocsyncConfig> {
    if !config_path.exists() {
        return Ok(DocsyncConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: DocsyncConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

fn env_string<F>(env: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = env(key)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn env_parsed<T, F>(env: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match env_string(env, key) {
        Some(value) => match value.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => bail!("invalid value for {key}: {value}"),
        },
        None => Ok(None),
    }
}
