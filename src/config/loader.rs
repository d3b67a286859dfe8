//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. `VOXCHAT_CONFIG` 指定的配置文件
//! 3. 配置文件（voxchat.toml / voxchat.local.toml）
//! 4. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::types::{AppConfig, SAMPLE_RATES};
use crate::domain::voice::{LanguageCode, ProviderKind};
use crate::infrastructure::adapters::validate_template;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["voxchat", "voxchat.local"];

/// 指定配置文件路径的环境变量
const CONFIG_PATH_ENV: &str = "VOXCHAT_CONFIG";

/// 以逗号分隔的列表型配置项
const LIST_KEYS: &[&str] = &[
    "providers",
    "speech.language_families",
    "filter.muted_nicks",
    "filter.muted_channels",
    "filter.muted_prefixes",
    "control.admins",
];

/// 加载应用配置
///
/// # 环境变量示例
/// - `VOXCHAT_PROVIDERS=google,espeak`
/// - `VOXCHAT_GOOGLE__API_KEY=...`
/// - `VOXCHAT_SPEECH__DEFAULT_LANGUAGE=de`
/// - `VOXCHAT_FILTER__MUTED_NICKS=spambot,otherbot`
/// - `VOXCHAT_PLAYBACK__COMMAND="mpg123 -q {}"`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    load_config_from_path(explicit.as_deref())
}

/// 从指定路径加载配置
///
/// 默认配置文件总是参与合并，指定的文件叠加在它们之上
///
/// # 参数
/// - `config_path` - 可选的配置文件路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_layers(CONFIG_FILE_NAMES, config_path)
}

fn load_layers<S: AsRef<str>>(
    base_files: &[S],
    config_path: Option<&Path>,
) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("speech.default_language", "en")?
        .set_default("speech.confidence_threshold", 0.4)?
        .set_default("speech.rate", "medium")?
        .set_default("playback.pause_ms", 250)?
        .set_default("pipeline.text_queue_capacity", 64)?
        .set_default("pipeline.audio_queue_capacity", 16)?
        .set_default("log.level", "info")?;

    // 2. 配置文件，指定的文件必须存在
    for name in base_files {
        builder = builder.add_source(File::with_name(name.as_ref()).required(false));
    }
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    }

    // 3. 环境变量（最高优先级）
    // 前缀: VOXCHAT_，层级分隔符: __
    let mut env = Environment::with_prefix("VOXCHAT")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .try_parsing(true);
    for key in LIST_KEYS {
        env = env.with_list_parse_key(key);
    }
    builder = builder.add_source(env);

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let invalid = |message: String| Err(ConfigError::ValidationError(message));

    if config.providers.is_empty() {
        return invalid("At least one provider must be enabled".to_string());
    }

    if config.uses(ProviderKind::Google)
        && config
            .google
            .api_key
            .as_deref()
            .map_or(true, |key| key.trim().is_empty())
    {
        return invalid("google.api_key is required when the google provider is enabled".to_string());
    }

    let threshold = config.speech.confidence_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return invalid(format!(
            "speech.confidence_threshold must be within [0, 1], got {}",
            threshold
        ));
    }

    if let Err(e) = LanguageCode::new(config.speech.default_language.as_str()) {
        return invalid(format!("speech.default_language: {}", e));
    }

    if !SAMPLE_RATES.contains(&config.speech.sample_rate) {
        return invalid(format!(
            "speech.sample_rate must be one of {:?}, got {}",
            SAMPLE_RATES, config.speech.sample_rate
        ));
    }

    if config.speech.synthesis_timeout_secs == 0 || config.playback.timeout_secs == 0 {
        return invalid("Timeouts cannot be 0".to_string());
    }

    if let Err(e) = validate_template(&config.playback.command) {
        return invalid(format!("playback.command: {}", e));
    }

    if config.storage.file_prefix.is_empty() {
        return invalid("storage.file_prefix cannot be empty".to_string());
    }

    if config.pipeline.text_queue_capacity == 0 || config.pipeline.audio_queue_capacity == 0 {
        return invalid("Queue capacities cannot be 0".to_string());
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    let providers: Vec<&str> = config.providers.iter().map(|p| p.as_str()).collect();

    tracing::info!("=== Application Configuration ===");
    tracing::info!("Providers: {}", providers.join(", "));
    if config.uses(ProviderKind::Google) {
        tracing::info!("Google URL: {}", config.google.base_url);
        tracing::info!(
            "Google API Key: {}",
            if config.google.api_key.is_some() { "set" } else { "unset" }
        );
    }
    if config.uses(ProviderKind::Espeak) {
        tracing::info!("espeak-ng: {}", config.espeak.binary.display());
    }
    tracing::info!(
        "Default Language: {} (forced: {})",
        config.speech.default_language,
        config.speech.force_language
    );
    tracing::info!("Confidence Threshold: {}", config.speech.confidence_threshold);
    tracing::info!("Prefer Premium: {}", config.speech.prefer_premium);
    if !config.speech.language_families.is_empty() {
        tracing::info!("Language Families: {}", config.speech.language_families.join(", "));
    }
    tracing::info!(
        "Audio: {:?} @ {} Hz",
        config.speech.audio_format,
        config.speech.sample_rate
    );
    tracing::info!("Play Command: {}", config.playback.command);
    tracing::info!("Artifact Directory: {:?}", config.storage.artifact_dir);
    tracing::info!(
        "Queues: text={} audio={}",
        config.pipeline.text_queue_capacity,
        config.pipeline.audio_queue_capacity
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
