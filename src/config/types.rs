//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::voice::{AudioFormat, ProviderKind};

/// 应用主配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 启用的语音提供方，按顺序加载
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderKind>,

    /// Google Cloud TTS 配置
    #[serde(default)]
    pub google: GoogleConfig,

    /// espeak-ng 配置
    #[serde(default)]
    pub espeak: EspeakConfig,

    /// 语音与语言配置
    #[serde(default)]
    pub speech: SpeechConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 临时音频存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 消息过滤配置
    #[serde(default)]
    pub filter: FilterConfig,

    /// 控制命令配置
    #[serde(default)]
    pub control: ControlConfig,

    /// 队列与启动配置
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

fn default_providers() -> Vec<ProviderKind> {
    vec![ProviderKind::Espeak]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            google: GoogleConfig::default(),
            espeak: EspeakConfig::default(),
            speech: SpeechConfig::default(),
            playback: PlaybackConfig::default(),
            storage: StorageConfig::default(),
            filter: FilterConfig::default(),
            control: ControlConfig::default(),
            pipeline: PipelineSettings::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// 是否启用了某个提供方
    pub fn uses(&self, provider: ProviderKind) -> bool {
        self.providers.contains(&provider)
    }
}

/// Google Cloud TTS 配置
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// API Key，启用 google 时必填
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_google_url")]
    pub base_url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_google_timeout")]
    pub timeout_secs: u64,
}

fn default_google_url() -> String {
    "https://texttospeech.googleapis.com".to_string()
}

fn default_google_timeout() -> u64 {
    30
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_google_url(),
            timeout_secs: default_google_timeout(),
        }
    }
}

/// espeak-ng 配置
#[derive(Debug, Clone, Deserialize)]
pub struct EspeakConfig {
    #[serde(default = "default_espeak_binary")]
    pub binary: PathBuf,
}

fn default_espeak_binary() -> PathBuf {
    PathBuf::from("espeak-ng")
}

impl Default for EspeakConfig {
    fn default() -> Self {
        Self {
            binary: default_espeak_binary(),
        }
    }
}

/// 语音与语言配置
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// 默认语言前缀
    #[serde(default = "default_language")]
    pub default_language: String,

    /// 跳过语言识别，始终使用默认语言
    #[serde(default)]
    pub force_language: bool,

    /// 有高档位音色时只用高档位
    #[serde(default)]
    pub prefer_premium: bool,

    /// 语言识别置信度阈值 [0, 1]
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// 语速（SSML prosody rate）
    #[serde(default = "default_rate")]
    pub rate: String,

    /// 合成音频格式（google）
    #[serde(default)]
    pub audio_format: AudioFormat,

    /// 采样率 (Hz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// 只加载这些语言前缀的音色，为空表示全部
    #[serde(default)]
    pub language_families: Vec<String>,

    /// 没有可打印 ASCII 字符的消息直接丢弃
    #[serde(default = "default_true")]
    pub drop_non_ascii: bool,

    /// 单次合成超时（秒）
    #[serde(default = "default_synthesis_timeout")]
    pub synthesis_timeout_secs: u64,
}

/// 支持的采样率
pub const SAMPLE_RATES: &[u32] = &[8000, 16000, 22050, 24000];

fn default_language() -> String {
    "en".to_string()
}

fn default_confidence_threshold() -> f64 {
    0.4
}

fn default_rate() -> String {
    "medium".to_string()
}

fn default_sample_rate() -> u32 {
    22050
}

fn default_true() -> bool {
    true
}

fn default_synthesis_timeout() -> u64 {
    30
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            force_language: false,
            prefer_premium: false,
            confidence_threshold: default_confidence_threshold(),
            rate: default_rate(),
            audio_format: AudioFormat::default(),
            sample_rate: default_sample_rate(),
            language_families: Vec::new(),
            drop_non_ascii: true,
            synthesis_timeout_secs: default_synthesis_timeout(),
        }
    }
}

impl SpeechConfig {
    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }
}

/// 播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 播放命令模板，`{}` 替换为音频文件路径
    #[serde(default = "default_play_command")]
    pub command: String,

    /// 单次播放超时（秒）
    #[serde(default = "default_playback_timeout")]
    pub timeout_secs: u64,

    /// 每段音频之后的停顿（毫秒）
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

fn default_play_command() -> String {
    "ffplay -nodisp -autoexit -loglevel quiet {}".to_string()
}

fn default_playback_timeout() -> u64 {
    120
}

fn default_pause_ms() -> u64 {
    250
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            command: default_play_command(),
            timeout_secs: default_playback_timeout(),
            pause_ms: default_pause_ms(),
        }
    }
}

impl PlaybackConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

/// 临时音频存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 临时音频目录
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// 文件名前缀，启动时清理以此开头的遗留文件
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_artifact_dir() -> PathBuf {
    std::env::temp_dir().join("voxchat")
}

fn default_file_prefix() -> String {
    "voxchat-".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

/// 消息过滤配置
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// 机器人自己的昵称
    #[serde(default)]
    pub bot_nick: Option<String>,

    #[serde(default)]
    pub muted_nicks: Vec<String>,

    #[serde(default)]
    pub muted_channels: Vec<String>,

    /// 命令前缀
    #[serde(default = "default_muted_prefixes")]
    pub muted_prefixes: Vec<String>,
}

fn default_muted_prefixes() -> Vec<String> {
    vec![".".to_string(), "!".to_string()]
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            bot_nick: None,
            muted_nicks: Vec::new(),
            muted_channels: Vec::new(),
            muted_prefixes: default_muted_prefixes(),
        }
    }
}

/// 控制命令配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlConfig {
    /// 允许使用 mute / unmute 的昵称
    #[serde(default)]
    pub admins: Vec<String>,
}

/// 队列与启动配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_text_queue")]
    pub text_queue_capacity: usize,

    #[serde(default = "default_audio_queue")]
    pub audio_queue_capacity: usize,

    /// 启动时朗读的消息，为空则不朗读
    #[serde(default = "default_announcement")]
    pub startup_announcement: Option<String>,
}

fn default_text_queue() -> usize {
    64
}

fn default_audio_queue() -> usize {
    16
}

fn default_announcement() -> Option<String> {
    Some("Text to speech is online".to_string())
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            text_queue_capacity: default_text_queue(),
            audio_queue_capacity: default_audio_queue(),
            startup_announcement: default_announcement(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.providers, vec![ProviderKind::Espeak]);
        assert!(config.uses(ProviderKind::Espeak));
        assert!(!config.uses(ProviderKind::Google));
        assert_eq!(config.speech.default_language, "en");
        assert_eq!(config.speech.confidence_threshold, 0.4);
        assert!(config.speech.drop_non_ascii);
        assert_eq!(config.pipeline.text_queue_capacity, 64);
        assert_eq!(config.storage.file_prefix, "voxchat-");
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.playback.pause(), Duration::from_millis(250));
        assert_eq!(config.playback.timeout(), Duration::from_secs(120));
        assert_eq!(config.speech.synthesis_timeout(), Duration::from_secs(30));
    }
}
