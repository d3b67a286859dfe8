//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

use super::VoiceError;

/// 语音合成提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Google Cloud Text-to-Speech
    Google,
    /// 本地 espeak-ng
    Espeak,
    /// 进程内假实现（测试 / 空跑）
    Fake,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Espeak => "espeak",
            ProviderKind::Fake => "fake",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 音色性别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    Neutral,
    Unknown,
}

impl Gender {
    /// 解析提供方返回的性别字段（"FEMALE" / "M" / "female" 等）
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "female" | "f" => Gender::Female,
            "male" | "m" => Gender::Male,
            "neutral" | "n" => Gender::Neutral,
            _ => Gender::Unknown,
        }
    }
}

/// 音色质量档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceTier {
    Standard,
    Premium,
}

/// 合成音频格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    #[default]
    Mp3,
    OggOpus,
    /// 16-bit PCM，带 WAV 头
    Linear16,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggOpus => "ogg",
            Self::Linear16 => "wav",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "ogg" => Some(Self::OggOpus),
            "wav" => Some(Self::Linear16),
            _ => None,
        }
    }
}

/// 语言代码（BCP-47 风格，如 "en-US"）
///
/// 不变量:
/// - 主语言子标签非空，且为 2-3 个 ASCII 字母
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: impl Into<String>) -> Result<Self, VoiceError> {
        let code = code.into().trim().replace('_', "-");
        let primary = code.split('-').next().unwrap_or_default();
        if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(VoiceError::InvalidLanguageCode(code));
        }
        Ok(Self(code))
    }

    /// 主语言前缀（小写），如 "en-US" -> "en"
    pub fn prefix(&self) -> String {
        self.0
            .split('-')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 音色描述 - 提供方返回的一条音色记录
///
/// 加载后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// 提供方
    pub provider: ProviderKind,
    /// 提供方内部 ID（合成时使用）
    pub id: String,
    /// 展示名称（排序依据）
    pub display_name: String,
    pub gender: Gender,
    pub language: LanguageCode,
    pub tier: VoiceTier,
}

impl VoiceProfile {
    pub fn language_prefix(&self) -> String {
        self.language.prefix()
    }

    pub fn is_premium(&self) -> bool {
        self.tier == VoiceTier::Premium
    }
}
