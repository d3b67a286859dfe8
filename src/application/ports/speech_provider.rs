//! Speech Provider Port - 语音合成提供方抽象
//!
//! 定义音色列举与 SSML 合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::voice::{AudioFormat, ProviderKind, VoiceProfile};

/// 合成错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider returned empty audio")]
    EmptyAudio,

    #[error("Process error: {0}")]
    ProcessError(String),
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// 原始音频数据
    pub audio_data: Vec<u8>,
    /// 音频格式（决定临时文件扩展名）
    pub format: AudioFormat,
}

/// Speech Provider Port
///
/// 外部语音合成服务的抽象接口。
/// 音频格式与采样率属于提供方自身配置。
#[async_trait]
pub trait SpeechProviderPort: Send + Sync {
    /// 提供方类型
    fn kind(&self) -> ProviderKind;

    /// 列出可用音色
    async fn list_voices(&self) -> Result<Vec<VoiceProfile>, SynthesisError>;

    /// 使用指定音色合成 SSML 文本
    async fn synthesize(
        &self,
        markup: &str,
        voice: &VoiceProfile,
    ) -> Result<SynthesizedAudio, SynthesisError>;
}
