//! Fake Speech Provider - 用于测试 / 空跑的语音合成提供方
//!
//! 不调用任何外部服务，返回固定音频并记录每次合成请求

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::application::ports::{SpeechProviderPort, SynthesisError, SynthesizedAudio};
use crate::domain::voice::{
    AudioFormat, Gender, LanguageCode, ProviderKind, VoiceProfile, VoiceTier,
};

/// 构造一个假音色描述
///
/// `language` 必须是合法语言代码
pub fn fake_profile(name: &str, language: &str, tier: VoiceTier) -> VoiceProfile {
    VoiceProfile {
        provider: ProviderKind::Fake,
        id: name.to_string(),
        display_name: name.to_string(),
        gender: Gender::Neutral,
        language: LanguageCode::new(language).expect("fake voice language must be valid"),
        tier,
    }
}

/// Fake Speech Provider 配置
#[derive(Debug, Clone)]
pub struct FakeSpeechProviderConfig {
    /// 列出的音色
    pub voices: Vec<VoiceProfile>,
    /// 固定返回的音频
    pub payload: Vec<u8>,
    /// 返回 SSML 原文作为音频内容（便于测试核对顺序）
    pub echo_markup: bool,
    pub format: AudioFormat,
    /// 模拟合成延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeSpeechProviderConfig {
    fn default() -> Self {
        Self {
            voices: vec![fake_profile("Fake English", "en-US", VoiceTier::Standard)],
            payload: b"RIFF\0\0\0\0WAVEfake".to_vec(),
            echo_markup: false,
            format: AudioFormat::Linear16,
            latency_ms: 0,
        }
    }
}

/// 一次被记录的合成调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSynthesis {
    pub markup: String,
    pub voice_id: String,
}

/// Fake Speech Provider
pub struct FakeSpeechProvider {
    config: FakeSpeechProviderConfig,
    payload: Mutex<Vec<u8>>,
    requests: Mutex<Vec<RecordedSynthesis>>,
    /// 接下来多少次合成直接失败
    failures_left: AtomicUsize,
    reachable: bool,
}

impl FakeSpeechProvider {
    pub fn new(config: FakeSpeechProviderConfig) -> Self {
        tracing::info!(
            voices = config.voices.len(),
            latency_ms = config.latency_ms,
            "FakeSpeechProvider initialized"
        );
        let payload = Mutex::new(config.payload.clone());
        Self {
            config,
            payload,
            requests: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(0),
            reachable: true,
        }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeSpeechProviderConfig::default())
    }

    pub fn with_voices(voices: Vec<VoiceProfile>) -> Self {
        Self::new(FakeSpeechProviderConfig {
            voices,
            ..Default::default()
        })
    }

    /// 列举音色总是失败的提供方
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::with_defaults()
        }
    }

    pub fn set_payload(&self, payload: Vec<u8>) {
        *self.payload.lock().unwrap_or_else(|e| e.into_inner()) = payload;
    }

    /// 让接下来 `count` 次合成失败
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedSynthesis> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn synthesis_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl SpeechProviderPort for FakeSpeechProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Fake
    }

    async fn list_voices(&self) -> Result<Vec<VoiceProfile>, SynthesisError> {
        if !self.reachable {
            return Err(SynthesisError::NetworkError(
                "fake provider is unreachable".to_string(),
            ));
        }
        Ok(self.config.voices.clone())
    }

    async fn synthesize(
        &self,
        markup: &str,
        voice: &VoiceProfile,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        tracing::debug!(
            markup_len = markup.len(),
            voice_id = %voice.id,
            "FakeSpeechProvider: returning fixed audio"
        );

        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedSynthesis {
                markup: markup.to_string(),
                voice_id: voice.id.clone(),
            });

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(SynthesisError::ServiceError("fake failure".to_string()));
        }

        let audio_data = if self.config.echo_markup {
            markup.as_bytes().to_vec()
        } else {
            self.payload
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        };

        Ok(SynthesizedAudio {
            audio_data,
            format: self.config.format,
        })
    }
}
