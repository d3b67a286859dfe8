//! Google TTS Client - 调用 Google Cloud Text-to-Speech REST API
//!
//! 实现 SpeechProviderPort trait
//!
//! 外部 API:
//! GET  {base_url}/v1/voices?key=...
//! POST {base_url}/v1/text:synthesize?key=...
//! Request: {"input": {"ssml": "..."}, "voice": {...}, "audioConfig": {...}}  (JSON)
//! Response: {"audioContent": "<base64>"}

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{SpeechProviderPort, SynthesisError, SynthesizedAudio};
use crate::domain::voice::{
    AudioFormat, Gender, LanguageCode, ProviderKind, VoiceProfile, VoiceTier,
};

/// 名称中带这些标记的音色属于高质量档位
const PREMIUM_MARKERS: &[&str] = &["Wavenet", "Neural2", "Studio", "Journey", "Chirp"];

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<GoogleVoice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleVoice {
    #[serde(default)]
    language_codes: Vec<String>,
    name: String,
    #[serde(default)]
    ssml_gender: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    ssml: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    sample_rate_hertz: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

/// Google TTS 客户端配置
#[derive(Debug, Clone)]
pub struct GoogleTtsClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// API Key
    pub api_key: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 输出格式
    pub audio_format: AudioFormat,
    /// 采样率
    pub sample_rate: u32,
}

impl Default for GoogleTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://texttospeech.googleapis.com".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
            audio_format: AudioFormat::Mp3,
            sample_rate: 22050,
        }
    }
}

impl GoogleTtsClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Google TTS 客户端
pub struct GoogleTtsClient {
    client: Client,
    config: GoogleTtsClientConfig,
}

impl GoogleTtsClient {
    /// 创建新的客户端
    pub fn new(config: GoogleTtsClientConfig) -> Result<Self, SynthesisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SynthesisError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn voices_url(&self) -> String {
        format!("{}/v1/voices", self.config.base_url.trim_end_matches('/'))
    }

    fn synthesize_url(&self) -> String {
        format!(
            "{}/v1/text:synthesize",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn audio_encoding(&self) -> &'static str {
        match self.config.audio_format {
            AudioFormat::Mp3 => "MP3",
            AudioFormat::OggOpus => "OGG_OPUS",
            AudioFormat::Linear16 => "LINEAR16",
        }
    }
}

fn map_request_error(e: reqwest::Error) -> SynthesisError {
    if e.is_timeout() {
        SynthesisError::Timeout
    } else if e.is_connect() {
        SynthesisError::NetworkError(format!("Cannot connect to Google TTS: {}", e))
    } else {
        SynthesisError::NetworkError(e.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SynthesisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_default();
    Err(SynthesisError::ServiceError(format!(
        "HTTP {}: {}",
        status, error_text
    )))
}

fn voice_tier(name: &str) -> VoiceTier {
    if PREMIUM_MARKERS.iter().any(|marker| name.contains(marker)) {
        VoiceTier::Premium
    } else {
        VoiceTier::Standard
    }
}

/// 转换为音色描述；没有合法语言代码的条目跳过
fn to_profile(voice: GoogleVoice) -> Option<VoiceProfile> {
    let language = voice
        .language_codes
        .iter()
        .find_map(|code| LanguageCode::new(code.as_str()).ok())?;

    Some(VoiceProfile {
        provider: ProviderKind::Google,
        tier: voice_tier(&voice.name),
        gender: Gender::parse(&voice.ssml_gender),
        id: voice.name.clone(),
        display_name: voice.name,
        language,
    })
}

#[async_trait]
impl SpeechProviderPort for GoogleTtsClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn list_voices(&self) -> Result<Vec<VoiceProfile>, SynthesisError> {
        let response = self
            .client
            .get(self.voices_url())
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(map_request_error)?;

        let body: VoicesResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(format!("Bad voice list: {}", e)))?;

        let voices: Vec<VoiceProfile> = body.voices.into_iter().filter_map(to_profile).collect();
        tracing::info!(count = voices.len(), "Pulled Google voices");
        Ok(voices)
    }

    async fn synthesize(
        &self,
        markup: &str,
        voice: &VoiceProfile,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let request = SynthesizeRequest {
            input: SynthesisInput { ssml: markup },
            voice: VoiceSelection {
                language_code: voice.language.as_str(),
                name: &voice.id,
            },
            audio_config: AudioConfig {
                audio_encoding: self.audio_encoding(),
                sample_rate_hertz: self.config.sample_rate,
            },
        };

        tracing::debug!(
            url = %self.synthesize_url(),
            markup_len = markup.len(),
            voice = %voice.id,
            "Sending Google synthesize request"
        );

        let response = self
            .client
            .post(self.synthesize_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(map_request_error)?;

        let body: SynthesizeResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(format!("Bad synthesize body: {}", e)))?;

        let audio_data = base64::engine::general_purpose::STANDARD
            .decode(body.audio_content.as_bytes())
            .map_err(|e| SynthesisError::InvalidResponse(format!("Bad audio payload: {}", e)))?;

        if audio_data.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        tracing::debug!(
            voice = %voice.id,
            audio_size = audio_data.len(),
            "Google synthesis completed"
        );

        Ok(SynthesizedAudio {
            audio_data,
            format: self.config.audio_format,
        })
    }
}
