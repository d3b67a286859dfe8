//! Voice Catalog - 可用音色目录
//!
//! 启动时从所有提供方加载音色，按展示名称排序后只读共享。
//! 排序保证提供方音色列表不变时，分桶下标在重启后依然稳定。

use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

use crate::application::ports::{SpeechProviderPort, SynthesisError, SynthesizedAudio};
use crate::domain::bucket;
use crate::domain::voice::{ProviderKind, VoiceError, VoiceProfile};

/// 目录加载错误（启动期致命）
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Provider {provider} unavailable: {reason}")]
    ProviderUnavailable {
        provider: ProviderKind,
        reason: String,
    },

    #[error("No voices available")]
    NoVoices,
}

/// 可合成的音色：音色描述 + 所属提供方
#[derive(Clone)]
pub struct Voice {
    profile: VoiceProfile,
    provider: Arc<dyn SpeechProviderPort>,
}

impl Voice {
    pub fn new(profile: VoiceProfile, provider: Arc<dyn SpeechProviderPort>) -> Self {
        Self { profile, provider }
    }

    pub fn profile(&self) -> &VoiceProfile {
        &self.profile
    }

    pub fn name(&self) -> &str {
        &self.profile.display_name
    }

    /// 合成 SSML；空音频视为失败
    pub async fn speak(&self, markup: &str) -> Result<SynthesizedAudio, SynthesisError> {
        let audio = self.provider.synthesize(markup, &self.profile).await?;
        if audio.audio_data.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(audio)
    }
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("provider", &self.profile.provider)
            .field("name", &self.profile.display_name)
            .field("language", &self.profile.language)
            .finish()
    }
}

/// 音色目录
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    languages: BTreeSet<String>,
}

impl VoiceCatalog {
    /// 从所有提供方加载音色
    ///
    /// # 参数
    /// - `providers` - 已启用的提供方
    /// - `families` - 语言前缀白名单，为空表示不过滤
    ///
    /// 任一提供方不可用或最终没有音色都会返回错误，不做降级
    pub async fn load(
        providers: &[Arc<dyn SpeechProviderPort>],
        families: &[String],
    ) -> Result<Self, CatalogError> {
        let families: BTreeSet<String> = families
            .iter()
            .map(|f| f.trim().to_ascii_lowercase())
            .filter(|f| !f.is_empty())
            .collect();

        let mut voices = Vec::new();
        for provider in providers {
            let profiles =
                provider
                    .list_voices()
                    .await
                    .map_err(|e| CatalogError::ProviderUnavailable {
                        provider: provider.kind(),
                        reason: e.to_string(),
                    })?;

            let total = profiles.len();
            let kept: Vec<Voice> = profiles
                .into_iter()
                .filter(|p| families.is_empty() || families.contains(&p.language_prefix()))
                .map(|p| Voice::new(p, provider.clone()))
                .collect();

            tracing::debug!(
                provider = %provider.kind(),
                total = total,
                kept = kept.len(),
                "Pulled voices"
            );
            voices.extend(kept);
        }

        Self::from_voices(voices)
    }

    /// 由已有音色构建目录（排序并建立语言索引）
    pub fn from_voices(mut voices: Vec<Voice>) -> Result<Self, CatalogError> {
        if voices.is_empty() {
            return Err(CatalogError::NoVoices);
        }

        voices.sort_by(|a, b| {
            a.profile
                .display_name
                .cmp(&b.profile.display_name)
                .then_with(|| a.profile.provider.as_str().cmp(b.profile.provider.as_str()))
                .then_with(|| a.profile.id.cmp(&b.profile.id))
        });

        let languages = voices.iter().map(|v| v.profile.language_prefix()).collect();

        Ok(Self { voices, languages })
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// 可用的语言前缀集合
    pub fn languages_available(&self) -> &BTreeSet<String> {
        &self.languages
    }

    pub fn has_language(&self, prefix: &str) -> bool {
        self.languages.contains(&prefix.to_ascii_lowercase())
    }

    /// 按语言前缀过滤，保持目录顺序
    pub fn filter_by_language(&self, prefix: &str) -> Vec<Voice> {
        let prefix = prefix.to_ascii_lowercase();
        self.voices
            .iter()
            .filter(|v| v.profile.language_prefix() == prefix)
            .cloned()
            .collect()
    }

    /// 某说话人在指定语言下的音色
    pub fn voice_for(
        &self,
        identity: &str,
        language: &str,
        prefer_premium: bool,
    ) -> Result<Voice, VoiceError> {
        let mut voices = self.filter_by_language(language);
        if prefer_premium {
            voices = filter_preferred(voices);
        }
        bucket(identity, &voices).cloned()
    }
}

/// 若存在高质量档位音色则只保留它们，否则原样返回
pub fn filter_preferred(voices: Vec<Voice>) -> Vec<Voice> {
    if voices.iter().any(|v| v.profile.is_premium()) {
        voices.into_iter().filter(|v| v.profile.is_premium()).collect()
    } else {
        voices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::{fake_profile, FakeSpeechProvider};
    use crate::domain::voice::VoiceTier;

    fn provider_with(profiles: Vec<VoiceProfile>) -> Arc<dyn SpeechProviderPort> {
        Arc::new(FakeSpeechProvider::with_voices(profiles))
    }

    #[tokio::test]
    async fn test_load_sorts_by_display_name() {
        let provider = provider_with(vec![
            fake_profile("Salli", "en-US", VoiceTier::Standard),
            fake_profile("Amy", "en-GB", VoiceTier::Standard),
            fake_profile("Hans", "de-DE", VoiceTier::Standard),
        ]);

        let catalog = VoiceCatalog::load(&[provider], &[]).await.unwrap();
        let names: Vec<&str> = catalog.voices().iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["Amy", "Hans", "Salli"]);

        let languages: Vec<&str> = catalog
            .languages_available()
            .iter()
            .map(|s| s.as_str())
            .collect();
        assert_eq!(languages, vec!["de", "en"]);
    }

    #[tokio::test]
    async fn test_load_applies_family_allowlist() {
        let provider = provider_with(vec![
            fake_profile("Amy", "en-GB", VoiceTier::Standard),
            fake_profile("Hans", "de-DE", VoiceTier::Standard),
        ]);

        let catalog = VoiceCatalog::load(&[provider], &["EN".to_string()])
            .await
            .unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.has_language("en"));
        assert!(!catalog.has_language("de"));
    }

    #[tokio::test]
    async fn test_load_without_voices_is_fatal() {
        let provider = provider_with(vec![]);
        let result = VoiceCatalog::load(&[provider], &[]).await;
        assert!(matches!(result, Err(CatalogError::NoVoices)));
    }

    #[tokio::test]
    async fn test_load_with_unreachable_provider_is_fatal() {
        let provider: Arc<dyn SpeechProviderPort> = Arc::new(FakeSpeechProvider::unreachable());
        let result = VoiceCatalog::load(&[provider], &[]).await;
        assert!(matches!(
            result,
            Err(CatalogError::ProviderUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_filter_by_language_and_preferred() {
        let provider = provider_with(vec![
            fake_profile("en-US-Standard-A", "en-US", VoiceTier::Standard),
            fake_profile("en-US-Wavenet-B", "en-US", VoiceTier::Premium),
            fake_profile("de-DE-Standard-A", "de-DE", VoiceTier::Standard),
        ]);
        let catalog = VoiceCatalog::load(&[provider], &[]).await.unwrap();

        let english = catalog.filter_by_language("EN");
        assert_eq!(english.len(), 2);

        let preferred = filter_preferred(english);
        assert_eq!(preferred.len(), 1);
        assert_eq!(preferred[0].name(), "en-US-Wavenet-B");

        // 没有高质量档位时不过滤
        let german = filter_preferred(catalog.filter_by_language("de"));
        assert_eq!(german.len(), 1);
    }

    #[tokio::test]
    async fn test_voice_for_is_stable() {
        let provider = provider_with(vec![
            fake_profile("A", "en-US", VoiceTier::Standard),
            fake_profile("B", "en-US", VoiceTier::Standard),
            fake_profile("C", "en-US", VoiceTier::Standard),
        ]);
        let catalog = VoiceCatalog::load(&[provider], &[]).await.unwrap();

        let first = catalog.voice_for("alice", "en", false).unwrap();
        let second = catalog.voice_for("Alice", "en", false).unwrap();
        assert_eq!(first.name(), second.name());

        assert_eq!(
            catalog.voice_for("alice", "fr", false).unwrap_err(),
            VoiceError::EmptyBucketSet
        );
    }

    #[tokio::test]
    async fn test_speak_rejects_empty_audio() {
        let provider = Arc::new(FakeSpeechProvider::with_voices(vec![fake_profile(
            "A",
            "en-US",
            VoiceTier::Standard,
        )]));
        provider.set_payload(Vec::new());
        let catalog = VoiceCatalog::load(&[provider.clone() as Arc<dyn SpeechProviderPort>], &[])
            .await
            .unwrap();

        let result = catalog.voices()[0].speak("<speak>hi</speak>").await;
        assert!(matches!(result, Err(SynthesisError::EmptyAudio)));
    }
}
