//! Language Detector - 语言识别与回退策略
//!
//! 在模型输出之上叠加:
//! - 强制默认语言
//! - 置信度阈值
//! - 无对应音色时回退默认语言

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::application::ports::LanguageModelPort;

/// 预热用文本
const WARM_UP_TEXT: &str = "The quick brown fox jumps over the lazy dog";

/// 语言识别配置
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// 默认语言前缀
    pub default_language: String,
    /// 跳过识别，始终使用默认语言
    pub force_language: bool,
    /// 置信度低于该值时回退默认语言
    pub confidence_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            force_language: false,
            confidence_threshold: 0.4,
        }
    }
}

/// 识别结果
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub language: String,
    pub confidence: f64,
}

/// 语言识别器
pub struct LanguageDetector {
    model: Arc<dyn LanguageModelPort>,
    config: DetectorConfig,
    /// 有音色的语言前缀
    available: BTreeSet<String>,
}

impl LanguageDetector {
    pub fn new(
        model: Arc<dyn LanguageModelPort>,
        config: DetectorConfig,
        available: BTreeSet<String>,
    ) -> Self {
        let config = DetectorConfig {
            default_language: config.default_language.trim().to_ascii_lowercase(),
            ..config
        };
        Self {
            model,
            config,
            available,
        }
    }

    pub fn default_language(&self) -> &str {
        &self.config.default_language
    }

    /// 预热模型，避免首条消息承担加载延迟
    pub fn warm_up(&self) {
        if self.config.force_language {
            return;
        }
        let guess = self.model.detect(WARM_UP_TEXT);
        tracing::debug!(guess = ?guess, "Language model warmed up");
    }

    /// 识别语言，必要时回退默认语言
    pub fn classify(&self, text: &str) -> Detection {
        if self.config.force_language {
            return self.fallback(1.0);
        }

        let Some(guess) = self.model.detect(text) else {
            return self.fallback(0.0);
        };

        let language = guess.language.to_ascii_lowercase();
        if guess.confidence < self.config.confidence_threshold {
            tracing::debug!(
                language = %language,
                confidence = guess.confidence,
                "Low confidence, using default language"
            );
            return self.fallback(guess.confidence);
        }

        if !self.available.contains(&language) {
            tracing::debug!(language = %language, "No voices for language, using default");
            return self.fallback(guess.confidence);
        }

        Detection {
            language,
            confidence: guess.confidence,
        }
    }

    fn fallback(&self, confidence: f64) -> Detection {
        Detection {
            language: self.config.default_language.clone(),
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::LanguageGuess;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 返回固定结果并计数的模型
    struct FixedModel {
        guess: Option<LanguageGuess>,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(language: &str, confidence: f64) -> Self {
            Self {
                guess: Some(LanguageGuess {
                    language: language.to_string(),
                    confidence,
                }),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl LanguageModelPort for FixedModel {
        fn detect(&self, _text: &str) -> Option<LanguageGuess> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.guess.clone()
        }
    }

    fn available() -> BTreeSet<String> {
        ["de", "en"].iter().map(|s| s.to_string()).collect()
    }

    fn detector(model: Arc<FixedModel>, config: DetectorConfig) -> LanguageDetector {
        LanguageDetector::new(model, config, available())
    }

    #[test]
    fn test_confident_detection_is_used() {
        let model = Arc::new(FixedModel::new("de", 0.9));
        let detector = detector(model, DetectorConfig::default());
        let detection = detector.classify("Guten Morgen zusammen");
        assert_eq!(detection.language, "de");
        assert_eq!(detection.confidence, 0.9);
    }

    #[test]
    fn test_low_confidence_falls_back() {
        let model = Arc::new(FixedModel::new("de", 0.2));
        let detector = detector(model, DetectorConfig::default());
        assert_eq!(detector.classify("hm").language, "en");
    }

    #[test]
    fn test_language_without_voices_falls_back() {
        let model = Arc::new(FixedModel::new("fr", 0.99));
        let detector = detector(model, DetectorConfig::default());
        assert_eq!(detector.classify("bonjour à tous").language, "en");
    }

    #[test]
    fn test_no_guess_falls_back() {
        let model = Arc::new(FixedModel {
            guess: None,
            calls: AtomicUsize::new(0),
        });
        let detector = detector(model, DetectorConfig::default());
        let detection = detector.classify("???");
        assert_eq!(detection.language, "en");
        assert_eq!(detection.confidence, 0.0);
    }

    #[test]
    fn test_force_language_skips_model() {
        let model = Arc::new(FixedModel::new("de", 0.99));
        let config = DetectorConfig {
            default_language: "EN".to_string(),
            force_language: true,
            ..Default::default()
        };
        let detector = detector(model.clone(), config);

        detector.warm_up();
        let detection = detector.classify("Guten Morgen");
        assert_eq!(detection.language, "en");
        assert_eq!(detection.confidence, 1.0);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_warm_up_calls_model_once() {
        let model = Arc::new(FixedModel::new("en", 0.9));
        let detector = detector(model.clone(), DetectorConfig::default());
        detector.warm_up();
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }
}
