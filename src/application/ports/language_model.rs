//! Language Model Port - 语言识别模型抽象

/// 模型原始输出
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageGuess {
    /// ISO 639-1 语言前缀，如 "en"
    pub language: String,
    /// 置信度 0.0 - 1.0
    pub confidence: f64,
}

/// Language Model Port
///
/// 实现方应只在构造时给定的候选语言中做判断
pub trait LanguageModelPort: Send + Sync {
    /// 识别文本语言，无法判断时返回 None
    fn detect(&self, text: &str) -> Option<LanguageGuess>;
}
