//! Domain Layer - 领域层
//!
//! 纯逻辑，不做 I/O:
//! - Voice Context: 音色元数据
//! - 文本规范化（SSML 生成）
//! - 分桶选择（说话人 -> 音色 / 音调）

pub mod voice;

mod bucket;
mod text_normalizer;
mod utterance;

pub use bucket::{bucket, bucket_index, pitch_for, PITCH_BUCKETS};
pub use text_normalizer::{
    escape_markup, squash_repeats, NormalizerConfig, Prosody, Replacement, TextNormalizer,
    REPLACEMENT_RULES,
};
pub use utterance::Utterance;
