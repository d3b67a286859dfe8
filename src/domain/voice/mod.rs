//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 音色元数据（提供方、语言、性别、质量档位）
//! - 音色相关错误

mod errors;
mod value_objects;

pub use errors::VoiceError;
pub use value_objects::{
    AudioFormat, Gender, LanguageCode, ProviderKind, VoiceProfile, VoiceTier,
};
