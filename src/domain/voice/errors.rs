//! Voice Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VoiceError {
    /// 分桶集合为空（语言过滤后没有可用音色）
    #[error("Cannot pick a bucket from an empty set")]
    EmptyBucketSet,

    #[error("Invalid language code: {0}")]
    InvalidLanguageCode(String),
}
