//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SpeechProvider、ArtifactStore、AudioPlayer、LanguageModel）
//! - catalog: 音色目录
//! - language: 语言识别回退策略
//! - control: 全局静音开关与控制命令
//! - ingest: 消息接入边界

pub mod catalog;
pub mod control;
pub mod ingest;
pub mod language;
pub mod ports;

// Re-exports
pub use catalog::{filter_preferred, CatalogError, Voice, VoiceCatalog};
pub use control::{ControlCommand, ControlError, Controller, MuteSwitch};
pub use ingest::{FilterRules, Ingress, Rejection};
pub use language::{Detection, DetectorConfig, LanguageDetector};

pub use ports::{
    // Artifact store
    ArtifactStorePort,
    AudioArtifact,
    PersistenceError,
    // Audio player
    AudioPlayerPort,
    PlaybackError,
    // Language model
    LanguageGuess,
    LanguageModelPort,
    // Speech provider
    SpeechProviderPort,
    SynthesisError,
    SynthesizedAudio,
};
