//! Voxchat - 聊天消息语音播报
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voice: 音色描述、语言代码、音频格式
//! - TextNormalizer: 聊天文本 -> SSML
//! - Bucket: 按说话人哈希选择音色与音高
//!
//! 应用层 (application/):
//! - Ports: SpeechProvider, ArtifactStore, AudioPlayer, LanguageModel
//! - VoiceCatalog, LanguageDetector, Ingress, Controller
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: Google / espeak-ng / Fake 提供方，文件存储，命令播放器，whatlang
//! - Worker: SynthesisWorker, PlaybackWorker, Pipeline
//! - Bridge: 标准输入聊天桥

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
