//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod artifact_store;
mod audio_player;
mod language_model;
mod speech_provider;

pub use artifact_store::{ArtifactStorePort, AudioArtifact, PersistenceError};
pub use audio_player::{AudioPlayerPort, PlaybackError};
pub use language_model::{LanguageGuess, LanguageModelPort};
pub use speech_provider::{SpeechProviderPort, SynthesisError, SynthesizedAudio};
