//! Audio Player Port - 音频播放抽象

use async_trait::async_trait;
use thiserror::Error;

use super::AudioArtifact;

/// 播放错误
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Invalid play command: {0}")]
    InvalidCommand(String),

    #[error("Failed to spawn player: {0}")]
    SpawnError(String),

    #[error("Player exited with status {0}")]
    ExitStatus(String),

    #[error("Playback timeout")]
    Timeout,
}

/// Audio Player Port
///
/// 阻塞直到音频播放完毕
#[async_trait]
pub trait AudioPlayerPort: Send + Sync {
    async fn play(&self, artifact: &AudioArtifact) -> Result<(), PlaybackError>;
}
