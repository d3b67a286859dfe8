//! Artifact Store Port - 临时音频文件存储
//!
//! 合成结果写入临时文件后交给播放端，播放完毕（无论成败）删除

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::voice::AudioFormat;

/// 存储错误
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Refusing to persist empty audio")]
    EmptyAudio,
}

/// 临时音频文件
///
/// 不实现 Clone：同一时刻只归一个阶段所有，
/// 由 [`ArtifactStorePort::discard`] 消费后删除。
#[derive(Debug, PartialEq, Eq)]
pub struct AudioArtifact {
    path: PathBuf,
    format: AudioFormat,
}

impl AudioArtifact {
    pub fn new(path: PathBuf, format: AudioFormat) -> Self {
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }
}

/// Artifact Store Port
#[async_trait]
pub trait ArtifactStorePort: Send + Sync {
    /// 写入音频，返回唯一命名的临时文件
    ///
    /// 失败时不得留下部分写入的文件
    async fn persist(
        &self,
        audio: &[u8],
        format: AudioFormat,
    ) -> Result<AudioArtifact, PersistenceError>;

    /// 删除临时文件（消费所有权，保证只删除一次）
    async fn discard(&self, artifact: AudioArtifact) -> Result<(), PersistenceError>;

    /// 清理上次异常退出遗留的临时文件，返回删除数量
    async fn purge_stale(&self) -> Result<u64, PersistenceError>;
}
