//! File Artifact Store - 文件系统临时音频存储
//!
//! 实现 ArtifactStorePort trait。
//! 文件名固定为 `{prefix}{uuid}.{ext}`，启动时据此清理遗留文件。

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{ArtifactStorePort, AudioArtifact, PersistenceError};
use crate::domain::voice::AudioFormat;

/// 文件系统临时音频存储
pub struct FileArtifactStore {
    /// 存储目录
    base_dir: PathBuf,
    /// 文件名前缀
    prefix: String,
}

impl FileArtifactStore {
    /// 创建存储，目录不存在时自动创建
    pub async fn new(
        base_dir: impl AsRef<Path>,
        prefix: impl Into<String>,
    ) -> Result<Self, PersistenceError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| PersistenceError::IoError(e.to_string()))?;

        Ok(Self {
            base_dir,
            prefix: prefix.into(),
        })
    }

    /// 获取存储目录
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn artifact_path(&self, format: AudioFormat) -> PathBuf {
        self.base_dir.join(format!(
            "{}{}.{}",
            self.prefix,
            Uuid::new_v4(),
            format.extension()
        ))
    }

    fn is_ours(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.starts_with(&self.prefix))
    }
}

#[async_trait]
impl ArtifactStorePort for FileArtifactStore {
    async fn persist(
        &self,
        audio: &[u8],
        format: AudioFormat,
    ) -> Result<AudioArtifact, PersistenceError> {
        if audio.is_empty() {
            return Err(PersistenceError::EmptyAudio);
        }

        let path = self.artifact_path(format);
        if let Err(e) = fs::write(&path, audio).await {
            // 不留下部分写入的文件
            let _ = fs::remove_file(&path).await;
            return Err(PersistenceError::IoError(e.to_string()));
        }

        tracing::debug!(
            path = %path.display(),
            size = audio.len(),
            "Wrote audio artifact"
        );

        Ok(AudioArtifact::new(path, format))
    }

    async fn discard(&self, artifact: AudioArtifact) -> Result<(), PersistenceError> {
        match fs::remove_file(artifact.path()).await {
            Ok(()) => {
                tracing::debug!(path = %artifact.path().display(), "Deleted audio artifact");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %artifact.path().display(), "Audio artifact already gone");
                Ok(())
            }
            Err(e) => Err(PersistenceError::IoError(e.to_string())),
        }
    }

    async fn purge_stale(&self) -> Result<u64, PersistenceError> {
        let mut deleted_count = 0u64;
        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| PersistenceError::IoError(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PersistenceError::IoError(e.to_string()))?
        {
            let path = entry.path();
            if !path.is_file() || !self.is_ours(&path) {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => deleted_count += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to purge stale artifact")
                }
            }
        }

        if deleted_count > 0 {
            tracing::info!(
                dir = %self.base_dir.display(),
                files = deleted_count,
                "Purged stale audio artifacts"
            );
        }

        Ok(deleted_count)
    }
}
