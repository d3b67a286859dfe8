//! Playback Worker - Background Audio Player
//!
//! 从音频队列逐个取出临时文件并播放，一个播放完才取下一个。
//! 无论播放成功与否都删除文件，之后短暂停顿避免相邻消息粘连。

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::WorkerState;
use crate::application::ports::{ArtifactStorePort, AudioArtifact, AudioPlayerPort, PlaybackError};

/// Worker 配置
#[derive(Debug, Clone)]
pub struct PlaybackWorkerConfig {
    /// 每段音频之后的停顿
    pub pause: Duration,
    /// 单次播放超时
    pub playback_timeout: Duration,
}

impl Default for PlaybackWorkerConfig {
    fn default() -> Self {
        Self {
            pause: Duration::from_millis(250),
            playback_timeout: Duration::from_secs(120),
        }
    }
}

/// 播放 Worker
pub struct PlaybackWorker {
    config: PlaybackWorkerConfig,
    player: Arc<dyn AudioPlayerPort>,
    store: Arc<dyn ArtifactStorePort>,
    audio_receiver: mpsc::Receiver<AudioArtifact>,
    cancel: CancellationToken,
    state: watch::Sender<WorkerState>,
}

impl PlaybackWorker {
    pub fn new(
        config: PlaybackWorkerConfig,
        player: Arc<dyn AudioPlayerPort>,
        store: Arc<dyn ArtifactStorePort>,
        audio_receiver: mpsc::Receiver<AudioArtifact>,
        cancel: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Starting);
        Self {
            config,
            player,
            store,
            audio_receiver,
            cancel,
            state,
        }
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: WorkerState) {
        tracing::trace!(worker = "playback", state = state.as_str(), "State changed");
        self.state.send_replace(state);
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            pause_ms = self.config.pause.as_millis() as u64,
            "PlaybackWorker started"
        );
        self.set_state(WorkerState::Idle);

        loop {
            let artifact = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                received = self.audio_receiver.recv() => match received {
                    Some(artifact) => artifact,
                    None => break,
                },
            };

            self.set_state(WorkerState::Playing);
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                result = self.play(&artifact) => Some(result),
            };

            let path = artifact.path().display().to_string();
            match &outcome {
                Some(Ok(())) => tracing::debug!(path = %path, "Played audio"),
                Some(Err(e)) => tracing::warn!(path = %path, error = %e, "Playback failed"),
                None => tracing::debug!(path = %path, "Playback interrupted"),
            }
            self.discard(artifact).await;

            if outcome.is_none() {
                break;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.pause) => {}
            }
            self.set_state(WorkerState::Idle);
        }

        self.set_state(WorkerState::Stopping);
        // 关闭后仍要等已预留的发送许可用完，recv 返回 None 才算排空
        self.audio_receiver.close();
        let mut leftover = 0usize;
        while let Some(artifact) = self.audio_receiver.recv().await {
            self.discard(artifact).await;
            leftover += 1;
        }
        tracing::info!(discarded = leftover, "PlaybackWorker stopped");
    }

    async fn play(&self, artifact: &AudioArtifact) -> Result<(), PlaybackError> {
        tokio::time::timeout(self.config.playback_timeout, self.player.play(artifact))
            .await
            .map_err(|_| PlaybackError::Timeout)?
    }

    async fn discard(&self, artifact: AudioArtifact) {
        if let Err(e) = self.store.discard(artifact).await {
            tracing::warn!(error = %e, "Failed to delete audio artifact");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::AudioFormat;
    use crate::infrastructure::adapters::FileArtifactStore;
    use crate::infrastructure::worker::test_support::RecordingPlayer;
    use tempfile::tempdir;

    fn fast() -> PlaybackWorkerConfig {
        PlaybackWorkerConfig {
            pause: Duration::from_millis(1),
            playback_timeout: Duration::from_secs(5),
        }
    }

    fn file_count(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_plays_in_order_and_deletes() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileArtifactStore::new(dir.path(), "voxchat-").await.unwrap());
        let player = Arc::new(RecordingPlayer::new());
        let (sender, receiver) = mpsc::channel(8);

        for content in [b"one".as_slice(), b"two", b"three"] {
            let artifact = store.persist(content, AudioFormat::Mp3).await.unwrap();
            sender.send(artifact).await.unwrap();
        }
        drop(sender);

        let worker = PlaybackWorker::new(
            fast(),
            player.clone(),
            store,
            receiver,
            CancellationToken::new(),
        );
        worker.run().await;

        let contents: Vec<Vec<u8>> = player
            .played()
            .into_iter()
            .map(|p| p.content.unwrap())
            .collect();
        assert_eq!(contents, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_failed_playback_still_deletes() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileArtifactStore::new(dir.path(), "voxchat-").await.unwrap());
        let player = Arc::new(RecordingPlayer::failing());
        let (sender, receiver) = mpsc::channel(8);

        sender
            .send(store.persist(b"audio", AudioFormat::Mp3).await.unwrap())
            .await
            .unwrap();
        drop(sender);

        PlaybackWorker::new(fast(), player.clone(), store, receiver, CancellationToken::new())
            .run()
            .await;

        assert_eq!(player.played().len(), 1);
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_playback_timeout() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileArtifactStore::new(dir.path(), "voxchat-").await.unwrap());
        let player = Arc::new(RecordingPlayer::slow(Duration::from_secs(10)));
        let (sender, receiver) = mpsc::channel(8);

        sender
            .send(store.persist(b"audio", AudioFormat::Mp3).await.unwrap())
            .await
            .unwrap();
        drop(sender);

        let config = PlaybackWorkerConfig {
            pause: Duration::from_millis(1),
            playback_timeout: Duration::from_millis(20),
        };
        tokio::time::timeout(
            Duration::from_secs(2),
            PlaybackWorker::new(config, player, store, receiver, CancellationToken::new()).run(),
        )
        .await
        .unwrap();

        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_cancel_discards_queued_artifacts() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileArtifactStore::new(dir.path(), "voxchat-").await.unwrap());
        let player = Arc::new(RecordingPlayer::slow(Duration::from_secs(10)));
        let (sender, receiver) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        for _ in 0..3 {
            sender
                .send(store.persist(b"audio", AudioFormat::Mp3).await.unwrap())
                .await
                .unwrap();
        }

        let worker = PlaybackWorker::new(fast(), player.clone(), store, receiver, cancel.clone());
        let mut state = worker.subscribe();
        let handle = tokio::spawn(worker.run());

        state.wait_for(|s| *s == WorkerState::Playing).await.unwrap();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(player.played().len(), 1);
        assert_eq!(file_count(dir.path()), 0);
        assert_eq!(*state.borrow(), WorkerState::Stopping);
    }

    #[tokio::test]
    async fn test_drain_waits_for_reserved_send() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileArtifactStore::new(dir.path(), "voxchat-").await.unwrap());
        let player = Arc::new(RecordingPlayer::new());
        let (sender, receiver) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let permit = sender.reserve().await.unwrap();
        let artifact = store.persist(b"late", AudioFormat::Mp3).await.unwrap();

        let worker = PlaybackWorker::new(fast(), player.clone(), store, receiver, cancel.clone());
        let mut state = worker.subscribe();
        let handle = tokio::spawn(worker.run());

        cancel.cancel();
        state.wait_for(|s| *s == WorkerState::Stopping).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        permit.send(artifact);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        assert!(player.played().is_empty());
        assert_eq!(file_count(dir.path()), 0);
    }
}
