//! Pipeline - 队列与 Worker 生命周期
//!
//! ```text
//! Ingress --(text queue)--> SynthesisWorker --(audio queue)--> PlaybackWorker
//! ```
//!
//! 两个队列都是有界的，队列中只传递拥有所有权的值。
//! 跨任务共享的可变状态只有静音开关（见 `MuteSwitch`）。

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{
    PlaybackWorker, PlaybackWorkerConfig, SynthesisWorker, SynthesisWorkerConfig, WorkerState,
};
use crate::application::ports::{ArtifactStorePort, AudioPlayerPort};
use crate::application::{FilterRules, Ingress, LanguageDetector, MuteSwitch, VoiceCatalog};
use crate::domain::{NormalizerConfig, TextNormalizer, Utterance};

/// Pipeline 配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub text_queue_capacity: usize,
    pub audio_queue_capacity: usize,
    /// 启动时第一条朗读的消息
    pub startup_announcement: Option<String>,
    /// 启动消息使用的说话人身份
    pub announcer: String,
    pub filter: FilterRules,
    pub normalizer: NormalizerConfig,
    pub synthesis: SynthesisWorkerConfig,
    pub playback: PlaybackWorkerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            text_queue_capacity: 64,
            audio_queue_capacity: 16,
            startup_announcement: None,
            announcer: "voxchat".to_string(),
            filter: FilterRules::default(),
            normalizer: NormalizerConfig::default(),
            synthesis: SynthesisWorkerConfig::default(),
            playback: PlaybackWorkerConfig::default(),
        }
    }
}

/// Pipeline 构建器
pub struct Pipeline;

impl Pipeline {
    /// 创建队列并启动两个 Worker
    ///
    /// 必须在 tokio 运行时中调用
    pub fn start(
        config: PipelineConfig,
        catalog: Arc<VoiceCatalog>,
        detector: Arc<LanguageDetector>,
        store: Arc<dyn ArtifactStorePort>,
        player: Arc<dyn AudioPlayerPort>,
        switch: MuteSwitch,
    ) -> PipelineHandle {
        let (text_sender, text_receiver) = mpsc::channel::<Utterance>(config.text_queue_capacity.max(1));
        let (audio_sender, audio_receiver) = mpsc::channel(config.audio_queue_capacity.max(1));
        let cancel = CancellationToken::new();
        let close_intake = CancellationToken::new();

        if let Some(text) = config.startup_announcement.as_deref() {
            let announcement = Utterance::new(text, config.announcer.as_str(), None);
            if let Err(e) = text_sender.try_send(announcement) {
                tracing::warn!(error = %e, "Could not queue startup announcement");
            }
        }

        let synthesis = SynthesisWorker::new(
            config.synthesis,
            TextNormalizer::new(config.normalizer),
            catalog,
            detector,
            store.clone(),
            text_receiver,
            audio_sender,
            cancel.clone(),
            close_intake.clone(),
        );
        let playback = PlaybackWorker::new(
            config.playback,
            player,
            store,
            audio_receiver,
            cancel.clone(),
        );

        let synthesis_state = synthesis.subscribe();
        let playback_state = playback.subscribe();
        let synthesis_task = tokio::spawn(synthesis.run());
        let playback_task = tokio::spawn(playback.run());

        tracing::info!(
            text_queue = config.text_queue_capacity,
            audio_queue = config.audio_queue_capacity,
            "Pipeline started"
        );

        PipelineHandle {
            ingress: Ingress::new(text_sender, switch, config.filter),
            cancel,
            close_intake,
            synthesis_task,
            playback_task,
            synthesis_state,
            playback_state,
        }
    }
}

/// 运行中的 Pipeline
pub struct PipelineHandle {
    ingress: Ingress,
    cancel: CancellationToken,
    close_intake: CancellationToken,
    synthesis_task: JoinHandle<()>,
    playback_task: JoinHandle<()>,
    synthesis_state: watch::Receiver<WorkerState>,
    playback_state: watch::Receiver<WorkerState>,
}

impl PipelineHandle {
    /// 消息接入端，可克隆给聊天层
    pub fn ingress(&self) -> Ingress {
        self.ingress.clone()
    }

    pub fn synthesis_state(&self) -> WorkerState {
        *self.synthesis_state.borrow()
    }

    pub fn playback_state(&self) -> WorkerState {
        *self.playback_state.borrow()
    }

    /// 停止接收新消息，等待已排队的消息全部合成并播放完
    pub async fn drain(self) {
        tracing::info!("Draining pipeline");
        self.close_intake.cancel();
        self.join().await;
    }

    /// 立即停止，中断进行中的合成与播放，删除未播放的音频
    pub async fn shutdown(self) {
        tracing::info!("Shutting down pipeline");
        self.cancel.cancel();
        self.join().await;
    }

    async fn join(self) {
        if let Err(e) = self.synthesis_task.await {
            tracing::error!(error = %e, "SynthesisWorker task failed");
        }
        if let Err(e) = self.playback_task.await {
            tracing::error!(error = %e, "PlaybackWorker task failed");
        }
        tracing::info!("Pipeline stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::SpeechProviderPort;
    use crate::application::DetectorConfig;
    use crate::domain::voice::AudioFormat;
    use crate::infrastructure::adapters::{
        FakeSpeechProvider, FakeSpeechProviderConfig, FileArtifactStore,
    };
    use crate::infrastructure::worker::test_support::{FixedModel, RecordingPlayer};
    use std::path::Path;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    struct Setup {
        dir: TempDir,
        provider: Arc<FakeSpeechProvider>,
        player: Arc<RecordingPlayer>,
        handle: PipelineHandle,
    }

    fn quick_config() -> PipelineConfig {
        PipelineConfig {
            playback: PlaybackWorkerConfig {
                pause: Duration::from_millis(1),
                playback_timeout: Duration::from_secs(5),
            },
            ..Default::default()
        }
    }

    async fn setup(
        provider: FakeSpeechProvider,
        player: RecordingPlayer,
        config: PipelineConfig,
    ) -> Setup {
        let dir = tempdir().unwrap();
        let provider = Arc::new(provider);
        let player = Arc::new(player);
        let providers: Vec<Arc<dyn SpeechProviderPort>> = vec![provider.clone()];
        let catalog = Arc::new(VoiceCatalog::load(&providers, &[]).await.unwrap());
        let detector = Arc::new(LanguageDetector::new(
            Arc::new(FixedModel::english()),
            DetectorConfig::default(),
            catalog.languages_available().clone(),
        ));
        let store = Arc::new(FileArtifactStore::new(dir.path(), "voxchat-").await.unwrap());

        let handle = Pipeline::start(
            config,
            catalog,
            detector,
            store,
            player.clone(),
            MuteSwitch::new(),
        );
        Setup {
            dir,
            provider,
            player,
            handle,
        }
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    async fn hello_world_with(player: RecordingPlayer) {
        let s = setup(FakeSpeechProvider::with_defaults(), player, quick_config()).await;

        assert!(s.handle.ingress().accept("hello world", "alice", None));
        s.handle.drain().await;

        let requests = s.provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].markup.contains("hello world"));

        let played = s.player.played();
        assert_eq!(played.len(), 1);
        assert!(played[0].content.is_some());
        assert!(!played[0].path.exists());
        assert_eq!(file_count(s.dir.path()), 0);
    }

    #[tokio::test]
    async fn test_hello_world_end_to_end() {
        hello_world_with(RecordingPlayer::new()).await;
    }

    #[tokio::test]
    async fn test_hello_world_with_failing_player() {
        hello_world_with(RecordingPlayer::failing()).await;
    }

    #[tokio::test]
    async fn test_non_ascii_message_never_reaches_provider() {
        let s = setup(
            FakeSpeechProvider::with_defaults(),
            RecordingPlayer::new(),
            quick_config(),
        )
        .await;

        assert!(s.handle.ingress().accept("привет мир", "boris", None));
        s.handle.drain().await;

        assert_eq!(s.provider.synthesis_count(), 0);
        assert!(s.player.played().is_empty());
    }

    #[tokio::test]
    async fn test_synthesis_failure_skips_only_that_message() {
        let provider = FakeSpeechProvider::with_defaults();
        provider.fail_next(1);
        let s = setup(provider, RecordingPlayer::new(), quick_config()).await;

        let ingress = s.handle.ingress();
        assert!(ingress.accept("first", "alice", None));
        assert!(ingress.accept("second", "alice", None));
        drop(ingress);
        s.handle.drain().await;

        assert_eq!(s.provider.synthesis_count(), 2);
        assert_eq!(s.player.played().len(), 1);
        assert_eq!(file_count(s.dir.path()), 0);
    }

    #[tokio::test]
    async fn test_playback_follows_arrival_order() {
        let provider = FakeSpeechProvider::new(FakeSpeechProviderConfig {
            echo_markup: true,
            format: AudioFormat::Mp3,
            ..Default::default()
        });
        let s = setup(provider, RecordingPlayer::new(), quick_config()).await;

        let ingress = s.handle.ingress();
        let words = ["alpha", "bravo", "charlie", "delta", "echo"];
        for (i, word) in words.iter().enumerate() {
            assert!(ingress.accept(word, &format!("user{}", i), None));
        }
        drop(ingress);
        s.handle.drain().await;

        let played: Vec<String> = s
            .player
            .played()
            .into_iter()
            .map(|p| String::from_utf8(p.content.unwrap()).unwrap())
            .collect();
        assert_eq!(played.len(), words.len());
        for (markup, word) in played.iter().zip(words) {
            assert!(markup.contains(word), "{} should contain {}", markup, word);
        }
    }

    #[tokio::test]
    async fn test_startup_announcement_is_spoken_first() {
        let provider = FakeSpeechProvider::new(FakeSpeechProviderConfig {
            echo_markup: true,
            ..Default::default()
        });
        let config = PipelineConfig {
            startup_announcement: Some("Text to speech is online".to_string()),
            ..quick_config()
        };
        let s = setup(provider, RecordingPlayer::new(), config).await;

        assert!(s.handle.ingress().accept("after that", "alice", None));
        s.handle.drain().await;

        let requests = s.provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].markup.contains("Text to speech is online"));
        assert!(requests[1].markup.contains("after that"));
    }

    #[tokio::test]
    async fn test_shutdown_leaves_no_artifacts() {
        let s = setup(
            FakeSpeechProvider::with_defaults(),
            RecordingPlayer::slow(Duration::from_secs(10)),
            quick_config(),
        )
        .await;

        let ingress = s.handle.ingress();
        for i in 0..4 {
            assert!(ingress.accept("some words", &format!("user{}", i), None));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        tokio::time::timeout(Duration::from_secs(2), s.handle.shutdown())
            .await
            .expect("shutdown should not wait for playback");

        assert_eq!(file_count(s.dir.path()), 0);
        assert!(!ingress.accept("too late", "alice", None));
    }

    #[tokio::test]
    async fn test_drain_rejects_new_messages() {
        let s = setup(
            FakeSpeechProvider::with_defaults(),
            RecordingPlayer::new(),
            quick_config(),
        )
        .await;

        let ingress = s.handle.ingress();
        s.handle.drain().await;
        assert!(!ingress.accept("hello", "alice", None));
    }
}
