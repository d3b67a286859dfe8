//! Synthesis Worker - Background Text-to-Audio Processor
//!
//! 从文本队列逐条取出消息:
//! 1. 规范化为 SSML，没有可读内容则丢弃
//! 2. 识别语言，按语言（及档位）筛选音色
//! 3. 按说话人哈希选择音色与音高
//! 4. 调用提供方合成，写入临时文件，投入音频队列
//!
//! 单条消息的任何失败只记录日志，不会终止 Worker。
//! 只有一个 SynthesisWorker，音频队列顺序与文本队列顺序一致。

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::WorkerState;
use crate::application::ports::{
    ArtifactStorePort, AudioArtifact, PersistenceError, SynthesisError,
};
use crate::application::{filter_preferred, LanguageDetector, Voice, VoiceCatalog};
use crate::domain::voice::VoiceError;
use crate::domain::{bucket, pitch_for, Prosody, TextNormalizer, Utterance};

/// Worker 配置
#[derive(Debug, Clone)]
pub struct SynthesisWorkerConfig {
    /// 语速，写入 `<prosody rate>`
    pub rate: String,
    /// 有高档位音色时只用高档位
    pub prefer_premium: bool,
    /// 单次合成超时
    pub synthesis_timeout: Duration,
}

impl Default for SynthesisWorkerConfig {
    fn default() -> Self {
        Self {
            rate: "medium".to_string(),
            prefer_premium: false,
            synthesis_timeout: Duration::from_secs(30),
        }
    }
}

/// 单条消息处理失败的原因
#[derive(Debug, Error)]
pub enum SynthesisFailure {
    #[error("No voice available: {0}")]
    NoVoice(#[from] VoiceError),

    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Could not store audio: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Worker is stopping")]
    Stopped,
}

/// 合成 Worker
pub struct SynthesisWorker {
    config: SynthesisWorkerConfig,
    normalizer: TextNormalizer,
    catalog: Arc<VoiceCatalog>,
    detector: Arc<LanguageDetector>,
    store: Arc<dyn ArtifactStorePort>,
    text_receiver: mpsc::Receiver<Utterance>,
    audio_sender: mpsc::Sender<AudioArtifact>,
    /// 立即停止
    cancel: CancellationToken,
    /// 停止接收新消息，处理完队列中剩余消息后退出
    close_intake: CancellationToken,
    state: watch::Sender<WorkerState>,
}

impl SynthesisWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SynthesisWorkerConfig,
        normalizer: TextNormalizer,
        catalog: Arc<VoiceCatalog>,
        detector: Arc<LanguageDetector>,
        store: Arc<dyn ArtifactStorePort>,
        text_receiver: mpsc::Receiver<Utterance>,
        audio_sender: mpsc::Sender<AudioArtifact>,
        cancel: CancellationToken,
        close_intake: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Starting);
        Self {
            config,
            normalizer,
            catalog,
            detector,
            store,
            text_receiver,
            audio_sender,
            cancel,
            close_intake,
            state,
        }
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: WorkerState) {
        tracing::trace!(worker = "synthesis", state = state.as_str(), "State changed");
        self.state.send_replace(state);
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        self.set_state(WorkerState::Starting);

        if let Err(e) = self.store.purge_stale().await {
            tracing::warn!(error = %e, "Failed to purge stale audio artifacts");
        }
        self.detector.warm_up();

        tracing::info!(
            voices = self.catalog.len(),
            languages = self.catalog.languages_available().len(),
            "SynthesisWorker started"
        );
        self.set_state(WorkerState::Idle);

        let mut intake_closed = false;
        loop {
            let utterance = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = self.close_intake.cancelled(), if !intake_closed => {
                    self.text_receiver.close();
                    intake_closed = true;
                    tracing::debug!("Text queue closed, finishing queued messages");
                    continue;
                }
                received = self.text_receiver.recv() => match received {
                    Some(utterance) => utterance,
                    None => break,
                },
            };

            self.set_state(WorkerState::Synthesizing);
            match self.process(&utterance).await {
                Ok(()) => self.set_state(WorkerState::Idle),
                Err(SynthesisFailure::Stopped) => break,
                Err(e) => {
                    self.set_state(WorkerState::FailedNonfatal);
                    tracing::warn!(
                        speaker = %utterance.speaker(),
                        error = %e,
                        "Dropping message"
                    );
                    self.set_state(WorkerState::Idle);
                }
            }
        }

        self.set_state(WorkerState::Stopping);
        self.text_receiver.close();
        let mut dropped = 0usize;
        while self.text_receiver.try_recv().is_ok() {
            dropped += 1;
        }
        tracing::info!(dropped = dropped, "SynthesisWorker stopped");
    }

    /// 处理单条消息
    async fn process(&self, utterance: &Utterance) -> Result<(), SynthesisFailure> {
        let speaker = utterance.speaker();
        let prosody = Prosody::new(self.config.rate.clone(), pitch_for(speaker));

        let Some(markup) = self.normalizer.normalize(utterance.text(), &prosody) else {
            tracing::debug!(speaker = %speaker, "Nothing to say, discarding message");
            return Ok(());
        };

        let detection = self.detector.classify(utterance.text());
        let voice = self.select_voice(speaker, &detection.language)?;

        tracing::debug!(
            speaker = %speaker,
            voice = %voice.name(),
            language = %detection.language,
            confidence = detection.confidence,
            "Synthesizing"
        );

        let audio = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SynthesisFailure::Stopped),
            result = tokio::time::timeout(self.config.synthesis_timeout, voice.speak(&markup)) => {
                result.map_err(|_| SynthesisError::Timeout)??
            }
        };

        let artifact = self.store.persist(&audio.audio_data, audio.format).await?;

        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            permit = self.audio_sender.reserve() => permit.ok(),
        };
        // 取得许可后停止信号可能已经到达，播放端不会再播放
        let permit = permit.filter(|_| !self.cancel.is_cancelled());
        match permit {
            Some(permit) => {
                tracing::info!(
                    speaker = %speaker,
                    voice = %voice.name(),
                    size = audio.audio_data.len(),
                    "Queued audio"
                );
                permit.send(artifact);
                Ok(())
            }
            None => {
                if let Err(e) = self.store.discard(artifact).await {
                    tracing::warn!(error = %e, "Failed to delete unplayed artifact");
                }
                Err(SynthesisFailure::Stopped)
            }
        }
    }

    /// 按语言筛选后按说话人选择音色
    ///
    /// 识别出的语言没有音色时回退默认语言
    fn select_voice(&self, speaker: &str, language: &str) -> Result<Voice, VoiceError> {
        let mut voices = self.catalog.filter_by_language(language);
        if voices.is_empty() {
            voices = self
                .catalog
                .filter_by_language(self.detector.default_language());
        }
        if self.config.prefer_premium {
            voices = filter_preferred(voices);
        }
        bucket(speaker, &voices).cloned()
    }
}
