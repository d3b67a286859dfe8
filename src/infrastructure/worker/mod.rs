//! Worker Layer - Background Speech Processing
//!
//! 两个长期运行的任务，通过有界队列传递所有权:
//! - SynthesisWorker: 文本队列 -> 合成 -> 音频队列
//! - PlaybackWorker: 音频队列 -> 播放 -> 删除
//!
//! Pipeline 负责创建队列、启动与停止两个 Worker。

mod pipeline;
mod playback_worker;
mod synthesis_worker;

pub use pipeline::{Pipeline, PipelineConfig, PipelineHandle};
pub use playback_worker::{PlaybackWorker, PlaybackWorkerConfig};
pub use synthesis_worker::{SynthesisFailure, SynthesisWorker, SynthesisWorkerConfig};

/// Worker 状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting,
    Idle,
    Synthesizing,
    Playing,
    /// 上一条消息处理失败，Worker 继续运行
    FailedNonfatal,
    Stopping,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Starting => "starting",
            WorkerState::Idle => "idle",
            WorkerState::Synthesizing => "synthesizing",
            WorkerState::Playing => "playing",
            WorkerState::FailedNonfatal => "failed_nonfatal",
            WorkerState::Stopping => "stopping",
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::application::ports::{
        AudioArtifact, AudioPlayerPort, LanguageGuess, LanguageModelPort, PlaybackError,
    };

    /// 一次被记录的播放
    #[derive(Debug, Clone)]
    pub struct PlayedArtifact {
        pub path: PathBuf,
        /// 播放时读取到的文件内容，文件不存在时为 None
        pub content: Option<Vec<u8>>,
    }

    /// 记录播放调用的播放器
    #[derive(Default)]
    pub struct RecordingPlayer {
        played: Mutex<Vec<PlayedArtifact>>,
        fail: AtomicBool,
        delay: Option<Duration>,
    }

    impl RecordingPlayer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            let player = Self::default();
            player.fail.store(true, Ordering::SeqCst);
            player
        }

        pub fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        pub fn played(&self) -> Vec<PlayedArtifact> {
            self.played.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AudioPlayerPort for RecordingPlayer {
        async fn play(&self, artifact: &AudioArtifact) -> Result<(), PlaybackError> {
            self.played.lock().unwrap().push(PlayedArtifact {
                path: artifact.path().to_path_buf(),
                content: std::fs::read(artifact.path()).ok(),
            });

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(PlaybackError::ExitStatus("exit status: 1".to_string()));
            }
            Ok(())
        }
    }

    /// 总是给出同一结果的语言模型
    pub struct FixedModel(pub Option<LanguageGuess>);

    impl FixedModel {
        pub fn english() -> Self {
            Self(Some(LanguageGuess {
                language: "en".to_string(),
                confidence: 0.99,
            }))
        }
    }

    impl LanguageModelPort for FixedModel {
        fn detect(&self, _text: &str) -> Option<LanguageGuess> {
            self.0.clone()
        }
    }
}
