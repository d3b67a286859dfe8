//! Voxchat - 聊天消息语音播报
//!
//! 从标准输入读取 `nick: text` 形式的聊天消息，按说话人分配音色朗读出来。

use std::sync::Arc;
use tokio::io::BufReader;

use voxchat::application::ports::SpeechProviderPort;
use voxchat::application::{
    Controller, DetectorConfig, FilterRules, LanguageDetector, MuteSwitch, VoiceCatalog,
};
use voxchat::config::{load_config, print_config, AppConfig};
use voxchat::domain::voice::ProviderKind;
use voxchat::domain::NormalizerConfig;
use voxchat::infrastructure::adapters::{
    CommandPlayer, EspeakClient, EspeakClientConfig, FakeSpeechProvider, FileArtifactStore,
    GoogleTtsClient, GoogleTtsClientConfig, WhatlangModel,
};
use voxchat::infrastructure::{
    ChatBridge, Pipeline, PipelineConfig, PlaybackWorkerConfig, SynthesisWorkerConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},voxchat={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Voxchat - chat text to speech");
    print_config(&config);

    // 语音提供方与音色目录，任何一个提供方不可用都直接退出
    let providers = build_providers(&config)?;
    let catalog = Arc::new(VoiceCatalog::load(&providers, &config.speech.language_families).await?);
    tracing::info!(
        voices = catalog.len(),
        languages = ?catalog.languages_available(),
        "Voice catalog loaded"
    );

    // 语言识别只在有音色的语言中进行
    let model = Arc::new(WhatlangModel::new(catalog.languages_available()));
    let detector = Arc::new(LanguageDetector::new(
        model,
        DetectorConfig {
            default_language: config.speech.default_language.clone(),
            force_language: config.speech.force_language,
            confidence_threshold: config.speech.confidence_threshold,
        },
        catalog.languages_available().clone(),
    ));

    let store = Arc::new(
        FileArtifactStore::new(&config.storage.artifact_dir, config.storage.file_prefix.as_str())
            .await?,
    );
    let player = Arc::new(CommandPlayer::from_template(&config.playback.command)?);

    // 静音开关是唯一跨任务共享的可变状态
    let switch = MuteSwitch::new();
    let controller = Controller::new(switch.clone(), &config.control.admins);

    let handle = Pipeline::start(
        pipeline_config(&config),
        catalog.clone(),
        detector,
        store,
        player,
        switch,
    );

    let bridge = ChatBridge::new(
        handle.ingress(),
        controller,
        catalog,
        config.speech.default_language.as_str(),
        config.speech.prefer_premium,
    );

    tracing::info!("Reading chat lines from stdin (`nick: text`)");
    tokio::select! {
        result = bridge.run(BufReader::new(tokio::io::stdin())) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to read chat input");
            }
            handle.drain().await;
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
            handle.shutdown().await;
        }
    }

    tracing::info!("Shutdown complete");

    Ok(())
}

/// 按配置顺序创建提供方
fn build_providers(config: &AppConfig) -> anyhow::Result<Vec<Arc<dyn SpeechProviderPort>>> {
    let mut providers: Vec<Arc<dyn SpeechProviderPort>> = Vec::new();

    for kind in &config.providers {
        if providers.iter().any(|p| p.kind() == *kind) {
            continue;
        }
        let provider: Arc<dyn SpeechProviderPort> = match kind {
            ProviderKind::Google => {
                let api_key = config
                    .google
                    .api_key
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("google.api_key is not set"))?;
                let google_config = GoogleTtsClientConfig {
                    audio_format: config.speech.audio_format,
                    sample_rate: config.speech.sample_rate,
                    ..GoogleTtsClientConfig::new(api_key)
                        .with_base_url(config.google.base_url.as_str())
                        .with_timeout(config.google.timeout_secs)
                };
                Arc::new(GoogleTtsClient::new(google_config)?)
            }
            ProviderKind::Espeak => Arc::new(EspeakClient::new(EspeakClientConfig {
                binary: config.espeak.binary.clone(),
            })),
            ProviderKind::Fake => Arc::new(FakeSpeechProvider::with_defaults()),
        };
        providers.push(provider);
    }

    Ok(providers)
}

fn pipeline_config(config: &AppConfig) -> PipelineConfig {
    PipelineConfig {
        text_queue_capacity: config.pipeline.text_queue_capacity,
        audio_queue_capacity: config.pipeline.audio_queue_capacity,
        startup_announcement: config
            .pipeline
            .startup_announcement
            .clone()
            .filter(|text| !text.trim().is_empty()),
        announcer: config
            .filter
            .bot_nick
            .clone()
            .unwrap_or_else(|| "voxchat".to_string()),
        filter: FilterRules {
            bot_nick: config.filter.bot_nick.clone(),
            muted_nicks: config.filter.muted_nicks.clone(),
            muted_channels: config.filter.muted_channels.clone(),
            muted_prefixes: config.filter.muted_prefixes.clone(),
        },
        normalizer: NormalizerConfig {
            drop_non_ascii: config.speech.drop_non_ascii,
        },
        synthesis: SynthesisWorkerConfig {
            rate: config.speech.rate.clone(),
            prefer_premium: config.speech.prefer_premium,
            synthesis_timeout: config.speech.synthesis_timeout(),
        },
        playback: PlaybackWorkerConfig {
            pause: config.playback.pause(),
            playback_timeout: config.playback.timeout(),
        },
    }
}
