//! espeak-ng Client - 本地 espeak-ng 进程
//!
//! 实现 SpeechProviderPort trait
//!
//! - 列举音色: `espeak-ng --voices`
//! - 合成: `espeak-ng -m -v <voice> --stdout <ssml>`，stdout 输出 WAV

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::application::ports::{SpeechProviderPort, SynthesisError, SynthesizedAudio};
use crate::domain::voice::{
    AudioFormat, Gender, LanguageCode, ProviderKind, VoiceProfile, VoiceTier,
};

/// espeak-ng 客户端配置
#[derive(Debug, Clone)]
pub struct EspeakClientConfig {
    /// espeak-ng 可执行文件
    pub binary: PathBuf,
}

impl Default for EspeakClientConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("espeak-ng"),
        }
    }
}

/// espeak-ng 客户端
pub struct EspeakClient {
    config: EspeakClientConfig,
}

impl EspeakClient {
    pub fn new(config: EspeakClientConfig) -> Self {
        Self { config }
    }

    async fn run(&self, cmd: &mut Command) -> Result<Vec<u8>, SynthesisError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(command = ?cmd, "Running espeak-ng");
        let output = cmd
            .output()
            .await
            .map_err(|e| SynthesisError::ProcessError(format!("Cannot run espeak-ng: {}", e)))?;

        if !output.status.success() {
            return Err(SynthesisError::ProcessError(format!(
                "espeak-ng failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// 解析 `espeak-ng --voices` 输出
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
/// ```
pub fn parse_voice_list(output: &str) -> Vec<VoiceProfile> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 4 {
                return None;
            }
            let language = LanguageCode::new(columns[1]).ok()?;
            let gender = columns[2]
                .split_once('/')
                .map(|(_, g)| Gender::parse(g))
                .unwrap_or(Gender::Unknown);

            Some(VoiceProfile {
                provider: ProviderKind::Espeak,
                id: columns[1].to_string(),
                display_name: columns[3].replace('_', " "),
                gender,
                language,
                tier: VoiceTier::Standard,
            })
        })
        .collect()
}

#[async_trait]
impl SpeechProviderPort for EspeakClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Espeak
    }

    async fn list_voices(&self) -> Result<Vec<VoiceProfile>, SynthesisError> {
        let mut cmd = Command::new(&self.config.binary);
        cmd.arg("--voices");
        let stdout = self.run(&mut cmd).await?;

        let voices = parse_voice_list(&String::from_utf8_lossy(&stdout));
        tracing::info!(count = voices.len(), "Pulled espeak-ng voices");
        Ok(voices)
    }

    async fn synthesize(
        &self,
        markup: &str,
        voice: &VoiceProfile,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let mut cmd = Command::new(&self.config.binary);
        cmd.arg("-m")
            .arg("-v")
            .arg(&voice.id)
            .arg("--stdout")
            .arg(markup);

        let audio_data = self.run(&mut cmd).await?;
        if audio_data.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        Ok(SynthesizedAudio {
            audio_data,
            format: AudioFormat::Linear16,
        })
    }
}
