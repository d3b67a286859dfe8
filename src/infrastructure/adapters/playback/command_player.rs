//! Command Player - 通过外部命令播放音频
//!
//! 命令模板中恰好包含一个 `{}` 占位符，替换为音频文件路径，
//! 例如 `ffplay -nodisp -autoexit -loglevel quiet {}`。

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::application::ports::{AudioArtifact, AudioPlayerPort, PlaybackError};

/// 路径占位符
pub const PLACEHOLDER: &str = "{}";

/// 校验命令模板：非空且恰好一个占位符
pub fn validate_template(template: &str) -> Result<(), String> {
    if template.split_whitespace().next().is_none() {
        return Err("play command cannot be empty".to_string());
    }
    match template.matches(PLACEHOLDER).count() {
        1 => Ok(()),
        n => Err(format!(
            "play command must contain exactly one {} placeholder, found {}",
            PLACEHOLDER, n
        )),
    }
}

/// 外部命令播放器
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    /// 从命令模板创建
    pub fn from_template(template: &str) -> Result<Self, PlaybackError> {
        validate_template(template).map_err(PlaybackError::InvalidCommand)?;

        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| PlaybackError::InvalidCommand(template.to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// 代入文件路径后的参数
    fn args_for(&self, path: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(PLACEHOLDER, path))
            .collect()
    }
}

#[async_trait]
impl AudioPlayerPort for CommandPlayer {
    async fn play(&self, artifact: &AudioArtifact) -> Result<(), PlaybackError> {
        let path = artifact.path().to_string_lossy();
        let program = self.program.replace(PLACEHOLDER, &path);

        let mut cmd = Command::new(&program);
        cmd.args(self.args_for(&path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!(command = ?cmd, "Playing audio");
        let status = cmd
            .status()
            .await
            .map_err(|e| PlaybackError::SpawnError(format!("{}: {}", program, e)))?;

        if !status.success() {
            return Err(PlaybackError::ExitStatus(status.to_string()));
        }
        Ok(())
    }
}
